//! Credential delegation + downstream storage client contract.
//!
//! This crate is intended to be used by `unrelated-mcp-toolbox`: tools that call Azure Blob
//! Storage on behalf of the caller, authenticating with the caller's own bearer token instead of
//! a service identity.
//!
//! It intentionally contains **no** MCP protocol logic and **no** HTTP server code.

pub mod client;
pub mod credential;
pub mod endpoint;
pub mod error;
