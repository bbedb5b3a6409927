//! Small MCP tool server over HTTP.
//!
//! Exposes a handful of tools over JSON-RPC, audits every inbound request, and lists Azure
//! Blob Storage containers on behalf of the caller using the caller's own bearer token.

pub mod audit;
pub mod config;
pub mod context;
pub mod error;
pub mod jsonrpc;
pub mod logging;
pub mod mcp;
pub mod registry;
pub mod server;
pub mod tools;

#[cfg(test)]
mod test_util;
