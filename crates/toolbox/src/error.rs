//! Error types for the toolbox.

use thiserror::Error;

/// Startup and lookup errors.
///
/// Per-request failures inside a tool are [`ToolError`]s (or plain result strings) and never
/// reach the transport.
#[derive(Error, Debug)]
pub enum ToolboxError {
    /// Two tools were registered under the same name. Fatal at startup.
    #[error("duplicate tool registration: '{0}'")]
    DuplicateTool(String),

    /// `tools/call` named a tool that is not registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Configuration errors (invalid flags/env values)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure reported by a tool handler. Rendered to the caller as an error tool result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Missing or mistyped arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

/// What a tool handler returns: the text shown to the caller, or a [`ToolError`].
pub type ToolResult = std::result::Result<String, ToolError>;

/// Result type alias for toolbox operations.
pub type Result<T> = std::result::Result<T, ToolboxError>;
