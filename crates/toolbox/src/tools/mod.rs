//! Tool handlers and the startup registration list.

pub mod basic;
pub mod storage;

use crate::error::Result;
use crate::registry::{FnTool, ToolRegistry};
use rmcp::model::JsonObject;
use serde_json::{Value, json};
use std::sync::Arc;

pub const ECHO: &str = "echo";
pub const CONTENT_LENGTH: &str = "content_length";
pub const GET_VERSION: &str = "get_version";
pub const ADD_TO_CART: &str = "add_to_cart";
pub const LIST_BLOB_CONTAINERS: &str = "list_blob_containers";

/// `{"type":"object"}` schema with required string properties.
fn string_args_schema(props: &[(&str, &str)]) -> JsonObject {
    let mut properties = JsonObject::new();
    for (name, description) in props {
        properties.insert(
            (*name).to_string(),
            json!({ "type": "string", "description": description }),
        );
    }

    let mut schema = JsonObject::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    schema.insert(
        "required".to_string(),
        Value::Array(props.iter().map(|(n, _)| json!(n)).collect()),
    );
    schema
}

/// Register the built-in tools, in the order `tools/list` reports them.
///
/// # Errors
///
/// Returns [`crate::error::ToolboxError::DuplicateTool`] if any of these names is already
/// present in `registry`.
pub fn register_builtin_tools(registry: &mut ToolRegistry) -> Result<()> {
    registry.register(
        ECHO,
        "Echoes the message back to the client.",
        string_args_schema(&[("message", "The message to echo back.")]),
        Arc::new(FnTool(basic::echo)),
    )?;
    registry.register(
        CONTENT_LENGTH,
        "Returns the length of a message.",
        string_args_schema(&[("message", "The message to measure.")]),
        Arc::new(FnTool(basic::content_length)),
    )?;
    registry.register(
        GET_VERSION,
        "Returns the MCP server version.",
        string_args_schema(&[]),
        Arc::new(FnTool(basic::get_version)),
    )?;
    registry.register(
        ADD_TO_CART,
        "Adds an item to the shopping cart.",
        string_args_schema(&[("item", "The item to add.")]),
        Arc::new(FnTool(basic::add_to_cart)),
    )?;
    registry.register(
        LIST_BLOB_CONTAINERS,
        "Lists containers in an Azure Blob Storage account using the caller's bearer token.",
        string_args_schema(&[]),
        Arc::new(storage::ListBlobContainers),
    )?;
    Ok(())
}

/// Registry with every built-in tool.
///
/// # Errors
///
/// Returns an error if two built-in tools share a name.
pub fn builtin_registry() -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry)?;
    Ok(registry)
}
