//! JSON-RPC envelope types.
//!
//! Request bodies are decoded exactly once (by the audit interceptor) into a [`DecodedBody`],
//! which is attached to the request so the MCP dispatcher routes on the same decode that was
//! logged.

use rmcp::model::ErrorCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// An inbound JSON-RPC message (request or notification).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// `None` only when the field is absent (a notification); `"id": null` is `Some(Null)`.
    #[serde(default, deserialize_with = "present_value")]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl IncomingMessage {
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// `params.name` of a `tools/call` request.
    #[must_use]
    pub fn tool_name(&self) -> Option<&str> {
        if self.method.as_deref() != Some("tools/call") {
            return None;
        }
        self.params
            .as_ref()
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
    }
}

/// Result of decoding a request body once.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBody {
    Message(IncomingMessage),
    /// A JSON array. Entries that are not message objects are `None`.
    Batch(Vec<Option<IncomingMessage>>),
    /// Valid JSON that is neither an object nor an array.
    Invalid,
    /// Not JSON.
    Malformed,
}

impl DecodedBody {
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Array(items)) => Self::Batch(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(_) => serde_json::from_value(item).ok(),
                        _ => None,
                    })
                    .collect(),
            ),
            Ok(value @ Value::Object(_)) => {
                serde_json::from_value(value).map_or(Self::Invalid, Self::Message)
            }
            Ok(_) => Self::Invalid,
            Err(_) => Self::Malformed,
        }
    }

    #[must_use]
    pub fn message(&self) -> Option<&IncomingMessage> {
        match self {
            Self::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Whether the body is a JSON-RPC message or a batch of them.
    #[must_use]
    pub fn is_rpc(&self) -> bool {
        matches!(self, Self::Message(_) | Self::Batch(_))
    }

    /// The `method` field, if the body carried one. A batch reports its methods joined by `,`.
    #[must_use]
    pub fn rpc_method(&self) -> Option<String> {
        match self {
            Self::Message(m) => m.method.clone(),
            Self::Batch(items) => {
                let methods: Vec<&str> = items
                    .iter()
                    .filter_map(|m| m.as_ref().and_then(|m| m.method.as_deref()))
                    .collect();
                (!methods.is_empty()).then(|| methods.join(","))
            }
            Self::Invalid | Self::Malformed => None,
        }
    }

    /// `tools/call` target(s), joined by `,` for a batch.
    #[must_use]
    pub fn tool_name(&self) -> Option<String> {
        match self {
            Self::Message(m) => m.tool_name().map(str::to_string),
            Self::Batch(items) => {
                let tools: Vec<&str> = items
                    .iter()
                    .filter_map(|m| m.as_ref().and_then(IncomingMessage::tool_name))
                    .collect();
                (!tools.is_empty()).then(|| tools.join(","))
            }
            Self::Invalid | Self::Malformed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Outbound JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    #[must_use]
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    #[must_use]
    pub fn error(id: Value, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(JsonRpcError {
                code: code.0,
                message: message.into(),
                data: None,
            }),
        }
    }
}
