//! MCP JSON-RPC dispatch.
//!
//! Stateless: every POST carries one message (or one batch) and gets one JSON response, or
//! `202` when nothing needs answering. There are no sessions and no event streams.

use crate::context::{RequestContext, ToolContext, ToolServices};
use crate::jsonrpc::{IncomingMessage, JsonRpcResponse};
use crate::registry::ToolRegistry;
use rmcp::model::{CallToolResult, Content, ErrorCode, JsonObject};
use serde::Deserialize;
use serde_json::{Value, json};

/// Protocol revision answered when the client does not name one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-03-26";

/// Name reported by `initialize` and `GET /info`.
pub const SERVER_NAME: &str = "Anonymous MCP Server";

const SERVER_INSTRUCTIONS: &str = "Test MCP server. `list_blob_containers` lists Azure Blob \
    Storage containers using the caller's own bearer token (send `Authorization: Bearer <token>`).";

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<JsonObject>,
}

pub struct McpDispatcher {
    registry: ToolRegistry,
    services: ToolServices,
}

impl McpDispatcher {
    #[must_use]
    pub fn new(registry: ToolRegistry, services: ToolServices) -> Self {
        Self { registry, services }
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    #[must_use]
    pub fn services(&self) -> &ToolServices {
        &self.services
    }

    /// Handle one message. Returns `None` for notifications.
    pub async fn dispatch(
        &self,
        message: &IncomingMessage,
        request: Option<&RequestContext>,
    ) -> Option<JsonRpcResponse> {
        let Some(method) = message.method.as_deref() else {
            return Some(JsonRpcResponse::error(
                message.id.clone().unwrap_or(Value::Null),
                ErrorCode::INVALID_REQUEST,
                "missing method",
            ));
        };

        let Some(id) = message.id.clone() else {
            tracing::debug!(method = %method, "notification received");
            return None;
        };

        let response = match method {
            "initialize" => JsonRpcResponse::ok(id, self.initialize_result(message.params.as_ref())),
            "ping" => JsonRpcResponse::ok(id, json!({})),
            "tools/list" => match serde_json::to_value(self.registry.list_tools()) {
                Ok(tools) => JsonRpcResponse::ok(id, json!({ "tools": tools })),
                Err(e) => JsonRpcResponse::error(id, ErrorCode::INTERNAL_ERROR, e.to_string()),
            },
            "tools/call" => self.call_tool(id, message.params.as_ref(), request).await,
            other => JsonRpcResponse::error(
                id,
                ErrorCode::METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            ),
        };
        Some(response)
    }

    /// Handle a batch in order. Entries that were not message objects get `-32600`;
    /// notifications contribute nothing. An empty batch is itself an invalid request.
    pub async fn dispatch_batch(
        &self,
        items: &[Option<IncomingMessage>],
        request: Option<&RequestContext>,
    ) -> Vec<JsonRpcResponse> {
        if items.is_empty() {
            return vec![invalid_request()];
        }

        let mut responses = Vec::new();
        for item in items {
            let response = match item {
                Some(message) => self.dispatch(message, request).await,
                None => Some(invalid_request()),
            };
            responses.extend(response);
        }
        responses
    }

    fn initialize_result(&self, params: Option<&Value>) -> Value {
        let protocol_version = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);

        json!({
            "protocolVersion": protocol_version,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": SERVER_NAME,
                "title": SERVER_NAME,
                "version": self.services.host.version,
            },
            "instructions": SERVER_INSTRUCTIONS,
        })
    }

    async fn call_tool(
        &self,
        id: Value,
        params: Option<&Value>,
        request: Option<&RequestContext>,
    ) -> JsonRpcResponse {
        let Some(params) = params.and_then(|p| CallToolParams::deserialize(p).ok()) else {
            return JsonRpcResponse::error(
                id,
                ErrorCode::INVALID_PARAMS,
                "invalid tools/call request",
            );
        };

        let tool = match self.registry.lookup(&params.name) {
            Ok(t) => t,
            Err(e) => {
                tracing::info!(tool = %params.name, "tools/call for unknown tool");
                return JsonRpcResponse::error(id, ErrorCode::INVALID_PARAMS, e.to_string());
            }
        };

        let args = params.arguments.unwrap_or_default();
        let ctx = ToolContext::new(&self.services, request);
        let result = match tool.handler.call(&ctx, &args).await {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(e) => {
                tracing::info!(tool = %tool.name, error = %e, "tool call rejected");
                CallToolResult::error(vec![Content::text(e.to_string())])
            }
        };

        match serde_json::to_value(&result) {
            Ok(v) => JsonRpcResponse::ok(id, v),
            Err(e) => JsonRpcResponse::error(id, ErrorCode::INTERNAL_ERROR, e.to_string()),
        }
    }
}

/// `-32600` with a null id, for bodies that are JSON but not a request.
#[must_use]
pub fn invalid_request() -> JsonRpcResponse {
    JsonRpcResponse::error(Value::Null, ErrorCode::INVALID_REQUEST, "invalid request")
}
