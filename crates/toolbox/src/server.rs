//! HTTP surface: router, shared state, and the serve loop.

use crate::audit;
use crate::config::{AuditSettings, ToolboxConfig};
use crate::context::{RequestContext, ToolServices};
use crate::error::Result;
use crate::jsonrpc::{DecodedBody, JsonRpcResponse};
use crate::mcp::{McpDispatcher, SERVER_NAME, invalid_request};
use crate::tools::builtin_registry;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use rmcp::model::ErrorCode;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use unrelated_blob_storage::client::BlobServiceConnector;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    dispatcher: McpDispatcher,
    audit: AuditSettings,
}

impl AppState {
    #[must_use]
    pub fn new(dispatcher: McpDispatcher, audit: AuditSettings) -> Self {
        Self {
            inner: Arc::new(AppStateInner { dispatcher, audit }),
        }
    }

    /// Register the built-in tools and wire them to `connector`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ToolboxError::DuplicateTool`] if registration collides.
    pub fn from_config(
        config: &ToolboxConfig,
        connector: Arc<dyn BlobServiceConnector>,
    ) -> Result<Self> {
        let registry = builtin_registry()?;
        let services = ToolServices {
            host: Arc::new(config.host.clone()),
            storage: Arc::new(config.storage.clone()),
            blob_connector: connector,
        };
        Ok(Self::new(
            McpDispatcher::new(registry, services),
            config.audit.clone(),
        ))
    }

    #[must_use]
    pub fn dispatcher(&self) -> &McpDispatcher {
        &self.inner.dispatcher
    }

    #[must_use]
    pub fn audit(&self) -> &AuditSettings {
        &self.inner.audit
    }
}

pub fn router(state: AppState) -> Router {
    let audit_settings = state.audit().clone();
    Router::new()
        .route("/", post(mcp_post))
        .route("/mcp", post(mcp_post))
        .route("/info", get(info))
        .route("/health", get(health))
        .with_state(state)
        .layer(middleware::from_fn_with_state(audit_settings, audit::intercept))
}

#[derive(Debug, Serialize)]
struct ServerInfo {
    name: &'static str,
    version: String,
}

async fn info(State(state): State<AppState>) -> Json<ServerInfo> {
    Json(ServerInfo {
        name: SERVER_NAME,
        version: state.dispatcher().services().host.version.clone(),
    })
}

async fn health() -> &'static str {
    "ok"
}

async fn mcp_post(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let decoded = match parts.extensions.get::<Arc<DecodedBody>>() {
        Some(d) => d.clone(),
        // The interceptor skips bodies whose declared length exceeds the limit.
        None => match axum::body::to_bytes(body, state.audit().max_inspect_bytes).await {
            Ok(bytes) => Arc::new(DecodedBody::decode(&bytes)),
            Err(_) => {
                return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
            }
        },
    };

    let request_ctx = RequestContext::new(parts.headers);
    let dispatcher = state.dispatcher();
    match &*decoded {
        DecodedBody::Message(message) => {
            match dispatcher.dispatch(message, Some(&request_ctx)).await {
                Some(response) => Json(response).into_response(),
                None => StatusCode::ACCEPTED.into_response(),
            }
        }
        DecodedBody::Batch(items) => {
            let responses = dispatcher.dispatch_batch(items, Some(&request_ctx)).await;
            if responses.is_empty() {
                StatusCode::ACCEPTED.into_response()
            } else {
                Json(responses).into_response()
            }
        }
        DecodedBody::Invalid => Json(invalid_request()).into_response(),
        DecodedBody::Malformed => Json(JsonRpcResponse::error(
            Value::Null,
            ErrorCode::PARSE_ERROR,
            "parse error",
        ))
        .into_response(),
    }
}

/// Serve until ctrl-c or SIGTERM.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
