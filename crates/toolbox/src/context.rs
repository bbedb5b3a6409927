//! Per-invocation context handed to tool handlers.
//!
//! Nothing here is global: the shared pieces are built once at startup and the request part is
//! captured fresh for every HTTP request.

use crate::config::{HostInfo, StorageSettings};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use std::sync::Arc;
use unrelated_blob_storage::client::BlobServiceConnector;

/// Process-wide dependencies shared by all tool invocations. Read-only after startup.
#[derive(Clone)]
pub struct ToolServices {
    pub host: Arc<HostInfo>,
    pub storage: Arc<StorageSettings>,
    pub blob_connector: Arc<dyn BlobServiceConnector>,
}

/// Snapshot of the HTTP request that carried a tool call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    headers: HeaderMap,
}

impl RequestContext {
    #[must_use]
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    /// The raw `Authorization` header value, if present.
    ///
    /// Non-UTF-8 bytes are replaced rather than dropping the header.
    #[must_use]
    pub fn authorization(&self) -> Option<String> {
        self.headers
            .get(AUTHORIZATION)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    }
}

/// What a handler sees for one call.
pub struct ToolContext<'a> {
    pub services: &'a ToolServices,
    /// `None` when the call did not arrive over HTTP.
    pub request: Option<&'a RequestContext>,
}

impl<'a> ToolContext<'a> {
    #[must_use]
    pub fn new(services: &'a ToolServices, request: Option<&'a RequestContext>) -> Self {
        Self { services, request }
    }
}
