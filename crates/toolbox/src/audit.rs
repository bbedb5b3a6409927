//! Request audit interceptor.
//!
//! Every request is logged under the [`AUDIT_TARGET`] tracing target before it reaches a
//! handler. Body-bearing requests are buffered (up to a limit), decoded once, and the decode
//! is attached to the request for the MCP handler. The body itself is logged only at `debug`.

use crate::config::AuditSettings;
use crate::jsonrpc::DecodedBody;
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use http_body_util::{BodyExt as _, LengthLimitError, Limited};
use std::sync::Arc;
use unrelated_blob_storage::credential::has_bearer_scheme;

pub const AUDIT_TARGET: &str = "audit";

const MCP_PAGE: &str = "MCP tool";
const UNKNOWN_PAGE: &str = "Unknown page";
const UNKNOWN_METHOD: &str = "unknown";

/// One audit line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub path: String,
    pub http_method: String,
    pub page: &'static str,
    pub rpc_method: String,
    pub tool: Option<String>,
    pub auth_header_present: bool,
    /// Redacted unless raw logging was enabled.
    pub authorization: String,
    /// `None` when the body was not inspected.
    pub body_bytes: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    #[must_use]
    pub fn from_parts(
        parts: &Parts,
        decoded: Option<&DecodedBody>,
        body_bytes: Option<usize>,
        log_authorization: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

        Self {
            path: parts.uri.path().to_string(),
            http_method: parts.method.to_string(),
            page: if decoded.is_some_and(DecodedBody::is_rpc) {
                MCP_PAGE
            } else {
                UNKNOWN_PAGE
            },
            rpc_method: decoded
                .and_then(DecodedBody::rpc_method)
                .unwrap_or_else(|| UNKNOWN_METHOD.to_string()),
            tool: decoded.and_then(DecodedBody::tool_name),
            auth_header_present: authorization.is_some(),
            authorization: authorization_for_log(authorization.as_deref(), log_authorization),
            body_bytes,
            timestamp,
        }
    }

    pub fn emit(&self) {
        tracing::info!(
            target: AUDIT_TARGET,
            path = %self.path,
            http_method = %self.http_method,
            page = self.page,
            rpc_method = %self.rpc_method,
            tool = self.tool.as_deref().unwrap_or(""),
            auth_header_present = self.auth_header_present,
            authorization = %self.authorization,
            body_bytes = ?self.body_bytes,
            timestamp = %self.timestamp.to_rfc3339(),
            "request received"
        );
    }
}

/// How an `Authorization` value appears in the audit log.
#[must_use]
pub fn authorization_for_log(value: Option<&str>, log_raw: bool) -> String {
    match value {
        None => "No Authorization header present".to_string(),
        Some(v) if log_raw => v.to_string(),
        Some(v) if has_bearer_scheme(v) => "Bearer <redacted>".to_string(),
        Some(_) => "<redacted>".to_string(),
    }
}

fn is_body_bearing(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// A declared `Content-Length` above `limit`. Such bodies are forwarded without inspection.
fn declared_length_exceeds(headers: &HeaderMap, limit: usize) -> bool {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .is_some_and(|len| len > limit as u64)
}

enum BodyReadFailure {
    TooLarge,
    Unreadable,
}

impl IntoResponse for BodyReadFailure {
    fn into_response(self) -> Response {
        match self {
            Self::TooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response()
            }
            Self::Unreadable => {
                (StatusCode::BAD_REQUEST, "failed to read request body").into_response()
            }
        }
    }
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, BodyReadFailure> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(BodyReadFailure::TooLarge)
        }
        Err(e) => {
            tracing::debug!(target: AUDIT_TARGET, error = %e, "request body read failed");
            Err(BodyReadFailure::Unreadable)
        }
    }
}

/// Axum middleware: audit the request, then hand it on with its body intact.
pub async fn intercept(
    State(settings): State<AuditSettings>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let inspect = is_body_bearing(&parts.method)
        && !declared_length_exceeds(&parts.headers, settings.max_inspect_bytes);
    if !inspect {
        AuditRecord::from_parts(&parts, None, None, settings.log_authorization, Utc::now()).emit();
        return next.run(Request::from_parts(parts, body)).await;
    }

    let bytes = match read_body(body, settings.max_inspect_bytes).await {
        Ok(bytes) => bytes,
        Err(failure) => {
            AuditRecord::from_parts(&parts, None, None, settings.log_authorization, Utc::now())
                .emit();
            return failure.into_response();
        }
    };

    let decoded = Arc::new(DecodedBody::decode(&bytes));
    AuditRecord::from_parts(
        &parts,
        Some(&decoded),
        Some(bytes.len()),
        settings.log_authorization,
        Utc::now(),
    )
    .emit();
    tracing::debug!(
        target: AUDIT_TARGET,
        body = %String::from_utf8_lossy(&bytes),
        "request body"
    );

    parts.extensions.insert(decoded);
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
