//! `list_blob_containers`: enumerate Azure Blob containers as the caller.
//!
//! The caller's own bearer token is forwarded to the storage service; the server holds no
//! storage identity of its own. Every failure becomes a plain message for the caller. Tokens
//! never appear in those messages.

use crate::config::AuthHeaderPolicy;
use crate::context::ToolContext;
use crate::error::ToolResult;
use crate::registry::ToolHandler;
use async_trait::async_trait;
use rmcp::model::JsonObject;
use std::fmt;
use std::sync::Arc;
use unrelated_blob_storage::credential::{
    StaticTokenCredential, has_bearer_scheme, normalize_bearer,
};
use unrelated_blob_storage::endpoint::service_endpoint;

/// Terminal states of one `list_blob_containers` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListContainersOutcome {
    NoRequestContext,
    NoAuthorizationHeader,
    /// Strict policy only: the header is not `Bearer <token>`.
    NoBearerToken,
    MissingAccountName,
    InvalidAccountName,
    Listed(Vec<String>),
    DownstreamFailure { account: String },
}

impl fmt::Display for ListContainersOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRequestContext => f.write_str("No active HttpContext is available."),
            Self::NoAuthorizationHeader => f.write_str("No Authorization header present."),
            Self::NoBearerToken => {
                f.write_str("No bearer token present in Authorization header.")
            }
            Self::MissingAccountName => {
                f.write_str("Missing environment variable 'accountName'.")
            }
            Self::InvalidAccountName => {
                f.write_str("Invalid environment variable 'accountName'.")
            }
            Self::Listed(names) => write!(
                f,
                "Containers in Azure Blob Storage Account: {}",
                names.join(", ")
            ),
            Self::DownstreamFailure { account } => write!(
                f,
                "Failed to list containers in Azure Blob Storage Account '{account}'."
            ),
        }
    }
}

/// Run the call. Each step short-circuits on failure.
pub async fn list_blob_containers(ctx: &ToolContext<'_>) -> ListContainersOutcome {
    tracing::info!("list_blob_containers called");

    let Some(request) = ctx.request else {
        tracing::warn!("list_blob_containers: no active request context");
        return ListContainersOutcome::NoRequestContext;
    };

    let Some(header) = request.authorization() else {
        tracing::info!("list_blob_containers: no Authorization header present");
        return ListContainersOutcome::NoAuthorizationHeader;
    };

    let storage = &ctx.services.storage;
    if storage.auth_header_policy == AuthHeaderPolicy::Strict
        && (!has_bearer_scheme(&header) || normalize_bearer(&header).is_empty())
    {
        tracing::info!("list_blob_containers: Authorization header is not a bearer token");
        return ListContainersOutcome::NoBearerToken;
    }
    tracing::debug!("list_blob_containers: Authorization header found");

    // Built per call from this request's header; never cached.
    let credential = StaticTokenCredential::from_authorization_header(&header);

    let Some(account) = storage.account_name.as_deref() else {
        tracing::warn!("list_blob_containers: missing environment variable 'accountName'");
        return ListContainersOutcome::MissingAccountName;
    };

    let endpoint = match service_endpoint(&storage.endpoint_template, account) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = %e, "list_blob_containers: unusable storage endpoint");
            return ListContainersOutcome::InvalidAccountName;
        }
    };

    let client = ctx
        .services
        .blob_connector
        .connect(endpoint, Arc::new(credential));

    match client.list_containers().await {
        Ok(items) => ListContainersOutcome::Listed(items.into_iter().map(|c| c.name).collect()),
        Err(e) => {
            tracing::warn!(
                account = %account,
                error = %e,
                "list_blob_containers: downstream storage call failed"
            );
            ListContainersOutcome::DownstreamFailure {
                account: account.to_string(),
            }
        }
    }
}

pub struct ListBlobContainers;

#[async_trait]
impl ToolHandler for ListBlobContainers {
    async fn call(&self, ctx: &ToolContext<'_>, _args: &JsonObject) -> ToolResult {
        Ok(list_blob_containers(ctx).await.to_string())
    }
}
