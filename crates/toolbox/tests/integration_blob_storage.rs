mod common;

use common::{FakeBlobService, McpHttpClient, spawn_toolbox};
use serde_json::json;

#[tokio::test]
async fn lists_containers_with_forwarded_token() -> anyhow::Result<()> {
    let blob = FakeBlobService::start(&["alpha", "beta", "gamma"], 2, "caller-token").await?;
    let endpoint = blob.endpoint_template();
    let toolbox =
        spawn_toolbox(&["--account-name", "acct", "--storage-endpoint", &endpoint]).await?;
    let mut mcp = McpHttpClient::new(&toolbox.base_url);

    let text = mcp
        .call_tool_text("list_blob_containers", json!({}), Some("Bearer caller-token"))
        .await?;

    anyhow::ensure!(
        text == "Containers in Azure Blob Storage Account: alpha, beta, gamma",
        "unexpected result {text:?}"
    );
    let seen = blob.seen_authorization();
    anyhow::ensure!(
        seen == ["Bearer caller-token", "Bearer caller-token"],
        "unexpected downstream auth: {seen:?}"
    );
    Ok(())
}

#[tokio::test]
async fn missing_header_never_reaches_storage() -> anyhow::Result<()> {
    let blob = FakeBlobService::start(&["alpha"], 10, "caller-token").await?;
    let endpoint = blob.endpoint_template();
    let toolbox =
        spawn_toolbox(&["--account-name", "acct", "--storage-endpoint", &endpoint]).await?;
    let mut mcp = McpHttpClient::new(&toolbox.base_url);

    let text = mcp
        .call_tool_text("list_blob_containers", json!({}), None)
        .await?;

    anyhow::ensure!(text == "No Authorization header present.", "got {text:?}");
    anyhow::ensure!(blob.seen_authorization().is_empty(), "storage was called");
    Ok(())
}

#[tokio::test]
async fn rejected_token_yields_generic_failure() -> anyhow::Result<()> {
    let blob = FakeBlobService::start(&["alpha"], 10, "good-token").await?;
    let endpoint = blob.endpoint_template();
    let toolbox =
        spawn_toolbox(&["--account-name", "acct", "--storage-endpoint", &endpoint]).await?;
    let mut mcp = McpHttpClient::new(&toolbox.base_url);

    let text = mcp
        .call_tool_text("list_blob_containers", json!({}), Some("Bearer wrong-token"))
        .await?;

    anyhow::ensure!(
        text == "Failed to list containers in Azure Blob Storage Account 'acct'.",
        "got {text:?}"
    );
    anyhow::ensure!(!text.contains("wrong-token"), "token leaked");
    Ok(())
}

#[tokio::test]
async fn unset_account_is_reported() -> anyhow::Result<()> {
    let toolbox = spawn_toolbox(&[]).await?;
    let mut mcp = McpHttpClient::new(&toolbox.base_url);

    let text = mcp
        .call_tool_text("list_blob_containers", json!({}), Some("Bearer t"))
        .await?;

    anyhow::ensure!(
        text == "Missing environment variable 'accountName'.",
        "got {text:?}"
    );
    Ok(())
}

#[tokio::test]
async fn strict_policy_rejects_non_bearer_header() -> anyhow::Result<()> {
    let blob = FakeBlobService::start(&["alpha"], 10, "t").await?;
    let endpoint = blob.endpoint_template();
    let toolbox = spawn_toolbox(&[
        "--account-name",
        "acct",
        "--storage-endpoint",
        &endpoint,
        "--auth-header-policy",
        "strict",
    ])
    .await?;
    let mut mcp = McpHttpClient::new(&toolbox.base_url);

    let text = mcp
        .call_tool_text("list_blob_containers", json!({}), Some("t"))
        .await?;

    anyhow::ensure!(
        text == "No bearer token present in Authorization header.",
        "got {text:?}"
    );
    anyhow::ensure!(blob.seen_authorization().is_empty(), "storage was called");
    Ok(())
}
