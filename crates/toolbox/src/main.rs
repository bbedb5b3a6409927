use anyhow::Context as _;
use clap::Parser as _;
use std::sync::Arc;
use tokio::net::TcpListener;
use unrelated_blob_storage::client::RestBlobServiceConnector;
use unrelated_mcp_toolbox::config::ToolboxArgs;
use unrelated_mcp_toolbox::logging;
use unrelated_mcp_toolbox::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ToolboxArgs::parse();
    logging::init_tracing(&args.log_level, args.log_format)?;

    let config = args.into_config()?;
    let connector = RestBlobServiceConnector::new().context("build storage HTTP client")?;
    let state = AppState::from_config(&config, Arc::new(connector))
        .context("register built-in tools")?;

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("bind {}", config.bind))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        tools = state.dispatcher().registry().len(),
        account = config.storage.account_name.as_deref().unwrap_or("<unset>"),
        "MCP toolbox listening"
    );

    server::serve(listener, state).await
}
