use anyhow::Context as _;
use std::process::{Command, Stdio};
use std::time::Duration;

pub use unrelated_test_support::{FakeBlobService, KillOnDrop, McpHttpClient};

/// A running toolbox process plus its base URL.
pub struct Toolbox {
    pub base_url: String,
    _child: KillOnDrop,
}

/// Start the toolbox binary on a free port and wait for `/health`.
///
/// `accountName` and `HOSTNAME` are cleared so the caller's environment cannot leak in; pass
/// them via `extra_args` instead.
pub async fn spawn_toolbox(extra_args: &[&str]) -> anyhow::Result<Toolbox> {
    let port = unrelated_test_support::pick_unused_port()?;
    let bin = env!("CARGO_BIN_EXE_unrelated-mcp-toolbox");
    let child = Command::new(bin)
        .env_remove("accountName")
        .env_remove("HOSTNAME")
        .env_remove("COMPUTERNAME")
        .env_remove("RUST_LOG")
        .arg("--bind")
        .arg(format!("127.0.0.1:{port}"))
        .arg("--log-level")
        .arg("warn")
        .args(extra_args)
        .stdout(Stdio::null())
        .spawn()
        .context("spawn toolbox")?;
    let child = KillOnDrop(child);

    let base_url = format!("http://127.0.0.1:{port}");
    unrelated_test_support::wait_http_ok(&format!("{base_url}/health"), Duration::from_secs(15))
        .await?;

    Ok(Toolbox {
        base_url,
        _child: child,
    })
}
