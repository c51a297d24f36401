use anyhow::Context as _;
use std::process::{Child, Command};
use std::time::Duration;

pub use xano_test_support::KillOnDrop;

pub fn pick_unused_port() -> anyhow::Result<u16> {
    xano_test_support::pick_unused_port()
}

pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    xano_test_support::wait_http_ok(url, timeout_dur).await
}

pub fn spawn_proxy(upstream_base: &str, token: &str, port: u16) -> anyhow::Result<Child> {
    let bin = env!("CARGO_BIN_EXE_xano-mcp-proxy");
    Command::new(bin)
        .arg("--token")
        .arg(token)
        .arg("--port")
        .arg(port.to_string())
        .arg("--upstream-base")
        .arg(upstream_base)
        .arg("--log-level")
        .arg("info")
        .env_remove("XANO_TOKEN")
        .env_remove("RUST_LOG")
        .spawn()
        .context("spawn proxy")
}

/// Spawn the proxy and wait until `GET /tools` answers.
pub async fn start_proxy(upstream_base: &str, token: &str) -> anyhow::Result<(KillOnDrop, String)> {
    let port = pick_unused_port()?;
    let child = KillOnDrop(spawn_proxy(upstream_base, token, port)?);
    let base_url = format!("http://127.0.0.1:{port}");
    wait_http_ok(&format!("{base_url}/tools"), Duration::from_secs(20)).await?;
    Ok((child, base_url))
}
