use anyhow::Context as _;
use std::process::Output;
use tokio::net::TcpListener;
use xano_mcp_proxy::server::{AppState, router};
use xano_mcp_proxy::upstream::XanoClient;
use xano_test_support::{STUB_TOKEN, StubUpstream, pick_unused_port, spawn_stub_upstream};

struct RunningProxy {
    port: u16,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
}

impl Drop for RunningProxy {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn start_proxy(stub: &StubUpstream) -> anyhow::Result<RunningProxy> {
    let client = XanoClient::new(&stub.base_url, STUB_TOKEN)?;
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind proxy")?;
    let port = listener.local_addr()?.port();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, router(AppState { client })).with_graceful_shutdown(
        async move {
            let _ = shutdown_rx.await;
        },
    );
    tokio::spawn(async move { server.await });

    Ok(RunningProxy {
        port,
        shutdown: Some(shutdown_tx),
    })
}

async fn run_check(upstream_base: &str, token: &str, port: u16) -> anyhow::Result<Output> {
    let bin = env!("CARGO_BIN_EXE_xano-mcp-check");
    tokio::process::Command::new(bin)
        .arg("--token")
        .arg(token)
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(port.to_string())
        .arg("--upstream-base")
        .arg(upstream_base)
        .env_remove("XANO_TOKEN")
        .env("NO_COLOR", "1")
        .output()
        .await
        .context("run xano-mcp-check")
}

fn summary_line<'a>(stdout: &'a str, prefix: &str) -> &'a str {
    stdout
        .lines()
        .find(|l| l.starts_with(prefix))
        .unwrap_or_default()
}

#[tokio::test]
async fn both_phases_pass_with_valid_token() -> anyhow::Result<()> {
    let stub = spawn_stub_upstream(STUB_TOKEN).await?;
    let proxy = start_proxy(&stub).await?;

    let output = run_check(&stub.base_url, STUB_TOKEN, proxy.port).await?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(0), "{stdout}");
    assert!(summary_line(&stdout, "Xano API Connection:").ends_with("Passed"), "{stdout}");
    assert!(summary_line(&stdout, "MCP Server Connection:").ends_with("Passed"), "{stdout}");
    assert!(stdout.contains("  - xano_list_instances: "), "{stdout}");
    assert!(stdout.contains("\"instances\""), "{stdout}");
    Ok(())
}

#[tokio::test]
async fn invalid_token_fails_first_phase_and_exits_one() -> anyhow::Result<()> {
    let stub = spawn_stub_upstream(STUB_TOKEN).await?;
    let proxy = start_proxy(&stub).await?;

    let output = run_check(&stub.base_url, "revoked-token", proxy.port).await?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1), "{stdout}");
    assert!(summary_line(&stdout, "Xano API Connection:").ends_with("Failed"), "{stdout}");
    // The proxy carries its own token, so the second phase still runs and passes.
    assert!(summary_line(&stdout, "MCP Server Connection:").ends_with("Passed"), "{stdout}");
    Ok(())
}

#[tokio::test]
async fn unreachable_proxy_fails_second_phase() -> anyhow::Result<()> {
    let stub = spawn_stub_upstream(STUB_TOKEN).await?;
    let port = pick_unused_port()?;

    let output = run_check(&stub.base_url, STUB_TOKEN, port).await?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1), "{stdout}");
    assert!(summary_line(&stdout, "Xano API Connection:").ends_with("Passed"), "{stdout}");
    assert!(summary_line(&stdout, "MCP Server Connection:").ends_with("Failed"), "{stdout}");
    assert!(stdout.contains("Failed to test MCP server"), "{stdout}");
    Ok(())
}
