use anyhow::Context as _;
use clap::Parser as _;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use xano_mcp_proxy::config::{LogFormat, ProxyArgs};
use xano_mcp_proxy::server::{AppState, router};
use xano_mcp_proxy::upstream::XanoClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ProxyArgs::parse();
    init_tracing(&args.log_level, args.log_format)?;

    let client = XanoClient::new(&args.upstream_base, &args.token)
        .context("configure upstream client")?;
    let app = router(AppState { client });

    let addr = args.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    tracing::info!(%addr, upstream = %args.upstream_base, "Starting Xano MCP proxy");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    tracing::info!("Shut down");
    Ok(())
}

fn init_tracing(directive: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(directive)
        .with_context(|| format!("invalid log filter '{directive}'"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
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
    tracing::info!("Shutdown signal received");
}
