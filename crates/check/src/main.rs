use clap::Parser as _;
use std::process::ExitCode;
use xano_mcp_check::config::CheckArgs;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = CheckArgs::parse();
    let mut stdout = std::io::stdout().lock();
    let summary = xano_mcp_check::run(&args, &mut stdout).await?;
    Ok(ExitCode::from(summary.exit_code()))
}
