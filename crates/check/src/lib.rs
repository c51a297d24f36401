//! Two-phase connectivity check: the Xano Metadata API directly, then the proxy.

pub mod api;
pub mod checks;
pub mod config;

use api::{MetadataApi, ProxyClient};
use checks::{Summary, check_proxy, check_upstream};
use config::CheckArgs;
use std::io::Write;

/// Run both phases and print the summary.
///
/// # Errors
///
/// Returns an error if the arguments describe an unusable URL or writing to `out` fails.
/// Phase failures are not errors; they are reported in the returned [`Summary`].
pub async fn run<W: Write>(args: &CheckArgs, out: &mut W) -> anyhow::Result<Summary> {
    let api = MetadataApi::new(&args.upstream_base, args.token.clone())?;
    let proxy = ProxyClient::new(&args.host, args.port)?;

    let upstream = check_upstream(&api, out).await?;
    let proxy = check_proxy(&proxy, &args.tool, &args.params, out).await?;

    let summary = Summary { upstream, proxy };
    summary.render(out)?;
    out.flush()?;
    Ok(summary)
}
