//! Command-line and environment configuration for the proxy binary.

use crate::upstream::DEFAULT_UPSTREAM_BASE;
use clap::{Parser, ValueEnum};
use std::net::{Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Parser, Debug, Clone)]
#[command(name = "xano-mcp-proxy", version, about = "Proxy for the Xano Metadata API")]
pub struct ProxyArgs {
    /// Xano Metadata API access token
    #[arg(long, env = "XANO_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Port to listen on (bound to 127.0.0.1)
    #[arg(long, env = "XANO_MCP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Base URL of the Xano Metadata API
    #[arg(long, env = "XANO_META_BASE_URL", default_value = DEFAULT_UPSTREAM_BASE)]
    pub upstream_base: String,

    /// Tracing filter (e.g. `info`, `xano_mcp_proxy=debug`)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "XANO_MCP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl ProxyArgs {
    /// Loopback only; the proxy is never exposed on other interfaces.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.port))
    }
}
