use clap::Parser;
use serde_json::{Map, Value};

pub const DEFAULT_UPSTREAM_BASE: &str = "https://app.xano.com/api/meta";
pub const DEFAULT_TOOL: &str = "xano_list_instances";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "xano-mcp-check",
    version,
    about = "Check connectivity to the Xano Metadata API and the Xano MCP proxy"
)]
pub struct CheckArgs {
    /// Xano Metadata API access token
    #[arg(long, env = "XANO_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Proxy host
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Proxy port
    #[arg(long, default_value_t = 3000)]
    pub port: u16,

    /// Base URL of the Xano Metadata API
    #[arg(long, env = "XANO_META_BASE_URL", default_value = DEFAULT_UPSTREAM_BASE)]
    pub upstream_base: String,

    /// Tool to invoke through the proxy
    #[arg(long, default_value = DEFAULT_TOOL)]
    pub tool: String,

    /// Tool parameters as a JSON object
    #[arg(long, value_parser = parse_params, default_value = "{}")]
    pub params: Map<String, Value>,
}

fn parse_params(raw: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}
