//! The two diagnostic phases. Each phase reports its own failure and returns whether it passed;
//! neither stops the other from running.

use crate::api::{MetadataApi, ProxyClient};
use owo_colors::{OwoColorize as _, Stream};
use serde_json::{Map, Value};
use std::io::{self, Write};

/// Phase 1: call the Metadata API directly to confirm the token works.
pub async fn check_upstream<W: Write>(api: &MetadataApi, out: &mut W) -> io::Result<bool> {
    writeln!(out, "Testing connection to Xano's Metadata API...")?;

    let instances = match api.list_instances().await {
        Ok(instances) => instances,
        Err(e) => {
            writeln!(
                out,
                "{} Failed to connect to Xano's Metadata API: {e:#}",
                cross()
            )?;
            return Ok(false);
        }
    };

    writeln!(out, "{} Successfully connected to Xano's Metadata API", tick())?;
    writeln!(out, "Found {} instances:", instances.len())?;
    for instance in &instances {
        writeln!(
            out,
            "  - {}: {}",
            field(instance, "name", "Unknown"),
            field(instance, "display", "No display name")
        )?;
    }
    Ok(true)
}

/// Phase 2: list the proxy's tools, then invoke `tool` with `params`.
pub async fn check_proxy<W: Write>(
    proxy: &ProxyClient,
    tool: &str,
    params: &Map<String, Value>,
    out: &mut W,
) -> io::Result<bool> {
    let base = proxy.base_url();
    writeln!(
        out,
        "\nTesting connection to MCP server at {}:{}...",
        base.host_str().unwrap_or_default(),
        base.port_or_known_default().unwrap_or_default()
    )?;

    let tools = match proxy.list_tools().await {
        Ok(tools) => tools,
        Err(e) => return proxy_failed(out, &e),
    };

    writeln!(out, "{} Successfully connected to MCP server", tick())?;
    writeln!(out, "Available tools:")?;
    for t in &tools {
        writeln!(
            out,
            "  - {}: {}",
            t.name,
            t.description.as_deref().unwrap_or("No description")
        )?;
    }

    writeln!(out, "\nTesting tool: {tool}")?;
    let result = match proxy.call_tool(tool, params).await {
        Ok(result) => result,
        Err(e) => return proxy_failed(out, &e),
    };

    writeln!(out, "{} Successfully called tool: {tool}", tick())?;
    writeln!(out, "Result:")?;
    writeln!(
        out,
        "{}",
        serde_json::to_string_pretty(&result).map_err(io::Error::other)?
    )?;
    Ok(true)
}

fn proxy_failed<W: Write>(out: &mut W, err: &anyhow::Error) -> io::Result<bool> {
    writeln!(out, "{} Failed to test MCP server: {err:#}", cross())?;
    Ok(false)
}

/// Render `instance[key]`, falling back to `default` when absent or null.
fn field(instance: &Value, key: &str, default: &str) -> String {
    match instance.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub upstream: bool,
    pub proxy: bool,
}

impl Summary {
    #[must_use]
    pub fn all_passed(self) -> bool {
        self.upstream && self.proxy
    }

    #[must_use]
    pub fn exit_code(self) -> u8 {
        u8::from(!self.all_passed())
    }

    pub fn render<W: Write>(self, out: &mut W) -> io::Result<()> {
        writeln!(out, "\n--- Test Summary ---")?;
        writeln!(out, "Xano API Connection: {}", verdict(self.upstream))?;
        writeln!(out, "MCP Server Connection: {}", verdict(self.proxy))?;
        if self.all_passed() {
            writeln!(
                out,
                "\n🎉 All tests passed! Your Xano MCP proxy is ready to use."
            )?;
        } else {
            writeln!(
                out,
                "\n{} Some tests failed. Please check the error messages above.",
                cross()
            )?;
        }
        Ok(())
    }
}

fn verdict(passed: bool) -> String {
    if passed {
        format!("{} Passed", tick())
    } else {
        format!("{} Failed", cross())
    }
}

fn tick() -> String {
    "✅"
        .if_supports_color(Stream::Stdout, |t| t.green())
        .to_string()
}

fn cross() -> String {
    "❌"
        .if_supports_color(Stream::Stdout, |t| t.red())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use xano_test_support::{STUB_TOKEN, pick_unused_port, spawn_stub_upstream};

    fn text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).expect("utf-8 output")
    }

    #[test]
    fn field_falls_back_for_missing_or_null() {
        let v = json!({ "name": "x1", "display": null, "id": 7 });
        assert_eq!(field(&v, "name", "Unknown"), "x1");
        assert_eq!(field(&v, "display", "No display name"), "No display name");
        assert_eq!(field(&v, "missing", "Unknown"), "Unknown");
        assert_eq!(field(&v, "id", "Unknown"), "7");
    }

    #[test]
    fn exit_code_is_zero_only_when_both_pass() {
        let both = Summary { upstream: true, proxy: true };
        assert_eq!(both.exit_code(), 0);
        assert_eq!(Summary { upstream: false, proxy: true }.exit_code(), 1);
        assert_eq!(Summary { upstream: true, proxy: false }.exit_code(), 1);
        assert_eq!(Summary { upstream: false, proxy: false }.exit_code(), 1);
    }

    #[test]
    fn summary_renders_one_line_per_phase() {
        let mut buf = Vec::new();
        Summary { upstream: true, proxy: false }
            .render(&mut buf)
            .expect("render");
        let out = text(buf);
        let line = |prefix: &str| {
            out.lines()
                .find(|l| l.starts_with(prefix))
                .unwrap_or_default()
                .to_string()
        };
        assert!(line("Xano API Connection:").ends_with("Passed"), "{out}");
        assert!(line("MCP Server Connection:").ends_with("Failed"), "{out}");
        assert!(out.contains("Some tests failed"), "{out}");
    }

    #[tokio::test]
    async fn upstream_check_lists_instances() {
        let stub = spawn_stub_upstream(STUB_TOKEN).await.expect("stub");
        let api = MetadataApi::new(&stub.base_url, STUB_TOKEN.to_string()).expect("api");

        let mut buf = Vec::new();
        let passed = check_upstream(&api, &mut buf).await.expect("io");
        let out = text(buf);
        assert!(passed, "{out}");
        assert!(out.contains("Found 2 instances:"), "{out}");
        assert!(out.contains("  - x1: Primary"), "{out}");
        assert!(out.contains("  - x2: Staging"), "{out}");
    }

    #[tokio::test]
    async fn upstream_check_fails_on_bad_token() {
        let stub = spawn_stub_upstream(STUB_TOKEN).await.expect("stub");
        let api = MetadataApi::new(&stub.base_url, "bad".to_string()).expect("api");

        let mut buf = Vec::new();
        let passed = check_upstream(&api, &mut buf).await.expect("io");
        let out = text(buf);
        assert!(!passed);
        assert!(out.contains("Failed to connect to Xano's Metadata API"), "{out}");
        assert!(out.contains("401"), "{out}");
    }

    #[tokio::test]
    async fn proxy_check_fails_when_nothing_listens() {
        let port = pick_unused_port().expect("port");
        let proxy = ProxyClient::new("127.0.0.1", port).expect("proxy");

        let mut buf = Vec::new();
        let passed = check_proxy(&proxy, "xano_list_instances", &Map::new(), &mut buf)
            .await
            .expect("io");
        let out = text(buf);
        assert!(!passed);
        assert!(out.contains(&format!("MCP server at 127.0.0.1:{port}")), "{out}");
        assert!(out.contains("Failed to test MCP server"), "{out}");
    }
}
