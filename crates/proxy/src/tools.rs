//! The fixed tool surface and its dispatch.
//!
//! Every supported tool is a variant of [`Tool`]. Adding a variant forces a descriptor and a
//! handler through exhaustive matches; names that parse to no variant are reported as not found.

use crate::error::ProxyError;
use crate::upstream::XanoClient;
use serde::Serialize;
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    ListInstances,
    GetInstance,
}

/// Advertised by `GET /tools`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
}

impl Tool {
    /// All tools, in advertised order.
    pub const ALL: [Tool; 2] = [Tool::ListInstances, Tool::GetInstance];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Tool::ListInstances => "xano_list_instances",
            Tool::GetInstance => "xano_get_instance",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Tool::ListInstances => "Lists all Xano instances available to the authenticated user",
            Tool::GetInstance => "Gets details about a specific Xano instance",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    #[must_use]
    pub fn descriptor(self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name(),
            description: self.description(),
        }
    }

    /// Run the tool against the upstream.
    ///
    /// Upstream failures never escape: they are folded into an `{"error": ...}` object so the
    /// caller always receives JSON.
    pub async fn invoke(self, client: &XanoClient, params: &Map<String, Value>) -> Value {
        match self {
            Tool::ListInstances => list_instances(client).await,
            Tool::GetInstance => {
                let name = params.get("name").and_then(Value::as_str).unwrap_or("");
                get_instance(client, name).await
            }
        }
    }
}

#[must_use]
pub fn descriptors() -> Vec<ToolDescriptor> {
    Tool::ALL.into_iter().map(Tool::descriptor).collect()
}

async fn list_instances(client: &XanoClient) -> Value {
    match client.list_instances().await {
        Ok(instances) => json!({ "instances": instances }),
        Err(e) => error_envelope(Tool::ListInstances, &e, "Failed to list Xano instances".into()),
    }
}

async fn get_instance(client: &XanoClient, name: &str) -> Value {
    match client.get_instance(name).await {
        Ok(instance) => instance,
        Err(e) => error_envelope(
            Tool::GetInstance,
            &e,
            format!("Failed to get Xano instance {name}"),
        ),
    }
}

fn error_envelope(tool: Tool, err: &ProxyError, prefix: String) -> Value {
    tracing::warn!(tool = tool.name(), error = %err, "upstream call failed");
    json!({ "error": format!("{prefix}: {err}") })
}
