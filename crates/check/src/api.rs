use anyhow::Context as _;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Direct client for the Xano Metadata API.
#[derive(Clone)]
pub struct MetadataApi {
    base: Url,
    token: String,
    http: reqwest::Client,
}

impl MetadataApi {
    pub fn new(base: &str, token: String) -> anyhow::Result<Self> {
        Ok(Self {
            base: directory_url(base)?,
            token,
            http: client()?,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("join upstream base with path '{path}'"))
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", self.token),
        )
    }

    pub async fn list_instances(&self) -> anyhow::Result<Vec<Value>> {
        let url = self.url("instance")?;
        let instances: Vec<Value> = self
            .auth(self.http.get(url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .context("GET /instance")?
            .error_for_status()
            .context("GET /instance status")?
            .json()
            .await
            .context("parse instances response")?;
        Ok(instances)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Client for the proxy's tool endpoints.
#[derive(Clone)]
pub struct ProxyClient {
    base: Url,
    http: reqwest::Client,
}

impl ProxyClient {
    pub fn new(host: &str, port: u16) -> anyhow::Result<Self> {
        Ok(Self {
            base: directory_url(&format!("http://{host}:{port}"))?,
            http: client()?,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn tool_url(&self, tool: Option<&str>) -> anyhow::Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("proxy URL cannot be a base: {}", self.base))?
            .pop_if_empty()
            .push("tools")
            .extend(tool);
        Ok(url)
    }

    pub async fn list_tools(&self) -> anyhow::Result<Vec<ToolInfo>> {
        let url = self.tool_url(None)?;
        let tools: Vec<ToolInfo> = self
            .http
            .get(url)
            .send()
            .await
            .context("GET /tools")?
            .error_for_status()
            .context("GET /tools status")?
            .json()
            .await
            .context("parse tools response")?;
        Ok(tools)
    }

    pub async fn call_tool(&self, tool: &str, params: &Map<String, Value>) -> anyhow::Result<Value> {
        let url = self.tool_url(Some(tool))?;
        let result: Value = self
            .http
            .post(url)
            .json(params)
            .send()
            .await
            .with_context(|| format!("POST /tools/{tool}"))?
            .error_for_status()
            .with_context(|| format!("POST /tools/{tool} status"))?
            .json()
            .await
            .context("parse tool response")?;
        Ok(result)
    }
}

fn client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("build HTTP client")
}

/// Parse `raw` and make sure its path ends in `/` so relative joins append instead of replace.
fn directory_url(raw: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(raw).with_context(|| format!("parse URL '{raw}'"))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
