//! Client for the Xano Metadata API.
//!
//! One `XanoClient` is built at startup and shared by every request handler. The token and base
//! URL never change for the lifetime of the process.

use crate::error::{ProxyError, Result};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_UPSTREAM_BASE: &str = "https://app.xano.com/api/meta";

/// Fixed per-call timeout. Upstream calls are never retried.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct XanoClient {
    base: Url,
    http: Client,
}

impl std::fmt::Debug for XanoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XanoClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl XanoClient {
    /// Build a client that authenticates every call with `Authorization: Bearer <token>`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute `http(s)` URL, or if the token contains
    /// characters that cannot appear in a header value.
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        Self::with_timeout(base_url, token, UPSTREAM_TIMEOUT)
    }

    /// Same as [`XanoClient::new`] with an explicit timeout.
    ///
    /// # Errors
    ///
    /// See [`XanoClient::new`].
    pub fn with_timeout(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| {
            ProxyError::Config(format!("Invalid upstream base URL '{base_url}': {e}"))
        })?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(ProxyError::Config(format!(
                "Invalid upstream base URL '{base_url}': expected an absolute http(s) URL"
            )));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            ProxyError::Config("token contains characters not allowed in a header".to_string())
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Config(format!("build HTTP client: {e}")))?;

        Ok(Self { base, http })
    }

    /// `GET {base}/instance`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout, non-2xx status or a non-JSON body.
    pub async fn list_instances(&self) -> Result<Value> {
        let url = self.endpoint(&["instance"]);
        self.get_json(url).await
    }

    /// `GET {base}/instance/{name}`; `name` is sent as a single path segment, even when empty.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout, non-2xx status or a non-JSON body.
    pub async fn get_instance(&self, name: &str) -> Result<Value> {
        let url = self.endpoint(&["instance", name]);
        self.get_json(url).await
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        let resp = self.http.get(url).send().await?.error_for_status()?;
        Ok(resp.json::<Value>().await?)
    }
}
