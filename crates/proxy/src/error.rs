//! Error types for the proxy.

use thiserror::Error;

/// Main error type for the proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Configuration errors (invalid base URL, token unusable as a header value)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream answered with a non-success status
    #[error("HTTP error: {0}")]
    Http(String),

    /// Upstream could not be reached, timed out, or sent an undecodable body
    #[error("HTTP transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ProxyError {
    fn from(value: reqwest::Error) -> Self {
        if let Some(status) = value.status() {
            let url = value
                .url()
                .map_or_else(String::new, |u| format!(" for url '{u}'"));
            return Self::Http(format!("upstream returned {status}{url}"));
        }
        Self::Transport(describe_transport_error(&value))
    }
}

/// reqwest's `Display` stops at the outermost layer; append every source so the cause
/// (connection refused, DNS failure, timeout) reaches the caller.
fn describe_transport_error(err: &reqwest::Error) -> String {
    let mut msg = if err.is_timeout() {
        format!("timed out: {err}")
    } else {
        err.to_string()
    };
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !msg.ends_with(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = cause.source();
    }
    msg
}

/// Result type alias for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;
