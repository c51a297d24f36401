use anyhow::Context as _;
use axum::{
    Json, Router,
    http::{HeaderMap, Method, StatusCode, Uri, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::net::TcpListener;
use std::process::Child;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Token accepted by [`spawn_stub_upstream`] in most tests.
pub const STUB_TOKEN: &str = "stub-token";

/// Path prefix the stub serves under, mirroring the real Metadata API.
const STUB_PREFIX: &str = "/api/meta";

pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Pick an unused TCP port on localhost.
///
/// Note: this does not reserve the port; it's still possible for another process to bind it
/// before you do.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails or if the bound socket's
/// local address cannot be read.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

/// Poll an HTTP URL until it returns a success status (2xx/3xx).
///
/// # Errors
///
/// Returns an error if the timeout elapses before the endpoint returns a success status.
pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > timeout_dur {
            anyhow::bail!("timed out waiting for {url}");
        }

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => tokio::time::sleep(Duration::from_millis(200)).await,
        }
    }
}

/// Instances served by the stub upstream.
#[must_use]
pub fn stub_instances() -> Value {
    json!([
        { "id": 1, "name": "x1", "display": "Primary" },
        { "id": 2, "name": "x2", "display": "Staging" }
    ])
}

#[derive(Clone)]
enum Behavior {
    Serve { token: String },
    Fail(StatusCode),
}

#[derive(Clone)]
struct StubState {
    behavior: Behavior,
    requests: Arc<Mutex<Vec<String>>>,
}

/// In-process stand-in for the Xano Metadata API, stopped on drop.
pub struct StubUpstream {
    /// Base URL including the `/api/meta` prefix.
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
}

impl StubUpstream {
    /// Requests received so far, as `"<METHOD> <path>"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

impl Drop for StubUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Serve `GET /api/meta/instance` and `GET /api/meta/instance/{name}` for callers presenting
/// `Bearer <token>`. Other tokens get 401; unknown instances get 404.
///
/// # Errors
///
/// Returns an error if the stub cannot bind a local port.
pub async fn spawn_stub_upstream(token: &str) -> anyhow::Result<StubUpstream> {
    spawn(Behavior::Serve {
        token: token.to_string(),
    })
    .await
}

/// Answer every request with `status` and a small JSON body.
///
/// # Errors
///
/// Returns an error if `status` is not a valid HTTP status or the stub cannot bind a local port.
pub async fn spawn_failing_upstream(status: u16) -> anyhow::Result<StubUpstream> {
    let status = StatusCode::from_u16(status).context("invalid status")?;
    spawn(Behavior::Fail(status)).await
}

async fn spawn(behavior: Behavior) -> anyhow::Result<StubUpstream> {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        behavior,
        requests: requests.clone(),
    };

    let app = Router::new().fallback(handle).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind stub upstream")?;
    let addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = shutdown_rx.await;
    });
    tokio::spawn(async move { server.await });

    Ok(StubUpstream {
        base_url: format!("http://{addr}{STUB_PREFIX}"),
        requests,
        shutdown: Some(shutdown_tx),
    })
}

async fn handle(
    axum::extract::State(state): axum::extract::State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    state.requests.lock().push(format!("{method} {}", uri.path()));

    let token = match &state.behavior {
        Behavior::Fail(status) => {
            return (*status, Json(json!({ "message": "stub failure" }))).into_response();
        }
        Behavior::Serve { token } => token,
    };

    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|v| v == token);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid token" })),
        )
            .into_response();
    }

    if method != Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let Some(rest) = uri.path().strip_prefix(STUB_PREFIX) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let instances = stub_instances();
    if rest == "/instance" {
        return Json(instances).into_response();
    }

    let found = rest.strip_prefix("/instance/").and_then(|name| {
        instances
            .as_array()
            .and_then(|all| all.iter().find(|i| i.get("name") == Some(&json!(name))))
            .cloned()
    });
    match found {
        Some(instance) => Json(instance).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Instance not found" })),
        )
            .into_response(),
    }
}
