//! HTTP surface: `GET /tools` and `POST /tools/{tool_name}`.

use crate::tools::{Tool, descriptors};
use crate::upstream::XanoClient;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Map, Value};

#[derive(Clone)]
pub struct AppState {
    pub client: XanoClient,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tools", get(list_tools).fallback(not_found))
        .route("/tools/{tool_name}", post(invoke_tool).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
}

async fn list_tools() -> impl IntoResponse {
    Json(descriptors())
}

async fn invoke_tool(
    State(state): State<AppState>,
    Path(tool_name): Path<String>,
    body: Bytes,
) -> Response {
    let Some(tool) = Tool::from_name(&tool_name) else {
        tracing::debug!(tool = %tool_name, "unknown tool");
        return (StatusCode::NOT_FOUND, format!("Tool {tool_name} not found")).into_response();
    };

    let params = match parse_params(&body) {
        Ok(p) => p,
        Err(msg) => return (StatusCode::BAD_REQUEST, msg).into_response(),
    };

    tracing::debug!(tool = tool.name(), "invoking tool");
    Json(tool.invoke(&state.client, &params).await).into_response()
}

/// An empty body means no parameters. Anything else must be a JSON object.
fn parse_params(body: &[u8]) -> Result<Map<String, Value>, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("Request body must be a JSON object".to_string()),
        Err(e) => Err(format!("Invalid JSON body: {e}")),
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
