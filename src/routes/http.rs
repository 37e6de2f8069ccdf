// GET handlers: version, node, containers, infos, machine, runtime version

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::AppState;
use crate::docker_repo::RuntimeClient;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn error_response(status: StatusCode, e: impl std::fmt::Display) -> Response {
    (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
}

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/node: root record from the latest aggregate state.
pub(super) async fn node_handler<R: RuntimeClient>(State(state): State<AppState<R>>) -> Response {
    Json(state.client.node_stats()).into_response()
}

/// GET /api/containers: per-container records; 502 if the runtime query fails.
pub(super) async fn containers_handler<R: RuntimeClient>(
    State(state): State<AppState<R>>,
) -> Response {
    match state.client.all_container_stats().await {
        Ok(infos) => Json(infos).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, operation = "all_container_stats", "container stats failed");
            error_response(StatusCode::BAD_GATEWAY, e)
        }
    }
}

/// GET /api/infos: root under "/" plus every container.
pub(super) async fn infos_handler<R: RuntimeClient>(State(state): State<AppState<R>>) -> Response {
    match state.client.container_infos().await {
        Ok(infos) => Json(infos).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, operation = "container_infos", "container infos failed");
            error_response(StatusCode::BAD_GATEWAY, e)
        }
    }
}

pub(super) async fn machine_handler<R: RuntimeClient>(
    State(state): State<AppState<R>>,
) -> Response {
    match state.client.machine_info() {
        Ok(info) => Json(info).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

pub(super) async fn runtime_version_handler<R: RuntimeClient>(
    State(state): State<AppState<R>>,
) -> Response {
    match state.client.version_info().await {
        Ok(info) => Json(info).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, operation = "server_version", "runtime version failed");
            error_response(StatusCode::BAD_GATEWAY, e)
        }
    }
}
