// HTTP read surface over the stats client

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::client::StatsClient;
use crate::docker_repo::RuntimeClient;

pub(crate) struct AppState<R> {
    pub(crate) client: Arc<StatsClient<R>>,
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

pub fn app<R: RuntimeClient>(client: Arc<StatsClient<R>>) -> Router {
    let state = AppState { client };
    Router::new()
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/node", get(http::node_handler::<R>)) // GET /api/node
        .route("/api/containers", get(http::containers_handler::<R>)) // GET /api/containers
        .route("/api/infos", get(http::infos_handler::<R>)) // GET /api/infos
        .route("/api/machine", get(http::machine_handler::<R>)) // GET /api/machine
        .route("/api/runtime/version", get(http::runtime_version_handler::<R>)) // GET /api/runtime/version
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
