//! HTTP route handlers for the visualizer front end.

pub mod graph;
pub mod health;
pub mod history;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::RETRY_AFTER;
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::state::AppState;

/// Seconds free-plan clients are asked to wait between requests.
const FREE_PLAN_RETRY_AFTER: &str = "20";

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.data_paths.static_dir.clone();

    let mut router = Router::new()
        .merge(graph::routes())
        .merge(history::routes())
        .merge(health::routes());

    router = if static_dir.join("index.html").is_file() {
        info!("Serving UI from {}", static_dir.display());
        router.fallback_service(ServeDir::new(static_dir))
    } else {
        router.route("/", get(banner))
    };

    router
        .layer(middleware::from_fn_with_state(state.clone(), retry_after))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn banner() -> &'static str {
    "InstaGraph is running. POST /get_response_data with {\"user_input\": \"...\"} to build a graph."
}

async fn retry_after(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    if state.config.is_free_plan() {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from_static(FREE_PLAN_RETRY_AFTER));
    }
    response
}
