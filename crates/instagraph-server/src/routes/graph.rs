//! Extraction and current-graph routes.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/get_response_data", post(get_response_data))
        .route("/get_graph_data", post(get_graph_data))
}

#[derive(Debug, Deserialize)]
struct ResponseDataRequest {
    #[serde(default)]
    user_input: String,
}

/// POST /get_response_data — build or patch the current graph.
async fn get_response_data(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ResponseDataRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(req) => req,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": rejection.body_text() })),
            )
                .into_response();
        }
    };

    match state.orchestrator.extract(&req.user_input).await {
        Ok(graph) => (StatusCode::OK, Json(graph)).into_response(),
        Err(e) => {
            let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
            (
                status,
                Json(serde_json::json!({ "error": e.user_message() })),
            )
                .into_response()
        }
    }
}

/// POST /get_graph_data — current graph in visualizer form. Never fails.
async fn get_graph_data(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let view = state.orchestrator.graph_view().await;
    Json(serde_json::json!({ "elements": view }))
}
