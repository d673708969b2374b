//! Paged graph history.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::error;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/get_graph_history", get(get_graph_history))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    page: Option<String>,
}

impl HistoryQuery {
    /// Missing or non-numeric pages read as the first page.
    fn page(&self) -> u64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }
}

/// GET /get_graph_history?page=N — ten entries per page, newest first.
async fn get_graph_history(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Response {
    let page = query.map(|Query(q)| q.page()).unwrap_or(1);
    match state.orchestrator.history(page).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => {
            error!("Failed to load graph history: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string(), "graph": true })),
            )
                .into_response()
        }
    }
}
