//! History entries, pages and store outcomes.

use instagraph_core::KnowledgeGraph;
use serde::{Deserialize, Serialize};

/// Error text reported by history queries when no backend is configured.
pub const NO_BACKEND_MESSAGE: &str = "Graph driver not initialized";

/// A stored graph version. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphHistoryEntry {
    /// Monotonic sequence number; higher is newer.
    pub seq: i64,
    /// Insertion time, unix milliseconds.
    pub created_at: i64,
    pub graph: KnowledgeGraph,
}

/// One page of the history feed, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub graph_history: Vec<GraphHistoryEntry>,
    /// Entries older than this page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether a graph backend answered this query.
    pub graph: bool,
}

impl HistoryPage {
    pub fn from_backend(entries: Vec<GraphHistoryEntry>, total: u64, skip: u64) -> Self {
        let seen = skip.saturating_add(entries.len() as u64);
        Self {
            graph_history: entries,
            remaining: Some(total.saturating_sub(seen)),
            error: None,
            graph: true,
        }
    }

    pub fn no_backend() -> Self {
        Self {
            graph_history: Vec::new(),
            remaining: None,
            error: Some(NO_BACKEND_MESSAGE.to_string()),
            graph: false,
        }
    }
}

/// Result of [`GraphBackend::store`](crate::GraphBackend::store).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StoreOutcome {
    Stored {
        seq: i64,
        created_at: i64,
        nodes: usize,
        edges: usize,
    },
    /// No backend configured; nothing was written.
    Skipped,
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
