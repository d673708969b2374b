//! The persistence contract and startup-time backend selection.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use instagraph_core::{Error, GraphView, InstaGraphConfig, KnowledgeGraph, Result};
use tracing::{info, warn};

use crate::neo4j::{Neo4jBackend, Neo4jConfig};
use crate::sqlite::SqliteBackend;
use crate::types::{HistoryPage, StoreOutcome};

/// Which backend the process was asked to run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    None,
    Sqlite,
    Neo4j,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::None => write!(f, "none"),
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::Neo4j => write!(f, "neo4j"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = std::convert::Infallible;

    /// Unknown names select no backend.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "neo4j" => BackendKind::Neo4j,
            "sqlite" => BackendKind::Sqlite,
            _ => BackendKind::None,
        })
    }
}

/// Uniform contract over graph history backends.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Append `graph` as a new immutable version. It becomes the current graph.
    async fn store(&self, graph: &KnowledgeGraph) -> Result<StoreOutcome>;

    /// The current graph in visualization form.
    ///
    /// `working` is the in-memory graph; only the no-backend variant reads it.
    async fn current_view(&self, working: Option<&KnowledgeGraph>) -> Result<GraphView>;

    /// Up to `limit` entries after skipping `skip`, newest first.
    async fn history(&self, skip: u64, limit: u64) -> Result<HistoryPage>;

    /// Trivial read used for health reporting.
    async fn ping(&self) -> Result<()>;
}

/// Pure in-memory mode: nothing is persisted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBackend;

#[async_trait]
impl GraphBackend for NoBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::None
    }

    async fn store(&self, _graph: &KnowledgeGraph) -> Result<StoreOutcome> {
        Ok(StoreOutcome::Skipped)
    }

    async fn current_view(&self, working: Option<&KnowledgeGraph>) -> Result<GraphView> {
        Ok(working.map(GraphView::from_graph).unwrap_or_default())
    }

    async fn history(&self, _skip: u64, limit: u64) -> Result<HistoryPage> {
        check_limit(limit)?;
        Ok(HistoryPage::no_backend())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

pub(crate) fn check_limit(limit: u64) -> Result<()> {
    if limit == 0 {
        return Err(Error::InvalidInput("history limit must be positive".into()));
    }
    Ok(())
}

/// Build the requested backend once at startup.
///
/// A backend that cannot be configured or reached is replaced by
/// [`NoBackend`] with a warning; this never fails.
pub async fn select_backend(
    kind: BackendKind,
    config: &InstaGraphConfig,
) -> Arc<dyn GraphBackend> {
    let result: Result<Arc<dyn GraphBackend>> = match kind {
        BackendKind::None => return Arc::new(NoBackend),
        BackendKind::Sqlite => SqliteBackend::open(&config.data_paths.sqlite_db)
            .map(|b| Arc::new(b) as Arc<dyn GraphBackend>),
        BackendKind::Neo4j => match Neo4jConfig::from_env() {
            Ok(neo4j_config) => Neo4jBackend::connect(neo4j_config)
                .await
                .map(|b| Arc::new(b) as Arc<dyn GraphBackend>),
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(backend) => {
            info!("Graph backend ready: {}", kind);
            backend
        }
        Err(e) => {
            warn!(
                "Warning: {} configuration missing or invalid ({}), running without graph database",
                kind, e
            );
            Arc::new(NoBackend)
        }
    }
}
