//! The single in-process "current" graph.
//!
//! There is one working graph per process and no per-request isolation.
//! Overlapping extractions race and the last completion to finish wins.

use instagraph_core::KnowledgeGraph;
use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct WorkingGraph {
    current: RwLock<Option<KnowledgeGraph>>,
}

impl WorkingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the current graph, if any extraction has succeeded.
    pub fn snapshot(&self) -> Option<KnowledgeGraph> {
        self.current.read().clone()
    }

    /// Install a new graph, returning the one it replaced.
    pub fn replace(&self, graph: KnowledgeGraph) -> Option<KnowledgeGraph> {
        self.current.write().replace(graph)
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_none()
    }
}
