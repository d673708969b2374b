//! Visualization envelope: every node and edge wrapped in a `data` object.
//!
//! Both the backend read path and the in-memory path build views through
//! [`GraphView::from_graph`], so the shapes cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::model::KnowledgeGraph;

const DEFAULT_COLOR: &str = "defaultColor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: String,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    pub source: String,
    pub target: String,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeElement {
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeElement {
    pub data: EdgeData,
}

/// UI-ready node/edge lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<NodeElement>,
    pub edges: Vec<EdgeElement>,
}

impl GraphView {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_graph(graph: &KnowledgeGraph) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|node| NodeElement {
                data: NodeData {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    color: color_or_default(&node.color),
                },
            })
            .collect();

        let edges = graph
            .edges
            .iter()
            .map(|edge| EdgeElement {
                data: EdgeData {
                    source: edge.source.clone(),
                    target: edge.to.clone(),
                    label: edge.relationship.clone(),
                    color: color_or_default(&edge.color),
                },
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

fn color_or_default(color: &str) -> String {
    if color.trim().is_empty() {
        DEFAULT_COLOR.to_string()
    } else {
        color.to_string()
    }
}
