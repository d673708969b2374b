//! Knowledge graph schema: metadata, nodes, edges.
//!
//! These types are both the binding target for model output and the source
//! of the JSON Schema that constrains the completion call. The edge origin is
//! called `source` in Rust and `from` on the wire; the serde attributes on
//! [`Edge`] are the only place that translation happens.

use std::collections::HashSet;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Open, insertion-ordered attribute map populated freely by the model.
pub type Properties = IndexMap<String, Value>;

/// Metadata for the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// The date the knowledge graph was created
    pub created_date: String,
    /// The date the knowledge graph was last updated
    pub last_updated: String,
    /// Description of the knowledge graph
    pub description: String,
}

/// A node (entity) in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Node {
    /// Unique identifier for the node
    pub id: String,
    /// Label for the node
    pub label: String,
    /// Type of the node
    #[serde(rename = "type")]
    pub node_type: String,
    /// Color for the node
    pub color: String,
    /// Additional attributes for the node
    #[serde(default)]
    pub properties: Properties,
}

/// A directed, labelled relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Edge {
    /// Origin node ID
    #[serde(rename = "from", alias = "from_")]
    pub source: String,
    /// Destination node ID
    pub to: String,
    /// Type of relationship between the nodes
    pub relationship: String,
    /// Direction of the relationship
    pub direction: String,
    /// Color for the edge
    pub color: String,
    /// Additional attributes for the edge
    #[serde(default)]
    pub properties: Properties,
}

/// Generate a knowledge graph with entities and relationships.
///
/// Requirements: labels and relationship descriptions in the requested
/// language (proper nouns may keep their original spelling); detailed,
/// specific node types; concrete relationship descriptions; as many relevant
/// entities and relationships as possible; colors distinguish node and edge
/// categories and are always light tones that pair well with black text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KnowledgeGraph {
    /// Metadata for the knowledge graph
    pub metadata: Metadata,
    /// List of nodes in the knowledge graph
    pub nodes: Vec<Node>,
    /// List of edges in the knowledge graph
    pub edges: Vec<Edge>,
}

const METADATA_FIELDS: &[&str] = &["createdDate", "lastUpdated", "description"];
const NODE_FIELDS: &[&str] = &["id", "label", "type", "color"];
const EDGE_FIELDS: &[&str] = &["to", "relationship", "direction", "color"];

impl KnowledgeGraph {
    /// Bind a parsed JSON value to the schema.
    ///
    /// Missing or mistyped fields are reported with their path, e.g.
    /// `edges[2].relationship`. Duplicate node ids are rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        check_shape(&value)?;
        let graph: KnowledgeGraph = serde_json::from_value(value).map_err(|e| Error::Schema {
            path: "$".into(),
            reason: e.to_string(),
        })?;
        graph.validate_ids()?;
        Ok(graph)
    }

    /// Parse raw JSON text (no repair) and bind it to the schema.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Reject graphs where two nodes share an id.
    pub fn validate_ids(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if !seen.insert(node.id.as_str()) {
                return Err(Error::Schema {
                    path: format!("nodes[{}].id", i),
                    reason: format!("duplicate node id '{}'", node.id),
                });
            }
        }
        Ok(())
    }

    /// Edges whose `from` or `to` does not name a node of this graph.
    pub fn dangling_edges(&self) -> Vec<&Edge> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .filter(|e| !ids.contains(e.source.as_str()) || !ids.contains(e.to.as_str()))
            .collect()
    }
}

/// Walk the raw value and name the first missing or mistyped field.
fn check_shape(value: &Value) -> Result<()> {
    let root = value.as_object().ok_or_else(|| schema_err("$", "expected an object"))?;

    let metadata = root
        .get("metadata")
        .ok_or_else(|| schema_err("metadata", "missing field"))?;
    require_strings(metadata, "metadata", METADATA_FIELDS)?;

    for (i, node) in require_array(root.get("nodes"), "nodes")?.iter().enumerate() {
        let path = format!("nodes[{}]", i);
        require_strings(node, &path, NODE_FIELDS)?;
        check_properties(node, &path)?;
    }

    for (i, edge) in require_array(root.get("edges"), "edges")?.iter().enumerate() {
        let path = format!("edges[{}]", i);
        let has_origin = edge.get("from").or_else(|| edge.get("from_"));
        match has_origin {
            Some(Value::String(_)) => {}
            Some(_) => return Err(schema_err(&format!("{}.from", path), "expected a string")),
            None => return Err(schema_err(&format!("{}.from", path), "missing field")),
        }
        require_strings(edge, &path, EDGE_FIELDS)?;
        check_properties(edge, &path)?;
    }

    Ok(())
}

fn require_array<'a>(value: Option<&'a Value>, path: &str) -> Result<&'a Vec<Value>> {
    match value {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(schema_err(path, "expected an array")),
        None => Err(schema_err(path, "missing field")),
    }
}

fn require_strings(value: &Value, path: &str, fields: &[&str]) -> Result<()> {
    let obj = value
        .as_object()
        .ok_or_else(|| schema_err(path, "expected an object"))?;
    for field in fields {
        match obj.get(*field) {
            Some(Value::String(_)) => {}
            Some(_) => return Err(schema_err(&format!("{}.{}", path, field), "expected a string")),
            None => return Err(schema_err(&format!("{}.{}", path, field), "missing field")),
        }
    }
    Ok(())
}

fn check_properties(value: &Value, path: &str) -> Result<()> {
    match value.get("properties") {
        None | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(schema_err(&format!("{}.properties", path), "expected an object")),
    }
}

fn schema_err(path: &str, reason: &str) -> Error {
    Error::Schema {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
