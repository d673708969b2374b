//! Neo4j backend over the HTTP transactional Cypher endpoint.
//!
//! Every graph version is a `(:GraphVersion)` node holding the full graph as
//! a JSON payload; its nodes are materialized as `(:Entity)` nodes and its
//! edges as `[:RELATES]` relationships tagged with the version `seq`, so the
//! history can also be explored directly in the Neo4j browser.

use std::time::Duration;

use async_trait::async_trait;
use instagraph_core::{Error, GraphView, KnowledgeGraph, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::backend::{check_limit, BackendKind, GraphBackend};
use crate::types::{now_millis, GraphHistoryEntry, HistoryPage, StoreOutcome};

const CREATE_VERSION: &str = "\
OPTIONAL MATCH (v:GraphVersion)
WITH coalesce(max(v.seq), 0) + 1 AS seq
CREATE (g:GraphVersion {seq: seq, createdAt: $created_at, createdDate: $created_date,
    lastUpdated: $last_updated, description: $description, payload: $payload})
FOREACH (n IN $nodes |
    CREATE (:Entity {seq: seq, id: n.id, label: n.label, type: n.type, color: n.color,
        properties: n.properties}))
WITH seq
CALL {
    WITH seq
    UNWIND $edges AS e
    MATCH (a:Entity {seq: seq, id: e.from})
    MATCH (b:Entity {seq: seq, id: e.to})
    CREATE (a)-[:RELATES {seq: seq, relationship: e.relationship, direction: e.direction,
        color: e.color, properties: e.properties}]->(b)
}
RETURN seq";

const LATEST_PAYLOAD: &str = "\
MATCH (g:GraphVersion)
RETURN g.payload AS payload
ORDER BY g.seq DESC
LIMIT 1";

const HISTORY_PAGE: &str = "\
MATCH (g:GraphVersion)
RETURN g.seq AS seq, g.createdAt AS createdAt, g.payload AS payload
ORDER BY g.seq DESC
SKIP $skip LIMIT $limit";

const COUNT_VERSIONS: &str = "MATCH (g:GraphVersion) RETURN count(g) AS total";

const SEQ_CONSTRAINT: &str =
    "CREATE CONSTRAINT graph_version_seq IF NOT EXISTS FOR (g:GraphVersion) REQUIRE g.seq IS UNIQUE";

/// Connection settings, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    /// HTTP(S) base URL, e.g. `http://localhost:7474`.
    pub url: String,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl Neo4jConfig {
    /// `NEO4J_URL`, `NEO4J_USERNAME` and `NEO4J_PASSWORD` are required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{} not set", key)))
        };

        let url = required("NEO4J_URL")?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "NEO4J_URL must be an http(s) URL, got {}",
                url
            )));
        }

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            username: required("NEO4J_USERNAME")?,
            password: required("NEO4J_PASSWORD")?,
            database: lookup("NEO4J_DATABASE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "neo4j".into()),
        })
    }

    fn commit_url(&self) -> String {
        format!("{}/db/{}/tx/commit", self.url, self.database)
    }
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<CypherError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CypherError {
    code: String,
    message: String,
}

pub struct Neo4jBackend {
    client: Client,
    config: Neo4jConfig,
}

impl Neo4jBackend {
    /// Build the client, verify connectivity and ensure the version constraint.
    pub async fn connect(config: Neo4jConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        let backend = Self { client, config };
        backend.run(vec![statement(SEQ_CONSTRAINT, json!({}))]).await?;
        info!(
            "Neo4jBackend connected: url={}, database={}",
            backend.config.url, backend.config.database
        );
        Ok(backend)
    }

    /// Execute statements in a single auto-committed transaction.
    async fn run(&self, statements: Vec<Value>) -> Result<Vec<StatementResult>> {
        let response = self
            .client
            .post(self.config.commit_url())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("Accept", "application/json;charset=UTF-8")
            .json(&json!({ "statements": statements }))
            .send()
            .await
            .map_err(|e| Error::Http(format!("Neo4j request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Neo4j HTTP error");
            return Err(Error::Database(format!("Neo4j HTTP {}: {}", status, body)));
        }

        let body: CommitResponse = response
            .json()
            .await
            .map_err(|e| Error::Database(format!("Invalid Neo4j response: {}", e)))?;

        if let Some(err) = body.errors.first() {
            return Err(Error::Database(format!("{}: {}", err.code, err.message)));
        }
        Ok(body.results)
    }

    fn graph_params(graph: &KnowledgeGraph, created_at: i64) -> Result<Value> {
        let nodes: Vec<Value> = graph
            .nodes
            .iter()
            .map(|n| -> Result<Value> {
                Ok(json!({
                    "id": n.id,
                    "label": n.label,
                    "type": n.node_type,
                    "color": n.color,
                    "properties": serde_json::to_string(&n.properties)?,
                }))
            })
            .collect::<Result<Vec<Value>>>()?;

        let edges: Vec<Value> = graph
            .edges
            .iter()
            .map(|e| -> Result<Value> {
                Ok(json!({
                    "from": e.source,
                    "to": e.to,
                    "relationship": e.relationship,
                    "direction": e.direction,
                    "color": e.color,
                    "properties": serde_json::to_string(&e.properties)?,
                }))
            })
            .collect::<Result<Vec<Value>>>()?;

        Ok(json!({
            "created_at": created_at,
            "created_date": graph.metadata.created_date,
            "last_updated": graph.metadata.last_updated,
            "description": graph.metadata.description,
            "payload": serde_json::to_string(graph)?,
            "nodes": nodes,
            "edges": edges,
        }))
    }
}

/// Cypher integers are signed 64-bit.
fn clamp_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn statement(cypher: &str, parameters: Value) -> Value {
    json!({ "statement": cypher, "parameters": parameters })
}

fn first_cell(results: &[StatementResult], index: usize) -> Option<&Value> {
    results
        .get(index)
        .and_then(|r| r.data.first())
        .and_then(|d| d.row.first())
}

fn parse_payload(value: &Value) -> Result<KnowledgeGraph> {
    let text = value
        .as_str()
        .ok_or_else(|| Error::Database("GraphVersion payload is not a string".into()))?;
    KnowledgeGraph::from_json_str(text)
}

#[async_trait]
impl GraphBackend for Neo4jBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Neo4j
    }

    async fn store(&self, graph: &KnowledgeGraph) -> Result<StoreOutcome> {
        let created_at = now_millis();
        let results = self
            .run(vec![statement(CREATE_VERSION, Self::graph_params(graph, created_at)?)])
            .await?;

        let seq = first_cell(&results, 0)
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::Database("Neo4j did not return a version seq".into()))?;

        debug!("Stored graph version {} in Neo4j", seq);
        Ok(StoreOutcome::Stored {
            seq,
            created_at,
            nodes: graph.nodes.len(),
            edges: graph.edges.len(),
        })
    }

    async fn current_view(&self, _working: Option<&KnowledgeGraph>) -> Result<GraphView> {
        let results = self.run(vec![statement(LATEST_PAYLOAD, json!({}))]).await?;
        match first_cell(&results, 0) {
            Some(payload) => Ok(GraphView::from_graph(&parse_payload(payload)?)),
            None => Ok(GraphView::empty()),
        }
    }

    async fn history(&self, skip: u64, limit: u64) -> Result<HistoryPage> {
        check_limit(limit)?;
        let results = self
            .run(vec![
                statement(
                    HISTORY_PAGE,
                    json!({ "skip": clamp_i64(skip), "limit": clamp_i64(limit) }),
                ),
                statement(COUNT_VERSIONS, json!({})),
            ])
            .await?;

        let mut entries = Vec::new();
        if let Some(page) = results.first() {
            for data in &page.data {
                let seq = data.row.first().and_then(Value::as_i64).unwrap_or_default();
                let created_at = data.row.get(1).and_then(Value::as_i64).unwrap_or_default();
                let graph = match data.row.get(2) {
                    Some(payload) => parse_payload(payload)?,
                    None => continue,
                };
                entries.push(GraphHistoryEntry {
                    seq,
                    created_at,
                    graph,
                });
            }
        }

        let total = first_cell(&results, 1)
            .and_then(Value::as_u64)
            .unwrap_or(entries.len() as u64);
        Ok(HistoryPage::from_backend(entries, total, skip))
    }

    async fn ping(&self) -> Result<()> {
        self.run(vec![statement("RETURN 1", json!({}))]).await.map(|_| ())
    }
}
