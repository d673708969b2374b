//! Embedded graph history backed by a single SQLite file.
//!
//! Each stored graph becomes one `graph_versions` row and its nodes and
//! edges are materialized in `graph_nodes` / `graph_edges`, keyed by the
//! version sequence number and their position in the original graph.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use instagraph_core::{
    Edge, Error, GraphView, KnowledgeGraph, Metadata, Node, Properties, Result,
};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::backend::{check_limit, BackendKind, GraphBackend};
use crate::schema::SCHEMA_SQL;
use crate::types::{now_millis, GraphHistoryEntry, HistoryPage, StoreOutcome};

pub struct SqliteBackend {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteBackend {
    /// Open or create the history database at `db_path`.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
            }
        }

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let backend = Self {
            conn: Mutex::new(conn),
            db_path,
        };
        info!(
            "SqliteBackend initialized: {} versions, path={}",
            backend.count_versions()?,
            backend.db_path.display()
        );
        Ok(backend)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    pub fn count_versions(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM graph_versions", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count.max(0) as u64)
    }

    /// Write a graph version and its nodes/edges in one transaction.
    pub fn insert_version(&self, graph: &KnowledgeGraph, created_at: i64) -> Result<i64> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(|e| Error::Database(e.to_string()))?;

        tx.execute(
            "INSERT INTO graph_versions (created_at, created_date, last_updated, description)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                created_at,
                graph.metadata.created_date,
                graph.metadata.last_updated,
                graph.metadata.description
            ],
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        let seq = tx.last_insert_rowid();

        {
            let mut insert_node = tx
                .prepare_cached(
                    "INSERT INTO graph_nodes (seq, position, id, label, node_type, color, properties_json)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(|e| Error::Database(e.to_string()))?;
            for (position, node) in graph.nodes.iter().enumerate() {
                let props = serde_json::to_string(&node.properties)?;
                insert_node
                    .execute(params![
                        seq,
                        position as i64,
                        node.id,
                        node.label,
                        node.node_type,
                        node.color,
                        props
                    ])
                    .map_err(|e| Error::Database(e.to_string()))?;
            }

            let mut insert_edge = tx
                .prepare_cached(
                    "INSERT INTO graph_edges (seq, position, source, target, relationship, direction, color, properties_json)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .map_err(|e| Error::Database(e.to_string()))?;
            for (position, edge) in graph.edges.iter().enumerate() {
                let props = serde_json::to_string(&edge.properties)?;
                insert_edge
                    .execute(params![
                        seq,
                        position as i64,
                        edge.source,
                        edge.to,
                        edge.relationship,
                        edge.direction,
                        edge.color,
                        props
                    ])
                    .map_err(|e| Error::Database(e.to_string()))?;
            }
        }

        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        debug!(
            "Stored graph version {}: {} nodes, {} edges",
            seq,
            graph.nodes.len(),
            graph.edges.len()
        );
        Ok(seq)
    }

    /// Newest version sequence number, if any.
    pub fn latest_seq(&self) -> Result<Option<i64>> {
        let conn = self.conn.lock();
        conn.query_row("SELECT MAX(seq) FROM graph_versions", [], |row| {
            row.get::<_, Option<i64>>(0)
        })
        .map_err(|e| Error::Database(e.to_string()))
    }

    /// Rebuild one stored version.
    pub fn load_version(&self, seq: i64) -> Result<Option<GraphHistoryEntry>> {
        let conn = self.conn.lock();
        Self::load_version_with(&conn, seq)
    }

    /// Versions newest-first, `limit` rows after skipping `skip`.
    pub fn list_versions(&self, skip: u64, limit: u64) -> Result<Vec<GraphHistoryEntry>> {
        let conn = self.conn.lock();
        let seqs: Vec<i64> = {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT seq FROM graph_versions ORDER BY seq DESC LIMIT ?1 OFFSET ?2",
                )
                .map_err(|e| Error::Database(e.to_string()))?;
            // SQLite reads a negative OFFSET as 0, so out-of-range values must not wrap.
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            let skip = i64::try_from(skip).unwrap_or(i64::MAX);
            let rows = stmt
                .query_map(params![limit, skip], |row| row.get(0))
                .map_err(|e| Error::Database(e.to_string()))?;
            rows.collect::<std::result::Result<Vec<i64>, _>>()
                .map_err(|e| Error::Database(e.to_string()))?
        };

        let mut entries = Vec::with_capacity(seqs.len());
        for seq in seqs {
            if let Some(entry) = Self::load_version_with(&conn, seq)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    fn load_version_with(conn: &Connection, seq: i64) -> Result<Option<GraphHistoryEntry>> {
        let header = conn
            .prepare_cached(
                "SELECT created_at, created_date, last_updated, description
                 FROM graph_versions WHERE seq = ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![seq], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    Metadata {
                        created_date: row.get(1)?,
                        last_updated: row.get(2)?,
                        description: row.get(3)?,
                    },
                ))
            })
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        let Some((created_at, metadata)) = header else {
            return Ok(None);
        };

        let nodes = {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT id, label, node_type, color, properties_json
                     FROM graph_nodes WHERE seq = ?1 ORDER BY position",
                )
                .map_err(|e| Error::Database(e.to_string()))?;
            let rows = stmt
                .query_map(params![seq], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })
                .map_err(|e| Error::Database(e.to_string()))?;

            let mut nodes = Vec::new();
            for row in rows {
                let (id, label, node_type, color, props) =
                    row.map_err(|e| Error::Database(e.to_string()))?;
                nodes.push(Node {
                    id,
                    label,
                    node_type,
                    color,
                    properties: parse_properties(&props)?,
                });
            }
            nodes
        };

        let edges = {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT source, target, relationship, direction, color, properties_json
                     FROM graph_edges WHERE seq = ?1 ORDER BY position",
                )
                .map_err(|e| Error::Database(e.to_string()))?;
            let rows = stmt
                .query_map(params![seq], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                })
                .map_err(|e| Error::Database(e.to_string()))?;

            let mut edges = Vec::new();
            for row in rows {
                let (source, to, relationship, direction, color, props) =
                    row.map_err(|e| Error::Database(e.to_string()))?;
                edges.push(Edge {
                    source,
                    to,
                    relationship,
                    direction,
                    color,
                    properties: parse_properties(&props)?,
                });
            }
            edges
        };

        Ok(Some(GraphHistoryEntry {
            seq,
            created_at,
            graph: KnowledgeGraph {
                metadata,
                nodes,
                edges,
            },
        }))
    }
}

fn parse_properties(json: &str) -> Result<Properties> {
    Ok(serde_json::from_str(json)?)
}

#[async_trait]
impl GraphBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn store(&self, graph: &KnowledgeGraph) -> Result<StoreOutcome> {
        let created_at = now_millis();
        let seq = self.insert_version(graph, created_at)?;
        Ok(StoreOutcome::Stored {
            seq,
            created_at,
            nodes: graph.nodes.len(),
            edges: graph.edges.len(),
        })
    }

    async fn current_view(&self, _working: Option<&KnowledgeGraph>) -> Result<GraphView> {
        let latest = match self.latest_seq()? {
            Some(seq) => self.load_version(seq)?,
            None => None,
        };
        Ok(latest
            .map(|entry| GraphView::from_graph(&entry.graph))
            .unwrap_or_default())
    }

    async fn history(&self, skip: u64, limit: u64) -> Result<HistoryPage> {
        check_limit(limit)?;
        let entries = self.list_versions(skip, limit)?;
        let total = self.count_versions()?;
        Ok(HistoryPage::from_backend(entries, total, skip))
    }

    async fn ping(&self) -> Result<()> {
        self.latest_seq().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_backend() -> (SqliteBackend, TempDir) {
        let dir = TempDir::new().unwrap();
        let backend = SqliteBackend::open(dir.path().join("instagraph.db")).unwrap();
        (backend, dir)
    }

    fn graph(tag: usize) -> KnowledgeGraph {
        KnowledgeGraph::from_value(json!({
            "metadata": {
                "createdDate": "2024-05-01",
                "lastUpdated": "2024-05-02",
                "description": format!("graph {}", tag)
            },
            "nodes": [
                {"id": "a", "label": format!("A{}", tag), "type": "Person", "color": "#FFE4E1",
                 "properties": {"age": 30, "tags": ["x", "y"]}},
                {"id": "b", "label": "B", "type": "City", "color": "#E0FFFF"}
            ],
            "edges": [
                {"from": "a", "to": "b", "relationship": "lives in", "direction": "forward",
                 "color": "#D3D3D3", "properties": {"since": 2020}},
                {"from": "a", "to": "ghost", "relationship": "visits", "direction": "forward",
                 "color": "#D3D3D3"}
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_store_and_reload() {
        let (backend, _dir) = test_backend();
        let original = graph(1);

        let outcome = backend.store(&original).await.unwrap();
        let seq = match outcome {
            StoreOutcome::Stored { seq, nodes, edges, .. } => {
                assert_eq!(nodes, 2);
                assert_eq!(edges, 2);
                seq
            }
            StoreOutcome::Skipped => panic!("sqlite must store"),
        };

        let entry = backend.load_version(seq).unwrap().unwrap();
        assert_eq!(entry.graph, original);
        assert_eq!(entry.graph.nodes[0].properties["tags"], json!(["x", "y"]));
    }

    #[tokio::test]
    async fn test_current_view_is_latest_version() {
        let (backend, _dir) = test_backend();
        assert!(backend.current_view(None).await.unwrap().is_empty());

        backend.store(&graph(1)).await.unwrap();
        let second = graph(2);
        backend.store(&second).await.unwrap();

        // The working graph is ignored in favour of stored state.
        let other = graph(99);
        let view = backend.current_view(Some(&other)).await.unwrap();
        assert_eq!(view, GraphView::from_graph(&second));
    }

    #[tokio::test]
    async fn test_history_pagination_newest_first() {
        let (backend, _dir) = test_backend();
        for i in 1..=25 {
            backend.store(&graph(i)).await.unwrap();
        }

        let page = backend.history(10, 10).await.unwrap();
        assert!(page.graph);
        assert_eq!(page.remaining, Some(5));
        let seqs: Vec<i64> = page.graph_history.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, (6..=15).rev().collect::<Vec<i64>>());
        assert_eq!(page.graph_history[0].graph.metadata.description, "graph 15");

        let last = backend.history(20, 10).await.unwrap();
        assert_eq!(last.graph_history.len(), 5);
        assert_eq!(last.remaining, Some(0));

        let beyond = backend.history(100, 10).await.unwrap();
        assert!(beyond.graph_history.is_empty());
    }

    #[tokio::test]
    async fn test_history_skip_past_i64_is_empty() {
        let (backend, _dir) = test_backend();
        for i in 1..=3 {
            backend.store(&graph(i)).await.unwrap();
        }

        let page = backend.history(u64::MAX, 10).await.unwrap();
        assert!(page.graph_history.is_empty());
        assert_eq!(page.remaining, Some(0));

        let page = backend.history(i64::MAX as u64 + 1, u64::MAX).await.unwrap();
        assert!(page.graph_history.is_empty());
    }

    #[tokio::test]
    async fn test_ping_and_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.db");
        {
            let backend = SqliteBackend::open(&path).unwrap();
            backend.ping().await.unwrap();
            backend.store(&graph(1)).await.unwrap();
        }
        let reopened = SqliteBackend::open(&path).unwrap();
        assert_eq!(reopened.count_versions().unwrap(), 1);
    }
}
