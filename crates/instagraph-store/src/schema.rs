//! SQLite schema for versioned graph history.

/// One row per stored graph version plus its materialized nodes and edges.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS graph_versions (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at INTEGER NOT NULL,
    created_date TEXT NOT NULL,
    last_updated TEXT NOT NULL,
    description TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS graph_nodes (
    seq INTEGER NOT NULL REFERENCES graph_versions(seq) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    id TEXT NOT NULL,
    label TEXT NOT NULL,
    node_type TEXT NOT NULL,
    color TEXT NOT NULL,
    properties_json TEXT NOT NULL,
    PRIMARY KEY (seq, position)
);

CREATE TABLE IF NOT EXISTS graph_edges (
    seq INTEGER NOT NULL REFERENCES graph_versions(seq) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    source TEXT NOT NULL,
    target TEXT NOT NULL,
    relationship TEXT NOT NULL,
    direction TEXT NOT NULL,
    color TEXT NOT NULL,
    properties_json TEXT NOT NULL,
    PRIMARY KEY (seq, position)
);

CREATE INDEX IF NOT EXISTS idx_graph_nodes_id ON graph_nodes(seq, id);
CREATE INDEX IF NOT EXISTS idx_graph_edges_source ON graph_edges(seq, source);
"#;
