//! InstaGraph Store — pluggable graph history persistence.
//!
//! Every backend implements [`GraphBackend`]. `NoBackend` keeps the process
//! in pure in-memory mode, `SqliteBackend` embeds the history in a local
//! database file, and `Neo4jBackend` talks to a Neo4j server over its HTTP
//! transactional Cypher endpoint.

pub mod backend;
pub mod neo4j;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use backend::{select_backend, BackendKind, GraphBackend, NoBackend};
pub use neo4j::{Neo4jBackend, Neo4jConfig};
pub use sqlite::SqliteBackend;
pub use types::*;
