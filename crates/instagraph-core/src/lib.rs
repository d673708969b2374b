//! InstaGraph Core — knowledge graph schema, output repair, visualization envelope.

pub mod config;
pub mod error;
pub mod model;
pub mod repair;
pub mod view;

pub use config::{DataPaths, InstaGraphConfig};
pub use error::{Error, Result};
pub use model::{Edge, KnowledgeGraph, Metadata, Node, Properties};
pub use repair::{correct_json, strip_trailing_commas};
pub use view::{EdgeData, EdgeElement, GraphView, NodeData, NodeElement};
