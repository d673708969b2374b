//! Structured completions against OpenAI-compatible chat APIs.
//!
//! The response is forced through a single function/tool whose parameters
//! are the JSON Schema of the requested type, so the model returns data
//! rather than prose. The raw JSON text is handed back unparsed; repair and
//! binding happen in the caller.

pub mod config;
pub mod error;
pub mod providers;
pub mod schema;
pub mod types;

pub use config::LLMConfig;
pub use error::CompletionError;
pub use providers::{CompletionClient, OpenAICompatClient};
pub use schema::ToolSpec;
