//! Runtime orchestrator — one extraction request cycle end to end.
//!
//! Owns the working graph, decides between fresh and patch prompts, calls
//! the completion client, repairs and binds the output, and hands the result
//! to the configured graph backend.

pub mod error;
pub mod extract;
pub mod orchestrator;
pub mod types;
pub mod working;

pub use error::ExtractError;
pub use extract::{build_prompt, detect_mode, is_url, InputMode};
pub use orchestrator::Orchestrator;
pub use types::*;
pub use working::WorkingGraph;
