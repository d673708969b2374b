//! Shared application state.

use instagraph_core::InstaGraphConfig;
use instagraph_runtime::Orchestrator;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: InstaGraphConfig,
    pub orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(config: InstaGraphConfig, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            orchestrator,
        }
    }
}
