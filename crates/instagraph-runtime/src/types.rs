//! Reports produced by the orchestrator outside the extraction path.

use serde::{Deserialize, Serialize};

/// Entries per history page.
pub const HISTORY_PAGE_SIZE: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceStatus {
    pub api: String,
    pub openai: String,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthReport {
    pub status: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub version: String,
    pub services: ServiceStatus,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
