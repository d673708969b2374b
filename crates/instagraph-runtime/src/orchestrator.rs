//! One extraction request, start to finish.

use std::sync::Arc;

use chrono::Utc;
use instagraph_core::{correct_json, GraphView, KnowledgeGraph};
use instagraph_ingest::PageScraper;
use instagraph_llm::{CompletionClient, ToolSpec};
use instagraph_store::{BackendKind, GraphBackend, HistoryPage, StoreOutcome};
use tracing::{debug, error, info, warn};

use crate::error::ExtractError;
use crate::extract::{build_prompt, detect_mode, is_url};
use crate::types::{HealthReport, ServiceStatus, HISTORY_PAGE_SIZE};
use crate::working::WorkingGraph;

pub struct Orchestrator {
    client: Arc<dyn CompletionClient>,
    scraper: Arc<dyn PageScraper>,
    backend: Arc<dyn GraphBackend>,
    working: WorkingGraph,
    tool: ToolSpec,
    language: String,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        scraper: Arc<dyn PageScraper>,
        backend: Arc<dyn GraphBackend>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            client,
            scraper,
            backend,
            working: WorkingGraph::new(),
            tool: ToolSpec::for_type::<KnowledgeGraph>(),
            language: language.into(),
        }
    }

    pub fn working(&self) -> &WorkingGraph {
        &self.working
    }

    /// Turn user input into a new current graph.
    ///
    /// The working graph is replaced before persistence runs, so a storage
    /// failure still leaves the new graph in memory.
    pub async fn extract(&self, user_input: &str) -> Result<KnowledgeGraph, ExtractError> {
        let input = user_input.trim();
        if input.is_empty() {
            return Err(ExtractError::EmptyInput);
        }

        let text = if is_url(input) {
            info!("Fetching page content from {}", input);
            self.scraper
                .scrape(input)
                .await
                .map_err(|e| ExtractError::Scrape(e.to_string()))?
        } else {
            input.to_string()
        };

        let mode = detect_mode(text.trim());
        if mode.text().trim().is_empty() {
            return Err(ExtractError::EmptyInput);
        }

        let current = if mode.is_patch() { self.working.snapshot() } else { None };
        let prompt = build_prompt(&mode, current.as_ref(), &self.language);
        debug!(patch = mode.is_patch(), prompt_len = prompt.len(), "Requesting completion");

        let raw = self.client.complete(&prompt, &self.tool).await.map_err(|e| {
            error!("Completion failed: {}", e);
            ExtractError::from(e)
        })?;

        let value = correct_json(&raw).map_err(ExtractError::Malformed)?;
        let graph = KnowledgeGraph::from_value(value).map_err(|e| {
            error!("Model output failed schema binding: {}", e);
            ExtractError::Malformed(e)
        })?;

        for edge in graph.dangling_edges() {
            warn!(
                "Edge '{}' references unknown node ({} -> {})",
                edge.relationship, edge.source, edge.to
            );
        }

        self.working.replace(graph.clone());

        match self.backend.store(&graph).await {
            Ok(StoreOutcome::Stored { seq, nodes, edges, .. }) => {
                info!("Stored graph version {} ({} nodes, {} edges)", seq, nodes, edges);
            }
            Ok(StoreOutcome::Skipped) => debug!("No graph backend, graph kept in memory only"),
            Err(e) => {
                error!("Failed to persist graph: {}", e);
                return Err(ExtractError::Persistence(e));
            }
        }

        Ok(graph)
    }

    /// Current graph for the visualizer. Backend failures yield an empty view.
    pub async fn graph_view(&self) -> GraphView {
        let working = self.working.snapshot();
        match self.backend.current_view(working.as_ref()).await {
            Ok(view) => view,
            Err(e) => {
                error!("Failed to load current graph: {}", e);
                GraphView::empty()
            }
        }
    }

    /// One page of stored history, newest first. Pages start at 1; 0 is read as 1.
    pub async fn history(&self, page: u64) -> instagraph_core::Result<HistoryPage> {
        let skip = page.saturating_sub(1).saturating_mul(HISTORY_PAGE_SIZE);
        self.backend.history(skip, HISTORY_PAGE_SIZE).await
    }

    pub async fn health(&self) -> HealthReport {
        let openai = if self.client.is_configured() { "configured" } else { "unknown" };
        let database = match self.backend.kind() {
            BackendKind::None => "disabled",
            _ => match self.backend.ping().await {
                Ok(()) => "up",
                Err(e) => {
                    warn!("Health check: backend unreachable: {}", e);
                    "down"
                }
            },
        };

        HealthReport {
            status: if database == "down" { "unhealthy" } else { "healthy" }.to_string(),
            timestamp: Utc::now().timestamp(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: ServiceStatus {
                api: "up".to_string(),
                openai: openai.to_string(),
                database: database.to_string(),
            },
        }
    }
}
