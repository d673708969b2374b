//! InstaGraph — turn text or a web page into a knowledge graph.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use instagraph_core::InstaGraphConfig;
use instagraph_ingest::HttpScraper;
use instagraph_llm::{LLMConfig, OpenAICompatClient};
use instagraph_runtime::Orchestrator;
use instagraph_server::{build_router, AppState};
use instagraph_store::{select_backend, BackendKind};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "instagraph", version, about = "Knowledge graph extraction server")]
struct Args {
    /// Verbose logging (default filter `debug` instead of `info`).
    #[arg(long)]
    debug: bool,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Graph history backend: neo4j, sqlite or none.
    #[arg(long, default_value = "neo4j")]
    graph: String,

    #[arg(long, env = "INSTAGRAPH_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    info!("Data directory: {}", args.data_dir.display());
    let config = InstaGraphConfig::from_env(&args.data_dir)?.with_port(args.port);

    let llm_config = LLMConfig::from_env();
    if !llm_config.is_configured() {
        warn!("OPENAI_API_KEY not set; extraction requests will fail with 401");
    }
    let language = llm_config.language.clone();
    let client = OpenAICompatClient::new(llm_config)
        .map_err(|e| anyhow::anyhow!("Failed to build completion client: {}", e))?;
    let scraper = HttpScraper::new()
        .map_err(|e| anyhow::anyhow!("Failed to build page scraper: {}", e))?;

    let kind: BackendKind = args.graph.parse()?;
    let backend = select_backend(kind, &config).await;

    let orchestrator = Orchestrator::new(Arc::new(client), Arc::new(scraper), backend, language);
    let port = config.port;
    let state = Arc::new(AppState::new(config, orchestrator));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("InstaGraph server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
