mod analysis;
mod config;
mod errors;
mod jobs;
mod llm_client;
mod pdf;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::pipeline::AnalysisPipeline;
use crate::config::Config;
use crate::jobs::apify::ApifyClient;
use crate::jobs::fetcher::JobFetcher;
use crate::jobs::models::JobSearchProvider;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobPilot API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = GeminiClient::new(config.gemini_api_key.clone(), &config.gemini_base_url)?
        .with_max_retries(config.llm_max_retries);
    if llm.is_configured() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    } else {
        warn!("GEMINI_API_KEY not set; analysis steps will return a placeholder");
    }

    // Initialize job provider
    let provider: Option<Arc<dyn JobSearchProvider>> = match &config.apify_api_token {
        Some(token) => {
            let client = ApifyClient::new(token.clone(), &config.apify_base_url)?;
            info!("Apify job provider initialized");
            Some(Arc::new(client))
        }
        None => {
            warn!("APIFY_API_TOKEN not set; job searches will return no results");
            None
        }
    };

    // Build app state
    let state = AppState {
        pipeline: AnalysisPipeline::new(Arc::new(llm)),
        jobs: JobFetcher::new(provider, config.default_job_location.clone()),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
