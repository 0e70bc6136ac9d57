use crate::analysis::pipeline::AnalysisPipeline;
use crate::config::Config;
use crate::jobs::fetcher::JobFetcher;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once in `main`; nothing in it is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    /// Wraps the LLM client (`Arc<dyn TextGenerator>`).
    pub pipeline: AnalysisPipeline,
    /// Wraps the job provider, if `APIFY_API_TOKEN` is set.
    pub jobs: JobFetcher,
    pub config: Config,
}
