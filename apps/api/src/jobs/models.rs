use async_trait::async_trait;
use thiserror::Error;

/// A job posting exactly as the provider returned it. Fields vary by
/// provider (title, companyName, location, link, ...) and are passed through.
pub type JobRecord = serde_json::Map<String, serde_json::Value>;

/// One search against the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobQuery {
    pub title: String,
    pub location: String,
    pub rows: u32,
}

#[derive(Debug, Error)]
pub enum JobSearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A job-search backend. `JobFetcher` holds an `Arc<dyn JobSearchProvider>`
/// so the HTTP provider can be swapped for a fake in tests.
#[async_trait]
pub trait JobSearchProvider: Send + Sync {
    async fn search(&self, query: &JobQuery) -> Result<Vec<JobRecord>, JobSearchError>;
}
