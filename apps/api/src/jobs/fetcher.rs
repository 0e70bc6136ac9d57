//! Job fetch adapter: turns a keyword string and a location into provider
//! searches and caps the combined result.
//!
//! Soft-fail contract: nothing in here returns an error. A missing provider
//! or a failed search contributes zero records and is logged, so callers
//! always get a (possibly empty) list.

use std::sync::Arc;

use tracing::{info, warn};

use crate::jobs::models::{JobQuery, JobRecord, JobSearchProvider};

/// Rows requested when searching with a single keyword.
pub const DEFAULT_ROWS: u32 = 10;
/// Rows requested per keyword when the search is split.
pub const SPLIT_ROWS: u32 = 5;
/// Only the first keywords are searched when several are given.
pub const MAX_SPLIT_KEYWORDS: usize = 2;
/// Upper bound on records returned, however many were fetched.
pub const MAX_RESULTS: usize = 10;

#[derive(Clone)]
pub struct JobFetcher {
    provider: Option<Arc<dyn JobSearchProvider>>,
    default_location: String,
}

impl JobFetcher {
    pub fn new(provider: Option<Arc<dyn JobSearchProvider>>, default_location: String) -> Self {
        Self {
            provider,
            default_location,
        }
    }

    /// Fetches jobs for `keywords` (comma-separated) in `location`.
    ///
    /// Two or more keywords: one search per keyword for the first
    /// `MAX_SPLIT_KEYWORDS`, `SPLIT_ROWS` each, concatenated in keyword order.
    /// Otherwise a single search for `DEFAULT_ROWS`. At most `MAX_RESULTS` returned.
    pub async fn fetch(&self, keywords: &str, location: Option<&str>) -> Vec<JobRecord> {
        let Some(provider) = &self.provider else {
            warn!("Job provider not configured (APIFY_API_TOKEN missing); returning no jobs");
            return Vec::new();
        };

        let location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(self.default_location.as_str());

        let mut jobs = Vec::new();
        for query in plan_queries(keywords, location) {
            match provider.search(&query).await {
                Ok(found) => {
                    info!("Fetched {} jobs for '{}'", found.len(), query.title);
                    if found.is_empty() {
                        warn!(
                            "No jobs found for '{}' in '{}'; the query may be too specific",
                            query.title, query.location
                        );
                    }
                    jobs.extend(found);
                }
                Err(e) => warn!("Job search for '{}' failed: {e}", query.title),
            }
        }

        jobs.truncate(MAX_RESULTS);
        jobs
    }
}

/// Splits the keyword string into the searches to run.
pub fn plan_queries(keywords: &str, location: &str) -> Vec<JobQuery> {
    let terms: Vec<&str> = keywords
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect();

    let query = |title: &str, rows| JobQuery {
        title: title.to_string(),
        location: location.to_string(),
        rows,
    };

    match terms.as_slice() {
        [] => Vec::new(),
        [single] => vec![query(*single, DEFAULT_ROWS)],
        many => many
            .iter()
            .take(MAX_SPLIT_KEYWORDS)
            .map(|&term| query(term, SPLIT_ROWS))
            .collect(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::jobs::models::JobSearchError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Returns `rows` numbered records per query (or fails for titles listed
    /// in `failing`) and records every query it sees.
    #[derive(Default)]
    pub(crate) struct FakeProvider {
        pub queries: Mutex<Vec<JobQuery>>,
        pub failing: Vec<String>,
    }

    #[async_trait]
    impl JobSearchProvider for FakeProvider {
        async fn search(&self, query: &JobQuery) -> Result<Vec<JobRecord>, JobSearchError> {
            self.queries.lock().unwrap().push(query.clone());
            if self.failing.contains(&query.title) {
                return Err(JobSearchError::Api {
                    status: 502,
                    message: "actor run failed".to_string(),
                });
            }
            Ok((0..query.rows)
                .map(|i| {
                    let record = json!({"title": format!("{} #{i}", query.title)});
                    record.as_object().cloned().unwrap_or_default()
                })
                .collect())
        }
    }

    fn fetcher(provider: Arc<FakeProvider>) -> JobFetcher {
        JobFetcher::new(Some(provider), "Türkiye".to_string())
    }

    #[tokio::test]
    async fn test_single_keyword_is_one_search() {
        let provider = Arc::new(FakeProvider::default());
        let jobs = fetcher(provider.clone())
            .fetch("Software Engineer", None)
            .await;

        assert_eq!(jobs.len(), 10);
        let queries = provider.queries.lock().unwrap();
        assert_eq!(
            *queries,
            vec![JobQuery {
                title: "Software Engineer".to_string(),
                location: "Türkiye".to_string(),
                rows: DEFAULT_ROWS,
            }]
        );
    }

    #[tokio::test]
    async fn test_two_keywords_split_into_two_searches() {
        let provider = Arc::new(FakeProvider::default());
        let jobs = fetcher(provider.clone())
            .fetch("Data Scientist, DevOps Engineer", Some("Berlin"))
            .await;

        let queries = provider.queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert!(queries.iter().all(|q| q.rows == SPLIT_ROWS && q.location == "Berlin"));
        assert_eq!(jobs.len(), 10);
        assert_eq!(jobs[0]["title"], "Data Scientist #0");
        assert_eq!(jobs[5]["title"], "DevOps Engineer #0");
    }

    #[tokio::test]
    async fn test_only_first_two_keywords_are_searched() {
        let provider = Arc::new(FakeProvider::default());
        fetcher(provider.clone())
            .fetch("Data Scientist, DevOps Engineer, Extra", None)
            .await;

        let titles: Vec<_> = provider
            .queries
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.title.clone())
            .collect();
        assert_eq!(titles, vec!["Data Scientist", "DevOps Engineer"]);
    }

    #[tokio::test]
    async fn test_results_are_capped() {
        struct Flood;

        #[async_trait]
        impl JobSearchProvider for Flood {
            async fn search(&self, _query: &JobQuery) -> Result<Vec<JobRecord>, JobSearchError> {
                Ok(vec![JobRecord::new(); 25])
            }
        }

        let fetcher = JobFetcher::new(Some(Arc::new(Flood)), "Türkiye".to_string());
        assert_eq!(fetcher.fetch("Backend Developer", None).await.len(), MAX_RESULTS);
        assert_eq!(fetcher.fetch("A Role, B Role", None).await.len(), MAX_RESULTS);
    }

    #[tokio::test]
    async fn test_missing_provider_returns_empty() {
        let fetcher = JobFetcher::new(None, "Türkiye".to_string());
        assert!(fetcher.fetch("Software Engineer", None).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_search_keeps_other_results() {
        let provider = Arc::new(FakeProvider {
            failing: vec!["Data Scientist".to_string()],
            ..FakeProvider::default()
        });
        let jobs = fetcher(provider).fetch("Data Scientist, ML Engineer", None).await;

        assert_eq!(jobs.len(), SPLIT_ROWS as usize);
        assert_eq!(jobs[0]["title"], "ML Engineer #0");
    }

    #[test]
    fn test_plan_ignores_blank_terms() {
        assert!(plan_queries(" , ,", "X").is_empty());
        let plan = plan_queries("Platform Engineer, ,", "X");
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].rows, DEFAULT_ROWS);
    }
}
