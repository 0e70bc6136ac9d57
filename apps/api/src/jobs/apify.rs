//! LinkedIn job search through an Apify scraping actor.
//!
//! Uses the synchronous run endpoint, which starts the actor, waits for it to
//! finish and returns the dataset items in one response.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::jobs::models::{JobQuery, JobRecord, JobSearchError, JobSearchProvider};

/// LinkedIn jobs scraper actor.
pub const LINKEDIN_ACTOR_ID: &str = "BHzefUZlZRKWxkTck";
/// Actor runs take a while; the platform caps synchronous runs at 300s.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActorInput<'a> {
    title: &'a str,
    location: &'a str,
    rows: u32,
    proxy: ProxyConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyConfig {
    use_apify_proxy: bool,
    apify_proxy_groups: Vec<&'static str>,
}

#[derive(Clone)]
pub struct ApifyClient {
    client: Client,
    token: String,
    base_url: String,
}

impl ApifyClient {
    pub fn new(token: String, base_url: impl Into<String>) -> Result<Self, JobSearchError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v2/acts/{LINKEDIN_ACTOR_ID}/run-sync-get-dataset-items",
            self.base_url
        )
    }
}

#[async_trait]
impl JobSearchProvider for ApifyClient {
    async fn search(&self, query: &JobQuery) -> Result<Vec<JobRecord>, JobSearchError> {
        info!(
            "LinkedIn job search: title='{}' location='{}' rows={}",
            query.title, query.location, query.rows
        );

        let input = ActorInput {
            title: &query.title,
            location: &query.location,
            rows: query.rows,
            proxy: ProxyConfig {
                use_apify_proxy: true,
                apify_proxy_groups: vec!["RESIDENTIAL"],
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.token)
            .json(&input)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(JobSearchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let jobs: Vec<JobRecord> = serde_json::from_str(&body)?;
        debug!("Apify returned {} jobs for '{}'", jobs.len(), query.title);
        Ok(jobs)
    }
}
