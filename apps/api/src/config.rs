use anyhow::{Context, Result};

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_APIFY_BASE_URL: &str = "https://api.apify.com";
const DEFAULT_JOB_LOCATION: &str = "Türkiye";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_LLM_MAX_RETRIES: u32 = 3;

/// Application configuration loaded from environment variables.
///
/// Provider credentials are optional: without them the service still starts,
/// analysis steps degrade to a placeholder and job searches return nothing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    /// Attempts per LLM call; 429 and 5xx responses are retried.
    pub llm_max_retries: u32,
    pub apify_api_token: Option<String>,
    pub apify_base_url: String,
    pub default_job_location: String,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_base_url: env_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            llm_max_retries: optional_env("GEMINI_MAX_RETRIES")
                .map(|v| v.parse::<u32>())
                .transpose()
                .context("GEMINI_MAX_RETRIES must be a whole number")?
                .unwrap_or(DEFAULT_LLM_MAX_RETRIES),
            apify_api_token: optional_env("APIFY_API_TOKEN"),
            apify_base_url: env_or("APIFY_BASE_URL", DEFAULT_APIFY_BASE_URL),
            default_job_location: env_or("DEFAULT_JOB_LOCATION", DEFAULT_JOB_LOCATION),
            max_upload_bytes: optional_env("MAX_UPLOAD_BYTES")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_UPLOAD_BYTES must be a byte count")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            llm_max_retries: DEFAULT_LLM_MAX_RETRIES,
            apify_api_token: None,
            apify_base_url: DEFAULT_APIFY_BASE_URL.to_string(),
            default_job_location: DEFAULT_JOB_LOCATION.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

/// Empty values count as unset so a blank `GEMINI_API_KEY=` line in `.env`
/// does not turn into an empty credential.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}
