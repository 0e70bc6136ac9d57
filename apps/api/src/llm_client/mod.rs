/// LLM client: the single point of entry for all Gemini API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// Everything else depends on the `TextGenerator` trait, never on `GeminiClient`.
///
/// Model: gemini-3-flash-preview (hardcoded, not configurable)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// The model used for all LLM calls.
pub const MODEL: &str = "gemini-3-flash-preview";
const TEMPERATURE: f32 = 0.5;
const DEFAULT_MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// Backoff stops doubling after 2^6 seconds.
const MAX_BACKOFF_SHIFT: u32 = 6;

/// Resume text is routinely flagged by overly strict filters (names, addresses),
/// so every harm category is opened up.
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Gemini API key is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Normalized outcome of one generation call.
///
/// Provider-specific finish signalling is folded into two flags; deciding how
/// a truncated or blocked generation is shown to users is left to the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    pub text: String,
    /// The output hit the token budget and stops mid-thought.
    pub truncated: bool,
    /// The provider refused to produce (or withheld) the content.
    pub blocked: bool,
}

/// Anything that turns a prompt into text. `AppState` carries an
/// `Arc<dyn TextGenerator>` so tests can swap in a scripted fake.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<Generation, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
pub struct ContentPart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

impl GenerateContentResponse {
    /// Folds the first candidate (or the prompt-level block) into a `Generation`.
    pub fn into_generation(self) -> Result<Generation, LlmError> {
        let prompt_blocked = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
            .is_some();

        let Some(candidate) = self.candidates.into_iter().next() else {
            return if prompt_blocked {
                Ok(Generation {
                    blocked: true,
                    ..Generation::default()
                })
            } else {
                Err(LlmError::EmptyContent)
            };
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let (truncated, blocked) = match candidate.finish_reason.as_deref() {
            None | Some("STOP") | Some("FINISH_REASON_UNSPECIFIED") => (false, false),
            Some("MAX_TOKENS") => (true, false),
            // SAFETY, RECITATION, OTHER, BLOCKLIST, PROHIBITED_CONTENT, SPII, ...
            Some(_) => (false, true),
        };

        if text.is_empty() && !blocked {
            return Err(LlmError::EmptyContent);
        }

        Ok(Generation {
            text,
            truncated,
            blocked,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiClient
// ────────────────────────────────────────────────────────────────────────────

/// Wraps the Gemini `generateContent` API with retry logic.
/// Built once at startup; clones share the underlying connection pool.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    max_retries: u32,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Caps the number of attempts per call (at least one).
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{MODEL}:generateContent", self.base_url)
    }

    /// Makes a raw call to the Gemini API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<GenerateContentResponse, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: max_tokens,
                temperature: TEMPERATURE,
            },
            safety_settings: HARM_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        };

        let url = self.endpoint();
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<GeminiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = response.text().await?;
            let parsed: GenerateContentResponse = serde_json::from_str(&body)?;

            if let Some(usage) = &parsed.usage_metadata {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, output_tokens={}",
                    usage.prompt_token_count, usage.candidates_token_count
                );
            }

            return Ok(parsed);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: self.max_retries,
        }))
    }
}

/// Exponential backoff before retry `attempt` (1-based): 1s, 2s, 4s, ...
fn backoff_delay(attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
    Duration::from_secs(1 << shift)
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<Generation, LlmError> {
        self.call(prompt, max_tokens).await?.into_generation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn response(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_stop_is_plain_text() {
        let generation = response(json!({
            "candidates": [{
                "content": {"parts": [{"text": "A seasoned engineer."}], "role": "model"},
                "finishReason": "STOP"
            }]
        }))
        .into_generation()
        .unwrap();

        assert_eq!(generation.text, "A seasoned engineer.");
        assert!(!generation.truncated);
        assert!(!generation.blocked);
    }

    #[test]
    fn test_max_tokens_marks_truncated() {
        let generation = response(json!({
            "candidates": [{
                "content": {"parts": [{"text": "Short-term goals: learn"}]},
                "finishReason": "MAX_TOKENS"
            }]
        }))
        .into_generation()
        .unwrap();

        assert!(generation.truncated);
        assert!(!generation.blocked);
    }

    #[test]
    fn test_safety_and_recitation_mark_blocked() {
        for reason in ["SAFETY", "RECITATION", "OTHER"] {
            let generation = response(json!({
                "candidates": [{"finishReason": reason}]
            }))
            .into_generation()
            .unwrap();
            assert!(generation.blocked, "{reason} should be blocked");
        }
    }

    #[test]
    fn test_prompt_block_without_candidates_is_blocked() {
        let generation = response(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .into_generation()
        .unwrap();

        assert!(generation.blocked);
        assert!(generation.text.is_empty());
    }

    #[test]
    fn test_empty_response_is_error() {
        let result = response(json!({"candidates": []})).into_generation();
        assert!(matches!(result, Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_multiple_parts_are_joined() {
        let generation = response(json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hello, "}, {"text": "world"}]},
                "finishReason": "STOP"
            }]
        }))
        .into_generation()
        .unwrap();

        assert_eq!(generation.text, "Hello, world");
    }

    #[tokio::test]
    async fn test_missing_api_key_short_circuits() {
        let client = GeminiClient::new(None, "http://127.0.0.1:9").unwrap();
        let result = client.generate("prompt", 100).await;
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_generate_sends_budget_and_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Regex(r":generateContent$".to_string()))
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {"maxOutputTokens": 1500}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{
                        "content": {"parts": [{"text": "Gaps: Kubernetes"}]},
                        "finishReason": "STOP"
                    }],
                    "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = GeminiClient::new(Some("test-key".to_string()), server.url()).unwrap();
        let generation = client.generate("Find the gaps", 1500).await.unwrap();

        assert_eq!(generation.text, "Gaps: Kubernetes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .with_status(400)
            .with_body(json!({"error": {"message": "API key not valid"}}).to_string())
            .expect(1)
            .create_async()
            .await;

        let client = GeminiClient::new(Some("bad".to_string()), server.url()).unwrap();
        let result = client.generate("prompt", 100).await;

        match result {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected API error, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_exhausts_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let client = GeminiClient::new(Some("key".to_string()), server.url())
            .unwrap()
            .with_max_retries(1);
        let result = client.generate("prompt", 100).await;

        assert!(matches!(result, Err(LlmError::Api { status: 503, .. })));
        mock.assert_async().await;
    }

    #[test]
    fn test_backoff_doubles_then_levels_off() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
        assert_eq!(backoff_delay(7), Duration::from_secs(64));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_secs(64));
    }

    fn candidate_body(text: &str) -> String {
        json!({
            "candidates": [{
                "content": {"parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
        .to_string()
    }

    async fn assert_retried_after(status: usize) {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", Matcher::Any)
            .with_status(status)
            .expect(1)
            .create_async()
            .await;
        let succeeding = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(candidate_body("Roadmap: ship it"))
            .expect(1)
            .create_async()
            .await;

        let client = GeminiClient::new(Some("key".to_string()), server.url())
            .unwrap()
            .with_max_retries(2);
        let generation = client.generate("prompt", 100).await.unwrap();

        assert_eq!(generation.text, "Roadmap: ship it");
        failing.assert_async().await;
        succeeding.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried_then_succeeds() {
        assert_retried_after(503).await;
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried_then_succeeds() {
        assert_retried_after(429).await;
    }
}
