//! Analysis pipeline: runs summary → gaps → roadmap → keywords against one
//! resume and reports progress as a stream of `AnalysisEvent`s.
//!
//! Steps run one after another; keywords needs the summary, and the other
//! steps are cheap enough that running them concurrently is not worth it.
//! A failed or blocked LLM call never aborts a run: the step gets a
//! placeholder text and the run moves on.
//!
//! The stream is lazy. Dropping it (client disconnect) drops the in-flight
//! LLM request with it and no further steps run.

use std::sync::Arc;

use tokio_stream::Stream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::keywords::parse_keywords;
use crate::analysis::steps::{AnalysisBundle, AnalysisEvent, AnalysisStep, StepOutput};
use crate::llm_client::{Generation, LlmError, TextGenerator};

/// Shown instead of content the provider refused to generate.
pub const BLOCKED_PLACEHOLDER: &str = "Content could not be generated. Please try again.";
/// Shown when the LLM call itself failed.
pub const UNAVAILABLE_PLACEHOLDER: &str = "Analysis temporarily unavailable. Please try again.";
/// Shown when no LLM credential is configured.
pub const MISSING_KEY_PLACEHOLDER: &str = "Gemini API Key is missing.";
/// Appended to output that hit the step's token budget.
pub const TRUNCATION_MARKER: &str = "...";

/// Resume prefix used as keyword context when no summary is available.
pub const STANDALONE_KEYWORD_CONTEXT_CHARS: usize = 2000;

#[derive(Clone)]
pub struct AnalysisPipeline {
    llm: Arc<dyn TextGenerator>,
}

impl AnalysisPipeline {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Runs all four steps, yielding a `processing` and a `complete` event per
    /// step and a final `done` event carrying the whole bundle.
    pub fn stream(self, resume_text: String) -> impl Stream<Item = AnalysisEvent> + Send + 'static {
        let run_id = Uuid::new_v4();
        info!(%run_id, chars = resume_text.chars().count(), "analysis run started");

        let pipeline = self;
        async_stream::stream! {
            let mut bundle = AnalysisBundle::default();

            for step in AnalysisStep::ALL {
                yield AnalysisEvent::processing(step);

                let summary = bundle.summary().map(str::to_owned);
                let output = pipeline
                    .execute(step, &resume_text, summary.as_deref(), run_id)
                    .await;

                bundle.insert(step, output.clone());
                yield AnalysisEvent::complete(step, output);
            }

            debug_assert!(bundle.is_complete());
            info!(
                %run_id,
                keywords = bundle.keywords().map_or(0, <[String]>::len),
                "analysis run complete"
            );
            yield AnalysisEvent::done(bundle);
        }
    }

    /// Runs a single step outside a full run. The keywords step has no summary
    /// here, so it reads the start of the resume instead.
    pub async fn run_step(&self, step: AnalysisStep, resume_text: &str) -> StepOutput {
        self.execute(step, resume_text, None, Uuid::new_v4()).await
    }

    async fn execute(
        &self,
        step: AnalysisStep,
        resume_text: &str,
        summary: Option<&str>,
        run_id: Uuid,
    ) -> StepOutput {
        let prompt = match (step, summary) {
            (AnalysisStep::Keywords, None) => {
                let prefix: String = resume_text
                    .chars()
                    .take(STANDALONE_KEYWORD_CONTEXT_CHARS)
                    .collect();
                step.prompt(resume_text, &prefix)
            }
            (_, summary) => step.prompt(resume_text, summary.unwrap_or_default()),
        };

        let result = self.llm.generate(&prompt, step.token_budget()).await;
        if let Some(reason) = degradation(&result) {
            warn!(%run_id, %step, "step degraded: {reason}");
        } else if matches!(&result, Ok(g) if g.truncated) {
            info!(%run_id, %step, "step output truncated at token budget");
        }
        let text = render_generation(result);

        match step {
            AnalysisStep::Keywords => StepOutput::Keywords(parse_keywords(&text)),
            _ => StepOutput::Text(text),
        }
    }
}

/// Why a step's output falls back to a placeholder, if it does.
fn degradation(result: &Result<Generation, LlmError>) -> Option<String> {
    match result {
        Err(e) => Some(e.to_string()),
        Ok(generation) if generation.blocked => Some("blocked by provider".to_string()),
        Ok(_) => None,
    }
}

/// Turns an LLM outcome into the text users see. Any outcome renders; none aborts.
pub fn render_generation(result: Result<Generation, LlmError>) -> String {
    match result {
        Ok(generation) if generation.blocked => BLOCKED_PLACEHOLDER.to_string(),
        Ok(generation) if generation.truncated => {
            format!("{}{TRUNCATION_MARKER}", generation.text)
        }
        Ok(generation) => generation.text,
        Err(LlmError::MissingApiKey) => MISSING_KEY_PLACEHOLDER.to_string(),
        Err(_) => UNAVAILABLE_PLACEHOLDER.to_string(),
    }
}
