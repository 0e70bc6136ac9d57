//! Step, event and bundle types for one analysis run.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::analysis::prompts::{
    GAPS_PROMPT_TEMPLATE, KEYWORDS_PROMPT_TEMPLATE, ROADMAP_PROMPT_TEMPLATE,
    SUMMARY_PROMPT_TEMPLATE,
};

/// One discrete LLM-driven analysis task. Declaration order is run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStep {
    Summary,
    Gaps,
    Roadmap,
    Keywords,
}

impl AnalysisStep {
    pub const ALL: [AnalysisStep; 4] = [
        AnalysisStep::Summary,
        AnalysisStep::Gaps,
        AnalysisStep::Roadmap,
        AnalysisStep::Keywords,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisStep::Summary => "summary",
            AnalysisStep::Gaps => "gaps",
            AnalysisStep::Roadmap => "roadmap",
            AnalysisStep::Keywords => "keywords",
        }
    }

    /// Maximum output tokens requested from the model for this step.
    pub fn token_budget(self) -> u32 {
        match self {
            AnalysisStep::Summary => 2000,
            AnalysisStep::Gaps | AnalysisStep::Roadmap => 1500,
            AnalysisStep::Keywords => 1000,
        }
    }

    /// Fills the step's template. Only the keywords step reads `context`
    /// (the summary); the others read the resume text.
    pub fn prompt(self, resume_text: &str, context: &str) -> String {
        match self {
            AnalysisStep::Summary => SUMMARY_PROMPT_TEMPLATE.replace("{resume_text}", resume_text),
            AnalysisStep::Gaps => GAPS_PROMPT_TEMPLATE.replace("{resume_text}", resume_text),
            AnalysisStep::Roadmap => ROADMAP_PROMPT_TEMPLATE.replace("{resume_text}", resume_text),
            AnalysisStep::Keywords => KEYWORDS_PROMPT_TEMPLATE.replace("{summary}", context),
        }
    }
}

impl fmt::Display for AnalysisStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisStep::ALL
            .into_iter()
            .find(|step| step.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("Unknown aspect: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Processing,
    Complete,
}

/// Output of a single step: prose for summary/gaps/roadmap, a list for keywords.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepOutput {
    Text(String),
    Keywords(Vec<String>),
}

impl StepOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StepOutput::Text(text) => Some(text),
            StepOutput::Keywords(_) => None,
        }
    }

    pub fn as_keywords(&self) -> Option<&[String]> {
        match self {
            StepOutput::Keywords(keywords) => Some(keywords),
            StepOutput::Text(_) => None,
        }
    }
}

/// All step outputs of one run, serialized as an object keyed by step name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisBundle(BTreeMap<AnalysisStep, StepOutput>);

impl AnalysisBundle {
    pub fn insert(&mut self, step: AnalysisStep, output: StepOutput) {
        self.0.insert(step, output);
    }

    pub fn get(&self, step: AnalysisStep) -> Option<&StepOutput> {
        self.0.get(&step)
    }

    pub fn summary(&self) -> Option<&str> {
        self.get(AnalysisStep::Summary).and_then(StepOutput::as_text)
    }

    pub fn keywords(&self) -> Option<&[String]> {
        self.get(AnalysisStep::Keywords)
            .and_then(StepOutput::as_keywords)
    }

    pub fn is_complete(&self) -> bool {
        AnalysisStep::ALL.iter().all(|step| self.0.contains_key(step))
    }
}

/// The `step` field of an event: a real step, or the closing `done` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStep {
    Summary,
    Gaps,
    Roadmap,
    Keywords,
    Done,
}

impl From<AnalysisStep> for EventStep {
    fn from(step: AnalysisStep) -> Self {
        match step {
            AnalysisStep::Summary => EventStep::Summary,
            AnalysisStep::Gaps => EventStep::Gaps,
            AnalysisStep::Roadmap => EventStep::Roadmap,
            AnalysisStep::Keywords => EventStep::Keywords,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventData {
    Step(StepOutput),
    Bundle(AnalysisBundle),
}

/// One progress notification on the analysis stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisEvent {
    pub step: EventStep,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<EventData>,
}

impl AnalysisEvent {
    pub fn processing(step: AnalysisStep) -> Self {
        Self {
            step: step.into(),
            status: StepStatus::Processing,
            data: None,
        }
    }

    pub fn complete(step: AnalysisStep, output: StepOutput) -> Self {
        Self {
            step: step.into(),
            status: StepStatus::Complete,
            data: Some(EventData::Step(output)),
        }
    }

    pub fn done(bundle: AnalysisBundle) -> Self {
        Self {
            step: EventStep::Done,
            status: StepStatus::Complete,
            data: Some(EventData::Bundle(bundle)),
        }
    }
}
