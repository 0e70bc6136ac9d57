// Resume analysis: four LLM steps (summary, gaps, roadmap, keywords) streamed
// to the client as they finish, plus the keyword parser the last step relies on.
// All LLM calls go through llm_client::TextGenerator.

pub mod handlers;
pub mod keywords;
pub mod pipeline;
pub mod prompts;
pub mod steps;
