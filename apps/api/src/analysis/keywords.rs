//! Keyword parser: turns the keywords step's raw model output into a clean list.
//!
//! The model is asked for a JSON array but regularly answers with a fenced
//! block, a comma list, or one keyword per line. Parsing never fails: the
//! worst case is an empty list.
//!
//! Pipeline: strip fences → first matching strategy (json, comma, newline) →
//! post-filter (drop tokens of ≤ 2 characters and leftover `[` residue).

use serde_json::Value;
use tracing::debug;

/// Keywords this short are noise ("ML", "AI", stray punctuation).
const MIN_KEYWORD_CHARS: usize = 3;

/// A parsing strategy: `Some(tokens)` claims the input, `None` passes it on.
pub type Strategy = fn(&str) -> Option<Vec<String>>;

/// Tried in order; the first strategy to return `Some` wins.
pub const STRATEGIES: [(&str, Strategy); 3] = [
    ("json", parse_json),
    ("comma", split_commas),
    ("newline", split_lines),
];

/// Parses raw model output into keywords, preserving the model's order.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    let text = strip_code_fence(raw);

    let tokens = STRATEGIES
        .iter()
        .find_map(|(name, strategy)| {
            strategy(text).map(|tokens| {
                debug!("keywords parsed with '{name}' strategy ({} tokens)", tokens.len());
                tokens
            })
        })
        .unwrap_or_default();

    tokens.into_iter().filter(|k| is_keyword(k)).collect()
}

/// Strips a surrounding ```` ``` ```` fence and an optional `json` language tag.
/// Text without a leading fence is returned trimmed but otherwise untouched.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.split("```").next().unwrap_or(inner);
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim()
}

/// Strict JSON. A non-array value becomes a one-element list.
fn parse_json(text: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(text).ok()?;
    Some(match value {
        Value::Array(items) => items.into_iter().map(value_to_keyword).collect(),
        other => vec![value_to_keyword(other)],
    })
}

fn split_commas(text: &str) -> Option<Vec<String>> {
    text.contains(',')
        .then(|| text.split(',').filter_map(clean_token).collect())
}

fn split_lines(text: &str) -> Option<Vec<String>> {
    Some(text.lines().filter_map(clean_token).collect())
}

fn value_to_keyword(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Trims whitespace and surrounding quotes; `None` for blank tokens.
fn clean_token(token: &str) -> Option<String> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    let cleaned = token.trim_matches('"').trim_matches('\'').trim();
    Some(cleaned.to_string())
}

fn is_keyword(keyword: &str) -> bool {
    keyword.chars().count() >= MIN_KEYWORD_CHARS && !keyword.starts_with('[')
}
