//! Keyword classifier for incoming queries
//!
//! Lower-cases the input and tests membership in fixed keyword sets, in
//! priority order: summarizer, math, translator, then the fallback
//! catch-all. First matching set wins; there is no scoring and no ambiguity
//! resolution beyond the ordering. Classification always succeeds.

use crate::observability::metrics::metrics;
use crate::pipeline::record::{Category, RequestRecord, Stage};
use chrono::Utc;
use tracing::debug;

/// Summary-related keywords, highest priority
const SUMMARY_KEYWORDS: &[&str] = &["summarize", "summary", "brief", "explain", "describe"];

/// Arithmetic operators and math-related keywords
const MATH_KEYWORDS: &[&str] = &["+", "-", "*", "/", "calculate", "solve", "math", "equation"];

/// Translation-related keywords
const TRANSLATION_KEYWORDS: &[&str] = &[
    "translate",
    "translate to",
    "in french",
    "in spanish",
    "in german",
];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

/// Select a processing category for the given input
pub fn classify(input: &str) -> Category {
    let lowered = input.to_lowercase();

    if contains_any(&lowered, SUMMARY_KEYWORDS) {
        Category::Summarizer
    } else if contains_any(&lowered, MATH_KEYWORDS) {
        Category::Math
    } else if contains_any(&lowered, TRANSLATION_KEYWORDS) {
        Category::Translator
    } else {
        Category::Fallback
    }
}

/// Classifier stage: route the record to exactly one handler
///
/// Appends `"router -> <label>"` to the transition log and stamps the
/// record with the current time.
pub fn run(mut record: RequestRecord) -> RequestRecord {
    let category = classify(&record.input);

    record.push_transition(Stage::Router.as_str(), category.as_str());
    record.next = Stage::Handler(category);
    record.timestamp = Some(Utc::now());

    metrics().record_route(category);
    debug!(
        stage = "router",
        category = category.as_str(),
        input = %preview(&record.input),
        "query classified"
    );

    record
}

/// Truncated view of a query for log lines
pub(crate) fn preview(text: &str) -> String {
    const MAX: usize = 100;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(MAX).collect();
        format!("{truncated}...")
    }
}
