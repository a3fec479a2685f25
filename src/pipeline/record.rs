//! Request record and stage types for the routing pipeline
//!
//! A [`RequestRecord`] is created once per incoming query, threaded through
//! the classifier, exactly one handler, and the finalizer, then discarded.
//! Stages consume the record by value and return the updated value; nothing
//! is shared between concurrent requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Timestamp rendering used in transition logs and reports
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Processing category selected by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Math,
    Summarizer,
    Translator,
    Fallback,
}

impl Category {
    /// Stage label used in transition logs and statistics
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Math => "math",
            Category::Summarizer => "summarizer",
            Category::Translator => "translator",
            Category::Fallback => "fallback",
        }
    }

    /// All categories in classifier priority order
    pub fn all() -> [Category; 4] {
        [
            Category::Summarizer,
            Category::Math,
            Category::Translator,
            Category::Fallback,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next stage a record is headed to
///
/// The pipeline is a straight line: `Router` → `Handler(_)` → `Final` →
/// `Done`. There are no cycles and no retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Awaiting classification
    Router,
    /// Dispatched to a category handler
    Handler(Category),
    /// Handler finished, awaiting the finalizer
    Final,
    /// Finalizer produced the report; terminal
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Router => "router",
            Stage::Handler(category) => category.as_str(),
            Stage::Final => "final",
            Stage::Done => "done",
        }
    }
}

/// Per-query state threaded through the pipeline
#[derive(Debug, Clone)]
pub struct RequestRecord {
    /// Raw input text, preserved verbatim for the final report
    pub input: String,
    /// Next stage this record is headed to
    pub next: Stage,
    /// Accumulated result; handler output, then the finalizer's report
    pub result: Option<String>,
    /// Append-only log of stage hand-offs, `"stage -> stage"` entries
    pub transitions: Vec<String>,
    /// Stamped by the classifier when the record enters the pipeline
    pub timestamp: Option<DateTime<Utc>>,
    /// Reserved for extension; no stage reads or writes this today
    pub context: HashMap<String, serde_json::Value>,
}

impl RequestRecord {
    /// Create a fresh record for one query
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            next: Stage::Router,
            result: None,
            transitions: Vec::new(),
            timestamp: None,
            context: HashMap::new(),
        }
    }

    /// Append a `"from -> to"` entry to the transition log
    pub fn push_transition(&mut self, from: &str, to: &str) {
        self.transitions.push(format!("{from} -> {to}"));
    }

    /// Transition log rendered as an arrow-joined sequence
    pub fn route_history(&self) -> String {
        self.transitions.join(" -> ")
    }

    /// Stamped timestamp rendered for display, defaulting to now
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp
            .unwrap_or_else(Utc::now)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}
