//! Classification-and-dispatch pipeline
//!
//! The single piece of control flow in this service: an incoming query is
//! classified by keyword matching, dispatched to exactly one category
//! handler, and folded into a report by the finalizer.
//!
//! ```text
//!            ┌> math ──────┐
//!            ├> summarizer ┤
//! router ────┤             ├──> final
//!            ├> translator ┤
//!            └> fallback ──┘
//! ```
//!
//! Stages thread the [`RequestRecord`] forward by value; handler failures
//! are absorbed into the result string, so [`Pipeline::run`] always yields
//! a finalized record.

pub mod classifier;
pub mod finalizer;
pub mod handlers;
pub mod record;

pub use record::{Category, RequestRecord, Stage};

use crate::config::LlmSection;
use crate::llm::provider::LlmProvider;
use std::sync::Arc;

/// Sampling parameters passed to the generation backend on every call
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "mistral".to_string(),
            temperature: Some(0.3),
            max_tokens: None,
        }
    }
}

impl From<&LlmSection> for GenerationSettings {
    fn from(section: &LlmSection) -> Self {
        Self {
            model: section.model.clone(),
            temperature: section.temperature,
            max_tokens: section.max_tokens,
        }
    }
}

/// The classify → handle → finalize pipeline over a generation backend
pub struct Pipeline {
    service: Arc<dyn LlmProvider>,
    settings: GenerationSettings,
}

impl Pipeline {
    pub fn new(service: Arc<dyn LlmProvider>, settings: GenerationSettings) -> Self {
        Self { service, settings }
    }

    /// Run one query through the pipeline
    ///
    /// Never fails: backend errors surface as error strings inside the
    /// finalized report.
    pub async fn run(&self, input: &str) -> RequestRecord {
        let record = RequestRecord::new(input);
        let record = classifier::run(record);
        let record = handlers::run(self.service.as_ref(), &self.settings, record).await;
        finalizer::run(record)
    }

    /// Backend handle, shared with the web boundary for health probes
    pub fn service(&self) -> Arc<dyn LlmProvider> {
        self.service.clone()
    }

    /// Stage labels in execution order, for the statistics endpoint
    pub fn stage_names() -> [&'static str; 6] {
        ["router", "math", "summarizer", "translator", "fallback", "final"]
    }
}
