//! chatpipe - Keyword-Routed Conversational Pipeline
//!
//! A small conversational routing service: incoming queries are classified
//! by keyword matching into one of four task categories (math,
//! summarization, translation, general fallback), each category's handler
//! invokes a generation backend with a category-specific prompt template,
//! and the result is rendered as a human-readable report - optionally
//! served over a web chat endpoint with per-session history.
//!
//! # Overview
//!
//! - Classification-and-dispatch pipeline with a typed request record
//! - Pluggable generation backends (Ollama, Anthropic) with request timeouts
//! - HTTP chat boundary with session history and aggregate statistics
//! - Structured logging and lightweight request counters
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chatpipe::pipeline::{GenerationSettings, Pipeline};
//! use chatpipe::testing::mocks::MockGenerationService;
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let service = Arc::new(MockGenerationService::single_response("15 + 75 = 90"));
//! let pipeline = Pipeline::new(service, GenerationSettings::default());
//!
//! let record = pipeline.run("Calculate 15 + 25 * 3").await;
//! println!("{}", record.result.unwrap_or_default());
//! # }
//! ```

pub mod config;
pub mod error;
pub mod llm;
pub mod observability;
pub mod pipeline;
pub mod server;
pub mod testing;

pub use config::{ConfigError, LlmSection, PipelineConfig, PipelineSection, ServerSection};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{Category, GenerationSettings, Pipeline, RequestRecord, Stage};
pub use server::{ChatServer, ConversationStore, MemoryConversationStore};
