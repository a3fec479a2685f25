//! Generation backend implementations
//!
//! Concrete implementations of the [`crate::llm::provider::LlmProvider`]
//! trait for the supported backends.

pub mod anthropic;
pub mod ollama;

pub use anthropic::*;
pub use ollama::*;
