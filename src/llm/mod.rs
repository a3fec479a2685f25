//! Generation backend abstraction layer
//!
//! Provider-agnostic interface for text-generation calls, with concrete
//! backends for a local Ollama daemon and the Anthropic API.

pub mod provider;
pub mod providers;

pub use provider::*;
pub use providers::*;
