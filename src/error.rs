//! Error types for service startup and the web boundary
//!
//! Generation failures inside the pipeline never surface here: handlers
//! absorb them into the report. These errors cover everything around the
//! pipeline — configuration, provider construction, and the HTTP server.

use crate::config::ConfigError;
use crate::llm::provider::LlmError;
use thiserror::Error;

/// Main error type for chatpipe operations
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Generation backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("Server error: {message}")]
    Server { message: String },
}

impl PipelineError {
    /// Create a server error
    pub fn server<S: Into<String>>(message: S) -> Self {
        Self::Server {
            message: message.into(),
        }
    }
}

/// Result type for chatpipe operations
pub type PipelineResult<T> = Result<T, PipelineError>;
