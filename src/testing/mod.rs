//! Testing utilities and mock implementations
//!
//! Mock generation backend for exercising the pipeline and web boundary
//! without external dependencies.

pub mod mocks;

pub use mocks::*;
