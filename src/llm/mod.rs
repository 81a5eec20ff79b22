//! LLM-backed snapshot generation

pub mod client;
pub mod generator;
pub mod prompt;

pub use client::{LlmClient, LlmError};
pub use generator::{GeneratorError, LlmSnapshotGenerator, SnapshotGenerator};
