//! ChronoMap - Temporal World-History Map Core

pub mod cache;
pub mod core;
pub mod llm;
pub mod render;
pub mod simulation;
pub mod snapshot;
pub mod spatial;
pub mod temporal;
