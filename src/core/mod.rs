//! Core types, configuration and errors shared by every module

pub mod calendar;
pub mod config;
pub mod error;
pub mod types;

pub use calendar::{format_year, Year, YearRange};
pub use config::ChronoConfig;
