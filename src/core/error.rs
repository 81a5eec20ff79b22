use thiserror::Error;

use crate::llm::generator::GeneratorError;

#[derive(Error, Debug)]
pub enum ChronoError {
    #[error("Corrupt cache entry {key}: {reason}")]
    CacheCorrupt { key: String, reason: String },

    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Unknown civilization: {0}")]
    UnknownCivilization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ChronoError>;
