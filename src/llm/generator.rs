//! Snapshot generator boundary
//!
//! A generator hands back a loosely typed JSON record; the temporal
//! controller validates it before anything else sees it.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::calendar::Year;
use crate::core::types::Locale;
use crate::llm::client::{LlmClient, LlmError};
use crate::llm::prompt::{
    extract_json, search_prompt, snapshot_prompt, SEARCH_SYSTEM_PROMPT, SNAPSHOT_SYSTEM_PROMPT,
};

/// Why a generator could not produce a usable record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    /// No network or credential path; the user is effectively offline
    #[error("Generator unavailable: {0}")]
    Unavailable(String),

    /// A reply arrived but failed schema validation
    #[error("Malformed generator response: {0}")]
    Malformed(String),

    /// The request failed in flight; a manual refresh may succeed
    #[error("Generator transport error: {0}")]
    Transport(String),
}

impl GeneratorError {
    /// Whether a manual refresh could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, GeneratorError::Transport(_))
    }
}

impl From<LlmError> for GeneratorError {
    fn from(err: LlmError) -> Self {
        if err.is_auth_failure() {
            return GeneratorError::Unavailable(err.to_string());
        }
        match err {
            LlmError::Decode(_) | LlmError::EmptyResponse => {
                GeneratorError::Malformed(err.to_string())
            }
            _ => GeneratorError::Transport(err.to_string()),
        }
    }
}

/// Produces snapshot-shaped records for a year
#[async_trait]
pub trait SnapshotGenerator: Send + Sync {
    /// Produce a raw record for `year` in `locale`
    async fn generate(&self, year: Year, locale: Locale) -> Result<Value, GeneratorError>;

    /// Find the most significant year for a free-text query
    async fn locate_year(&self, query: &str) -> Result<Year, GeneratorError> {
        let _ = query;
        Err(GeneratorError::Unavailable("year search not supported".into()))
    }
}

/// Generator backed by an LLM completion endpoint
pub struct LlmSnapshotGenerator {
    client: LlmClient,
}

impl LlmSnapshotGenerator {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    pub fn from_env() -> Result<Self, GeneratorError> {
        Ok(Self::new(LlmClient::from_env()?))
    }
}

#[derive(Deserialize)]
struct YearAnswer {
    year: i64,
}

/// Pull the first JSON object out of a completion
fn parse_reply(response: &str) -> Result<Value, GeneratorError> {
    let json = extract_json(response)
        .ok_or_else(|| GeneratorError::Malformed("No JSON object found in response".into()))?;
    serde_json::from_str(json).map_err(|e| GeneratorError::Malformed(e.to_string()))
}

fn parse_year_answer(response: &str) -> Result<Year, GeneratorError> {
    let value = parse_reply(response)?;
    let answer: YearAnswer =
        serde_json::from_value(value).map_err(|e| GeneratorError::Malformed(e.to_string()))?;
    Year::try_from(answer.year)
        .map_err(|_| GeneratorError::Malformed(format!("year {} out of range", answer.year)))
}

#[async_trait]
impl SnapshotGenerator for LlmSnapshotGenerator {
    async fn generate(&self, year: Year, locale: Locale) -> Result<Value, GeneratorError> {
        tracing::debug!("Requesting snapshot for {} ({})", year, locale.code());
        let response = self
            .client
            .complete(SNAPSHOT_SYSTEM_PROMPT, &snapshot_prompt(year, locale))
            .await?;
        parse_reply(&response)
    }

    async fn locate_year(&self, query: &str) -> Result<Year, GeneratorError> {
        let response = self
            .client
            .complete(SEARCH_SYSTEM_PROMPT, &search_prompt(query))
            .await?;
        parse_year_answer(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_mapping() {
        assert!(matches!(
            GeneratorError::from(LlmError::MissingApiKey),
            GeneratorError::Unavailable(_)
        ));
        assert!(matches!(
            GeneratorError::from(LlmError::Status { status: 403, body: "no".into() }),
            GeneratorError::Unavailable(_)
        ));
        assert!(matches!(
            GeneratorError::from(LlmError::Status { status: 500, body: "boom".into() }),
            GeneratorError::Transport(_)
        ));
        assert!(matches!(
            GeneratorError::from(LlmError::Request("reset".into())),
            GeneratorError::Transport(_)
        ));
        assert!(matches!(
            GeneratorError::from(LlmError::EmptyResponse),
            GeneratorError::Malformed(_)
        ));
    }

    #[test]
    fn test_only_transport_is_retryable() {
        assert!(GeneratorError::Transport("x".into()).is_retryable());
        assert!(!GeneratorError::Malformed("x".into()).is_retryable());
        assert!(!GeneratorError::Unavailable("x".into()).is_retryable());
    }

    #[test]
    fn test_parse_reply_with_prose() {
        let value = parse_reply("Sure! {\"year\": 5, \"summary\": \"s\"} Done.").unwrap();
        assert_eq!(value["year"], 5);
        assert!(matches!(parse_reply("no json here"), Err(GeneratorError::Malformed(_))));
        assert!(matches!(parse_reply("{broken"), Err(GeneratorError::Malformed(_))));
    }

    #[test]
    fn test_parse_year_answer() {
        assert_eq!(parse_year_answer(r#"{"year": -44}"#), Ok(-44));
        assert!(matches!(
            parse_year_answer(r#"{"decade": 1960}"#),
            Err(GeneratorError::Malformed(_))
        ));
        assert!(matches!(
            parse_year_answer(r#"{"year": 99999999999}"#),
            Err(GeneratorError::Malformed(_))
        ));
    }

    struct Silent;

    #[async_trait]
    impl SnapshotGenerator for Silent {
        async fn generate(&self, _year: Year, _locale: Locale) -> Result<Value, GeneratorError> {
            Err(GeneratorError::Transport("silent".into()))
        }
    }

    #[tokio::test]
    async fn test_default_year_search_is_unavailable() {
        assert!(matches!(
            Silent.locate_year("fall of Rome").await,
            Err(GeneratorError::Unavailable(_))
        ));
    }
}
