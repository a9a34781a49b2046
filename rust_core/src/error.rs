//! Domain errors for the match lifecycle engine.
//!
//! Every lifecycle operation surfaces one of four stable kinds:
//! - `NotFound`: fixture, roster, or player absent
//! - `InvalidInput`: malformed id, unsupported sport, bad score arrays
//! - `InvalidState`: operation against the wrong lifecycle status or segment
//! - `Dependency`: store or downstream side effect unreachable
//!
//! NotFound/InvalidInput/InvalidState are detected before any mutation.
//! Dependency failures in post-commit side effects never unwind the primary
//! write; they are reported as warnings on the outcome envelope instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("dependency failure: {0}")]
    Dependency(String),
}

impl EngineError {
    /// Stable kind string for the outcome envelope and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "not_found",
            EngineError::InvalidInput(_) => "invalid_input",
            EngineError::InvalidState(_) => "invalid_state",
            EngineError::Dependency(_) => "dependency_failure",
        }
    }

    /// Dependency errors are worth retrying; the rest are caller bugs.
    pub fn is_retriable(&self) -> bool {
        matches!(self, EngineError::Dependency(_))
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => EngineError::NotFound("row not found".to_string()),
            other => EngineError::Dependency(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for EngineError {
    fn from(e: redis::RedisError) -> Self {
        EngineError::Dependency(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::InvalidInput(format!("malformed document: {}", e))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
