//! Error types for the investment advisor

use crate::pipeline::StageName;
use advisor_llm::LLMError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Investment advisor errors
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// Text-generation call failed
    #[error("Text generation failed: {0}")]
    Generation(#[from] LLMError),

    /// Market-data lookup failed
    #[error("Market data error: {0}")]
    MarketData(String),

    /// Web search failed
    #[error("Search error: {0}")]
    Search(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Prompt template failed to render
    #[error("Prompt error: {0}")]
    Prompt(#[from] minijinja::Error),

    /// Rate limit exceeded for a collaborator
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded {
        /// Collaborator that refused the call
        provider: String,
    },

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// A stage needed an earlier stage's result and found a failure or nothing
    #[error("Required {stage} result is missing or failed")]
    UpstreamFailure {
        /// Stage whose result was required
        stage: StageName,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Coarse classification used for failure reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport, quota or timeout from an external service
    Collaborator,
    /// A required upstream stage result is a failure
    Upstream,
    /// Local problem (configuration, templates, filesystem)
    Internal,
}

impl AdvisorError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Generation(_)
            | Self::MarketData(_)
            | Self::Search(_)
            | Self::Network(_)
            | Self::Json(_)
            | Self::RateLimitExceeded { .. }
            | Self::InvalidSymbol(_) => ErrorKind::Collaborator,
            Self::UpstreamFailure { .. } => ErrorKind::Upstream,
            Self::Prompt(_) | Self::Config(_) | Self::Io(_) | Self::Other(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Whether retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Generation(e) => e.is_transient(),
            Self::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::RateLimitExceeded { .. } | Self::MarketData(_) | Self::Search(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for advisor operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

impl From<anyhow::Error> for AdvisorError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AdvisorError::InvalidSymbol("INVALID".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: INVALID");

        let err = AdvisorError::UpstreamFailure {
            stage: StageName::Financials,
        };
        assert_eq!(err.to_string(), "Required Financials result is missing or failed");

        let err = AdvisorError::RateLimitExceeded {
            provider: "duckduckgo".to_string(),
        };
        assert_eq!(err.to_string(), "Rate limit exceeded for duckduckgo");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            AdvisorError::MarketData("timeout".to_string()).kind(),
            ErrorKind::Collaborator
        );
        assert_eq!(
            AdvisorError::Generation(LLMError::AuthenticationFailed).kind(),
            ErrorKind::Collaborator
        );
        assert_eq!(
            AdvisorError::UpstreamFailure {
                stage: StageName::News
            }
            .kind(),
            ErrorKind::Upstream
        );
        assert_eq!(
            AdvisorError::Config("missing key".to_string()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_retryable() {
        assert!(AdvisorError::Search("503".to_string()).is_retryable());
        assert!(
            AdvisorError::Generation(LLMError::RateLimitExceeded(String::new())).is_retryable()
        );
        assert!(!AdvisorError::Generation(LLMError::AuthenticationFailed).is_retryable());
        assert!(!AdvisorError::InvalidSymbol("X".to_string()).is_retryable());
        assert!(
            !AdvisorError::UpstreamFailure {
                stage: StageName::Synthesis
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: AdvisorError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, AdvisorError::Other(msg) if msg == "boom"));
    }
}
