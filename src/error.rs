//! Error types for email triage.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Substrings that mark a provider failure as quota / rate-limit related.
const QUOTA_SIGNATURES: &[&str] = &[
    "429",
    "resource_exhausted",
    "resource exhausted",
    "quota",
    "rate limit",
    "too many requests",
    "exceeded",
];

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Provider {provider} quota exhausted: {reason}")]
    QuotaExhausted { provider: String, reason: String },

    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether this failure means the provider is out of capacity for us.
    ///
    /// Structured variants decide directly. Anything else falls back to
    /// sniffing the message, since some upstream errors only carry the
    /// status in their text.
    pub fn is_quota(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::QuotaExhausted { .. } => true,
            Self::AuthFailed { .. } => false,
            other => {
                let message = other.to_string().to_lowercase();
                QUOTA_SIGNATURES.iter().any(|sig| message.contains(sig))
            }
        }
    }

    /// Stable variant name, used in diagnostics surfaced to the caller.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "RateLimited",
            Self::QuotaExhausted { .. } => "QuotaExhausted",
            Self::RequestFailed { .. } => "RequestFailed",
            Self::InvalidResponse { .. } => "InvalidResponse",
            Self::AuthFailed { .. } => "AuthFailed",
            Self::Json(_) => "Json",
        }
    }
}

/// Failures of the lenient JSON parser.
#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    #[error("No JSON object found in model output")]
    NoObject,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model output parsed, but is not a JSON object")]
    NotAnObject,
}

/// Upload text extraction errors.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// Pipeline-related errors.
///
/// Never escapes `TriageProcessor::classify`; used internally to carry the
/// reason a model-backed attempt ended in a degraded result.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Model output unrecoverable after fix attempt: {0}")]
    Unrecoverable(RecoveryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_is_quota() {
        let err = LlmError::RateLimited {
            provider: "gemini".into(),
            retry_after: None,
        };
        assert!(err.is_quota());
        assert_eq!(err.kind(), "RateLimited");
    }

    #[test]
    fn request_failed_with_429_text_is_quota() {
        let err = LlmError::RequestFailed {
            provider: "gemini".into(),
            reason: "HTTP 429 from upstream".into(),
        };
        assert!(err.is_quota());
    }

    #[test]
    fn request_failed_with_resource_exhausted_is_quota() {
        let err = LlmError::RequestFailed {
            provider: "gemini".into(),
            reason: "RESOURCE_EXHAUSTED".into(),
        };
        assert!(err.is_quota());
    }

    #[test]
    fn plain_request_failure_is_not_quota() {
        let err = LlmError::RequestFailed {
            provider: "gemini".into(),
            reason: "connection reset by peer".into(),
        };
        assert!(!err.is_quota());
        assert_eq!(err.kind(), "RequestFailed");
    }

    #[test]
    fn auth_failure_is_never_quota() {
        let err = LlmError::AuthFailed {
            provider: "gemini".into(),
        };
        assert!(!err.is_quota());
    }
}
