//! LLM integration for email triage.
//!
//! Supports:
//! - **Gemini**: direct `generateContent` calls over reqwest
//!
//! The pipeline only sees the `LlmProvider` trait, so tests substitute
//! scripted providers and no network access is needed.

pub mod gemini;
pub mod provider;

pub use gemini::GeminiProvider;
pub use provider::*;

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::config::parse_env;
use crate::error::{ConfigError, LlmError};

/// Model used when `GEMINI_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "models/gemini-2.5-flash";

/// Public Gemini endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default per-request HTTP timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// `None` means the model path is disabled.
    pub api_key: Option<SecretString>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl LlmConfig {
    /// Build config from environment variables.
    ///
    /// A missing or blank `GEMINI_API_KEY` is not an error: it leaves
    /// `api_key` unset and the pipeline answers without calling a model.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        let model = std::env::var("GEMINI_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = std::env::var("GEMINI_BASE_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = parse_env::<u64>("GEMINI_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Ok(Self {
            api_key,
            model,
            base_url,
            timeout,
        })
    }
}

/// Create an LLM provider from configuration.
///
/// Returns `Ok(None)` when no credential is configured.
pub fn create_provider(config: &LlmConfig) -> Result<Option<Arc<dyn LlmProvider>>, LlmError> {
    let Some(api_key) = config.api_key.as_ref() else {
        tracing::warn!("GEMINI_API_KEY not set, model-backed triage disabled");
        return Ok(None);
    };

    let provider = GeminiProvider::new(
        SecretString::from(api_key.expose_secret()),
        &config.model,
        &config.base_url,
        config.timeout,
    )?;
    tracing::info!("Using Gemini (model: {})", config.model);
    Ok(Some(Arc::new(provider)))
}
