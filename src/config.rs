//! Configuration types.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::error::ConfigError;

/// Pipeline tuning for the model-backed path.
///
/// Rule thresholds and vocabularies are fixed constants in
/// `pipeline::rules`; only the model interaction is tunable here.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Cap on characters sent to the model (head + tail with an elision marker).
    pub max_input_chars: usize,
    /// Share of `max_input_chars` taken from the start of the text.
    pub head_ratio: f32,
    /// Temperature for the classification call.
    pub primary_temperature: f32,
    /// Temperature for the JSON repair call.
    pub fix_temperature: f32,
    /// Output token ceiling for every model call.
    pub max_output_tokens: u32,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 6000,
            head_ratio: 0.7,
            primary_temperature: 0.2,
            fix_temperature: 0.0,
            max_output_tokens: 800,
        }
    }
}

impl TriageConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            max_input_chars: parse_env("TRIAGE_MAX_INPUT_CHARS")?
                .unwrap_or(defaults.max_input_chars),
            max_output_tokens: parse_env("TRIAGE_MAX_OUTPUT_TOKENS")?
                .unwrap_or(defaults.max_output_tokens),
            ..defaults
        })
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    /// Largest accepted request body (uploads included).
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            bind: parse_env("TRIAGE_BIND")?.unwrap_or(defaults.bind),
            port: parse_env("TRIAGE_PORT")?.unwrap_or(defaults.port),
            max_upload_bytes: parse_env("TRIAGE_MAX_UPLOAD_BYTES")?
                .unwrap_or(defaults.max_upload_bytes),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Read and parse an optional environment variable.
///
/// Unset or blank means `None`; a value that fails to parse is an error
/// rather than a silent fallback.
pub(crate) fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triage_defaults_match_pipeline_contract() {
        let config = TriageConfig::default();
        assert_eq!(config.max_input_chars, 6000);
        assert!((config.head_ratio - 0.7).abs() < f32::EPSILON);
        assert!((config.primary_temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.fix_temperature, 0.0);
        assert_eq!(config.max_output_tokens, 800);
    }

    #[test]
    fn server_socket_addr() {
        let config = ServerConfig {
            port: 8081,
            ..ServerConfig::default()
        };
        assert_eq!(config.socket_addr().port(), 8081);
    }

    #[test]
    fn parse_env_unset_is_none() {
        let value: Option<u16> = parse_env("EMAIL_TRIAGE_TEST_SURELY_UNSET").unwrap();
        assert!(value.is_none());
    }
}
