//! Reference host configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! user_agent = "quill/0.1"
//! timeout_secs = 30
//!
//! [rate_limit]
//! requests = 10
//! period_secs = 60
//!
//! [defaults]
//! language = "en"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostResult};

/// Maximum response body accepted from the transport (10 MB).
pub const MAX_PAYLOAD_LEN: u64 = 10_485_760;

/// Window length used until one is configured.
pub const DEFAULT_RATE_LIMIT_PERIOD_SECS: u32 = 60;

/// Outgoing request throttle: at most `requests` sends per `period_secs` window.
///
/// A zero count or a zero-length window leaves sends unthrottled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests: u32,
    #[serde(default = "default_period_secs")]
    pub period_secs: u32,
}

fn default_period_secs() -> u32 {
    DEFAULT_RATE_LIMIT_PERIOD_SECS
}

impl RateLimitConfig {
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(u64::from(self.period_secs))
    }
}

/// Settings for one host session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Sent with every request that does not set its own `User-Agent`.
    pub user_agent: String,
    /// Per-request transport timeout.
    pub timeout_secs: u64,
    /// Largest response body, in bytes.
    pub max_payload_len: u64,
    /// Unset means unthrottled.
    pub rate_limit: Option<RateLimitConfig>,
    /// Seed values for the defaults store.
    pub defaults: BTreeMap<String, serde_json::Value>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("quill/", env!("CARGO_PKG_VERSION")).to_owned(),
            timeout_secs: 30,
            max_payload_len: MAX_PAYLOAD_LEN,
            rate_limit: None,
            defaults: BTreeMap::new(),
        }
    }
}

impl HostConfig {
    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Config`] if the document is not valid TOML or has
    /// mistyped keys.
    pub fn from_toml_str(text: &str) -> HostResult<Self> {
        toml::from_str(text).map_err(|e| HostError::Config {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> HostResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| HostError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = toml::from_str(&text).map_err(|e| HostError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded host config");
        Ok(config)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        let config = HostConfig::from_toml_str("").unwrap();
        assert_eq!(config, HostConfig::default());
        assert!(config.rate_limit.is_none());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn parses_rate_limit_and_defaults() {
        let config = HostConfig::from_toml_str(
            r#"
            user_agent = "test-agent"

            [rate_limit]
            requests = 5

            [defaults]
            language = "en"
            pages = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.user_agent, "test-agent");
        let limit = config.rate_limit.unwrap();
        assert_eq!(limit.requests, 5);
        assert_eq!(limit.window(), Duration::from_secs(60));
        assert_eq!(config.defaults["language"], serde_json::json!("en"));
        assert_eq!(config.defaults["pages"], serde_json::json!(3));
    }

    #[test]
    fn rejects_mistyped_keys() {
        let err = HostConfig::from_toml_str("timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, HostError::Config { .. }));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = 5").unwrap();
        let config = HostConfig::load(file.path()).unwrap();
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = HostConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, HostError::Config { .. }));
    }
}
