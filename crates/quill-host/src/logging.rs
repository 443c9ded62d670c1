//! Logging setup and the guest log sink.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::error::{HostError, HostResult};

/// Target under which guest log messages are emitted.
pub const GUEST_TARGET: &str = "quill::guest";

/// Output format for the fmt subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    pub directives: Vec<String>,
}

impl LogConfig {
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::default(),
            directives: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Adds a filter directive such as `quill::guest=debug`.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    fn filter(&self) -> HostResult<EnvFilter> {
        let mut filter = EnvFilter::try_new(&self.level).map_err(|e| config_error(&e))?;
        for directive in &self.directives {
            filter = filter.add_directive(directive.parse().map_err(|e| config_error(&e))?);
        }
        Ok(filter)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

fn config_error(e: &impl std::fmt::Display) -> HostError {
    HostError::Config {
        path: "<logging>".into(),
        message: e.to_string(),
    }
}

/// Installs a global `tracing` subscriber.
///
/// # Errors
///
/// Returns [`HostError::Config`] if a filter directive is invalid or a
/// global subscriber is already installed.
pub fn init(config: &LogConfig) -> HostResult<()> {
    let filter = config.filter()?;
    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };
    result.map_err(|e| config_error(&e))
}

/// Re-emits a guest log message at the level the guest asked for.
pub(crate) fn guest_log(level: &str, message: &str) {
    match level.to_ascii_lowercase().as_str() {
        "error" => tracing::error!(target: GUEST_TARGET, "{message}"),
        "warn" | "warning" => tracing::warn!(target: GUEST_TARGET, "{message}"),
        "debug" => tracing::debug!(target: GUEST_TARGET, "{message}"),
        "trace" => tracing::trace!(target: GUEST_TARGET, "{message}"),
        _ => tracing::info!(target: GUEST_TARGET, "{message}"),
    }
}
