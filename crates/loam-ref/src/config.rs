//! Runtime configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! [executor]
//! pooled_threads = 8
//! pooled_thread_name = "loam-pool"
//! solo_thread_name = "loam-solo"
//!
//! [agent]
//! default_error_mode = "continue"
//! ```
//!
//! Every key is optional.

use crate::agent::ErrorMode;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Thread settings for action dispatch
    pub executor: ExecutorConfig,
    /// Defaults for new agents
    pub agent: AgentDefaults,
}

impl RuntimeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a fixed pooled thread count
    #[inline]
    #[must_use]
    pub fn with_pooled_threads(mut self, threads: usize) -> Self {
        self.executor.pooled_threads = Some(threads);
        self
    }

    /// With the pooled thread name prefix
    #[inline]
    #[must_use]
    pub fn with_pooled_thread_name(mut self, name: impl Into<String>) -> Self {
        self.executor.pooled_thread_name = name.into();
        self
    }

    /// With the solo thread name prefix
    #[inline]
    #[must_use]
    pub fn with_solo_thread_name(mut self, name: impl Into<String>) -> Self {
        self.executor.solo_thread_name = name.into();
        self
    }

    /// With the error mode given to new agents
    #[inline]
    #[must_use]
    pub fn with_default_error_mode(mut self, mode: ErrorMode) -> Self {
        self.agent.default_error_mode = mode;
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
    /// [`ConfigError::Invalid`] for out-of-range values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise as
    /// [`RuntimeConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded runtime config");
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the bad key
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executor.pooled_threads == Some(0) {
            return Err(ConfigError::Invalid(
                "executor.pooled_threads must be at least 1".to_string(),
            ));
        }
        if self.executor.pooled_thread_name.is_empty() || self.executor.solo_thread_name.is_empty() {
            return Err(ConfigError::Invalid(
                "executor thread names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Executor thread settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Pooled worker count; `None` lets rayon pick one per core
    pub pooled_threads: Option<usize>,
    /// Name prefix for pooled workers
    pub pooled_thread_name: String,
    /// Name prefix for dedicated solo threads
    pub solo_thread_name: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            pooled_threads: None,
            pooled_thread_name: "loam-pool".to_string(),
            solo_thread_name: "loam-solo".to_string(),
        }
    }
}

/// Defaults applied to new agents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentDefaults {
    /// Error mode for agents created without an explicit one
    pub default_error_mode: ErrorMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_text_gives_defaults() {
        assert_eq!(RuntimeConfig::from_toml_str("").unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn parses_every_key() {
        let text = r#"
            [executor]
            pooled_threads = 3
            pooled_thread_name = "p"
            solo_thread_name = "s"

            [agent]
            default_error_mode = "fail"
        "#;
        let expected = RuntimeConfig::new()
            .with_pooled_threads(3)
            .with_pooled_thread_name("p")
            .with_solo_thread_name("s")
            .with_default_error_mode(ErrorMode::Fail);
        assert_eq!(RuntimeConfig::from_toml_str(text).unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(matches!(
            RuntimeConfig::from_toml_str("[executor]\nthreads = 2"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_toml_str("[executor]\npooled_threads = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_toml_str("[agent]\ndefault_error_mode = \"retry\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
