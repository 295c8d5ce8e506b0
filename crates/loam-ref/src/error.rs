//! Error types for Loam references
//!
//! Provides error handling for:
//! - Validator rejections
//! - Agent failure, restart and await misuse
//! - Future timeouts, cancellation and failures
//! - Runtime configuration loading

use std::path::PathBuf;
use std::sync::Arc;

/// Main reference error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum RefError {
    /// Failure from the data layer or from user code
    #[error(transparent)]
    Core(#[from] loam_core::Error),

    /// Validator rejected the proposed state
    #[error("invalid reference state")]
    Validation,

    /// Agent holds an error and refuses new actions
    #[error("agent is failed, needs restart")]
    AgentFailed(#[source] Box<ActionError>),

    /// `restart` called on an agent without an error
    #[error("agent does not need a restart")]
    RestartNotNeeded,

    /// `await_agents` called from inside an agent action
    #[error("can't await in agent action")]
    AwaitInAction,

    /// Blocking wait gave up
    #[error("operation timed out after {millis}ms")]
    Timeout {
        /// Wait duration in milliseconds
        millis: u64,
    },

    /// Future was cancelled before producing a value
    #[error("future was cancelled")]
    Cancelled,

    /// Future computation failed
    #[error("future failed: {0}")]
    FutureFailed(#[source] loam_core::Error),

    /// Work could not be handed to a thread
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

impl RefError {
    /// Check if error signals a protocol misuse rather than a data problem
    #[inline]
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        match self {
            Self::Core(err) => err.is_usage_error(),
            Self::AgentFailed(_) | Self::RestartNotNeeded | Self::AwaitInAction => true,
            _ => false,
        }
    }

    /// Check if error is a validator rejection
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation)
    }

    /// Build a [`RefError::Timeout`]
    #[inline]
    #[must_use]
    pub fn timeout(waited: std::time::Duration) -> Self {
        Self::Timeout {
            millis: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl From<RefError> for loam_core::Error {
    fn from(err: RefError) -> Self {
        match err {
            RefError::Core(inner) => inner,
            other => Self::external(other),
        }
    }
}

/// Why an agent action did not complete
#[derive(Debug, Clone, thiserror::Error)]
pub enum ActionError {
    /// The action function or the validator failed
    #[error("action failed: {0}")]
    Action(#[source] RefError),

    /// The executor could not start the action
    #[error("failed to dispatch action: {0}")]
    Dispatch(#[source] Arc<std::io::Error>),
}

impl ActionError {
    /// Check if the executor, not user code, caused the failure
    #[inline]
    #[must_use]
    pub fn is_dispatch(&self) -> bool {
        matches!(self, Self::Dispatch(_))
    }
}

/// Runtime configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        /// File that was requested
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for [`crate::RuntimeConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but holds an unusable value
    #[error("invalid config value: {0}")]
    Invalid(String),

    /// Thread pool could not be built
    #[error("failed to build thread pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),

    /// Global runtime was already installed
    #[error("runtime already configured")]
    AlreadyConfigured,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn usage_errors_are_distinguished() {
        assert!(RefError::RestartNotNeeded.is_usage_error());
        assert!(RefError::AwaitInAction.is_usage_error());
        assert!(RefError::Core(loam_core::Error::TransientSealed).is_usage_error());
        assert!(!RefError::Validation.is_usage_error());
        assert!(RefError::Validation.is_validation());
        assert!(!RefError::Cancelled.is_validation());
    }

    #[test]
    fn converts_into_core_errors() {
        let core: loam_core::Error = RefError::Core(loam_core::Error::user("boom")).into();
        assert_eq!(core.to_string(), "boom");

        let wrapped: loam_core::Error = RefError::Validation.into();
        assert_eq!(wrapped.to_string(), "invalid reference state");
    }

    #[test]
    fn timeout_reports_millis() {
        assert_eq!(
            RefError::timeout(Duration::from_millis(250)).to_string(),
            "operation timed out after 250ms"
        );
    }

    #[test]
    fn dispatch_failures_are_flagged() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "no threads");
        assert!(ActionError::Dispatch(Arc::new(io)).is_dispatch());
        assert!(!ActionError::Action(RefError::Validation).is_dispatch());
    }
}
