//! Action executors
//!
//! Agents never run actions on the sending thread. A [`Dispatcher`] takes a
//! job and a [`DispatchMode`]:
//! - [`DispatchMode::Pooled`] jobs share a bounded rayon pool (CPU-bound work)
//! - [`DispatchMode::Solo`] jobs each get a dedicated thread (blocking work)
//!
//! The process-wide runtime is installed at most once with [`configure`];
//! without it the first use installs defaults.

use crate::agent::ErrorMode;
use crate::config::{ExecutorConfig, RuntimeConfig};
use crate::error::ConfigError;
use once_cell::sync::OnceCell;
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Unit of work handed to a dispatcher
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// How an action is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DispatchMode {
    /// Shared bounded pool (`send`)
    #[default]
    Pooled,
    /// Dedicated thread (`send-off`)
    Solo,
}

/// Thread substrate for agent actions and futures
pub trait Dispatcher: Send + Sync + Debug {
    /// Start `job` according to `mode`
    ///
    /// # Errors
    /// Returns the IO error from thread creation
    fn dispatch(&self, mode: DispatchMode, job: Job) -> std::io::Result<()>;
}

/// Default dispatcher over rayon and `std::thread`
#[derive(Debug)]
pub struct ThreadDispatcher {
    pool: Option<rayon::ThreadPool>,
    solo_name: String,
    solo_seq: AtomicUsize,
}

impl ThreadDispatcher {
    /// Build a dedicated pool as described by `config`
    ///
    /// # Errors
    /// Returns [`ConfigError::PoolBuild`] if rayon cannot start the workers
    pub fn new(config: &ExecutorConfig) -> Result<Self, ConfigError> {
        let prefix = config.pooled_thread_name.clone();
        let mut builder = rayon::ThreadPoolBuilder::new().thread_name(move |i| format!("{prefix}-{i}"));
        if let Some(threads) = config.pooled_threads {
            builder = builder.num_threads(threads);
        }
        Ok(Self {
            pool: Some(builder.build()?),
            solo_name: config.solo_thread_name.clone(),
            solo_seq: AtomicUsize::new(0),
        })
    }

    /// Run pooled jobs on rayon's global pool
    #[must_use]
    pub fn shared() -> Self {
        Self {
            pool: None,
            solo_name: ExecutorConfig::default().solo_thread_name,
            solo_seq: AtomicUsize::new(0),
        }
    }
}

impl Dispatcher for ThreadDispatcher {
    fn dispatch(&self, mode: DispatchMode, job: Job) -> std::io::Result<()> {
        match mode {
            DispatchMode::Pooled => {
                match &self.pool {
                    Some(pool) => pool.spawn(job),
                    None => rayon::spawn(job),
                }
                Ok(())
            }
            DispatchMode::Solo => {
                let n = self.solo_seq.fetch_add(1, Ordering::Relaxed);
                std::thread::Builder::new()
                    .name(format!("{}-{n}", self.solo_name))
                    .spawn(job)
                    .map(drop)
            }
        }
    }
}

/// Installed process-wide settings
#[derive(Debug)]
pub struct Runtime {
    dispatcher: Arc<dyn Dispatcher>,
    default_error_mode: ErrorMode,
}

impl Runtime {
    /// Shared dispatcher
    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    /// Error mode for agents created without one
    #[inline]
    #[must_use]
    pub fn default_error_mode(&self) -> ErrorMode {
        self.default_error_mode
    }
}

static RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// Install the global runtime from `config`
///
/// # Errors
/// Returns [`ConfigError::AlreadyConfigured`] if a runtime is installed
/// (explicitly or by earlier use), or the pool build error
pub fn configure(config: &RuntimeConfig) -> Result<(), ConfigError> {
    config.validate()?;
    if RUNTIME.get().is_some() {
        return Err(ConfigError::AlreadyConfigured);
    }
    let dispatcher = Arc::new(ThreadDispatcher::new(&config.executor)?);
    install(dispatcher, config.agent.default_error_mode)?;
    tracing::debug!(
        threads = ?config.executor.pooled_threads,
        error_mode = ?config.agent.default_error_mode,
        "runtime configured"
    );
    Ok(())
}

/// Install a custom dispatcher as the global runtime
///
/// # Errors
/// Returns [`ConfigError::AlreadyConfigured`] if a runtime is installed
pub fn install(dispatcher: Arc<dyn Dispatcher>, default_error_mode: ErrorMode) -> Result<(), ConfigError> {
    RUNTIME
        .set(Runtime {
            dispatcher,
            default_error_mode,
        })
        .map_err(|_| ConfigError::AlreadyConfigured)
}

/// Global runtime, installing defaults on first use
#[must_use]
pub fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| Runtime {
        dispatcher: Arc::new(ThreadDispatcher::shared()),
        default_error_mode: ErrorMode::default(),
    })
}

/// Global dispatcher
#[inline]
#[must_use]
pub fn dispatcher() -> Arc<dyn Dispatcher> {
    Arc::clone(runtime().dispatcher())
}
