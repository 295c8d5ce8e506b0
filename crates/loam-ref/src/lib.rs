//! Loam Ref - reference types and agent coordination
//!
//! Managed identities over immutable `loam-core` values:
//! - [`Atom`]: synchronous compare-and-swap updates
//! - [`Agent`]: asynchronous, serialized actions with error modes and restart
//! - [`Future`] and [`Delay`]: values computed elsewhere or later
//! - [`CountDownLatch`] and [`AtomicBoolean`]: small coordination primitives
//!
//! Every reference supports validators and watches through [`IRef`].
//! Agent actions run on a process-wide [`executor`], configured once from a
//! [`RuntimeConfig`].
//!
//! # Example
//!
//! ```rust
//! use loam_core::{Func, Value};
//! use loam_ref::prelude::*;
//!
//! # fn example() -> Result<(), RefError> {
//! let hits = Atom::new(Value::Long(0));
//! let inc = Func::new("inc", |args| match args {
//!     [Value::Long(n)] => Ok(Value::Long(n + 1)),
//!     _ => Err(loam_core::Error::user("expected a long")),
//! });
//! hits.swap(&inc, &[])?;
//! assert_eq!(hits.deref(), Value::Long(1));
//!
//! let log = Agent::new(Value::Long(0));
//! log.send(inc, [])?;
//! await_agents(&[log.clone()], None)?;
//! assert_eq!(log.deref(), Value::Long(1));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![recursion_limit = "256"]
#![doc(test(attr(recursion_limit = "256")))]
#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod agent;
pub mod aref;
pub mod atom;
pub mod atomic_bool;
pub mod config;
pub mod delay;
pub mod error;
pub mod executor;
pub mod future;
pub mod latch;
pub mod stress;
pub mod txn;

// Re-exports for convenience
pub use agent::{
    await_agents, error_handler, release_pending_sends, Action, ActionQueue, Agent, ErrorHandler,
    ErrorMode,
};
pub use aref::{validator, watch, IRef, RefCore, Validator, WatchFn};
pub use atom::Atom;
pub use atomic_bool::AtomicBoolean;
pub use config::RuntimeConfig;
pub use delay::Delay;
pub use error::{ActionError, ConfigError, RefError};
pub use executor::{DispatchMode, Dispatcher, ThreadDispatcher};
pub use future::{CancelToken, Future};
pub use latch::CountDownLatch;
pub use stress::StressReport;
pub use txn::{Transaction, TransactionScope};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Loam references
    pub use crate::{
        await_agents, error_handler, validator, watch, ActionError, Agent, Atom, Delay,
        DispatchMode, ErrorMode, Future, IRef, RefError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
