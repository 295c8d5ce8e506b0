//! Agent: asynchronous, serialized state changes
//!
//! Each agent owns an action queue. Sending appends an action; the agent
//! runs its actions one at a time, in send order, on a [`Dispatcher`]
//! thread. The queue and the error slot form a single immutable
//! [`ActionQueue`] value swapped with compare-and-swap, so senders never
//! block and never take a lock.
//!
//! # Lifecycle of an action
//!
//! 1. `dispatch` appends the action; if the queue was idle the action is
//!    launched right away
//! 2. The action runs `f(state, args...)`, validates the result, stores it
//!    and notifies watches
//! 3. Sends made inside the action are buffered and released only if it
//!    succeeded
//! 4. On failure the error handler runs; in [`ErrorMode::Fail`] the agent
//!    keeps the error and stops until [`Agent::restart`]
//! 5. The action is popped and the next head, if any, is launched from the
//!    finishing thread
//!
//! # Example
//!
//! ```rust
//! use loam_core::{Func, Value};
//! use loam_ref::{await_agents, Agent, IRef};
//!
//! let counter = Agent::new(Value::Long(0));
//! let inc = Func::new("inc", |args| match args {
//!     [Value::Long(n)] => Ok(Value::Long(n + 1)),
//!     _ => Err(loam_core::Error::user("expected a long")),
//! });
//! for _ in 0..10 {
//!     counter.send(inc.clone(), []).unwrap();
//! }
//! await_agents(&[counter.clone()], None).unwrap();
//! assert_eq!(counter.deref(), Value::Long(10));
//! ```

use crate::aref::{IRef, RefCore};
use crate::error::{ActionError, RefError};
use crate::executor::{self, DispatchMode, Dispatcher};
use crate::latch::CountDownLatch;
use crate::txn;
use arc_swap::ArcSwap;
use loam_core::{Func, PersistentQueue, Value};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// What an agent does after a failed action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Drop the error and run the next action
    #[default]
    Continue,
    /// Keep the error and refuse work until restarted
    Fail,
}

/// Callback for failed actions: `(agent, error)`
///
/// Its own failure is logged and ignored.
pub type ErrorHandler = Arc<dyn Fn(&Agent, &ActionError) -> loam_core::Result<()> + Send + Sync>;

/// Wrap a closure as an [`ErrorHandler`]
pub fn error_handler<F>(f: F) -> ErrorHandler
where
    F: Fn(&Agent, &ActionError) -> loam_core::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Extra arguments passed after the state
pub type ActionArgs = SmallVec<[Value; 3]>;

thread_local! {
    /// Sends buffered by the action running on this thread
    static NESTED: RefCell<Option<Vec<Action>>> = const { RefCell::new(None) };
}

/// A pending `f(state, args...)` for one agent
#[derive(Clone)]
pub struct Action {
    agent: Agent,
    f: Func,
    args: ActionArgs,
    mode: DispatchMode,
}

impl Action {
    /// Action updating `agent` with `f`
    #[must_use]
    pub fn new(agent: Agent, f: Func, args: ActionArgs, mode: DispatchMode) -> Self {
        Self {
            agent,
            f,
            args,
            mode,
        }
    }

    /// Target agent
    #[inline]
    #[must_use]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Scheduling mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Append to the target agent's queue, bypassing transaction and nesting
    ///
    /// Transactions call this for each held action once they commit.
    pub fn release(self) {
        let agent = self.agent.clone();
        agent.enqueue(self);
    }

    /// Hand the action to the agent's dispatcher
    fn launch(self) {
        let agent = self.agent.clone();
        let dispatcher = Arc::clone(&agent.0.dispatcher);
        let mode = self.mode;
        if let Err(err) = dispatcher.dispatch(mode, Box::new(move || self.run())) {
            tracing::error!(error = %err, ?mode, "failed to dispatch agent action");
            let error = ActionError::Dispatch(Arc::new(err));
            // may run from a finishing action; the handler must send directly
            let outer = NESTED.with(|nested| nested.replace(None));
            agent.handle_error(&error);
            NESTED.with(|nested| nested.replace(outer));
            agent.finish(agent.settle(error));
        }
    }

    /// Body executed on the dispatcher thread
    fn run(self) {
        let outer = NESTED.with(|nested| nested.replace(Some(Vec::new())));
        let agent = &self.agent;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.apply()))
            .unwrap_or_else(|_| Err(loam_core::Error::user("agent action panicked").into()));

        let error = match outcome {
            Ok(()) => {
                release_pending_sends();
                None
            }
            Err(err) => {
                // the handler may send directly
                NESTED.with(|nested| nested.replace(None));
                let error = ActionError::Action(err);
                agent.handle_error(&error);
                agent.settle(error)
            }
        };
        agent.finish(error);

        NESTED.with(|nested| nested.replace(outer));
    }

    fn apply(&self) -> Result<(), RefError> {
        let old = self.agent.deref();
        let new = self.f.apply_to(old.clone(), &self.args)?;
        self.agent.set_state(new.clone())?;
        self.agent.0.core.notify_watches(&self.agent, &old, &new)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("f", &self.f.name())
            .field("args", &self.args.len())
            .field("mode", &self.mode)
            .finish()
    }
}

/// Pending actions and the failure that stopped the agent, swapped as one
#[derive(Debug, Clone, Default)]
pub struct ActionQueue {
    q: PersistentQueue<Action>,
    error: Option<ActionError>,
}

impl ActionQueue {
    /// Number of pending actions, the running one included
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.q.count()
    }

    /// Stored failure
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&ActionError> {
        self.error.as_ref()
    }
}

struct AgentInner {
    state: ArcSwap<Value>,
    aq: ArcSwap<ActionQueue>,
    core: RefCore,
    error_mode: RwLock<ErrorMode>,
    error_handler: RwLock<Option<ErrorHandler>>,
    dispatcher: Arc<dyn Dispatcher>,
    restart_lock: Mutex<()>,
}

/// Shared handle to an agent
#[derive(Clone)]
pub struct Agent(Arc<AgentInner>);

impl Agent {
    /// Agent holding `state`, using the global runtime
    #[must_use]
    pub fn new(state: Value) -> Self {
        let runtime = executor::runtime();
        Self::build(state, Arc::clone(runtime.dispatcher()), runtime.default_error_mode())
    }

    /// Agent holding `state` whose actions run on `dispatcher`
    #[must_use]
    pub fn with_dispatcher(state: Value, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self::build(state, dispatcher, executor::runtime().default_error_mode())
    }

    fn build(state: Value, dispatcher: Arc<dyn Dispatcher>, error_mode: ErrorMode) -> Self {
        Self(Arc::new(AgentInner {
            state: ArcSwap::from_pointee(state),
            aq: ArcSwap::from_pointee(ActionQueue::default()),
            core: RefCore::new(),
            error_mode: RwLock::new(error_mode),
            error_handler: RwLock::new(None),
            dispatcher,
            restart_lock: Mutex::new(()),
        }))
    }

    /// Queue `f(state, args...)` to run with `mode`
    ///
    /// Inside a transaction the action goes to the transaction; inside an
    /// action it is held until that action succeeds.
    ///
    /// # Errors
    /// Returns [`RefError::AgentFailed`] if the agent holds an error
    pub fn dispatch(
        &self,
        f: Func,
        args: impl IntoIterator<Item = Value>,
        mode: DispatchMode,
    ) -> Result<&Self, RefError> {
        if let Some(error) = self.error() {
            return Err(RefError::AgentFailed(Box::new(error)));
        }
        dispatch_action(Action::new(self.clone(), f, args.into_iter().collect(), mode));
        Ok(self)
    }

    /// Queue an action on the shared pool
    ///
    /// # Errors
    /// As [`Agent::dispatch`]
    pub fn send(&self, f: Func, args: impl IntoIterator<Item = Value>) -> Result<&Self, RefError> {
        self.dispatch(f, args, DispatchMode::Pooled)
    }

    /// Queue a potentially blocking action on its own thread
    ///
    /// # Errors
    /// As [`Agent::dispatch`]
    pub fn send_off(&self, f: Func, args: impl IntoIterator<Item = Value>) -> Result<&Self, RefError> {
        self.dispatch(f, args, DispatchMode::Solo)
    }

    /// Clear the error and set the state to `new_state`
    ///
    /// With `clear_actions` pending actions are dropped, otherwise the queue
    /// resumes from its head.
    ///
    /// # Errors
    /// Returns [`RefError::RestartNotNeeded`] if the agent holds no error, or
    /// [`RefError::Validation`] if `new_state` is rejected
    pub fn restart(&self, new_state: Value, clear_actions: bool) -> Result<Value, RefError> {
        let _guard = self.0.restart_lock.lock();
        if self.error().is_none() {
            return Err(RefError::RestartNotNeeded);
        }
        self.0.core.validate(&new_state)?;
        self.0.state.store(Arc::new(new_state.clone()));

        if clear_actions {
            self.0.aq.store(Arc::new(ActionQueue::default()));
            tracing::debug!("agent restarted with cleared queue");
        } else {
            let prior = self.0.aq.rcu(|aq| ActionQueue {
                q: aq.q.clone(),
                error: None,
            });
            tracing::debug!(pending = prior.q.count(), "agent restarted");
            if let Some(head) = prior.q.peek().cloned() {
                head.launch();
            }
        }
        Ok(new_state)
    }

    /// Stored failure, if the agent is failed
    #[must_use]
    pub fn error(&self) -> Option<ActionError> {
        self.0.aq.load().error.clone()
    }

    /// Current error mode
    #[must_use]
    pub fn error_mode(&self) -> ErrorMode {
        *self.0.error_mode.read()
    }

    /// Change the error mode for later failures
    pub fn set_error_mode(&self, mode: ErrorMode) {
        *self.0.error_mode.write() = mode;
    }

    /// Current error handler
    #[must_use]
    pub fn error_handler(&self) -> Option<ErrorHandler> {
        self.0.error_handler.read().clone()
    }

    /// Replace the error handler
    pub fn set_error_handler(&self, handler: Option<ErrorHandler>) {
        *self.0.error_handler.write() = handler;
    }

    /// Actions queued or running
    #[must_use]
    pub fn queue_count(&self) -> usize {
        self.0.aq.load().count()
    }

    /// Check if both handles refer to the same agent
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn set_state(&self, new: Value) -> Result<(), RefError> {
        self.0.core.validate(&new)?;
        self.0.state.store(Arc::new(new));
        Ok(())
    }

    fn enqueue(&self, action: Action) {
        let prior = self.0.aq.rcu(|aq| ActionQueue {
            q: aq.q.conj(action.clone()),
            error: aq.error.clone(),
        });
        tracing::trace!(pending = prior.q.count() + 1, "action queued");
        if prior.q.is_empty() && prior.error.is_none() {
            action.launch();
        }
    }

    fn handle_error(&self, error: &ActionError) {
        let Some(handler) = self.error_handler() else {
            return;
        };
        if let Err(err) = handler(self, error) {
            tracing::warn!(error = %err, "agent error handler failed");
        }
    }

    /// Error to keep after a failure, per the error mode
    fn settle(&self, error: ActionError) -> Option<ActionError> {
        match self.error_mode() {
            ErrorMode::Continue => None,
            ErrorMode::Fail => {
                tracing::warn!(%error, "agent failed");
                Some(error)
            }
        }
    }

    /// Pop the finished action and launch the next one
    fn finish(&self, error: Option<ActionError>) {
        let failed = error.is_some();
        let prior = self.0.aq.rcu(|aq| ActionQueue {
            q: aq.q.pop(),
            error: error.clone(),
        });
        if failed {
            return;
        }
        if let Some(next) = prior.q.pop().peek().cloned() {
            next.launch();
        }
    }
}

impl IRef for Agent {
    fn deref(&self) -> Value {
        (**self.0.state.load()).clone()
    }

    fn ref_core(&self) -> &RefCore {
        &self.0.core
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let aq = self.0.aq.load();
        f.debug_struct("Agent")
            .field("state", &**self.0.state.load())
            .field("queued", &aq.count())
            .field("failed", &aq.error.is_some())
            .finish()
    }
}

fn dispatch_action(action: Action) {
    if let Some(txn) = txn::running() {
        txn.enqueue(action);
        return;
    }
    let unbuffered = NESTED.with(|nested| match nested.borrow_mut().as_mut() {
        Some(buffer) => {
            buffer.push(action);
            None
        }
        None => Some(action),
    });
    if let Some(action) = unbuffered {
        action.release();
    }
}

/// Enqueue the sends buffered by the running action; returns how many
///
/// Called automatically when an action succeeds.
pub fn release_pending_sends() -> usize {
    let sends = NESTED.with(|nested| nested.borrow_mut().as_mut().map(std::mem::take));
    let Some(sends) = sends else {
        return 0;
    };
    let released = sends.len();
    for action in sends {
        action.release();
    }
    released
}

/// Check if the current thread is running an agent action
#[must_use]
pub fn in_action() -> bool {
    NESTED.with(|nested| nested.borrow().is_some())
}

/// Block until every action sent so far from this thread to `agents` ran
///
/// # Errors
/// Returns [`RefError::AwaitInAction`] inside an action,
/// [`RefError::AgentFailed`] if an agent is failed, or [`RefError::Timeout`]
/// when `timeout` passes first
pub fn await_agents(agents: &[Agent], timeout: Option<Duration>) -> Result<(), RefError> {
    if in_action() {
        return Err(RefError::AwaitInAction);
    }
    let latch = Arc::new(CountDownLatch::new(agents.len()));
    let count_down = {
        let latch = Arc::clone(&latch);
        Func::new("await", move |args| {
            latch.count_down();
            Ok(args.first().cloned().unwrap_or_default())
        })
    };
    for agent in agents {
        agent.send(count_down.clone(), [])?;
    }
    match timeout {
        None => {
            latch.await_zero();
            Ok(())
        }
        Some(limit) if latch.await_timeout(limit) => Ok(()),
        Some(limit) => Err(RefError::timeout(limit)),
    }
}
