//! Stress harness behind `loam-stress`
//!
//! Each run drives one reference type hard from several threads, then
//! checks the invariant that must survive contention:
//! - agents: every send applied exactly once, never two actions at a time
//! - atom: no lost updates under concurrent `swap`
//! - lazy: a shared lazy sequence realizes its body once

use crate::agent::{await_agents, Agent};
use crate::aref::IRef;
use crate::atom::Atom;
use crate::error::RefError;
use crate::executor::DispatchMode;
use loam_core::seq::{self, LongRange, Seq};
use loam_core::{Func, LazySeq, Value};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

/// How long a run may wait for agents to drain
const DRAIN_TIMEOUT: Duration = Duration::from_secs(120);

/// Outcome of a stress run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressReport {
    /// Run name
    pub name: &'static str,
    /// Operations issued
    pub operations: u64,
    /// Elapsed wall time in milliseconds
    pub elapsed_ms: u128,
    /// Invariant violations found
    pub violations: Vec<String>,
}

impl StressReport {
    fn new(name: &'static str, operations: u64, started: Instant) -> Self {
        Self {
            name,
            operations,
            elapsed_ms: started.elapsed().as_millis(),
            violations: Vec::new(),
        }
    }

    /// Check if no invariant was violated
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable summary
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();
        let _ = writeln!(report, "=== Loam stress: {} ===", self.name);
        let _ = writeln!(report, "Operations: {}", self.operations);
        let _ = writeln!(report, "Elapsed: {}ms", self.elapsed_ms);
        let _ = writeln!(report, "Violations: {}", self.violations.len());
        for (i, v) in self.violations.iter().enumerate() {
            let _ = writeln!(report, "  {}. {v}", i + 1);
        }
        let _ = writeln!(report, "=== Result: {} ===", if self.passed() { "PASS" } else { "FAIL" });
        report
    }
}

/// Send `sends` increments to each of `agents` agents and verify the totals
///
/// # Errors
/// Returns the first send failure, or [`RefError::Timeout`] if the agents do
/// not drain
pub fn run_agents(agents: usize, sends: u64, mode: DispatchMode) -> Result<StressReport, RefError> {
    let started = Instant::now();
    let overlaps = Arc::new(AtomicUsize::new(0));
    let fleet: Vec<(Agent, Func)> = (0..agents)
        .map(|_| {
            let active = Arc::new(AtomicBool::new(false));
            let overlaps = Arc::clone(&overlaps);
            let inc = Func::new("stress-inc", move |args| {
                if active.swap(true, Ordering::SeqCst) {
                    overlaps.fetch_add(1, Ordering::SeqCst);
                }
                let next = match args {
                    [Value::Long(n)] => Ok(Value::Long(n + 1)),
                    _ => Err(loam_core::Error::user("stress agent expects a long")),
                };
                active.store(false, Ordering::SeqCst);
                next
            });
            (Agent::new(Value::Long(0)), inc)
        })
        .collect();

    for _ in 0..sends {
        for (agent, inc) in &fleet {
            agent.dispatch(inc.clone(), [], mode)?;
        }
    }
    let handles: Vec<Agent> = fleet.iter().map(|(agent, _)| agent.clone()).collect();
    await_agents(&handles, Some(DRAIN_TIMEOUT))?;

    let operations = sends * agents as u64;
    let mut report = StressReport::new("agents", operations, started);
    let expected = i64::try_from(sends).unwrap_or(i64::MAX);
    for (i, agent) in handles.iter().enumerate() {
        let state = agent.deref();
        if state != Value::Long(expected) {
            report.violations.push(format!("agent {i} ended at {state}, expected {expected}"));
        }
    }
    let overlapping = overlaps.load(Ordering::SeqCst);
    if overlapping > 0 {
        report
            .violations
            .push(format!("{overlapping} actions overlapped on one agent"));
    }
    tracing::debug!(agents, sends, ?mode, "agent stress finished");
    Ok(report)
}

/// Increment one atom from `threads` threads, `increments` times each
///
/// # Errors
/// Returns the first swap failure
pub fn run_atom(threads: usize, increments: u64) -> Result<StressReport, RefError> {
    let started = Instant::now();
    let atom = Atom::new(Value::Long(0));
    let inc = Func::new("inc", |args| match args {
        [Value::Long(n)] => Ok(Value::Long(n + 1)),
        _ => Err(loam_core::Error::user("stress atom expects a long")),
    });
    let barrier = Barrier::new(threads);

    let results: Vec<Result<(), RefError>> = crossbeam::scope(|scope| {
        let workers: Vec<_> = (0..threads)
            .map(|_| {
                let (atom, inc, barrier) = (&atom, &inc, &barrier);
                scope.spawn(move |_| -> Result<(), RefError> {
                    barrier.wait();
                    for _ in 0..increments {
                        atom.swap(inc, &[])?;
                    }
                    Ok(())
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|w| {
                w.join()
                    .unwrap_or_else(|_| Err(loam_core::Error::user("atom worker panicked").into()))
            })
            .collect()
    })
    .unwrap_or_else(|_| vec![Err(loam_core::Error::user("atom scope panicked").into())]);
    results.into_iter().collect::<Result<(), RefError>>()?;

    let operations = increments * threads as u64;
    let mut report = StressReport::new("atom", operations, started);
    let expected = Value::Long(i64::try_from(operations).unwrap_or(i64::MAX));
    let state = atom.deref();
    if state != expected {
        report
            .violations
            .push(format!("atom ended at {state}, expected {expected}"));
    }
    Ok(report)
}

/// Realize one lazy sequence from `callers` threads at once
///
/// # Errors
/// Returns the first realization failure
pub fn run_lazy(callers: usize) -> Result<StressReport, RefError> {
    let started = Instant::now();
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let lazy: Seq = Arc::new(LazySeq::from_fn(move || {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Seq(LongRange::to(1_000)))
    }));
    let barrier = Barrier::new(callers);

    let sums: Vec<loam_core::Result<i64>> = crossbeam::scope(|scope| {
        let workers: Vec<_> = (0..callers)
            .map(|_| {
                let (lazy, barrier) = (Arc::clone(&lazy), &barrier);
                scope.spawn(move |_| {
                    barrier.wait();
                    seq::iter(Some(lazy)).try_fold(0i64, |acc, v| -> loam_core::Result<i64> {
                        match v? {
                            Value::Long(n) => Ok(acc + n),
                            other => Err(loam_core::Error::user(format!("unexpected {other}"))),
                        }
                    })
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|w| {
                w.join()
                    .unwrap_or_else(|_| Err(loam_core::Error::user("lazy worker panicked")))
            })
            .collect()
    })
    .unwrap_or_else(|_| vec![Err(loam_core::Error::user("lazy scope panicked"))]);

    let mut report = StressReport::new("lazy", callers as u64, started);
    for (i, sum) in sums.into_iter().enumerate() {
        let sum = sum?;
        if sum != 499_500 {
            report.violations.push(format!("caller {i} summed {sum}, expected 499500"));
        }
    }
    let realized = calls.load(Ordering::SeqCst);
    if realized != 1 {
        report
            .violations
            .push(format!("lazy body ran {realized} times, expected once"));
    }
    Ok(report)
}
