//! Testing utilities for Loam workspace
//!
//! Shared test helpers, fixtures, and assertions.

#![allow(missing_docs)]

use loam_core::{seq, Error, Func, Result, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub fn long(n: i64) -> Value {
    Value::Long(n)
}

pub fn longs(xs: &[i64]) -> Value {
    Value::list(xs.iter().copied().map(Value::Long))
}

/// Collect a seqable of longs, panicking on anything else
pub fn collect_longs(coll: &Value) -> Vec<i64> {
    seq::to_vec(coll)
        .unwrap()
        .into_iter()
        .map(|v| match v {
            Value::Long(n) => n,
            other => panic!("expected long, got {other:?}"),
        })
        .collect()
}

pub fn as_long(v: &Value) -> i64 {
    match v {
        Value::Long(n) => *n,
        other => panic!("expected long, got {other:?}"),
    }
}

/// `(fn [x] (inc x))`
pub fn inc_fn() -> Func {
    Func::new("inc", |args| match args {
        [Value::Long(x)] => Ok(Value::Long(x + 1)),
        _ => Err(Error::user("inc expects one long")),
    })
}

/// `(fn [state & xs] (apply + state xs))` over longs
pub fn add_fn() -> Func {
    Func::new("+", |args| {
        args.iter().try_fold(Value::Long(0), |acc, x| match (acc, x) {
            (Value::Long(a), Value::Long(b)) => Ok(Value::Long(a + b)),
            _ => Err(Error::user("+ expects longs")),
        })
    })
}

/// Function that always fails with `message`
pub fn failing_fn(message: &'static str) -> Func {
    Func::new("fail", move |_| Err(Error::user(message)))
}

/// Thunk returning `produce` and counting its calls
pub fn counting_thunk(produce: Value) -> (Func, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let thunk = Func::new("counting", move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(produce.clone())
    });
    (thunk, calls)
}

/// Poll `check` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    check()
}

/// Unwrap a core result with the error in the panic message
pub fn ok<T>(result: Result<T>) -> T {
    match result {
        Ok(v) => v,
        Err(err) => panic!("unexpected error: {err}"),
    }
}
