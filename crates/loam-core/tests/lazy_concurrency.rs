//! Concurrent realization of lazy and generated sequences

use loam_core::prelude::*;
use loam_test_utils::{collect_longs, counting_thunk, inc_fn};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

const CALLERS: usize = 16;

#[test]
fn test_lazy_thunk_runs_once_under_contention() {
    let (thunk, calls) = counting_thunk(Value::Seq(LongRange::to(100)));
    let lazy = Arc::new(LazySeq::new(thunk));
    let barrier = Barrier::new(CALLERS);

    let firsts: Vec<Value> = crossbeam::scope(|scope| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let lazy = Arc::clone(&lazy);
                let barrier = &barrier;
                scope.spawn(move |_| {
                    barrier.wait();
                    lazy.first().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(firsts.iter().all(|v| *v == Value::Long(0)));
    assert_eq!(lazy.count().unwrap(), 100);
}

#[test]
fn test_every_caller_sees_the_same_seq() {
    let lazy: Seq = Arc::new(LazySeq::from_fn(|| Ok(Value::vector((0..40).map(Value::Long)))));
    let seen: Vec<Seq> = crossbeam::scope(|scope| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let lazy = Arc::clone(&lazy);
                scope.spawn(move |_| lazy.as_lazy().unwrap().seq().unwrap().unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert!(seen.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn test_iterate_positions_computed_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let step = Func::new("step", move |args| {
        counted.fetch_add(1, Ordering::SeqCst);
        inc_fn().invoke(args)
    });
    let s = Iterate::create(step, Value::Long(0));

    crossbeam::scope(|scope| {
        for _ in 0..CALLERS {
            let s = Arc::clone(&s);
            scope.spawn(move |_| {
                let taken: Vec<Value> = seq::iter(Some(s))
                    .take(50)
                    .collect::<Result<_>>()
                    .unwrap();
                assert_eq!(taken.last(), Some(&Value::Long(49)));
            });
        }
    })
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 49);
}

#[test]
fn test_nested_lazy_chain() {
    fn countdown(n: i64) -> Value {
        Value::Seq(Arc::new(LazySeq::from_fn(move || {
            if n == 0 {
                return Ok(Value::Nil);
            }
            Ok(Value::Seq(seq::cons(Value::Long(n), &countdown(n - 1))?))
        })))
    }
    assert_eq!(collect_longs(&countdown(5)), vec![5, 4, 3, 2, 1]);
}
