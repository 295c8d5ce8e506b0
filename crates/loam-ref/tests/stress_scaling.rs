//! Scaling smoke-tests for the reference types.
//!
//! Not benchmarks (Criterion covers the sequence paths in `loam-core`), but
//! they drive the stress harness at increasing sizes:
//! - agent fleets fed through the pool and through dedicated threads
//! - one atom shared by a growing number of writers
//! - one lazy sequence realized by many callers at once
#![recursion_limit = "256"]

use loam_ref::stress::{run_agents, run_atom, run_lazy, StressReport};
use loam_ref::DispatchMode;

fn check(report: &StressReport) {
    println!("{}", report.generate_text());
    assert!(report.passed(), "{}", report.generate_text());
}

#[test]
fn agent_fleets_scale() {
    for (agents, sends) in [(1, 500), (16, 200), (64, 50)] {
        let report = run_agents(agents, sends, DispatchMode::Pooled).unwrap();
        assert_eq!(report.operations, agents as u64 * sends);
        check(&report);
    }
}

#[test]
fn solo_dispatch_scales() {
    let report = run_agents(8, 100, DispatchMode::Solo).unwrap();
    check(&report);
}

#[test]
fn atom_writers_scale() {
    for threads in [1, 4, 16] {
        let report = run_atom(threads, 2_000).unwrap();
        assert_eq!(report.operations, threads as u64 * 2_000);
        check(&report);
    }
}

#[test]
fn lazy_callers_scale() {
    for callers in [2, 16, 64] {
        check(&run_lazy(callers).unwrap());
    }
}
