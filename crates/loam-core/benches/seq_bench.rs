//! Sequence and hashing benchmarks
//!
//! Measures reduction over generated sequences and collection hashing.
//!
//! Run with:
//!   cargo bench --bench seq_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use loam_core::murmur3;
use loam_core::prelude::*;

fn plus() -> Func {
    Func::new("+", |args| match args {
        [Value::Long(a), Value::Long(b)] => Ok(Value::Long(a.wrapping_add(*b))),
        _ => Err(Error::user("expected two longs")),
    })
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce");
    let f = plus();

    for n in [1_000i64, 100_000] {
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("long_range", n), &n, |b, &n| {
            b.iter(|| seq::reduce(&Value::Seq(LongRange::to(n)), &f, None).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("generic_range", n), &n, |b, &n| {
            b.iter(|| {
                let r = Range::to(Value::Long(n)).unwrap();
                seq::reduce(&Value::Seq(r), &f, None).unwrap()
            });
        });

        group.bench_with_input(BenchmarkId::new("lazy_walk", n), &n, |b, &n| {
            b.iter(|| {
                let lazy = LazySeq::from_fn(move || Ok(Value::Seq(LongRange::to(n))));
                seq::iter(lazy.seq().unwrap()).count()
            });
        });
    }

    group.finish();
}

fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashing");

    group.bench_function("murmur3_string", |b| {
        b.iter(|| murmur3::hash_string(black_box("a moderately long keyword name")));
    });

    for n in [32i64, 1024] {
        // fresh values each iteration so the per-collection cache stays cold
        group.bench_with_input(BenchmarkId::new("vector_hasheq", n), &n, |b, &n| {
            b.iter(|| {
                let v = Value::vector((0..n).map(Value::Long));
                v.hasheq().unwrap()
            });
        });

        group.bench_with_input(BenchmarkId::new("map_hasheq", n), &n, |b, &n| {
            b.iter(|| {
                let m = PersistentMap::hash_map((0..n).map(|i| (Value::Long(i), Value::Long(-i))));
                m.hasheq().unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reduce, bench_hashing);
criterion_main!(benches);
