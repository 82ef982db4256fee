//! # snippad benchmarks
//!
//! Criterion benchmarks for the hot paths of a run.
//!
//! ## Groups
//! - `analyzer`: splitting source text into units
//! - `session`: evaluating units in a live session
//!
//! ## Usage
//! ```bash
//! cargo bench          # everything
//! cargo bench analyzer # splitting only
//! ```

use std::io;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use snippad::frontend::analyze;
use snippad::session::Session;

// ============================================================================
// Analyzer
// ============================================================================

const SNIPPET: &str = "int total = 0;\n\
for (int i = 0; i < 10; i++) { total += i; }\n\
String label = \"sum; {not a block}\";\n\
/* comment; */ if (total > 10) { System.out.println(label); } else { total--; }\n\
int sq(int n) { return n * n; }\n";

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");
    for copies in [1usize, 16, 256] {
        let text = SNIPPET.repeat(copies);
        group.bench_with_input(BenchmarkId::from_parameter(copies), &text, |b, text| {
            b.iter(|| analyze(text).count())
        });
    }
    group.finish();
}

// ============================================================================
// Session
// ============================================================================

fn quiet_session() -> Session {
    let _ = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(tracing::Level::ERROR)
        .try_init();

    Session::builder()
        .out(io::sink())
        .err(io::sink())
        .build()
        .expect("session starts")
}

fn bench_fibonacci(c: &mut Criterion) {
    let session = quiet_session();
    session
        .evaluate("int fib(int n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }")
        .expect("fib declares");

    c.bench_function("session_fibonacci_15", |b| {
        b.iter(|| session.evaluate("fib(15);").expect("fib runs"))
    });
}

fn bench_loop(c: &mut Criterion) {
    let session = quiet_session();

    c.bench_function("session_loop_10000", |b| {
        b.iter(|| {
            session
                .evaluate("{ int sum = 0; for (int i = 0; i < 10000; i++) { sum += i; } }")
                .expect("loop runs")
        })
    });
}

fn bench_string_concat(c: &mut Criterion) {
    let session = quiet_session();

    c.bench_function("session_string_concat", |b| {
        b.iter(|| {
            session
                .evaluate("{ String s = \"\"; for (int i = 0; i < 200; i++) { s = s + i; } }")
                .expect("concat runs")
        })
    });
}

// ============================================================================
// Criterion Groups
// ============================================================================

criterion_group!(
    name = analyzer;
    config = Criterion::default().sample_size(50);
    targets = bench_analyze
);

criterion_group!(
    name = session;
    config = Criterion::default().sample_size(20);
    targets = bench_fibonacci, bench_loop, bench_string_concat
);

criterion_main!(analyzer, session);
