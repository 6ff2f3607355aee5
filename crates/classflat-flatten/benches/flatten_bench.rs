//! Flattening Benchmark
//!
//! Measures `compile` throughput on generated hierarchies: deep override
//! chains with `super` calls at every level, and wide fan-out from one base.

use classflat_common::FlattenOptions;
use classflat_flatten::compile;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

// =============================================================================
// Generated Sources
// =============================================================================

/// A single chain of `depth` classes. Every class overrides `step` through
/// `super` and chains its constructor.
fn deep_chain(depth: usize) -> String {
    let mut source = String::from(
        "class L0 {\n  value = 0;\n\n  constructor() {\n    this.value = 1;\n  }\n\n  step() {\n    return this.value;\n  }\n}\n\n",
    );
    for i in 1..depth {
        source.push_str(&format!(
            "class L{i} extends L{prev} {{\n  field{i} = {i};\n\n  constructor() {{\n    super();\n    this.value += {i};\n  }}\n\n  step() {{\n    return super.step() + {i};\n  }}\n\n  own{i}() {{\n    return `L{i}`;\n  }}\n}}\n\n",
            prev = i - 1
        ));
    }
    source
}

/// One base with `width` direct subclasses.
fn wide_fan_out(width: usize) -> String {
    let mut source = String::from("class Base {\n  greet() {\n    return 'hi';\n  }\n}\n\n");
    for i in 0..width {
        source.push_str(&format!(
            "class Leaf{i} extends Base {{\n  greet() {{\n    return super.greet() + {i};\n  }}\n}}\n\n"
        ));
    }
    source
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_deep_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_chain");
    let options = FlattenOptions::default();

    for depth in [8, 32, 128] {
        let source = deep_chain(depth);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &source, |b, source| {
            b.iter(|| black_box(compile("bench.js", black_box(source), &options)))
        });
    }

    group.finish();
}

fn bench_wide_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_fan_out");
    let options = FlattenOptions::default();

    for width in [16, 256] {
        let source = wide_fan_out(width);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &source, |b, source| {
            b.iter(|| black_box(compile("bench.js", black_box(source), &options)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_deep_chain, bench_wide_fan_out);
criterion_main!(benches);
