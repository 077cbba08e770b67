// benches/tacmir_benchmark.rs
use criterion::measurement::WallTime;
use criterion::{criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::time::Duration;
use tacmir::opt::{Driver, PipelineConfig, PreAlgorithm};
use tacmir::parser;
use tacmir::printer;

/// Configures a benchmark group with the same statistical settings across
/// every group in this file.
fn configure_benchmark_group(group: &mut BenchmarkGroup<WallTime>, warm_up: u64, measurement: u64) {
    group
        .significance_level(0.005)
        .sample_size(200)
        .confidence_level(0.99)
        .warm_up_time(Duration::from_secs(warm_up))
        .measurement_time(Duration::from_secs(measurement))
        .nresamples(100_000);
}

fn straight_line_program(n: usize) -> String {
    let mut src = String::from("@function f ( )\n%entry\n");
    for i in 0..n {
        src.push_str(&format!("v{i} := v{i} + 1\n"));
    }
    src.push_str("%print v0\n%exit\n@end function\n");
    src
}

fn diamond_program(n: usize) -> String {
    let mut src = String::from("@function f ( )\n%entry\nc := a > b\n%if c %goto &l\n%goto &r\nl:\n");
    for i in 0..n {
        src.push_str(&format!("t{i} := a + b\n"));
    }
    src.push_str("%goto &j\nr:\n");
    for i in 0..n {
        src.push_str(&format!("u{i} := a + b\n"));
    }
    src.push_str("j:\n%print a\n%exit\n@end function\n");
    src
}

pub fn benchmark_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("tacmir-lexer");
    configure_benchmark_group(&mut group, 3, 10);

    let cases = [
        ("small", straight_line_program(10)),
        ("medium", straight_line_program(200)),
        ("large", straight_line_program(2000)),
    ];

    for (name, source) in &cases {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| {
                let tokens = tacmir::parser::lexer::tokenize(black_box(source));
                black_box(&tokens);
            });
        });
    }
    group.finish();
}

pub fn benchmark_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("tacmir-parser");
    configure_benchmark_group(&mut group, 3, 10);

    let cases = [
        ("small", straight_line_program(10)),
        ("medium", straight_line_program(200)),
        ("large", straight_line_program(2000)),
    ];

    for (name, source) in &cases {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| {
                let module = parser::parse(black_box(source));
                black_box(&module);
            });
        });
    }
    group.finish();
}

pub fn benchmark_sccp_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("tacmir-sccp");
    configure_benchmark_group(&mut group, 3, 10);

    let cases = [
        ("small", straight_line_program(10)),
        ("medium", straight_line_program(200)),
        ("large", straight_line_program(2000)),
    ];

    for (name, source) in &cases {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| {
                let mut module = parser::parse(black_box(source)).unwrap();
                let config = PipelineConfig { sccp: true, ..PipelineConfig::default() };
                let stats = Driver::run(&mut module, &config);
                black_box(&stats);
            });
        });
    }
    group.finish();
}

pub fn benchmark_lcm_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("tacmir-lcm");
    configure_benchmark_group(&mut group, 3, 10);

    let cases = [("small", diamond_program(5)), ("medium", diamond_program(50)), ("large", diamond_program(500))];

    for (name, source) in &cases {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| {
                let mut module = parser::parse(black_box(source)).unwrap();
                let config = PipelineConfig { pre: PreAlgorithm::Lcm, ..PipelineConfig::default() };
                let stats = Driver::run(&mut module, &config);
                black_box(&stats);
            });
        });
    }
    group.finish();
}

pub fn benchmark_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("tacmir-end-to-end");
    configure_benchmark_group(&mut group, 5, 15);

    let cases = [("small", diamond_program(5)), ("medium", diamond_program(50))];

    for (name, source) in &cases {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| {
                let mut module = parser::parse(black_box(source)).unwrap();
                let config = PipelineConfig { sccp: true, pre: PreAlgorithm::Lcm, ..PipelineConfig::default() };
                Driver::run(&mut module, &config).unwrap();
                let rendered = printer::print_module(&module);
                black_box(&rendered);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_lexer, benchmark_parser, benchmark_sccp_pipeline, benchmark_lcm_pipeline, benchmark_end_to_end);
criterion_main!(benches);
