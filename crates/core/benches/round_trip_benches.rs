use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use visual_novel_ir::{parse_program, RoundTripConverter, VisualGraph};

#[path = "../tests/common.rs"]
mod common;

fn bench_parse(c: &mut Criterion) {
    let source = common::generated_script(50);
    c.bench_function("parse_program_50_scenes", |b| {
        b.iter(|| parse_program(&source).expect("parse"))
    });
}

fn bench_text_round_trip(c: &mut Criterion) {
    let converter = RoundTripConverter::default();
    let source = common::generated_script(50);
    c.bench_function("text_round_trip_50_scenes", |b| {
        b.iter(|| converter.round_trip(&source).expect("round trip"))
    });
    c.bench_function("validate_conversion_golden", |b| {
        let text = converter.round_trip(common::BRANCHING).expect("round trip");
        b.iter(|| converter.validate_conversion(common::BRANCHING, &text))
    });
}

fn bench_visual_graph(c: &mut Criterion) {
    let converter = RoundTripConverter::default();
    let graph = converter
        .text_to_ir(&common::generated_script(50))
        .expect("ir");
    c.bench_function("ir_to_visual_and_back", |b| {
        b.iter(|| VisualGraph::from_ir(&graph).to_ir().expect("to ir"))
    });
    c.bench_function("visual_auto_layout", |b| {
        b.iter_batched(
            || VisualGraph::from_ir(&graph),
            |mut visual| visual.auto_layout(),
            BatchSize::SmallInput,
        )
    });
}

fn bench_analysis(c: &mut Criterion) {
    let converter = RoundTripConverter::default();
    let graph = converter
        .text_to_ir(&common::generated_script(100))
        .expect("ir");
    c.bench_function("ir_validate_100_scenes", |b| b.iter(|| graph.validate()));
    c.bench_function("ir_execution_order_100_scenes", |b| {
        b.iter(|| graph.execution_order())
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_text_round_trip,
    bench_visual_graph,
    bench_analysis
);
criterion_main!(benches);
