use criterion::{criterion_group, criterion_main, Criterion};
use echolattice::ground::ground_hash;
use echolattice::report::run_benchmark;
use echolattice::{build_lattice, derive, evaluate_policy, PolicyEvaluator};

fn bench_lattice(c: &mut Criterion) {
    c.bench_function("build_silence_depth4", |b| {
        b.iter(|| build_lattice("Silence", 4, None, None, 42))
    });

    c.bench_function("build_silence_depth6_novelty035", |b| {
        b.iter(|| build_lattice("Silence", 6, None, Some(0.35), 42))
    });

    c.bench_function("build_seed_bearer_depth6_branching3", |b| {
        b.iter(|| build_lattice("Seed Bearer", 6, Some(3), None, 42))
    });

    let lattice = build_lattice("Silence", 6, None, None, 42).unwrap();
    c.bench_function("derive_silence_depth6", |b| b.iter(|| derive(&lattice)));

    let (_, aggregates) = derive(&lattice);
    c.bench_function("evaluate_policy", |b| b.iter(|| evaluate_policy(&aggregates)));

    let path: Vec<String> = vec!["0".into(), "0.2".into(), "0.2.3".into(), "0.2.3.5".into()];
    c.bench_function("ground_hash_depth3", |b| b.iter(|| ground_hash("Silence", &path)));
}

fn bench_matrix(c: &mut Criterion) {
    let evaluator = PolicyEvaluator::default();
    let mut group = c.benchmark_group("matrix");
    group.sample_size(10);
    group.bench_function("benchmark_21_runs", |b| b.iter(|| run_benchmark(&evaluator)));
    group.finish();
}

criterion_group!(benches, bench_lattice, bench_matrix);
criterion_main!(benches);
