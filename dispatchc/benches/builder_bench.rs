//! Decision tree construction benchmarks using criterion.
//!
//! Measures tree building over a layered hierarchy for growing candidate
//! sets and arities, for both test selection heuristics, plus parallel
//! resolution of many independent dispatch points.
//!
//! Run with: cargo bench --bench builder_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use dispatchc::config::Heuristic;
use dispatchc::dispatch::{CandidateDefinition, DefId, DispatchPoint, EntryPoint};
use dispatchc::types::RefKind;
use dispatchc::{Config, DeclaredType, DiagnosticSink, Resolver, TreeBuilder, TypeEnv};

/// A hierarchy of `width` interfaces, each with a chain of `depth` classes.
fn layered_env(width: usize, depth: usize) -> (TypeEnv, Vec<DeclaredType>) {
    let mut env = TypeEnv::new("Object");
    let mut types = Vec::new();
    for w in 0..width {
        let iface = env.declare(&format!("I{}", w), RefKind::Interface);
        types.push(DeclaredType::named(iface));
        let mut parent = iface;
        for d in 0..depth {
            let class = env.declare(&format!("C{}_{}", w, d), RefKind::Class);
            env.add_supertype(class, parent);
            types.push(DeclaredType::named(class));
            parent = class;
        }
    }
    (env, types)
}

fn make_candidates(types: &[DeclaredType], count: usize, arity: usize) -> Vec<CandidateDefinition> {
    (0..count)
        .map(|i| CandidateDefinition {
            def_id: DefId::new(i as u32),
            name: "f".to_string(),
            param_types: (0..arity).map(|p| types[(i * 7 + p * 3) % types.len()].clone()).collect(),
            return_type: DeclaredType::Void,
            type_params: vec![],
            is_default: i == 0,
            target: "f".to_string(),
        })
        .collect()
}

fn make_entry(env: &TypeEnv, arity: usize) -> EntryPoint {
    EntryPoint {
        def_id: DefId::new(1000),
        name: "f".to_string(),
        param_types: vec![DeclaredType::named(env.root()); arity],
        return_type: DeclaredType::Void,
        type_params: vec![],
    }
}

/// Benchmark tree building by candidate count
fn bench_build_by_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_by_candidates");
    let (env, types) = layered_env(3, 4);
    let entry = make_entry(&env, 2);

    for count in [2, 4, 8, 16] {
        let candidates = make_candidates(&types, count, 2);
        for heuristic in [Heuristic::DeclarationOrder, Heuristic::Balanced] {
            let id = BenchmarkId::new(format!("{:?}", heuristic), count);
            group.bench_with_input(id, &candidates, |b, candidates| {
                let builder = TreeBuilder::new(&env, candidates, heuristic);
                b.iter(|| black_box(builder.build(&entry)));
            });
        }
    }

    group.finish();
}

/// Benchmark tree building by arity
fn bench_build_by_arity(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_by_arity");
    let (env, types) = layered_env(2, 3);

    for arity in [1, 2, 3] {
        let candidates = make_candidates(&types, 6, arity);
        let entry = make_entry(&env, arity);
        group.bench_with_input(BenchmarkId::from_parameter(arity), &candidates, |b, candidates| {
            let builder = TreeBuilder::new(&env, candidates, Heuristic::DeclarationOrder);
            b.iter(|| black_box(builder.build(&entry)));
        });
    }

    group.finish();
}

/// Benchmark parallel resolution of independent dispatch points
fn bench_resolve_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_all");
    let (env, types) = layered_env(3, 4);
    let points: Vec<DispatchPoint> = (0..64)
        .map(|i| DispatchPoint {
            name: format!("m{}", i),
            module: None,
            entry_points: vec![make_entry(&env, 2)],
            candidates: make_candidates(&types[i % types.len()..], 6, 2),
        })
        .collect();

    for jobs in [1, 4] {
        let mut config = Config::default();
        config.resolve.jobs = jobs;
        group.bench_with_input(BenchmarkId::from_parameter(jobs), &points, |b, points| {
            let resolver = Resolver::new(&env, &config);
            b.iter(|| {
                let sink = DiagnosticSink::new();
                black_box(resolver.resolve_all(points, &sink))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_build_by_candidates,
    bench_build_by_arity,
    bench_resolve_all,
);
criterion_main!(benches);
