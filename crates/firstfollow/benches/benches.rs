use std::{env, path::PathBuf};

use criterion::{criterion_group, criterion_main, Criterion};
use firstfollow::{grammar::Grammar, syntax, SetEngine};

criterion_main!(benches);
criterion_group!(benches, bench_expressions, bench_recursive);

fn bench_expressions(c: &mut Criterion) {
    bench_analyze(c, "expression");
    bench_analyze(c, "arithmetic");
    bench_analyze(c, "json");
}

fn bench_recursive(c: &mut Criterion) {
    bench_analyze(c, "nullable");
    bench_analyze(c, "mutual");
}

fn bench_analyze(c: &mut Criterion, grammar_name: &str) {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    let grammar: Grammar =
        syntax::parse_file(project_root.join(format!("tests/{}.txt", grammar_name)), None)
            .unwrap()
            .grammar;

    let mut group = c.benchmark_group(grammar_name);
    group.bench_function("first", |b| {
        b.iter(|| SetEngine::new(&grammar).first_sets());
    });
    group.bench_function("analyze", |b| {
        b.iter(|| SetEngine::new(&grammar).analyze());
    });
    group.finish();
}
