use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nebulite_core::expression::{compile, ExpressionPool, NullResolver};

fn bench_eval(c: &mut Criterion) {
    let program = compile("gt(sgn(1 - 2) * 3 + 4 * 2, 0)").unwrap();
    let pool = ExpressionPool::new();

    c.bench_function("expression_eval_guard", |b| {
        b.iter(|| {
            let mut resolver = NullResolver;
            black_box(pool.eval(&program, &mut resolver).unwrap())
        })
    });
}

criterion_group!(benches, bench_eval);
criterion_main!(benches);
