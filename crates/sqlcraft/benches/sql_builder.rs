use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlcraft::{SelectBuilder, SqlStatement, dialect, qb};

/// Build a SELECT with `n` equality predicates:
/// SELECT * FROM t WHERE col0 = ? AND col1 = ? ...
fn build_select(n: usize) -> SelectBuilder {
    let mut builder = qb::select(["*"]).from("t");
    for i in 0..n {
        builder = builder.and_eq(&format!("col{i}"), i as i64);
    }
    builder
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/render");

    for n in [1, 5, 10, 50, 100] {
        let builder = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &builder, |b, builder| {
            b.iter(|| black_box(builder.to_sql()));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/build_and_render");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let builder = build_select(n);
                black_box(builder.to_sql());
            });
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let builder = qb::select(["*"])
                    .from("t")
                    .and_in("id", values.iter().map(|v| (*v).into()).collect());
                black_box(builder.to_sql());
            });
        });
    }

    group.finish();
}

fn bench_rebind_postgres(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/rebind_postgres");

    for n in [5, 20, 100] {
        let mut builder = SelectBuilder::new(&dialect::POSTGRES, ["*"]).from("t");
        for i in 0..n {
            builder = builder.and_eq(&format!("col{i}"), i as i64);
        }
        group.bench_with_input(BenchmarkId::from_parameter(n), &builder, |b, builder| {
            b.iter(|| black_box(builder.to_sql()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_render,
    bench_build_and_render,
    bench_in_list,
    bench_rebind_postgres
);
criterion_main!(benches);
