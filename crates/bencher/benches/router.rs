use bencher::route_table;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use http::Method;
use std::hint::black_box;

fn benchmark_resolve(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("route_resolve");

    for size in [8, 64] {
        let table = route_table(size);
        let last = size - 1;
        let cases = [
            ("static", format!("/static/{last}")),
            ("parametric_first", "/api/v0/items/42".to_owned()),
            ("parametric_last", format!("/api/v{last}/items/42")),
            ("miss", "/nothing/here".to_owned()),
        ];

        for (name, path) in cases {
            group.bench_with_input(BenchmarkId::new(name, size), &path, |b, path| {
                b.iter(|| black_box(table.resolve(black_box(path), &Method::GET).is_some()));
            });
        }
    }

    group.finish();
}

criterion_group!(router, benchmark_resolve);
criterion_main!(router);
