use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use polynest::clipper::{self, CLIPPER_SCALE};
use polynest::geometry::Polygon;
use polynest::geometry::geo_traits::Transformable;
use polynest::nfp::no_fit_polygon;

criterion_main!(benches);
criterion_group!(benches, union_bench, orbit_bench);

/// Saw-toothed strip, concave enough to exercise the sweep and the orbiting contacts
fn comb(teeth: usize) -> Polygon {
    let mut coords = vec![0.0, 0.0, teeth as f64 * 10.0, 0.0];
    for i in (0..teeth).rev() {
        let x = i as f64 * 10.0;
        coords.extend_from_slice(&[x + 10.0, 20.0, x + 5.0, 8.0]);
    }
    coords.extend_from_slice(&[0.0, 20.0]);
    Polygon::new(coords)
}

/// Union of a row of overlapping combs
fn union_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("clipper_union");
    for n in [2, 8, 32] {
        let polys: Vec<Polygon> = (0..n)
            .map(|i| {
                let mut p = comb(6);
                p.translate(i as f64 * 13.0, (i % 3) as f64 * 4.0);
                p
            })
            .collect();
        group.bench_function(BenchmarkId::from_parameter(n), |b| {
            b.iter(|| clipper::union(&polys, CLIPPER_SCALE));
        });
    }
    group.finish();
}

/// Outer orbiting NFP of a small square around combs of growing size
fn orbit_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("orbit_nfp");
    let square = Polygon::rectangle(0.0, 0.0, 4.0, 4.0);
    for teeth in [2, 6, 12] {
        let a = comb(teeth);
        group.bench_function(BenchmarkId::from_parameter(teeth), |b| {
            b.iter(|| no_fit_polygon(&a, &square, false, true));
        });
    }
    group.finish();
}
