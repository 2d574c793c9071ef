use std::collections::BTreeMap;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use gnest::placement::place_parts;
use polynest::cache::NfpKey;
use polynest::entities::{PlacementJob, PolygonNode};
use polynest::geometry::Polygon;
use polynest::nfp::{PairJob, pair_nfp};
use polynest::util::PackedConfig;

criterion_main!(benches);
criterion_group!(benches, placement_bench);

/// Placement job for `n` rectangles of varying size in a 200 × 200 bin, all NFPs precomputed
fn rectangle_job(n: usize) -> PlacementJob {
    let config = PackedConfig {
        rotations: 1,
        ..PackedConfig::default()
    };
    let bin = PolygonNode::new(-1, 0.0, Polygon::rectangle(0.0, 0.0, 200.0, 200.0));
    let nodes = (0..n)
        .map(|i| {
            let (w, h) = (10.0 + (i % 5) as f64 * 7.0, 12.0 + (i % 3) as f64 * 9.0);
            PolygonNode::new(i as i32, 0.0, Polygon::rectangle(0.0, 0.0, w, h))
        })
        .collect::<Vec<_>>();

    let mut cache = BTreeMap::new();
    for (i, b) in nodes.iter().enumerate() {
        let pairs = std::iter::once((&bin, true)).chain(nodes[..i].iter().map(|a| (a, false)));
        for (a, inside) in pairs {
            let key = NfpKey::from_nodes(config.rotations, inside, a, b);
            let job = PairJob {
                config,
                key,
                a: a.clone(),
                b: b.clone(),
            };
            cache.insert(key, pair_nfp(&job).loops);
        }
    }

    PlacementJob {
        config,
        bin_area: 40000.0,
        cache,
        nodes,
        bin,
    }
}

fn placement_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement");
    for n in [5, 20, 50] {
        let job = rectangle_job(n);
        group.bench_function(BenchmarkId::from_parameter(n), |b| {
            b.iter(|| place_parts(&job));
        });
    }
    group.finish();
}
