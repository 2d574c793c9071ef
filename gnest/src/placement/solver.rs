use itertools::Itertools;
use log::{debug, trace};

use polynest::cache::{NfpKey, to_rotation_index};
use polynest::clipper::{self, CLIPPER_SCALE, ClipType, Clipper, IntPath, PolyFillType, PolyType};
use polynest::entities::{BinPlacement, Placement, PlacementJob, PlacementResult, PolygonNode};
use polynest::error::Result;
use polynest::geometry::geo_traits::Shape;
use polynest::geometry::{BoundRect, Point, PointPool, Polygon};
use polynest::util::almost_equal;

/// Vertices closer than this (in polygon units) are merged in the feasible region
const CLEAN_DISTANCE: f64 = 0.0001;
/// Loops of the feasible region below this area (in polygon units²) are dropped
const MIN_LOOP_AREA: f64 = 0.1;
/// Loops of the final region below this area yield no candidate positions
const MIN_CANDIDATE_AREA: f64 = 2.0;
/// Relative tolerance when comparing candidate scores
const SCORE_TOLERANCE: f64 = 1e-9;

/// Places the parts of `job` bin after bin, each at the feasible position that keeps the placed parts
/// most compact (`2 × width + height` of their joint bounding box).
///
/// Fitness counts one per opened bin and two per part that never found a place. Each bin also adds
/// the joint bounding box width chosen for its last part placed by candidate search, relative to the
/// bin area; a bin holding a single part adds no width.
pub fn place_parts(job: &PlacementJob) -> Result<PlacementResult> {
    let rotations = job.config.rotations;
    let shapes = job.nodes.iter().map(PolygonNode::rotated).collect_vec();
    let mut pool = PointPool::new();

    let mut remaining = (0..job.nodes.len()).collect_vec();
    let mut bins = vec![];
    let mut first_bounds = None;
    let mut fitness = 0.0;

    while !remaining.is_empty() {
        fitness += 1.0;
        let mut placed: Vec<usize> = vec![];
        let mut placements: Vec<Placement> = vec![];
        let mut min_width = None;

        'parts: for &i in &remaining {
            let part = &shapes[i].polygon;
            let reference = part.at(0);

            let bin_key = NfpKey::from_nodes(rotations, true, &job.bin, &job.nodes[i]);
            let bin_nfp = match job.cache.get(&bin_key) {
                Some(loops) if !loops.is_empty() => loops,
                _ => {
                    trace!("[PLACE] part {i} does not fit the bin ({bin_key})");
                    continue;
                }
            };

            let mut outer_nfps = Vec::with_capacity(placed.len());
            for (k, &j) in placed.iter().enumerate() {
                let key = NfpKey::from_nodes(rotations, false, &job.nodes[j], &job.nodes[i]);
                match job.cache.get(&key) {
                    Some(loops) if !loops.is_empty() => outer_nfps.push((placements[k], loops)),
                    _ => {
                        debug!("[PLACE] missing NFP {key}, part {i} skipped");
                        continue 'parts;
                    }
                }
            }

            let position = match placed.is_empty() {
                // leftmost vertex of the inner fit region
                true => bin_nfp
                    .iter()
                    .flat_map(|l| l.points())
                    .fold(None, |best: Option<Point>, p| match best {
                        Some(b) if p.0 >= b.0 => Some(b),
                        _ => Some(p),
                    })
                    .map(|p| p - reference),
                false => {
                    let region = feasible_region(bin_nfp, &outer_nfps);
                    let placed_bounds = placed_bounds(&shapes, &placed, &placements);
                    match best_candidate(&mut pool, &region, part, reference, placed_bounds)? {
                        Some((pos, width)) => {
                            min_width = Some(width);
                            Some(pos)
                        }
                        None => None,
                    }
                }
            };

            if let Some(Point(x, y)) = position {
                placements.push(Placement {
                    node_idx: i as u16,
                    rotation_idx: to_rotation_index(job.nodes[i].rotation, rotations) as u16,
                    x,
                    y,
                });
                placed.push(i);
            }
        }

        if let Some(width) = min_width {
            fitness += width / job.bin_area;
        }
        if placements.is_empty() {
            break;
        }
        if first_bounds.is_none() {
            first_bounds = placed_bounds(&shapes, &placed, &placements);
        }
        remaining.retain(|i| !placed.contains(i));
        bins.push(BinPlacement { placements });
    }

    fitness += 2.0 * remaining.len() as f64;
    let placed_count = job.nodes.len() - remaining.len();
    debug!(
        "[PLACE] {placed_count}/{} parts in {} bin(s), fitness {fitness:.4}",
        job.nodes.len(),
        bins.len()
    );

    Ok(PlacementResult {
        fitness,
        placed_count: placed_count as u16,
        total_count: job.nodes.len() as u16,
        rotations: rotations as u8,
        bounds: first_bounds,
        nodes: job.nodes.clone(),
        bins,
    })
}

/// Bin NFP minus the union of the outer NFPs of the placed parts, on the clipper lattice.
fn feasible_region(bin_nfp: &[Polygon], outer_nfps: &[(Placement, &Vec<Polygon>)]) -> Vec<Polygon> {
    let mut union = Clipper::new();
    for (placement, loops) in outer_nfps {
        for l in loops.iter() {
            let moved = l.translated(placement.x, placement.y);
            if let Some(path) = lattice_loop(&clipper::scale_up(&moved, CLIPPER_SCALE)) {
                union.add_path(&path, PolyType::Subject);
            }
        }
    }
    let combined = union.execute(ClipType::Union, PolyFillType::NonZero, PolyFillType::NonZero);

    let mut diff = Clipper::new();
    diff.add_paths(&combined, PolyType::Clip);
    for l in bin_nfp {
        diff.add_path(&clipper::scale_up(l, CLIPPER_SCALE), PolyType::Subject);
    }
    diff.execute(ClipType::Difference, PolyFillType::NonZero, PolyFillType::NonZero)
        .iter()
        .filter_map(|p| lattice_loop(p))
        .map(|p| clipper::scale_down(&p, CLIPPER_SCALE))
        .collect()
}

/// Cleaned copy of `path`, `None` when it degenerates or encloses almost nothing.
fn lattice_loop(path: &[polynest::clipper::IntPoint]) -> Option<IntPath> {
    let cleaned = clipper::clean_path(path, CLEAN_DISTANCE * CLIPPER_SCALE);
    let big_enough = clipper::area(&cleaned).abs() > MIN_LOOP_AREA * CLIPPER_SCALE * CLIPPER_SCALE;
    (cleaned.len() > 2 && big_enough).then_some(cleaned)
}

fn placed_bounds(shapes: &[PolygonNode], placed: &[usize], placements: &[Placement]) -> Option<BoundRect> {
    placed
        .iter()
        .zip(placements)
        .map(|(&j, p)| shapes[j].polygon.bound_rect().translated(p.x, p.y))
        .reduce(|a, b| a.union(&b))
}

/// Vertex of `region` with the lowest compactness score, with the width of the resulting bounds.
/// Ties go to the smaller x.
fn best_candidate(
    pool: &mut PointPool,
    region: &[Polygon],
    part: &Polygon,
    reference: Point,
    placed_bounds: Option<BoundRect>,
) -> Result<Option<(Point, f64)>> {
    let part_bounds = part.bound_rect();
    // scratch corners: joint minimum, joint maximum
    let mut corners = pool.lease(2)?;
    let mut best: Option<(Point, f64, f64)> = None;

    for l in region.iter().filter(|l| l.area().abs() >= MIN_CANDIDATE_AREA) {
        for vertex in l.points() {
            let shift = vertex - reference;
            let moved = part_bounds.translated(shift.0, shift.1);
            corners.set(0, Point(moved.x, moved.y));
            corners.set(1, Point(moved.x_max(), moved.y_max()));
            if let Some(pb) = placed_bounds {
                let (lo, hi) = (corners.get(0), corners.get(1));
                corners.set(0, Point(lo.0.min(pb.x), lo.1.min(pb.y)));
                corners.set(1, Point(hi.0.max(pb.x_max()), hi.1.max(pb.y_max())));
            }
            let (lo, hi) = (corners.get(0), corners.get(1));
            let (width, height) = (hi.0 - lo.0, hi.1 - lo.1);
            let score = 2.0 * width + height;

            let better = match best {
                None => true,
                Some((pos, best_score, _)) => {
                    score < best_score
                        || (almost_equal(score, best_score, SCORE_TOLERANCE * best_score.abs().max(1.0))
                            && shift.0 < pos.0)
                }
            };
            if better {
                best = Some((shift, score, width));
            }
        }
    }
    Ok(best.map(|(pos, _, width)| (pos, width)))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use float_cmp::approx_eq;

    use polynest::nfp::{PairJob, pair_nfp};
    use polynest::util::PackedConfig;

    use super::*;

    fn square(source: i32, size: f64) -> PolygonNode {
        PolygonNode::new(source, 0.0, Polygon::rectangle(0.0, 0.0, size, size))
    }

    /// Placement job with every NFP computed in place
    fn job(bin_size: f64, parts: Vec<PolygonNode>) -> PlacementJob {
        let config = PackedConfig {
            rotations: 1,
            ..PackedConfig::default()
        };
        let bin = square(-1, bin_size);
        let mut cache = BTreeMap::new();
        for (i, b) in parts.iter().enumerate() {
            let mut pairs = vec![(bin.clone(), true)];
            pairs.extend(parts[..i].iter().map(|a| (a.clone(), false)));
            for (a, inside) in pairs {
                let key = NfpKey::from_nodes(config.rotations, inside, &a, b);
                let result = pair_nfp(&PairJob { config, key, a, b: b.clone() });
                cache.insert(key, result.loops);
            }
        }
        PlacementJob {
            config,
            bin_area: bin_size * bin_size,
            cache,
            nodes: parts,
            bin,
        }
    }

    #[test]
    fn two_squares_share_one_bin() {
        let result = place_parts(&job(100.0, vec![square(0, 40.0), square(1, 40.0)])).unwrap();
        assert_eq!(result.placed_count, 2);
        assert_eq!(result.bins.len(), 1);
        let [first, second] = result.bins[0].placements[..] else {
            panic!("expected two placements");
        };
        assert!(approx_eq!(f64, first.x, 0.0, epsilon = 1e-6));
        // stacking keeps 2 × width + height lowest
        assert!(approx_eq!(f64, second.x, 0.0, epsilon = 1e-6));
        assert!(approx_eq!(f64, (second.y - first.y).abs(), 40.0, epsilon = 1e-6));
        assert!(approx_eq!(f64, result.fitness, 1.0 + 40.0 / 10000.0, epsilon = 1e-6));
        assert!(approx_eq!(f64, result.efficiency(10000.0), 0.32, epsilon = 1e-9));
    }

    #[test]
    fn oversized_part_stays_unplaced() {
        let result = place_parts(&job(10.0, vec![square(0, 20.0)])).unwrap();
        assert_eq!(result.placed_count, 0);
        assert!(result.bins.is_empty());
        assert!(!result.has_result());
        assert!(approx_eq!(f64, result.fitness, 3.0, epsilon = 1e-9));
    }

    #[test]
    fn overflow_opens_a_second_bin() {
        let parts = (0..3).map(|i| square(i, 60.0)).collect();
        let result = place_parts(&job(100.0, parts)).unwrap();
        assert_eq!(result.placed_count, 3);
        assert_eq!(result.bins.len(), 3);
        assert!(approx_eq!(f64, result.fitness, 3.0, epsilon = 1e-9));
    }

    #[test]
    fn missing_nfp_skips_the_part() {
        let mut job = job(100.0, vec![square(0, 40.0), square(1, 40.0)]);
        job.cache.retain(|k, _| k.inside());
        let result = place_parts(&job).unwrap();
        // the second part waits for the next bin
        assert_eq!(result.placed_count, 2);
        assert_eq!(result.bins.len(), 2);
    }
}
