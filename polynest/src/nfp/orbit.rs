use log::debug;

use crate::geometry::polygon::on_segment;
use crate::geometry::{Point, Polygon};
use crate::nfp::geometry_util::{point_in_polygon, polygon_slide_distance, search_start_point};
use crate::util::{TOL, almost_equal};

/// Minimum sine between a candidate and the previous move for a backwards candidate to be tried
const BACKTRACK_SINE: f64 = 1e-4;

#[derive(Debug, Clone, Copy)]
enum Contact {
    /// vertex of A on vertex of B
    Vertex { a: usize, b: usize },
    /// vertex of B on the edge of A ending in `a`
    BOnEdgeA { a: usize, b: usize },
    /// vertex of A on the edge of B ending in `b`
    AOnEdgeB { a: usize, b: usize },
}

#[derive(Debug, Clone, Copy)]
struct SlideVector {
    v: Point,
    /// vertices of A this vector runs along, marked once it is taken
    marks: Option<(usize, usize)>,
}

fn touching_contacts(a: &[Point], b: &[Point], offset: Point) -> Vec<Contact> {
    let mut contacts = vec![];
    let (na, nb) = (a.len(), b.len());
    for i in 0..na {
        let next_i = (i + 1) % na;
        for j in 0..nb {
            let next_j = (j + 1) % nb;
            let bj = b[j] + offset;
            if a[i].almost_equal(&bj, TOL) {
                contacts.push(Contact::Vertex { a: i, b: j });
            } else if on_segment(a[i], a[next_i], bj, TOL) {
                contacts.push(Contact::BOnEdgeA { a: next_i, b: j });
            } else if on_segment(bj, b[next_j] + offset, a[i], TOL) {
                contacts.push(Contact::AOnEdgeB { a: i, b: next_j });
            }
        }
    }
    contacts
}

fn slide_vectors(a: &[Point], b: &[Point], offset: Point, contacts: &[Contact], marked: &mut [bool]) -> Vec<SlideVector> {
    let (na, nb) = (a.len(), b.len());
    let prev = |i: usize, n: usize| if i == 0 { n - 1 } else { i - 1 };
    let mut vectors = Vec::with_capacity(contacts.len() * 4);
    for &c in contacts {
        let (ia, ib) = match c {
            Contact::Vertex { a, b } | Contact::BOnEdgeA { a, b } | Contact::AOnEdgeB { a, b } => (a, b),
        };
        marked[ia] = true;
        let (va, prev_a, next_a) = (a[ia], a[prev(ia, na)], a[(ia + 1) % na]);
        let (vb, prev_b, next_b) = (b[ib], b[prev(ib, nb)], b[(ib + 1) % nb]);
        match c {
            Contact::Vertex { .. } => {
                vectors.push(SlideVector { v: prev_a - va, marks: Some((ia, prev(ia, na))) });
                vectors.push(SlideVector { v: next_a - va, marks: Some((ia, (ia + 1) % na)) });
                // B moves against its own edges
                vectors.push(SlideVector { v: vb - prev_b, marks: None });
                vectors.push(SlideVector { v: vb - next_b, marks: None });
            }
            Contact::BOnEdgeA { .. } => {
                vectors.push(SlideVector { v: va - (vb + offset), marks: Some((prev(ia, na), ia)) });
                vectors.push(SlideVector { v: prev_a - (vb + offset), marks: Some((ia, prev(ia, na))) });
            }
            Contact::AOnEdgeB { .. } => {
                vectors.push(SlideVector { v: va - (vb + offset), marks: None });
                vectors.push(SlideVector { v: va - (prev_b + offset), marks: None });
            }
        }
    }
    vectors
}

/// Traces the no-fit polygon of `b` around `a` (or inside `a` when `inside` is set) by orbiting.
///
/// The result is the path of the first vertex of `b`. With `explore_all_edges` every reachable loop is
/// traced, otherwise only the first. Returns `None` when no loop could be closed.
pub fn no_fit_polygon(a: &Polygon, b: &Polygon, inside: bool, explore_all_edges: bool) -> Option<Vec<Polygon>> {
    if a.len() < 3 || b.len() < 3 {
        return None;
    }
    let a: Vec<Point> = a.points().collect();
    let b: Vec<Point> = b.points().collect();
    let mut marked = vec![false; a.len()];

    let mut start = match inside {
        false => {
            // highest vertex of B on the lowest vertex of A: B hangs below A, the two cannot overlap
            let min_a = (1..a.len()).fold(0, |m, i| if a[i].1 < a[m].1 { i } else { m });
            let max_b = (1..b.len()).fold(0, |m, i| if b[i].1 > b[m].1 { i } else { m });
            Some(a[min_a] - b[max_b])
        }
        true => search_start_point(&a, &mut marked, &b, true, &[]),
    };

    let cap = 10 * (a.len() + b.len());
    let mut loops: Vec<Vec<Point>> = vec![];
    while let Some(start_offset) = start {
        match trace_loop(&a, &b, start_offset, &mut marked, cap) {
            Some(l) if !l.is_empty() => loops.push(l),
            _ => debug!("[NFP] orbit from {start_offset:?} did not close"),
        }
        if !explore_all_edges {
            break;
        }
        start = search_start_point(&a, &mut marked, &b, inside, &loops);
    }

    match loops.is_empty() {
        true => None,
        false => Some(loops.into_iter().map(Polygon::from_points).collect()),
    }
}

fn trace_loop(a: &[Point], b: &[Point], start_offset: Point, marked: &mut [bool], cap: usize) -> Option<Vec<Point>> {
    let mut offset = start_offset;
    let mut prev_vector: Option<Point> = None;
    let mut reference = b[0] + offset;
    let start = reference;
    let mut nfp = vec![reference];

    for _ in 0..cap {
        let contacts = touching_contacts(a, b, offset);
        let vectors = slide_vectors(a, b, offset, &contacts, marked);

        let mut translate: Option<SlideVector> = None;
        let mut max_d = 0.0;
        for sv in &vectors {
            let v = sv.v;
            if v.0 == 0.0 && v.1 == 0.0 {
                continue;
            }
            // do not head back the way we came unless the turn is significant
            if let Some(pv) = prev_vector {
                if v.dot(&pv) < 0.0 {
                    let (u, pu) = (v.normalized(), pv.normalized());
                    if (u.1 * pu.0 - u.0 * pu.1).abs() < BACKTRACK_SINE {
                        continue;
                    }
                }
            }
            let vec_len2 = v.dot(&v);
            let d = match polygon_slide_distance(a, Point(0.0, 0.0), b, offset, v, true) {
                Some(d) if d * d <= vec_len2 => d,
                _ => vec_len2.sqrt(),
            };
            if d > max_d {
                max_d = d;
                translate = Some(*sv);
            }
        }

        let Some(sv) = translate.filter(|_| !almost_equal(max_d, 0.0, TOL)) else {
            // stuck: no contact allows any movement
            return None;
        };
        if let Some((s, e)) = sv.marks {
            marked[s] = true;
            marked[e] = true;
        }
        prev_vector = Some(sv.v);

        let mut step = sv.v;
        let len2 = step.dot(&step);
        if max_d * max_d < len2 && !almost_equal(max_d * max_d, len2, TOL) {
            let scale = ((max_d * max_d) / len2).sqrt();
            step = Point(step.0 * scale, step.1 * scale);
        }

        reference = reference + step;
        if reference.almost_equal(&start, TOL) {
            return Some(nfp);
        }
        // starting on a shared horizontal edge can close the loop somewhere other than the start
        if nfp[..nfp.len() - 1].iter().any(|p| reference.almost_equal(p, TOL)) {
            return Some(nfp);
        }
        nfp.push(reference);
        offset = offset + step;
    }
    debug!("[NFP] orbit exceeded {cap} iterations, loop discarded");
    None
}

/// Whether `p` lies strictly inside `ring`.
pub(crate) fn strictly_inside(p: Point, ring: &Polygon) -> bool {
    let pts: Vec<Point> = ring.points().collect();
    point_in_polygon(p, &pts, Point(0.0, 0.0)) == Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::geo_traits::Shape;
    use float_cmp::approx_eq;

    #[test]
    fn orbit_square_around_square() {
        let a = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let b = Polygon::rectangle(0.0, 0.0, 5.0, 5.0);
        let nfp = no_fit_polygon(&a, &b, false, false).unwrap();
        assert_eq!(nfp.len(), 1);
        assert!(approx_eq!(f64, nfp[0].area().abs(), 225.0, epsilon = 1e-6));
    }

    #[test]
    fn inner_square_in_square() {
        let a = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let b = Polygon::rectangle(0.0, 0.0, 4.0, 4.0);
        let nfp = no_fit_polygon(&a, &b, true, false).unwrap();
        assert_eq!(nfp.len(), 1);
        assert!(approx_eq!(f64, nfp[0].area().abs(), 36.0, epsilon = 1e-6));
    }

    #[test]
    fn too_large_part_has_no_inner_nfp() {
        let a = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let b = Polygon::rectangle(0.0, 0.0, 20.0, 20.0);
        assert!(no_fit_polygon(&a, &b, true, false).is_none());
    }
}
