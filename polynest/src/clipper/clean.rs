use crate::clipper::int_point::{IntPath, IntPoint};

pub const DEFAULT_CLEAN_DISTANCE: f64 = 1.415;

#[derive(Debug, Clone, Copy)]
struct Vertex {
    pt: IntPoint,
    next: usize,
    prev: usize,
    kept: bool,
}

fn points_are_close(a: IntPoint, b: IntPoint, dist_sqrd: f64) -> bool {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    dx * dx + dy * dy <= dist_sqrd
}

fn distance_from_line_sqrd(pt: IntPoint, ln1: IntPoint, ln2: IntPoint) -> f64 {
    let a = (ln1.y - ln2.y) as f64;
    let b = (ln2.x - ln1.x) as f64;
    let c = a * ln1.x as f64 + b * ln1.y as f64;
    let c = a * pt.x as f64 + b * pt.y as f64 - c;
    (c * c) / (a * a + b * b)
}

/// Whether the middle one of three points lies within `sqrt(dist_sqrd)` of the line through the other two.
/// The point tested is whichever lies between the other two along the dominant axis.
fn slopes_near_collinear(p1: IntPoint, p2: IntPoint, p3: IntPoint, dist_sqrd: f64) -> bool {
    let between = |a: i64, b: i64, c: i64| (a > b) == (a < c);
    let (c1, c2, c3) = match (p1.x - p2.x).abs() > (p1.y - p2.y).abs() {
        true => (p1.x, p2.x, p3.x),
        false => (p1.y, p2.y, p3.y),
    };
    if between(c1, c2, c3) {
        distance_from_line_sqrd(p1, p2, p3) < dist_sqrd
    } else if between(c2, c1, c3) {
        distance_from_line_sqrd(p2, p1, p3) < dist_sqrd
    } else {
        distance_from_line_sqrd(p3, p1, p2) < dist_sqrd
    }
}

/// Removes vertices closer than `distance` to a neighbour and collapses near-collinear runs.
/// Returns an empty path when fewer than three vertices survive.
pub fn clean_path(path: &[IntPoint], distance: f64) -> IntPath {
    let n = path.len();
    if n == 0 {
        return vec![];
    }
    let mut ring: Vec<Vertex> = path
        .iter()
        .enumerate()
        .map(|(i, &pt)| Vertex {
            pt,
            next: (i + 1) % n,
            prev: (i + n - 1) % n,
            kept: false,
        })
        .collect();

    // unlinks `op` and returns its predecessor, which must be revisited
    let exclude = |ring: &mut Vec<Vertex>, op: usize| -> usize {
        let (prev, next) = (ring[op].prev, ring[op].next);
        ring[prev].next = next;
        ring[next].prev = prev;
        ring[prev].kept = false;
        prev
    };

    let dist_sqrd = distance * distance;
    let mut size = n;
    let mut op = 0;
    while !ring[op].kept && ring[op].next != ring[op].prev {
        let Vertex { pt, next, prev, .. } = ring[op];
        if points_are_close(pt, ring[prev].pt, dist_sqrd) {
            op = exclude(&mut ring, op);
            size -= 1;
        } else if points_are_close(ring[prev].pt, ring[next].pt, dist_sqrd) {
            exclude(&mut ring, next);
            op = exclude(&mut ring, op);
            size -= 2;
        } else if slopes_near_collinear(ring[prev].pt, pt, ring[next].pt, dist_sqrd) {
            op = exclude(&mut ring, op);
            size -= 1;
        } else {
            ring[op].kept = true;
            op = next;
        }
    }
    if size < 3 {
        return vec![];
    }
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        out.push(ring[op].pt);
        op = ring[op].next;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_near_duplicates_and_collinear_points() {
        let path = vec![
            IntPoint::new(0, 0),
            IntPoint::new(1, 0),
            IntPoint::new(50, 0),
            IntPoint::new(100, 0),
            IntPoint::new(100, 100),
            IntPoint::new(0, 100),
        ];
        let cleaned = clean_path(&path, DEFAULT_CLEAN_DISTANCE);
        assert_eq!(cleaned.len(), 4);
        assert!(cleaned.contains(&IntPoint::new(100, 100)));
    }

    #[test]
    fn degenerate_collapses_to_empty() {
        let path = vec![IntPoint::new(0, 0), IntPoint::new(1, 1), IntPoint::new(0, 1)];
        assert!(clean_path(&path, DEFAULT_CLEAN_DISTANCE).is_empty());
    }
}
