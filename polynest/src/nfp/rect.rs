use crate::geometry::geo_traits::Shape;
use crate::geometry::{Point, Polygon};

/// Closed-form NFP for axis-aligned rectangles.
///
/// With `inside`, `a` must be a rectangle and the result is the region of the first vertex of `b`
/// keeping the bounding box of `b` inside `a`; `None` when `b` is larger in either direction.
/// Without `inside`, both `a` and `b` must be rectangles and the result is the outer touching loop.
pub fn no_fit_polygon_rectangle(a: &Polygon, b: &Polygon, inside: bool) -> Option<Vec<Polygon>> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let (ra, rb) = (a.bound_rect(), b.bound_rect());
    let b0 = b.at(0);
    let (x_lo, x_hi, y_lo, y_hi) = match inside {
        true => {
            if rb.width > ra.width || rb.height > ra.height {
                return None;
            }
            (
                ra.x - rb.x + b0.0,
                ra.x_max() - rb.x_max() + b0.0,
                ra.y - rb.y + b0.1,
                ra.y_max() - rb.y_max() + b0.1,
            )
        }
        false => (
            ra.x - rb.x_max() + b0.0,
            ra.x_max() - rb.x + b0.0,
            ra.y - rb.y_max() + b0.1,
            ra.y_max() - rb.y + b0.1,
        ),
    };
    Some(vec![Polygon::from_points([
        Point(x_lo, y_lo),
        Point(x_hi, y_lo),
        Point(x_hi, y_hi),
        Point(x_lo, y_hi),
    ])])
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn inner_fit_of_rectangles() {
        let bin = Polygon::rectangle(0.0, 0.0, 100.0, 100.0);
        let part = Polygon::rectangle(5.0, 5.0, 40.0, 40.0);
        let nfp = no_fit_polygon_rectangle(&bin, &part, true).unwrap();
        let r = nfp[0].bound_rect();
        assert!(approx_eq!(f64, r.width, 60.0));
        assert!(approx_eq!(f64, r.x, 0.0));
        assert!(approx_eq!(f64, r.height, 60.0));
    }

    #[test]
    fn oversized_part_does_not_fit() {
        let bin = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let part = Polygon::rectangle(0.0, 0.0, 20.0, 20.0);
        assert!(no_fit_polygon_rectangle(&bin, &part, true).is_none());
    }

    #[test]
    fn outer_loop_of_rectangles() {
        let a = Polygon::rectangle(0.0, 0.0, 10.0, 10.0);
        let b = Polygon::rectangle(0.0, 0.0, 5.0, 5.0);
        let nfp = no_fit_polygon_rectangle(&a, &b, false).unwrap();
        assert!(approx_eq!(f64, nfp[0].area().abs(), 225.0));
    }
}
