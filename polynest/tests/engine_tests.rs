#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use test_case::test_case;

    use polynest::cache::NfpKey;
    use polynest::clipper::{self, CLIPPER_SCALE, JoinType};
    use polynest::entities::PolygonNode;
    use polynest::geometry::geo_traits::Shape;
    use polynest::geometry::{PointPool, Polygon};
    use polynest::nfp::{PairJob, minkowski_difference, no_fit_polygon, pair_nfp};
    use polynest::util::PackedConfig;

    fn init_logger() {
        let _ = env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }

    fn rectangle(w: f64, h: f64) -> Polygon {
        Polygon::rectangle(0.0, 0.0, w, h)
    }

    fn diamond() -> Polygon {
        Polygon::new(vec![10.0, 0.0, 20.0, 10.0, 10.0, 20.0, 0.0, 10.0])
    }

    fn hexagon() -> Polygon {
        Polygon::new(vec![10.0, 0.0, 20.0, 0.0, 25.0, 8.0, 20.0, 16.0, 10.0, 16.0, 5.0, 8.0])
    }

    fn triangle() -> Polygon {
        Polygon::new(vec![0.0, 0.0, 20.0, 0.0, 10.0, 17.0])
    }

    fn l_shape() -> Polygon {
        Polygon::new(vec![0.0, 0.0, 20.0, 0.0, 20.0, 5.0, 5.0, 5.0, 5.0, 15.0, 0.0, 15.0])
    }

    #[test_case(rectangle(10.0, 7.0); "rectangle")]
    #[test_case(hexagon(); "hexagon")]
    #[test_case(l_shape(); "l_shape")]
    fn reversing_negates_area(p: Polygon) {
        let mut r = p.clone();
        r.reverse();
        assert!(p.area() != 0.0);
        assert!(approx_eq!(f64, r.area(), -p.area(), epsilon = 1e-9));
    }

    #[test_case(rectangle(10.0, 7.0); "rectangle")]
    #[test_case(hexagon(); "hexagon")]
    #[test_case(l_shape(); "l_shape")]
    fn boolean_identity_laws(p: Polygon) {
        let u = clipper::union(&[p.clone()], CLIPPER_SCALE);
        assert_eq!(u.len(), 1);
        assert!(approx_eq!(f64, u[0].area().abs(), p.area().abs(), epsilon = 1e-6));
        assert!(clipper::difference(&[p.clone()], &[p], CLIPPER_SCALE).is_empty());
    }

    #[test_case(rectangle(10.0, 10.0), 1.0; "square")]
    #[test_case(hexagon(), 0.5; "hexagon")]
    #[test_case(triangle(), 0.5; "triangle")]
    fn offset_round_trip(p: Polygon, d: f64) {
        let grown = clipper::offset(&p, d, JoinType::Miter, 4.0, 0.3, CLIPPER_SCALE);
        assert_eq!(grown.len(), 1);
        assert!(grown[0].area().abs() > p.area().abs());
        let back = clipper::offset(&grown[0], -d, JoinType::Miter, 4.0, 0.3, CLIPPER_SCALE);
        assert_eq!(back.len(), 1);
        assert!(approx_eq!(f64, back[0].area().abs(), p.area().abs(), epsilon = 1e-4));
    }

    #[test_case(rectangle(10.0, 10.0), rectangle(5.0, 5.0); "squares")]
    #[test_case(rectangle(20.0, 10.0), rectangle(4.0, 6.0); "rectangles")]
    #[test_case(diamond(), rectangle(4.0, 4.0); "diamond_square")]
    fn convex_orbit_matches_minkowski(a: Polygon, b: Polygon) {
        init_logger();
        let orbit = no_fit_polygon(&a, &b, false, false).unwrap();
        let mink = minkowski_difference(&a, &b, CLIPPER_SCALE);
        assert_eq!(orbit.len(), 1);
        assert_eq!(mink.len(), 1);

        let (oa, ma) = (orbit[0].area().abs(), mink[0].area().abs());
        assert!(approx_eq!(f64, oa, ma, epsilon = 1e-3));
        assert!(oa >= a.area().abs());

        let (ob, mb) = (orbit[0].bound_rect(), mink[0].bound_rect());
        assert!(approx_eq!(f64, ob.x, mb.x, epsilon = 1e-3));
        assert!(approx_eq!(f64, ob.y, mb.y, epsilon = 1e-3));
        assert!(approx_eq!(f64, ob.width, mb.width, epsilon = 1e-3));
        assert!(approx_eq!(f64, ob.height, mb.height, epsilon = 1e-3));
    }

    #[test]
    fn oversized_part_has_no_inner_nfp() {
        init_logger();
        let job = PairJob {
            config: PackedConfig::default(),
            key: NfpKey::new(-1, 0, true, 0, 0),
            a: PolygonNode::new(-1, 0.0, rectangle(10.0, 10.0)),
            b: PolygonNode::new(0, 0.0, rectangle(20.0, 20.0)),
        };
        assert!(pair_nfp(&job).is_empty());
    }

    #[test]
    fn inner_nfp_of_bin_winds_negative() {
        let job = PairJob {
            config: PackedConfig::default(),
            key: NfpKey::new(-1, 0, true, 0, 0),
            a: PolygonNode::new(-1, 0.0, rectangle(100.0, 100.0)),
            b: PolygonNode::new(0, 0.0, rectangle(40.0, 40.0)),
        };
        let result = pair_nfp(&job);
        assert_eq!(result.loops.len(), 1);
        assert!(result.loops[0].area() < 0.0);
        assert!(approx_eq!(f64, result.loops[0].area().abs(), 3600.0, epsilon = 1e-6));
    }

    #[test]
    fn key_distinguishes_operand_order_and_containment() {
        let rotations = 4;
        let a = NfpKey::new(3, 7, true, 1, 2);
        let b = NfpKey::new(7, 3, false, 2, 1);
        assert_ne!(a, b);
        assert_ne!(a, NfpKey::new(3, 7, false, 1, 2));
        assert_ne!(a, NfpKey::new(7, 3, true, 2, 1));
        // stable for the same inputs
        assert_eq!(a, NfpKey::new(3, 7, true, 1, 2));

        let parts = a.decode();
        assert_eq!((parts.source_a, parts.source_b), (3, 7));
        assert_eq!((parts.rot_idx_a, parts.rot_idx_b), (1, 2));
        assert!(parts.inside);
        assert!(!b.decode().inside);

        let na = PolygonNode::new(3, 90.0, rectangle(1.0, 1.0));
        let nb = PolygonNode::new(7, 180.0, rectangle(1.0, 1.0));
        assert_eq!(NfpKey::from_nodes(rotations, true, &na, &nb), a);
    }

    #[test_case(&[1, 2, 3, 4]; "ascending")]
    #[test_case(&[32]; "whole_pool")]
    #[test_case(&[5, 0, 9, 18]; "with_empty")]
    fn balanced_pool_use_restores_mask(sizes: &[usize]) {
        let mut pool = PointPool::new();
        let initial = pool.used_mask();
        let masks: Vec<u32> = sizes.iter().map(|&n| pool.alloc(n).unwrap()).collect();
        assert_eq!(pool.used_mask().count_ones() as usize, sizes.iter().sum::<usize>());
        for m in masks.into_iter().rev() {
            pool.free(m);
        }
        assert_eq!(pool.used_mask(), initial);

        // leases free themselves on every exit path
        let fails = |pool: &mut PointPool| -> polynest::error::Result<()> {
            let _lease = pool.lease(8)?;
            pool_is_too_small()?;
            Ok(())
        };
        assert!(fails(&mut pool).is_err());
        assert_eq!(pool.used_mask(), initial);
    }

    fn pool_is_too_small() -> polynest::error::Result<()> {
        PointPool::new().alloc(33).map(|_| ())
    }
}
