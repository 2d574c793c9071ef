/// Absolute tolerance used for geometric near-equality.
pub const TOL: f64 = 1e-9;

/// Whether `a` and `b` lie within `tolerance` of each other, see [`float_cmp::approx_eq!()`].
#[inline]
pub fn almost_equal(a: f64, b: f64, tolerance: f64) -> bool {
    float_cmp::approx_eq!(f64, a, b, epsilon = tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_is_absolute() {
        assert!(almost_equal(1.0, 1.0 + 0.5 * TOL, TOL));
        assert!(!almost_equal(1.0, 1.001, TOL));
        assert!(almost_equal(1e6, 1e6 + 0.05, 0.1));
    }
}
