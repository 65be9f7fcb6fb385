//! Empirical CDF from stored quantile breakpoints.

/// Floor for the width of a breakpoint interval (duplicate breakpoints).
const MIN_INTERVAL_WIDTH: f64 = 1e-12;

/// Map `value` to its uniform CDF probability given the sorted
/// breakpoints `quantiles`, evenly spaced over [0, 1].
///
/// Values at or below the first breakpoint map to exactly `0.0`, values at
/// or above the last to exactly `1.0`; anything in between is linearly
/// interpolated inside its bracketing interval. An empty table carries no
/// information and maps everything to the median probability `0.5`.
#[must_use]
pub fn cdf_from_quantiles(value: f64, quantiles: &[f64]) -> f64 {
    let n = quantiles.len();
    if n == 0 {
        return 0.5;
    }
    if value <= quantiles[0] {
        return 0.0;
    }
    if value >= quantiles[n - 1] {
        return 1.0;
    }

    // Here n >= 2 and quantiles[lo] <= value < quantiles[hi] holds throughout.
    let mut lo = 0;
    let mut hi = n - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if value < quantiles[mid] {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    let width = (quantiles[hi] - quantiles[lo]).max(MIN_INTERVAL_WIDTH);
    let t = (value - quantiles[lo]) / width;
    let last = (n - 1) as f64;
    let p_lo = lo as f64 / last;
    let p_hi = hi as f64 / last;
    p_lo + (p_hi - p_lo) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: [f64; 5] = [0.0, 10.0, 20.0, 40.0, 80.0];

    #[test]
    fn test_below_and_above_range_are_exact() {
        assert_eq!(cdf_from_quantiles(-5.0, &TABLE), 0.0);
        assert_eq!(cdf_from_quantiles(0.0, &TABLE), 0.0);
        assert_eq!(cdf_from_quantiles(80.0, &TABLE), 1.0);
        assert_eq!(cdf_from_quantiles(1e9, &TABLE), 1.0);
    }

    #[test]
    fn test_breakpoints_map_to_even_probabilities() {
        assert!((cdf_from_quantiles(10.0, &TABLE) - 0.25).abs() < 1e-12);
        assert!((cdf_from_quantiles(20.0, &TABLE) - 0.5).abs() < 1e-12);
        assert!((cdf_from_quantiles(40.0, &TABLE) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_linear_inside_interval() {
        // Halfway between 20 and 40 sits halfway between 0.5 and 0.75.
        assert!((cdf_from_quantiles(30.0, &TABLE) - 0.625).abs() < 1e-12);
        assert!((cdf_from_quantiles(5.0, &TABLE) - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_monotonic_in_value() {
        let table = [1.0, 1.0, 2.0, 2.0, 2.0, 3.5, 10.0];
        let mut prev = 0.0;
        let mut v = 0.0;
        while v < 11.0 {
            let p = cdf_from_quantiles(v, &table);
            assert!(p >= prev, "cdf decreased at v={v}");
            assert!((0.0..=1.0).contains(&p));
            prev = p;
            v += 0.01;
        }
    }

    #[test]
    fn test_duplicate_breakpoints_do_not_divide_by_zero() {
        let table = [0.0, 5.0, 5.0, 5.0, 9.0];
        let p = cdf_from_quantiles(5.0, &table);
        assert!(p.is_finite());
        // The search lands on the last duplicate.
        assert!((p - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_tables() {
        assert_eq!(cdf_from_quantiles(3.0, &[]), 0.5);
        assert_eq!(cdf_from_quantiles(3.0, &[3.0]), 0.0);
        assert_eq!(cdf_from_quantiles(4.0, &[3.0]), 1.0);
        assert!(cdf_from_quantiles(f64::NAN, &TABLE).is_nan());
    }
}
