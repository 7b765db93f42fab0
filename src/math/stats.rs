//! Small sample statistics used by the fitter and the Monte Carlo propagation.

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// Returns `0.0` when the observations have no variance. The value is
/// negative when the fitted values do worse than the flat mean.
pub fn r_squared(observed: &[f64], fitted: &[f64]) -> f64 {
    let Some(mu) = mean(observed) else {
        return 0.0;
    };
    let ss_res: f64 = observed
        .iter()
        .zip(fitted.iter())
        .map(|(y, f)| (y - f) * (y - f))
        .sum();
    let ss_tot: f64 = observed.iter().map(|y| (y - mu) * (y - mu)).sum();
    if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 }
}

/// Empirical percentile with linear interpolation between order statistics.
///
/// `q` is a fraction in `[0, 1]`; `sorted` must be ascending. This matches the
/// common "linear" definition: position `q (n - 1)` in the sorted sample.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Sort a sample ascending, pushing NaNs to the end.
pub fn sort_ascending(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_sorted(&v, 0.0), Some(1.0));
        assert_eq!(percentile_sorted(&v, 1.0), Some(4.0));
        // position 0.5 * 3 = 1.5 -> halfway between 2 and 3
        assert!((percentile_sorted(&v, 0.5).unwrap() - 2.5).abs() < 1e-12);
        // position 0.025 * 3 = 0.075
        assert!((percentile_sorted(&v, 0.025).unwrap() - 1.075).abs() < 1e-12);
        assert_eq!(percentile_sorted(&[], 0.5), None);
        assert_eq!(percentile_sorted(&v, 1.5), None);
    }

    #[test]
    fn r_squared_perfect_flat_and_negative() {
        let y = [1.0, 2.0, 3.0];
        assert!((r_squared(&y, &y) - 1.0).abs() < 1e-12);
        assert_eq!(r_squared(&[5.0, 5.0], &[4.0, 6.0]), 0.0);
        assert!(r_squared(&y, &[3.0, 2.0, 1.0]) < 0.0);
    }

    #[test]
    fn sort_puts_nan_last() {
        let mut v = [3.0, f64::NAN, 1.0];
        sort_ascending(&mut v);
        assert_eq!(v[0], 1.0);
        assert_eq!(v[1], 3.0);
        assert!(v[2].is_nan());
    }
}
