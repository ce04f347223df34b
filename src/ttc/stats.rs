//! Order statistics shared by the TTC estimators.

/// Median of `values`, averaging the two middle elements for even lengths.
///
/// Sorts `values` in place. Returns `None` for an empty slice.
pub fn median_in_place(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(f64::total_cmp);
    let n = values.len();
    let mid = n / 2;
    if n % 2 == 1 {
        Some(values[mid])
    } else {
        Some(0.5 * (values[mid - 1] + values[mid]))
    }
}

/// 0-based rank selected by `percentile` in a sorted sample of length `n`,
/// never below `floor`.
pub fn percentile_rank(n: usize, percentile: f64, floor: usize) -> usize {
    if n == 0 {
        return floor;
    }
    let rank = (percentile * (n - 1) as f64).round() as usize;
    rank.max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_and_even() {
        let mut odd = vec![3.0, 1.0, 2.0];
        assert_eq!(median_in_place(&mut odd), Some(2.0));

        let mut even = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(median_in_place(&mut even), Some(2.5));

        let mut single = vec![7.5];
        assert_eq!(median_in_place(&mut single), Some(7.5));
    }

    #[test]
    fn test_median_empty() {
        let mut empty: Vec<f64> = Vec::new();
        assert_eq!(median_in_place(&mut empty), None);
    }

    #[test]
    fn test_median_resists_outliers() {
        let mut values = vec![1.1, 1.1, 1.1, 1.1, 50.0, -20.0, 1.1];
        assert_eq!(median_in_place(&mut values), Some(1.1));
    }

    #[test]
    fn test_percentile_rank() {
        assert_eq!(percentile_rank(11, 0.0, 0), 0);
        assert_eq!(percentile_rank(11, 0.5, 0), 5);
        assert_eq!(percentile_rank(11, 1.0, 0), 10);
        assert_eq!(percentile_rank(11, 0.1, 5), 5);
        assert_eq!(percentile_rank(101, 0.1, 5), 10);
        assert_eq!(percentile_rank(0, 0.3, 2), 2);
    }
}
