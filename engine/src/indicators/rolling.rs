// Trailing-window aggregates over optional series

/// Sum of the trailing `window` values ending at each index.
///
/// `None` until a full window is available, and whenever any value inside the window is `None`.
pub fn rolling_sum(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            values[i + 1 - window..=i].iter().copied().sum::<Option<f64>>()
        })
        .collect()
}

/// Mean of the trailing `window` values; same definedness rules as [`rolling_sum`].
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling_sum(values, window)
        .into_iter()
        .map(|sum| sum.map(|s| s / window as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_option_vec_eq(a: &[Option<f64>], b: &[Option<f64>]) {
        assert_eq!(a.len(), b.len(), "Vectors differ in length");
        for (i, (val_a, val_b)) in a.iter().zip(b.iter()).enumerate() {
            match (val_a, val_b) {
                (Some(x), Some(y)) => assert!((x - y).abs() < 1e-9, "Mismatch at index {}: {} != {}", i, x, y),
                (None, None) => {}
                _ => panic!("Mismatch at index {}: {:?} != {:?}", i, val_a, val_b),
            }
        }
    }

    #[test]
    fn test_rolling_sum_calculation() {
        let values = [Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)];
        assert_option_vec_eq(&rolling_sum(&values, 3), &[None, None, Some(6.0), Some(9.0), Some(12.0)]);
    }

    #[test]
    fn test_rolling_mean_calculation() {
        let values = [Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)];
        assert_option_vec_eq(&rolling_mean(&values, 3), &[None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_gap_in_window_is_undefined() {
        let values = [None, Some(2.0), Some(3.0), None, Some(5.0), Some(6.0)];
        assert_option_vec_eq(&rolling_sum(&values, 2), &[None, None, Some(5.0), None, None, Some(11.0)]);
    }

    #[test]
    fn test_insufficient_and_empty_input() {
        assert_option_vec_eq(&rolling_mean(&[Some(1.0), Some(2.0)], 3), &[None, None]);
        assert!(rolling_sum(&[], 3).is_empty());
        assert_option_vec_eq(&rolling_sum(&[Some(1.0)], 0), &[None]);
    }
}
