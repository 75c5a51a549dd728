// Statistics module - reduce per-frame feature tracks to summary values
//
// Every track is summarized as { mean, population std dev, change rate }.
// Non-finite values are dropped before any computation.

use serde::Serialize;

/// Fraction of the standard deviation a step must exceed to count as a change
pub const CHANGE_THRESHOLD_FACTOR: f32 = 0.1;

/// Summary of one per-frame feature track
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub mean: f32,
    pub std_dev: f32,
    /// Fraction of consecutive pairs whose step exceeds 0.1 × std dev, in [0, 1]
    pub change_rate: f32,
}

/// Compute mean, population std dev and change rate of `values`
///
/// Returns all zeros when no finite value remains.
pub fn compute_statistics(values: &[f32]) -> Statistics {
    let finite: Vec<f64> = values
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| v as f64)
        .collect();
    if finite.is_empty() {
        return Statistics::default();
    }

    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let variance = finite.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let change_rate = if finite.len() < 2 {
        0.0
    } else {
        let threshold = CHANGE_THRESHOLD_FACTOR as f64 * std_dev;
        let changes = finite
            .windows(2)
            .filter(|pair| (pair[1] - pair[0]).abs() > threshold)
            .count();
        changes as f64 / (finite.len() - 1) as f64
    };

    Statistics {
        mean: mean as f32,
        std_dev: std_dev as f32,
        change_rate: change_rate as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(compute_statistics(&[]), Statistics::default());
        assert_eq!(
            compute_statistics(&[f32::NAN, f32::INFINITY]),
            Statistics::default()
        );
    }

    #[test]
    fn test_mean_and_population_std() {
        let stats = compute_statistics(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((stats.mean - 5.0).abs() < 1e-6);
        assert!((stats.std_dev - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_constant_track_has_no_changes() {
        let stats = compute_statistics(&[0.3; 10]);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.change_rate, 0.0);
    }

    #[test]
    fn test_change_rate_counts_large_steps() {
        // std = 0.5, threshold 0.05; steps: 1, 0, 1
        let stats = compute_statistics(&[0.0, 1.0, 1.0, 0.0]);
        assert!((stats.change_rate - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_values_are_skipped() {
        let stats = compute_statistics(&[1.0, f32::NAN, 3.0]);
        assert!((stats.mean - 2.0).abs() < 1e-6);
        assert!((stats.change_rate - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_change_rate_in_unit_range() {
        let values: Vec<f32> = (0..50).map(|i| ((i * 37) % 11) as f32).collect();
        let stats = compute_statistics(&values);
        assert!((0.0..=1.0).contains(&stats.change_rate));
        assert_eq!(compute_statistics(&[1.0]).change_rate, 0.0);
    }
}
