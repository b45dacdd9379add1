//! Rolling baseline statistics over hourly aggregates

/// Minimum data points required before a baseline is trustworthy.
pub const MIN_BASELINE_POINTS: usize = 20;
/// Trailing window, in hours, the baseline is computed over.
pub const BASELINE_WINDOW_HOURS: u32 = 168;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub mean: f64,
    pub stdev: f64,
    pub sample_size: usize,
}

impl Baseline {
    /// `None` when fewer than [`MIN_BASELINE_POINTS`] samples are given.
    pub fn compute(samples: &[f64]) -> Option<Self> {
        if samples.len() < MIN_BASELINE_POINTS {
            return None;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = if samples.len() > 1 {
            samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };
        Some(Baseline { mean, stdev: variance.sqrt(), sample_size: samples.len() })
    }

    /// Z-score of `value` against this baseline. `floor_stdev` clamps a
    /// near-zero standard deviation so a single flat baseline doesn't
    /// blow the score up — used by the error-rate detector's floor of 1.0.
    pub fn z_score(&self, value: f64, floor_stdev: f64) -> f64 {
        let stdev = self.stdev.max(floor_stdev);
        if stdev == 0.0 {
            0.0
        } else {
            (value - self.mean) / stdev
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fewer_than_minimum_points_yields_no_baseline() {
        let samples: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert!(Baseline::compute(&samples).is_none());
    }

    #[test]
    fn computes_mean_and_sample_stdev() {
        let samples: Vec<f64> = (0..20).map(|_| 10.0).collect();
        let baseline = Baseline::compute(&samples).unwrap();
        assert_eq!(baseline.mean, 10.0);
        assert_eq!(baseline.stdev, 0.0);
    }

    #[test]
    fn z_score_with_floor_avoids_division_blowup_on_flat_baseline() {
        let samples: Vec<f64> = (0..20).map(|_| 1.0).collect();
        let baseline = Baseline::compute(&samples).unwrap();
        let z = baseline.z_score(5.0, 1.0);
        assert_eq!(z, 4.0);
    }
}
