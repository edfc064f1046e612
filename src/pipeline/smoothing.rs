//! Temporal smoothing of noisy top-1 classifications.
//!
//! Raw top-1 picks flicker between adjacent cells when their probabilities
//! are close. The estimator runs one scalar Kalman filter per grid axis over
//! the decoded (row, col) observation:
//!
//! - predict: `p ← p + q` (position drifts slowly, it does not jump)
//! - observe: `r = r_base / max(probability, prob_floor)`; higher
//!   confidence means lower assumed observation noise
//! - update:  `k = p / (p + r)`, `x ← x + k·(z − x)`, `p ← (1 − k)·p`
//!
//! The first observation is adopted directly with its own uncertainty; there
//! is no pull toward zero on cold start. The smoothed continuous coordinate
//! is snapped to the nearest in-bounds cell for routing and display, while
//! the raw top-K stays untouched in the shared register.

use serde::Deserialize;

use crate::domain::grid::{GridCell, GridSpec};

/// Noise constants for the smoothing filter, loaded once at startup.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SmoothingConfig {
    /// Per-tick growth of the state variance (process noise q).
    pub process_noise: f64,
    /// Observation variance for a probability-1.0 observation.
    pub obs_noise_base: f64,
    /// Lower clamp on reported probability, so a near-zero confidence still
    /// yields a finite observation noise.
    pub prob_floor: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            process_noise: 0.005,
            obs_noise_base: 1.0,
            prob_floor: 0.05,
        }
    }
}

/// Scalar Kalman state for one grid axis.
#[derive(Debug, Clone, Copy)]
struct AxisFilter {
    /// Estimated coordinate (continuous).
    x: f64,
    /// Estimate variance.
    p: f64,
}

impl AxisFilter {
    fn adopt(z: f64, r: f64) -> Self {
        Self { x: z, p: r }
    }

    fn step(&mut self, z: f64, q: f64, r: f64) {
        self.p += q;
        let k = self.p / (self.p + r);
        self.x += k * (z - self.x);
        self.p *= 1.0 - k;
    }
}

/// Discrete-state smoothing filter over top-1 classifications.
#[derive(Debug, Clone)]
pub struct TemporalEstimator {
    config: SmoothingConfig,
    grid: GridSpec,
    /// Row and column filters; `None` until the first observation.
    axes: Option<[AxisFilter; 2]>,
}

impl TemporalEstimator {
    /// Create an estimator with no prior state.
    pub fn new(config: SmoothingConfig, grid: GridSpec) -> Self {
        Self {
            config,
            grid,
            axes: None,
        }
    }

    /// Fold one raw top-1 observation into the filter and return the
    /// smoothed cell.
    ///
    /// A label that fails to decode leaves the filter state untouched and
    /// surfaces [`crate::LocateError::Decode`].
    pub fn observe(&mut self, label: &str, probability: f64) -> crate::Result<GridCell> {
        // Decode before touching any state so a bad observation cannot
        // perturb the estimate.
        let cell = self.grid.decode(label)?;

        let z = [f64::from(cell.row), f64::from(cell.col)];
        let r = self.config.obs_noise_base / probability.max(self.config.prob_floor);

        match self.axes.as_mut() {
            None => {
                self.axes = Some([AxisFilter::adopt(z[0], r), AxisFilter::adopt(z[1], r)]);
            }
            Some(axes) => {
                for (axis, &obs) in axes.iter_mut().zip(&z) {
                    axis.step(obs, self.config.process_noise, r);
                }
            }
        }

        Ok(self.cell().expect("state initialized above"))
    }

    /// Smoothed continuous (row, col) coordinate, if any observation has
    /// been folded in.
    pub fn position(&self) -> Option<(f64, f64)> {
        self.axes.map(|[row, col]| (row.x, col.x))
    }

    /// Current (row, col) estimate variances.
    pub fn uncertainty(&self) -> Option<(f64, f64)> {
        self.axes.map(|[row, col]| (row.p, col.p))
    }

    /// Smoothed position snapped to the nearest in-bounds cell.
    pub fn cell(&self) -> Option<GridCell> {
        self.position().map(|(row, col)| self.grid.snap(row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocateError;

    fn estimator() -> TemporalEstimator {
        TemporalEstimator::new(SmoothingConfig::default(), GridSpec::default())
    }

    #[test]
    fn test_cold_start_adopts_first_observation() {
        let mut est = estimator();
        let cell = est.observe("C13", 0.9).unwrap();

        assert_eq!(cell, GridCell::new(2, 2));
        let (row, col) = est.position().unwrap();
        assert!((row - 2.0).abs() < 1e-12, "no pull toward zero, got {row}");
        assert!((col - 2.0).abs() < 1e-12, "no pull toward zero, got {col}");
    }

    #[test]
    fn test_repeated_observation_converges_with_shrinking_uncertainty() {
        let mut est = estimator();
        est.observe("A11", 0.8).unwrap();

        let mut prev_p = est.uncertainty().unwrap().0;
        for _ in 0..80 {
            est.observe("E15", 0.8).unwrap();
            let p = est.uncertainty().unwrap().0;
            assert!(
                p <= prev_p + SmoothingConfig::default().process_noise,
                "uncertainty must not grow beyond one predict step"
            );
            prev_p = p;
        }

        let (row, col) = est.position().unwrap();
        assert!((row - 4.0).abs() < 0.2, "row converged to {row}");
        assert!((col - 4.0).abs() < 0.2, "col converged to {col}");
        assert!(est.uncertainty().unwrap().0 < 0.5);
    }

    #[test]
    fn test_single_outlier_shifts_estimate_less_than_one_cell() {
        let mut est = estimator();
        for _ in 0..15 {
            est.observe("B12", 0.9).unwrap();
        }
        let (row_before, col_before) = est.position().unwrap();

        // One jump across the grid must not drag the estimate a full cell.
        est.observe("I19", 0.9).unwrap();
        let (row_after, col_after) = est.position().unwrap();

        assert!(
            (row_after - row_before).abs() < 1.0,
            "outlier moved row by {}",
            (row_after - row_before).abs()
        );
        assert!(
            (col_after - col_before).abs() < 1.0,
            "outlier moved col by {}",
            (col_after - col_before).abs()
        );
    }

    #[test]
    fn test_low_confidence_pulls_less_than_high_confidence() {
        let mut low = estimator();
        let mut high = estimator();
        for est in [&mut low, &mut high] {
            est.observe("A11", 0.9).unwrap();
        }

        low.observe("A15", 0.1).unwrap();
        high.observe("A15", 0.95).unwrap();

        let col_low = low.position().unwrap().1;
        let col_high = high.position().unwrap().1;
        assert!(
            col_high > col_low,
            "high-confidence observation ({col_high}) should pull harder than \
             low-confidence ({col_low})"
        );
    }

    #[test]
    fn test_undecodable_label_leaves_state_untouched() {
        let mut est = estimator();
        est.observe("C13", 0.9).unwrap();
        let before = est.position().unwrap();

        let err = est.observe("??", 0.9).unwrap_err();
        assert!(matches!(err, LocateError::Decode { .. }));
        assert_eq!(est.position().unwrap(), before);
    }

    #[test]
    fn test_no_estimate_before_first_observation() {
        let est = estimator();
        assert!(est.cell().is_none());
        assert!(est.position().is_none());
    }
}
