//! Affine standardization of raw RSSI vectors.
//!
//! The mean and scale are learned offline together with the classifier and
//! loaded as opaque artifacts; they are never recomputed at runtime.

use crate::LocateError;

/// Maps a raw signal-strength vector onto the feature space the classifier
/// was trained on: `f[i] = (x[i] - mean[i]) / scale[i]`.
///
/// Pure and deterministic; the only failure mode is an input of the wrong
/// dimensionality.
#[derive(Debug, Clone)]
pub struct SignalNormalizer {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl SignalNormalizer {
    /// Build a normalizer from learned per-component mean and scale.
    ///
    /// Invariants (`mean.len() == scale.len()`, all scales non-zero) are
    /// enforced by the configuration loader before construction.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        debug_assert_eq!(mean.len(), scale.len());
        debug_assert!(scale.iter().all(|s| *s != 0.0));
        Self { mean, scale }
    }

    /// Dimensionality the normalizer (and classifier) expect.
    pub fn dims(&self) -> usize {
        self.mean.len()
    }

    /// Standardize a raw RSSI vector.
    pub fn normalize(&self, vector: &[i32]) -> crate::Result<Vec<f64>> {
        if vector.len() != self.dims() {
            return Err(LocateError::Shape {
                expected: self.dims(),
                received: vector.len(),
            });
        }

        Ok(vector
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&x, (mean, scale))| (f64::from(x) - mean) / scale)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_applies_affine_transform() {
        let normalizer = SignalNormalizer::new(vec![-70.0, -80.0], vec![5.0, 10.0]);
        let features = normalizer.normalize(&[-65, -90]).unwrap();

        assert!((features[0] - 1.0).abs() < 1e-12, "got {}", features[0]);
        assert!((features[1] + 1.0).abs() < 1e-12, "got {}", features[1]);
    }

    #[test]
    fn test_normalize_rejects_wrong_length() {
        let normalizer = SignalNormalizer::new(vec![0.0; 8], vec![1.0; 8]);
        let err = normalizer.normalize(&[-60; 5]).unwrap_err();

        assert!(matches!(
            err,
            LocateError::Shape {
                expected: 8,
                received: 5
            }
        ));
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let normalizer = SignalNormalizer::new(vec![-70.0; 3], vec![4.0; 3]);
        let a = normalizer.normalize(&[-69, -73, -60]).unwrap();
        let b = normalizer.normalize(&[-69, -73, -60]).unwrap();
        assert_eq!(a, b);
    }
}
