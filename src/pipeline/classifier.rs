//! Location scoring: feature vector in, probability distribution out.
//!
//! The pipeline treats the classifier as an opaque pre-trained scorer; any
//! type satisfying [`LocationClassifier`] can be plugged in. The shipped
//! implementation is a Gaussian-kernel nearest-centroid scorer over
//! per-label RSSI fingerprint centroids, loaded from a JSON artifact.

use crate::LocateError;

/// An opaque pre-trained scorer over the label vocabulary.
///
/// `classify` must return one probability per known label, aligned with the
/// vocabulary ordering fixed at load time, summing to 1 within floating
/// tolerance. The pipeline never inspects the scorer's internals.
pub trait LocationClassifier: Send + Sync {
    /// Feature dimensionality the scorer was trained on.
    fn dims(&self) -> usize;

    /// Number of labels in the trained vocabulary.
    fn label_count(&self) -> usize;

    /// Score a normalized feature vector into a distribution over labels.
    fn classify(&self, features: &[f64]) -> crate::Result<Vec<f64>>;
}

/// Gaussian-kernel nearest-centroid classifier.
///
/// Each label has a fingerprint centroid in normalized feature space; a
/// reading is scored by `exp(-d² / 2σ²)` against every centroid and the
/// scores are normalized into a distribution. Computed in log domain with a
/// max shift so that distant readings cannot underflow to an all-zero score
/// vector.
#[derive(Debug, Clone)]
pub struct CentroidClassifier {
    centroids: Vec<Vec<f64>>,
    bandwidth: f64,
}

impl CentroidClassifier {
    /// Build from per-label centroids and a kernel bandwidth σ.
    ///
    /// Centroid shape consistency and a positive bandwidth are enforced by
    /// the configuration loader.
    pub fn new(centroids: Vec<Vec<f64>>, bandwidth: f64) -> Self {
        debug_assert!(!centroids.is_empty());
        debug_assert!(bandwidth > 0.0);
        Self {
            centroids,
            bandwidth,
        }
    }
}

impl LocationClassifier for CentroidClassifier {
    fn dims(&self) -> usize {
        self.centroids.first().map_or(0, Vec::len)
    }

    fn label_count(&self) -> usize {
        self.centroids.len()
    }

    fn classify(&self, features: &[f64]) -> crate::Result<Vec<f64>> {
        // The normalizer guarantees this for readings that came through the
        // pipeline; callers scoring vectors directly get the same contract.
        if features.len() != self.dims() {
            return Err(LocateError::Inference(format!(
                "expected {} features, received {}",
                self.dims(),
                features.len()
            )));
        }

        let inv_two_sigma_sq = 1.0 / (2.0 * self.bandwidth * self.bandwidth);

        let log_scores: Vec<f64> = self
            .centroids
            .iter()
            .map(|centroid| {
                let d_sq: f64 = centroid
                    .iter()
                    .zip(features)
                    .map(|(c, f)| (c - f) * (c - f))
                    .sum();
                -d_sq * inv_two_sigma_sq
            })
            .collect();

        let max_log = log_scores
            .iter()
            .fold(f64::NEG_INFINITY, |acc, &s| acc.max(s));

        let mut probs: Vec<f64> = log_scores.iter().map(|s| (s - max_log).exp()).collect();
        let total: f64 = probs.iter().sum();
        for p in &mut probs {
            *p /= total;
        }

        Ok(probs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> CentroidClassifier {
        CentroidClassifier::new(
            vec![
                vec![0.0, 0.0],
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![5.0, 5.0],
            ],
            1.0,
        )
    }

    #[test]
    fn test_distribution_sums_to_one() {
        let probs = classifier().classify(&[0.3, 0.2]).unwrap();
        let sum: f64 = probs.iter().sum();

        assert!((sum - 1.0).abs() < 1e-6, "distribution sums to {sum}");
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_nearest_centroid_gets_highest_probability() {
        let probs = classifier().classify(&[4.8, 5.1]).unwrap();
        let argmax = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();

        assert_eq!(argmax, 3, "reading near (5,5) should score centroid 3 highest");
    }

    #[test]
    fn test_far_reading_does_not_underflow() {
        // All centroids are hundreds of sigmas away; the max shift must keep
        // the distribution finite and normalized.
        let probs = classifier().classify(&[500.0, -500.0]).unwrap();
        let sum: f64 = probs.iter().sum();

        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((sum - 1.0).abs() < 1e-6, "distribution sums to {sum}");
    }

    #[test]
    fn test_wrong_dimensionality_is_an_inference_error() {
        let err = classifier().classify(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, LocateError::Inference(_)));
    }
}
