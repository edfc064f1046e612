//! The classification pipeline: normalize → classify → top-K → publish.

pub mod classifier;
pub mod normalizer;
pub mod route;
pub mod smoothing;
pub mod topk;

use std::sync::Arc;

use chrono::Utc;

use crate::domain::estimate::RankedEstimates;
use crate::state::PositionRegister;
use crate::LocateError;
use classifier::LocationClassifier;
use normalizer::SignalNormalizer;

/// Tolerance on the classifier's distribution sum.
const DISTRIBUTION_SUM_TOLERANCE: f64 = 1e-6;

/// Stateless per-reading pipeline; shared across request tasks.
///
/// `process` is the single entry point for an inbound reading: it runs the
/// normalizer, the opaque classifier, and the top-K selector, then publishes
/// the result through the shared register (which also drives smoothing,
/// history, and observer wake-up).
pub struct LocatePipeline {
    normalizer: SignalNormalizer,
    classifier: Arc<dyn LocationClassifier>,
    labels: Vec<String>,
    k: usize,
    tie_epsilon: f64,
    register: Arc<PositionRegister>,
}

impl LocatePipeline {
    /// Assemble the pipeline from startup-validated components.
    pub fn new(
        normalizer: SignalNormalizer,
        classifier: Arc<dyn LocationClassifier>,
        labels: Vec<String>,
        k: usize,
        tie_epsilon: f64,
        register: Arc<PositionRegister>,
    ) -> Self {
        Self {
            normalizer,
            classifier,
            labels,
            k,
            tie_epsilon,
            register,
        }
    }

    /// Dimensionality an inbound signal vector must have.
    pub fn dims(&self) -> usize {
        self.normalizer.dims()
    }

    /// The trained label vocabulary, in scorer order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Classify one reading and publish the result.
    ///
    /// Any error leaves the register and the history ring exactly as they
    /// were; nothing is published for a rejected reading.
    pub fn process(&self, vector: &[i32]) -> crate::Result<RankedEstimates> {
        let features = self.normalizer.normalize(vector)?;
        let probs = self.classifier.classify(&features)?;

        let sum: f64 = probs.iter().sum();
        if (sum - 1.0).abs() > DISTRIBUTION_SUM_TOLERANCE {
            return Err(LocateError::Inference(format!(
                "distribution sums to {sum}, expected 1.0"
            )));
        }

        let ranked = topk::top_k(&self.labels, &probs, self.k, self.tie_epsilon, Utc::now())?;

        self.register.publish(ranked.clone());
        Ok(ranked)
    }
}
