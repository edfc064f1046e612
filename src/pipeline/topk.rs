//! Deterministic top-K selection over a label distribution.
//!
//! The K highest-probability labels are returned in strictly descending
//! probability order. Labels whose probabilities differ by no more than a
//! configured epsilon are treated as tied and ordered by ascending label, so
//! the result is identical across runs and independent of the scorer's
//! native iteration order.

use chrono::{DateTime, Utc};

use crate::domain::estimate::{LocationEstimate, RankedEstimates};
use crate::LocateError;

/// Select the `min(k, |labels|)` most probable labels.
///
/// `labels` and `probs` are parallel slices aligned with the vocabulary.
/// Non-finite probabilities violate the classifier contract and are rejected.
pub fn top_k(
    labels: &[String],
    probs: &[f64],
    k: usize,
    tie_epsilon: f64,
    timestamp: DateTime<Utc>,
) -> crate::Result<RankedEstimates> {
    if labels.len() != probs.len() {
        return Err(LocateError::Inference(format!(
            "distribution has {} probabilities for {} labels",
            probs.len(),
            labels.len()
        )));
    }
    if let Some(bad) = probs.iter().find(|p| !p.is_finite()) {
        return Err(LocateError::Inference(format!(
            "distribution contains a non-finite probability: {bad}"
        )));
    }

    // Total order first: probability descending, then label ascending. This
    // alone makes the result independent of input permutation.
    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_unstable_by(|&a, &b| {
        probs[b]
            .partial_cmp(&probs[a])
            .expect("probabilities checked finite above")
            .then_with(|| labels[a].cmp(&labels[b]))
    });

    // Second pass: labels whose probabilities sit within `tie_epsilon` of
    // their neighbour form a tie group; each group is reordered by label so
    // that near-equal probabilities never flip across runs.
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len()
            && (probs[order[end - 1]] - probs[order[end]]).abs() <= tie_epsilon
        {
            end += 1;
        }
        order[start..end].sort_unstable_by(|&a, &b| labels[a].cmp(&labels[b]));
        start = end;
    }

    let entries = order
        .into_iter()
        .take(k.min(labels.len()))
        .map(|i| LocationEstimate {
            label: labels[i].clone(),
            probability: probs[i],
            timestamp,
        })
        .collect();

    Ok(RankedEstimates::from_ordered(entries))
}
