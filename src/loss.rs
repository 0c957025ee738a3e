//! Log loss over a scored validation set.
use crate::metrics::LabeledScore;

const EPS: f64 = 1e-7;

/// Mean binary cross-entropy, with scores clamped to `[EPS, 1 - EPS]`.
/// An empty set has zero loss.
pub fn binary_cross_entropy(samples: &[LabeledScore]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let total: f64 = samples
        .iter()
        .map(|s| {
            let p = s.score.clamp(EPS, 1.0 - EPS);
            if s.label == 1 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    total / samples.len() as f64
}
