//! Synthetic scored data for demos and engine checks.
use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generate `n` labelled scores. Positives draw from `[separation, 1]` and
/// negatives from `[0, 1 - separation]`, so `separation = 0` is an
/// uninformative scorer and values near 1 separate the classes. Both
/// `positive_rate` and `separation` must lie in `[0, 1]`.
pub fn generate_synthetic_scores(n: usize, positive_rate: f64, separation: f64, seed: u64) -> Result<(Vec<u8>, Vec<f64>)> {
    if !(0.0..=1.0).contains(&positive_rate) {
        return Err(anyhow!("positive rate must be in [0, 1], got {}", positive_rate));
    }
    if !(0.0..=1.0).contains(&separation) {
        return Err(anyhow!("separation must be in [0, 1], got {}", separation));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    Ok((0..n)
        .map(|_| {
            let label = u8::from(rng.gen_bool(positive_rate));
            let score = if label == 1 {
                rng.gen_range(separation..=1.0)
            } else {
                rng.gen_range(0.0..=1.0 - separation)
            };
            (label, score)
        })
        .unzip())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_scores_are_seeded_and_bounded() {
        let a = generate_synthetic_scores(200, 0.4, 0.3, 9).unwrap();
        let b = generate_synthetic_scores(200, 0.4, 0.3, 9).unwrap();
        assert_eq!(a, b);
        for (&label, &score) in a.0.iter().zip(&a.1) {
            if label == 1 {
                assert!((0.3..=1.0).contains(&score));
            } else {
                assert!((0.0..=0.7).contains(&score));
            }
        }
    }

    #[test]
    fn rejects_non_finite_and_out_of_range_parameters() {
        assert!(generate_synthetic_scores(10, f64::NAN, 0.3, 1).is_err());
        assert!(generate_synthetic_scores(10, 0.4, f64::NAN, 1).is_err());
        assert!(generate_synthetic_scores(10, f64::INFINITY, 0.3, 1).is_err());
        assert!(generate_synthetic_scores(10, 0.4, -0.1, 1).is_err());
        assert!(generate_synthetic_scores(10, 1.5, 0.3, 1).is_err());
    }

    #[test]
    fn wide_separation_splits_the_classes() {
        let (labels, scores) = generate_synthetic_scores(50, 0.5, 0.9, 3).unwrap();
        for (&label, &score) in labels.iter().zip(&scores) {
            if label == 1 {
                assert!(score >= 0.9);
            } else {
                assert!(score <= 0.1);
            }
        }
    }
}
