//! Binary classification metrics driven by a decision threshold.
//!
//! Everything here is a pure function of `(label, score)` pairs: the
//! confusion matrix and its derived ratios for a single threshold, and a
//! fixed sweep of [`ROC_STEPS`]` + 1` thresholds for the ROC curve and its
//! trapezoidal AUC. Zero denominators resolve to `0.0` instead of NaN so a
//! report can always be rendered.
use serde::Serialize;
use std::fmt;

/// The ROC sweep visits thresholds `i / ROC_STEPS` for `i in 0..=ROC_STEPS`.
pub const ROC_STEPS: usize = 100;

/// One validation example: the true label (0 or 1) and the model's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabeledScore {
    pub label: u8,
    pub score: f64,
}

/// Predicted class for `score`; a score exactly at the threshold is positive.
#[inline]
pub fn classify(score: f64, threshold: f64) -> u8 {
    u8::from(score >= threshold)
}

#[inline]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// 2x2 count table of predicted vs. actual class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    /// Classify every sample at `threshold` and bucket it against its label.
    pub fn tally(samples: &[LabeledScore], threshold: f64) -> Self {
        let mut cm = Self::default();
        for s in samples {
            match (classify(s.score, threshold), s.label) {
                (1, 1) => cm.true_positives += 1,
                (0, 0) => cm.true_negatives += 1,
                (1, _) => cm.false_positives += 1,
                _ => cm.false_negatives += 1,
            }
        }
        cm
    }

    /// Number of samples the matrix was built from.
    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// `tp / (tp + fn)`, also the recall.
    pub fn true_positive_rate(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// `fp / (fp + tn)`.
    pub fn false_positive_rate(&self) -> f64 {
        ratio(self.false_positives, self.false_positives + self.true_negatives)
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "+-----------------+--------------------+--------------------+";
        writeln!(f, "{}", rule)?;
        writeln!(f, "|                 | Predicted Positive | Predicted Negative |")?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "| Actual Positive | {:>18} | {:>18} |",
            self.true_positives, self.false_negatives
        )?;
        writeln!(
            f,
            "| Actual Negative | {:>18} | {:>18} |",
            self.false_positives, self.true_negatives
        )?;
        writeln!(f, "{}", rule)
    }
}

/// Ratios derived from a [`ConfusionMatrix`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricsReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl MetricsReport {
    pub fn from_matrix(cm: &ConfusionMatrix) -> Self {
        let accuracy = ratio(cm.true_positives + cm.true_negatives, cm.total());
        let precision = ratio(cm.true_positives, cm.true_positives + cm.false_positives);
        let recall = cm.true_positive_rate();
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        Self {
            accuracy,
            precision,
            recall,
            f1,
        }
    }
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy:  {:.2}%", self.accuracy * 100.0)?;
        writeln!(f, "Precision: {:.4}", self.precision)?;
        writeln!(f, "Recall:    {:.4}", self.recall)?;
        writeln!(f, "F1 Score:  {:.4}", self.f1)
    }
}

/// A single point of the ROC curve, tagged with the threshold that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocPoint {
    pub threshold: f64,
    pub false_positive_rate: f64,
    pub true_positive_rate: f64,
}

/// ROC curve sorted by ascending false-positive rate, plus its area.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    pub points: Vec<RocPoint>,
    pub auc: f64,
}

impl RocCurve {
    /// Sweep all thresholds, sort the points and integrate.
    pub fn compute(samples: &[LabeledScore]) -> Self {
        let mut points = roc_sweep(samples);
        // sort_by is stable: equal FPRs keep ascending-threshold order
        points.sort_by(|a, b| a.false_positive_rate.total_cmp(&b.false_positive_rate));
        let auc = trapezoidal_auc(&points);
        Self { points, auc }
    }
}

/// ROC points in ascending threshold order (unsorted by FPR).
pub fn roc_sweep(samples: &[LabeledScore]) -> Vec<RocPoint> {
    (0..=ROC_STEPS)
        .map(|i| {
            let threshold = i as f64 / ROC_STEPS as f64;
            let cm = ConfusionMatrix::tally(samples, threshold);
            RocPoint {
                threshold,
                false_positive_rate: cm.false_positive_rate(),
                true_positive_rate: cm.true_positive_rate(),
            }
        })
        .collect()
}

/// Trapezoidal area under `points`, which must already be sorted by FPR.
pub fn trapezoidal_auc(points: &[RocPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| {
            let dx = w[1].false_positive_rate - w[0].false_positive_rate;
            dx * (w[1].true_positive_rate + w[0].true_positive_rate) / 2.0
        })
        .sum()
}
