//! Evaluation context and threshold-update orchestration.
//!
//! An [`EvaluationContext`] owns the cached validation labels and scores
//! produced once by inference. Every metric is re-derived from it on demand;
//! changing the threshold never touches the model.
use crate::error::EvalError;
use crate::metrics::{ConfusionMatrix, LabeledScore, MetricsReport, RocCurve};
use serde::Serialize;

/// Read-only validation set: index-aligned labels and scores.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationContext {
    samples: Vec<LabeledScore>,
}

impl EvaluationContext {
    /// Pair up `labels` and `scores`. Unequal lengths or labels other than
    /// 0/1 are rejected; nothing is truncated or padded.
    pub fn new(labels: &[u8], scores: &[f64]) -> Result<Self, EvalError> {
        if labels.len() != scores.len() {
            return Err(EvalError::LengthMismatch {
                labels: labels.len(),
                scores: scores.len(),
            });
        }
        let samples = labels
            .iter()
            .zip(scores)
            .enumerate()
            .map(|(index, (&label, &score))| {
                if label > 1 {
                    return Err(EvalError::InvalidLabel { index, value: label });
                }
                Ok(LabeledScore { label, score })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[LabeledScore] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn confusion_matrix(&self, threshold: f64) -> ConfusionMatrix {
        ConfusionMatrix::tally(&self.samples, threshold)
    }

    /// Matrix and metrics for one threshold in a single call.
    pub fn evaluate(&self, threshold: f64) -> (ConfusionMatrix, MetricsReport) {
        let cm = self.confusion_matrix(threshold);
        (cm, MetricsReport::from_matrix(&cm))
    }

    /// Threshold-independent ROC curve and AUC.
    pub fn roc(&self) -> RocCurve {
        RocCurve::compute(&self.samples)
    }
}

/// Result of one threshold update. `sequence` orders reports so a caller
/// rendering asynchronously can drop stale ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdReport {
    pub sequence: u64,
    pub threshold: f64,
    pub matrix: ConfusionMatrix,
    pub metrics: MetricsReport,
}

/// Holds the current validation set and its ROC curve, and answers
/// threshold changes against them.
#[derive(Debug, Clone)]
pub struct EvaluationSession {
    context: EvaluationContext,
    roc: RocCurve,
    sequence: u64,
}

impl EvaluationSession {
    pub fn new(context: EvaluationContext) -> Self {
        let roc = context.roc();
        tracing::info!(samples = context.len(), auc = roc.auc, "evaluation session ready");
        Self {
            context,
            roc,
            sequence: 0,
        }
    }

    pub fn context(&self) -> &EvaluationContext {
        &self.context
    }

    pub fn roc(&self) -> &RocCurve {
        &self.roc
    }

    /// Swap in the output of a new inference run. Reports issued against
    /// the old set stop being the latest.
    pub fn replace_context(&mut self, context: EvaluationContext) {
        self.roc = context.roc();
        self.context = context;
        self.sequence += 1;
        tracing::info!(samples = self.context.len(), auc = self.roc.auc, "validation set replaced");
    }

    pub fn update_threshold(&mut self, threshold: f64) -> ThresholdReport {
        self.sequence += 1;
        let (matrix, metrics) = self.context.evaluate(threshold);
        tracing::debug!(
            sequence = self.sequence,
            threshold,
            accuracy = metrics.accuracy,
            f1 = metrics.f1,
            "threshold evaluated"
        );
        ThresholdReport {
            sequence: self.sequence,
            threshold,
            matrix,
            metrics,
        }
    }

    pub fn is_latest(&self, report: &ThresholdReport) -> bool {
        report.sequence == self.sequence
    }
}
