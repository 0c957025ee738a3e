//! Writes test-set predictions as the submission and probability CSVs.
use crate::metrics::{classify, LabeledScore, RocCurve};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const SUBMISSION_FILE: &str = "submission.csv";
pub const PROBABILITIES_FILE: &str = "probabilities.csv";

/// Model output for one test passenger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub passenger_id: String,
    pub probability: f64,
}

/// `PassengerId,Survived` with the label taken at `threshold` (inclusive).
pub fn write_submission<W: Write>(writer: W, predictions: &[Prediction], threshold: f64) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["PassengerId", "Survived"])?;
    for p in predictions {
        let label = classify(p.probability, threshold).to_string();
        wtr.write_record([p.passenger_id.as_str(), label.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// `PassengerId,Probability` with six decimals.
pub fn write_probabilities<W: Write>(writer: W, predictions: &[Prediction]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["PassengerId", "Probability"])?;
    for p in predictions {
        let prob = format!("{:.6}", p.probability);
        wtr.write_record([p.passenger_id.as_str(), prob.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Cache validation output as `label,probability` so it can be re-evaluated
/// without the model.
pub fn write_labeled_scores<W: Write>(writer: W, samples: &[LabeledScore]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["label", "probability"])?;
    for s in samples {
        wtr.write_record([s.label.to_string(), s.score.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// ROC points in curve order as `threshold,false_positive_rate,true_positive_rate`.
pub fn write_roc_points<W: Write>(writer: W, roc: &RocCurve) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for point in &roc.points {
        wtr.serialize(point)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write both files into `dir`, creating it if needed. Returns their paths.
pub fn export_predictions(dir: impl AsRef<Path>, predictions: &[Prediction], threshold: f64) -> Result<(PathBuf, PathBuf)> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let submission = dir.join(SUBMISSION_FILE);
    let probabilities = dir.join(PROBABILITIES_FILE);
    write_submission(
        File::create(&submission).with_context(|| format!("creating {}", submission.display()))?,
        predictions,
        threshold,
    )?;
    write_probabilities(
        File::create(&probabilities).with_context(|| format!("creating {}", probabilities.display()))?,
        predictions,
    )?;
    tracing::info!(rows = predictions.len(), dir = %dir.display(), "predictions exported");
    Ok((submission, probabilities))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preds() -> Vec<Prediction> {
        vec![
            Prediction { passenger_id: "892".into(), probability: 0.5 },
            Prediction { passenger_id: "893".into(), probability: 0.1234567 },
        ]
    }

    #[test]
    fn submission_uses_inclusive_threshold() {
        let mut buf = Vec::new();
        write_submission(&mut buf, &preds(), 0.5).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "PassengerId,Survived\n892,1\n893,0\n");
    }

    #[test]
    fn probabilities_have_six_decimals() {
        let mut buf = Vec::new();
        write_probabilities(&mut buf, &preds()).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "PassengerId,Probability\n892,0.500000\n893,0.123457\n"
        );
    }

    #[test]
    fn cached_scores_read_back() {
        let samples = [
            LabeledScore { label: 1, score: 0.875 },
            LabeledScore { label: 0, score: 0.125 },
        ];
        let mut buf = Vec::new();
        write_labeled_scores(&mut buf, &samples).unwrap();
        let (labels, scores) = crate::datasets::parse_labeled_scores(buf.as_slice()).unwrap();
        assert_eq!(labels, vec![1, 0]);
        assert_eq!(scores, vec![0.875, 0.125]);
    }

    #[test]
    fn roc_points_are_written_in_curve_order() {
        let samples = [
            LabeledScore { label: 1, score: 1.0 },
            LabeledScore { label: 0, score: 0.0 },
        ];
        let roc = RocCurve::compute(&samples);
        let mut buf = Vec::new();
        write_roc_points(&mut buf, &roc).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("threshold,false_positive_rate,true_positive_rate"));
        let first: Vec<f64> = lines
            .next()
            .unwrap()
            .split(',')
            .map(|v| v.parse().unwrap())
            .collect();
        assert_eq!(first, vec![0.01, 0.0, 1.0]);
        assert_eq!(text.lines().count(), crate::metrics::ROC_STEPS + 2);
    }

    #[test]
    fn export_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let (sub, probs) = export_predictions(dir.path().join("out"), &preds(), 0.6).unwrap();
        assert_eq!(std::fs::read_to_string(sub).unwrap(), "PassengerId,Survived\n892,0\n893,0\n");
        assert!(std::fs::read_to_string(probs).unwrap().starts_with("PassengerId,Probability\n"));
    }
}
