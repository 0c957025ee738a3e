//! End-to-end wiring: load, encode, split, score, evaluate, predict.
use crate::config::PipelineConfig;
use crate::datasets::{load_passengers, Dataset, Passenger};
use crate::evaluation::EvaluationContext;
use crate::export::Prediction;
use crate::network::Scorer;
use crate::preprocessing::{train_validation_split, FeatureEncoder};
use anyhow::{anyhow, Result};
use std::path::Path;

/// An encoded passenger.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    pub passenger_id: String,
    pub features: Vec<f64>,
    /// Ground truth; `None` for test rows.
    pub label: Option<u8>,
}

/// Encoder fitted on the training file plus the encoded splits.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub encoder: FeatureEncoder,
    pub train: Vec<EncodedRow>,
    pub validation: Vec<EncodedRow>,
    pub test: Vec<EncodedRow>,
}

fn encode_all(encoder: &FeatureEncoder, passengers: &[Passenger]) -> Vec<EncodedRow> {
    passengers
        .iter()
        .map(|p| EncodedRow {
            passenger_id: p.passenger_id.clone(),
            features: encoder.encode(p),
            label: p.survived,
        })
        .collect()
}

/// Fit the encoder on labelled training rows, encode everything, then split
/// training rows into train/validation. Training rows without a label are
/// dropped.
pub fn prepare(train: &Dataset, test: Option<&Dataset>, config: &PipelineConfig) -> Result<PreparedData> {
    config.validate()?;
    let labelled: Vec<Passenger> = train
        .passengers
        .iter()
        .filter(|p| p.survived.is_some())
        .cloned()
        .collect();
    let dropped = train.len() - labelled.len();
    if dropped > 0 {
        tracing::warn!(dropped, "training rows without a label were dropped");
    }
    if labelled.is_empty() {
        return Err(anyhow!("training data has no labelled rows"));
    }
    let encoder = FeatureEncoder::fit(&labelled, config);
    let rows = encode_all(&encoder, &labelled);
    let (train_rows, validation) = train_validation_split(rows, config.validation_fraction, config.shuffle_seed);
    let test = test.map(|t| encode_all(&encoder, &t.passengers)).unwrap_or_default();
    tracing::info!(
        train = train_rows.len(),
        validation = validation.len(),
        test = test.len(),
        features = encoder.feature_count(),
        "data prepared"
    );
    Ok(PreparedData {
        encoder,
        train: train_rows,
        validation,
        test,
    })
}

/// Load both CSVs from disk and [`prepare`] them.
pub fn prepare_files(train: impl AsRef<Path>, test: Option<&Path>, config: &PipelineConfig) -> Result<PreparedData> {
    let train = load_passengers(train, config)?;
    let test = test.map(|p| load_passengers(p, config)).transpose()?;
    prepare(&train, test.as_ref(), config)
}

/// Run the scorer once over the validation rows and cache the result as an
/// evaluation context.
pub fn score_validation<S: Scorer + ?Sized>(scorer: &S, validation: &[EncodedRow]) -> Result<EvaluationContext> {
    let labels: Vec<u8> = validation
        .iter()
        .map(|r| r.label.ok_or_else(|| anyhow!("validation row {} has no label", r.passenger_id)))
        .collect::<Result<_>>()?;
    let features: Vec<Vec<f64>> = validation.iter().map(|r| r.features.clone()).collect();
    let scores = scorer.score_all(&features)?;
    let context = EvaluationContext::new(&labels, &scores)?;
    tracing::info!(samples = context.len(), "validation scores cached");
    Ok(context)
}

/// Score rows for export.
pub fn predict<S: Scorer + ?Sized>(scorer: &S, rows: &[EncodedRow]) -> Result<Vec<Prediction>> {
    rows.iter()
        .map(|r| {
            Ok(Prediction {
                passenger_id: r.passenger_id.clone(),
                probability: scorer.score(&r.features)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::parse_passengers;

    /// Scores a row by its `sex_female` indicator.
    struct SexScorer;

    impl Scorer for SexScorer {
        fn score(&self, features: &[f64]) -> Result<f64> {
            Ok(if features[8] == 1.0 { 1.0 } else { 0.0 })
        }
    }

    fn train_csv() -> String {
        let mut s = String::from("PassengerId,Survived,Pclass,Sex,Age,SibSp,Parch,Fare,Embarked\n");
        for i in 0..10 {
            let female = i % 2 == 0;
            s.push_str(&format!(
                "{},{},{},{},{},0,0,{},S\n",
                i + 1,
                u8::from(female),
                1 + i % 3,
                if female { "female" } else { "male" },
                20 + i,
                8 + i
            ));
        }
        s.push_str("11,,3,male,30,0,0,8,S\n");
        s
    }

    #[test]
    fn prepare_drops_unlabelled_and_splits() {
        let cfg = PipelineConfig::default();
        let train = parse_passengers(train_csv().as_bytes(), &cfg).unwrap();
        let prepared = prepare(&train, None, &cfg).unwrap();
        assert_eq!(prepared.train.len(), 8);
        assert_eq!(prepared.validation.len(), 2);
        assert_eq!(prepared.validation[0].passenger_id, "9");
        assert!(prepared.test.is_empty());
    }

    #[test]
    fn scoring_feeds_the_evaluation_engine() {
        let cfg = PipelineConfig::default();
        let train = parse_passengers(train_csv().as_bytes(), &cfg).unwrap();
        let prepared = prepare(&train, Some(&train), &cfg).unwrap();
        let ctx = score_validation(&SexScorer, &prepared.validation).unwrap();
        let (_, metrics) = ctx.evaluate(0.5);
        assert_eq!(metrics.accuracy, 1.0);
        assert!((ctx.roc().auc - 1.0).abs() < 1e-2);

        let preds = predict(&SexScorer, &prepared.test).unwrap();
        assert_eq!(preds.len(), 11);
        assert_eq!(preds[0].probability, 1.0);
    }

    #[test]
    fn unlabelled_validation_rows_are_rejected() {
        let rows = vec![EncodedRow {
            passenger_id: "7".into(),
            features: vec![0.0; 12],
            label: None,
        }];
        assert!(score_validation(&SexScorer, &rows).is_err());
    }
}
