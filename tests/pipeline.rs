//! End-to-end: CSV files -> encoded splits -> model file -> cached
//! validation scores -> threshold reports -> exported predictions.

use std::path::Path;
use std::sync::Arc;

use titanic_mlp::{
    export_predictions, predict, prepare_files, score_validation, DenseLayer, EvaluationSession,
    PipelineConfig, Sigmoid, MLP,
};

const TRAIN: &str = "PassengerId,Survived,Pclass,Name,Sex,Age,SibSp,Parch,Ticket,Fare,Cabin,Embarked
1,0,3,\"Braund, Mr. Owen Harris\",male,22,1,0,A/5 21171,7.25,,S
2,1,1,\"Cumings, Mrs. John Bradley\",female,38,1,0,PC 17599,71.2833,C85,C
3,1,3,\"Heikkinen, Miss. Laina\",female,26,0,0,STON/O2. 3101282,7.925,,S
4,1,1,\"Futrelle, Mrs. Jacques Heath\",female,35,1,0,113803,53.1,C123,S
5,0,3,\"Allen, Mr. William Henry\",male,35,0,0,373450,8.05,,S
6,0,3,\"Moran, Mr. James\",male,,0,0,330877,8.4583,,Q
7,0,1,\"McCarthy, Mr. Timothy J\",male,54,0,0,17463,51.8625,E46,S
8,0,3,\"Palsson, Master. Gosta Leonard\",male,2,3,1,349909,21.075,,S
9,1,3,\"Johnson, Mrs. Oscar W\",female,27,0,2,347742,11.1333,,S
10,0,2,\"Nasser, Mr. Nicholas\",male,14,1,0,237736,30.0708,,C
";

const TEST: &str = "PassengerId,Pclass,Name,Sex,Age,SibSp,Parch,Ticket,Fare,Cabin,Embarked
892,3,\"Kelly, Mr. James\",male,34.5,0,0,330911,7.8292,,Q
893,3,\"Wilkes, Mrs. James\",female,47,1,0,363272,7,,S
894,2,\"Myles, Mr. Thomas Francis\",male,62,0,0,240276,9.6875,,
";

/// Logistic unit that only looks at the `sex_female` feature.
fn sex_model(feature_count: usize) -> MLP {
    let mut weights = vec![0.0; feature_count];
    weights[8] = 6.0;
    let out = DenseLayer::from_parts(vec![weights], vec![-3.0], Arc::new(Sigmoid)).unwrap();
    MLP::from_layers(vec![out]).unwrap()
}

fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn train_score_evaluate_export() {
    let dir = tempfile::tempdir().unwrap();
    let train = write(dir.path(), "train.csv", TRAIN);
    let test = write(dir.path(), "test.csv", TEST);
    let config = PipelineConfig::default();

    let prepared = prepare_files(&train, Some(test.as_path()), &config).unwrap();
    assert_eq!(prepared.train.len(), 8);
    assert_eq!(prepared.validation.len(), 2);
    assert_eq!(prepared.test.len(), 3);

    let model_path = dir.path().join("model.pere");
    sex_model(prepared.encoder.feature_count()).save_pere(&model_path).unwrap();
    let model = MLP::load_pere(&model_path).unwrap();

    // validation rows are passengers 9 (female, survived) and 10 (male, died)
    let ctx = score_validation(&model, &prepared.validation).unwrap();
    let mut session = EvaluationSession::new(ctx);
    let report = session.update_threshold(0.5);
    assert_eq!(report.matrix.true_positives, 1);
    assert_eq!(report.matrix.true_negatives, 1);
    assert_eq!(report.metrics.f1, 1.0);

    // moving the threshold above both scores re-derives metrics without rescoring
    let strict = session.update_threshold(0.99);
    assert_eq!(strict.matrix.false_negatives, 1);
    assert_eq!(strict.metrics.recall, 0.0);
    assert!(session.is_latest(&strict));

    let predictions = predict(&model, &prepared.test).unwrap();
    let (sub, _) = export_predictions(dir.path().join("out"), &predictions, config.threshold).unwrap();
    assert_eq!(
        std::fs::read_to_string(sub).unwrap(),
        "PassengerId,Survived\n892,0\n893,1\n894,0\n"
    );
}

#[test]
fn model_with_wrong_width_fails_scoring() {
    let dir = tempfile::tempdir().unwrap();
    let train = write(dir.path(), "train.csv", TRAIN);
    let config = PipelineConfig {
        add_family_features: true,
        ..PipelineConfig::default()
    };
    let prepared = prepare_files(&train, None, &config).unwrap();
    let model = sex_model(12);
    assert!(score_validation(&model, &prepared.validation).is_err());
}
