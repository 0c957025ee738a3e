//! Titanic survival scoring with a threshold-driven evaluation engine.
//!
//! - Evaluation engine: confusion matrix, accuracy/precision/recall/F1 at a
//!   movable threshold, and a 101-point ROC curve with trapezoidal AUC, all
//!   re-derived from cached validation scores
//! - Titanic CSV loading, inspection, imputation and one-hot encoding
//! - Pretrained MLP scorer (forward pass, gzipped JSON model files)
//! - Submission / probability CSV export

pub mod activations;
pub mod config;
pub mod datasets;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod pipeline;
pub mod preprocessing;
pub mod utils;

pub use activations::{Activation, ActivationKind, Linear, ReLU, Sigmoid};
pub use config::{PipelineConfig, Vocabularies};
pub use datasets::{load_labeled_scores, load_passengers, parse_labeled_scores, parse_passengers, Dataset, DatasetSummary, Passenger, Preview};
pub use error::EvalError;
pub use evaluation::{EvaluationContext, EvaluationSession, ThresholdReport};
pub use export::{export_predictions, write_labeled_scores, write_roc_points, Prediction};
pub use layers::DenseLayer;
pub use loss::binary_cross_entropy;
pub use metrics::{classify, ConfusionMatrix, LabeledScore, MetricsReport, RocCurve, RocPoint, ROC_STEPS};
pub use network::{Scorer, MLP};
pub use pipeline::{predict, prepare, prepare_files, score_validation, EncodedRow, PreparedData};
pub use preprocessing::{train_validation_split, FeatureEncoder};
pub use utils::generate_synthetic_scores;
