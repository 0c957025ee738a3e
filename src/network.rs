//! Pretrained feed-forward scorer with gzipped JSON persistence.
//!
//! The network only runs forward: weights come from a `.pere` model file
//! (or are built programmatically) and the single sigmoid output is read as
//! the survival probability.
use crate::activations::{ActivationKind, ReLU, Sigmoid};
use crate::layers::{DenseLayer, Matrix};
use anyhow::{anyhow, Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use std::sync::Arc;

/// Anything that maps an encoded feature row to a probability in [0, 1].
pub trait Scorer {
    fn score(&self, features: &[f64]) -> Result<f64>;

    fn score_all(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|row| self.score(row)).collect()
    }
}

/// MLP
#[derive(Debug, Clone)]
pub struct MLP {
    /// Ordered list of dense layers from input to output.
    layers: Vec<DenseLayer>,
    /// Number of input features.
    input_size: usize,
}

impl MLP {
    /// Randomly initialised network with ReLU hidden layers and one sigmoid
    /// output unit.
    pub fn random<R: Rng + ?Sized>(input_size: usize, hidden_sizes: &[usize], rng: &mut R) -> Self {
        let mut layers = Vec::with_capacity(hidden_sizes.len() + 1);
        let mut prev = input_size;
        for &size in hidden_sizes {
            layers.push(DenseLayer::random(prev, size, Arc::new(ReLU), rng));
            prev = size;
        }
        layers.push(DenseLayer::random(prev, 1, Arc::new(Sigmoid), rng));
        Self { layers, input_size }
    }

    /// Assemble a network from layers, checking that consecutive shapes
    /// chain and that the last layer has exactly one output.
    pub fn from_layers(layers: Vec<DenseLayer>) -> Result<Self> {
        let first = layers.first().ok_or_else(|| anyhow!("network has no layers"))?;
        let input_size = first.input_size();
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(anyhow!(
                    "layer {} outputs {} values but layer {} expects {}",
                    i + 1,
                    pair[0].output_size(),
                    i + 2,
                    pair[1].input_size()
                ));
            }
        }
        let out = layers.last().map_or(0, DenseLayer::output_size);
        if out != 1 {
            return Err(anyhow!("scoring network must end in 1 output, found {}", out));
        }
        Ok(Self { layers, input_size })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub fn param_count(&self) -> usize {
        self.layers.iter().map(DenseLayer::param_count).sum()
    }

    /// Forward pass from input to output.
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.layers
            .iter()
            .fold(input.to_vec(), |current, layer| layer.forward(&current))
    }

    /// Save model to .pere (gzipped JSON).
    pub fn save_pere(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_vec(&MlpDto::from_mlp(self))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut enc = GzEncoder::new(file, Compression::default());
        enc.write_all(&json)?;
        enc.finish()?;
        tracing::info!(path = %path.display(), params = self.param_count(), "model saved");
        Ok(())
    }

    /// Load model from .pere (gzipped JSON)
    pub fn load_pere(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening model {}", path.display()))?;
        let dto: MlpDto = serde_json::from_reader(GzDecoder::new(BufReader::new(file)))
            .with_context(|| format!("decoding model {}", path.display()))?;
        let mlp = dto.into_mlp()?;
        tracing::info!(path = %path.display(), params = mlp.param_count(), "model loaded");
        Ok(mlp)
    }
}

impl Scorer for MLP {
    fn score(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.input_size {
            return Err(anyhow!(
                "model expects {} features, row has {}",
                self.input_size,
                features.len()
            ));
        }
        self.forward(features)
            .first()
            .copied()
            .ok_or_else(|| anyhow!("network produced no output"))
    }
}

impl fmt::Display for MLP {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MLP ({} inputs)", self.input_size)?;
        for (i, layer) in self.layers.iter().enumerate() {
            writeln!(
                f,
                "  Layer {}: Dense {:?} out={} params={}",
                i + 1,
                layer.activation.kind(),
                layer.output_size(),
                layer.param_count()
            )?;
        }
        write!(f, "  Total params: {}", self.param_count())
    }
}

// ============ Persistence DTOs ============

#[derive(Debug, Serialize, Deserialize)]
struct LayerDto {
    weights: Matrix, // [output_size][input_size]
    bias: Vec<f64>,  // [output_size]
    activation: ActivationKind,
}

#[derive(Debug, Serialize, Deserialize)]
struct MlpDto {
    input_size: usize,
    layers: Vec<LayerDto>,
}

impl MlpDto {
    fn from_mlp(mlp: &MLP) -> Self {
        // JSON has no NaN/inf
        fn sanitize(v: &[f64]) -> Vec<f64> {
            v.iter().map(|&x| if x.is_finite() { x } else { 0.0 }).collect()
        }
        let layers = mlp
            .layers
            .iter()
            .map(|layer| LayerDto {
                weights: layer.weights.iter().map(|row| sanitize(row)).collect(),
                bias: sanitize(&layer.bias),
                activation: layer.activation.kind(),
            })
            .collect();
        Self {
            input_size: mlp.input_size,
            layers,
        }
    }

    fn into_mlp(self) -> Result<MLP> {
        let layers = self
            .layers
            .into_iter()
            .map(|ld| DenseLayer::from_parts(ld.weights, ld.bias, ld.activation.to_arc()))
            .collect::<Result<Vec<_>>>()?;
        let mlp = MLP::from_layers(layers)?;
        if mlp.input_size != self.input_size {
            return Err(anyhow!(
                "model header declares {} inputs but first layer takes {}",
                self.input_size,
                mlp.input_size
            ));
        }
        Ok(mlp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activations::Linear;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn logistic(weights: Vec<f64>, bias: f64) -> MLP {
        let layer = DenseLayer::from_parts(vec![weights], vec![bias], Arc::new(Sigmoid)).unwrap();
        MLP::from_layers(vec![layer]).unwrap()
    }

    #[test]
    fn scores_are_probabilities() {
        let mut rng = StdRng::seed_from_u64(42);
        let mlp = MLP::random(12, &[16], &mut rng);
        assert_eq!(mlp.param_count(), 12 * 16 + 16 + 16 + 1);
        let p = mlp.score(&vec![0.3; 12]).unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn logistic_unit_matches_closed_form() {
        let mlp = logistic(vec![2.0, -1.0], 0.5);
        let p = mlp.score(&[1.0, 1.0]).unwrap();
        assert!((p - 1.0 / (1.0 + (-1.5f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn wrong_feature_count_is_an_error() {
        let mlp = logistic(vec![1.0, 1.0], 0.0);
        assert!(mlp.score(&[1.0]).is_err());
    }

    #[test]
    fn rejects_unchained_or_multi_output_layers() {
        let a = DenseLayer::from_parts(vec![vec![1.0, 1.0]; 3], vec![0.0; 3], Arc::new(ReLU)).unwrap();
        let b = DenseLayer::from_parts(vec![vec![1.0, 1.0]], vec![0.0], Arc::new(Sigmoid)).unwrap();
        assert!(MLP::from_layers(vec![a, b]).is_err());
        let two = DenseLayer::from_parts(vec![vec![1.0]; 2], vec![0.0; 2], Arc::new(Linear)).unwrap();
        assert!(MLP::from_layers(vec![two]).is_err());
        assert!(MLP::from_layers(Vec::new()).is_err());
    }

    #[test]
    fn pere_file_preserves_scores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models/titanic.pere");
        let mut rng = StdRng::seed_from_u64(3);
        let mlp = MLP::random(5, &[4, 3], &mut rng);
        mlp.save_pere(&path).unwrap();
        let loaded = MLP::load_pere(&path).unwrap();
        let row = [0.1, -0.4, 1.2, 0.0, 2.0];
        assert!((mlp.score(&row).unwrap() - loaded.score(&row).unwrap()).abs() < 1e-12);
        assert!(loaded.to_string().contains("Total params"));
    }
}
