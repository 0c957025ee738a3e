//! Dense layer: weights, bias and an activation, forward pass only.
use crate::activations::Activation;
use anyhow::{anyhow, Result};
use rand::Rng;
use std::sync::Arc;

/// Row-major matrix, `[output][input]`.
pub type Matrix = Vec<Vec<f64>>;

/// A fully-connected layer computing `act(W·x + b)`.
#[derive(Debug, Clone)]
pub struct DenseLayer {
    pub weights: Matrix,
    pub bias: Vec<f64>,
    pub activation: Arc<dyn Activation>,
}

impl DenseLayer {
    /// He (Kaiming) uniform initialisation with a small positive bias.
    pub fn random<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Arc<dyn Activation>,
        rng: &mut R,
    ) -> Self {
        // U(-sqrt(6/fan_in), sqrt(6/fan_in))
        let limit = (6.0f64 / input_size.max(1) as f64).sqrt();
        let weights: Matrix = (0..output_size)
            .map(|_| (0..input_size).map(|_| rng.gen_range(-limit..limit)).collect())
            .collect();
        Self {
            weights,
            bias: vec![0.01; output_size],
            activation,
        }
    }

    /// Build a layer from explicit parameters, checking that every weight
    /// row has the same width and that there is one bias per row.
    pub fn from_parts(weights: Matrix, bias: Vec<f64>, activation: Arc<dyn Activation>) -> Result<Self> {
        if weights.len() != bias.len() {
            return Err(anyhow!(
                "layer has {} weight rows but {} biases",
                weights.len(),
                bias.len()
            ));
        }
        if let Some(first) = weights.first() {
            if weights.iter().any(|row| row.len() != first.len()) {
                return Err(anyhow!("ragged weight matrix"));
            }
        }
        Ok(Self {
            weights,
            bias,
            activation,
        })
    }

    pub fn input_size(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    pub fn output_size(&self) -> usize {
        self.bias.len()
    }

    pub fn param_count(&self) -> usize {
        self.output_size() * self.input_size() + self.output_size()
    }

    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, &b)| {
                let z = row.iter().zip(input).map(|(&w, &x)| w * x).sum::<f64>() + b;
                self.activation.apply(z)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activations::{Linear, ReLU};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn forward_is_affine_then_activation() {
        let layer = DenseLayer::from_parts(
            vec![vec![1.0, -1.0], vec![0.5, 0.5]],
            vec![0.0, -2.0],
            Arc::new(ReLU),
        )
        .unwrap();
        assert_eq!(layer.forward(&[3.0, 1.0]), vec![2.0, 0.0]);
        assert_eq!(layer.param_count(), 6);
    }

    #[test]
    fn rejects_mismatched_bias() {
        let err = DenseLayer::from_parts(vec![vec![1.0]], vec![0.0, 0.0], Arc::new(Linear));
        assert!(err.is_err());
        let ragged = DenseLayer::from_parts(vec![vec![1.0], vec![1.0, 2.0]], vec![0.0, 0.0], Arc::new(Linear));
        assert!(ragged.is_err());
    }

    #[test]
    fn random_init_respects_he_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = DenseLayer::random(6, 4, Arc::new(ReLU), &mut rng);
        assert_eq!((layer.input_size(), layer.output_size()), (6, 4));
        assert!(layer.weights.iter().flatten().all(|w| w.abs() <= 1.0));
    }
}
