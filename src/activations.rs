//! Activation functions used by the scoring network.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Element-wise activation applied after a dense layer's affine map.
pub trait Activation: fmt::Debug + Send + Sync {
    fn apply(&self, x: f64) -> f64;
    fn kind(&self) -> ActivationKind;
}

/// ReLU: max(0, x)
#[derive(Debug, Clone, Copy, Default)]
pub struct ReLU;

impl Activation for ReLU {
    fn apply(&self, x: f64) -> f64 {
        x.max(0.0)
    }
    fn kind(&self) -> ActivationKind {
        ActivationKind::ReLU
    }
}

/// Sigmoid: 1 / (1 + exp(-x)), the output unit that turns a logit into a
/// survival probability.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sigmoid;

impl Activation for Sigmoid {
    fn apply(&self, x: f64) -> f64 {
        // split on sign so exp never overflows
        if x >= 0.0 {
            1.0 / (1.0 + (-x).exp())
        } else {
            let e = x.exp();
            e / (1.0 + e)
        }
    }
    fn kind(&self) -> ActivationKind {
        ActivationKind::Sigmoid
    }
}

/// Linear: identity
#[derive(Debug, Clone, Copy, Default)]
pub struct Linear;

impl Activation for Linear {
    fn apply(&self, x: f64) -> f64 {
        x
    }
    fn kind(&self) -> ActivationKind {
        ActivationKind::Linear
    }
}

/// Serializable activation tag stored in model files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivationKind {
    ReLU,
    Sigmoid,
    Linear,
}

impl ActivationKind {
    pub fn to_arc(self) -> Arc<dyn Activation> {
        match self {
            ActivationKind::ReLU => Arc::new(ReLU),
            ActivationKind::Sigmoid => Arc::new(Sigmoid),
            ActivationKind::Linear => Arc::new(Linear),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert!((Sigmoid.apply(0.0) - 0.5).abs() < 1e-12);
        assert_eq!(Sigmoid.apply(-1000.0), 0.0);
        assert_eq!(Sigmoid.apply(1000.0), 1.0);
        assert!(Sigmoid.apply(-745.0).is_finite());
    }

    #[test]
    fn kinds_round_trip_through_arc() {
        for kind in [ActivationKind::ReLU, ActivationKind::Sigmoid, ActivationKind::Linear] {
            assert_eq!(kind.to_arc().kind(), kind);
        }
        assert_eq!(ReLU.apply(-1.0), 0.0);
        assert_eq!(Linear.apply(-1.0), -1.0);
    }
}
