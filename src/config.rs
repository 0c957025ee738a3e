//! Pipeline configuration: dataset schema, split, threshold and the
//! categorical vocabularies used for one-hot encoding.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Category lists for the one-hot encoded columns. A value not in its list
/// encodes as all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabularies {
    pub pclass: Vec<u8>,
    pub sex: Vec<String>,
    pub embarked: Vec<String>,
}

impl Default for Vocabularies {
    fn default() -> Self {
        Self {
            pclass: vec![1, 2, 3],
            sex: vec!["male".into(), "female".into()],
            embarked: vec!["C".into(), "Q".into(), "S".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub target_column: String,
    pub id_column: String,
    /// Trailing share of training rows held out for validation.
    pub validation_fraction: f64,
    /// Shuffle rows with this seed before splitting; `None` keeps file order.
    pub shuffle_seed: Option<u64>,
    pub threshold: f64,
    /// Append `family_size` and `is_alone`.
    pub add_family_features: bool,
    pub vocabularies: Vocabularies,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_column: "Survived".into(),
            id_column: "PassengerId".into(),
            validation_fraction: 0.2,
            shuffle_seed: None,
            threshold: 0.5,
            add_family_features: false,
            vocabularies: Vocabularies::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.validation_fraction > 0.0 && self.validation_fraction < 1.0) {
            return Err(anyhow!(
                "validation_fraction must be in (0, 1), got {}",
                self.validation_fraction
            ));
        }
        if !self.threshold.is_finite() {
            return Err(anyhow!("threshold must be finite"));
        }
        let v = &self.vocabularies;
        if v.pclass.is_empty() || v.sex.is_empty() || v.embarked.is_empty() {
            return Err(anyhow!("categorical vocabularies must not be empty"));
        }
        Ok(())
    }
}
