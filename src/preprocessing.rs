//! Imputation statistics, feature encoding and the train/validation split.
//!
//! Statistics are fitted on training rows only and then applied unchanged
//! to validation and test rows.
use crate::config::{PipelineConfig, Vocabularies};
use crate::datasets::Passenger;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

/// Median of the present values; 0 when there are none.
pub fn median(values: &[Option<f64>]) -> f64 {
    let mut v: Vec<f64> = values.iter().flatten().copied().collect();
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(f64::total_cmp);
    let h = v.len() / 2;
    if v.len() % 2 == 1 {
        v[h]
    } else {
        (v[h - 1] + v[h]) / 2.0
    }
}

/// Population standard deviation of the present values. Falls back to 1
/// when there are no values or no spread, so it can always divide.
pub fn std_dev(values: &[Option<f64>]) -> f64 {
    let v: Vec<f64> = values.iter().flatten().copied().collect();
    if v.is_empty() {
        return 1.0;
    }
    let n = v.len() as f64;
    let mean = v.iter().sum::<f64>() / n;
    let var = v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let sd = var.sqrt();
    if sd.is_finite() && sd > 0.0 {
        sd
    } else {
        1.0
    }
}

/// Most frequent present value. On ties the value that first reached the
/// winning count is kept.
pub fn mode<T: Clone + Eq + Hash>(values: &[Option<T>]) -> Option<T> {
    let mut counts: HashMap<&T, usize> = HashMap::new();
    let mut best: Option<&T> = None;
    let mut best_count = 0;
    for value in values.iter().flatten() {
        let c = counts.entry(value).or_insert(0);
        *c += 1;
        if *c > best_count {
            best_count = *c;
            best = Some(value);
        }
    }
    best.cloned()
}

fn one_hot<T: PartialEq>(value: Option<&T>, categories: &[T]) -> impl Iterator<Item = f64> {
    let hit = value.and_then(|v| categories.iter().position(|c| c == v));
    (0..categories.len()).map(move |i| if Some(i) == hit { 1.0 } else { 0.0 })
}

/// Turns a [`Passenger`] into a numeric feature row:
/// `[z_age, z_fare, sib_sp, parch] ++ onehot(pclass) ++ onehot(sex) ++
/// onehot(embarked)`, optionally followed by `family_size, is_alone`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureEncoder {
    pub age_median: f64,
    pub age_std: f64,
    pub fare_median: f64,
    pub fare_std: f64,
    pub embarked_mode: Option<String>,
    pub vocabularies: Vocabularies,
    pub add_family_features: bool,
}

impl FeatureEncoder {
    pub fn fit(train: &[Passenger], config: &PipelineConfig) -> Self {
        let ages: Vec<Option<f64>> = train.iter().map(|p| p.age).collect();
        let fares: Vec<Option<f64>> = train.iter().map(|p| p.fare).collect();
        let embarked: Vec<Option<String>> = train.iter().map(|p| p.embarked.clone()).collect();
        let encoder = Self {
            age_median: median(&ages),
            age_std: std_dev(&ages),
            fare_median: median(&fares),
            fare_std: std_dev(&fares),
            embarked_mode: mode(&embarked),
            vocabularies: config.vocabularies.clone(),
            add_family_features: config.add_family_features,
        };
        tracing::debug!(?encoder, "feature encoder fitted");
        encoder
    }

    pub fn feature_names(&self) -> Vec<String> {
        let v = &self.vocabularies;
        let mut names: Vec<String> = ["age_z", "fare_z", "sib_sp", "parch"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        names.extend(v.pclass.iter().map(|c| format!("pclass_{}", c)));
        names.extend(v.sex.iter().map(|c| format!("sex_{}", c)));
        names.extend(v.embarked.iter().map(|c| format!("embarked_{}", c)));
        if self.add_family_features {
            names.push("family_size".into());
            names.push("is_alone".into());
        }
        names
    }

    pub fn feature_count(&self) -> usize {
        let v = &self.vocabularies;
        4 + v.pclass.len() + v.sex.len() + v.embarked.len() + if self.add_family_features { 2 } else { 0 }
    }

    pub fn encode(&self, p: &Passenger) -> Vec<f64> {
        let age = p.age.unwrap_or(self.age_median);
        let fare = p.fare.unwrap_or(self.fare_median);
        let embarked = p.embarked.as_ref().or(self.embarked_mode.as_ref());
        let sib_sp = f64::from(p.sib_sp.unwrap_or(0));
        let parch = f64::from(p.parch.unwrap_or(0));

        let mut row = Vec::with_capacity(self.feature_count());
        row.push((age - self.age_median) / self.age_std);
        row.push((fare - self.fare_median) / self.fare_std);
        row.push(sib_sp);
        row.push(parch);
        row.extend(one_hot(p.pclass.as_ref(), &self.vocabularies.pclass));
        row.extend(one_hot(p.sex.as_ref(), &self.vocabularies.sex));
        row.extend(one_hot(embarked, &self.vocabularies.embarked));
        if self.add_family_features {
            let family_size = sib_sp + parch + 1.0;
            row.push(family_size);
            row.push(if family_size == 1.0 { 1.0 } else { 0.0 });
        }
        row
    }
}

/// Split rows into `(train, validation)`: the trailing `fraction` goes to
/// validation, at index `floor(n * (1 - fraction))`. With a seed the rows
/// are shuffled first.
pub fn train_validation_split<T>(mut rows: Vec<T>, fraction: f64, seed: Option<u64>) -> (Vec<T>, Vec<T>) {
    if let Some(seed) = seed {
        rows.shuffle(&mut StdRng::seed_from_u64(seed));
    }
    let split = ((rows.len() as f64) * (1.0 - fraction)).floor() as usize;
    let validation = rows.split_off(split.min(rows.len()));
    (rows, validation)
}
