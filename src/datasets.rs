//! Titanic CSV loading and dataset inspection.
use crate::config::PipelineConfig;
use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One passenger row. Every field except the id may be absent; the test
/// file has no survival label at all.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Passenger {
    pub passenger_id: String,
    pub survived: Option<u8>,
    pub pclass: Option<u8>,
    pub sex: Option<String>,
    pub age: Option<f64>,
    pub sib_sp: Option<u32>,
    pub parch: Option<u32>,
    pub fare: Option<f64>,
    pub embarked: Option<String>,
}

/// Parsed CSV: header names, blank-cell count per column, the raw rows and
/// the typed passengers built from them.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub missing: Vec<usize>,
    pub records: Vec<StringRecord>,
    pub passengers: Vec<Passenger>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.passengers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passengers.is_empty()
    }

    /// The first `n` rows with every column, blank cells as `None`.
    pub fn preview(&self, n: usize) -> Preview<'_> {
        let rows = self
            .records
            .iter()
            .take(n)
            .map(|r| r.iter().map(|v| Some(v).filter(|v| !v.is_empty())).collect())
            .collect();
        Preview {
            columns: &self.columns,
            rows,
        }
    }
}

/// Leading rows of a dataset, displayed as an aligned table with `NULL`
/// for missing cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview<'a> {
    pub columns: &'a [String],
    pub rows: Vec<Vec<Option<&'a str>>>,
}

impl fmt::Display for Preview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = |cell: &Option<&str>| cell.unwrap_or("NULL").chars().count();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(width)
                    .fold(c.chars().count(), usize::max)
            })
            .collect();
        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{:<w$}", c, w = w))
            .collect();
        writeln!(f, "{}", header.join(" | ").trim_end())?;
        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{:<w$}", c.unwrap_or("NULL"), w = w))
                .collect();
            writeln!(f, "{}", cells.join(" | ").trim_end())?;
        }
        Ok(())
    }
}

/// Column positions resolved from the header row.
struct Columns {
    id: usize,
    target: Option<usize>,
    pclass: Option<usize>,
    sex: Option<usize>,
    age: Option<usize>,
    sib_sp: Option<usize>,
    parch: Option<usize>,
    fare: Option<usize>,
    embarked: Option<usize>,
}

impl Columns {
    fn resolve(headers: &[String], config: &PipelineConfig) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        Ok(Self {
            id: find(&config.id_column)
                .ok_or_else(|| anyhow!("missing id column {:?}", config.id_column))?,
            target: find(&config.target_column),
            pclass: find("Pclass"),
            sex: find("Sex"),
            age: find("Age"),
            sib_sp: find("SibSp"),
            parch: find("Parch"),
            fare: find("Fare"),
            embarked: find("Embarked"),
        })
    }
}

fn cell<'r>(record: &'r StringRecord, idx: Option<usize>) -> Option<&'r str> {
    idx.and_then(|i| record.get(i)).filter(|v| !v.is_empty())
}

fn parse_f64(record: &StringRecord, idx: Option<usize>, name: &str, line: u64) -> Result<Option<f64>> {
    cell(record, idx)
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| anyhow!("line {}: {} is not a number: {:?}", line, name, v))
        })
        .transpose()
}

fn parse_count(record: &StringRecord, idx: Option<usize>, name: &str, line: u64) -> Result<Option<u32>> {
    match parse_f64(record, idx, name, line)? {
        Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(Some(v as u32)),
        Some(v) => Err(anyhow!("line {}: {} must be a whole number, got {}", line, name, v)),
        None => Ok(None),
    }
}

fn parse_label(record: &StringRecord, idx: Option<usize>, line: u64) -> Result<Option<u8>> {
    match parse_f64(record, idx, "label", line)? {
        Some(v) if v == 0.0 || v == 1.0 => Ok(Some(v as u8)),
        Some(v) => Err(anyhow!("line {}: label must be 0 or 1, got {}", line, v)),
        None => Ok(None),
    }
}

/// Parse a Titanic CSV. Quoted fields and CRLF are handled by the reader;
/// a leading BOM is dropped; rows whose field count differs from the header
/// are skipped.
pub fn parse_passengers<R: Read>(reader: R, config: &PipelineConfig) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let columns: Vec<String> = rdr
        .headers()
        .context("reading CSV header")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let cols = Columns::resolve(&columns, config)?;

    let mut missing = vec![0usize; columns.len()];
    let mut passengers = Vec::new();
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result.context("CSV parse error")?;
        let line = record.position().map_or(0, |p| p.line());
        if record.len() != columns.len() {
            skipped += 1;
            tracing::warn!(line, fields = record.len(), expected = columns.len(), "skipping malformed row");
            continue;
        }
        for (count, value) in missing.iter_mut().zip(record.iter()) {
            if value.is_empty() {
                *count += 1;
            }
        }
        let passenger_id = cell(&record, Some(cols.id))
            .ok_or_else(|| anyhow!("line {}: missing {}", line, config.id_column))?
            .to_string();
        passengers.push(Passenger {
            passenger_id,
            survived: parse_label(&record, cols.target, line)?,
            pclass: parse_count(&record, cols.pclass, "Pclass", line)?
                .map(|c| u8::try_from(c).map_err(|_| anyhow!("line {}: Pclass out of range", line)))
                .transpose()?,
            sex: cell(&record, cols.sex).map(str::to_string),
            age: parse_f64(&record, cols.age, "Age", line)?,
            sib_sp: parse_count(&record, cols.sib_sp, "SibSp", line)?,
            parch: parse_count(&record, cols.parch, "Parch", line)?,
            fare: parse_f64(&record, cols.fare, "Fare", line)?,
            embarked: cell(&record, cols.embarked).map(str::to_string),
        });
        records.push(record);
    }
    if passengers.is_empty() {
        return Err(anyhow!("no passenger rows loaded"));
    }
    tracing::info!(rows = passengers.len(), skipped, columns = columns.len(), "passengers parsed");
    Ok(Dataset {
        columns,
        missing,
        records,
        passengers,
    })
}

/// Load a Titanic CSV from disk.
pub fn load_passengers(path: impl AsRef<Path>, config: &PipelineConfig) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    parse_passengers(file, config).with_context(|| format!("loading {}", path.display()))
}

#[derive(Debug, Deserialize)]
struct ScoreRecord {
    label: u8,
    probability: f64,
}

/// Read a cached `label,probability` CSV, as written after an inference run.
pub fn parse_labeled_scores<R: Read>(reader: R) -> Result<(Vec<u8>, Vec<f64>)> {
    let mut rdr = ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);
    let mut labels = Vec::new();
    let mut scores = Vec::new();
    for result in rdr.deserialize() {
        let record: ScoreRecord = result.context("reading label,probability row")?;
        labels.push(record.label);
        scores.push(record.probability);
    }
    Ok((labels, scores))
}

pub fn load_labeled_scores(path: impl AsRef<Path>) -> Result<(Vec<u8>, Vec<f64>)> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    parse_labeled_scores(file).with_context(|| format!("loading {}", path.display()))
}

/// Survivors out of passengers with a known label in one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GroupRate {
    pub survived: usize,
    pub total: usize,
}

impl GroupRate {
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.survived as f64 / self.total as f64
        }
    }
}

/// Shape, survival rate, missing-value share and survival by group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub survivors: usize,
    /// Missing percentage per column, in header order.
    pub missing_pct: Vec<(String, f64)>,
    pub by_sex: BTreeMap<String, GroupRate>,
    pub by_pclass: BTreeMap<u8, GroupRate>,
}

impl DatasetSummary {
    pub fn from_dataset(data: &Dataset) -> Self {
        let rows = data.len();
        let pct = |n: usize| if rows == 0 { 0.0 } else { n as f64 / rows as f64 * 100.0 };
        let mut by_sex: BTreeMap<String, GroupRate> = BTreeMap::new();
        let mut by_pclass: BTreeMap<u8, GroupRate> = BTreeMap::new();
        for p in &data.passengers {
            let Some(label) = p.survived else { continue };
            if let Some(sex) = &p.sex {
                let g = by_sex.entry(sex.clone()).or_default();
                g.total += 1;
                g.survived += usize::from(label);
            }
            if let Some(class) = p.pclass {
                let g = by_pclass.entry(class).or_default();
                g.total += 1;
                g.survived += usize::from(label);
            }
        }
        Self {
            rows,
            columns: data.columns.len(),
            survivors: data.passengers.iter().filter(|p| p.survived == Some(1)).count(),
            missing_pct: data
                .columns
                .iter()
                .cloned()
                .zip(data.missing.iter().map(|&m| pct(m)))
                .collect(),
            by_sex,
            by_pclass,
        }
    }

    pub fn survival_rate(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.survivors as f64 / self.rows as f64
        }
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shape: {} x {}", self.rows, self.columns)?;
        writeln!(
            f,
            "Survival rate: {}/{} ({:.2}%)",
            self.survivors,
            self.rows,
            self.survival_rate() * 100.0
        )?;
        writeln!(f, "\nMissing Values (%):")?;
        for (col, pct) in &self.missing_pct {
            writeln!(f, "  {:<12} {:>6.2}%", col, pct)?;
        }
        writeln!(f, "\nSurvival by Sex:")?;
        for (sex, g) in &self.by_sex {
            writeln!(f, "  {:<12} {:>6.2}% ({}/{})", sex, g.rate() * 100.0, g.survived, g.total)?;
        }
        writeln!(f, "\nSurvival by Passenger Class:")?;
        for (class, g) in &self.by_pclass {
            writeln!(
                f,
                "  Class {:<6} {:>6.2}% ({}/{})",
                class,
                g.rate() * 100.0,
                g.survived,
                g.total
            )?;
        }
        Ok(())
    }
}
