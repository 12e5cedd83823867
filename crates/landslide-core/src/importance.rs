//! Append-only result tables produced by the scenario driver.
use serde::{Deserialize, Serialize};

/// Contribution of one predictor for a (scenario, day) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImportanceRecord {
    pub scenario: String,
    pub day: usize,
    pub variable: String,
    pub importance: f64,
}

/// Mean susceptibility of one LULC class for a (scenario, day) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InfluenceRecord {
    pub scenario: String,
    pub day: usize,
    #[serde(rename = "LULC_Class")]
    pub lulc_class: String,
    pub influence: f64,
}

/// `weight · mean(normalized layer) · scenario factor`.
pub fn variable_importance(weight: f32, normalized_mean: f64, factor: f32) -> f64 {
    weight as f64 * normalized_mean * factor as f64
}

/// Ordered, append-only collection of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table<R> {
    records: Vec<R>,
}

pub type ImportanceTable = Table<ImportanceRecord>;
pub type InfluenceTable = Table<InfluenceRecord>;

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self { records: Vec::new() }
    }
}

impl<R> Table<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: R) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ImportanceTable {
    /// Records for one scenario, in insertion order.
    pub fn for_scenario<'a>(&'a self, scenario: &'a str) -> impl Iterator<Item = &'a ImportanceRecord> + 'a {
        self.records.iter().filter(move |r| r.scenario == scenario)
    }
}

impl InfluenceTable {
    /// Records for one scenario, in insertion order.
    pub fn for_scenario<'a>(&'a self, scenario: &'a str) -> impl Iterator<Item = &'a InfluenceRecord> + 'a {
        self.records.iter().filter(move |r| r.scenario == scenario)
    }
}
