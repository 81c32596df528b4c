//! Normalized result records
//!
//! Both extraction paths (structured output file and console summary)
//! produce a [`ResultRecord`] so pollers see one shape regardless of
//! where the numbers came from. The [`Provenance`] tag is the only way
//! to tell a measured series from a simulated one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Summary statistics for one metric
///
/// Absent fields were not computed; they are never an implicit zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub med: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p90: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p95: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p99: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<f64>,
    /// Derived per-second rate, or a unit fraction for rate-style metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub succeeded: Option<f64>,
}

impl MetricStats {
    pub fn is_empty(&self) -> bool {
        *self == MetricStats::default()
    }
}

/// Where a record's time series came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Data points read from the runner's structured output
    Measured,
    /// Points simulated around the console summary averages
    Synthetic,
}

/// Index-aligned series keyed by metric name
///
/// Serializes as `{ "timestamps": [...], "<metric>": [...], ... }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    timestamps: Vec<f64>,
    #[serde(flatten)]
    series: BTreeMap<String, Vec<Option<f64>>>,
}

/// A series whose length does not match the timestamp axis
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("series '{name}' has {actual} points, expected {expected}")]
pub struct SeriesLengthMismatch {
    pub name: String,
    pub expected: usize,
    pub actual: usize,
}

impl TimeSeries {
    pub const TIMESTAMPS_KEY: &'static str = "timestamps";

    /// Creates an empty series set over the given (ascending) timestamps
    pub fn new(timestamps: Vec<f64>) -> Self {
        Self {
            timestamps,
            series: BTreeMap::new(),
        }
    }

    /// Adds a named series; its length must equal the timestamp count
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), SeriesLengthMismatch> {
        let name = name.into();
        if values.len() != self.timestamps.len() {
            return Err(SeriesLengthMismatch {
                name,
                expected: self.timestamps.len(),
                actual: values.len(),
            });
        }
        self.series.insert(name, values);
        Ok(())
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn get(&self, name: &str) -> Option<&[Option<f64>]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// True when every series has one value per timestamp
    ///
    /// Always holds for values built through [`TimeSeries::insert`]; checked
    /// again for records that arrived over the wire.
    pub fn is_aligned(&self) -> bool {
        self.series.values().all(|v| v.len() == self.timestamps.len())
    }
}

/// Normalized metrics and time series for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub metrics: BTreeMap<String, MetricStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_series: Option<TimeSeries>,
    pub provenance: Provenance,
}

impl ResultRecord {
    pub fn new(provenance: Provenance) -> Self {
        Self {
            metrics: BTreeMap::new(),
            time_series: None,
            provenance,
        }
    }
}
