//! Structured output extraction
//!
//! Reads the document the runner writes with `--out json=...`:
//!
//! ```json
//! {
//!   "metrics": { "http_req_duration": { "avg": 12.1, "p(95)": 30.2, "count": 50, "duration": 10000 } },
//!   "time_series": [ { "metric": "http_req_duration", "value": 11.0, "timestamp": 1000 } ]
//! }
//! ```

use chrono::DateTime;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::results::{MetricStats, Provenance, ResultRecord, TimeSeries};

/// Recognized statistic names and the spellings accepted for each
const STAT_KEYS: &[(&str, &[&str])] = &[
    ("avg", &["avg"]),
    ("min", &["min"]),
    ("max", &["max"]),
    ("med", &["med"]),
    ("p90", &["p90", "p(90)"]),
    ("p95", &["p95", "p(95)"]),
    ("p99", &["p99", "p(99)"]),
    ("count", &["count"]),
    ("rate", &["rate"]),
];

#[derive(Debug, Error)]
enum WalkError {
    #[error("'{0}' is not an object")]
    NotAnObject(String),

    #[error("'time_series' is not an array")]
    NotAnArray,

    #[error("data point {index} is malformed: {reason}")]
    BadPoint { index: usize, reason: &'static str },
}

/// Builds a record from a parsed structured output document
///
/// Unreadable metrics and statistics are skipped. A malformed data point
/// ends the series walk, keeping the points read before it.
pub fn from_structured_output(doc: &Value) -> ResultRecord {
    let mut record = ResultRecord::new(Provenance::Measured);

    if let Err(e) = walk(doc, &mut record) {
        warn!("Structured output only partially read: {}", e);
    }

    debug!(
        "Extracted {} metric(s) from structured output",
        record.metrics.len()
    );
    record
}

fn walk(doc: &Value, record: &mut ResultRecord) -> Result<(), WalkError> {
    if let Some(metrics) = doc.get("metrics") {
        let metrics = metrics
            .as_object()
            .ok_or_else(|| WalkError::NotAnObject("metrics".to_string()))?;

        for (name, entry) in metrics {
            match read_metric(name, entry) {
                Some(stats) => {
                    record.metrics.insert(name.clone(), stats);
                }
                None => debug!("Skipping metric '{}': not an object", name),
            }
        }
    }

    if let Some(points) = doc.get("time_series") {
        let points = points.as_array().ok_or(WalkError::NotAnArray)?;

        let mut builder = SeriesBuilder::default();
        let walked = points
            .iter()
            .enumerate()
            .try_for_each(|(index, point)| builder.push(index, point));
        record.time_series = builder.finish();
        walked?;
    }

    Ok(())
}

fn read_metric(name: &str, entry: &Value) -> Option<MetricStats> {
    let entry = entry.as_object()?;

    // Summary exports nest the numbers under "values".
    let values = match entry.get("values").and_then(Value::as_object) {
        Some(values) => values,
        None => entry,
    };

    let mut stats = MetricStats::default();
    for (stat, spellings) in STAT_KEYS {
        let Some(value) = lookup(values, spellings) else {
            continue;
        };
        match value.as_f64() {
            Some(number) => *slot(&mut stats, stat) = Some(number),
            None => debug!(
                "Ignoring '{}' of metric '{}': {} is not a number",
                stat, name, value
            ),
        }
    }

    if let (Some(count), Some(duration_ms)) = (
        stats.count,
        values.get("duration").and_then(Value::as_f64),
    ) {
        if duration_ms > 0.0 {
            stats.rate = Some(count / (duration_ms / 1000.0));
        }
    }

    Some(stats)
}

fn lookup<'a>(values: &'a Map<String, Value>, spellings: &[&str]) -> Option<&'a Value> {
    spellings.iter().find_map(|key| values.get(*key))
}

fn slot<'a>(stats: &'a mut MetricStats, stat: &str) -> &'a mut Option<f64> {
    match stat {
        "avg" => &mut stats.avg,
        "min" => &mut stats.min,
        "max" => &mut stats.max,
        "med" => &mut stats.med,
        "p90" => &mut stats.p90,
        "p95" => &mut stats.p95,
        "p99" => &mut stats.p99,
        "count" => &mut stats.count,
        _ => &mut stats.rate,
    }
}

/// Accepts epoch milliseconds or an RFC 3339 string
fn parse_timestamp(value: &Value) -> Option<f64> {
    match value {
        // -0.0 and 0.0 are the same instant.
        Value::Number(n) => n.as_f64().map(|t| if t == 0.0 { 0.0 } else { t }),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.timestamp_millis() as f64),
        _ => None,
    }
}

/// Groups flat data points into index-aligned series
#[derive(Default)]
struct SeriesBuilder {
    points: Vec<(f64, String, f64)>,
}

impl SeriesBuilder {
    fn push(&mut self, index: usize, point: &Value) -> Result<(), WalkError> {
        let metric = point
            .get("metric")
            .and_then(Value::as_str)
            .ok_or(WalkError::BadPoint {
                index,
                reason: "missing metric name",
            })?;
        let value = point
            .get("value")
            .and_then(Value::as_f64)
            .ok_or(WalkError::BadPoint {
                index,
                reason: "value is not a number",
            })?;
        let timestamp = point
            .get("timestamp")
            .and_then(parse_timestamp)
            .ok_or(WalkError::BadPoint {
                index,
                reason: "unreadable timestamp",
            })?;

        if metric == TimeSeries::TIMESTAMPS_KEY {
            debug!("Skipping data point {} named like the timestamp axis", index);
            return Ok(());
        }

        self.points.push((timestamp, metric.to_string(), value));
        Ok(())
    }

    fn finish(self) -> Option<TimeSeries> {
        if self.points.is_empty() {
            return None;
        }

        let mut timestamps: Vec<f64> = self.points.iter().map(|(t, _, _)| *t).collect();
        timestamps.sort_by(f64::total_cmp);
        timestamps.dedup_by(|a, b| a.total_cmp(b).is_eq());

        // Per metric, per timestamp slot: (sum, count) so repeated samples average out.
        let mut sums: BTreeMap<String, Vec<(f64, u32)>> = BTreeMap::new();
        for (timestamp, metric, value) in self.points {
            let Ok(slot) = timestamps.binary_search_by(|t| t.total_cmp(&timestamp)) else {
                continue;
            };
            let cells = sums
                .entry(metric)
                .or_insert_with(|| vec![(0.0, 0); timestamps.len()]);
            cells[slot].0 += value;
            cells[slot].1 += 1;
        }

        let mut series = TimeSeries::new(timestamps);
        for (metric, cells) in sums {
            let values = cells
                .into_iter()
                .map(|(sum, n)| (n > 0).then(|| sum / f64::from(n)))
                .collect();
            if let Err(e) = series.insert(metric, values) {
                warn!("Dropping series: {}", e);
            }
        }
        Some(series)
    }
}
