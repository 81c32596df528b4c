//! Console summary extraction
//!
//! Fallback used when the structured output file is missing or unreadable.
//! Each summary line the runner prints is handled by its own pure matcher;
//! a matcher that finds nothing simply leaves its metric out.

use rand::Rng;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

use crate::domain::results::{MetricStats, Provenance, ResultRecord, TimeSeries};

/// Number of points in a simulated series
pub const SYNTHETIC_POINTS: usize = 10;

/// Maximum relative deviation applied to simulated points
const SYNTHETIC_VARIANCE: f64 = 0.3;

/// Spacing used when the run length cannot be read from the output
const DEFAULT_STEP_MS: f64 = 1000.0;

/// A duration value and its unit, e.g. `12.5ms`, `500µs` or `1m0s`
const DUR: &str = r"((?:[0-9]+m)?[0-9]+(?:\.[0-9]+)?)(µs|us|ms|s)";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("constant regex pattern is valid")
}

/// `http_req_duration.....: avg=1.2ms min=0.5ms med=1ms max=3ms`
static DURATION_STRICT: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"http_req_duration[.\s]+: avg={DUR} min={DUR} med={DUR} max={DUR}"
    ))
});

/// Same fields with arbitrary padding between them
static DURATION_LENIENT: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"http_req_duration[^:\n]*:[^a-z\n]*avg={DUR}[^a-z\n]*min={DUR}[^a-z\n]*med={DUR}[^a-z\n]*max={DUR}"
    ))
});

static DURATION_AVG_ONLY: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"http_req_duration[.\s]+: avg={DUR}")));

static DURATION_P90: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"http_req_duration[.\s]+:[^\n]*p\(90\)={DUR}")));

static DURATION_P95: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"http_req_duration[.\s]+:[^\n]*p\(95\)={DUR}")));

/// `http_reqs..............: 50     4.9/s`
static REQUESTS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"http_reqs[.\s]+: ([0-9]+)\s+([0-9]+(?:\.[0-9]+)?)/s"));

/// `http_req_failed........: 2.00%  1 out of 50`
static FAILED: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"http_req_failed[.\s]+: ([0-9]+(?:\.[0-9]+)?)%\s+([0-9]+) out of ([0-9]+)")
});

/// `checks_succeeded.......: 98.00% 49 out of 50`
static CHECKS: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"checks_succeeded[.\s]+: ([0-9]+(?:\.[0-9]+)?)%\s+([0-9]+) out of ([0-9]+)")
});

/// `running (0m10.2s), 0/5 VUs, 50 complete and 0 interrupted iterations`
static RUN_LENGTH: LazyLock<Regex> =
    LazyLock::new(|| compile(r"running \(([0-9]+)m([0-9]+(?:\.[0-9]+)?)s\)"));

struct SummaryMatcher {
    metric: &'static str,
    extract: fn(&str) -> Option<MetricStats>,
}

const SUMMARY_MATCHERS: &[SummaryMatcher] = &[
    SummaryMatcher {
        metric: "http_req_duration",
        extract: request_duration,
    },
    SummaryMatcher {
        metric: "http_reqs",
        extract: request_count,
    },
    SummaryMatcher {
        metric: "http_req_failed",
        extract: failure_rate,
    },
    SummaryMatcher {
        metric: "checks",
        extract: check_rate,
    },
];

/// Runs every summary matcher over the output
pub fn summary_metrics(text: &str) -> BTreeMap<String, MetricStats> {
    SUMMARY_MATCHERS
        .iter()
        .filter_map(|m| (m.extract)(text).map(|stats| (m.metric.to_string(), stats)))
        .collect()
}

/// Builds a record from raw console output
///
/// Returns `None` when no summary line could be recognized. The series in the
/// returned record is simulated and tagged [`Provenance::Synthetic`].
pub fn from_raw_output(text: &str) -> Option<ResultRecord> {
    from_raw_output_with_rng(text, &mut rand::thread_rng())
}

/// [`from_raw_output`] with a caller-supplied random source
pub fn from_raw_output_with_rng<R: Rng>(text: &str, rng: &mut R) -> Option<ResultRecord> {
    let metrics = summary_metrics(text);
    if metrics.is_empty() {
        debug!("No summary lines recognized in runner output");
        return None;
    }

    let avg_duration = metrics
        .get("http_req_duration")
        .and_then(|s| s.avg)
        .unwrap_or(0.0);
    let throughput = metrics.get("http_reqs").and_then(|s| s.rate).unwrap_or(0.0);

    let step = run_length_ms(text)
        .filter(|ms| *ms > 0.0)
        .map(|ms| ms / (SYNTHETIC_POINTS - 1) as f64)
        .unwrap_or(DEFAULT_STEP_MS);

    let mut timestamps = Vec::with_capacity(SYNTHETIC_POINTS);
    let mut durations = Vec::with_capacity(SYNTHETIC_POINTS);
    let mut rates = Vec::with_capacity(SYNTHETIC_POINTS);
    for i in 0..SYNTHETIC_POINTS {
        let factor = 1.0 + rng.gen_range(-SYNTHETIC_VARIANCE..=SYNTHETIC_VARIANCE);
        timestamps.push(i as f64 * step);
        durations.push(Some(avg_duration * factor));
        rates.push(Some(throughput * factor));
    }

    let mut series = TimeSeries::new(timestamps);
    series.insert("http_req_duration", durations).ok()?;
    series.insert("http_reqs", rates).ok()?;

    Some(ResultRecord {
        metrics,
        time_series: Some(series),
        provenance: Provenance::Synthetic,
    })
}

fn request_duration(text: &str) -> Option<MetricStats> {
    let mut stats = [&*DURATION_STRICT, &*DURATION_LENIENT]
        .into_iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| {
            Some(MetricStats {
                avg: Some(duration_at(&caps, 1)?),
                min: Some(duration_at(&caps, 3)?),
                med: Some(duration_at(&caps, 5)?),
                max: Some(duration_at(&caps, 7)?),
                ..Default::default()
            })
        })
        .or_else(|| {
            let caps = DURATION_AVG_ONLY.captures(text)?;
            Some(MetricStats {
                avg: Some(duration_at(&caps, 1)?),
                min: Some(0.0),
                med: Some(0.0),
                max: Some(0.0),
                ..Default::default()
            })
        })?;

    stats.p90 = DURATION_P90
        .captures(text)
        .and_then(|caps| duration_at(&caps, 1));
    stats.p95 = DURATION_P95
        .captures(text)
        .and_then(|caps| duration_at(&caps, 1));
    Some(stats)
}

fn request_count(text: &str) -> Option<MetricStats> {
    let caps = REQUESTS.captures(text)?;
    Some(MetricStats {
        count: Some(number_at(&caps, 1)?),
        rate: Some(number_at(&caps, 2)?),
        ..Default::default()
    })
}

fn failure_rate(text: &str) -> Option<MetricStats> {
    let caps = FAILED.captures(text)?;
    Some(MetricStats {
        rate: Some(number_at(&caps, 1)? / 100.0),
        count: Some(number_at(&caps, 2)?),
        total: Some(number_at(&caps, 3)?),
        ..Default::default()
    })
}

fn check_rate(text: &str) -> Option<MetricStats> {
    let caps = CHECKS.captures(text)?;
    Some(MetricStats {
        rate: Some(number_at(&caps, 1)? / 100.0),
        succeeded: Some(number_at(&caps, 2)?),
        total: Some(number_at(&caps, 3)?),
        ..Default::default()
    })
}

/// Length of the run from the last `running (XmY.Ys)` line
fn run_length_ms(text: &str) -> Option<f64> {
    let caps = RUN_LENGTH.captures_iter(text).last()?;
    let minutes = number_at(&caps, 1)?;
    let seconds = number_at(&caps, 2)?;
    Some((minutes * 60.0 + seconds) * 1000.0)
}

fn number_at(caps: &Captures<'_>, group: usize) -> Option<f64> {
    caps.get(group)?.as_str().parse().ok()
}

/// Reads the number at `group` with its unit at `group + 1`, in milliseconds
///
/// The number may carry a whole-minute prefix (`1m0s`).
fn duration_at(caps: &Captures<'_>, group: usize) -> Option<f64> {
    let raw = caps.get(group)?.as_str();
    let (minutes, rest) = match raw.split_once('m') {
        Some((minutes, rest)) => (minutes.parse::<f64>().ok()?, rest),
        None => (0.0, raw),
    };
    let value: f64 = rest.parse().ok()?;
    let millis = match caps.get(group + 1)?.as_str() {
        "µs" | "us" => value / 1000.0,
        "ms" => value,
        "s" => value * 1000.0,
        _ => return None,
    };
    Some(minutes * 60_000.0 + millis)
}
