//! Progress parsing for live runner output
//!
//! The runner prints progress in a couple of shapes depending on version and
//! terminal mode. Each shape is an independent matcher; the first that finds
//! a percentage wins.

use regex::Regex;
use std::sync::LazyLock;

/// `execution: ... [ 45.5%]` style progress, only trusted when the chunk
/// carries the execution marker
static EXECUTION_PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\s*([0-9]+(?:\.[0-9]+)?)%\s*\]").expect("constant regex pattern is valid")
});

/// Scenario progress bar: `default   [  45% ] 5 VUs  0m13.5s/0m30s`
static STAGE_PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_][\w-]*\s+\[\s*([0-9]+(?:\.[0-9]+)?)%\s*\]")
        .expect("constant regex pattern is valid")
});

const EXECUTION_MARKER: &str = "execution:";

type Matcher = fn(&str) -> Option<f64>;

const MATCHERS: &[Matcher] = &[execution_percent, stage_percent];

/// Extracts a completion percentage from one chunk of runner output
///
/// Returns `None` when no known format is present. The value is clamped to
/// `[0, 100]`.
pub fn parse(chunk: &str) -> Option<f64> {
    MATCHERS
        .iter()
        .find_map(|matcher| matcher(chunk))
        .map(|p| p.clamp(0.0, 100.0))
}

fn execution_percent(chunk: &str) -> Option<f64> {
    if !chunk.contains(EXECUTION_MARKER) {
        return None;
    }
    capture_percent(&EXECUTION_PERCENT, chunk)
}

fn stage_percent(chunk: &str) -> Option<f64> {
    capture_percent(&STAGE_PERCENT, chunk)
}

fn capture_percent(re: &Regex, chunk: &str) -> Option<f64> {
    re.captures(chunk)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|p| p.is_finite())
}
