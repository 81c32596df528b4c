//! Result extraction
//!
//! Two independent entry points produce the same [`ResultRecord`] shape:
//!
//! - [`from_structured_output`]: walks the runner's JSON output document.
//!   Series built here are tagged [`Provenance::Measured`].
//! - [`from_raw_output`]: scrapes the human-readable end-of-run summary from
//!   the console output. No real series exists there, so one is simulated
//!   around the summary averages and tagged [`Provenance::Synthetic`].
//!
//! [`ResultRecord`]: crate::domain::results::ResultRecord
//! [`Provenance::Measured`]: crate::domain::results::Provenance::Measured
//! [`Provenance::Synthetic`]: crate::domain::results::Provenance::Synthetic

mod structured;
mod text;

pub use structured::from_structured_output;
pub use text::{SYNTHETIC_POINTS, from_raw_output, from_raw_output_with_rng, summary_metrics};

use serde_json::Value;
use thiserror::Error;

/// Failure to turn output file bytes into a structured document
#[derive(Debug, Error)]
pub enum StructuredOutputError {
    #[error("invalid JSON in structured output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("structured output is not a JSON object")]
    NotAnObject,
}

/// Removes control characters that break JSON parsing
///
/// Strips U+0000..=U+001F and U+007F..=U+009F except tab, newline and
/// carriage return, plus the replacement characters produced for bytes that
/// are not valid UTF-8.
pub fn sanitize(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| !is_stripped(c))
        .collect()
}

fn is_stripped(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => false,
        '\u{0}'..='\u{1F}' | '\u{7F}'..='\u{9F}' => true,
        char::REPLACEMENT_CHARACTER => true,
        _ => false,
    }
}

/// Sanitizes and parses an output file into a JSON object
pub fn parse_structured(bytes: &[u8]) -> Result<Value, StructuredOutputError> {
    let doc: Value = serde_json::from_str(&sanitize(bytes))?;
    if !doc.is_object() {
        return Err(StructuredOutputError::NotAnObject);
    }
    Ok(doc)
}
