//! Timestamp parsing and rendering.
//!
//! Every interesting log line starts with a local-time stamp carrying a
//! UTC offset, e.g. `2023-01-01 12:00:00.123456 +0100`. Internally we
//! keep integer microseconds since the Unix epoch, so durations between
//! matched lines are exact at the log's own precision.

use crate::utils::config::TIMESTAMP_FORMAT;
use crate::utils::error::ClassifyError;
use chrono::DateTime;
use std::fmt;

const MICROS_PER_SEC: u64 = 1_000_000;

/// An instant extracted from a log line, in microseconds since the
/// Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Parse the payload of a bracketed timestamp, e.g.
    /// `2023-01-01 12:00:00.123456 +0100`.
    ///
    /// # Errors
    /// `ClassifyError::Timestamp` if chrono rejects the stamp. Callers
    /// treat this as fatal: the stamp sits on a line that matched a
    /// request pattern, and a request we cannot place in time cannot be
    /// correlated at all.
    pub fn parse(stamp: &str) -> Result<Self, ClassifyError> {
        let parsed =
            DateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).map_err(|source| {
                ClassifyError::Timestamp {
                    stamp: stamp.to_string(),
                    source,
                }
            })?;
        Ok(Self(parsed.timestamp_micros()))
    }

    /// Construct directly from microseconds since the epoch.
    pub fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Microseconds since the epoch.
    pub fn micros(self) -> i64 {
        self.0
    }

    /// Elapsed microseconds from `earlier` to `self`. Non-negative for
    /// a matched start/end pair, since log lines are time ordered.
    pub fn micros_since(self, earlier: Timestamp) -> i64 {
        self.0 - earlier.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_seconds(self.0))
    }
}

/// Render microseconds as decimal seconds for the output table.
///
/// Trailing zeros are trimmed from the fraction but one digit is always
/// kept, so whole seconds read `1000.0` and half a second reads `0.5`.
/// Downstream tools parse these columns as floats; this rendering is
/// part of the table contract.
pub fn format_seconds(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    let secs = abs / MICROS_PER_SEC;
    let frac = abs % MICROS_PER_SEC;
    if frac == 0 {
        return format!("{sign}{secs}.0");
    }
    let mut digits = format!("{frac:06}");
    while digits.ends_with('0') {
        digits.pop();
    }
    format!("{sign}{secs}.{digits}")
}
