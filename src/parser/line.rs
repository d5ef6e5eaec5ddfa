//! Line classifier: turns one raw log line into zero or one event.
//!
//! The client logs a "successfully sent" line when a request goes out,
//! a "Got a kXR_ok/kXR_error response" (or "Handling error while
//! processing") line when it comes back, and, for vectored requests,
//! one "read buffer for chunk" line per chunk as buffers fill in
//! between. Patterns are compiled once per run for the selected flavor.

use crate::parser::event::{LogEvent, Outcome, RequestFlavor, ShapeKey};
use crate::parser::timestamp::Timestamp;
use crate::utils::error::ClassifyError;
use log::debug;
use regex::{Captures, Regex};

/// Bracketed timestamp prefix shared by the start and end patterns.
const TIMESTAMP_REXP: &str =
    r"^\[(?P<time>[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9:.]+ [+-][0-9]{4})\]";

/// Request payload as logged for vectored requests. The chunks field is
/// either a plain count or a bracketed descriptor list.
const READV_PAYLOAD_REXP: &str =
    r"\(handle: [0-9a-fx]+, chunks: (?P<chunks>[0-9 ,\[\]:;ofsetiz()]+), total size: (?P<size>[0-9]+)\)";

/// Request payload as logged for single-range requests.
const READ_PAYLOAD_REXP: &str =
    r"\(handle: [0-9a-fx]+, offset: (?P<offset>[0-9]+), size: (?P<size>[0-9]+)\)";

/// Per-chunk buffer completion, `<length>@<offset>` at end of line.
const CHUNK_REXP: &str = r"read buffer for chunk (?P<length>[0-9]+)@(?P<offset>[0-9]+)$";

/// Turns raw log lines into typed [`LogEvent`]s for one request flavor.
pub struct LineClassifier {
    flavor: RequestFlavor,
    start: Regex,
    end: Regex,
    chunk: Option<Regex>,
}

impl LineClassifier {
    /// Compile the patterns for `flavor`.
    pub fn new(flavor: RequestFlavor) -> Self {
        let payload = match flavor {
            RequestFlavor::Readv => READV_PAYLOAD_REXP,
            RequestFlavor::Read => READ_PAYLOAD_REXP,
        };
        let message = flavor.message();

        let start = format!(
            "{TIMESTAMP_REXP}.*Message {message} {payload} has been successfully sent"
        );
        let end = format!(
            "{TIMESTAMP_REXP}.*(?:Got a kXR_(?P<state>ok|error) response to request|Handling error while processing) {message} {payload}"
        );

        debug!("Compiled {} patterns", flavor.name());

        Self {
            flavor,
            start: Regex::new(&start).expect("start pattern compiles"),
            end: Regex::new(&end).expect("end pattern compiles"),
            // Chunk lines only exist for vectored requests
            chunk: match flavor {
                RequestFlavor::Readv => Some(Regex::new(CHUNK_REXP).expect("chunk pattern compiles")),
                RequestFlavor::Read => None,
            },
        }
    }

    /// Classify one raw line.
    ///
    /// Returns [`LogEvent::Unrecognized`] for lines matching none of
    /// the patterns; that is the common case and is silent.
    ///
    /// # Errors
    /// `ClassifyError` when a line matched a request pattern but its
    /// timestamp or a numeric field cannot be decoded. Fatal for the
    /// run: see [`ClassifyError`].
    pub fn classify(&self, line: &str) -> Result<LogEvent, ClassifyError> {
        if let Some(caps) = self.start.captures(line) {
            let ts = Timestamp::parse(&caps["time"])?;
            let key = self.extract_key(&caps)?;
            return Ok(LogEvent::Started { ts, key });
        }

        if let Some(chunk) = &self.chunk {
            if let Some(caps) = chunk.captures(line) {
                return Ok(LogEvent::ChunkTouched {
                    offset: parse_field(&caps, "offset")?,
                    length: parse_field(&caps, "length")?,
                });
            }
        }

        if let Some(caps) = self.end.captures(line) {
            let ts = Timestamp::parse(&caps["time"])?;
            let key = self.extract_key(&caps)?;
            // "Handling error while processing" lines have no state group
            let outcome = match caps.name("state").map(|m| m.as_str()) {
                Some("ok") => Outcome::Success,
                _ => Outcome::Failure,
            };
            return Ok(LogEvent::Ended { ts, key, outcome });
        }

        Ok(LogEvent::Unrecognized)
    }

    /// Shape key from a matched start or end line.
    fn extract_key(&self, caps: &Captures<'_>) -> Result<ShapeKey, ClassifyError> {
        let size = parse_field(caps, "size")?;
        let secondary = match self.flavor {
            RequestFlavor::Readv => chunk_count(&caps["chunks"])?,
            RequestFlavor::Read => parse_field(caps, "offset")?,
        };
        Ok(ShapeKey { size, secondary })
    }
}

/// Decode one named numeric capture group.
fn parse_field(caps: &Captures<'_>, group: &'static str) -> Result<u64, ClassifyError> {
    let value = &caps[group];
    value.parse().map_err(|_| ClassifyError::Number {
        field: group,
        value: value.to_string(),
    })
}

/// Chunk count from the chunks field of a vectored request.
///
/// The field is a plain count on newer clients; older ones log the full
/// descriptor list with a trailing separator, so the count is the
/// number of `;` segments minus one.
fn chunk_count(field: &str) -> Result<u64, ClassifyError> {
    if field.ends_with(']') {
        return Ok((field.split(';').count() - 1) as u64);
    }
    field.parse().map_err(|_| ClassifyError::Number {
        field: "chunks",
        value: field.to_string(),
    })
}
