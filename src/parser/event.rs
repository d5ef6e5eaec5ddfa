//! Typed events extracted from log lines.

use crate::parser::timestamp::Timestamp;
use std::fmt;

/// Which request pattern the classifier looks for.
///
/// Selected once per run, not per line. Vectored requests carry a chunk
/// list and produce a spread column; single-range requests carry an
/// offset instead and have no chunk-completion lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFlavor {
    /// Vectored `kXR_readv` requests, keyed by (total size, chunk count)
    Readv,
    /// Single-range `kXR_read` requests, keyed by (size, offset)
    Read,
}

impl RequestFlavor {
    /// Map a CLI request-type name onto a flavor.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "readv" => Some(Self::Readv),
            "read" => Some(Self::Read),
            _ => None,
        }
    }

    /// The CLI name of this flavor.
    pub fn name(self) -> &'static str {
        match self {
            Self::Readv => "readv",
            Self::Read => "read",
        }
    }

    /// The wire message name as it appears in log lines.
    pub fn message(self) -> &'static str {
        match self {
            Self::Readv => "kXR_readv",
            Self::Read => "kXR_read",
        }
    }
}

/// Identifies a *kind* of request as observed in the log, not a
/// specific instance.
///
/// The log carries no request identifiers, so several identical
/// requests can be in flight at once under the same key. That is the
/// source of the matching ambiguity the correlator resolves with its
/// LIFO policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeKey {
    /// Total requested bytes.
    pub size: u64,
    /// Chunk count (vectored flavor) or starting offset (single-range).
    pub secondary: u64,
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.size, self.secondary)
    }
}

/// Success or failure of a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Numeric code used in the emitted table: 0 success, 1 failure.
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }
}

/// One classified log line.
///
/// `Unrecognized` covers everything the log carries that is unrelated
/// to request lifecycles; such lines are skipped silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent {
    /// A request was handed to the transport.
    Started { ts: Timestamp, key: ShapeKey },
    /// One chunk of the open vectored request finished its buffer.
    ChunkTouched { offset: u64, length: u64 },
    /// A response (or a handled error) closed a request.
    Ended {
        ts: Timestamp,
        key: ShapeKey,
        outcome: Outcome,
    },
    /// Anything else.
    Unrecognized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flavor_names_round_trip() {
        assert_eq!(RequestFlavor::from_name("readv"), Some(RequestFlavor::Readv));
        assert_eq!(RequestFlavor::from_name("read"), Some(RequestFlavor::Read));
        assert_eq!(RequestFlavor::from_name("write"), None);
        assert_eq!(RequestFlavor::Readv.name(), "readv");
        assert_eq!(RequestFlavor::Read.message(), "kXR_read");
    }

    #[test]
    fn test_outcome_codes() {
        assert_eq!(Outcome::Success.code(), 0);
        assert_eq!(Outcome::Failure.code(), 1);
    }

    #[test]
    fn test_shape_key_display() {
        let key = ShapeKey {
            size: 100,
            secondary: 3,
        };
        assert_eq!(key.to_string(), "(100, 3)");
    }
}
