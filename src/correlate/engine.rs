//! The correlation engine: matches end events to pending starts.

use crate::correlate::pending::PendingIndex;
use crate::correlate::spread::SpreadTracker;
use crate::correlate::summary::RunSummary;
use crate::parser::event::{LogEvent, Outcome, RequestFlavor, ShapeKey};
use crate::parser::timestamp::Timestamp;
use log::debug;
use std::fmt;

/// One row of the output table. Immutable once built, emitted exactly
/// once, in the order end events were observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRecord {
    /// When the matched start was issued.
    pub start: Timestamp,
    /// End-to-start distance in microseconds. Non-negative, since the
    /// log is time ordered.
    pub duration_micros: i64,
    pub outcome: Outcome,
    /// Total requested bytes, from the shape key.
    pub size: u64,
    /// Chunk count (vectored) or offset (single-range), from the shape
    /// key.
    pub secondary: u64,
    /// Width of the covered byte range. `Some` for the vectored flavor
    /// (zero when no chunk line was observed), `None` for single-range
    /// where the column does not exist.
    pub spread: Option<u64>,
}

/// Anomalies reported on the side channel while processing continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// An end event popped nothing: the log starts mid-session, or an
    /// already-closed request logged a second error line.
    UnmatchedEnd { key: ShapeKey },
    /// A chunk completion arrived with no request open at all, e.g.
    /// when capture began mid-request.
    OrphanChunk { offset: u64, length: u64 },
    /// Requests still open when input ended.
    LeftOpen { key: ShapeKey, count: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedEnd { key } => write!(
                f,
                "Found end of request {key}, but can not find start! Probably log is incomplete, multiple error messages are present."
            ),
            Self::OrphanChunk { offset, length } => write!(
                f,
                "Chunk {length}@{offset} completed with no request in flight, skipping."
            ),
            Self::LeftOpen { key, count } => write!(
                f,
                "{count} request(s) of shape {key} never completed, log may be truncated."
            ),
        }
    }
}

/// What one observed event produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// A request completed and produced a table row.
    Completed(CompletionRecord),
    /// Something did not line up; reported and skipped.
    Anomaly(Diagnostic),
}

/// Single-owner orchestrator for one forward pass over a log.
///
/// Feeds classified events to the pending index and the spread tracker,
/// and turns each matched end event into a [`CompletionRecord`]. The
/// pass never backtracks; memory grows with the number of
/// simultaneously open requests, not with the log.
#[derive(Debug)]
pub struct Correlator {
    flavor: RequestFlavor,
    pending: PendingIndex,
    spread: SpreadTracker,
    summary: RunSummary,
}

impl Correlator {
    pub fn new(flavor: RequestFlavor) -> Self {
        Self {
            flavor,
            pending: PendingIndex::new(),
            spread: SpreadTracker::new(),
            summary: RunSummary::new(),
        }
    }

    /// Feed one classified event. `None` means the event was absorbed
    /// into internal state (or was unrecognized) and produced nothing.
    pub fn observe(&mut self, event: LogEvent) -> Option<Observation> {
        match event {
            LogEvent::Started { ts, key } => {
                debug!("open {} at {}", key, ts);
                self.pending.push(key, ts);
                self.spread.on_start();
                None
            }
            LogEvent::ChunkTouched { offset, length } => {
                if self.pending.open_count() == 0 {
                    return Some(Observation::Anomaly(Diagnostic::OrphanChunk {
                        offset,
                        length,
                    }));
                }
                self.spread.on_touch(offset, length);
                None
            }
            LogEvent::Ended { ts, key, outcome } => Some(self.close(ts, key, outcome)),
            LogEvent::Unrecognized => None,
        }
    }

    /// Close out one request on its end event.
    fn close(&mut self, end: Timestamp, key: ShapeKey, outcome: Outcome) -> Observation {
        let Some(start) = self.pending.pop_latest(key) else {
            return Observation::Anomaly(Diagnostic::UnmatchedEnd { key });
        };

        let range = match self.flavor {
            RequestFlavor::Readv => self.spread.current(),
            RequestFlavor::Read => None,
        };
        if let Some(range) = range {
            self.summary.record_spread(key, range);
        }
        let spread = match self.flavor {
            RequestFlavor::Readv => Some(range.map_or(0, |(lo, hi)| hi - lo)),
            RequestFlavor::Read => None,
        };

        Observation::Completed(CompletionRecord {
            start,
            duration_micros: end.micros_since(start),
            outcome,
            size: key.size,
            secondary: key.secondary,
            spread,
        })
    }

    /// End of input: report what never completed and hand back the run
    /// summary. Truncation is never fatal; it only produces
    /// diagnostics.
    pub fn finish(self) -> (RunSummary, Vec<Diagnostic>) {
        let mut left: Vec<_> = self
            .pending
            .drain_open()
            .map(|(key, count)| Diagnostic::LeftOpen { key, count })
            .collect();
        // Stable report order regardless of hash iteration
        left.sort_by_key(|diag| match diag {
            Diagnostic::LeftOpen { key, .. } => (key.size, key.secondary),
            _ => (0, 0),
        });
        (self.summary, left)
    }

    /// The summary accumulated so far.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }
}
