//! Index of requests that have started but not yet finished.

use crate::parser::event::ShapeKey;
use crate::parser::timestamp::Timestamp;
use std::collections::HashMap;

/// Open requests grouped by shape, most recent last.
///
/// Matching is LIFO within a key: the request that started most
/// recently is assumed to finish on the next matching end. The log
/// carries no request identifiers, so this is a heuristic rather than a
/// proof; it reflects how short bursts of identical requests nest in
/// practice. There is no ordering across different keys.
#[derive(Debug, Default)]
pub struct PendingIndex {
    open: HashMap<ShapeKey, Vec<Timestamp>>,
}

impl PendingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly started request. O(1).
    pub fn push(&mut self, key: ShapeKey, ts: Timestamp) {
        self.open.entry(key).or_default().push(ts);
    }

    /// Remove and return the most recently started open request for
    /// `key`, or `None` when nothing with that shape is open. O(1)
    /// amortized.
    pub fn pop_latest(&mut self, key: ShapeKey) -> Option<Timestamp> {
        let stack = self.open.get_mut(&key)?;
        let ts = stack.pop();
        // Drop empty stacks so the map only tracks shapes with open
        // requests; memory stays bounded by the concurrency level, not
        // by how many shapes the whole log ever used.
        if stack.is_empty() {
            self.open.remove(&key);
        }
        ts
    }

    /// Requests currently open, across all keys.
    pub fn open_count(&self) -> usize {
        self.open.values().map(Vec::len).sum()
    }

    /// Consume the index, yielding each shape that still has open
    /// requests and how many. Used at end of input to report what a
    /// truncated log never closed.
    pub fn drain_open(self) -> impl Iterator<Item = (ShapeKey, usize)> {
        self.open
            .into_iter()
            .map(|(key, stack)| (key, stack.len()))
    }
}
