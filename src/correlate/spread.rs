//! Byte-range accumulator for vectored requests.

/// Tracks the smallest contiguous range covering every chunk the
/// currently open request has touched.
///
/// There is a single accumulator, reset on every request start. When
/// identical-shape requests nest, their chunk lines fold into the same
/// accumulator; the log has no request identifiers to tell them apart,
/// so both ends of a nested pair read the combined range.
#[derive(Debug, Default)]
pub struct SpreadTracker {
    span: Option<(u64, u64)>,
}

impl SpreadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget any previous range; subsequent touches belong to the
    /// request that just started.
    pub fn on_start(&mut self) {
        self.span = None;
    }

    /// Widen the active range with one completed chunk.
    pub fn on_touch(&mut self, offset: u64, length: u64) {
        let end = offset.saturating_add(length);
        self.span = Some(match self.span {
            Some((lo, hi)) => (lo.min(offset), hi.max(end)),
            None => (offset, end),
        });
    }

    /// The `[min, max)` range covered since the last start, or `None`
    /// when no chunk has been observed. Reading does not reset: the
    /// range stays until the next start, so repeated ends see the same
    /// value.
    pub fn current(&self) -> Option<(u64, u64)> {
        self.span
    }
}
