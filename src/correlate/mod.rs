//! Correlation of lifecycle events into completion records.
//!
//! This module transforms classified events into:
//! - Completion records (one per matched start/end pair)
//! - Diagnostics for events that do not line up
//! - A run summary of the largest observed spread

pub mod engine;
pub mod pending;
pub mod spread;
pub mod summary;

// Re-export main types
pub use engine::{CompletionRecord, Correlator, Diagnostic, Observation};
pub use pending::PendingIndex;
pub use spread::SpreadTracker;
pub use summary::RunSummary;
