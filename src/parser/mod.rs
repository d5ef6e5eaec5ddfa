//! Log line classification and typed events.
//!
//! This module handles:
//! - Parsing the bracketed client-log timestamps
//! - Classifying raw lines into request lifecycle events
//! - Shape keys, the correlation identity of a request

pub mod event;
pub mod line;
pub mod timestamp;

// Re-export main types
pub use event::{LogEvent, Outcome, RequestFlavor, ShapeKey};
pub use line::LineClassifier;
pub use timestamp::{format_seconds, Timestamp};
