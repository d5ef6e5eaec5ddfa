//! Configuration and constants for the CLI.

/// chrono format of the bracketed timestamp prefixing every client-log
/// line, e.g. `2023-01-01 12:00:00.123456 +0100`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

/// Default path of the output table.
pub const DEFAULT_OUTPUT: &str = "./readv_times.csv";

/// Default number of rows between forced flushes of the output sink.
pub const DEFAULT_FLUSH_EVERY: usize = 5;

// Column layouts of the emitted table. The names match what the
// downstream plotting tools select on; row order and numeric formatting
// are part of the same contract.
pub const READV_COLUMNS: &[&str] = &["start", "duration", "state", "size", "chunks", "spread"];
pub const READ_COLUMNS: &[&str] = &["start", "duration", "state", "size", "offset"];
