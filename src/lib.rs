//! xrdtimes
//!
//! Request timing extraction from XRootD client debug logs.
//!
//! The client logs every request it sends and every response it
//! receives, but gives requests no identifiers. This crate
//! reconstructs request lifetimes from those interleaved lines in a
//! single forward pass and emits a CSV table with one row per
//! completed request, ready for downstream plotting.
//!
//! Most users should use the CLI:
//!
//! ```bash
//! cargo install xrdtimes
//! xrdtimes extract client.log -o readv_times.csv
//! ```

pub mod commands;
pub mod correlate;
pub mod output;
pub mod parser;
pub mod utils;
