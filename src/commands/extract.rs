//! Extract command implementation.
//!
//! The extract command:
//! 1. Opens the log source and the table sink
//! 2. Classifies lines into request lifecycle events
//! 3. Correlates end events with pending starts
//! 4. Writes one CSV row per completed request
//! 5. Reports anomalies and the run summary on stderr

use crate::correlate::engine::{Correlator, Observation};
use crate::output::csv::RecordEmitter;
use crate::parser::event::RequestFlavor;
use crate::parser::line::LineClassifier;
use crate::utils::error::OutputError;
use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

/// Sentinel path meaning stdin or stdout.
pub const STDIO_PATH: &str = "-";

/// Arguments for the extract command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ExtractArgs {
    /// Path to the log, `-` for stdin
    pub log: String,

    /// Path to the output table, `-` for stdout
    pub output: String,

    /// Request flavor to extract
    pub flavor: RequestFlavor,

    /// Rows between forced flushes of the output
    pub flush_every: usize,

    /// Write a column-name header row before the data
    pub header: bool,
}

/// Counters for one pass over a log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Lines consumed from the source.
    pub lines: u64,
    /// Rows written to the table.
    pub records: u64,
    /// Diagnostic lines emitted, the final summary excluded.
    pub diagnostics: u64,
}

/// Check argument consistency before any file is touched.
///
/// **Public** - called from main.rs before execute_extract
pub fn validate_args(args: &ExtractArgs) -> Result<()> {
    if args.flush_every == 0 {
        bail!("--flush-every must be at least 1");
    }
    if args.output.is_empty() {
        return Err(OutputError::InvalidPath("path is empty".to_string()).into());
    }
    if args.output != STDIO_PATH && Path::new(&args.output).is_dir() {
        return Err(
            OutputError::InvalidPath(format!("path is a directory: {}", args.output)).into(),
        );
    }
    Ok(())
}

/// Execute the extract command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Unreadable log source or unwritable output sink
/// * A matched request line whose timestamp cannot be decoded
pub fn execute_extract(args: ExtractArgs) -> Result<()> {
    info!(
        "Extracting {} request timings from {}",
        args.flavor.name(),
        display_path(&args.log, "stdin")
    );

    let stdin = io::stdin();
    let reader: Box<dyn BufRead> = if args.log == STDIO_PATH {
        Box::new(stdin.lock())
    } else {
        let file = File::open(&args.log)
            .with_context(|| format!("failed to open log file {}", args.log))?;
        Box::new(BufReader::new(file))
    };

    let sink: Box<dyn Write> = if args.output == STDIO_PATH {
        Box::new(io::stdout())
    } else {
        let file = File::create(&args.output)
            .with_context(|| format!("failed to create output file {}", args.output))?;
        Box::new(file)
    };

    let stats = run_extraction(
        reader,
        sink,
        io::stderr().lock(),
        args.flavor,
        args.flush_every,
        args.header,
    )?;

    info!(
        "{} rows written to {} from {} log lines ({} diagnostics)",
        stats.records,
        display_path(&args.output, "stdout"),
        stats.lines,
        stats.diagnostics
    );

    Ok(())
}

/// Run the full pipeline from a line source to a table sink.
///
/// **Public** - also the seam the integration tests drive
///
/// Diagnostics (unmatched ends, orphan chunks, truncation reports and
/// the final summary line) go to `diag`. The pass is strictly forward
/// and line-at-a-time, so arbitrarily large logs and pipes work the
/// same as regular files.
pub fn run_extraction<R, W, D>(
    reader: R,
    sink: W,
    mut diag: D,
    flavor: RequestFlavor,
    flush_every: usize,
    header: bool,
) -> Result<ExtractStats>
where
    R: BufRead,
    W: Write,
    D: Write,
{
    let classifier = LineClassifier::new(flavor);
    let mut correlator = Correlator::new(flavor);
    let mut emitter = RecordEmitter::new(sink, flavor, flush_every);

    if header {
        emitter.write_header().context("failed to write header")?;
    }

    let mut stats = ExtractStats::default();
    for line in reader.lines() {
        let line = line.context("failed to read from log source")?;
        stats.lines += 1;

        let event = classifier
            .classify(&line)
            .with_context(|| format!("line {} cannot be processed", stats.lines))?;

        match correlator.observe(event) {
            Some(Observation::Completed(record)) => {
                emitter
                    .write_record(&record)
                    .context("failed to write output row")?;
                stats.records += 1;
            }
            Some(Observation::Anomaly(diagnostic)) => {
                writeln!(diag, "{diagnostic}").context("failed to write diagnostic")?;
                stats.diagnostics += 1;
            }
            None => {}
        }
    }

    debug!("input exhausted after {} lines", stats.lines);

    let (summary, left_open) = correlator.finish();
    for diagnostic in &left_open {
        writeln!(diag, "{diagnostic}").context("failed to write diagnostic")?;
        stats.diagnostics += 1;
    }
    writeln!(diag, "{summary}").context("failed to write run summary")?;

    emitter.finish().context("failed to flush output")?;
    Ok(stats)
}

/// Human name for a path argument that may be a stdio sentinel.
fn display_path<'a>(path: &'a str, stdio_name: &'a str) -> &'a str {
    if path == STDIO_PATH {
        stdio_name
    } else {
        path
    }
}
