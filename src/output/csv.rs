//! CSV table writer.
//!
//! One row per completed request, written in completion order. The
//! column order and the numeric formatting are consumed by plotting
//! tools outside this crate and must not drift.

use crate::correlate::engine::CompletionRecord;
use crate::parser::event::RequestFlavor;
use crate::parser::timestamp::format_seconds;
use crate::utils::config::{READ_COLUMNS, READV_COLUMNS};
use crate::utils::error::OutputError;
use log::debug;
use std::io::{BufWriter, Write};

/// Buffered writer for completion records.
///
/// Output is buffered, with a forced flush every `flush_every` rows: an
/// abruptly killed run loses at most one batch, and a healthy run does
/// not pay a flush per line.
#[derive(Debug)]
pub struct RecordEmitter<W: Write> {
    sink: BufWriter<W>,
    flavor: RequestFlavor,
    flush_every: usize,
    written: usize,
}

impl<W: Write> RecordEmitter<W> {
    /// Create an emitter over `sink`. `flush_every` below 1 is treated
    /// as 1.
    pub fn new(sink: W, flavor: RequestFlavor, flush_every: usize) -> Self {
        Self {
            sink: BufWriter::new(sink),
            flavor,
            flush_every: flush_every.max(1),
            written: 0,
        }
    }

    /// Write the column-name header row. Optional; the default output
    /// is data rows only.
    pub fn write_header(&mut self) -> Result<(), OutputError> {
        let columns = match self.flavor {
            RequestFlavor::Readv => READV_COLUMNS,
            RequestFlavor::Read => READ_COLUMNS,
        };
        writeln!(self.sink, "{}", columns.join(","))?;
        Ok(())
    }

    /// Append one row.
    pub fn write_record(&mut self, record: &CompletionRecord) -> Result<(), OutputError> {
        write!(
            self.sink,
            "{},{},{},{},{}",
            record.start,
            format_seconds(record.duration_micros),
            record.outcome.code(),
            record.size,
            record.secondary
        )?;
        if let Some(spread) = record.spread {
            write!(self.sink, ",{spread}")?;
        }
        writeln!(self.sink)?;

        self.written += 1;
        if self.written % self.flush_every == 0 {
            debug!("flushing after {} rows", self.written);
            self.sink.flush()?;
        }
        Ok(())
    }

    /// Rows written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush whatever is still buffered and hand the sink back.
    pub fn finish(mut self) -> Result<W, OutputError> {
        self.sink.flush()?;
        self.sink
            .into_inner()
            .map_err(|e| OutputError::WriteFailed(e.into_error()))
    }
}
