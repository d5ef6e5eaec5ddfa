//! End-to-end tests of the extraction pipeline over in-memory logs.

use pretty_assertions::assert_eq;
use std::io::{Cursor, Read};
use xrdtimes::commands::{execute_extract, run_extraction, ExtractArgs, ExtractStats};
use xrdtimes::parser::event::RequestFlavor;

fn readv_start(stamp: &str, chunks: u64, size: u64) -> String {
    format!("[{stamp}] [Dump][XRootD] Message kXR_readv (handle: 0x25600960, chunks: {chunks}, total size: {size}) has been successfully sent.")
}

fn readv_end(stamp: &str, chunks: u64, size: u64, state: &str) -> String {
    format!("[{stamp}] [Dump][XRootD] Got a kXR_{state} response to request kXR_readv (handle: 0x25600960, chunks: {chunks}, total size: {size})")
}

fn chunk(stamp: &str, length: u64, offset: u64) -> String {
    format!("[{stamp}] [Dump][XRootD] read buffer for chunk {length}@{offset}")
}

fn read_start(stamp: &str, offset: u64, size: u64) -> String {
    format!("[{stamp}] [Dump][XRootD] Message kXR_read (handle: 0x25600960, offset: {offset}, size: {size}) has been successfully sent.")
}

fn read_end(stamp: &str, offset: u64, size: u64, state: &str) -> String {
    format!("[{stamp}] [Dump][XRootD] Got a kXR_{state} response to request kXR_read (handle: 0x25600960, offset: {offset}, size: {size})")
}

/// Run the pipeline over a log and collect output, diagnostics and
/// counters.
fn run(log: &str, flavor: RequestFlavor) -> (String, String, ExtractStats) {
    let mut out = Vec::new();
    let mut diag = Vec::new();
    let stats = run_extraction(
        Cursor::new(log.as_bytes().to_vec()),
        &mut out,
        &mut diag,
        flavor,
        5,
        false,
    )
    .unwrap();
    (
        String::from_utf8(out).unwrap(),
        String::from_utf8(diag).unwrap(),
        stats,
    )
}

#[test]
fn test_scenario_single_vectored_request() {
    // start at t=1000.0, two chunk buffers, ok response half a second later
    let log = [
        readv_start("1970-01-01 00:16:40.000000 +0000", 3, 100),
        chunk("1970-01-01 00:16:40.100000 +0000", 40, 0),
        chunk("1970-01-01 00:16:40.200000 +0000", 40, 60),
        readv_end("1970-01-01 00:16:40.500000 +0000", 3, 100, "ok"),
    ]
    .join("\n");

    let (out, diag, stats) = run(&log, RequestFlavor::Readv);

    assert_eq!(out, "1000.0,0.5,0,100,3,100\n");
    assert_eq!(stats.records, 1);
    assert_eq!(stats.diagnostics, 0);
    assert_eq!(
        diag,
        "Max spread = 100, request = (100, 3), buf_start=0, buf_end=100\n"
    );
}

#[test]
fn test_conservation_on_distinct_keys() {
    let log = [
        readv_start("1970-01-01 00:00:01.000000 +0000", 2, 100),
        readv_start("1970-01-01 00:00:02.000000 +0000", 4, 200),
        readv_start("1970-01-01 00:00:03.000000 +0000", 8, 300),
        readv_end("1970-01-01 00:00:03.500000 +0000", 4, 200, "ok"),
        readv_end("1970-01-01 00:00:04.250000 +0000", 2, 100, "ok"),
        readv_end("1970-01-01 00:00:06.000000 +0000", 8, 300, "ok"),
    ]
    .join("\n");

    let (out, _, stats) = run(&log, RequestFlavor::Readv);

    assert_eq!(stats.records, 3);
    // Rows come out in end order, each with its exact duration
    assert_eq!(
        out,
        "2.0,1.5,0,200,4,0\n1.0,3.25,0,100,2,0\n3.0,3.0,0,300,8,0\n"
    );
}

#[test]
fn test_nested_identical_requests_match_innermost_first() {
    let key_line = |stamp: &str| readv_start(stamp, 3, 100);
    let log = [
        key_line("1970-01-01 00:00:01.000000 +0000"),
        key_line("1970-01-01 00:00:02.000000 +0000"),
        readv_end("1970-01-01 00:00:03.000000 +0000", 3, 100, "ok"),
        readv_end("1970-01-01 00:00:04.000000 +0000", 3, 100, "ok"),
    ]
    .join("\n");

    let (out, _, _) = run(&log, RequestFlavor::Readv);

    // First end matches the second start, not the first
    assert_eq!(out, "2.0,1.0,0,100,3,0\n1.0,3.0,0,100,3,0\n");
}

#[test]
fn test_error_and_handled_error_outcomes() {
    let log = [
        readv_start("1970-01-01 00:00:01.000000 +0000", 3, 100),
        readv_end("1970-01-01 00:00:02.000000 +0000", 3, 100, "error"),
        readv_start("1970-01-01 00:00:03.000000 +0000", 3, 100),
        "[1970-01-01 00:00:04.000000 +0000] [Error][XRootD] Handling error while processing kXR_readv (handle: 0x25600960, chunks: 3, total size: 100)".to_string(),
    ]
    .join("\n");

    let (out, _, stats) = run(&log, RequestFlavor::Readv);

    assert_eq!(stats.records, 2);
    assert_eq!(out, "1.0,1.0,1,100,3,0\n3.0,1.0,1,100,3,0\n");
}

#[test]
fn test_truncated_log_reports_and_continues() {
    let log = [
        readv_end("1970-01-01 00:00:01.000000 +0000", 3, 100, "ok"),
        readv_start("1970-01-01 00:00:02.000000 +0000", 3, 100),
        readv_end("1970-01-01 00:00:02.500000 +0000", 3, 100, "ok"),
    ]
    .join("\n");

    let (out, diag, stats) = run(&log, RequestFlavor::Readv);

    // The orphan end yields no row; the later pair is unaffected
    assert_eq!(out, "2.0,0.5,0,100,3,0\n");
    assert_eq!(stats.records, 1);
    assert_eq!(stats.diagnostics, 1);
    assert!(diag.contains(
        "Found end of request (100, 3), but can not find start! Probably log is incomplete, multiple error messages are present."
    ));
}

#[test]
fn test_left_open_requests_reported_at_end() {
    let log = [
        readv_start("1970-01-01 00:00:01.000000 +0000", 3, 100),
        readv_start("1970-01-01 00:00:02.000000 +0000", 3, 100),
        readv_end("1970-01-01 00:00:03.000000 +0000", 3, 100, "ok"),
    ]
    .join("\n");

    let (_, diag, stats) = run(&log, RequestFlavor::Readv);

    assert_eq!(stats.records, 1);
    assert_eq!(stats.diagnostics, 1);
    assert!(diag.contains("1 request(s) of shape (100, 3) never completed"));
}

#[test]
fn test_orphan_chunk_before_any_start() {
    let log = [
        chunk("1970-01-01 00:00:01.000000 +0000", 40, 0),
        readv_start("1970-01-01 00:00:02.000000 +0000", 3, 100),
        readv_end("1970-01-01 00:00:03.000000 +0000", 3, 100, "ok"),
    ]
    .join("\n");

    let (out, diag, stats) = run(&log, RequestFlavor::Readv);

    // The stray chunk contributes nothing to the later request
    assert_eq!(out, "2.0,1.0,0,100,3,0\n");
    assert_eq!(stats.diagnostics, 1);
    assert!(diag.contains("Chunk 40@0 completed with no request in flight"));
}

#[test]
fn test_chunked_input_is_equivalent_to_one_read() {
    let log = [
        readv_start("1970-01-01 00:16:40.000000 +0000", 3, 100),
        chunk("1970-01-01 00:16:40.100000 +0000", 40, 0),
        chunk("1970-01-01 00:16:40.200000 +0000", 40, 60),
        readv_end("1970-01-01 00:16:40.500000 +0000", 3, 100, "ok"),
        readv_start("1970-01-01 00:16:41.000000 +0000", 2, 50),
        readv_end("1970-01-01 00:16:41.250000 +0000", 2, 50, "ok"),
    ]
    .join("\n");

    let (whole_out, whole_diag, _) = run(&log, RequestFlavor::Readv);

    // Split mid-line, delivered by two separate underlying readers
    let bytes = log.as_bytes();
    let split = bytes.len() / 2;
    let reader = Cursor::new(bytes[..split].to_vec()).chain(Cursor::new(bytes[split..].to_vec()));

    let mut out = Vec::new();
    let mut diag = Vec::new();
    run_extraction(
        std::io::BufReader::new(reader),
        &mut out,
        &mut diag,
        RequestFlavor::Readv,
        5,
        false,
    )
    .unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), whole_out);
    assert_eq!(String::from_utf8(diag).unwrap(), whole_diag);
}

#[test]
fn test_read_flavor_table() {
    let log = [
        read_start("1970-01-01 00:16:40.000000 +0000", 1024, 4096),
        read_end("1970-01-01 00:16:40.250000 +0000", 1024, 4096, "ok"),
        read_start("1970-01-01 00:16:41.000000 +0000", 8192, 4096),
        read_end("1970-01-01 00:16:41.100000 +0000", 8192, 4096, "error"),
    ]
    .join("\n");

    let (out, diag, stats) = run(&log, RequestFlavor::Read);

    assert_eq!(stats.records, 2);
    // Five columns, no spread
    assert_eq!(out, "1000.0,0.25,0,4096,1024\n1001.0,0.1,1,4096,8192\n");
    // No chunk data ever, so the summary stays empty
    assert_eq!(
        diag,
        "Max spread = 0, request = none, buf_start=-1, buf_end=-1\n"
    );
}

#[test]
fn test_empty_log_is_success() {
    let (out, diag, stats) = run("", RequestFlavor::Readv);

    assert_eq!(out, "");
    assert_eq!(stats, ExtractStats::default());
    assert_eq!(
        diag,
        "Max spread = 0, request = none, buf_start=-1, buf_end=-1\n"
    );
}

#[test]
fn test_unrelated_lines_are_silent() {
    let log = [
        "[1970-01-01 00:00:01.000000 +0000] [Debug][Poller] Adding socket to the poller".to_string(),
        readv_start("1970-01-01 00:00:02.000000 +0000", 3, 100),
        "some line without a timestamp at all".to_string(),
        readv_end("1970-01-01 00:00:03.000000 +0000", 3, 100, "ok"),
    ]
    .join("\n");

    let (out, _, stats) = run(&log, RequestFlavor::Readv);

    assert_eq!(stats.lines, 4);
    assert_eq!(stats.records, 1);
    assert_eq!(stats.diagnostics, 0);
    assert_eq!(out, "2.0,1.0,0,100,3,0\n");
}

#[test]
fn test_header_row() {
    let log = [
        readv_start("1970-01-01 00:00:01.000000 +0000", 3, 100),
        readv_end("1970-01-01 00:00:02.000000 +0000", 3, 100, "ok"),
    ]
    .join("\n");

    let mut out = Vec::new();
    run_extraction(
        Cursor::new(log.into_bytes()),
        &mut out,
        std::io::sink(),
        RequestFlavor::Readv,
        5,
        true,
    )
    .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "start,duration,state,size,chunks,spread\n1.0,1.0,0,100,3,0\n"
    );
}

#[test]
fn test_malformed_timestamp_on_matched_line_aborts() {
    // Month 13 survives the line pattern but not the date parser
    let log = readv_start("1970-13-01 00:00:01.000000 +0000", 3, 100);

    let result = run_extraction(
        Cursor::new(log.into_bytes()),
        std::io::sink(),
        std::io::sink(),
        RequestFlavor::Readv,
        5,
        false,
    );

    assert!(result.is_err());
}

#[test]
fn test_execute_extract_over_files() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("client.log");
    let out_path = dir.path().join("times.csv");

    let log = [
        readv_start("1970-01-01 00:16:40.000000 +0000", 3, 100),
        chunk("1970-01-01 00:16:40.100000 +0000", 40, 0),
        chunk("1970-01-01 00:16:40.200000 +0000", 40, 60),
        readv_end("1970-01-01 00:16:40.500000 +0000", 3, 100, "ok"),
    ]
    .join("\n");
    std::fs::write(&log_path, log).unwrap();

    execute_extract(ExtractArgs {
        log: log_path.to_string_lossy().into_owned(),
        output: out_path.to_string_lossy().into_owned(),
        flavor: RequestFlavor::Readv,
        flush_every: 5,
        header: false,
    })
    .unwrap();

    let written = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(written, "1000.0,0.5,0,100,3,100\n");
}

#[test]
fn test_missing_log_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let result = execute_extract(ExtractArgs {
        log: dir
            .path()
            .join("does-not-exist.log")
            .to_string_lossy()
            .into_owned(),
        output: "-".to_string(),
        flavor: RequestFlavor::Readv,
        flush_every: 5,
        header: false,
    });
    assert!(result.is_err());
}
