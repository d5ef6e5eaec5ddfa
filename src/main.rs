//! xrdtimes CLI
//!
//! Converts XRootD client debug logs into per-request timing tables
//! for downstream analysis and plotting.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;

use xrdtimes::commands::{execute_extract, validate_args, ExtractArgs};
use xrdtimes::parser::event::RequestFlavor;
use xrdtimes::utils::config::{DEFAULT_FLUSH_EVERY, DEFAULT_OUTPUT, READ_COLUMNS, READV_COLUMNS};

/// xrdtimes - request timings from XRootD client logs
#[derive(Parser, Debug)]
#[command(name = "xrdtimes")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a client log into a CSV timing table
    Extract {
        /// Path to the log file, or `-` for stdin
        log: String,

        /// Path to the output table, or `-` for stdout
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: String,

        /// Request type to extract (readv or read)
        #[arg(short = 'r', long = "request-type", default_value = "readv")]
        request_type: String,

        /// Rows between forced flushes of the output
        #[arg(long, default_value_t = DEFAULT_FLUSH_EVERY)]
        flush_every: usize,

        /// Write a column-name header row before the data
        #[arg(long)]
        header: bool,
    },

    /// Display the output column layout
    Columns {
        /// Request type to describe (readv or read)
        #[arg(short = 'r', long = "request-type", default_value = "readv")]
        request_type: String,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Extract {
            log,
            output,
            request_type,
            flush_every,
            header,
        } => {
            let args = ExtractArgs {
                log,
                output,
                flavor: parse_flavor(&request_type)?,
                flush_every,
                header,
            };

            // Validate args first
            validate_args(&args)?;

            // Execute extraction
            execute_extract(args)?;
        }

        Commands::Columns { request_type } => {
            display_columns(parse_flavor(&request_type)?);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Map the CLI request-type name onto a flavor
///
/// **Private** - internal helper for main
fn parse_flavor(name: &str) -> Result<RequestFlavor> {
    match RequestFlavor::from_name(name) {
        Some(flavor) => Ok(flavor),
        None => bail!("Unsupported request type {name}: expected read or readv"),
    }
}

/// Display the CSV column contract for a flavor
///
/// **Private** - internal command implementation
fn display_columns(flavor: RequestFlavor) {
    let columns = match flavor {
        RequestFlavor::Readv => READV_COLUMNS,
        RequestFlavor::Read => READ_COLUMNS,
    };

    println!("Output columns for {} requests:", flavor.name());
    println!("  {}", columns.join(","));
    println!();
    println!("  start    - request issue time, seconds since the Unix epoch");
    println!("  duration - end-to-start distance in seconds");
    println!("  state    - 0 on kXR_ok, 1 on kXR_error or handled errors");
    println!("  size     - total requested bytes");
    match flavor {
        RequestFlavor::Readv => {
            println!("  chunks   - number of chunks in the vectored request");
            println!("  spread   - width of the byte range covered by chunk buffers");
        }
        RequestFlavor::Read => {
            println!("  offset   - starting offset of the request");
        }
    }
}

/// Display version information
///
/// **Private** - internal command implementation
fn display_version() {
    println!("xrdtimes v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Request timing extraction from XRootD client debug logs.");
}
