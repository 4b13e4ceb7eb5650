//! CLI module for gadgetcheck
//!
//! ## Usage
//!
//! `gadgetcheck <PAYLOAD_DIR> <COMMAND> [OPTIONS]`
//!
//! Recursively scans `PAYLOAD_DIR` for payload archives, runs `COMMAND`
//! once per payload with a wall-clock timeout, and judges each payload by
//! whether the marker file exists afterwards.
//!
//! ## Modules
//!
//! - `commands` - Command implementation and option wiring
//! - `trial_interfaces` - I/O boundary traits (discovery, execution, stop policy)
//! - `trial_runner` - The sequential trial loop and console reporting
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits. Parse
//! errors exit 1 (help/version exit 0), matching the tool's documented
//! exit-code contract.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;
pub mod trial_interfaces;
pub mod trial_runner;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use crate::marker;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const EXAMPLES: &str = "Examples:
  gadgetcheck ./phar_gadgets \"php test_app.php {payload}\"
  gadgetcheck ./phar_gadgets \"php vulnerable_app.php\"
  gadgetcheck ./gadgets \"java -jar target.jar\" --extension jar --marker /tmp/pwned

Use the {payload} placeholder for the payload path in the command;
without it the path is appended as the final argument.";

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Batch checker for archive deserialization gadget-chain payloads
#[derive(Parser, Debug)]
#[command(name = "gadgetcheck")]
#[command(version = VERSION)]
#[command(about = "Batch checker for archive deserialization gadget-chain payloads")]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// Directory scanned recursively for payload archives
    #[arg(value_name = "PAYLOAD_DIR")]
    pub payload_dir: PathBuf,

    /// Command run once per payload; every `{payload}` expands to the
    /// payload path
    #[arg(value_name = "COMMAND")]
    pub command: String,

    /// Wall-clock limit per trial, in seconds
    #[arg(short = 't', long, value_name = "SECS", default_value_t = 10)]
    pub timeout: u64,

    /// Delay before the marker check, in milliseconds
    #[arg(long = "grace-ms", value_name = "MS", default_value_t = 500)]
    pub grace_ms: u64,

    /// Marker file whose existence signals a successful gadget chain
    #[arg(short = 'm', long, value_name = "PATH", default_value = marker::DEFAULT_MARKER_PATH)]
    pub marker: PathBuf,

    /// Payload file extension to scan for
    #[arg(short = 'e', long, value_name = "EXT", default_value = "phar")]
    pub extension: String,

    /// Report path (default: auto-named from the run's start timestamp)
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Never prompt after a hit; test every payload
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Verbose trial output
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            use clap::error::ErrorKind;
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            process::exit(code);
        }
    };

    match commands::check_payloads(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
