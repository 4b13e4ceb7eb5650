//! Trial runner I/O boundary interfaces
//!
//! This module defines trait-based abstractions for the key trial runner
//! operations:
//! - Payload discovery (filesystem scan)
//! - Command execution (shell invocation with timeout)
//! - Stop policy (continue-after-hit decision)
//!
//! These interfaces keep the run loop deterministic under test: a fake
//! executor and a canned decision replace the shell and the terminal
//! without changing the orchestration logic. Default implementations
//! preserve the interactive behavior.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::console;
use crate::exec::{self, ExecOutcome};
use crate::scan::{self, ScanError};

/// Errors that occur while setting up or running trials
#[derive(Debug, Error)]
pub enum TrialError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("failed to start async runtime: {0}")]
    Runtime(io::Error),
}

// ============================================================================
// Payload Discovery Interface
// ============================================================================

/// Discover payload files under a root directory.
pub trait PayloadDiscovery {
    /// Find all payload files with the given extension (recursive), in
    /// deterministic lexicographic order.
    fn discover(&self, root: &Path, extension: &str) -> Result<Vec<PathBuf>, TrialError>;
}

/// Filesystem-based discovery (current behavior).
pub struct DefaultPayloadDiscovery;

impl PayloadDiscovery for DefaultPayloadDiscovery {
    fn discover(&self, root: &Path, extension: &str) -> Result<Vec<PathBuf>, TrialError> {
        Ok(scan::scan_payloads(root, extension)?)
    }
}

// ============================================================================
// Trial Executor Interface
// ============================================================================

/// Execute one rendered command with a wall-clock limit.
///
/// Launch failures are part of the returned [`ExecOutcome`], never an
/// `Err`: no execution fault may abort the run.
pub trait TrialExecutor {
    fn execute(&self, command: &str, limit: Duration) -> ExecOutcome;
}

/// Host-shell execution on a current-thread tokio runtime (current
/// behavior). One trial blocks the control thread until the child exits or
/// the limit expires.
pub struct ShellExecutor {
    runtime: tokio::runtime::Runtime,
}

impl ShellExecutor {
    pub fn new() -> Result<Self, TrialError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TrialError::Runtime)?;
        Ok(Self { runtime })
    }
}

impl TrialExecutor for ShellExecutor {
    fn execute(&self, command: &str, limit: Duration) -> ExecOutcome {
        self.runtime.block_on(exec::run_with_timeout(command, limit))
    }
}

// ============================================================================
// Continue Decision Interface
// ============================================================================

/// Decide whether to keep testing after a successful payload.
///
/// Consulted only on success: a hit usually needs manual follow-up before
/// the run is worth continuing, while failures never pause the loop.
pub trait ContinueDecision {
    fn should_continue(&mut self, payload: &Path) -> bool;
}

/// Never stops. The default in non-interactive and test contexts.
pub struct AlwaysContinue;

impl ContinueDecision for AlwaysContinue {
    fn should_continue(&mut self, _payload: &Path) -> bool {
        true
    }
}

/// Prompts on stdin. Anything but an affirmative answer - including EOF,
/// which is what an interrupt leaves behind - stops the run.
pub struct InteractivePrompt;

impl ContinueDecision for InteractivePrompt {
    fn should_continue(&mut self, _payload: &Path) -> bool {
        print!(
            "{}",
            console::yellow("  [?] Continue testing remaining payloads? (y/n): ")
        );
        let _ = io::stdout().flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_affirmative(&line),
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    )
}
