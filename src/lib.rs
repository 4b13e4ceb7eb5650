#![deny(unsafe_code)]
//! Gadget-chain payload batch checker
//!
//! `gadgetcheck` tests a directory of candidate exploit archives against a
//! target command. A payload counts as successful when the command's
//! execution leaves a well-known marker file behind — deserialization
//! exploits frequently crash the host process *after* achieving code
//! execution, so the marker is the verdict, never the exit code.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module
//!   enforces `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Unsafe**: denied crate-wide; the single exception is the scoped
//!   process-group kill in `exec`, which carries a SAFETY comment.

pub mod cli;
pub mod console;
pub mod exec;
pub mod marker;
pub mod report;
pub mod scan;
pub mod template;

pub use exec::{ExecOutcome, ExecStatus};
pub use marker::MarkerFile;
pub use report::RunSummary;
pub use scan::scan_payloads;
pub use template::CommandTemplate;
