//! Run summary and report writing
//!
//! The summary accumulates across the run and is serialized once at the
//! end, whether the loop completed or was stopped early. The report is
//! human-readable but schema-stable: label lines followed by values, so
//! external post-processing can rely on it.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};

/// Aggregate outcome of one run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub payload_dir: PathBuf,
    pub command: String,
    pub marker: PathBuf,
    /// Payloads discovered by the scan.
    pub total: usize,
    /// Payloads actually attempted; less than `total` after an early stop.
    pub tested: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Names of successful payloads, in discovery order.
    pub successful: Vec<String>,
    pub duration: Duration,
}

impl RunSummary {
    pub fn new(
        payload_dir: impl Into<PathBuf>,
        command: impl Into<String>,
        marker: impl Into<PathBuf>,
        total: usize,
    ) -> Self {
        Self {
            started_at: Local::now(),
            payload_dir: payload_dir.into(),
            command: command.into(),
            marker: marker.into(),
            total,
            tested: 0,
            succeeded: 0,
            failed: 0,
            successful: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Record one trial. Succeeded means the marker existed after the grace
    /// delay, nothing else.
    pub fn record(&mut self, payload_name: &str, succeeded: bool) {
        self.tested += 1;
        if succeeded {
            self.succeeded += 1;
            self.successful.push(payload_name.to_string());
        } else {
            self.failed += 1;
        }
    }

    /// Report file name derived from the run's start timestamp.
    pub fn default_report_path(&self) -> PathBuf {
        PathBuf::from(format!(
            "gadget_check_results_{}.txt",
            self.started_at.format("%Y%m%d_%H%M%S")
        ))
    }
}

/// Render the report text. Label lines and their order are stable across
/// runs.
pub fn render_report(summary: &RunSummary) -> String {
    let rule = "=".repeat(50);
    let mut out = String::new();

    let _ = writeln!(out, "Gadget Chain Test Results");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Test Date: {}", summary.started_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Payload Directory: {}", summary.payload_dir.display());
    let _ = writeln!(out, "Command Template: {}", summary.command);
    let _ = writeln!(out, "Marker File: {}", summary.marker.display());
    let _ = writeln!(out);
    let _ = writeln!(out, "Summary");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Total Payloads: {}", summary.total);
    let _ = writeln!(out, "Tested: {}", summary.tested);
    let _ = writeln!(out, "Successful: {}", summary.succeeded);
    let _ = writeln!(out, "Failed: {}", summary.failed);
    let _ = writeln!(out, "Duration: {:.2} seconds", summary.duration.as_secs_f64());

    if !summary.successful.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Successful Gadgets:");
        for name in &summary.successful {
            let _ = writeln!(out, "  - {name}");
        }
    }

    out
}

/// Write the report in one shot.
pub fn write_report(path: &Path, summary: &RunSummary) -> io::Result<()> {
    fs::write(path, render_report(summary))
}
