//! Trial runner implementation
//!
//! ## TrialReporter Trait
//!
//! The runner uses a `TrialReporter` trait to separate presentation from
//! execution. The default `ConsoleReporter` prints the colored progress
//! output; alternative formats implement the trait.
//!
//! ## I/O Boundaries
//!
//! Payload discovery, command execution, and the continue-after-hit
//! decision are abstracted via traits in `trial_interfaces.rs`, so the
//! loop's control flow - including the early-stop path - is testable
//! without a shell or a terminal.
//!
//! ## Verdict
//!
//! A payload is successful if and only if the marker file exists after the
//! grace delay. The command's exit status is recorded as a diagnostic and
//! has no influence on the verdict: gadget chains routinely crash the host
//! process after the side effect has already happened, so exit-code
//! detection would under-report.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::console;
use crate::exec::{ExecOutcome, ExecStatus};
use crate::marker::MarkerFile;
use crate::report::{self, RunSummary};
use crate::template::CommandTemplate;

use super::trial_interfaces::{
    AlwaysContinue, ContinueDecision, DefaultPayloadDiscovery, InteractivePrompt, PayloadDiscovery,
    ShellExecutor, TrialExecutor,
};
use super::{CliError, CliResult, ExitCode};

// ============================================================================
// Options and per-trial data
// ============================================================================

/// Everything one run needs, resolved from the CLI surface.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub payload_dir: PathBuf,
    pub command: CommandTemplate,
    /// Wall-clock limit per trial.
    pub timeout: Duration,
    /// Delay between command completion and the marker check.
    pub grace: Duration,
    pub marker: MarkerFile,
    pub extension: String,
    /// Explicit report path; auto-named from the start timestamp if unset.
    pub report_path: Option<PathBuf>,
    /// Prompt after each hit instead of continuing unconditionally.
    pub interactive: bool,
    pub verbose: bool,
}

/// Result of testing a single payload.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub payload: PathBuf,
    /// The verdict: the marker existed after the grace delay.
    pub marker_created: bool,
    /// Diagnostic only; never part of the verdict.
    pub status: ExecStatus,
    pub duration: Duration,
}

impl TrialOutcome {
    pub fn payload_name(&self) -> &str {
        self.payload
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
    }
}

// ============================================================================
// Trial Reporter Trait
// ============================================================================

/// Presentation callbacks for one run. All methods default to no-ops so
/// test reporters only implement what they observe.
pub trait TrialReporter {
    /// Called once before any trial, with the resolved report path.
    fn on_run_start(&mut self, _options: &CheckOptions, _report_path: &Path) {}

    /// Called after discovery with the number of payloads found.
    fn on_scan_complete(&mut self, _total: usize) {}

    /// Called before each trial.
    fn on_trial_start(&mut self, _index: usize, _total: usize, _payload: &Path) {}

    /// Called with the fully rendered command line, just before execution.
    fn on_trial_exec(&mut self, _command: &str) {}

    /// Called once per trial with the outcome.
    fn on_trial_complete(&mut self, _outcome: &TrialOutcome) {}

    /// Called when the user declined to continue after a hit.
    fn on_stopped_early(&mut self) {}

    /// Called once after the loop with the final summary.
    fn on_run_complete(&mut self, _summary: &RunSummary) {}

    /// Called after the report file has been written.
    fn on_report_written(&mut self, _path: &Path) {}
}

/// Default console reporter: colored progress output on stdout.
#[derive(Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl TrialReporter for ConsoleReporter {
    fn on_run_start(&mut self, options: &CheckOptions, report_path: &Path) {
        console::print_banner();
        println!(
            "{}",
            console::blue(&format!(
                "[*] Payload Directory: {}",
                options.payload_dir.display()
            ))
        );
        println!(
            "{}",
            console::blue(&format!("[*] Command Template: {}", options.command))
        );
        println!(
            "{}",
            console::blue(&format!(
                "[*] Marker File: {}",
                options.marker.path().display()
            ))
        );
        println!(
            "{}",
            console::blue(&format!("[*] Results File: {}", report_path.display()))
        );
        println!();
    }

    fn on_scan_complete(&mut self, total: usize) {
        println!(
            "{}",
            console::green(&format!("[+] Found {total} payload file(s) to test"))
        );
        println!();
    }

    fn on_trial_start(&mut self, index: usize, total: usize, payload: &Path) {
        let name = payload
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        println!(
            "{}",
            console::yellow(&format!("[{index}/{total}] Testing: {name}"))
        );
        if self.verbose {
            println!("{}", console::cyan(&format!("  Path: {}", payload.display())));
        }
    }

    fn on_trial_exec(&mut self, command: &str) {
        println!("{}", console::blue(&format!("  [*] Executing: {command}")));
    }

    fn on_trial_complete(&mut self, outcome: &TrialOutcome) {
        if outcome.marker_created {
            println!("{}", console::green("  [✓] SUCCESS! Marker file was created"));
            println!("{}", console::green("  [!] VULNERABLE GADGET FOUND!"));
        } else {
            println!("{}", console::red("  [✗] Failed - marker file not created"));
        }
        println!("  Execution Status: {}", outcome.status);
        println!();
    }

    fn on_stopped_early(&mut self) {
        println!("{}", console::yellow("[*] Stopping test as requested"));
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        println!();
        println!(
            "{}",
            console::bold("=================== Test Summary ===================")
        );
        println!("Total Payloads Tested: {}", summary.tested);
        println!(
            "{}",
            console::green(&format!("Successful: {}", summary.succeeded))
        );
        println!("{}", console::red(&format!("Failed: {}", summary.failed)));
        println!("Duration: {:.2} seconds", summary.duration.as_secs_f64());
        println!();

        if !summary.successful.is_empty() {
            println!("{}", console::green("[+] Vulnerable gadgets found:"));
            for name in &summary.successful {
                println!("  {}", console::green(&format!("✓ {name}")));
            }
            println!();
        }
    }

    fn on_report_written(&mut self, path: &Path) {
        println!(
            "{}",
            console::blue(&format!("[*] Detailed results saved to: {}", path.display()))
        );
    }
}

// ============================================================================
// Run loop
// ============================================================================

/// Run a full check with the default discovery, executor, reporter, and
/// the stop policy selected by `options.interactive`.
pub fn run_check(options: &CheckOptions) -> CliResult<ExitCode> {
    let executor = ShellExecutor::new().map_err(|e| CliError::failure(format!("[-] {e}")))?;
    let mut reporter = ConsoleReporter::new(options.verbose);

    if options.interactive {
        let mut decision = InteractivePrompt;
        run_check_with(
            options,
            &DefaultPayloadDiscovery,
            &executor,
            &mut decision,
            &mut reporter,
        )
    } else {
        let mut decision = AlwaysContinue;
        run_check_with(
            options,
            &DefaultPayloadDiscovery,
            &executor,
            &mut decision,
            &mut reporter,
        )
    }
}

/// Run a full check with injected boundaries. Sequential: one trial at a
/// time on the calling thread, no retries, and no trial fault ever aborts
/// the loop. The report is written even after an early stop.
pub fn run_check_with(
    options: &CheckOptions,
    discovery: &dyn PayloadDiscovery,
    executor: &dyn TrialExecutor,
    decision: &mut dyn ContinueDecision,
    reporter: &mut dyn TrialReporter,
) -> CliResult<ExitCode> {
    let run_started = Instant::now();

    let payloads = discovery
        .discover(&options.payload_dir, &options.extension)
        .map_err(|e| CliError::failure(format!("[-] {e}")))?;

    if payloads.is_empty() {
        return Err(CliError::failure(format!(
            "[-] No .{} payload files found in {}",
            options.extension,
            options.payload_dir.display()
        )));
    }

    let total = payloads.len();
    let mut summary = RunSummary::new(
        &options.payload_dir,
        options.command.as_str(),
        options.marker.path(),
        total,
    );
    let report_path = options
        .report_path
        .clone()
        .unwrap_or_else(|| summary.default_report_path());

    reporter.on_run_start(options, &report_path);
    reporter.on_scan_complete(total);

    let mut stopped = false;
    for (index, payload) in payloads.iter().enumerate() {
        reporter.on_trial_start(index + 1, total, payload);

        // A marker surviving the previous trial would turn this one into a
        // false positive.
        options.marker.clear();

        let command = options.command.render(payload);
        debug!(%command, "running trial");
        reporter.on_trial_exec(&command);

        let trial_started = Instant::now();
        let exec_outcome = executor.execute(&command, options.timeout);
        if let ExecOutcome::Completed { stdout, stderr, .. } = &exec_outcome {
            if !stdout.is_empty() {
                debug!(payload = %payload.display(), "captured stdout:\n{stdout}");
            }
            if !stderr.is_empty() {
                debug!(payload = %payload.display(), "captured stderr:\n{stderr}");
            }
        }
        let status = ExecStatus::classify(&exec_outcome);

        let marker_created = options.marker.probe(options.grace);
        let outcome = TrialOutcome {
            payload: payload.clone(),
            marker_created,
            status,
            duration: trial_started.elapsed(),
        };

        summary.record(outcome.payload_name(), marker_created);
        reporter.on_trial_complete(&outcome);

        if marker_created && !decision.should_continue(payload) {
            stopped = true;
            break;
        }
    }

    summary.duration = run_started.elapsed();
    if stopped {
        reporter.on_stopped_early();
    }
    reporter.on_run_complete(&summary);

    report::write_report(&report_path, &summary).map_err(|e| {
        CliError::failure(format!(
            "[-] Failed to write report {}: {e}",
            report_path.display()
        ))
    })?;
    reporter.on_report_written(&report_path);

    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;

    /// Executor that never runs a shell: it notes whether the marker was
    /// already present, then "creates" the marker for matching commands
    /// while reporting a launch failure for every trial.
    struct MarkerWritingExecutor {
        marker: PathBuf,
        hit_substring: &'static str,
        marker_present_at_exec: RefCell<Vec<bool>>,
        commands: RefCell<Vec<String>>,
    }

    impl MarkerWritingExecutor {
        fn new(marker: PathBuf, hit_substring: &'static str) -> Self {
            Self {
                marker,
                hit_substring,
                marker_present_at_exec: RefCell::new(Vec::new()),
                commands: RefCell::new(Vec::new()),
            }
        }
    }

    impl TrialExecutor for MarkerWritingExecutor {
        fn execute(&self, command: &str, _limit: Duration) -> ExecOutcome {
            self.marker_present_at_exec
                .borrow_mut()
                .push(self.marker.exists());
            self.commands.borrow_mut().push(command.to_string());
            if command.contains(self.hit_substring) {
                fs::write(&self.marker, b"").unwrap();
            }
            ExecOutcome::LaunchFailed("deliberate fault".to_string())
        }
    }

    /// Reporter that collects outcomes and the final summary.
    #[derive(Default)]
    struct CollectingReporter {
        outcomes: Vec<TrialOutcome>,
        stopped_early: bool,
        summary: Option<RunSummary>,
    }

    impl TrialReporter for CollectingReporter {
        fn on_trial_complete(&mut self, outcome: &TrialOutcome) {
            self.outcomes.push(outcome.clone());
        }

        fn on_stopped_early(&mut self) {
            self.stopped_early = true;
        }

        fn on_run_complete(&mut self, summary: &RunSummary) {
            self.summary = Some(summary.clone());
        }
    }

    /// Stops at the first hit, like a user answering "n".
    struct StopAfterFirstHit;

    impl ContinueDecision for StopAfterFirstHit {
        fn should_continue(&mut self, _payload: &Path) -> bool {
            false
        }
    }

    fn options_for(dir: &Path, marker: &Path, report: &Path) -> CheckOptions {
        CheckOptions {
            payload_dir: dir.to_path_buf(),
            command: CommandTemplate::new("run {payload}"),
            timeout: Duration::from_secs(1),
            grace: Duration::ZERO,
            marker: MarkerFile::new(marker),
            extension: "phar".to_string(),
            report_path: Some(report.to_path_buf()),
            interactive: false,
            verbose: false,
        }
    }

    fn payload_dir_with(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), b"payload").unwrap();
        }
        dir
    }

    #[test]
    fn verdict_follows_marker_independent_of_exec_status() {
        let dir = payload_dir_with(&["one.phar", "two.phar", "three.phar"]);
        let marker = dir.path().join("poc");
        let report = dir.path().join("report.txt");
        let options = options_for(dir.path(), &marker, &report);

        let executor = MarkerWritingExecutor::new(marker.clone(), "two.phar");
        let mut decision = AlwaysContinue;
        let mut reporter = CollectingReporter::default();

        let exit = run_check_with(
            &options,
            &DefaultPayloadDiscovery,
            &executor,
            &mut decision,
            &mut reporter,
        )
        .unwrap();
        assert_eq!(exit, ExitCode::SUCCESS);

        // Every execution "failed", yet the marker decided the verdict.
        assert!(reporter
            .outcomes
            .iter()
            .all(|o| matches!(o.status, ExecStatus::Exception(_))));
        let verdicts: Vec<bool> = reporter.outcomes.iter().map(|o| o.marker_created).collect();
        assert_eq!(verdicts, vec![false, true, false]);

        let summary = reporter.summary.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.tested, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.succeeded + summary.failed, summary.tested);
        assert_eq!(summary.successful, vec!["two.phar".to_string()]);
        assert!(report.exists());
    }

    #[test]
    fn marker_is_absent_before_every_execution() {
        let dir = payload_dir_with(&["a.phar", "b.phar"]);
        let marker = dir.path().join("poc");
        // A stale marker from an earlier run must not leak into trial one.
        fs::write(&marker, b"stale").unwrap();
        let report = dir.path().join("report.txt");
        let options = options_for(dir.path(), &marker, &report);

        let executor = MarkerWritingExecutor::new(marker.clone(), "a.phar");
        let mut decision = AlwaysContinue;
        let mut reporter = CollectingReporter::default();

        run_check_with(
            &options,
            &DefaultPayloadDiscovery,
            &executor,
            &mut decision,
            &mut reporter,
        )
        .unwrap();

        assert_eq!(*executor.marker_present_at_exec.borrow(), vec![false, false]);
    }

    #[test]
    fn commands_are_rendered_per_payload_in_discovery_order() {
        let dir = payload_dir_with(&["z.phar", "a.phar"]);
        let marker = dir.path().join("poc");
        let report = dir.path().join("report.txt");
        let options = options_for(dir.path(), &marker, &report);

        let executor = MarkerWritingExecutor::new(marker, "never-hits");
        let mut decision = AlwaysContinue;
        let mut reporter = CollectingReporter::default();

        run_check_with(
            &options,
            &DefaultPayloadDiscovery,
            &executor,
            &mut decision,
            &mut reporter,
        )
        .unwrap();

        let commands = executor.commands.borrow();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].ends_with("a.phar"));
        assert!(commands[1].ends_with("z.phar"));
        assert!(commands.iter().all(|c| c.starts_with("run ")));
    }

    #[test]
    fn declining_after_a_hit_stops_the_run_but_still_reports() {
        let dir = payload_dir_with(&["one.phar", "two.phar", "three.phar"]);
        let marker = dir.path().join("poc");
        let report = dir.path().join("report.txt");
        let options = options_for(dir.path(), &marker, &report);

        let executor = MarkerWritingExecutor::new(marker, "one.phar");
        let mut decision = StopAfterFirstHit;
        let mut reporter = CollectingReporter::default();

        let exit = run_check_with(
            &options,
            &DefaultPayloadDiscovery,
            &executor,
            &mut decision,
            &mut reporter,
        )
        .unwrap();
        assert_eq!(exit, ExitCode::SUCCESS);
        assert!(reporter.stopped_early);

        let summary = reporter.summary.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.tested, 1);
        assert_eq!(summary.succeeded, 1);
        assert!(summary.tested < summary.total);
        assert!(report.exists());
    }

    #[test]
    fn failures_never_trigger_the_stop_decision() {
        struct PanickingDecision;
        impl ContinueDecision for PanickingDecision {
            fn should_continue(&mut self, _payload: &Path) -> bool {
                panic!("decision must not be consulted without a hit");
            }
        }

        let dir = payload_dir_with(&["one.phar", "two.phar"]);
        let marker = dir.path().join("poc");
        let report = dir.path().join("report.txt");
        let options = options_for(dir.path(), &marker, &report);

        let executor = MarkerWritingExecutor::new(marker, "never-hits");
        let mut decision = PanickingDecision;
        let mut reporter = CollectingReporter::default();

        run_check_with(
            &options,
            &DefaultPayloadDiscovery,
            &executor,
            &mut decision,
            &mut reporter,
        )
        .unwrap();

        let summary = reporter.summary.unwrap();
        assert_eq!(summary.tested, 2);
        assert_eq!(summary.failed, 2);
    }

    #[test]
    fn empty_directory_is_fatal_and_writes_no_report() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("poc");
        let report = dir.path().join("report.txt");
        let options = options_for(dir.path(), &marker, &report);

        let executor = MarkerWritingExecutor::new(marker, "x");
        let mut decision = AlwaysContinue;
        let mut reporter = CollectingReporter::default();

        let err = run_check_with(
            &options,
            &DefaultPayloadDiscovery,
            &executor,
            &mut decision,
            &mut reporter,
        )
        .unwrap_err();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("No .phar payload files"));
        assert!(!report.exists());
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let marker = dir.path().join("poc");
        let report = dir.path().join("report.txt");
        let options = options_for(&missing, &marker, &report);

        let executor = MarkerWritingExecutor::new(marker, "x");
        let mut decision = AlwaysContinue;
        let mut reporter = CollectingReporter::default();

        let err = run_check_with(
            &options,
            &DefaultPayloadDiscovery,
            &executor,
            &mut decision,
            &mut reporter,
        )
        .unwrap_err();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("Directory not found"));
        assert!(!report.exists());
    }
}
