//! CLI command implementation
//!
//! Resolves parsed arguments into `CheckOptions` and hands off to the
//! trial runner. Command functions return `CliResult<ExitCode>` instead of
//! calling `process::exit`; error handling and exits happen in the
//! top-level `run()`.

use std::time::Duration;

use crate::marker::MarkerFile;
use crate::template::CommandTemplate;

use super::trial_runner::{self, CheckOptions};
use super::{Cli, CliError, CliResult, ExitCode};

/// Run the batch check described by the CLI arguments.
pub fn check_payloads(cli: Cli) -> CliResult<ExitCode> {
    let options = resolve_options(cli)?;
    trial_runner::run_check(&options)
}

/// Validate and convert CLI arguments into runner options.
fn resolve_options(cli: Cli) -> CliResult<CheckOptions> {
    if cli.timeout == 0 {
        return Err(CliError::failure("[-] --timeout must be greater than zero"));
    }
    if cli.extension.is_empty() {
        return Err(CliError::failure("[-] --extension must not be empty"));
    }

    Ok(CheckOptions {
        payload_dir: cli.payload_dir,
        command: CommandTemplate::new(cli.command),
        timeout: Duration::from_secs(cli.timeout),
        grace: Duration::from_millis(cli.grace_ms),
        marker: MarkerFile::new(cli.marker),
        extension: cli.extension.trim_start_matches('.').to_string(),
        report_path: cli.output,
        interactive: !cli.yes,
        verbose: cli.verbose,
    })
}
