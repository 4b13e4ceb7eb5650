//! External process execution
//!
//! One trial = one command run through the host shell with a wall-clock
//! limit. The outcome is a tagged result; classification into a display
//! status is separate because the exit code is diagnostic only and never
//! decides the vulnerability verdict.
//!
//! Timeout handling is the one place here that needs careful resource
//! discipline: the child runs in its own process group (unix), and on
//! timeout the whole group is killed and the child reaped, so neither
//! zombies nor orphaned grandchildren of `sh -c` survive the trial.

use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::time;
use tracing::debug;

/// Upper bound on captured stdout/stderr per stream. Output past the cap is
/// still drained (a blocked pipe would deadlock the child) but discarded.
const MAX_CAPTURE_BYTES: usize = 1024 * 1024;

/// Tagged result of one command execution.
#[derive(Debug)]
pub enum ExecOutcome {
    /// The command ran to completion before the deadline.
    Completed {
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
    /// The command exceeded the wall-clock limit and was killed.
    TimedOut,
    /// The command could not be started or awaited.
    LaunchFailed(String),
}

/// Diagnostic classification of an [`ExecOutcome`]. Never determines the
/// verdict; only the marker file does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecStatus {
    Success,
    Error(i32),
    Timeout,
    Exception(String),
}

impl ExecStatus {
    pub fn classify(outcome: &ExecOutcome) -> Self {
        match outcome {
            ExecOutcome::Completed { status, .. } => match status.code() {
                Some(0) => ExecStatus::Success,
                Some(code) => ExecStatus::Error(code),
                None => ExecStatus::Exception(no_exit_code_description(status)),
            },
            ExecOutcome::TimedOut => ExecStatus::Timeout,
            ExecOutcome::LaunchFailed(reason) => ExecStatus::Exception(reason.clone()),
        }
    }
}

impl fmt::Display for ExecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecStatus::Success => write!(f, "success"),
            ExecStatus::Error(code) => write!(f, "error (code {code})"),
            ExecStatus::Timeout => write!(f, "timeout"),
            ExecStatus::Exception(message) => write!(f, "exception: {message}"),
        }
    }
}

#[cfg(unix)]
fn no_exit_code_description(status: &ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => format!("terminated by signal {signal}"),
        None => "terminated without exit code".to_string(),
    }
}

#[cfg(not(unix))]
fn no_exit_code_description(_status: &ExitStatus) -> String {
    "terminated without exit code".to_string()
}

/// Run `command` through the host shell, waiting at most `limit`.
///
/// Stdout and stderr are drained concurrently with the wait so the child can
/// never block on pipe backpressure. On timeout the child's process group is
/// killed and the child reaped before `TimedOut` is returned.
pub async fn run_with_timeout(command: &str, limit: Duration) -> ExecOutcome {
    let mut child = match shell_command(command).spawn() {
        Ok(child) => child,
        Err(e) => return ExecOutcome::LaunchFailed(format!("failed to spawn '{command}': {e}")),
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let finished = time::timeout(limit, async {
        tokio::join!(child.wait(), read_bounded(stdout), read_bounded(stderr))
    })
    .await;

    match finished {
        Ok((Ok(status), stdout, stderr)) => ExecOutcome::Completed {
            status,
            stdout,
            stderr,
        },
        Ok((Err(e), _, _)) => ExecOutcome::LaunchFailed(format!("failed to await child: {e}")),
        Err(_elapsed) => {
            terminate(&mut child).await;
            ExecOutcome::TimedOut
        }
    }
}

/// Build the shell invocation: stdin closed, both output streams captured.
fn shell_command(command: &str) -> Command {
    #[cfg(unix)]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        // Own process group, so a timeout kill reaches the shell's children.
        cmd.process_group(0);
        cmd
    };

    #[cfg(not(unix))]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Kill a timed-out child and reap it.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // SAFETY: plain POSIX kill(2) aimed at the process group this tool
        // created via process_group(0); no memory is involved.
        #[allow(unsafe_code)]
        let rc = unsafe { libc::kill(-(pid as i32), libc::SIGKILL) };
        if rc != 0 {
            debug!(
                pid,
                error = %std::io::Error::last_os_error(),
                "process group kill failed"
            );
        }
    }

    if let Err(e) = child.kill().await {
        debug!(error = %e, "failed to kill timed-out child");
    }
    let _ = child.wait().await;
}

/// Drain a pipe to completion, keeping at most [`MAX_CAPTURE_BYTES`].
async fn read_bounded<R>(reader: Option<R>) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return String::new();
    };

    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if buf.len() < MAX_CAPTURE_BYTES {
                    let take = n.min(MAX_CAPTURE_BYTES - buf.len());
                    buf.extend_from_slice(&chunk[..take]);
                }
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
