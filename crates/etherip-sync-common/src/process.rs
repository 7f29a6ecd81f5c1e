//! External command execution.
//!
//! Commands are spawned directly with an argument vector, never through a
//! shell, so unit names taken from a document or a listing need no quoting.
//! The program is looked up on `PATH`.
//!
//! # Example
//!
//! ```ignore
//! use etherip_sync_common::process::{self, SYSTEMCTL_CMD};
//!
//! let output = process::exec_or_throw(SYSTEMCTL_CMD, &["stop", "tap-etherip@64496-1"]).await?;
//! ```

use std::process::Stdio;
use tokio::process::Command;

use crate::error::{SyncError, SyncResult};

/// The `systemctl` program, resolved through `PATH`.
pub const SYSTEMCTL_CMD: &str = "systemctl";

/// Renders a program and its arguments as one line for logs and errors.
///
/// # Example
///
/// ```
/// use etherip_sync_common::process::command_line;
///
/// assert_eq!(
///     command_line("systemctl", &["restart", "tap-etherip@t1"]),
///     "systemctl restart tap-etherip@t1"
/// );
/// ```
pub fn command_line<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg.as_ref());
    }
    line
}

/// Outcome of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, or -1 when the process was killed by a signal.
    pub exit_code: i32,
    /// Trimmed stdout.
    pub stdout: String,
    /// Trimmed stderr.
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stderr if the command wrote any, stdout otherwise.
    pub fn diagnostic(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Runs `program` with `args` and waits for it to exit.
///
/// A non-zero exit is not an error here; see [`exec_or_throw`].
pub async fn exec<S: AsRef<str>>(program: &str, args: &[S]) -> SyncResult<CommandOutput> {
    let line = command_line(program, args);
    tracing::debug!(command = %line, "Running command");

    let output = Command::new(program)
        .args(args.iter().map(|a| a.as_ref()))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| SyncError::CommandSpawn {
            command: line.clone(),
            source,
        })?;

    let result = CommandOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    };

    if !result.success() {
        tracing::warn!(
            command = %line,
            exit_code = result.exit_code,
            stderr = %result.stderr,
            "Command exited non-zero"
        );
    }
    Ok(result)
}

/// Runs `program` with `args`, returning stdout or a
/// [`SyncError::CommandFailed`] on a non-zero exit.
pub async fn exec_or_throw<S: AsRef<str>>(program: &str, args: &[S]) -> SyncResult<String> {
    let result = exec(program, args).await?;
    if result.success() {
        return Ok(result.stdout);
    }
    Err(SyncError::CommandFailed {
        command: command_line(program, args),
        exit_code: result.exit_code,
        output: result.diagnostic().to_string(),
    })
}
