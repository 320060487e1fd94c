use std::process::{Command, Output, Stdio};

use crate::error::{DeployError, DeployResult};

/// Runs commands on the local machine (rsync, scp, psql, cp).
pub trait Local {
    /// Run `program` with inherited stdio. Fails on a non-zero exit
    /// code.
    fn run(&self, program: &str, args: &[&str]) -> DeployResult<()>;

    /// Check that `program` is available on this machine.
    fn has(&self, program: &str) -> bool {
        command_exists(program)
    }
}

/// [`Local`] backed by real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalShell;

impl Local for LocalShell {
    fn run(&self, program: &str, args: &[&str]) -> DeployResult<()> {
        run_interactive(program, args)
    }
}

/// Run a command and capture its output. Fails if the command
/// returns a non-zero exit code.
pub fn run(program: &str, args: &[&str]) -> DeployResult<String> {
    let output = spawn(program, args)?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let command = format_command(program, args);
        tracing::debug!(%command, %stderr, "command failed");
        eprintln!("stderr: {stderr}");
        Err(DeployError::CommandFailed {
            command,
            status: output.status,
        })
    }
}

/// Run a command with stdin/stdout/stderr inherited (interactive).
pub fn run_interactive(program: &str, args: &[&str]) -> DeployResult<()> {
    tracing::debug!(command = %format_command(program, args), "running");

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| not_found_or_io(program, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(DeployError::CommandFailed {
            command: format_command(program, args),
            status,
        })
    }
}

/// Run a command that pipes its stdin from a byte slice.
pub fn run_with_stdin(program: &str, args: &[&str], stdin_data: &[u8]) -> DeployResult<String> {
    use std::io::Write;

    tracing::debug!(
        command = %format_command(program, args),
        bytes = stdin_data.len(),
        "running with stdin"
    );

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| not_found_or_io(program, e))?;

    if let Some(stdin) = &mut child.stdin {
        stdin.write_all(stdin_data)?;
    }
    drop(child.stdin.take());

    let output = child.wait_with_output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        eprintln!("stderr: {stderr}");
        Err(DeployError::CommandFailed {
            command: format_command(program, args),
            status: output.status,
        })
    }
}

/// Check if a command exists on PATH.
#[must_use]
pub fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

/// Quote a string for a POSIX shell, wrapping it in single quotes.
///
/// ```
/// use slipway::cmd::shell_quote;
///
/// assert_eq!(shell_quote("plain"), "'plain'");
/// assert_eq!(shell_quote("it's"), r"'it'\''s'");
/// ```
#[must_use]
pub fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "'\\''"))
}

fn spawn(program: &str, args: &[&str]) -> DeployResult<Output> {
    tracing::debug!(command = %format_command(program, args), "running");

    Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| not_found_or_io(program, e))
}

fn not_found_or_io(program: &str, e: std::io::Error) -> DeployError {
    if e.kind() == std::io::ErrorKind::NotFound {
        DeployError::CommandNotFound(program.to_string())
    } else {
        DeployError::Io(e)
    }
}

fn format_command(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|a| (*a).to_string()));
    parts.join(" ")
}
