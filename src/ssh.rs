use std::fmt::Write as _;

use crate::cmd::{self, shell_quote};
use crate::error::{DeployError, DeployResult};

/// Runs shell commands and places files on the target host.
pub trait Remote {
    /// Execute a command on the remote host and capture output.
    fn exec(&self, command: &str) -> DeployResult<String>;

    /// Execute a command on the remote host interactively, so
    /// password prompts reach the terminal.
    fn exec_interactive(&self, command: &str) -> DeployResult<()>;

    /// Write `content` to `remote_path`, then apply `mode` when
    /// given.
    fn write_file(&self, content: &str, remote_path: &str, mode: Option<u32>) -> DeployResult<()>;

    /// Copy a local file to the remote host, keeping its
    /// permission bits.
    fn put_file(&self, local_path: &str, remote_path: &str) -> DeployResult<()>;

    /// Whether `path` exists on the remote host.
    fn exists(&self, path: &str) -> DeployResult<bool> {
        let out = self.exec(&format!(
            "test -e {} && echo yes || echo no",
            shell_quote(path)
        ))?;
        match out.trim() {
            "yes" => Ok(true),
            "no" => Ok(false),
            other => Err(DeployError::SshFailed(format!(
                "unexpected reply to existence check of {path}: {other}"
            ))),
        }
    }
}

/// Prefix `command` so it runs inside `dir`.
#[must_use]
pub fn in_dir(dir: &str, command: &str) -> String {
    format!("cd {dir} && {command}")
}

/// Remote shell command that stores stdin at `remote_path`.
fn upload_command(remote_path: &str, mode: Option<u32>) -> String {
    let mut command = format!("cat > {remote_path}");
    if let Some(mode) = mode {
        let _ = write!(command, " && chmod {mode:o} {remote_path}");
    }
    command
}

/// SSH session wrapper for executing commands and transferring
/// files to a remote host.
pub struct SshSession {
    host: String,
    user: String,
    key: Option<String>,
}

impl SshSession {
    #[must_use]
    pub fn new(host: &str, user: &str) -> Self {
        Self {
            host: host.to_string(),
            user: user.to_string(),
            key: None,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key_path: &str) -> Self {
        self.key = Some(key_path.to_string());
        self
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    fn build_ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = self.ssh_base_args();
        args.push(self.destination());
        args.push(command.to_string());
        args
    }

    fn ssh_base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
        ];
        if let Some(key) = &self.key {
            args.push("-i".to_string());
            args.push(key.clone());
        }
        args
    }

    fn scp_base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
        ];
        if let Some(key) = &self.key {
            args.push("-i".to_string());
            args.push(key.clone());
        }
        args
    }
}

impl Remote for SshSession {
    fn exec(&self, command: &str) -> DeployResult<String> {
        tracing::debug!(host = %self.host, %command, "remote exec");
        let args = self.build_ssh_args(command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run("ssh", &refs)
    }

    fn exec_interactive(&self, command: &str) -> DeployResult<()> {
        tracing::debug!(host = %self.host, %command, "remote exec (interactive)");
        let args = self.build_ssh_args(command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_interactive("ssh", &refs)
    }

    fn write_file(&self, content: &str, remote_path: &str, mode: Option<u32>) -> DeployResult<()> {
        tracing::debug!(host = %self.host, path = %remote_path, ?mode, "remote write");
        let command = upload_command(remote_path, mode);
        let args = self.build_ssh_args(&command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_with_stdin("ssh", &refs, content.as_bytes())?;
        Ok(())
    }

    fn put_file(&self, local_path: &str, remote_path: &str) -> DeployResult<()> {
        tracing::debug!(host = %self.host, local = %local_path, remote = %remote_path, "scp");
        let mut args = self.scp_base_args();
        let dest = format!("{}:{remote_path}", self.destination());
        args.push(local_path.to_string());
        args.push(dest);

        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_interactive("scp", &refs)
    }
}
