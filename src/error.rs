use std::process::ExitStatus;

pub type DeployResult<T> = Result<T, DeployError>;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("command failed: {command}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("SSH connection failed: {0}")]
    SshFailed(String),

    #[error("prerequisite missing: {0}")]
    PrerequisiteMissing(String),

    #[error("API fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("XML-RPC protocol error: {0}")]
    Protocol(String),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("environment variable missing: {0}")]
    EnvMissing(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DeployError {
    /// Whether this is an API fault saying the named resource is
    /// already taken.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::Fault { message, .. } => {
                let message = message.to_lowercase();
                message.contains("already exists") || message.contains("already in use")
            }
            _ => false,
        }
    }
}
