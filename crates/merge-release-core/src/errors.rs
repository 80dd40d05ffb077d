use std::io;
use std::path::Path;

/// Canonical result type for merge-release code
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Common error type for release operations
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Git error: {0}")]
    Git(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Command `{command}` failed with exit code {code}")]
    CommandFailed {
        command: String,
        args: Vec<String>,
        code: i32,
    },
}

impl ReleaseError {
    /// Process exit status to use when this error terminates the run.
    ///
    /// Failing external commands propagate their own status; everything else
    /// maps to a generic failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Helper to create an IO error with file path context
pub fn io_error_with_path<P: AsRef<Path>>(error: io::Error, path: P) -> io::Error {
    io::Error::new(
        error.kind(),
        format!("{}: {}", path.as_ref().display(), error),
    )
}
