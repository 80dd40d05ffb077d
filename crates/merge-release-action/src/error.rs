use merge_release_core::ReleaseError;
use thiserror::Error;

/// Canonical result type for the action binary
pub type Result<T> = std::result::Result<T, ActionError>;

/// Errors surfaced by the action entrypoint
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Invalid input {name}: {message}")]
    InvalidInput { name: &'static str, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Release(#[from] ReleaseError),
}

impl ActionError {
    /// Exit status for the process: a failing external command's own status,
    /// 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Release(err) => u8::try_from(err.exit_code()).unwrap_or(1),
            _ => 1,
        }
    }
}
