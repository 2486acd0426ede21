//! Crate-wide error type.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    /// Another account already uses the username or the email.
    #[error("Username or email already exists")]
    DuplicateAccount,

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Rejected form input; the message is shown to the user as-is.
    #[error("{0}")]
    ValidationFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TodoError>;

impl TodoError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for errors caused by user input rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateAccount | Self::InvalidCredentials | Self::ValidationFailed(_)
        )
    }
}
