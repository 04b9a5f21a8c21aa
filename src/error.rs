//! Classified failures for gh-app-commit operations.
//!
//! Every fallible function returns [`crate::result::Result`]; the variants
//! below are what callers may need to tell apart once an error has been
//! wrapped with context.

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for gh-app-commit operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    // Cli args errors
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    // Authentication errors
    #[error("Failed to parse private key: {0}")]
    KeyFormat(String),

    #[error("Failed to sign app assertion: {0}")]
    Signing(String),

    #[error("GitHub App token not provided")]
    MissingToken,

    #[error("GitHub App token not initialized: authenticate before calling the API")]
    NotAuthenticated,

    // Network/API errors
    #[error("GitHub API request failed with status {status_code}: {body}")]
    Api { status_code: u16, body: String },

    // Local filesystem and subprocess errors
    #[error("Local I/O failed: {0}")]
    LocalIo(String),
}

impl ActionError {
    /// Create an API error from a response status and its raw body
    pub fn api(status: StatusCode, body: impl Into<String>) -> Self {
        Self::Api {
            status_code: status.as_u16(),
            body: body.into(),
        }
    }

    /// Create an invalid arguments error
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }

    /// Create a local I/O error
    pub fn local_io(msg: impl Into<String>) -> Self {
        Self::LocalIo(msg.into())
    }

    /// True when the API reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Api { status_code, .. }
                if *status_code == StatusCode::NOT_FOUND.as_u16()
        )
    }
}

/// Look through any context added with `wrap_err` for an API 404.
pub fn is_not_found(err: &color_eyre::Report) -> bool {
    err.downcast_ref::<ActionError>()
        .is_some_and(ActionError::is_not_found)
}
