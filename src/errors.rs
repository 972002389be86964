use thiserror::Error;

/// Error type surfaced to the CLI, each variant mapped to an exit code
#[derive(Debug, Error)]
pub enum StorecheckError {
    /// A scenario assertion did not hold (exit code 2)
    #[error("Assertion failed: {message} (expected: {expected}, actual: {actual})")]
    Assertion {
        message: String,
        expected: String,
        actual: String,
    },
    /// A step received a keyword it does not know (exit code 3)
    #[error("Unrecognized {kind}: '{value}'")]
    Contract { kind: &'static str, value: String },
    /// No browser session could be acquired (exit code 4)
    #[error("Browser session unavailable: {0}")]
    SessionUnavailable(String),
    /// Configuration could not be loaded (exit code 5)
    #[error("Configuration error: {0}")]
    Config(String),
    /// Generic error (exit code 1)
    #[error(transparent)]
    Other(anyhow::Error),
}

impl StorecheckError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            StorecheckError::Assertion { .. } => 2,
            StorecheckError::Contract { .. } => 3,
            StorecheckError::SessionUnavailable(_) => 4,
            StorecheckError::Config(_) => 5,
            StorecheckError::Other(_) => 1,
        }
    }

    pub fn assertion(
        message: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        StorecheckError::Assertion {
            message: message.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

impl From<anyhow::Error> for StorecheckError {
    fn from(err: anyhow::Error) -> Self {
        // Steps wrap typed failures in anyhow; recover the variant if present
        match err.downcast::<StorecheckError>() {
            Ok(typed) => typed,
            Err(err) => StorecheckError::Other(err),
        }
    }
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
