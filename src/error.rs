//! Error types for grocery session operations
//!
//! Separates failures caused by the caller's request (wrong page context,
//! out-of-range index, untrusted navigation target) from failures inside
//! the browser session, so the tool layer can map each class to the right
//! protocol error.

use thiserror::Error;

/// Result type alias for session operations
pub type OdaResult<T> = Result<T, OdaError>;

/// Error types for grocery session operations
#[derive(Debug, Error)]
pub enum OdaError {
    /// Operation invoked while the browser is on the wrong kind of page
    #[error("{operation} requires the {expected} context, but the current context is {actual}")]
    WrongContext {
        operation: &'static str,
        expected: String,
        actual: String,
    },

    /// Index does not address any element in the current snapshot
    #[error("{kind} index {index} is out of range (current count: {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    /// Navigation target was never issued to the caller
    #[error("Untrusted URL: {0}")]
    UntrustedUrl(String),

    /// The recipe page carried no structured data block
    #[error("No structured recipe data found on the page")]
    MissingRecipeData,

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for OdaError {
    fn from(error: anyhow::Error) -> Self {
        OdaError::Other(format!("{error:#}"))
    }
}

impl OdaError {
    /// True when the failure was caused by the caller's request rather
    /// than by the site or the browser
    #[must_use]
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            OdaError::WrongContext { .. }
                | OdaError::IndexOutOfRange { .. }
                | OdaError::UntrustedUrl(_)
        )
    }
}
