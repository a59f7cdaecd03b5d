//! Error types for the request facade.
//!
//! # Design
//! Three classes of failure reach the caller: bad arguments (`Validation`,
//! `LengthMismatch`, `AlreadyExists`), I/O faults at the network or filesystem
//! layer (`Transport`), and a response whose status is not 200 (`Status`).
//! Nothing is retried; every error is returned from the call that caused it.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed cause carried by `RequestError::Transport`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for facade operations.
pub type RequestResult<T> = Result<T, RequestError>;

/// Errors returned by `Courier` operations.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A required argument was empty or out of range.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// Two paired sequences of a multipart form differ in length.
    #[error("{group} field names and values differ in length ({names} names, {values} values)")]
    LengthMismatch {
        group: &'static str,
        names: usize,
        values: usize,
    },

    /// The download destination is already present on disk.
    #[error("destination already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// Connecting, reading, writing or closing failed.
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: BoxError,
    },

    /// The server answered with something other than 200.
    #[error("HTTP request returned status {status}")]
    Status { status: u16 },
}

impl RequestError {
    pub(crate) fn transport(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        RequestError::Transport {
            context: context.into(),
            source: source.into(),
        }
    }

    /// HTTP status carried by a `Status` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Status { status } => Some(*status),
            _ => None,
        }
    }

    /// True for errors raised before any I/O was attempted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RequestError::Validation(_)
                | RequestError::LengthMismatch { .. }
                | RequestError::AlreadyExists(_)
        )
    }
}

/// Reject an empty string argument.
pub(crate) fn require(value: &str, what: &str) -> RequestResult<()> {
    if value.is_empty() {
        return Err(RequestError::Validation(format!("{what} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_carries_code() {
        let err = RequestError::Status { status: 503 };
        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("503"));
        assert!(!err.is_validation());
    }

    #[test]
    fn length_mismatch_names_the_group() {
        let err = RequestError::LengthMismatch {
            group: "file",
            names: 2,
            values: 1,
        };
        assert!(err.is_validation());
        assert!(err.to_string().starts_with("file field names"));
    }

    #[test]
    fn transport_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = RequestError::transport("sending GET", io);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "sending GET: reset");
    }

    #[test]
    fn require_rejects_empty() {
        assert!(require("x", "url").is_ok());
        let err = require("", "url").unwrap_err();
        assert!(matches!(err, RequestError::Validation(ref m) if m == "url must not be empty"));
    }
}
