//! # Status
//!
//! The error channel of the engine boundary.
//!
//! Fallible engine entry points take a `&mut Status` out-parameter instead of
//! returning a `Result`: the engine writes a message (and an optional numeric
//! code) into it and the caller inspects it immediately after the call
//! returns. A `Status` starts out successful and only turns into a failure
//! when the engine sets an error.
//!
//! ## Example
//!
//! ```rust
//! use lldbind_core::{LldbindError, Status};
//!
//! let mut status = Status::new();
//! assert!(status.success());
//!
//! status.set_error("process exited with status -1");
//! let err = status.raise_if_error_as(LldbindError::Launch).unwrap_err();
//! assert_eq!(err.to_string(), "process exited with status -1");
//! ```

use std::fmt;

use crate::error::{LldbindError, LldbindResult};

/// Message used when the engine marks a failure without saying why.
const UNKNOWN_ERROR: &str = "Unknown error";

/// Success/failure indicator with an optional message and code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status
{
    error: Option<String>,
    code: u32,
}

impl Status
{
    /// Create a successful status.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Move the status into the failure state with `message`.
    ///
    /// An empty message still marks a failure.
    pub fn set_error(&mut self, message: impl Into<String>)
    {
        self.error = Some(message.into());
    }

    /// Record the engine's numeric error code.
    pub fn set_code(&mut self, code: u32)
    {
        self.code = code;
    }

    /// Reset to success, dropping any message and code.
    pub fn clear(&mut self)
    {
        self.error = None;
        self.code = 0;
    }

    #[must_use]
    pub fn success(&self) -> bool
    {
        self.error.is_none()
    }

    #[must_use]
    pub fn fail(&self) -> bool
    {
        self.error.is_some()
    }

    /// The failure message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str>
    {
        self.error.as_deref()
    }

    #[must_use]
    pub fn code(&self) -> u32
    {
        self.code
    }

    /// Convert a failure into [`LldbindError::Engine`] carrying the message verbatim.
    ///
    /// ## Errors
    ///
    /// Returns the engine error when the status is in the failure state.
    pub fn raise_if_error(&self) -> LldbindResult<()>
    {
        self.raise_if_error_as(LldbindError::Engine)
    }

    /// Convert a failure into the error built by `kind`.
    ///
    /// Lets call sites pick the taxonomy entry, e.g. `LldbindError::Launch`
    /// for the launch path.
    ///
    /// ## Errors
    ///
    /// Returns `kind(message)` when the status is in the failure state.
    pub fn raise_if_error_as<F>(&self, kind: F) -> LldbindResult<()>
    where
        F: FnOnce(String) -> LldbindError,
    {
        match &self.error {
            None => Ok(()),
            Some(message) if message.is_empty() => Err(kind(UNKNOWN_ERROR.to_string())),
            Some(message) => Err(kind(message.clone())),
        }
    }
}

impl fmt::Display for Status
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match &self.error {
            None => write!(f, "success"),
            Some(message) => write!(f, "error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_new_status_is_success()
    {
        let status = Status::new();
        assert!(status.success());
        assert!(!status.fail());
        assert!(status.message().is_none());
        assert!(status.raise_if_error().is_ok());
    }

    #[test]
    fn test_set_error_fails_with_message()
    {
        let mut status = Status::new();
        status.set_error("invalid target");
        status.set_code(7);

        assert!(status.fail());
        assert_eq!(status.code(), 7);
        match status.raise_if_error() {
            Err(LldbindError::Engine(message)) => assert_eq!(message, "invalid target"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_empty_message_is_still_failure()
    {
        let mut status = Status::new();
        status.set_error("");
        let err = status.raise_if_error_as(LldbindError::Attach).unwrap_err();
        assert!(matches!(err, LldbindError::Attach(ref m) if m == "Unknown error"));
    }

    #[test]
    fn test_clear_resets()
    {
        let mut status = Status::new();
        status.set_error("boom");
        status.clear();
        assert!(status.success());
        assert_eq!(status.code(), 0);
        assert_eq!(status.to_string(), "success");
    }
}
