//! # Error Types
//!
//! Error taxonomy for binding operations.
//!
//! We use `thiserror` to generate the `Error` trait implementations and the
//! display messages. Every fallible public operation returns
//! [`LldbindResult`].
//!
//! ## Error Categories
//!
//! 1. **Lifecycle errors**: `NotInitialized`, `LibraryLoad`
//! 2. **Handle errors**: `InvalidObject` (released or engine-invalidated handle)
//! 3. **Operation errors**: `Launch`, `Attach`, `Breakpoint`, `Evaluation`
//! 4. **Capability errors**: `UnsupportedApi`
//! 5. **Engine errors**: `Engine` (a failed status with no more specific kind)
//! 6. **Argument and I/O errors**: `InvalidArgument`, `Io`

use thiserror::Error;

/// Main error type for binding operations
#[derive(Error, Debug)]
pub enum LldbindError
{
    /// The runtime was used before [`Lldb::initialize`](crate::Lldb::initialize)
    /// or after [`Lldb::terminate`](crate::Lldb::terminate).
    #[error("LLDB has not been initialized. Call Lldb::initialize first.")]
    NotInitialized,

    /// The object's handle was released or the engine reports it invalid.
    ///
    /// The payload is the object kind, e.g. `"Target"` or `"Process"`.
    #[error("{0} is not valid")]
    InvalidObject(&'static str),

    /// Launching a process failed, or the launched process never reached a
    /// stop within the configured wait.
    #[error("{0}")]
    Launch(String),

    /// Attaching to a process failed, or the attached process never reached a
    /// stop within the configured wait.
    #[error("{0}")]
    Attach(String),

    /// Breakpoint creation failed.
    #[error("{0}")]
    Breakpoint(String),

    /// Expression evaluation produced an error value.
    #[error("{0}")]
    Evaluation(String),

    /// The loaded engine does not export the entry point behind a feature.
    ///
    /// The payload is the feature name, e.g. `"step_over"`.
    #[error("API '{0}' is not supported in this LLDB version or binding")]
    UnsupportedApi(String),

    /// A native call reported failure through its status out-parameter.
    #[error("{0}")]
    Engine(String),

    /// The wrapper library could not be opened.
    #[error("Failed to load LLDB wrapper library: {0}")]
    LibraryLoad(String),

    /// An argument could not be passed across the engine boundary
    /// (e.g. a string with an interior NUL byte).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LldbindError
{
    /// Whether the error came from the launch/attach path.
    #[must_use]
    pub fn is_process_start(&self) -> bool
    {
        matches!(self, Self::Launch(_) | Self::Attach(_))
    }
}

/// Result alias used throughout the crate
pub type LldbindResult<T> = std::result::Result<T, LldbindError>;

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_display_messages()
    {
        assert_eq!(
            LldbindError::NotInitialized.to_string(),
            "LLDB has not been initialized. Call Lldb::initialize first."
        );
        assert_eq!(LldbindError::InvalidObject("Process").to_string(), "Process is not valid");
        assert_eq!(
            LldbindError::LibraryLoad("no such file".to_string()).to_string(),
            "Failed to load LLDB wrapper library: no such file"
        );
        assert_eq!(
            LldbindError::InvalidArgument("interior NUL".to_string()).to_string(),
            "Invalid argument: interior NUL"
        );
    }

    #[test]
    fn test_process_start_errors()
    {
        assert!(LldbindError::Launch("error: permission denied".to_string()).is_process_start());
        assert!(LldbindError::Attach("error: attach failed".to_string()).is_process_start());
        assert!(!LldbindError::Engine("error: invalid process".to_string()).is_process_start());
    }

    #[test]
    fn test_io_conversion()
    {
        let err: LldbindError = std::io::Error::other("disk gone").into();
        assert!(matches!(err, LldbindError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: disk gone");
    }
}
