//! # lldbind Utilities
//!
//! Logging setup shared by the lldbind binaries, built on `tracing`.

pub mod logging;

pub use logging::{
    init_logging, init_logging_with_format, init_logging_with_level, log_format_from_env, LogFormat, LogLevel,
    LoggingError,
};
pub use tracing::{debug, error, info, trace, warn};
