//! # Configuration
//!
//! Runtime knobs read from the environment.
//!
//! ## Environment Variables
//!
//! - `LLDBIND_WAIT_TIMEOUT_MS`: deadline of the launch/attach wait loop (default: `10000`)
//! - `LLDBIND_POLL_INTERVAL_MS`: sleep between state polls (default: `10`)
//! - `LLDBIND_WRAPPER_LIB`: explicit path of the wrapper library

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const WAIT_TIMEOUT_ENV: &str = "LLDBIND_WAIT_TIMEOUT_MS";
pub const POLL_INTERVAL_ENV: &str = "LLDBIND_POLL_INTERVAL_MS";
pub const WRAPPER_LIB_ENV: &str = "LLDBIND_WRAPPER_LIB";

/// Timing of the launch/attach synchronization wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig
{
    /// Sleep between two state polls.
    pub poll_interval: Duration,
    /// Give up after this long without reaching a terminal-for-wait state.
    pub timeout: Duration,
}

impl Default for WaitConfig
{
    fn default() -> Self
    {
        Self {
            poll_interval: Duration::from_millis(10),
            timeout: Duration::from_secs(10),
        }
    }
}

impl WaitConfig
{
    #[must_use]
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self
    {
        Self { poll_interval, timeout }
    }

    /// Defaults overridden by `LLDBIND_POLL_INTERVAL_MS` / `LLDBIND_WAIT_TIMEOUT_MS`.
    ///
    /// Unparseable values are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self
    {
        let mut config = Self::default();
        if let Some(ms) = millis_from_env(POLL_INTERVAL_ENV) {
            config.poll_interval = ms;
        }
        if let Some(ms) = millis_from_env(WAIT_TIMEOUT_ENV) {
            config.timeout = ms;
        }
        config
    }
}

fn millis_from_env(key: &str) -> Option<Duration>
{
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            warn!("Ignoring {key}={raw:?}: expected milliseconds");
            None
        }
    }
}

/// File name of the wrapper library on this platform.
#[must_use]
pub fn wrapper_library_name() -> &'static str
{
    if cfg!(target_os = "macos") {
        "liblldb_wrapper.dylib"
    } else if cfg!(windows) {
        "lldb_wrapper.dll"
    } else {
        "liblldb_wrapper.so"
    }
}

/// Candidate locations of the wrapper library, most specific first.
///
/// 1. `LLDBIND_WRAPPER_LIB`
/// 2. next to the current executable
/// 3. the working directory
/// 4. the bare file name, resolved by the dynamic loader's search path
#[must_use]
pub fn wrapper_library_candidates() -> Vec<PathBuf>
{
    let name = wrapper_library_name();
    let mut candidates = Vec::new();

    if let Some(explicit) = env::var_os(WRAPPER_LIB_ENV) {
        candidates.push(PathBuf::from(explicit));
    }
    if let Some(dir) = env::current_exe().ok().and_then(|exe| exe.parent().map(PathBuf::from)) {
        candidates.push(dir.join(name));
    }
    if let Ok(cwd) = env::current_dir() {
        candidates.push(cwd.join(name));
    }
    candidates.push(PathBuf::from(name));
    candidates
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_default_wait_config()
    {
        let config = WaitConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_candidates_end_with_bare_name()
    {
        let candidates = wrapper_library_candidates();
        assert_eq!(candidates.last().unwrap(), &PathBuf::from(wrapper_library_name()));
    }
}
