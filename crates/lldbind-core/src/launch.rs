//! # Launch/Attach Synchronization
//!
//! In synchronous mode (the debugger's async flag is off) the engine returns
//! from a launch or attach call while the process is still in flight. This
//! module turns that into a blocking operation:
//!
//! 1. Poll [`Process::state`] every `poll_interval` until it is terminal for
//!    wait (stopped, exited or crashed), or fail once `timeout` has elapsed.
//! 2. After a launch (which always requests a stop at entry), if the target
//!    has at least one breakpoint and the process sits stopped and valid,
//!    continue it and wait once more so the caller lands on the first
//!    breakpoint hit rather than on the entry stop.
//!
//! In asynchronous mode none of this runs: the process is returned as soon as
//! the engine hands it over.
//!
//! [`LaunchInfo`] is the owned description of a launch that the engine
//! boundary converts into the engine's launch-info object.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use tracing::debug;

use crate::config::WaitConfig;
use crate::error::{LldbindError, LldbindResult};
use crate::process::Process;
use crate::target::Target;
use crate::types::{LaunchFlags, State};

/// Arguments, environment and flags of a process launch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchInfo
{
    args: Vec<String>,
    environment: Vec<String>,
    append_environment: bool,
    working_directory: Option<PathBuf>,
    flags: LaunchFlags,
}

impl LaunchInfo
{
    /// A launch passing `args` to the program (not including `argv[0]`).
    #[must_use]
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            append_environment: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self
    {
        self.args.push(arg.into());
        self
    }

    /// Add one `KEY=VALUE` environment entry.
    #[must_use]
    pub fn env(mut self, key: &str, value: &str) -> Self
    {
        self.environment.push(format!("{key}={value}"));
        self
    }

    /// Replace the environment entries.
    ///
    /// With `append` the entries are added to the inherited environment,
    /// otherwise they replace it.
    pub fn set_environment<I, S>(&mut self, entries: I, append: bool)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.environment = entries.into_iter().map(Into::into).collect();
        self.append_environment = append;
    }

    #[must_use]
    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self
    {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn set_working_directory(&mut self, dir: impl Into<PathBuf>)
    {
        self.working_directory = Some(dir.into());
    }

    #[must_use]
    pub fn flags(mut self, flags: LaunchFlags) -> Self
    {
        self.flags = flags;
        self
    }

    pub fn set_launch_flags(&mut self, flags: LaunchFlags)
    {
        self.flags = flags;
    }

    pub fn add_launch_flags(&mut self, flags: LaunchFlags)
    {
        self.flags |= flags;
    }

    #[must_use]
    pub fn args(&self) -> &[String]
    {
        &self.args
    }

    #[must_use]
    pub fn environment(&self) -> &[String]
    {
        &self.environment
    }

    #[must_use]
    pub fn appends_environment(&self) -> bool
    {
        self.append_environment
    }

    #[must_use]
    pub fn working_dir(&self) -> Option<&Path>
    {
        self.working_directory.as_deref()
    }

    #[must_use]
    pub fn launch_flags(&self) -> LaunchFlags
    {
        self.flags
    }
}

/// Poll until the process reaches a terminal-for-wait state.
///
/// Returns `None` when `config.timeout` elapses first.
pub(crate) fn poll_for_stop(process: &Process, config: &WaitConfig) -> Option<State>
{
    let deadline = Instant::now() + config.timeout;
    let mut last = None;
    loop {
        let state = process.state();
        if last != Some(state) {
            debug!("Process {} state: {}", process.pid(), state);
            last = Some(state);
        }
        if state.is_terminal_for_wait() {
            return Some(state);
        }
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(config.poll_interval);
    }
}

pub(crate) fn timeout_message(config: &WaitConfig) -> String
{
    format!("Process failed to stop within {} seconds", config.timeout.as_secs_f64())
}

/// Bring a freshly launched process to its first meaningful stop.
pub(crate) fn sync_after_launch(target: &Target, process: &Process, config: &WaitConfig) -> LldbindResult<()>
{
    let state = poll_for_stop(process, config).ok_or_else(|| LldbindError::Launch(timeout_message(config)))?;
    debug!("Launch settled in state {}", state);

    if target.num_breakpoints() > 0 && state == State::Stopped && process.is_valid() {
        debug!("Continuing past entry stop toward {} breakpoint(s)", target.num_breakpoints());
        process.continue_execution()?;
        let state = poll_for_stop(process, config).ok_or_else(|| LldbindError::Launch(timeout_message(config)))?;
        debug!("Process reached state {} after continue", state);
    }
    Ok(())
}

/// Wait once for an attached process to stop.
pub(crate) fn sync_after_attach(process: &Process, config: &WaitConfig) -> LldbindResult<()>
{
    let state = poll_for_stop(process, config).ok_or_else(|| LldbindError::Attach(timeout_message(config)))?;
    debug!("Attach settled in state {}", state);
    Ok(())
}

#[cfg(test)]
mod tests
{
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_launch_info_builder()
    {
        let info = LaunchInfo::new(["--verbose"])
            .arg("input.txt")
            .env("RUST_BACKTRACE", "1")
            .working_directory("/tmp")
            .flags(LaunchFlags::DISABLE_ASLR);

        assert_eq!(info.args(), ["--verbose", "input.txt"]);
        assert_eq!(info.environment(), ["RUST_BACKTRACE=1"]);
        assert!(info.appends_environment());
        assert_eq!(info.working_dir(), Some(Path::new("/tmp")));
        assert_eq!(info.launch_flags(), LaunchFlags::DISABLE_ASLR);
    }

    #[test]
    fn test_timeout_message()
    {
        assert_eq!(
            timeout_message(&WaitConfig::default()),
            "Process failed to stop within 10 seconds"
        );
        let short = WaitConfig::new(Duration::from_millis(1), Duration::from_millis(250));
        assert_eq!(timeout_message(&short), "Process failed to stop within 0.25 seconds");
    }
}
