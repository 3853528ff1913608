//! Process states and thread stop reasons.

use std::fmt;

use tracing::warn;

/// Engine process state
///
/// The numeric values match the engine's `LLDB_STATE_*` constants.
///
/// ## Terminal-for-wait states
///
/// The launch/attach wait loop stops polling once the process reaches
/// [`State::Stopped`], [`State::Exited`] or [`State::Crashed`]. Every other
/// state is transitional from the binding's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum State
{
    Invalid = 0,
    Unloaded = 1,
    Connected = 2,
    Attaching = 3,
    Launching = 4,
    Stopped = 5,
    Running = 6,
    Stepping = 7,
    Crashed = 8,
    Detached = 9,
    Exited = 10,
    Suspended = 11,
}

impl State
{
    /// Convert an engine value. Unknown values map to [`State::Invalid`].
    #[must_use]
    pub fn from_raw(raw: i32) -> Self
    {
        match raw {
            0 => State::Invalid,
            1 => State::Unloaded,
            2 => State::Connected,
            3 => State::Attaching,
            4 => State::Launching,
            5 => State::Stopped,
            6 => State::Running,
            7 => State::Stepping,
            8 => State::Crashed,
            9 => State::Detached,
            10 => State::Exited,
            11 => State::Suspended,
            other => {
                warn!("Unknown process state {other}, treating as invalid");
                State::Invalid
            }
        }
    }

    #[must_use]
    pub fn raw(self) -> i32
    {
        self as i32
    }

    #[must_use]
    pub fn name(self) -> &'static str
    {
        match self {
            State::Invalid => "invalid",
            State::Unloaded => "unloaded",
            State::Connected => "connected",
            State::Attaching => "attaching",
            State::Launching => "launching",
            State::Stopped => "stopped",
            State::Running => "running",
            State::Stepping => "stepping",
            State::Crashed => "crashed",
            State::Detached => "detached",
            State::Exited => "exited",
            State::Suspended => "suspended",
        }
    }

    /// Whether the wait loop stops polling at this state.
    #[must_use]
    pub fn is_terminal_for_wait(self) -> bool
    {
        matches!(self, State::Stopped | State::Exited | State::Crashed)
    }
}

impl fmt::Display for State
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

/// Why a thread stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StopReason
{
    Invalid = 0,
    None = 1,
    Trace = 2,
    Breakpoint = 3,
    Watchpoint = 4,
    Signal = 5,
    Exception = 6,
    Exec = 7,
    PlanComplete = 8,
    ThreadExiting = 9,
    Instrumentation = 10,
}

impl StopReason
{
    /// Convert an engine value. Unknown values map to [`StopReason::Invalid`].
    #[must_use]
    pub fn from_raw(raw: i32) -> Self
    {
        match raw {
            1 => StopReason::None,
            2 => StopReason::Trace,
            3 => StopReason::Breakpoint,
            4 => StopReason::Watchpoint,
            5 => StopReason::Signal,
            6 => StopReason::Exception,
            7 => StopReason::Exec,
            8 => StopReason::PlanComplete,
            9 => StopReason::ThreadExiting,
            10 => StopReason::Instrumentation,
            _ => StopReason::Invalid,
        }
    }

    #[must_use]
    pub fn raw(self) -> i32
    {
        self as i32
    }

    #[must_use]
    pub fn name(self) -> &'static str
    {
        match self {
            StopReason::Invalid => "invalid",
            StopReason::None => "none",
            StopReason::Trace => "trace",
            StopReason::Breakpoint => "breakpoint",
            StopReason::Watchpoint => "watchpoint",
            StopReason::Signal => "signal",
            StopReason::Exception => "exception",
            StopReason::Exec => "exec",
            StopReason::PlanComplete => "plan complete",
            StopReason::ThreadExiting => "thread exiting",
            StopReason::Instrumentation => "instrumentation",
        }
    }
}

impl fmt::Display for StopReason
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_state_round_trip()
    {
        for raw in 0..=11 {
            assert_eq!(State::from_raw(raw).raw(), raw);
        }
        assert_eq!(State::from_raw(99), State::Invalid);
    }

    #[test]
    fn test_terminal_for_wait()
    {
        let terminal: Vec<State> = (0..=11)
            .map(State::from_raw)
            .filter(|s| s.is_terminal_for_wait())
            .collect();
        assert_eq!(terminal, vec![State::Stopped, State::Crashed, State::Exited]);
    }

    #[test]
    fn test_stop_reason_names()
    {
        assert_eq!(StopReason::from_raw(3).name(), "breakpoint");
        assert_eq!(StopReason::PlanComplete.to_string(), "plan complete");
        assert_eq!(StopReason::from_raw(-4), StopReason::Invalid);
    }
}
