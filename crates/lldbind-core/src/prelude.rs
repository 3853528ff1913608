//! Common module for library exports

pub use crate::breakpoint::{Breakpoint, BreakpointLocation, StopPoint};
pub use crate::capability::{Capabilities, Feature};
pub use crate::debugger::Debugger;
pub use crate::engine::{BreakpointSpec, VariableOptions};
pub use crate::error::{LldbindError, LldbindResult};
pub use crate::frame::Frame;
pub use crate::launch::LaunchInfo;
pub use crate::process::Process;
pub use crate::runtime::Lldb;
pub use crate::status::Status;
pub use crate::target::Target;
pub use crate::thread::Thread;
pub use crate::types::{
    BasicType, BreakpointId, LaunchFlags, MemoryRegionInfo, Permissions, ProcessId, State, StopReason, ThreadId,
    ValueType, WatchpointId,
};
pub use crate::value::{Value, ValueList};
pub use crate::watchpoint::Watchpoint;
