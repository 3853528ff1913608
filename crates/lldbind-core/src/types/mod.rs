//! Core types shared by the object graph and the engine boundary.
//!
//! Engine enumerations arrive as raw integers; each has a typed counterpart
//! here with a `from_raw` conversion and a human-readable `name()`.

pub mod flags;
pub mod ids;
pub mod memory;
pub mod state;
pub mod value_kind;

pub use flags::{LaunchFlags, Permissions, SymbolContextItem};
pub use ids::{BreakpointId, LocationId, ProcessId, ThreadId, WatchpointId};
pub use memory::MemoryRegionInfo;
pub use state::{State, StopReason};
pub use value_kind::{BasicType, ValueType};
