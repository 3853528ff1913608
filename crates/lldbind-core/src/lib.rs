//! # lldbind-core
//!
//! Safe object-graph bindings over an LLDB engine reached through the flat C
//! surface of `liblldb_wrapper`.
//!
//! The crate provides:
//! - Handle ownership with at-most-once release ([`handle`])
//! - The object graph: [`Debugger`] → [`Target`] → [`Process`] → [`Thread`] →
//!   [`Frame`] → [`Value`], plus breakpoints, watchpoints, types and modules
//! - Deterministic launch and attach in synchronous mode ([`launch`])
//! - Capability negotiation for optional entry points ([`capability`])
//! - Two engines: the dynamically loaded native library and an in-memory
//!   simulation used by tests and the CLI's `--simulate` mode ([`engine`])
//!
//! ## Threading
//!
//! Every object is `!Send` and `!Sync`. A session is driven from one thread;
//! use separate sessions for concurrent work.
//!
//! ## Why unsafe code is needed
//!
//! The native engine resolves C entry points at runtime with `dlopen`/`dlsym`
//! and calls them through raw function pointers. Those calls are confined to
//! `engine::native`; everything above the [`Engine`](engine::Engine) trait is
//! safe code.
//!
//! ## Example
//!
//! ```rust
//! use lldbind_core::engine::sim::{SimEngine, SimProgram};
//! use lldbind_core::prelude::*;
//!
//! let lldb = Lldb::simulated(SimEngine::new().with_program(SimProgram::demo("/bin/demo")));
//! let debugger = lldb.create_debugger()?;
//! let target = debugger.create_target("/bin/demo")?;
//! let breakpoint = target.breakpoint_create_by_name("compute", None)?;
//!
//! let process = target.launch(LaunchInfo::default())?;
//! assert_eq!(process.state(), State::Stopped);
//! assert_eq!(breakpoint.hit_count(), 1);
//! # Ok::<(), LldbindError>(())
//! ```

#![allow(unsafe_code)] // Required for dlopen/dlsym and calls through C function pointers

pub mod breakpoint;
pub mod capability;
pub mod command;
pub mod config;
pub mod debugger;
pub mod engine;
pub mod error;
pub mod frame;
pub mod handle;
pub mod launch;
pub mod module;
pub mod prelude;
pub mod process;
pub mod runtime;
pub mod status;
pub mod target;
pub mod thread;
pub mod typeinfo;
pub mod types;
pub mod value;
pub mod watchpoint;

pub use breakpoint::{Breakpoint, BreakpointLocation, StopPoint};
pub use capability::{Capabilities, Feature};
pub use command::{CommandInterpreter, CommandReturnObject};
pub use config::WaitConfig;
pub use debugger::Debugger;
pub use engine::BreakpointSpec;
// Re-export commonly used types
pub use error::{LldbindError, LldbindResult};
pub use frame::Frame;
pub use launch::LaunchInfo;
pub use module::{Module, SymbolContext};
pub use process::Process;
pub use runtime::Lldb;
pub use status::Status;
pub use target::Target;
pub use thread::Thread;
pub use typeinfo::Type;
pub use types::{BasicType, BreakpointId, LaunchFlags, ProcessId, State, StopReason, ThreadId, ValueType, WatchpointId};
pub use value::{Value, ValueList, ValueOwner};
pub use watchpoint::Watchpoint;
