//! # Target
//!
//! A [`Target`] is an executable loaded into a session. It launches or attaches
//! processes, creates breakpoints and watchpoints, and keeps:
//!
//! - the ids of the breakpoints and watchpoints it created, updated only when
//!   the engine confirms a delete;
//! - the current [`Process`], replaced by every successful launch or attach.
//!
//! `launch`, `attach` and `attach_with_name` follow the synchronization
//! protocol in [`crate::launch`] when the debugger is in synchronous mode.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, info, warn};

use crate::breakpoint::Breakpoint;
use crate::debugger::Debugger;
use crate::engine::{BreakpointSpec, Engine};
use crate::error::{LldbindError, LldbindResult};
use crate::handle::{Handle, ObjectKind, RawHandle};
use crate::launch::{self, LaunchInfo};
use crate::module::Module;
use crate::process::Process;
use crate::status::Status;
use crate::types::{BreakpointId, LaunchFlags, ProcessId, WatchpointId};
use crate::value::{Value, ValueOwner};
use crate::watchpoint::Watchpoint;

/// An executable loaded into a debugging session
#[derive(Clone)]
pub struct Target
{
    inner: Rc<TargetInner>,
}

pub(crate) struct TargetInner
{
    process: RefCell<Option<Process>>,
    breakpoints: RefCell<Vec<BreakpointId>>,
    watchpoints: RefCell<Vec<WatchpointId>>,
    handle: Handle,
    debugger: Debugger,
}

impl Target
{
    pub(crate) fn new(handle: Handle, debugger: Debugger) -> Self
    {
        Self {
            inner: Rc::new(TargetInner {
                process: RefCell::new(None),
                breakpoints: RefCell::new(Vec::new()),
                watchpoints: RefCell::new(Vec::new()),
                handle,
                debugger,
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<TargetInner>
    {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(weak: &Weak<TargetInner>) -> Option<Self>
    {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub(crate) fn handle(&self) -> &Handle
    {
        &self.inner.handle
    }

    fn engine(&self) -> &dyn Engine
    {
        self.inner.handle.engine().as_ref()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.inner.handle.is_valid()
    }

    pub fn release(&self)
    {
        self.inner.handle.release();
    }

    #[must_use]
    pub fn debugger(&self) -> &Debugger
    {
        &self.inner.debugger
    }

    // Process start

    /// Launch the executable and, in synchronous mode, wait for it to settle.
    ///
    /// The launch always requests a stop at entry. In synchronous mode the call
    /// then waits for a stop, and if any breakpoint exists it continues past
    /// the entry stop and waits again. The returned process is in whatever
    /// state that produced: stopped at a breakpoint, stopped at entry, exited
    /// or crashed.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the target is not valid
    /// - `Launch` if the engine reports failure, returns no process, or the
    ///   process does not stop within the debugger's wait timeout
    pub fn launch(&self, info: LaunchInfo) -> LldbindResult<Process>
    {
        let raw = self.inner.handle.checked()?;
        let mut info = info;
        info.add_launch_flags(LaunchFlags::STOP_AT_ENTRY);
        info!(
            "Launching {} with args: {:?}",
            self.executable_path().unwrap_or_default(),
            info.args()
        );

        let process = self.start_launch(raw, &info)?;
        if !self.debugger().is_async() {
            launch::sync_after_launch(self, &process, &self.debugger().wait_config())?;
        }
        Ok(process)
    }

    /// Launch with the given info as-is: no flag changes and no waiting.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the target is not valid
    /// - `Launch` if the engine reports failure or returns no process
    pub fn launch_with_info(&self, info: &LaunchInfo) -> LldbindResult<Process>
    {
        let raw = self.inner.handle.checked()?;
        self.start_launch(raw, info)
    }

    /// Attach to a running process by id.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the target is not valid
    /// - `Attach` if the engine reports failure, returns no process, or the
    ///   process does not stop within the wait timeout (synchronous mode)
    pub fn attach(&self, pid: ProcessId) -> LldbindResult<Process>
    {
        let raw = self.inner.handle.checked()?;
        info!("Attaching to process {}", pid);
        let mut status = Status::new();
        let process = self.engine().target_attach_to_pid(raw, pid.raw(), &mut status);
        let process = self.adopt_process(process, &status, LldbindError::Attach, || {
            format!("Failed to attach to process {pid}")
        })?;
        self.sync_attach(&process)?;
        Ok(process)
    }

    /// Attach to a process by name, optionally waiting for it to appear.
    ///
    /// ## Errors
    ///
    /// Same as [`Target::attach`].
    pub fn attach_with_name(&self, name: &str, wait_for: bool) -> LldbindResult<Process>
    {
        let raw = self.inner.handle.checked()?;
        info!("Attaching to process '{}' (wait_for: {})", name, wait_for);
        let mut status = Status::new();
        let process = self.engine().target_attach_to_name(raw, name, wait_for, &mut status);
        let process = self.adopt_process(process, &status, LldbindError::Attach, || {
            format!("Failed to attach to process '{name}'")
        })?;
        self.sync_attach(&process)?;
        Ok(process)
    }

    fn start_launch(&self, raw: RawHandle, info: &LaunchInfo) -> LldbindResult<Process>
    {
        let mut status = Status::new();
        let process = self.engine().target_launch(raw, info, &mut status);
        self.adopt_process(process, &status, LldbindError::Launch, || {
            "Failed to launch process".to_string()
        })
    }

    fn sync_attach(&self, process: &Process) -> LldbindResult<()>
    {
        if self.debugger().is_async() {
            return Ok(());
        }
        launch::sync_after_attach(process, &self.debugger().wait_config())
    }

    /// Check the status first; only then look at the handle.
    fn adopt_process<F>(
        &self,
        raw: Option<RawHandle>,
        status: &Status,
        kind: fn(String) -> LldbindError,
        fallback: F,
    ) -> LldbindResult<Process>
    where
        F: FnOnce() -> String,
    {
        if let Err(err) = status.raise_if_error_as(kind) {
            if let Some(stray) = raw {
                warn!("Engine returned a process alongside a failed status, releasing it");
                self.engine().destroy(ObjectKind::Process, stray);
            }
            return Err(err);
        }

        let handle = self
            .inner
            .handle
            .adopt(ObjectKind::Process, raw)
            .ok_or_else(|| kind(fallback()))?;
        let process = Process::new(handle, self);
        debug!("Process {} started", process.pid());
        *self.inner.process.borrow_mut() = Some(process.clone());
        Ok(process)
    }

    /// The process from the most recent successful launch or attach.
    #[must_use]
    pub fn current_process(&self) -> Option<Process>
    {
        self.inner.process.borrow().clone()
    }

    /// Ask the engine for the target's process.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the target is not valid.
    pub fn process(&self) -> LldbindResult<Option<Process>>
    {
        let raw = self.inner.handle.checked()?;
        let process = self.engine().target_process(raw);
        Ok(self
            .inner
            .handle
            .adopt(ObjectKind::Process, process)
            .map(|handle| Process::new(handle, self)))
    }

    // Breakpoints

    /// Create a breakpoint and record it in the target's bookkeeping.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the target is not valid
    /// - `UnsupportedApi` for address and regex breakpoints on engines without them
    /// - `Breakpoint` if the engine returns no breakpoint
    pub fn create_breakpoint(&self, spec: &BreakpointSpec) -> LldbindResult<Breakpoint>
    {
        let raw = match spec.feature() {
            Some(feature) => self.inner.handle.checked_with(feature)?,
            None => self.inner.handle.checked()?,
        };
        let breakpoint = self.engine().target_create_breakpoint(raw, spec);
        let handle = self
            .inner
            .handle
            .adopt(ObjectKind::Breakpoint, breakpoint)
            .ok_or_else(|| LldbindError::Breakpoint(format!("Failed to create breakpoint {spec}")))?;

        let breakpoint = Breakpoint::new(handle, self.clone());
        debug!("Created breakpoint {} {}", breakpoint.id(), spec);
        self.inner.breakpoints.borrow_mut().push(breakpoint.id());
        Ok(breakpoint)
    }

    /// ## Errors
    ///
    /// See [`Target::create_breakpoint`].
    pub fn breakpoint_create_by_name(&self, symbol: &str, module: Option<&str>) -> LldbindResult<Breakpoint>
    {
        self.create_breakpoint(&BreakpointSpec::Name {
            symbol: symbol.to_string(),
            module: module.map(str::to_string),
        })
    }

    /// ## Errors
    ///
    /// See [`Target::create_breakpoint`].
    pub fn breakpoint_create_by_location(&self, file: &str, line: u32) -> LldbindResult<Breakpoint>
    {
        self.create_breakpoint(&BreakpointSpec::location(file, line))
    }

    /// ## Errors
    ///
    /// See [`Target::create_breakpoint`].
    pub fn breakpoint_create_by_address(&self, address: u64) -> LldbindResult<Breakpoint>
    {
        self.create_breakpoint(&BreakpointSpec::Address(address))
    }

    /// ## Errors
    ///
    /// See [`Target::create_breakpoint`].
    pub fn breakpoint_create_by_regex(&self, pattern: &str, module: Option<&str>) -> LldbindResult<Breakpoint>
    {
        self.create_breakpoint(&BreakpointSpec::Regex {
            pattern: pattern.to_string(),
            module: module.map(str::to_string),
        })
    }

    /// ## Errors
    ///
    /// See [`Target::create_breakpoint`].
    pub fn breakpoint_create_by_source_regex(&self, pattern: &str, file: Option<&str>) -> LldbindResult<Breakpoint>
    {
        self.create_breakpoint(&BreakpointSpec::SourceRegex {
            pattern: pattern.to_string(),
            file: file.map(str::to_string),
        })
    }

    /// Delete a breakpoint by id.
    ///
    /// The local bookkeeping only changes when the engine reports success, so
    /// a failed delete leaves both sides as they were.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the target is not valid.
    pub fn delete_breakpoint(&self, id: BreakpointId) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        let deleted = self.engine().target_delete_breakpoint(raw, id.raw());
        if deleted {
            self.inner.breakpoints.borrow_mut().retain(|known| *known != id);
            debug!("Deleted breakpoint {}", id);
        } else {
            debug!("Engine refused to delete breakpoint {}", id);
        }
        Ok(deleted)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the target is not valid.
    pub fn delete_all_breakpoints(&self) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        let deleted = self.engine().target_delete_all_breakpoints(raw);
        if deleted {
            self.inner.breakpoints.borrow_mut().clear();
        }
        Ok(deleted)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the target is not valid.
    pub fn enable_all_breakpoints(&self) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        Ok(self.engine().target_set_all_breakpoints_enabled(raw, true))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the target is not valid.
    pub fn disable_all_breakpoints(&self) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        Ok(self.engine().target_set_all_breakpoints_enabled(raw, false))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the target is not valid.
    pub fn find_breakpoint_by_id(&self, id: BreakpointId) -> LldbindResult<Option<Breakpoint>>
    {
        let raw = self.inner.handle.checked()?;
        let breakpoint = self.engine().target_find_breakpoint(raw, id.raw());
        Ok(self.wrap_breakpoint(breakpoint))
    }

    #[must_use]
    pub fn num_breakpoints(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.target_num_breakpoints(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the target is not valid.
    pub fn breakpoint_at_index(&self, index: u32) -> LldbindResult<Option<Breakpoint>>
    {
        let raw = self.inner.handle.checked()?;
        let breakpoint = self.engine().target_breakpoint_at_index(raw, index);
        Ok(self.wrap_breakpoint(breakpoint))
    }

    #[must_use]
    pub fn breakpoints(&self) -> Vec<Breakpoint>
    {
        (0..self.num_breakpoints())
            .filter_map(|index| self.breakpoint_at_index(index).ok().flatten())
            .collect()
    }

    /// Ids of the breakpoints created through this target and not yet deleted.
    #[must_use]
    pub fn tracked_breakpoint_ids(&self) -> Vec<BreakpointId>
    {
        self.inner.breakpoints.borrow().clone()
    }

    fn wrap_breakpoint(&self, raw: Option<RawHandle>) -> Option<Breakpoint>
    {
        self.inner
            .handle
            .adopt(ObjectKind::Breakpoint, raw)
            .map(|handle| Breakpoint::new(handle, self.clone()))
    }

    // Watchpoints

    /// Watch `size` bytes at `address`.
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the target is not valid
    /// - `Engine` if the engine rejects the watchpoint
    pub fn watch_address(&self, address: u64, size: usize, read: bool, write: bool) -> LldbindResult<Watchpoint>
    {
        let raw = self.inner.handle.checked()?;
        let mut status = Status::new();
        let watchpoint = self
            .engine()
            .target_watch_address(raw, address, size, read, write, &mut status);
        if let Err(err) = status.raise_if_error() {
            if let Some(stray) = watchpoint {
                self.engine().destroy(ObjectKind::Watchpoint, stray);
            }
            return Err(err);
        }

        let handle = self
            .inner
            .handle
            .adopt(ObjectKind::Watchpoint, watchpoint)
            .ok_or_else(|| LldbindError::Engine(format!("Failed to create watchpoint at address 0x{address:x}")))?;
        let watchpoint = Watchpoint::new(handle, self.clone());
        self.track_watchpoint(watchpoint.id());
        Ok(watchpoint)
    }

    pub(crate) fn track_watchpoint(&self, id: WatchpointId)
    {
        debug!("Tracking watchpoint {}", id);
        self.inner.watchpoints.borrow_mut().push(id);
    }

    /// Delete a watchpoint by id. Bookkeeping follows the engine's answer.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the target is not valid.
    pub fn delete_watchpoint(&self, id: WatchpointId) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        let deleted = self.engine().target_delete_watchpoint(raw, id.raw());
        if deleted {
            self.inner.watchpoints.borrow_mut().retain(|known| *known != id);
        }
        Ok(deleted)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the target is not valid.
    pub fn delete_all_watchpoints(&self) -> LldbindResult<bool>
    {
        let raw = self.inner.handle.checked()?;
        let deleted = self.engine().target_delete_all_watchpoints(raw);
        if deleted {
            self.inner.watchpoints.borrow_mut().clear();
        }
        Ok(deleted)
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the target is not valid.
    pub fn find_watchpoint_by_id(&self, id: WatchpointId) -> LldbindResult<Option<Watchpoint>>
    {
        let raw = self.inner.handle.checked()?;
        let watchpoint = self.engine().target_find_watchpoint(raw, id.raw());
        Ok(self.wrap_watchpoint(watchpoint))
    }

    #[must_use]
    pub fn num_watchpoints(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.target_num_watchpoints(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the target is not valid.
    pub fn watchpoint_at_index(&self, index: u32) -> LldbindResult<Option<Watchpoint>>
    {
        let raw = self.inner.handle.checked()?;
        let watchpoint = self.engine().target_watchpoint_at_index(raw, index);
        Ok(self.wrap_watchpoint(watchpoint))
    }

    #[must_use]
    pub fn watchpoints(&self) -> Vec<Watchpoint>
    {
        (0..self.num_watchpoints())
            .filter_map(|index| self.watchpoint_at_index(index).ok().flatten())
            .collect()
    }

    #[must_use]
    pub fn tracked_watchpoint_ids(&self) -> Vec<WatchpointId>
    {
        self.inner.watchpoints.borrow().clone()
    }

    fn wrap_watchpoint(&self, raw: Option<RawHandle>) -> Option<Watchpoint>
    {
        self.inner
            .handle
            .adopt(ObjectKind::Watchpoint, raw)
            .map(|handle| Watchpoint::new(handle, self.clone()))
    }

    // Modules, memory and expressions

    #[must_use]
    pub fn executable_path(&self) -> Option<String>
    {
        self.inner.handle.read(None, |engine, raw| engine.target_executable_path(raw))
    }

    #[must_use]
    pub fn num_modules(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.target_num_modules(raw))
    }

    /// ## Errors
    ///
    /// Returns `InvalidObject` if the target is not valid.
    pub fn module_at_index(&self, index: u32) -> LldbindResult<Option<Module>>
    {
        let raw = self.inner.handle.checked()?;
        let module = self.engine().target_module_at_index(raw, index);
        Ok(self.inner.handle.adopt(ObjectKind::Module, module).map(Module::new))
    }

    #[must_use]
    pub fn modules(&self) -> Vec<Module>
    {
        (0..self.num_modules())
            .filter_map(|index| self.module_at_index(index).ok().flatten())
            .collect()
    }

    /// Evaluate an expression without a frame context.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidObject` if the target is not valid.
    pub fn evaluate_expression(&self, expression: &str) -> LldbindResult<Option<Value>>
    {
        let raw = self.inner.handle.checked()?;
        let value = self.engine().target_evaluate_expression(raw, expression);
        Ok(self
            .inner
            .handle
            .adopt(ObjectKind::Value, value)
            .map(|handle| Value::new(handle, ValueOwner::Target(self.clone()))))
    }

    /// Read memory through the target (works without a live process for
    /// file-backed sections).
    ///
    /// ## Errors
    ///
    /// - `InvalidObject` if the target is not valid
    /// - `Engine` if the read fails
    pub fn read_memory(&self, address: u64, size: usize) -> LldbindResult<Vec<u8>>
    {
        let raw = self.inner.handle.checked()?;
        let mut buf = vec![0u8; size];
        let mut status = Status::new();
        let read = self.engine().target_read_memory(raw, address, &mut buf, &mut status);
        status.raise_if_error()?;
        buf.truncate(read.min(size));
        Ok(buf)
    }

    #[must_use]
    pub fn address_byte_size(&self) -> u32
    {
        self.inner.handle.read(0, |engine, raw| engine.target_address_byte_size(raw))
    }

    #[must_use]
    pub fn triple(&self) -> Option<String>
    {
        self.inner.handle.read(None, |engine, raw| engine.target_triple(raw))
    }
}
