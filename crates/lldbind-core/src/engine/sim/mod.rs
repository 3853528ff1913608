//! # Simulated Engine
//!
//! An in-memory [`Engine`] whose debuggees are scripted [`SimProgram`]s. It
//! honours the same handle contract as the native library: every accessor
//! returns a fresh handle, validity follows the object's lifecycle (frames go
//! stale when the process resumes), and launches settle asynchronously so the
//! synchronous wait in [`launch`](crate::launch) is exercised.
//!
//! ## Example
//!
//! ```rust
//! use lldbind_core::engine::sim::{SimEngine, SimProgram};
//! use lldbind_core::prelude::*;
//!
//! let program = SimProgram::new("/bin/exit3").exit_code(3);
//! let lldb = Lldb::simulated(SimEngine::new().with_program(program));
//! let target = lldb.create_debugger()?.create_target("/bin/exit3")?;
//!
//! let process = target.launch(LaunchInfo::default())?;
//! process.continue_execution()?;
//! # while process.state() == State::Running {}
//! assert_eq!(process.exit_status(), 3);
//! # Ok::<(), LldbindError>(())
//! ```

pub mod program;
mod world;

use std::cell::{Cell, Ref, RefCell};

use tracing::trace;

use self::world::{EvalContext, Entity, ReturnState, ValueLocation, ValueState, World};
pub use self::program::{SimEnding, SimFunction, SimProgram, SimType, SimVariable};
pub use self::world::SimStats;
use super::{
    BreakpointSpec, Engine, FrameRegister, FrameText, OutputStream, ProcessControl, ReturnText, StepKind, TypeCount,
    TypeDerivation, TypeTrait, ValueDerivation, ValueText, VariableOptions,
};
use crate::capability::Capabilities;
use crate::handle::{ObjectKind, RawHandle};
use crate::launch::LaunchInfo;
use crate::status::Status;
use crate::types::{MemoryRegionInfo, State, StopReason, SymbolContextItem};

const VERSION: &str = "lldb version 17.0.6";

/// The in-memory engine
pub struct SimEngine
{
    world: RefCell<World>,
    capabilities: Capabilities,
    initialized: Cell<bool>,
    uninitialized_calls: Cell<usize>,
}

impl SimEngine
{
    /// An engine with every optional entry point available and no programs.
    #[must_use]
    pub fn new() -> Self
    {
        Self {
            world: RefCell::new(World::new()),
            capabilities: Capabilities::all(),
            initialized: Cell::new(false),
            uninitialized_calls: Cell::new(0),
        }
    }

    /// Register an executable; targets are created from it by path.
    #[must_use]
    pub fn with_program(mut self, program: SimProgram) -> Self
    {
        let programs = &mut self.world.get_mut().programs;
        programs.retain(|known| known.path != program.path);
        programs.push(program);
        self
    }

    /// Pretend the loaded library lacks some optional entry points.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self
    {
        self.capabilities = capabilities;
        self
    }

    /// Make a running process available to attach to.
    #[must_use]
    pub fn with_attachable(mut self, pid: u64, name: &str) -> Self
    {
        self.world.get_mut().attachable.push((pid, name.to_string()));
        self
    }

    /// Handle and call counters, for leak checks.
    #[must_use]
    pub fn stats(&self) -> SimStats
    {
        let world = self.world.borrow();
        SimStats {
            live_handles: world.live_handles(),
            uninitialized_calls: self.uninitialized_calls.get(),
            ..world.stats.clone()
        }
    }

    fn world(&self) -> Ref<'_, World>
    {
        self.note_call();
        self.world.borrow()
    }

    fn with_world<T>(&self, f: impl FnOnce(&mut World) -> T) -> T
    {
        self.note_call();
        f(&mut self.world.borrow_mut())
    }

    fn note_call(&self)
    {
        if !self.initialized.get() {
            self.uninitialized_calls.set(self.uninitialized_calls.get() + 1);
        }
    }
}

impl Default for SimEngine
{
    fn default() -> Self
    {
        Self::new()
    }
}

fn count(n: usize) -> u32
{
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn index(i: u32) -> usize
{
    i as usize
}

fn new_value(world: &mut World, value: ValueState) -> Option<RawHandle>
{
    let v = world.add_value(value);
    world.alloc(Entity::Value(v))
}

fn report<T>(result: Result<T, String>, status: &mut Status) -> Option<T>
{
    result.map_err(|message| status.set_error(message)).ok()
}

impl Engine for SimEngine
{
    fn initialize(&self)
    {
        self.initialized.set(true);
        self.with_world(|world| world.stats.initialize_calls += 1);
    }

    fn terminate(&self)
    {
        self.initialized.set(false);
        self.world.borrow_mut().stats.terminate_calls += 1;
    }

    fn version_string(&self) -> Option<String>
    {
        Some(VERSION.to_string())
    }

    fn capabilities(&self) -> Capabilities
    {
        self.capabilities
    }

    fn is_valid(&self, kind: ObjectKind, handle: RawHandle) -> bool
    {
        self.initialized.get() && self.world().is_valid(kind, handle)
    }

    fn destroy(&self, kind: ObjectKind, handle: RawHandle)
    {
        trace!("Simulated destroy of {} {}", kind, handle);
        if self.initialized.get() {
            self.with_world(|world| world.destroy(kind, handle));
        } else {
            self.note_call();
        }
    }

    // Debugger

    fn debugger_create(&self) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let d = world.create_debugger();
            world.alloc(Entity::Debugger(d))
        })
    }

    fn debugger_create_target(
        &self,
        debugger: RawHandle,
        filename: &str,
        _arch: Option<&str>,
        _platform: Option<&str>,
        add_dependent_modules: bool,
        status: &mut Status,
    ) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let d = world.debugger_index(debugger)?;
            let t = report(world.create_target(d, filename, add_dependent_modules), status)?;
            world.alloc(Entity::Target(t))
        })
    }

    fn debugger_num_targets(&self, debugger: RawHandle) -> u32
    {
        let world = self.world();
        world
            .debugger_index(debugger)
            .map_or(0, |d| count(world.debuggers[d].targets.len()))
    }

    fn debugger_target_at_index(&self, debugger: RawHandle, i: u32) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let d = world.debugger_index(debugger)?;
            let t = *world.debuggers[d].targets.get(index(i))?;
            world.alloc(Entity::Target(t))
        })
    }

    fn debugger_selected_target(&self, debugger: RawHandle) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let d = world.debugger_index(debugger)?;
            let t = world.debuggers[d].selected?;
            world.alloc(Entity::Target(t))
        })
    }

    fn debugger_set_selected_target(&self, debugger: RawHandle, target: RawHandle)
    {
        self.with_world(|world| {
            if let (Some(d), Some(t)) = (world.debugger_index(debugger), world.target_index(target)) {
                if world.debuggers[d].targets.contains(&t) {
                    world.debuggers[d].selected = Some(t);
                }
            }
        });
    }

    fn debugger_delete_target(&self, debugger: RawHandle, target: RawHandle) -> bool
    {
        self.with_world(|world| match (world.debugger_index(debugger), world.target_index(target)) {
            (Some(d), Some(t)) => world.delete_target(d, t),
            _ => false,
        })
    }

    fn debugger_find_target_with_process_id(&self, debugger: RawHandle, pid: u64) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let d = world.debugger_index(debugger)?;
            let t = world.debuggers[d].targets.iter().copied().find(|t| {
                world.targets[*t]
                    .process
                    .is_some_and(|p| world.processes[p].pid == pid && world.process_is_live(p))
            })?;
            world.alloc(Entity::Target(t))
        })
    }

    fn debugger_async(&self, debugger: RawHandle) -> bool
    {
        let world = self.world();
        world.debugger_index(debugger).is_some_and(|d| world.debuggers[d].is_async)
    }

    fn debugger_set_async(&self, debugger: RawHandle, is_async: bool)
    {
        self.with_world(|world| {
            if let Some(d) = world.debugger_index(debugger) {
                world.debuggers[d].is_async = is_async;
            }
        });
    }

    fn debugger_command_interpreter(&self, debugger: RawHandle) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let d = world.debugger_index(debugger)?;
            world.alloc(Entity::Interpreter(d))
        })
    }

    fn debugger_handle_command(&self, debugger: RawHandle, command: &str)
    {
        let world = self.world();
        if let Some(d) = world.debugger_index(debugger) {
            let (status, _) = world.run_command(d, command, VERSION);
            trace!("Simulated command '{}' finished with status {}", command, status);
        }
    }

    // Target

    fn target_launch(&self, target: RawHandle, info: &LaunchInfo, status: &mut Status) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let t = world.target_index(target)?;
            let p = report(world.launch(t, info), status)?;
            world.alloc(Entity::Process(p))
        })
    }

    fn target_attach_to_pid(&self, target: RawHandle, pid: u64, status: &mut Status) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let t = world.target_index(target)?;
            let p = report(world.attach(t, pid), status)?;
            world.alloc(Entity::Process(p))
        })
    }

    fn target_attach_to_name(
        &self,
        target: RawHandle,
        name: &str,
        wait_for: bool,
        status: &mut Status,
    ) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let t = world.target_index(target)?;
            let p = report(world.attach_by_name(t, name, wait_for), status)?;
            world.alloc(Entity::Process(p))
        })
    }

    fn target_create_breakpoint(&self, target: RawHandle, spec: &BreakpointSpec) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let t = world.target_index(target)?;
            let id = world.create_breakpoint(t, spec);
            world.alloc(Entity::Breakpoint { target: t, id })
        })
    }

    fn target_delete_breakpoint(&self, target: RawHandle, id: i32) -> bool
    {
        self.with_world(|world| {
            let Some(t) = world.target_index(target) else {
                return false;
            };
            let breakpoints = &mut world.targets[t].breakpoints;
            let before = breakpoints.len();
            breakpoints.retain(|breakpoint| breakpoint.id != id);
            breakpoints.len() != before
        })
    }

    fn target_delete_all_breakpoints(&self, target: RawHandle) -> bool
    {
        self.with_world(|world| {
            world
                .target_index(target)
                .map(|t| world.targets[t].breakpoints.clear())
                .is_some()
        })
    }

    fn target_set_all_breakpoints_enabled(&self, target: RawHandle, enabled: bool) -> bool
    {
        self.with_world(|world| {
            let Some(t) = world.target_index(target) else {
                return false;
            };
            for breakpoint in &mut world.targets[t].breakpoints {
                breakpoint.common.enabled = enabled;
            }
            true
        })
    }

    fn target_find_breakpoint(&self, target: RawHandle, id: i32) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let t = world.target_index(target)?;
            world.targets[t].breakpoint_mut(id)?;
            world.alloc(Entity::Breakpoint { target: t, id })
        })
    }

    fn target_num_breakpoints(&self, target: RawHandle) -> u32
    {
        let world = self.world();
        world
            .target_index(target)
            .map_or(0, |t| count(world.targets[t].breakpoints.len()))
    }

    fn target_breakpoint_at_index(&self, target: RawHandle, i: u32) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let t = world.target_index(target)?;
            let id = world.targets[t].breakpoints.get(index(i))?.id;
            world.alloc(Entity::Breakpoint { target: t, id })
        })
    }

    fn target_process(&self, target: RawHandle) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let t = world.target_index(target)?;
            let p = world.targets[t].process.filter(|p| !world.processes[*p].detached)?;
            world.alloc(Entity::Process(p))
        })
    }

    fn target_executable_path(&self, target: RawHandle) -> Option<String>
    {
        let world = self.world();
        world.target_index(target).map(|t| world.targets[t].program.path.clone())
    }

    fn target_num_modules(&self, target: RawHandle) -> u32
    {
        let world = self.world();
        world
            .target_index(target)
            .map_or(0, |t| count(world.targets[t].num_modules()))
    }

    fn target_module_at_index(&self, target: RawHandle, i: u32) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let t = world.target_index(target)?;
            let i = index(i);
            (i < world.targets[t].num_modules()).then_some(())?;
            world.alloc(Entity::Module { target: t, index: i })
        })
    }

    fn target_evaluate_expression(&self, target: RawHandle, expression: &str) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let t = world.target_index(target)?;
            let process = world.targets[t].process.filter(|p| world.process_is_live(*p));
            let context = EvalContext {
                target: t,
                process,
                frame: None,
            };
            let value = world.evaluate(context, expression);
            new_value(world, value)
        })
    }

    fn target_read_memory(&self, target: RawHandle, address: u64, buf: &mut [u8], status: &mut Status) -> usize
    {
        let world = self.world();
        let Some(t) = world.target_index(target) else {
            return 0;
        };
        report(world.read_target_memory(t, address, buf), status).unwrap_or(0)
    }

    fn target_address_byte_size(&self, target: RawHandle) -> u32
    {
        let world = self.world();
        match world.target_index(target) {
            Some(t) if world.targets[t].program.triple.starts_with("i386") => 4,
            Some(t) if world.targets[t].program.triple.starts_with("arm-") => 4,
            Some(_) => 8,
            None => 0,
        }
    }

    fn target_triple(&self, target: RawHandle) -> Option<String>
    {
        let world = self.world();
        world.target_index(target).map(|t| world.targets[t].program.triple.clone())
    }

    fn target_watch_address(
        &self,
        target: RawHandle,
        address: u64,
        size: usize,
        read: bool,
        write: bool,
        status: &mut Status,
    ) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let t = world.target_index(target)?;
            let id = report(world.create_watchpoint(t, address, size, read, write), status)?;
            world.alloc(Entity::Watchpoint { target: t, id })
        })
    }

    fn target_delete_watchpoint(&self, target: RawHandle, id: i32) -> bool
    {
        self.with_world(|world| {
            let Some(t) = world.target_index(target) else {
                return false;
            };
            let watchpoints = &mut world.targets[t].watchpoints;
            let before = watchpoints.len();
            watchpoints.retain(|watchpoint| watchpoint.id != id);
            watchpoints.len() != before
        })
    }

    fn target_delete_all_watchpoints(&self, target: RawHandle) -> bool
    {
        self.with_world(|world| {
            world
                .target_index(target)
                .map(|t| world.targets[t].watchpoints.clear())
                .is_some()
        })
    }

    fn target_find_watchpoint(&self, target: RawHandle, id: i32) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let t = world.target_index(target)?;
            world.targets[t].watchpoint_mut(id)?;
            world.alloc(Entity::Watchpoint { target: t, id })
        })
    }

    fn target_num_watchpoints(&self, target: RawHandle) -> u32
    {
        let world = self.world();
        world
            .target_index(target)
            .map_or(0, |t| count(world.targets[t].watchpoints.len()))
    }

    fn target_watchpoint_at_index(&self, target: RawHandle, i: u32) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let t = world.target_index(target)?;
            let id = world.targets[t].watchpoints.get(index(i))?.id;
            world.alloc(Entity::Watchpoint { target: t, id })
        })
    }

    // Process

    fn process_control(&self, process: RawHandle, control: ProcessControl) -> bool
    {
        self.with_world(|world| world.process_index(process).is_some_and(|p| world.control(p, control)))
    }

    fn process_signal(&self, process: RawHandle, signal: i32) -> bool
    {
        self.with_world(|world| world.process_index(process).is_some_and(|p| world.signal(p, signal)))
    }

    fn process_state(&self, process: RawHandle) -> i32
    {
        self.with_world(|world| {
            world
                .process_index(process)
                .map_or(State::Invalid, |p| world.poll_state(p))
                .raw()
        })
    }

    fn process_num_threads(&self, process: RawHandle) -> u32
    {
        let world = self.world();
        world
            .process_index(process)
            .map_or(0, |p| u32::from(world.process_is_live(p)))
    }

    fn process_thread_at_index(&self, process: RawHandle, i: u32) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let p = world.process_index(process).filter(|p| world.process_is_live(*p))?;
            (i == 0).then_some(())?;
            world.alloc(Entity::Thread(p))
        })
    }

    fn process_thread_by_id(&self, process: RawHandle, tid: u64) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let p = world.process_index(process).filter(|p| world.process_is_live(*p))?;
            (world.processes[p].pid == tid).then_some(())?;
            world.alloc(Entity::Thread(p))
        })
    }

    fn process_thread_by_index_id(&self, process: RawHandle, index_id: u32) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let p = world.process_index(process).filter(|p| world.process_is_live(*p))?;
            (index_id == 1).then_some(())?;
            world.alloc(Entity::Thread(p))
        })
    }

    fn process_selected_thread(&self, process: RawHandle) -> Option<RawHandle>
    {
        self.process_thread_at_index(process, 0)
    }

    fn process_select_thread_by_id(&self, process: RawHandle, tid: u64) -> bool
    {
        let world = self.world();
        world
            .process_index(process)
            .is_some_and(|p| world.process_is_live(p) && world.processes[p].pid == tid)
    }

    fn process_select_thread_by_index_id(&self, process: RawHandle, index_id: u32) -> bool
    {
        let world = self.world();
        world
            .process_index(process)
            .is_some_and(|p| world.process_is_live(p) && index_id == 1)
    }

    fn process_pid(&self, process: RawHandle) -> u64
    {
        let world = self.world();
        world.process_index(process).map_or(0, |p| world.processes[p].pid)
    }

    fn process_exit_status(&self, process: RawHandle) -> i32
    {
        let world = self.world();
        match world.process_index(process) {
            Some(p) if world.processes[p].state == State::Exited => world.processes[p].exit_status,
            _ => -1,
        }
    }

    fn process_exit_description(&self, process: RawHandle) -> Option<String>
    {
        let world = self.world();
        world
            .process_index(process)
            .and_then(|p| world.processes[p].exit_description.clone())
    }

    fn process_read_memory(&self, process: RawHandle, address: u64, buf: &mut [u8], status: &mut Status) -> usize
    {
        let world = self.world();
        match world.process_index(process).filter(|p| world.process_is_live(*p)) {
            Some(p) => report(world.read_memory(p, address, buf), status).unwrap_or(0),
            None => {
                status.set_error("error: invalid process");
                0
            }
        }
    }

    fn process_write_memory(&self, process: RawHandle, address: u64, data: &[u8], status: &mut Status) -> usize
    {
        self.with_world(|world| match world.process_index(process).filter(|p| world.process_is_live(*p)) {
            Some(p) => report(world.write_memory(p, address, data), status).unwrap_or(0),
            None => {
                status.set_error("error: invalid process");
                0
            }
        })
    }

    fn process_allocate_memory(&self, process: RawHandle, size: usize, permissions: u32, status: &mut Status) -> u64
    {
        self.with_world(|world| match world.process_index(process).filter(|p| world.process_is_live(*p)) {
            Some(p) => report(world.allocate(p, size, permissions), status).unwrap_or(world::INVALID_ADDRESS),
            None => {
                status.set_error("error: invalid process");
                world::INVALID_ADDRESS
            }
        })
    }

    fn process_deallocate_memory(&self, process: RawHandle, address: u64) -> bool
    {
        self.with_world(|world| {
            world
                .process_index(process)
                .filter(|p| world.process_is_live(*p))
                .is_some_and(|p| world.deallocate(p, address))
        })
    }

    fn process_read_cstring(&self, process: RawHandle, address: u64, buf: &mut [u8], status: &mut Status) -> usize
    {
        let world = self.world();
        match world.process_index(process).filter(|p| world.process_is_live(*p)) {
            Some(p) => report(world.read_cstring(p, address, buf), status).unwrap_or(0),
            None => {
                status.set_error("error: invalid process");
                0
            }
        }
    }

    fn process_read_output(&self, process: RawHandle, stream: OutputStream, buf: &mut [u8]) -> usize
    {
        self.with_world(|world| {
            let Some(p) = world.process_index(process) else {
                return 0;
            };
            let pending = match stream {
                OutputStream::Stdout => &mut world.processes[p].stdout,
                OutputStream::Stderr => &mut world.processes[p].stderr,
            };
            let read = buf.len().min(pending.len());
            for (slot, byte) in buf.iter_mut().zip(pending.drain(..read)) {
                *slot = byte;
            }
            read
        })
    }

    fn process_put_stdin(&self, process: RawHandle, data: &[u8]) -> usize
    {
        self.with_world(|world| match world.process_index(process).filter(|p| world.process_is_live(*p)) {
            Some(p) => {
                world.processes[p].stdin.extend_from_slice(data);
                data.len()
            }
            None => 0,
        })
    }

    fn process_num_supported_hardware_watchpoints(&self, process: RawHandle, status: &mut Status) -> u32
    {
        let world = self.world();
        if world.process_index(process).is_some_and(|p| world.process_is_live(p)) {
            world::HARDWARE_WATCHPOINTS
        } else {
            status.set_error("error: invalid process");
            0
        }
    }

    fn process_unique_id(&self, process: RawHandle) -> u32
    {
        let world = self.world();
        world.process_index(process).map_or(0, |p| world.processes[p].unique_id)
    }

    fn process_memory_region_info(
        &self,
        process: RawHandle,
        address: u64,
        status: &mut Status,
    ) -> Option<MemoryRegionInfo>
    {
        let world = self.world();
        match world.process_index(process).filter(|p| world.process_is_live(*p)) {
            Some(p) => Some(world.region_info(p, address)),
            None => {
                status.set_error("error: invalid process");
                None
            }
        }
    }

    // Thread

    fn thread_step(&self, thread: RawHandle, kind: StepKind) -> bool
    {
        self.with_world(|world| world.thread_process(thread).is_some_and(|p| world.step(p, kind)))
    }

    fn thread_run_to_address(&self, thread: RawHandle, address: u64) -> bool
    {
        self.with_world(|world| {
            world
                .thread_process(thread)
                .is_some_and(|p| world.run_to_address(p, address))
        })
    }

    fn thread_num_frames(&self, thread: RawHandle) -> u32
    {
        let world = self.world();
        match world.thread_process(thread) {
            Some(p) if matches!(world.processes[p].state, State::Stopped | State::Crashed) => {
                count(world.processes[p].frames.len())
            }
            _ => 0,
        }
    }

    fn thread_frame_at_index(&self, thread: RawHandle, i: u32) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let p = world.thread_process(thread)?;
            let process = &world.processes[p];
            if !matches!(process.state, State::Stopped | State::Crashed) || index(i) >= process.frames.len() {
                return None;
            }
            let stop_id = process.stop_id;
            world.alloc(Entity::Frame {
                process: p,
                stop_id,
                index: index(i),
            })
        })
    }

    fn thread_selected_frame(&self, thread: RawHandle) -> Option<RawHandle>
    {
        let selected = {
            let world = self.world();
            let p = world.thread_process(thread)?;
            count(world.processes[p].selected_frame)
        };
        self.thread_frame_at_index(thread, selected)
    }

    fn thread_select_frame(&self, thread: RawHandle, i: u32) -> bool
    {
        self.with_world(|world| {
            let Some(p) = world.thread_process(thread) else {
                return false;
            };
            let process = &mut world.processes[p];
            if index(i) < process.frames.len() {
                process.selected_frame = index(i);
                true
            } else {
                false
            }
        })
    }

    fn thread_id(&self, thread: RawHandle) -> u64
    {
        let world = self.world();
        world.thread_process(thread).map_or(0, |p| world.processes[p].pid)
    }

    fn thread_index_id(&self, thread: RawHandle) -> u32
    {
        u32::from(self.world().thread_process(thread).is_some())
    }

    fn thread_name(&self, thread: RawHandle) -> Option<String>
    {
        let world = self.world();
        world.thread_process(thread).map(|p| world.program_of(p).file_name())
    }

    fn thread_queue_name(&self, _thread: RawHandle) -> Option<String>
    {
        None
    }

    fn thread_stop_reason(&self, thread: RawHandle) -> i32
    {
        let world = self.world();
        match world.thread_process(thread) {
            Some(p) if matches!(world.processes[p].state, State::Stopped | State::Crashed) => {
                world.processes[p].stop.reason.raw()
            }
            Some(_) => StopReason::None.raw(),
            None => StopReason::Invalid.raw(),
        }
    }

    fn thread_stop_description(&self, thread: RawHandle, max_len: usize) -> Option<String>
    {
        let world = self.world();
        let p = world.thread_process(thread)?;
        let description = world.processes[p].stop.description.as_deref()?;
        Some(description.chars().take(max_len).collect())
    }

    fn thread_stop_reason_data_count(&self, thread: RawHandle) -> u64
    {
        let world = self.world();
        world
            .thread_process(thread)
            .map_or(0, |p| world.processes[p].stop.data.len() as u64)
    }

    fn thread_stop_reason_data_at_index(&self, thread: RawHandle, i: u32) -> u64
    {
        let world = self.world();
        world
            .thread_process(thread)
            .and_then(|p| world.processes[p].stop.data.get(index(i)).copied())
            .unwrap_or(0)
    }

    fn thread_is_stopped(&self, thread: RawHandle) -> bool
    {
        let world = self.world();
        world
            .thread_process(thread)
            .is_some_and(|p| matches!(world.processes[p].state, State::Stopped | State::Crashed))
    }

    fn thread_is_suspended(&self, thread: RawHandle) -> bool
    {
        let world = self.world();
        world.thread_process(thread).is_some_and(|p| world.processes[p].suspended)
    }

    fn thread_set_suspended(&self, thread: RawHandle, suspended: bool) -> bool
    {
        self.with_world(|world| match world.thread_process(thread) {
            Some(p) => {
                world.processes[p].suspended = suspended;
                true
            }
            None => false,
        })
    }

    fn thread_process(&self, thread: RawHandle) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let p = world.thread_process(thread)?;
            world.alloc(Entity::Process(p))
        })
    }

    // Frame

    fn frame_text(&self, frame: RawHandle, text: FrameText) -> Option<String>
    {
        let world = self.world();
        let (p, _, state) = world.frame_state(frame)?;
        let program = world.program_of(p);
        let function = &program.functions[state.function];
        match text {
            FrameText::FunctionName => Some(function.name.clone()),
            FrameText::DisplayFunctionName => {
                if function.file.is_none() {
                    return Some(function.name.clone());
                }
                let arguments: Vec<String> = function
                    .variables
                    .iter()
                    .filter(|variable| variable.argument)
                    .map(|variable| variable.ty.name())
                    .collect();
                Some(format!("{}({})", function.name, arguments.join(", ")))
            }
            FrameText::FilePath => function.file.clone(),
            FrameText::Disassembly => {
                let start = SimProgram::function_address(state.function);
                let mut listing = format!("{}`{}:\n", program.file_name(), function.name);
                let lines = [
                    (0, "pushq  %rbp"),
                    (1, "movq   %rsp, %rbp"),
                    (4, "nop"),
                    (program::FUNCTION_STRIDE - 1, "retq"),
                ];
                for (offset, instruction) in lines {
                    let address = start + offset;
                    let marker = if address == state.pc { "->" } else { "  " };
                    listing.push_str(&format!("{marker}  0x{address:x} <+{offset}>: {instruction}\n"));
                }
                Some(listing)
            }
        }
    }

    fn frame_line(&self, frame: RawHandle) -> u32
    {
        self.world().frame_state(frame).map_or(0, |(_, _, state)| state.line)
    }

    fn frame_column(&self, frame: RawHandle) -> u32
    {
        let world = self.world();
        match world.frame_state(frame) {
            Some((_, _, state)) if state.line > 0 => 3,
            _ => 0,
        }
    }

    fn frame_register(&self, frame: RawHandle, register: FrameRegister) -> u64
    {
        let world = self.world();
        let Some((_, i, state)) = world.frame_state(frame) else {
            return world::INVALID_ADDRESS;
        };
        match register {
            FrameRegister::Pc => state.pc,
            FrameRegister::Sp => world::stack_pointer(i),
            FrameRegister::Fp => world::frame_pointer(i),
        }
    }

    fn frame_set_pc(&self, frame: RawHandle, pc: u64) -> bool
    {
        self.with_world(|world| {
            let Some((p, i, _)) = world.frame_state(frame) else {
                return false;
            };
            let program = world.program_of(p);
            let Some(function) = program.function_at(pc) else {
                return false;
            };
            let line = program.functions[function].line;
            let state = &mut world.processes[p].frames[i];
            state.function = function;
            state.line = line;
            state.pc = pc;
            true
        })
    }

    fn frame_find_variable(&self, frame: RawHandle, name: &str) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let (p, i) = world.frame_ref(frame)?;
            let value = world.variable_value(p, i, name)?;
            new_value(world, value)
        })
    }

    fn frame_evaluate_expression(&self, frame: RawHandle, expression: &str) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let (p, i) = world.frame_ref(frame)?;
            let context = EvalContext {
                target: world.processes[p].target,
                process: Some(p),
                frame: Some(i),
            };
            let value = world.evaluate(context, expression);
            new_value(world, value)
        })
    }

    fn frame_value_for_variable_path(&self, frame: RawHandle, path: &str) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let (p, i) = world.frame_ref(frame)?;
            let context = EvalContext {
                target: world.processes[p].target,
                process: Some(p),
                frame: Some(i),
            };
            let value = world.resolve_path(context, path).ok()?;
            new_value(world, value)
        })
    }

    fn frame_id(&self, frame: RawHandle) -> u32
    {
        self.world().frame_ref(frame).map_or(u32::MAX, |(_, i)| count(i))
    }

    fn frame_thread(&self, frame: RawHandle) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let (p, _) = world.frame_ref(frame)?;
            world.alloc(Entity::Thread(p))
        })
    }

    fn frame_symbol_context(&self, frame: RawHandle, scope: SymbolContextItem) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let (p, _, state) = world.frame_state(frame)?;
            let wants_function = scope.contains(SymbolContextItem::FUNCTION)
                || scope.contains(SymbolContextItem::MODULE)
                || scope.contains(SymbolContextItem::SYMBOL);
            world.alloc(Entity::SymbolContext {
                target: world.processes[p].target,
                function: wants_function.then_some(state.function),
            })
        })
    }

    fn frame_variables(&self, frame: RawHandle, options: VariableOptions) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let (p, i) = world.frame_ref(frame)?;
            let values = world
                .frame_variables(p, i, options)
                .into_iter()
                .map(|value| world.add_value(value))
                .collect();
            world.alloc(Entity::ValueList(values))
        })
    }

    fn frame_registers(&self, frame: RawHandle) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let (p, i) = world.frame_ref(frame)?;
            let registers = world.register_set(p, i)?;
            let v = world.add_value(registers);
            world.alloc(Entity::ValueList(vec![v]))
        })
    }

    fn frame_is_inlined(&self, _frame: RawHandle) -> bool
    {
        false
    }

    fn frame_module(&self, frame: RawHandle) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let (p, _) = world.frame_ref(frame)?;
            world.alloc(Entity::Module {
                target: world.processes[p].target,
                index: 0,
            })
        })
    }

    // Stop points

    fn stop_point_id(&self, kind: ObjectKind, handle: RawHandle) -> i32
    {
        self.world().stop_point_id(kind, handle).unwrap_or(-1)
    }

    fn stop_point_is_enabled(&self, kind: ObjectKind, handle: RawHandle) -> bool
    {
        self.with_world(|world| world.stop_fields_mut(kind, handle).is_some_and(|fields| fields.enabled))
    }

    fn stop_point_set_enabled(&self, kind: ObjectKind, handle: RawHandle, enabled: bool)
    {
        self.with_world(|world| {
            if let Some(fields) = world.stop_fields_mut(kind, handle) {
                fields.enabled = enabled;
            }
        });
    }

    fn stop_point_hit_count(&self, kind: ObjectKind, handle: RawHandle) -> u32
    {
        self.with_world(|world| world.stop_fields_mut(kind, handle).map_or(0, |fields| fields.hit_count))
    }

    fn stop_point_ignore_count(&self, kind: ObjectKind, handle: RawHandle) -> u32
    {
        self.with_world(|world| world.stop_fields_mut(kind, handle).map_or(0, |fields| fields.ignore_count))
    }

    fn stop_point_set_ignore_count(&self, kind: ObjectKind, handle: RawHandle, count: u32)
    {
        self.with_world(|world| {
            if let Some(fields) = world.stop_fields_mut(kind, handle) {
                fields.ignore_count = count;
            }
        });
    }

    fn stop_point_condition(&self, kind: ObjectKind, handle: RawHandle) -> Option<String>
    {
        self.with_world(|world| world.stop_fields_mut(kind, handle)?.condition.clone())
    }

    fn stop_point_set_condition(&self, kind: ObjectKind, handle: RawHandle, condition: Option<&str>)
    {
        self.with_world(|world| {
            if let Some(fields) = world.stop_fields_mut(kind, handle) {
                fields.condition = condition.filter(|text| !text.is_empty()).map(str::to_string);
            }
        });
    }

    // Breakpoint

    fn breakpoint_is_one_shot(&self, breakpoint: RawHandle) -> bool
    {
        self.world().breakpoint(breakpoint).is_some_and(|bp| bp.one_shot)
    }

    fn breakpoint_set_one_shot(&self, breakpoint: RawHandle, one_shot: bool)
    {
        self.with_world(|world| {
            if let Some(bp) = world.breakpoint_mut(breakpoint) {
                bp.one_shot = one_shot;
            }
        });
    }

    fn breakpoint_num_locations(&self, breakpoint: RawHandle) -> u32
    {
        self.world
            .borrow()
            .breakpoint(breakpoint)
            .map_or(0, |bp| count(bp.locations.len()))
    }

    fn breakpoint_location_at_index(&self, breakpoint: RawHandle, i: u32) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let (target, id) = world.breakpoint_ref(breakpoint)?;
            let location = world.breakpoint(breakpoint)?.locations.get(index(i))?.id;
            world.alloc(Entity::Location {
                target,
                breakpoint: id,
                id: location,
            })
        })
    }

    fn breakpoint_find_location(&self, breakpoint: RawHandle, id: i32) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let (target, bp) = world.breakpoint_ref(breakpoint)?;
            world
                .breakpoint(breakpoint)?
                .locations
                .iter()
                .any(|location| location.id == id)
                .then_some(())?;
            world.alloc(Entity::Location {
                target,
                breakpoint: bp,
                id,
            })
        })
    }

    fn breakpoint_is_hardware(&self, _breakpoint: RawHandle) -> bool
    {
        false
    }

    fn breakpoint_auto_continue(&self, breakpoint: RawHandle) -> bool
    {
        self.world
            .borrow()
            .breakpoint(breakpoint)
            .is_some_and(|bp| bp.auto_continue)
    }

    fn breakpoint_set_auto_continue(&self, breakpoint: RawHandle, auto_continue: bool)
    {
        self.with_world(|world| {
            if let Some(bp) = world.breakpoint_mut(breakpoint) {
                bp.auto_continue = auto_continue;
            }
        });
    }

    fn breakpoint_thread_id(&self, breakpoint: RawHandle) -> u64
    {
        self.world().breakpoint(breakpoint).map_or(0, |bp| bp.thread_id)
    }

    fn breakpoint_set_thread_id(&self, breakpoint: RawHandle, tid: u64)
    {
        self.with_world(|world| {
            if let Some(bp) = world.breakpoint_mut(breakpoint) {
                bp.thread_id = tid;
            }
        });
    }

    fn breakpoint_thread_name(&self, breakpoint: RawHandle) -> Option<String>
    {
        self.world().breakpoint(breakpoint)?.thread_name.clone()
    }

    fn breakpoint_set_thread_name(&self, breakpoint: RawHandle, name: Option<&str>)
    {
        self.with_world(|world| {
            if let Some(bp) = world.breakpoint_mut(breakpoint) {
                bp.thread_name = name.map(str::to_string);
            }
        });
    }

    fn breakpoint_thread_index(&self, breakpoint: RawHandle) -> u32
    {
        self.world().breakpoint(breakpoint).map_or(0, |bp| bp.thread_index)
    }

    fn breakpoint_set_thread_index(&self, breakpoint: RawHandle, i: u32)
    {
        self.with_world(|world| {
            if let Some(bp) = world.breakpoint_mut(breakpoint) {
                bp.thread_index = i;
            }
        });
    }

    // Breakpoint location

    fn location_load_address(&self, location: RawHandle) -> u64
    {
        self.world
            .borrow()
            .location(location)
            .map_or(world::INVALID_ADDRESS, |location| location.address)
    }

    fn location_breakpoint(&self, location: RawHandle) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let (target, id, _) = world.location_ref(location)?;
            world.alloc(Entity::Breakpoint { target, id })
        })
    }

    // Watchpoint

    fn watchpoint_address(&self, watchpoint: RawHandle) -> u64
    {
        self.world
            .borrow()
            .watchpoint(watchpoint)
            .map_or(world::INVALID_ADDRESS, |wp| wp.address)
    }

    fn watchpoint_size(&self, watchpoint: RawHandle) -> usize
    {
        self.world().watchpoint(watchpoint).map_or(0, |wp| wp.size)
    }

    fn watchpoint_is_watching_reads(&self, watchpoint: RawHandle) -> bool
    {
        self.world().watchpoint(watchpoint).is_some_and(|wp| wp.read)
    }

    fn watchpoint_is_watching_writes(&self, watchpoint: RawHandle) -> bool
    {
        self.world().watchpoint(watchpoint).is_some_and(|wp| wp.write)
    }

    // Value

    fn value_text(&self, value: RawHandle, text: ValueText) -> Option<String>
    {
        let world = self.world();
        let state = world.value(value)?;
        let non_empty = |text: &str| (!text.is_empty()).then(|| text.to_string());
        match text {
            ValueText::Name => non_empty(&state.name),
            ValueText::Value => world.value_text(state),
            ValueText::Summary => world.value_summary(state),
            ValueText::TypeName if state.error.is_some() => None,
            ValueText::TypeName => Some(state.ty.name()),
            ValueText::ExpressionPath => non_empty(&state.path),
        }
    }

    fn value_type(&self, value: RawHandle) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let state = world.value(value)?;
            if state.error.is_some() {
                return None;
            }
            let ty = state.ty.clone();
            world.alloc(Entity::Type(ty))
        })
    }

    fn value_num_children(&self, value: RawHandle) -> u32
    {
        self.world
            .borrow()
            .value(value)
            .map_or(0, |state| count(World::num_children(state)))
    }

    fn value_child_at_index(&self, value: RawHandle, i: u32) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let child = world.child(world.value(value)?, index(i))?;
            new_value(world, child)
        })
    }

    fn value_child_member_with_name(&self, value: RawHandle, name: &str) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let child = World::child_by_name(world.value(value)?, name)?;
            new_value(world, child)
        })
    }

    fn value_as_signed(&self, value: RawHandle) -> i64
    {
        let world = self.world();
        world.value(value).map_or(0, |state| world.value_signed(state))
    }

    fn value_as_unsigned(&self, value: RawHandle) -> u64
    {
        let world = self.world();
        world.value(value).and_then(|state| world.value_bits(state)).unwrap_or(0)
    }

    fn value_byte_size(&self, value: RawHandle) -> u64
    {
        self.world().value(value).map_or(0, |state| state.ty.byte_size())
    }

    fn value_might_have_children(&self, value: RawHandle) -> bool
    {
        self.world().value(value).is_some_and(|state| {
            state.error.is_none()
                && matches!(
                    state.ty,
                    SimType::Struct { .. } | SimType::Array(..) | SimType::Pointer(_)
                )
        })
    }

    fn value_error(&self, value: RawHandle, status: &mut Status)
    {
        if let Some(message) = self.world().value(value).and_then(|state| state.error.clone()) {
            status.set_error(message);
        }
    }

    fn value_derive(&self, value: RawHandle, derivation: ValueDerivation) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let state = world.value(value)?;
            let derived = match derivation {
                ValueDerivation::Dereference => match world.dereference(state) {
                    Ok(derived) => derived,
                    Err(message) => state.with_error(message),
                },
                ValueDerivation::AddressOf => World::address_of(state)?,
                ValueDerivation::NonSynthetic => state.clone(),
            };
            new_value(world, derived)
        })
    }

    fn value_cast(&self, value: RawHandle, ty: RawHandle) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let cast = World::cast(world.value(value)?, world.type_of(ty)?);
            new_value(world, cast)
        })
    }

    fn value_load_address(&self, value: RawHandle) -> u64
    {
        match self.world().value(value).map(|state| &state.location) {
            Some(ValueLocation::Memory(address)) => *address,
            _ => world::INVALID_ADDRESS,
        }
    }

    fn value_value_type(&self, value: RawHandle) -> i32
    {
        self.world
            .borrow()
            .value(value)
            .map_or(crate::types::ValueType::Invalid, |state| state.value_type)
            .raw()
    }

    fn value_set_from_str(&self, value: RawHandle, text: &str, status: &mut Status) -> bool
    {
        self.with_world(|world| {
            let Some(v) = world.value_index(value) else {
                return false;
            };
            report(world.set_value(v, text), status).unwrap_or(false)
        })
    }

    fn value_create_child_at_offset(&self, value: RawHandle, name: &str, ty: RawHandle, offset: u32)
        -> Option<RawHandle>
    {
        self.with_world(|world| {
            let child = World::value_at_offset(world.value(value)?, name, world.type_of(ty)?, u64::from(offset));
            new_value(world, child)
        })
    }

    fn value_create_from_address(&self, value: RawHandle, name: &str, address: u64, ty: RawHandle)
        -> Option<RawHandle>
    {
        self.with_world(|world| {
            let created = World::value_at_address(world.value(value)?, name, address, world.type_of(ty)?);
            new_value(world, created)
        })
    }

    fn value_create_from_expression(&self, value: RawHandle, name: &str, expression: &str) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let state = world.value(value)?.clone();
            let created = world.value_from_expression(&state, name, expression)?;
            new_value(world, created)
        })
    }

    fn value_watch(
        &self,
        value: RawHandle,
        _resolve_location: bool,
        read: bool,
        write: bool,
        status: &mut Status,
    ) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let state = world.value(value)?;
            let (ValueLocation::Memory(address), Some(t)) = (&state.location, state.target) else {
                status.set_error("error: can't watch a value that has no address");
                return None;
            };
            let (address, size) = (*address, state.ty.byte_size() as usize);
            let id = report(world.create_watchpoint(t, address, size, read, write), status)?;
            world.alloc(Entity::Watchpoint { target: t, id })
        })
    }

    fn value_is_pointer_type(&self, value: RawHandle) -> bool
    {
        self.world
            .borrow()
            .value(value)
            .is_some_and(|state| matches!(state.ty, SimType::Pointer(_)))
    }

    // Value list

    fn value_list_size(&self, list: RawHandle) -> u32
    {
        self.world().value_list(list).map_or(0, |values| count(values.len()))
    }

    fn value_list_at_index(&self, list: RawHandle, i: u32) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let v = *world.value_list(list)?.get(index(i))?;
            world.alloc(Entity::Value(v))
        })
    }

    fn value_list_first_by_name(&self, list: RawHandle, name: &str) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let v = world
                .value_list(list)?
                .iter()
                .copied()
                .find(|v| world.values[*v].name == name)?;
            world.alloc(Entity::Value(v))
        })
    }

    // Type

    fn type_name(&self, ty: RawHandle, _display: bool) -> Option<String>
    {
        self.world().type_of(ty).map(SimType::name)
    }

    fn type_has_trait(&self, ty: RawHandle, type_trait: TypeTrait) -> bool
    {
        self.world().type_of(ty).is_some_and(|ty| match type_trait {
            TypeTrait::Pointer => matches!(ty, SimType::Pointer(_)),
            TypeTrait::Array => matches!(ty, SimType::Array(..)),
            _ => false,
        })
    }

    fn type_derive(&self, ty: RawHandle, derivation: TypeDerivation) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let ty = world.type_of(ty)?;
            let derived = match (derivation, ty) {
                (TypeDerivation::Pointer, _) => SimType::pointer_to(ty.clone()),
                (TypeDerivation::Pointee, SimType::Pointer(pointee)) => pointee.as_ref().clone(),
                (TypeDerivation::ArrayElement, SimType::Array(element, _)) => element.as_ref().clone(),
                (TypeDerivation::Dereferenced | TypeDerivation::Unqualified | TypeDerivation::Canonical, _) => {
                    ty.clone()
                }
                _ => return None,
            };
            world.alloc(Entity::Type(derived))
        })
    }

    fn type_count(&self, ty: RawHandle, which: TypeCount) -> u64
    {
        self.world().type_of(ty).map_or(0, |ty| match (which, ty) {
            (TypeCount::ByteSize, _) => ty.byte_size(),
            (TypeCount::ArraySize, SimType::Array(_, len)) => *len,
            (TypeCount::Fields, SimType::Struct { fields, .. }) => fields.len() as u64,
            _ => 0,
        })
    }

    fn type_basic_type(&self, ty: RawHandle) -> i32
    {
        self.world
            .borrow()
            .type_of(ty)
            .map_or(crate::types::BasicType::Invalid, SimType::basic_type)
            .raw()
    }

    // Module and symbol context

    fn module_file_path(&self, module: RawHandle, _platform: bool) -> Option<String>
    {
        let world = self.world();
        match world.module_ref(module)? {
            (t, 0) => Some(world.targets[t].program.path.clone()),
            _ => Some(world::LIBC_PATH.to_string()),
        }
    }

    fn module_num_symbols(&self, module: RawHandle) -> u32
    {
        let world = self.world();
        match world.module_ref(module) {
            Some((t, 0)) => count(world.targets[t].program.functions.len()),
            Some(_) => world::LIBC_SYMBOLS,
            None => 0,
        }
    }

    fn symbol_context_module(&self, context: RawHandle) -> Option<RawHandle>
    {
        self.with_world(|world| {
            let (target, function) = world.symbol_context(context)?;
            function?;
            world.alloc(Entity::Module { target, index: 0 })
        })
    }

    fn symbol_context_function_name(&self, context: RawHandle) -> Option<String>
    {
        let world = self.world();
        let (target, function) = world.symbol_context(context)?;
        Some(world.targets[target].program.functions[function?].name.clone())
    }

    // Command interpreter

    fn command_return_object_create(&self) -> Option<RawHandle>
    {
        self.with_world(|world| {
            world.returns.push(ReturnState::default());
            let r = world.returns.len() - 1;
            world.alloc(Entity::ReturnObject(r))
        })
    }

    fn interpreter_handle_command(
        &self,
        interpreter: RawHandle,
        command: &str,
        result: RawHandle,
        _add_to_history: bool,
    ) -> i32
    {
        self.with_world(|world| {
            let (Some(d), Some(r)) = (world.interpreter_index(interpreter), world.return_index(result)) else {
                return 0;
            };
            let (status, outcome) = world.run_command(d, command, VERSION);
            world.returns[r] = outcome;
            status
        })
    }

    fn interpreter_command_exists(&self, interpreter: RawHandle, command: &str) -> bool
    {
        self.world().interpreter_index(interpreter).is_some() && world::known_command(command)
    }

    fn interpreter_alias_exists(&self, interpreter: RawHandle, alias: &str) -> bool
    {
        self.world().interpreter_index(interpreter).is_some() && world::resolve_alias(alias).is_some()
    }

    fn return_object_text(&self, result: RawHandle, text: ReturnText) -> Option<String>
    {
        let world = self.world();
        let r = world.return_index(result)?;
        let text = match text {
            ReturnText::Output => &world.returns[r].output,
            ReturnText::Error => &world.returns[r].error,
        };
        (!text.is_empty()).then(|| text.clone())
    }

    fn return_object_succeeded(&self, result: RawHandle) -> bool
    {
        let world = self.world();
        world.return_index(result).is_some_and(|r| world.returns[r].succeeded)
    }

    fn return_object_clear(&self, result: RawHandle)
    {
        self.with_world(|world| {
            if let Some(r) = world.return_index(result) {
                world.returns[r] = ReturnState::default();
            }
        });
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn engine_with_demo() -> (SimEngine, RawHandle, RawHandle)
    {
        let engine = SimEngine::new().with_program(SimProgram::demo("/bin/demo"));
        engine.initialize();
        let debugger = engine.debugger_create().unwrap();
        let mut status = Status::new();
        let target = engine
            .debugger_create_target(debugger, "/bin/demo", None, None, true, &mut status)
            .unwrap();
        (engine, debugger, target)
    }

    fn settle(engine: &SimEngine, process: RawHandle) -> State
    {
        for _ in 0..16 {
            let state = State::from_raw(engine.process_state(process));
            if state.is_terminal_for_wait() {
                return state;
            }
        }
        State::from_raw(engine.process_state(process))
    }

    #[test]
    fn test_unknown_executable_reports_status()
    {
        let engine = SimEngine::new();
        engine.initialize();
        let debugger = engine.debugger_create().unwrap();
        let mut status = Status::new();
        let target = engine.debugger_create_target(debugger, "/nope", None, None, true, &mut status);
        assert!(target.is_none());
        assert!(status.message().unwrap().contains("/nope"));
    }

    #[test]
    fn test_launch_settles_after_polls()
    {
        let (engine, _, target) = engine_with_demo();
        let mut status = Status::new();
        let process = engine.target_launch(target, &LaunchInfo::default(), &mut status).unwrap();

        assert_eq!(State::from_raw(engine.process_state(process)), State::Launching);
        assert_eq!(State::from_raw(engine.process_state(process)), State::Launching);
        assert_eq!(State::from_raw(engine.process_state(process)), State::Exited);
        assert_eq!(engine.process_exit_status(process), 0);
    }

    #[test]
    fn test_frames_go_stale_on_resume()
    {
        let (engine, _, target) = engine_with_demo();
        engine.target_create_breakpoint(target, &BreakpointSpec::name("compute")).unwrap();
        let info = LaunchInfo::default().flags(crate::types::LaunchFlags::STOP_AT_ENTRY);
        let mut status = Status::new();
        let process = engine.target_launch(target, &info, &mut status).unwrap();
        assert_eq!(settle(&engine, process), State::Stopped);

        assert!(engine.process_control(process, ProcessControl::Continue));
        assert_eq!(settle(&engine, process), State::Stopped);
        let thread = engine.process_selected_thread(process).unwrap();
        let frame = engine.thread_frame_at_index(thread, 0).unwrap();
        assert_eq!(engine.frame_text(frame, FrameText::FunctionName).as_deref(), Some("compute"));
        assert!(engine.is_valid(ObjectKind::Frame, frame));

        assert!(engine.process_control(process, ProcessControl::Continue));
        assert!(!engine.is_valid(ObjectKind::Frame, frame));
    }

    #[test]
    fn test_destroy_tracks_stale_handles()
    {
        let engine = SimEngine::new();
        engine.initialize();
        let debugger = engine.debugger_create().unwrap();
        assert_eq!(engine.stats().live_handles, 1);

        engine.destroy(ObjectKind::Debugger, debugger);
        engine.destroy(ObjectKind::Debugger, debugger);
        let stats = engine.stats();
        assert_eq!(stats.live_handles, 0);
        assert_eq!(stats.destroy_calls, 2);
        assert_eq!(stats.stale_destroys, 1);
    }

    #[test]
    fn test_unknown_command()
    {
        let (engine, debugger, _) = engine_with_demo();
        let interpreter = engine.debugger_command_interpreter(debugger).unwrap();
        let result = engine.command_return_object_create().unwrap();

        assert_eq!(engine.interpreter_handle_command(interpreter, "frobnicate", result, false), 6);
        assert!(!engine.return_object_succeeded(result));
        assert_eq!(
            engine.return_object_text(result, ReturnText::Error).as_deref(),
            Some("error: 'frobnicate' is not a valid command.\n")
        );

        assert_eq!(engine.interpreter_handle_command(interpreter, "version", result, false), 2);
        assert_eq!(
            engine.return_object_text(result, ReturnText::Output).as_deref(),
            Some("lldb version 17.0.6\n")
        );
    }

    #[test]
    fn test_terminated_engine_refuses_handles()
    {
        let (engine, debugger, target) = engine_with_demo();
        assert_eq!(engine.stats().uninitialized_calls, 0);

        engine.terminate();
        assert!(!engine.is_valid(ObjectKind::Target, target));
        engine.destroy(ObjectKind::Debugger, debugger);

        let stats = engine.stats();
        assert_eq!(stats.destroy_calls, 0);
        assert_eq!(stats.uninitialized_calls, 1);
        assert_eq!(stats.live_handles, 2);
    }
}
