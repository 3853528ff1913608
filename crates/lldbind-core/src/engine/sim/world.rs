//! Mutable state of the simulated engine.
//!
//! [`World`] owns every simulated object and the handle table that maps raw
//! handles to them. Execution is driven by the program trace: a continue scans
//! forward from the process cursor and the outcome (a breakpoint stop or the
//! end of the run) is applied once the configured number of state polls has
//! passed.

use std::collections::HashMap;

use regex::Regex;

use super::program::{SimEnding, SimProgram, SimType, SimVariable, FUNCTION_STRIDE, TEXT_BASE};
use crate::engine::{BreakpointSpec, ProcessControl, StepKind, VariableOptions};
use crate::handle::{ObjectKind, RawHandle};
use crate::launch::LaunchInfo;
use crate::types::{LaunchFlags, MemoryRegionInfo, State, StopReason, ValueType};

pub(super) const STACK_BASE: u64 = 0x7fff_fffd_e000;
pub(super) const STACK_SIZE: u64 = 0x2_1000;
pub(super) const STACK_TOP: u64 = STACK_BASE + STACK_SIZE;
pub(super) const HEAP_BASE: u64 = 0x60_2000;
pub(super) const HEAP_SIZE: u64 = 0x1000;
pub(super) const INVALID_ADDRESS: u64 = u64::MAX;
pub(super) const HARDWARE_WATCHPOINTS: u32 = 4;
pub(super) const LIBC_PATH: &str = "/usr/lib/x86_64-linux-gnu/libc.so.6";
pub(super) const LIBC_SYMBOLS: u32 = 2970;

const ALLOC_BASE: u64 = 0x1000_0000;
const PAGE_SIZE: u64 = 0x1000;
const FRAME_SIZE: u64 = 0x100;
const FIRST_PID: u64 = 4242;
const SIGKILL: i32 = 9;
const SIGSTOP: i32 = 19;
const PROLOGUE: [u8; 4] = [0x55, 0x48, 0x89, 0xe5];

/// Counters exposed through [`SimEngine::stats`](super::SimEngine::stats)
#[derive(Debug, Clone, Default)]
pub struct SimStats
{
    /// Handles handed out and not yet destroyed.
    pub live_handles: usize,
    pub destroy_calls: usize,
    /// Destroy calls naming a handle that was already destroyed.
    pub stale_destroys: usize,
    pub initialize_calls: usize,
    pub terminate_calls: usize,
    /// Entry points reached while the engine was not initialized.
    pub uninitialized_calls: usize,
    /// The most recent launch request.
    pub last_launch: Option<LaunchInfo>,
}

#[derive(Debug, Clone)]
pub(super) enum Entity
{
    Debugger(usize),
    Target(usize),
    Process(usize),
    /// Each simulated process has one thread, keyed by the process.
    Thread(usize),
    Frame
    {
        process: usize,
        stop_id: u32,
        index: usize,
    },
    Breakpoint
    {
        target: usize, id: i32
    },
    Location
    {
        target: usize,
        breakpoint: i32,
        id: i32,
    },
    Watchpoint
    {
        target: usize, id: i32
    },
    Value(usize),
    ValueList(Vec<usize>),
    Type(SimType),
    Module
    {
        target: usize, index: usize
    },
    SymbolContext
    {
        target: usize,
        function: Option<usize>,
    },
    Interpreter(usize),
    ReturnObject(usize),
}

impl Entity
{
    fn kind(&self) -> ObjectKind
    {
        match self {
            Entity::Debugger(_) => ObjectKind::Debugger,
            Entity::Target(_) => ObjectKind::Target,
            Entity::Process(_) => ObjectKind::Process,
            Entity::Thread(_) => ObjectKind::Thread,
            Entity::Frame { .. } => ObjectKind::Frame,
            Entity::Breakpoint { .. } => ObjectKind::Breakpoint,
            Entity::Location { .. } => ObjectKind::BreakpointLocation,
            Entity::Watchpoint { .. } => ObjectKind::Watchpoint,
            Entity::Value(_) => ObjectKind::Value,
            Entity::ValueList(_) => ObjectKind::ValueList,
            Entity::Type(_) => ObjectKind::Type,
            Entity::Module { .. } => ObjectKind::Module,
            Entity::SymbolContext { .. } => ObjectKind::SymbolContext,
            Entity::Interpreter(_) => ObjectKind::CommandInterpreter,
            Entity::ReturnObject(_) => ObjectKind::CommandReturnObject,
        }
    }
}

/// Enabled flag, counts and condition shared by all stop points
#[derive(Debug, Clone)]
pub(super) struct StopFields
{
    pub enabled: bool,
    pub hit_count: u32,
    pub ignore_count: u32,
    pub condition: Option<String>,
}

impl StopFields
{
    fn new() -> Self
    {
        Self {
            enabled: true,
            hit_count: 0,
            ignore_count: 0,
            condition: None,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct SimLocation
{
    pub id: i32,
    pub function: usize,
    pub line: u32,
    pub address: u64,
    pub common: StopFields,
}

#[derive(Debug, Clone)]
pub(super) struct SimBreakpoint
{
    pub id: i32,
    pub spec: BreakpointSpec,
    pub locations: Vec<SimLocation>,
    pub common: StopFields,
    pub one_shot: bool,
    pub auto_continue: bool,
    pub thread_id: u64,
    pub thread_name: Option<String>,
    pub thread_index: u32,
}

#[derive(Debug, Clone)]
pub(super) struct SimWatchpoint
{
    pub id: i32,
    pub address: u64,
    pub size: usize,
    pub read: bool,
    pub write: bool,
    pub common: StopFields,
}

pub(super) struct DebuggerState
{
    pub alive: bool,
    pub targets: Vec<usize>,
    pub selected: Option<usize>,
    pub is_async: bool,
}

pub(super) struct TargetState
{
    pub alive: bool,
    pub program: SimProgram,
    pub dependents: bool,
    pub breakpoints: Vec<SimBreakpoint>,
    pub next_breakpoint: i32,
    pub watchpoints: Vec<SimWatchpoint>,
    pub next_watchpoint: i32,
    pub process: Option<usize>,
}

impl TargetState
{
    pub fn breakpoint_mut(&mut self, id: i32) -> Option<&mut SimBreakpoint>
    {
        self.breakpoints.iter_mut().find(|breakpoint| breakpoint.id == id)
    }

    pub fn watchpoint_mut(&mut self, id: i32) -> Option<&mut SimWatchpoint>
    {
        self.watchpoints.iter_mut().find(|watchpoint| watchpoint.id == id)
    }

    pub fn num_modules(&self) -> usize
    {
        if self.dependents { 2 } else { 1 }
    }
}

#[derive(Debug, Clone)]
pub(super) struct StopInfo
{
    pub reason: StopReason,
    pub data: Vec<u64>,
    pub description: Option<String>,
}

impl StopInfo
{
    fn none() -> Self
    {
        Self {
            reason: StopReason::None,
            data: Vec::new(),
            description: None,
        }
    }

    fn signal(signal: i32) -> Self
    {
        let name = match signal {
            SIGSTOP => "SIGSTOP".to_string(),
            SIGKILL => "SIGKILL".to_string(),
            other => format!("signal {other}"),
        };
        Self {
            reason: StopReason::Signal,
            data: vec![u64::from(signal.unsigned_abs())],
            description: Some(format!("signal {name}")),
        }
    }

    fn plan(description: &str) -> Self
    {
        Self {
            reason: StopReason::PlanComplete,
            data: Vec::new(),
            description: Some(description.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct FrameState
{
    pub function: usize,
    pub line: u32,
    pub pc: u64,
}

/// The state a process settles into once its transition completes
#[derive(Debug, Clone)]
pub(super) struct Outcome
{
    state: State,
    stop: StopInfo,
    frames: Vec<FrameState>,
    /// A new activation: initialize the locals of every frame.
    fresh: bool,
    exit_status: i32,
    exit_description: Option<String>,
}

impl Outcome
{
    fn stopped(stop: StopInfo, frames: Vec<FrameState>, fresh: bool) -> Self
    {
        Self {
            state: State::Stopped,
            stop,
            frames,
            fresh,
            exit_status: -1,
            exit_description: None,
        }
    }

    fn exited(status: i32, description: Option<String>) -> Self
    {
        Self {
            state: State::Exited,
            stop: StopInfo::none(),
            frames: Vec::new(),
            fresh: false,
            exit_status: status,
            exit_description: description,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct Region
{
    pub base: u64,
    pub data: Vec<u8>,
    pub readable: bool,
    pub writable: bool,
    pub executable: bool,
    pub name: Option<String>,
}

impl Region
{
    fn end(&self) -> u64
    {
        self.base + self.data.len() as u64
    }

    fn contains(&self, address: u64) -> bool
    {
        self.base <= address && address < self.end()
    }
}

pub(super) struct ProcessState
{
    pub target: usize,
    pub pid: u64,
    pub unique_id: u32,
    pub state: State,
    pending: Option<Outcome>,
    polls_left: u32,
    hang: bool,
    pub stop_id: u32,
    pub stop: StopInfo,
    pub frames: Vec<FrameState>,
    pub selected_frame: usize,
    cursor: usize,
    pub exit_status: i32,
    pub exit_description: Option<String>,
    regions: Vec<Region>,
    next_alloc: u64,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdin: Vec<u8>,
    pub suspended: bool,
    pub detached: bool,
    output_released: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ValueLocation
{
    Memory(u64),
    Bytes(Vec<u8>),
    Unavailable,
}

#[derive(Debug, Clone)]
pub(super) struct ValueState
{
    pub name: String,
    pub ty: SimType,
    pub location: ValueLocation,
    pub value_type: ValueType,
    /// `(process, stop id)` of the frame the value lives in.
    pub scope: Option<(usize, u32)>,
    pub process: Option<usize>,
    pub target: Option<usize>,
    pub error: Option<String>,
    pub path: String,
}

impl ValueState
{
    fn failure(message: String, context: &EvalContext) -> Self
    {
        Self {
            name: String::new(),
            ty: SimType::Void,
            location: ValueLocation::Unavailable,
            value_type: ValueType::Invalid,
            scope: None,
            process: context.process,
            target: Some(context.target),
            error: Some(message),
            path: String::new(),
        }
    }

    /// An error value in the same scope as `self`.
    pub fn with_error(&self, message: String) -> Self
    {
        Self {
            ty: SimType::Void,
            location: ValueLocation::Unavailable,
            value_type: ValueType::Invalid,
            error: Some(message),
            ..self.clone()
        }
    }

    fn context(&self) -> Option<EvalContext>
    {
        Some(EvalContext {
            target: self.target?,
            process: self.process,
            frame: self.process.map(|_| 0),
        })
    }
}

/// Where an expression is evaluated
#[derive(Debug, Clone, Copy)]
pub(super) struct EvalContext
{
    pub target: usize,
    pub process: Option<usize>,
    pub frame: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub(super) struct ReturnState
{
    pub output: String,
    pub error: String,
    pub succeeded: bool,
}

struct Hit
{
    breakpoint: i32,
    location: i32,
    line: u32,
    address: u64,
    one_shot: bool,
}

/// All simulated objects
pub(super) struct World
{
    handles: HashMap<usize, Entity>,
    next_handle: usize,
    pub stats: SimStats,
    pub programs: Vec<SimProgram>,
    pub attachable: Vec<(u64, String)>,
    pub debuggers: Vec<DebuggerState>,
    pub targets: Vec<TargetState>,
    pub processes: Vec<ProcessState>,
    pub values: Vec<ValueState>,
    pub returns: Vec<ReturnState>,
    next_pid: u64,
    next_result: u32,
}

impl World
{
    pub fn new() -> Self
    {
        Self {
            handles: HashMap::new(),
            next_handle: 0x1000,
            stats: SimStats::default(),
            programs: Vec::new(),
            attachable: Vec::new(),
            debuggers: Vec::new(),
            targets: Vec::new(),
            processes: Vec::new(),
            values: Vec::new(),
            returns: Vec::new(),
            next_pid: FIRST_PID,
            next_result: 0,
        }
    }

    // Handle table

    pub fn alloc(&mut self, entity: Entity) -> Option<RawHandle>
    {
        self.next_handle += 0x10;
        let raw = RawHandle::new(self.next_handle)?;
        self.handles.insert(raw.get(), entity);
        Some(raw)
    }

    pub fn live_handles(&self) -> usize
    {
        self.handles.len()
    }

    pub fn destroy(&mut self, kind: ObjectKind, raw: RawHandle)
    {
        self.stats.destroy_calls += 1;
        match self.handles.get(&raw.get()) {
            Some(entity) if entity.kind() == kind => {
                self.handles.remove(&raw.get());
            }
            _ => self.stats.stale_destroys += 1,
        }
    }

    pub fn entity(&self, kind: ObjectKind, raw: RawHandle) -> Option<&Entity>
    {
        self.handles.get(&raw.get()).filter(|entity| entity.kind() == kind)
    }

    pub fn is_valid(&self, kind: ObjectKind, raw: RawHandle) -> bool
    {
        self.entity(kind, raw).is_some_and(|entity| self.is_alive(entity))
    }

    fn is_alive(&self, entity: &Entity) -> bool
    {
        match entity {
            Entity::Debugger(d) | Entity::Interpreter(d) => self.debuggers[*d].alive,
            Entity::Target(t) | Entity::Module { target: t, .. } => self.targets[*t].alive,
            Entity::Process(p) => self.process_attached(*p),
            Entity::Thread(p) => self.process_is_live(*p),
            Entity::Frame { process, stop_id, index } => {
                let state = &self.processes[*process];
                self.process_attached(*process)
                    && matches!(state.state, State::Stopped | State::Crashed)
                    && state.stop_id == *stop_id
                    && *index < state.frames.len()
            }
            Entity::Breakpoint { target, id } => {
                self.targets[*target].alive && self.targets[*target].breakpoints.iter().any(|bp| bp.id == *id)
            }
            Entity::Location { target, breakpoint, id } => {
                self.targets[*target].alive
                    && self.targets[*target]
                        .breakpoints
                        .iter()
                        .any(|bp| bp.id == *breakpoint && bp.locations.iter().any(|location| location.id == *id))
            }
            Entity::Watchpoint { target, id } => {
                self.targets[*target].alive && self.targets[*target].watchpoints.iter().any(|wp| wp.id == *id)
            }
            Entity::Value(v) => match self.values[*v].scope {
                Some((process, stop_id)) => {
                    let state = &self.processes[process];
                    self.process_attached(process)
                        && matches!(state.state, State::Stopped | State::Crashed)
                        && state.stop_id == stop_id
                }
                None => true,
            },
            Entity::ValueList(_) | Entity::Type(_) | Entity::SymbolContext { .. } | Entity::ReturnObject(_) => true,
        }
    }

    fn process_attached(&self, p: usize) -> bool
    {
        let process = &self.processes[p];
        !process.detached && self.targets[process.target].alive
    }

    pub fn process_is_live(&self, p: usize) -> bool
    {
        self.process_attached(p) && !matches!(self.processes[p].state, State::Exited | State::Detached | State::Invalid)
    }

    // Typed handle lookups

    pub fn debugger_index(&self, raw: RawHandle) -> Option<usize>
    {
        match self.entity(ObjectKind::Debugger, raw)? {
            Entity::Debugger(d) => Some(*d),
            _ => None,
        }
    }

    pub fn target_index(&self, raw: RawHandle) -> Option<usize>
    {
        match self.entity(ObjectKind::Target, raw)? {
            Entity::Target(t) => Some(*t),
            _ => None,
        }
    }

    pub fn process_index(&self, raw: RawHandle) -> Option<usize>
    {
        match self.entity(ObjectKind::Process, raw)? {
            Entity::Process(p) => Some(*p),
            _ => None,
        }
    }

    pub fn thread_process(&self, raw: RawHandle) -> Option<usize>
    {
        match self.entity(ObjectKind::Thread, raw)? {
            Entity::Thread(p) => Some(*p),
            _ => None,
        }
    }

    /// `(process, frame index)` of a frame handle.
    pub fn frame_ref(&self, raw: RawHandle) -> Option<(usize, usize)>
    {
        match self.entity(ObjectKind::Frame, raw)? {
            Entity::Frame { process, index, .. } => Some((*process, *index)),
            _ => None,
        }
    }

    pub fn frame_state(&self, raw: RawHandle) -> Option<(usize, usize, FrameState)>
    {
        let (p, index) = self.frame_ref(raw)?;
        let frame = *self.processes[p].frames.get(index)?;
        Some((p, index, frame))
    }

    pub fn breakpoint_ref(&self, raw: RawHandle) -> Option<(usize, i32)>
    {
        match self.entity(ObjectKind::Breakpoint, raw)? {
            Entity::Breakpoint { target, id } => Some((*target, *id)),
            _ => None,
        }
    }

    pub fn breakpoint(&self, raw: RawHandle) -> Option<&SimBreakpoint>
    {
        let (t, id) = self.breakpoint_ref(raw)?;
        self.targets[t].breakpoints.iter().find(|bp| bp.id == id)
    }

    pub fn breakpoint_mut(&mut self, raw: RawHandle) -> Option<&mut SimBreakpoint>
    {
        let (t, id) = self.breakpoint_ref(raw)?;
        self.targets[t].breakpoint_mut(id)
    }

    pub fn location_ref(&self, raw: RawHandle) -> Option<(usize, i32, i32)>
    {
        match self.entity(ObjectKind::BreakpointLocation, raw)? {
            Entity::Location { target, breakpoint, id } => Some((*target, *breakpoint, *id)),
            _ => None,
        }
    }

    pub fn location(&self, raw: RawHandle) -> Option<&SimLocation>
    {
        let (t, breakpoint, id) = self.location_ref(raw)?;
        self.targets[t]
            .breakpoints
            .iter()
            .find(|bp| bp.id == breakpoint)?
            .locations
            .iter()
            .find(|location| location.id == id)
    }

    pub fn watchpoint(&self, raw: RawHandle) -> Option<&SimWatchpoint>
    {
        match self.entity(ObjectKind::Watchpoint, raw)? {
            Entity::Watchpoint { target, id } => self.targets[*target].watchpoints.iter().find(|wp| wp.id == *id),
            _ => None,
        }
    }

    /// Stop point fields of a breakpoint, location or watchpoint handle.
    pub fn stop_fields_mut(&mut self, kind: ObjectKind, raw: RawHandle) -> Option<&mut StopFields>
    {
        match self.entity(kind, raw)?.clone() {
            Entity::Breakpoint { target, id } => Some(&mut self.targets[target].breakpoint_mut(id)?.common),
            Entity::Location { target, breakpoint, id } => Some(
                &mut self.targets[target]
                    .breakpoint_mut(breakpoint)?
                    .locations
                    .iter_mut()
                    .find(|location| location.id == id)?
                    .common,
            ),
            Entity::Watchpoint { target, id } => Some(&mut self.targets[target].watchpoint_mut(id)?.common),
            _ => None,
        }
    }

    pub fn stop_point_id(&self, kind: ObjectKind, raw: RawHandle) -> Option<i32>
    {
        match self.entity(kind, raw)? {
            Entity::Breakpoint { id, .. } | Entity::Location { id, .. } | Entity::Watchpoint { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn value_index(&self, raw: RawHandle) -> Option<usize>
    {
        match self.entity(ObjectKind::Value, raw)? {
            Entity::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn value(&self, raw: RawHandle) -> Option<&ValueState>
    {
        self.value_index(raw).map(|v| &self.values[v])
    }

    pub fn value_list(&self, raw: RawHandle) -> Option<&[usize]>
    {
        match self.entity(ObjectKind::ValueList, raw)? {
            Entity::ValueList(values) => Some(values),
            _ => None,
        }
    }

    pub fn type_of(&self, raw: RawHandle) -> Option<&SimType>
    {
        match self.entity(ObjectKind::Type, raw)? {
            Entity::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn module_ref(&self, raw: RawHandle) -> Option<(usize, usize)>
    {
        match self.entity(ObjectKind::Module, raw)? {
            Entity::Module { target, index } => Some((*target, *index)),
            _ => None,
        }
    }

    pub fn symbol_context(&self, raw: RawHandle) -> Option<(usize, Option<usize>)>
    {
        match self.entity(ObjectKind::SymbolContext, raw)? {
            Entity::SymbolContext { target, function } => Some((*target, *function)),
            _ => None,
        }
    }

    pub fn interpreter_index(&self, raw: RawHandle) -> Option<usize>
    {
        match self.entity(ObjectKind::CommandInterpreter, raw)? {
            Entity::Interpreter(d) => Some(*d),
            _ => None,
        }
    }

    pub fn return_index(&self, raw: RawHandle) -> Option<usize>
    {
        match self.entity(ObjectKind::CommandReturnObject, raw)? {
            Entity::ReturnObject(r) => Some(*r),
            _ => None,
        }
    }

    pub fn program_of(&self, p: usize) -> &SimProgram
    {
        &self.targets[self.processes[p].target].program
    }

    // Debuggers and targets

    pub fn create_debugger(&mut self) -> usize
    {
        self.debuggers.push(DebuggerState {
            alive: true,
            targets: Vec::new(),
            selected: None,
            is_async: false,
        });
        self.debuggers.len() - 1
    }

    pub fn create_target(&mut self, d: usize, filename: &str, add_dependent_modules: bool) -> Result<usize, String>
    {
        let program = self
            .programs
            .iter()
            .find(|program| program.path == filename)
            .cloned()
            .ok_or_else(|| format!("error: unable to find executable for '{filename}'"))?;

        self.targets.push(TargetState {
            alive: true,
            program,
            dependents: add_dependent_modules,
            breakpoints: Vec::new(),
            next_breakpoint: 1,
            watchpoints: Vec::new(),
            next_watchpoint: 1,
            process: None,
        });
        let t = self.targets.len() - 1;
        self.debuggers[d].targets.push(t);
        self.debuggers[d].selected = Some(t);
        Ok(t)
    }

    pub fn delete_target(&mut self, d: usize, t: usize) -> bool
    {
        let debugger = &mut self.debuggers[d];
        let Some(position) = debugger.targets.iter().position(|known| *known == t) else {
            return false;
        };
        debugger.targets.remove(position);
        if debugger.selected == Some(t) {
            debugger.selected = debugger.targets.first().copied();
        }
        if let Some(p) = self.targets[t].process {
            if self.process_is_live(p) {
                self.apply(p, Outcome::exited(SIGKILL, Some("SIGKILL".to_string())));
            }
        }
        self.targets[t].alive = false;
        true
    }

    // Breakpoints

    pub fn create_breakpoint(&mut self, t: usize, spec: &BreakpointSpec) -> i32
    {
        let locations = resolve_locations(&self.targets[t].program, spec);
        let target = &mut self.targets[t];
        let id = target.next_breakpoint;
        target.next_breakpoint += 1;
        target.breakpoints.push(SimBreakpoint {
            id,
            spec: spec.clone(),
            locations,
            common: StopFields::new(),
            one_shot: false,
            auto_continue: false,
            thread_id: 0,
            thread_name: None,
            thread_index: 0,
        });
        id
    }

    pub fn create_watchpoint(&mut self, t: usize, address: u64, size: usize, read: bool, write: bool)
        -> Result<i32, String>
    {
        let p = self.targets[t]
            .process
            .filter(|p| self.process_is_live(*p))
            .ok_or_else(|| "error: invalid process".to_string())?;
        if !matches!(size, 1 | 2 | 4 | 8) {
            return Err(format!("error: invalid watchpoint size: {size}"));
        }
        if !read && !write {
            return Err("error: watchpoint must watch reads, writes or both".to_string());
        }
        if !self.processes[p].regions.iter().any(|region| region.contains(address)) {
            return Err(format!("error: invalid watch address 0x{address:x}"));
        }
        let target = &mut self.targets[t];
        if target.watchpoints.len() >= HARDWARE_WATCHPOINTS as usize {
            return Err("error: no more hardware watchpoints available".to_string());
        }
        let id = target.next_watchpoint;
        target.next_watchpoint += 1;
        target.watchpoints.push(SimWatchpoint {
            id,
            address,
            size,
            read,
            write,
            common: StopFields::new(),
        });
        Ok(id)
    }

    // Process lifecycle

    fn create_process(&mut self, t: usize, pid: u64, state: State) -> usize
    {
        let program = &self.targets[t].program;
        let regions = vec![
            Region {
                base: TEXT_BASE,
                data: text_image(program),
                readable: true,
                writable: false,
                executable: true,
                name: Some(program.path.clone()),
            },
            Region {
                base: HEAP_BASE,
                data: vec![0; HEAP_SIZE as usize],
                readable: true,
                writable: true,
                executable: false,
                name: Some("[heap]".to_string()),
            },
            Region {
                base: STACK_BASE,
                data: vec![0; STACK_SIZE as usize],
                readable: true,
                writable: true,
                executable: false,
                name: Some("[stack]".to_string()),
            },
        ];
        let unique_id = u32::try_from(self.processes.len() + 1).unwrap_or(u32::MAX);
        self.processes.push(ProcessState {
            target: t,
            pid,
            unique_id,
            state,
            pending: None,
            polls_left: 0,
            hang: false,
            stop_id: 0,
            stop: StopInfo::none(),
            frames: Vec::new(),
            selected_frame: 0,
            cursor: 0,
            exit_status: -1,
            exit_description: None,
            regions,
            next_alloc: ALLOC_BASE,
            stdout: Vec::new(),
            stderr: Vec::new(),
            stdin: Vec::new(),
            suspended: false,
            detached: false,
            output_released: false,
        });
        let p = self.processes.len() - 1;
        self.targets[t].process = Some(p);
        p
    }

    fn ensure_can_start(&self, t: usize) -> Result<(), String>
    {
        match self.targets[t].process {
            Some(p) if self.process_is_live(p) => Err("error: a process is already being debugged".to_string()),
            _ => Ok(()),
        }
    }

    pub fn launch(&mut self, t: usize, info: &LaunchInfo) -> Result<usize, String>
    {
        if let Some(message) = self.targets[t].program.launch_error.clone() {
            return Err(message);
        }
        self.ensure_can_start(t)?;
        self.stats.last_launch = Some(info.clone());

        let pid = self.allocate_pid();
        let p = self.create_process(t, pid, State::Launching);
        self.processes[p].hang = self.targets[t].program.hang;
        let outcome = if info.launch_flags().contains(LaunchFlags::STOP_AT_ENTRY) {
            let stop = StopInfo::signal(SIGSTOP);
            Outcome::stopped(stop, vec![FrameState { function: 0, line: 0, pc: TEXT_BASE }], true)
        } else {
            self.run_to_next_stop(p)
        };
        self.schedule(p, State::Launching, outcome);
        Ok(p)
    }

    pub fn attach(&mut self, t: usize, pid: u64) -> Result<usize, String>
    {
        if !self.attachable.iter().any(|(known, _)| *known == pid) {
            return Err(format!("error: attach failed: no such process (pid {pid})"));
        }
        self.ensure_can_start(t)?;

        let p = self.create_process(t, pid, State::Attaching);
        let program = &self.targets[t].program;
        let main = program.function_index("main").unwrap_or(0);
        let line = program.functions[main].line + 1;
        let frames = stack_frames(program, main, line, SimProgram::function_address(main) + 0x10);
        self.processes[p].cursor = program
            .trace
            .iter()
            .position(|name| name == "main")
            .map_or(0, |position| position + 1);
        self.schedule(p, State::Attaching, Outcome::stopped(StopInfo::signal(SIGSTOP), frames, true));
        Ok(p)
    }

    pub fn attach_by_name(&mut self, t: usize, name: &str, wait_for: bool) -> Result<usize, String>
    {
        if let Some((pid, _)) = self.attachable.iter().find(|(_, known)| known == name) {
            return self.attach(t, *pid);
        }
        if !wait_for {
            return Err(format!("error: attach failed: no process named '{name}'"));
        }
        self.ensure_can_start(t)?;
        // Nothing to attach to yet: the process stays in `Attaching`.
        let p = self.create_process(t, 0, State::Attaching);
        self.processes[p].hang = true;
        Ok(p)
    }

    fn allocate_pid(&mut self) -> u64
    {
        let pid = self.next_pid;
        self.next_pid += 1;
        pid
    }

    fn schedule(&mut self, p: usize, transitional: State, outcome: Outcome)
    {
        let polls = self.program_of(p).settle_polls;
        let process = &mut self.processes[p];
        process.state = transitional;
        if polls == 0 && !process.hang {
            self.apply(p, outcome);
        } else {
            process.pending = Some(outcome);
            process.polls_left = polls;
        }
    }

    /// Report the process state, completing an in-flight transition once its
    /// polls have elapsed.
    pub fn poll_state(&mut self, p: usize) -> State
    {
        let ready = {
            let process = &mut self.processes[p];
            if process.hang || process.pending.is_none() {
                None
            } else if process.polls_left == 0 {
                process.pending.take()
            } else {
                process.polls_left -= 1;
                None
            }
        };
        if let Some(outcome) = ready {
            self.apply(p, outcome);
        }
        self.processes[p].state
    }

    fn apply(&mut self, p: usize, outcome: Outcome)
    {
        let finished = matches!(outcome.state, State::Exited | State::Crashed);
        let fresh = outcome.fresh;
        let (stdout, stderr) = {
            let program = self.program_of(p);
            (program.stdout.clone().into_bytes(), program.stderr.clone().into_bytes())
        };

        let process = &mut self.processes[p];
        process.pending = None;
        process.hang = false;
        process.state = outcome.state;
        process.stop = outcome.stop;
        process.frames = outcome.frames;
        process.selected_frame = 0;
        process.stop_id += 1;
        process.exit_status = outcome.exit_status;
        process.exit_description = outcome.exit_description;
        if finished && !process.output_released {
            process.stdout.extend(stdout);
            process.stderr.extend(stderr);
            process.output_released = true;
        }
        if fresh {
            self.write_locals(p);
        }
    }

    /// Scan the trace from the cursor for the next breakpoint hit.
    fn run_to_next_stop(&mut self, p: usize) -> Outcome
    {
        let t = self.processes[p].target;
        let tid = self.processes[p].pid;
        let start = self.processes[p].cursor;
        let trace_len = self.targets[t].program.trace.len();

        for position in start..trace_len {
            let program = &self.targets[t].program;
            let Some(function) = program.function_index(&program.trace[position]) else {
                continue;
            };
            if let Some(hit) = self.hit_breakpoint(t, function, tid) {
                self.processes[p].cursor = position + 1;
                let stop = StopInfo {
                    reason: StopReason::Breakpoint,
                    data: vec![u64::from(hit.breakpoint.unsigned_abs()), u64::from(hit.location.unsigned_abs())],
                    description: Some(format!("breakpoint {}.{}", hit.breakpoint, hit.location)),
                };
                if hit.one_shot {
                    self.targets[t].breakpoints.retain(|bp| bp.id != hit.breakpoint);
                }
                let frames = stack_frames(&self.targets[t].program, function, hit.line, hit.address);
                return Outcome::stopped(stop, frames, true);
            }
        }

        self.processes[p].cursor = trace_len;
        let program = &self.targets[t].program;
        match program.ending {
            SimEnding::Exit(code) => Outcome::exited(code, None),
            SimEnding::Crash => {
                let function = program
                    .trace
                    .last()
                    .and_then(|name| program.function_index(name))
                    .or_else(|| program.function_index("main"))
                    .unwrap_or(0);
                let line = program.functions[function].line;
                let stop = StopInfo {
                    reason: StopReason::Exception,
                    data: vec![1, 0],
                    description: Some("EXC_BAD_ACCESS (code=1, address=0x0)".to_string()),
                };
                Outcome {
                    state: State::Crashed,
                    stop,
                    frames: stack_frames(program, function, line, SimProgram::function_address(function) + 0x10),
                    fresh: false,
                    exit_status: -1,
                    exit_description: None,
                }
            }
        }
    }

    fn hit_breakpoint(&mut self, t: usize, function: usize, tid: u64) -> Option<Hit>
    {
        let variables = self.targets[t].program.functions[function].variables.clone();
        for breakpoint in &mut self.targets[t].breakpoints {
            if !breakpoint.common.enabled || (breakpoint.thread_id != 0 && breakpoint.thread_id != tid) {
                continue;
            }
            for location in &mut breakpoint.locations {
                if location.function != function || !location.common.enabled {
                    continue;
                }
                let condition = location
                    .common
                    .condition
                    .as_deref()
                    .or(breakpoint.common.condition.as_deref());
                if condition.is_some_and(|condition| !condition_holds(condition, &variables)) {
                    continue;
                }
                breakpoint.common.hit_count += 1;
                location.common.hit_count += 1;
                if location.common.ignore_count > 0 {
                    location.common.ignore_count -= 1;
                    continue;
                }
                if breakpoint.common.ignore_count > 0 {
                    breakpoint.common.ignore_count -= 1;
                    continue;
                }
                if breakpoint.auto_continue {
                    continue;
                }
                return Some(Hit {
                    breakpoint: breakpoint.id,
                    location: location.id,
                    line: location.line,
                    address: location.address,
                    one_shot: breakpoint.one_shot,
                });
            }
        }
        None
    }

    pub fn control(&mut self, p: usize, control: ProcessControl) -> bool
    {
        let state = self.processes[p].state;
        match control {
            ProcessControl::Continue => {
                if state != State::Stopped {
                    return false;
                }
                let outcome = self.run_to_next_stop(p);
                self.schedule(p, State::Running, outcome);
                true
            }
            ProcessControl::Stop | ProcessControl::SendAsyncInterrupt => self.interrupt(p),
            ProcessControl::Kill | ProcessControl::Destroy => {
                if matches!(state, State::Exited | State::Detached) {
                    return false;
                }
                self.apply(p, Outcome::exited(SIGKILL, Some("SIGKILL".to_string())));
                true
            }
            ProcessControl::Detach => {
                if state == State::Exited {
                    return false;
                }
                let process = &mut self.processes[p];
                process.pending = None;
                process.state = State::Detached;
                process.detached = true;
                true
            }
        }
    }

    fn interrupt(&mut self, p: usize) -> bool
    {
        match self.processes[p].state {
            State::Stopped => true,
            State::Launching | State::Attaching | State::Running | State::Stepping => {
                let frames = if self.processes[p].frames.is_empty() {
                    let program = self.program_of(p);
                    let main = program.function_index("main").unwrap_or(0);
                    stack_frames(program, main, program.functions[main].line, SimProgram::function_address(main))
                } else {
                    self.processes[p].frames.clone()
                };
                self.apply(p, Outcome::stopped(StopInfo::signal(SIGSTOP), frames, false));
                true
            }
            _ => false,
        }
    }

    pub fn signal(&mut self, p: usize, signal: i32) -> bool
    {
        if !self.process_is_live(p) {
            return false;
        }
        match signal {
            SIGKILL => self.control(p, ProcessControl::Kill),
            SIGSTOP => self.interrupt(p),
            _ => true,
        }
    }

    // Threads

    pub fn step(&mut self, p: usize, kind: StepKind) -> bool
    {
        let process = &self.processes[p];
        if process.state != State::Stopped || process.frames.is_empty() || process.suspended {
            return false;
        }
        let mut frames = process.frames.clone();
        let program = self.program_of(p);

        let description = match kind {
            StepKind::Out => {
                frames.remove(0);
                "step out"
            }
            StepKind::Instruction { over_calls } => {
                frames[0].pc += 4;
                if over_calls {
                    "instruction step over"
                } else {
                    "instruction step into"
                }
            }
            StepKind::Over | StepKind::Into => {
                let function = &program.functions[frames[0].function];
                if function.file.is_none() || frames[0].line >= function.end_line {
                    frames.remove(0);
                } else {
                    frames[0].line += 1;
                    frames[0].pc += 4;
                }
                if kind == StepKind::Over { "step over" } else { "step in" }
            }
        };

        if frames.is_empty() {
            let outcome = self.run_to_next_stop(p);
            self.apply(p, outcome);
            return true;
        }
        if matches!(kind, StepKind::Out | StepKind::Over | StepKind::Into) && frames.len() < self.processes[p].frames.len()
        {
            // Returned into the caller: resume after the call site.
            frames[0].line += 1;
            frames[0].pc += 4;
        }
        self.apply(p, Outcome::stopped(StopInfo::plan(description), frames, false));
        true
    }

    pub fn run_to_address(&mut self, p: usize, address: u64) -> bool
    {
        let process = &self.processes[p];
        if process.state != State::Stopped || process.frames.is_empty() {
            return false;
        }
        let program = self.program_of(p);
        let Some(function) = program.function_at(address) else {
            return false;
        };
        let mut frames = process.frames.clone();
        frames[0] = FrameState {
            function,
            line: program.functions[function].line,
            pc: address,
        };
        self.apply(p, Outcome::stopped(StopInfo::plan("run to address"), frames, false));
        true
    }

    // Memory

    pub fn read_memory(&self, p: usize, address: u64, buf: &mut [u8]) -> Result<usize, String>
    {
        let region = self.processes[p]
            .regions
            .iter()
            .find(|region| region.contains(address) && region.readable)
            .ok_or_else(|| format!("error: memory read failed for 0x{address:x}"))?;
        let offset = (address - region.base) as usize;
        let count = buf.len().min(region.data.len() - offset);
        buf[..count].copy_from_slice(&region.data[offset..offset + count]);
        Ok(count)
    }

    pub fn write_memory(&mut self, p: usize, address: u64, data: &[u8]) -> Result<usize, String>
    {
        let region = self.processes[p]
            .regions
            .iter_mut()
            .find(|region| region.contains(address) && region.writable)
            .ok_or_else(|| format!("error: memory write failed for 0x{address:x}"))?;
        let offset = (address - region.base) as usize;
        let count = data.len().min(region.data.len() - offset);
        region.data[offset..offset + count].copy_from_slice(&data[..count]);
        Ok(count)
    }

    pub fn read_target_memory(&self, t: usize, address: u64, buf: &mut [u8]) -> Result<usize, String>
    {
        if let Some(p) = self.targets[t].process.filter(|p| self.process_is_live(*p)) {
            return self.read_memory(p, address, buf);
        }
        let image = text_image(&self.targets[t].program);
        let offset = address
            .checked_sub(TEXT_BASE)
            .map(|offset| offset as usize)
            .filter(|offset| *offset < image.len())
            .ok_or_else(|| format!("error: memory read failed for 0x{address:x}"))?;
        let count = buf.len().min(image.len() - offset);
        buf[..count].copy_from_slice(&image[offset..offset + count]);
        Ok(count)
    }

    pub fn read_cstring(&self, p: usize, address: u64, buf: &mut [u8]) -> Result<usize, String>
    {
        let read = self.read_memory(p, address, buf)?;
        Ok(buf[..read].iter().position(|byte| *byte == 0).unwrap_or(read))
    }

    pub fn allocate(&mut self, p: usize, size: usize, permissions: u32) -> Result<u64, String>
    {
        if size == 0 {
            return Err("error: cannot allocate 0 bytes".to_string());
        }
        let process = &mut self.processes[p];
        let size = (size as u64).next_multiple_of(PAGE_SIZE);
        let base = process.next_alloc;
        process.next_alloc += size + PAGE_SIZE;
        process.regions.push(Region {
            base,
            data: vec![0; size as usize],
            readable: permissions & 2 != 0,
            writable: permissions & 1 != 0,
            executable: permissions & 4 != 0,
            name: None,
        });
        Ok(base)
    }

    pub fn deallocate(&mut self, p: usize, address: u64) -> bool
    {
        let regions = &mut self.processes[p].regions;
        let before = regions.len();
        regions.retain(|region| !(region.base == address && region.base >= ALLOC_BASE));
        regions.len() != before
    }

    pub fn region_info(&self, p: usize, address: u64) -> MemoryRegionInfo
    {
        let regions = &self.processes[p].regions;
        if let Some(region) = regions.iter().find(|region| region.contains(address)) {
            return MemoryRegionInfo {
                base: region.base,
                end: region.end(),
                readable: region.readable,
                writable: region.writable,
                executable: region.executable,
                mapped: true,
                name: region.name.clone(),
            };
        }
        let base = regions
            .iter()
            .map(Region::end)
            .filter(|end| *end <= address)
            .max()
            .unwrap_or(0);
        let end = regions
            .iter()
            .map(|region| region.base)
            .filter(|start| *start > address)
            .min()
            .unwrap_or(INVALID_ADDRESS);
        MemoryRegionInfo {
            base,
            end,
            readable: false,
            writable: false,
            executable: false,
            mapped: false,
            name: None,
        }
    }

    fn write_locals(&mut self, p: usize)
    {
        let t = self.processes[p].target;
        let frames = self.processes[p].frames.clone();
        for (frame_index, frame) in frames.iter().enumerate() {
            let variables = self.targets[t].program.functions[frame.function].variables.clone();
            for (index, variable) in variables.iter().enumerate() {
                let base = variable_address(frame_index, &variables, index);
                for (leaf_index, (leaf, offset)) in variable.ty.leaves().into_iter().enumerate() {
                    let value = variable.values.get(leaf_index).copied().unwrap_or(0);
                    let size = (leaf.byte_size() as usize).min(8);
                    self.write_memory(p, base + offset, &value.to_le_bytes()[..size]).ok();
                }
            }
        }
    }

    // Values

    pub fn add_value(&mut self, value: ValueState) -> usize
    {
        self.values.push(value);
        self.values.len() - 1
    }

    pub fn variable_value(&self, p: usize, frame: usize, name: &str) -> Option<ValueState>
    {
        let process = &self.processes[p];
        let state = process.frames.get(frame)?;
        let variables = &self.program_of(p).functions[state.function].variables;
        let index = variables.iter().position(|variable| variable.name == name)?;
        Some(self.variable_state(p, frame, variables, index))
    }

    fn variable_state(&self, p: usize, frame: usize, variables: &[SimVariable], index: usize) -> ValueState
    {
        let variable = &variables[index];
        ValueState {
            name: variable.name.clone(),
            ty: variable.ty.clone(),
            location: ValueLocation::Memory(variable_address(frame, variables, index)),
            value_type: if variable.argument {
                ValueType::VariableArgument
            } else {
                ValueType::VariableLocal
            },
            scope: Some((p, self.processes[p].stop_id)),
            process: Some(p),
            target: Some(self.processes[p].target),
            error: None,
            path: variable.name.clone(),
        }
    }

    pub fn frame_variables(&self, p: usize, frame: usize, options: VariableOptions) -> Vec<ValueState>
    {
        let Some(state) = self.processes[p].frames.get(frame) else {
            return Vec::new();
        };
        let variables = &self.program_of(p).functions[state.function].variables;
        variables
            .iter()
            .enumerate()
            .filter(|(_, variable)| {
                if variable.argument {
                    options.arguments
                } else {
                    options.locals
                }
            })
            .map(|(index, _)| self.variable_state(p, frame, variables, index))
            .collect()
    }

    pub fn register_set(&self, p: usize, frame: usize) -> Option<ValueState>
    {
        let pc = self.processes[p].frames.get(frame)?.pc;
        let ty = SimType::structure(
            "General Purpose Registers",
            vec![
                ("rip", SimType::unsigned_long()),
                ("rsp", SimType::unsigned_long()),
                ("rbp", SimType::unsigned_long()),
            ],
        );
        let mut bytes = Vec::with_capacity(24);
        for register in [pc, stack_pointer(frame), frame_pointer(frame)] {
            bytes.extend_from_slice(&register.to_le_bytes());
        }
        Some(ValueState {
            name: "General Purpose Registers".to_string(),
            ty,
            location: ValueLocation::Bytes(bytes),
            value_type: ValueType::RegisterSet,
            scope: Some((p, self.processes[p].stop_id)),
            process: Some(p),
            target: Some(self.processes[p].target),
            error: None,
            path: String::new(),
        })
    }

    pub fn value_bytes(&self, value: &ValueState, offset: u64, size: u64) -> Option<Vec<u8>>
    {
        match &value.location {
            ValueLocation::Memory(address) => {
                let mut buf = vec![0; size as usize];
                let read = self.read_memory(value.process?, address + offset, &mut buf).ok()?;
                (read == buf.len()).then_some(buf)
            }
            ValueLocation::Bytes(bytes) => {
                let start = offset as usize;
                bytes.get(start..start + size as usize).map(<[u8]>::to_vec)
            }
            ValueLocation::Unavailable => None,
        }
    }

    /// Raw little-endian bits of a scalar or pointer value.
    pub fn value_bits(&self, value: &ValueState) -> Option<u64>
    {
        if !matches!(value.ty, SimType::Scalar { .. } | SimType::Pointer(_)) {
            return None;
        }
        let size = value.ty.byte_size().min(8);
        let bytes = self.value_bytes(value, 0, size)?;
        let mut raw = [0u8; 8];
        raw[..bytes.len()].copy_from_slice(&bytes);
        Some(u64::from_le_bytes(raw))
    }

    pub fn value_signed(&self, value: &ValueState) -> i64
    {
        let Some(bits) = self.value_bits(value) else {
            return 0;
        };
        let size = value.ty.byte_size().min(8);
        if value.ty.is_signed() && size < 8 {
            let shift = 64 - size * 8;
            ((bits << shift) as i64) >> shift
        } else {
            bits as i64
        }
    }

    pub fn value_text(&self, value: &ValueState) -> Option<String>
    {
        if value.error.is_some() {
            return None;
        }
        let bits = self.value_bits(value)?;
        match &value.ty {
            SimType::Pointer(_) => Some(format!("0x{bits:016x}")),
            SimType::Scalar { basic, .. } => Some(match basic {
                crate::types::BasicType::Bool => (bits != 0).to_string(),
                crate::types::BasicType::Char if (0x20..0x7f).contains(&bits) => {
                    format!("'{}'", char::from(bits as u8))
                }
                _ if value.ty.is_signed() => self.value_signed(value).to_string(),
                _ => bits.to_string(),
            }),
            _ => None,
        }
    }

    pub fn value_summary(&self, value: &ValueState) -> Option<String>
    {
        match &value.ty {
            SimType::Pointer(pointee) if is_char(pointee) => {
                let address = self.value_bits(value)?;
                let mut buf = vec![0; 256];
                let read = self.read_cstring(value.process?, address, &mut buf).ok()?;
                Some(format!("\"{}\"", String::from_utf8_lossy(&buf[..read])))
            }
            SimType::Array(element, len) if is_char(element) => {
                let bytes = self.value_bytes(value, 0, *len)?;
                let end = bytes.iter().position(|byte| *byte == 0).unwrap_or(bytes.len());
                Some(format!("\"{}\"", String::from_utf8_lossy(&bytes[..end])))
            }
            _ => None,
        }
    }

    pub fn num_children(value: &ValueState) -> usize
    {
        if value.error.is_some() {
            return 0;
        }
        match &value.ty {
            SimType::Pointer(pointee) => usize::from(**pointee != SimType::Void),
            ty => ty.children().len(),
        }
    }

    pub fn child(&self, value: &ValueState, index: usize) -> Option<ValueState>
    {
        if value.error.is_some() {
            return None;
        }
        match &value.ty {
            SimType::Pointer(_) if index == 0 => self.dereference(value).ok(),
            SimType::Pointer(_) => None,
            ty => {
                let (name, child, offset) = ty.children().into_iter().nth(index)?;
                Some(member(value, name, child, offset))
            }
        }
    }

    pub fn child_by_name(value: &ValueState, name: &str) -> Option<ValueState>
    {
        let (name, child, offset) = match &value.ty {
            SimType::Struct { .. } => value.ty.children().into_iter().find(|(field, _, _)| field == name)?,
            _ => return None,
        };
        Some(member(value, name, child, offset))
    }

    pub fn dereference(&self, value: &ValueState) -> Result<ValueState, String>
    {
        let SimType::Pointer(pointee) = &value.ty else {
            return Err(format!(
                "error: indirection requires pointer operand ('{}' invalid)",
                value.ty.name()
            ));
        };
        let address = self
            .value_bits(value)
            .ok_or_else(|| "error: pointer value is unavailable".to_string())?;
        Ok(ValueState {
            name: format!("*{}", value.name),
            ty: pointee.as_ref().clone(),
            location: ValueLocation::Memory(address),
            path: format!("*{}", value.path),
            error: None,
            ..value.clone()
        })
    }

    pub fn address_of(value: &ValueState) -> Option<ValueState>
    {
        let ValueLocation::Memory(address) = value.location else {
            return None;
        };
        Some(ValueState {
            name: format!("&{}", value.name),
            ty: SimType::pointer_to(value.ty.clone()),
            location: ValueLocation::Bytes(address.to_le_bytes().to_vec()),
            path: format!("&{}", value.path),
            error: None,
            scope: None,
            ..value.clone()
        })
    }

    pub fn cast(value: &ValueState, ty: &SimType) -> ValueState
    {
        let location = match &value.location {
            ValueLocation::Bytes(bytes) => {
                let mut bytes = bytes.clone();
                bytes.resize(ty.byte_size() as usize, 0);
                ValueLocation::Bytes(bytes)
            }
            other => other.clone(),
        };
        ValueState {
            ty: ty.clone(),
            location,
            ..value.clone()
        }
    }

    pub fn value_at_offset(value: &ValueState, name: &str, ty: &SimType, offset: u64) -> ValueState
    {
        let mut child = member(value, name.to_string(), ty.clone(), offset);
        child.path = name.to_string();
        if let ValueLocation::Bytes(bytes) = &mut child.location {
            bytes.resize(ty.byte_size() as usize, 0);
        }
        child
    }

    pub fn value_at_address(value: &ValueState, name: &str, address: u64, ty: &SimType) -> ValueState
    {
        let context = EvalContext {
            target: value.target.unwrap_or(0),
            process: value.process,
            frame: None,
        };
        if value.process.is_none() {
            return ValueState::failure("error: no process to read from".to_string(), &context);
        }
        ValueState {
            name: name.to_string(),
            ty: ty.clone(),
            location: ValueLocation::Memory(address),
            value_type: ValueType::ConstantResult,
            scope: None,
            error: None,
            path: name.to_string(),
            ..value.clone()
        }
    }

    pub fn value_from_expression(&mut self, value: &ValueState, name: &str, expression: &str) -> Option<ValueState>
    {
        let context = value.context()?;
        let mut result = self.evaluate(context, expression);
        name.clone_into(&mut result.name);
        Some(result)
    }

    pub fn set_value(&mut self, v: usize, text: &str) -> Result<bool, String>
    {
        let value = self.values[v].clone();
        if !matches!(value.ty, SimType::Scalar { .. } | SimType::Pointer(_)) {
            return Err(format!("error: cannot assign to a value of type '{}'", value.ty.name()));
        }
        let text = text.trim();
        let number = match text {
            "true" => 1,
            "false" => 0,
            _ => parse_int(text).ok_or_else(|| format!("error: could not parse '{text}' as an integer"))?,
        };
        let size = (value.ty.byte_size() as usize).min(8);
        let bytes = number.to_le_bytes()[..size].to_vec();
        match value.location {
            ValueLocation::Memory(address) => {
                let p = value.process.ok_or_else(|| "error: invalid process".to_string())?;
                self.write_memory(p, address, &bytes)?;
            }
            ValueLocation::Bytes(_) => self.values[v].location = ValueLocation::Bytes(bytes),
            ValueLocation::Unavailable => return Err("error: value is unavailable".to_string()),
        }
        Ok(true)
    }

    // Expressions

    /// Evaluate an integer literal, a boolean, or a variable path such as
    /// `point.x`, `*ptr` or `argv[0]`.
    pub fn evaluate(&mut self, context: EvalContext, expression: &str) -> ValueState
    {
        let expression = expression.trim();
        let literal = match expression {
            "true" => Some((1, SimType::bool())),
            "false" => Some((0, SimType::bool())),
            _ => parse_int(expression).map(|number| {
                let ty = if i32::try_from(number).is_ok() {
                    SimType::int()
                } else {
                    SimType::long()
                };
                (number, ty)
            }),
        };
        if let Some((number, ty)) = literal {
            let name = format!("${}", self.next_result);
            self.next_result += 1;
            let size = (ty.byte_size() as usize).min(8);
            return ValueState {
                name: name.clone(),
                location: ValueLocation::Bytes(number.to_le_bytes()[..size].to_vec()),
                ty,
                value_type: ValueType::ConstantResult,
                scope: None,
                process: context.process,
                target: Some(context.target),
                error: None,
                path: name,
            };
        }

        match self.resolve_path(context, expression) {
            Ok(value) => value,
            Err(message) => ValueState::failure(message, &context),
        }
    }

    pub fn resolve_path(&self, context: EvalContext, path: &str) -> Result<ValueState, String>
    {
        let mut rest = path.trim();
        let mut prefixes = Vec::new();
        while let Some(prefix) = rest.chars().next().filter(|c| *c == '*' || *c == '&') {
            prefixes.push(prefix);
            rest = rest[1..].trim_start();
        }

        let (ident, after) = split_identifier(rest).ok_or_else(|| "error: expected expression".to_string())?;
        let mut value = match (context.process, context.frame) {
            (Some(p), Some(frame)) => self.variable_value(p, frame, ident),
            _ => None,
        }
        .ok_or_else(|| format!("error: use of undeclared identifier '{ident}'"))?;
        rest = after;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix("->") {
                value = self.dereference(&value)?;
                let (field, after) = split_identifier(after).ok_or_else(|| "error: expected member name".to_string())?;
                value = field_of(&value, field)?;
                rest = after;
            } else if let Some(after) = rest.strip_prefix('.') {
                let (field, after) = split_identifier(after).ok_or_else(|| "error: expected member name".to_string())?;
                value = field_of(&value, field)?;
                rest = after;
            } else if let Some(after) = rest.strip_prefix('[') {
                let close = after.find(']').ok_or_else(|| "error: expected ']'".to_string())?;
                let index: u64 = after[..close]
                    .trim()
                    .parse()
                    .map_err(|_| "error: array subscript is not an integer".to_string())?;
                value = self.index(&value, index)?;
                rest = after[close + 1..].trim_start();
            } else {
                return Err("error: expected expression".to_string());
            }
        }

        for prefix in prefixes.iter().rev() {
            value = if *prefix == '*' {
                self.dereference(&value)?
            } else {
                Self::address_of(&value).ok_or_else(|| "error: cannot take the address of an rvalue".to_string())?
            };
        }
        Ok(value)
    }

    fn index(&self, value: &ValueState, index: u64) -> Result<ValueState, String>
    {
        match &value.ty {
            SimType::Array(_, len) => {
                if index >= *len {
                    return Err(format!("error: array index {index} is past the end of the array"));
                }
                let position = usize::try_from(index).map_err(|_| "error: array index too large".to_string())?;
                self.child(value, position)
                    .ok_or_else(|| "error: array element is unavailable".to_string())
            }
            SimType::Pointer(pointee) => {
                let base = self
                    .value_bits(value)
                    .ok_or_else(|| "error: pointer value is unavailable".to_string())?;
                Ok(ValueState {
                    name: format!("{}[{index}]", value.name),
                    ty: pointee.as_ref().clone(),
                    location: ValueLocation::Memory(base + index * pointee.byte_size()),
                    path: format!("{}[{index}]", value.path),
                    error: None,
                    ..value.clone()
                })
            }
            other => Err(format!("error: subscripted value '{}' is not an array or pointer", other.name())),
        }
    }

    // Commands

    pub fn run_command(&self, d: usize, command: &str, version: &str) -> (i32, ReturnState)
    {
        let words: Vec<&str> = command.split_whitespace().collect();
        let Some(&first) = words.first() else {
            return (RETURN_NO_RESULT, ReturnState { succeeded: true, ..ReturnState::default() });
        };
        let resolved = resolve_alias(first).unwrap_or(first);
        if !known_command(resolved) {
            return (
                RETURN_FAILED,
                ReturnState {
                    output: String::new(),
                    error: format!("error: '{first}' is not a valid command.\n"),
                    succeeded: false,
                },
            );
        }

        let target = self.debuggers[d].selected.filter(|t| self.targets[*t].alive);
        let output = match (resolved, words.get(1).copied()) {
            ("version", _) => format!("{version}\n"),
            ("help", _) => {
                let mut text = String::from("Debugger commands:\n");
                for name in COMMANDS {
                    text.push_str(&format!("  {name}\n"));
                }
                text
            }
            ("breakpoint", Some("list")) => match target {
                Some(t) if !self.targets[t].breakpoints.is_empty() => {
                    let mut text = String::from("Current breakpoints:\n");
                    for breakpoint in &self.targets[t].breakpoints {
                        text.push_str(&format!(
                            "{}: {}, locations = {}\n",
                            breakpoint.id,
                            breakpoint.spec,
                            breakpoint.locations.len()
                        ));
                    }
                    text
                }
                _ => "No breakpoints currently set.\n".to_string(),
            },
            ("target", Some("list")) => {
                let targets = &self.debuggers[d].targets;
                if targets.is_empty() {
                    "No targets.\n".to_string()
                } else {
                    let mut text = String::from("Current targets:\n");
                    for (index, t) in targets.iter().enumerate() {
                        let marker = if Some(*t) == target { '*' } else { ' ' };
                        let program = &self.targets[*t].program;
                        text.push_str(&format!(
                            "{marker} target #{index}: {} ( arch={} )\n",
                            program.path, program.triple
                        ));
                    }
                    text
                }
            }
            ("process", Some("status")) => {
                match target.and_then(|t| self.targets[t].process) {
                    Some(p) => {
                        let process = &self.processes[p];
                        format!("Process {} {}\n", process.pid, process.state)
                    }
                    None => {
                        return (
                            RETURN_FAILED,
                            ReturnState {
                                output: String::new(),
                                error: "error: invalid process\n".to_string(),
                                succeeded: false,
                            },
                        );
                    }
                }
            }
            _ => String::new(),
        };
        let status = if output.is_empty() {
            RETURN_NO_RESULT
        } else {
            RETURN_RESULT
        };
        (status, ReturnState { output, error: String::new(), succeeded: true })
    }
}

const COMMANDS: [&str; 14] = [
    "apropos",
    "breakpoint",
    "command",
    "expression",
    "frame",
    "help",
    "memory",
    "process",
    "register",
    "settings",
    "target",
    "thread",
    "version",
    "watchpoint",
];
const RETURN_NO_RESULT: i32 = 1;
const RETURN_RESULT: i32 = 2;
const RETURN_FAILED: i32 = 6;

pub(super) fn resolve_alias(alias: &str) -> Option<&'static str>
{
    match alias {
        "b" | "br" => Some("breakpoint"),
        "c" | "continue" | "kill" => Some("process"),
        "n" | "next" | "s" | "step" | "finish" | "bt" => Some("thread"),
        "p" | "print" | "po" | "call" => Some("expression"),
        "x" => Some("memory"),
        "f" => Some("frame"),
        "h" => Some("help"),
        _ => None,
    }
}

pub(super) fn known_command(name: &str) -> bool
{
    COMMANDS.contains(&name)
}

fn member(parent: &ValueState, name: String, ty: SimType, offset: u64) -> ValueState
{
    let path = if name.starts_with('[') {
        format!("{}{name}", parent.path)
    } else {
        format!("{}.{name}", parent.path)
    };
    let size = ty.byte_size();
    let location = match &parent.location {
        ValueLocation::Memory(address) => ValueLocation::Memory(address + offset),
        ValueLocation::Bytes(bytes) => {
            let start = (offset as usize).min(bytes.len());
            let end = (start + size as usize).min(bytes.len());
            ValueLocation::Bytes(bytes[start..end].to_vec())
        }
        ValueLocation::Unavailable => ValueLocation::Unavailable,
    };
    let value_type = if parent.value_type == ValueType::RegisterSet {
        ValueType::Register
    } else {
        parent.value_type
    };
    ValueState {
        name,
        ty,
        location,
        value_type,
        error: None,
        path,
        ..parent.clone()
    }
}

fn field_of(value: &ValueState, field: &str) -> Result<ValueState, String>
{
    World::child_by_name(value, field)
        .ok_or_else(|| format!("error: no member named '{field}' in '{}'", value.ty.name()))
}

fn split_identifier(text: &str) -> Option<(&str, &str)>
{
    let text = text.trim_start();
    let len = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    let ident = &text[..len];
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some((ident, text[len..].trim_start()))
}

fn is_char(ty: &SimType) -> bool
{
    matches!(ty, SimType::Scalar { basic: crate::types::BasicType::Char, .. })
}

/// Parse a decimal or `0x` hexadecimal integer, optionally negative.
pub(super) fn parse_int(text: &str) -> Option<i64>
{
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => digits.parse().ok()?,
        None => return None,
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Evaluate a breakpoint condition against a function's initial variable
/// values. Conditions that cannot be evaluated count as true.
fn condition_holds(condition: &str, variables: &[SimVariable]) -> bool
{
    let operand = |text: &str| -> Option<i64> {
        let text = text.trim();
        parse_int(text).or_else(|| {
            variables
                .iter()
                .find(|variable| variable.name == text)
                .map(|variable| variable.values.first().copied().unwrap_or(0))
        })
    };
    for op in ["==", "!=", "<=", ">=", "<", ">"] {
        if let Some((lhs, rhs)) = condition.split_once(op) {
            return match (operand(lhs), operand(rhs)) {
                (Some(lhs), Some(rhs)) => match op {
                    "==" => lhs == rhs,
                    "!=" => lhs != rhs,
                    "<=" => lhs <= rhs,
                    ">=" => lhs >= rhs,
                    "<" => lhs < rhs,
                    _ => lhs > rhs,
                },
                _ => true,
            };
        }
    }
    operand(condition).is_none_or(|value| value != 0)
}

fn resolve_locations(program: &SimProgram, spec: &BreakpointSpec) -> Vec<SimLocation>
{
    let in_module = |module: &Option<String>| {
        module
            .as_deref()
            .is_none_or(|module| module == program.path || module == program.file_name())
    };
    let entry = |index: usize| (index, program.functions[index].line, SimProgram::function_address(index));

    let matches: Vec<(usize, u32, u64)> = match spec {
        BreakpointSpec::Name { symbol, module } if in_module(module) => program
            .functions
            .iter()
            .enumerate()
            .filter(|(_, function)| function.name == *symbol)
            .map(|(index, _)| entry(index))
            .collect(),
        BreakpointSpec::Location { file, line } => program
            .functions
            .iter()
            .enumerate()
            .filter(|(_, function)| function.in_file(file) && function.line <= *line && *line <= function.end_line)
            .map(|(index, function)| {
                let offset = u64::from(line - function.line) * 4;
                (index, *line, SimProgram::function_address(index) + offset)
            })
            .collect(),
        BreakpointSpec::Address(address) => program
            .function_at(*address)
            .map(|index| (index, program.functions[index].line, *address))
            .into_iter()
            .collect(),
        BreakpointSpec::Regex { pattern, module } if in_module(module) => match Regex::new(pattern) {
            Ok(regex) => program
                .functions
                .iter()
                .enumerate()
                .filter(|(_, function)| regex.is_match(&function.name))
                .map(|(index, _)| entry(index))
                .collect(),
            Err(_) => Vec::new(),
        },
        // Source text of a simulated function is its declaration line, `name(`.
        BreakpointSpec::SourceRegex { pattern, file } => match Regex::new(pattern) {
            Ok(regex) => program
                .functions
                .iter()
                .enumerate()
                .filter(|(_, function)| {
                    function.file.is_some()
                        && file.as_deref().is_none_or(|file| function.in_file(file))
                        && regex.is_match(&format!("{}(", function.name))
                })
                .map(|(index, _)| entry(index))
                .collect(),
            Err(_) => Vec::new(),
        },
        _ => Vec::new(),
    };

    matches
        .into_iter()
        .zip(1..)
        .map(|((function, line, address), id)| SimLocation {
            id,
            function,
            line,
            address,
            common: StopFields::new(),
        })
        .collect()
}

/// Frames for a stop in `function`: the function, its caller `main`, and `_start`.
fn stack_frames(program: &SimProgram, function: usize, line: u32, pc: u64) -> Vec<FrameState>
{
    let mut frames = vec![FrameState { function, line, pc }];
    if function != 0 {
        if let Some(main) = program.function_index("main").filter(|main| *main != function) {
            frames.push(FrameState {
                function: main,
                line: program.functions[main].line + 2,
                pc: SimProgram::function_address(main) + 0x20,
            });
        }
        frames.push(FrameState {
            function: 0,
            line: 0,
            pc: TEXT_BASE + 0x10,
        });
    }
    frames
}

fn text_image(program: &SimProgram) -> Vec<u8>
{
    let stride = FUNCTION_STRIDE as usize;
    let mut image = vec![0x90; program.text_size() as usize];
    for start in (0..image.len()).step_by(stride) {
        image[start..start + PROLOGUE.len()].copy_from_slice(&PROLOGUE);
        image[start + stride - 1] = 0xc3;
    }
    image
}

pub(super) fn frame_pointer(frame: usize) -> u64
{
    STACK_TOP - FRAME_SIZE * frame as u64 - 0x10
}

pub(super) fn stack_pointer(frame: usize) -> u64
{
    STACK_TOP - FRAME_SIZE * (frame as u64 + 1)
}

/// Stack address of `variables[index]` in frame `frame`.
fn variable_address(frame: usize, variables: &[SimVariable], index: usize) -> u64
{
    variables[..=index]
        .iter()
        .fold(frame_pointer(frame), |address, variable| {
            address - variable.ty.byte_size().max(1).next_multiple_of(8)
        })
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_parse_int()
    {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("-7"), Some(-7));
        assert_eq!(parse_int("0x10"), Some(16));
        assert_eq!(parse_int("x"), None);
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("-"), None);
    }

    #[test]
    fn test_condition_holds()
    {
        let variables = vec![SimVariable::argument("x", SimType::int(), 21)];
        assert!(condition_holds("x == 21", &variables));
        assert!(!condition_holds("x != 21", &variables));
        assert!(condition_holds("x >= 20", &variables));
        assert!(!condition_holds("0", &variables));
        assert!(condition_holds("x", &variables));
        // Unknown identifiers cannot be evaluated and stop anyway.
        assert!(condition_holds("y == 3", &variables));
    }

    #[test]
    fn test_resolve_locations()
    {
        let program = SimProgram::demo("/tmp/demo");
        let by_name = resolve_locations(&program, &BreakpointSpec::name("compute"));
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, 1);

        let by_regex = resolve_locations(&program, &BreakpointSpec::regex("^(main|compute)$"));
        assert_eq!(by_regex.len(), 2);

        let by_line = resolve_locations(&program, &BreakpointSpec::location("main.c", 5));
        assert_eq!(by_line.len(), 1);
        assert_eq!(by_line[0].line, 5);

        assert!(resolve_locations(&program, &BreakpointSpec::regex("(")).is_empty());
        assert!(resolve_locations(&program, &BreakpointSpec::location("main.c", 99)).is_empty());
    }

    #[test]
    fn test_variable_layout_is_disjoint()
    {
        let variables = vec![
            SimVariable::local("a", SimType::char(), 0),
            SimVariable::local("b", SimType::long(), 0),
        ];
        let a = variable_address(0, &variables, 0);
        let b = variable_address(0, &variables, 1);
        assert_eq!(a, frame_pointer(0) - 8);
        assert_eq!(b, a - 8);
        assert!(b > stack_pointer(0));
    }
}
