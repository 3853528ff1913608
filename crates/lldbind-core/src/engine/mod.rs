//! # Engine Boundary
//!
//! The [`Engine`] trait is the catalogue of entry points the binding calls.
//! It mirrors the flat C surface of the wrapper library: every method takes
//! raw handles and plain scalars, fallible operations report through a
//! [`Status`] out-parameter, and strings come back as owned copies.
//!
//! Two implementations ship with the crate:
//!
//! - [`NativeEngine`](native::NativeEngine) resolves the `lldb_*` symbols from
//!   `liblldb_wrapper` at runtime (unix only).
//! - [`SimEngine`](sim::SimEngine) is an in-memory engine that scripts program
//!   behaviour. The test-suite and the CLI's `--simulate` mode use it.
//!
//! ## Handle contract
//!
//! - A returned `Option<RawHandle>` of `None` is the null handle.
//! - Every non-null handle returned by an accessor is a new reference the
//!   caller owns and must pass to [`Engine::destroy`] exactly once.
//! - Handles to the same underlying object are independent: destroying one
//!   does not invalidate another.
//! - Accessors are only called with handles the binding has already checked
//!   with [`Engine::is_valid`].
//!
//! Families of near-identical entry points (the three kinds of stop point, the
//! type predicates, the process control verbs) are folded into one method
//! taking a selector enum.

#[cfg(unix)]
pub mod native;
pub mod sim;

use std::fmt;

use crate::capability::{Capabilities, Feature};
use crate::handle::{ObjectKind, RawHandle};
use crate::launch::LaunchInfo;
use crate::status::Status;
use crate::types::{MemoryRegionInfo, SymbolContextItem};

/// What a new breakpoint should resolve to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakpointSpec
{
    /// A function name, optionally restricted to one module.
    Name
    {
        symbol: String,
        module: Option<String>,
    },
    /// A source file and line.
    Location
    {
        file: String, line: u32
    },
    /// A load address.
    Address(u64),
    /// Every function whose name matches a regular expression.
    Regex
    {
        pattern: String,
        module: Option<String>,
    },
    /// Every source line matching a regular expression.
    SourceRegex
    {
        pattern: String,
        file: Option<String>,
    },
}

impl BreakpointSpec
{
    #[must_use]
    pub fn name(symbol: impl Into<String>) -> Self
    {
        BreakpointSpec::Name {
            symbol: symbol.into(),
            module: None,
        }
    }

    #[must_use]
    pub fn location(file: impl Into<String>, line: u32) -> Self
    {
        BreakpointSpec::Location { file: file.into(), line }
    }

    #[must_use]
    pub fn regex(pattern: impl Into<String>) -> Self
    {
        BreakpointSpec::Regex {
            pattern: pattern.into(),
            module: None,
        }
    }

    /// The capability the matching entry point is gated on, if any.
    #[must_use]
    pub fn feature(&self) -> Option<Feature>
    {
        match self {
            BreakpointSpec::Address(_) => Some(Feature::BreakpointByAddress),
            BreakpointSpec::Regex { .. } => Some(Feature::BreakpointByRegex),
            _ => None,
        }
    }
}

impl fmt::Display for BreakpointSpec
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            BreakpointSpec::Name { symbol, .. } => write!(f, "for '{symbol}'"),
            BreakpointSpec::Location { file, line } => write!(f, "at {file}:{line}"),
            BreakpointSpec::Address(address) => write!(f, "at address 0x{address:x}"),
            BreakpointSpec::Regex { pattern, .. } => write!(f, "for regex '{pattern}'"),
            BreakpointSpec::SourceRegex { pattern, .. } => write!(f, "for source regex '{pattern}'"),
        }
    }
}

/// Fire-and-return process control verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessControl
{
    Continue,
    Stop,
    Kill,
    Detach,
    /// Tear the process down (`lldb_process_destroy_process`).
    Destroy,
    SendAsyncInterrupt,
}

/// Debuggee output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream
{
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind
{
    Over,
    Into,
    Out,
    /// One machine instruction; `over_calls` steps over call instructions.
    Instruction
    {
        over_calls: bool
    },
}

impl StepKind
{
    #[must_use]
    pub fn feature(self) -> Feature
    {
        match self {
            StepKind::Over => Feature::StepOver,
            StepKind::Into => Feature::StepInto,
            StepKind::Out => Feature::StepOut,
            StepKind::Instruction { .. } => Feature::StepInstruction,
        }
    }
}

/// Frame register shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRegister
{
    Pc,
    Sp,
    Fp,
}

/// Which string property of a frame to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameText
{
    FunctionName,
    DisplayFunctionName,
    FilePath,
    Disassembly,
}

/// Which string property of a value to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueText
{
    Name,
    Value,
    Summary,
    TypeName,
    ExpressionPath,
}

/// Values derived from another value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDerivation
{
    Dereference,
    AddressOf,
    NonSynthetic,
}

/// Boolean type predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTrait
{
    Pointer,
    Reference,
    Array,
    Vector,
    Typedef,
    Function,
    PolymorphicClass,
}

/// Types derived from another type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDerivation
{
    Pointer,
    Pointee,
    Reference,
    Dereferenced,
    Unqualified,
    Canonical,
    ArrayElement,
}

/// Numeric type properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCount
{
    ByteSize,
    ArraySize,
    Fields,
    DirectBaseClasses,
    VirtualBaseClasses,
}

/// Which variables a frame query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableOptions
{
    pub arguments: bool,
    pub locals: bool,
    pub statics: bool,
    pub in_scope_only: bool,
}

impl Default for VariableOptions
{
    fn default() -> Self
    {
        Self {
            arguments: true,
            locals: true,
            statics: true,
            in_scope_only: true,
        }
    }
}

/// Which command-return text to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnText
{
    Output,
    Error,
}

/// The entry point catalogue
///
/// Integers that encode engine enumerations (`State`, `StopReason`,
/// `ValueType`, `BasicType`) are passed through raw; the object graph converts
/// them.
#[allow(clippy::too_many_arguments)]
pub trait Engine
{
    // Lifecycle

    fn initialize(&self);
    fn terminate(&self);
    fn version_string(&self) -> Option<String>;
    /// Computed once at load time.
    fn capabilities(&self) -> Capabilities;
    fn is_valid(&self, kind: ObjectKind, handle: RawHandle) -> bool;
    fn destroy(&self, kind: ObjectKind, handle: RawHandle);

    // Debugger

    fn debugger_create(&self) -> Option<RawHandle>;
    fn debugger_create_target(
        &self,
        debugger: RawHandle,
        filename: &str,
        arch: Option<&str>,
        platform: Option<&str>,
        add_dependent_modules: bool,
        status: &mut Status,
    ) -> Option<RawHandle>;
    fn debugger_num_targets(&self, debugger: RawHandle) -> u32;
    fn debugger_target_at_index(&self, debugger: RawHandle, index: u32) -> Option<RawHandle>;
    fn debugger_selected_target(&self, debugger: RawHandle) -> Option<RawHandle>;
    fn debugger_set_selected_target(&self, debugger: RawHandle, target: RawHandle);
    fn debugger_delete_target(&self, debugger: RawHandle, target: RawHandle) -> bool;
    fn debugger_find_target_with_process_id(&self, debugger: RawHandle, pid: u64) -> Option<RawHandle>;
    fn debugger_async(&self, debugger: RawHandle) -> bool;
    fn debugger_set_async(&self, debugger: RawHandle, is_async: bool);
    fn debugger_command_interpreter(&self, debugger: RawHandle) -> Option<RawHandle>;
    fn debugger_handle_command(&self, debugger: RawHandle, command: &str);

    // Target

    fn target_launch(&self, target: RawHandle, info: &LaunchInfo, status: &mut Status) -> Option<RawHandle>;
    fn target_attach_to_pid(&self, target: RawHandle, pid: u64, status: &mut Status) -> Option<RawHandle>;
    fn target_attach_to_name(
        &self,
        target: RawHandle,
        name: &str,
        wait_for: bool,
        status: &mut Status,
    ) -> Option<RawHandle>;
    fn target_create_breakpoint(&self, target: RawHandle, spec: &BreakpointSpec) -> Option<RawHandle>;
    fn target_delete_breakpoint(&self, target: RawHandle, id: i32) -> bool;
    fn target_delete_all_breakpoints(&self, target: RawHandle) -> bool;
    fn target_set_all_breakpoints_enabled(&self, target: RawHandle, enabled: bool) -> bool;
    fn target_find_breakpoint(&self, target: RawHandle, id: i32) -> Option<RawHandle>;
    fn target_num_breakpoints(&self, target: RawHandle) -> u32;
    fn target_breakpoint_at_index(&self, target: RawHandle, index: u32) -> Option<RawHandle>;
    fn target_process(&self, target: RawHandle) -> Option<RawHandle>;
    fn target_executable_path(&self, target: RawHandle) -> Option<String>;
    fn target_num_modules(&self, target: RawHandle) -> u32;
    fn target_module_at_index(&self, target: RawHandle, index: u32) -> Option<RawHandle>;
    fn target_evaluate_expression(&self, target: RawHandle, expression: &str) -> Option<RawHandle>;
    fn target_read_memory(&self, target: RawHandle, address: u64, buf: &mut [u8], status: &mut Status) -> usize;
    fn target_address_byte_size(&self, target: RawHandle) -> u32;
    fn target_triple(&self, target: RawHandle) -> Option<String>;
    fn target_watch_address(
        &self,
        target: RawHandle,
        address: u64,
        size: usize,
        read: bool,
        write: bool,
        status: &mut Status,
    ) -> Option<RawHandle>;
    fn target_delete_watchpoint(&self, target: RawHandle, id: i32) -> bool;
    fn target_delete_all_watchpoints(&self, target: RawHandle) -> bool;
    fn target_find_watchpoint(&self, target: RawHandle, id: i32) -> Option<RawHandle>;
    fn target_num_watchpoints(&self, target: RawHandle) -> u32;
    fn target_watchpoint_at_index(&self, target: RawHandle, index: u32) -> Option<RawHandle>;

    // Process

    fn process_control(&self, process: RawHandle, control: ProcessControl) -> bool;
    fn process_signal(&self, process: RawHandle, signal: i32) -> bool;
    fn process_state(&self, process: RawHandle) -> i32;
    fn process_num_threads(&self, process: RawHandle) -> u32;
    fn process_thread_at_index(&self, process: RawHandle, index: u32) -> Option<RawHandle>;
    fn process_thread_by_id(&self, process: RawHandle, tid: u64) -> Option<RawHandle>;
    fn process_thread_by_index_id(&self, process: RawHandle, index_id: u32) -> Option<RawHandle>;
    fn process_selected_thread(&self, process: RawHandle) -> Option<RawHandle>;
    fn process_select_thread_by_id(&self, process: RawHandle, tid: u64) -> bool;
    fn process_select_thread_by_index_id(&self, process: RawHandle, index_id: u32) -> bool;
    fn process_pid(&self, process: RawHandle) -> u64;
    fn process_exit_status(&self, process: RawHandle) -> i32;
    fn process_exit_description(&self, process: RawHandle) -> Option<String>;
    fn process_read_memory(&self, process: RawHandle, address: u64, buf: &mut [u8], status: &mut Status) -> usize;
    fn process_write_memory(&self, process: RawHandle, address: u64, data: &[u8], status: &mut Status) -> usize;
    fn process_allocate_memory(&self, process: RawHandle, size: usize, permissions: u32, status: &mut Status) -> u64;
    fn process_deallocate_memory(&self, process: RawHandle, address: u64) -> bool;
    fn process_read_cstring(&self, process: RawHandle, address: u64, buf: &mut [u8], status: &mut Status) -> usize;
    fn process_read_output(&self, process: RawHandle, stream: OutputStream, buf: &mut [u8]) -> usize;
    fn process_put_stdin(&self, process: RawHandle, data: &[u8]) -> usize;
    fn process_num_supported_hardware_watchpoints(&self, process: RawHandle, status: &mut Status) -> u32;
    fn process_unique_id(&self, process: RawHandle) -> u32;
    /// Copies the region fields and releases the engine's region object.
    fn process_memory_region_info(
        &self,
        process: RawHandle,
        address: u64,
        status: &mut Status,
    ) -> Option<MemoryRegionInfo>;

    // Thread

    fn thread_step(&self, thread: RawHandle, kind: StepKind) -> bool;
    fn thread_run_to_address(&self, thread: RawHandle, address: u64) -> bool;
    fn thread_num_frames(&self, thread: RawHandle) -> u32;
    fn thread_frame_at_index(&self, thread: RawHandle, index: u32) -> Option<RawHandle>;
    fn thread_selected_frame(&self, thread: RawHandle) -> Option<RawHandle>;
    fn thread_select_frame(&self, thread: RawHandle, index: u32) -> bool;
    fn thread_id(&self, thread: RawHandle) -> u64;
    fn thread_index_id(&self, thread: RawHandle) -> u32;
    fn thread_name(&self, thread: RawHandle) -> Option<String>;
    fn thread_queue_name(&self, thread: RawHandle) -> Option<String>;
    fn thread_stop_reason(&self, thread: RawHandle) -> i32;
    fn thread_stop_description(&self, thread: RawHandle, max_len: usize) -> Option<String>;
    fn thread_stop_reason_data_count(&self, thread: RawHandle) -> u64;
    fn thread_stop_reason_data_at_index(&self, thread: RawHandle, index: u32) -> u64;
    fn thread_is_stopped(&self, thread: RawHandle) -> bool;
    fn thread_is_suspended(&self, thread: RawHandle) -> bool;
    fn thread_set_suspended(&self, thread: RawHandle, suspended: bool) -> bool;
    fn thread_process(&self, thread: RawHandle) -> Option<RawHandle>;

    // Frame

    fn frame_text(&self, frame: RawHandle, text: FrameText) -> Option<String>;
    fn frame_line(&self, frame: RawHandle) -> u32;
    fn frame_column(&self, frame: RawHandle) -> u32;
    fn frame_register(&self, frame: RawHandle, register: FrameRegister) -> u64;
    fn frame_set_pc(&self, frame: RawHandle, pc: u64) -> bool;
    fn frame_find_variable(&self, frame: RawHandle, name: &str) -> Option<RawHandle>;
    fn frame_evaluate_expression(&self, frame: RawHandle, expression: &str) -> Option<RawHandle>;
    fn frame_value_for_variable_path(&self, frame: RawHandle, path: &str) -> Option<RawHandle>;
    fn frame_id(&self, frame: RawHandle) -> u32;
    fn frame_thread(&self, frame: RawHandle) -> Option<RawHandle>;
    fn frame_symbol_context(&self, frame: RawHandle, scope: SymbolContextItem) -> Option<RawHandle>;
    fn frame_variables(&self, frame: RawHandle, options: VariableOptions) -> Option<RawHandle>;
    fn frame_registers(&self, frame: RawHandle) -> Option<RawHandle>;
    fn frame_is_inlined(&self, frame: RawHandle) -> bool;
    fn frame_module(&self, frame: RawHandle) -> Option<RawHandle>;

    // Stop points: breakpoints, breakpoint locations and watchpoints

    fn stop_point_id(&self, kind: ObjectKind, handle: RawHandle) -> i32;
    fn stop_point_is_enabled(&self, kind: ObjectKind, handle: RawHandle) -> bool;
    fn stop_point_set_enabled(&self, kind: ObjectKind, handle: RawHandle, enabled: bool);
    fn stop_point_hit_count(&self, kind: ObjectKind, handle: RawHandle) -> u32;
    fn stop_point_ignore_count(&self, kind: ObjectKind, handle: RawHandle) -> u32;
    fn stop_point_set_ignore_count(&self, kind: ObjectKind, handle: RawHandle, count: u32);
    fn stop_point_condition(&self, kind: ObjectKind, handle: RawHandle) -> Option<String>;
    fn stop_point_set_condition(&self, kind: ObjectKind, handle: RawHandle, condition: Option<&str>);

    // Breakpoint

    fn breakpoint_is_one_shot(&self, breakpoint: RawHandle) -> bool;
    fn breakpoint_set_one_shot(&self, breakpoint: RawHandle, one_shot: bool);
    fn breakpoint_num_locations(&self, breakpoint: RawHandle) -> u32;
    fn breakpoint_location_at_index(&self, breakpoint: RawHandle, index: u32) -> Option<RawHandle>;
    fn breakpoint_find_location(&self, breakpoint: RawHandle, id: i32) -> Option<RawHandle>;
    fn breakpoint_is_hardware(&self, breakpoint: RawHandle) -> bool;
    fn breakpoint_auto_continue(&self, breakpoint: RawHandle) -> bool;
    fn breakpoint_set_auto_continue(&self, breakpoint: RawHandle, auto_continue: bool);
    fn breakpoint_thread_id(&self, breakpoint: RawHandle) -> u64;
    fn breakpoint_set_thread_id(&self, breakpoint: RawHandle, tid: u64);
    fn breakpoint_thread_name(&self, breakpoint: RawHandle) -> Option<String>;
    fn breakpoint_set_thread_name(&self, breakpoint: RawHandle, name: Option<&str>);
    fn breakpoint_thread_index(&self, breakpoint: RawHandle) -> u32;
    fn breakpoint_set_thread_index(&self, breakpoint: RawHandle, index: u32);

    // Breakpoint location

    fn location_load_address(&self, location: RawHandle) -> u64;
    fn location_breakpoint(&self, location: RawHandle) -> Option<RawHandle>;

    // Watchpoint

    fn watchpoint_address(&self, watchpoint: RawHandle) -> u64;
    fn watchpoint_size(&self, watchpoint: RawHandle) -> usize;
    fn watchpoint_is_watching_reads(&self, watchpoint: RawHandle) -> bool;
    fn watchpoint_is_watching_writes(&self, watchpoint: RawHandle) -> bool;

    // Value

    fn value_text(&self, value: RawHandle, text: ValueText) -> Option<String>;
    fn value_type(&self, value: RawHandle) -> Option<RawHandle>;
    fn value_num_children(&self, value: RawHandle) -> u32;
    fn value_child_at_index(&self, value: RawHandle, index: u32) -> Option<RawHandle>;
    fn value_child_member_with_name(&self, value: RawHandle, name: &str) -> Option<RawHandle>;
    fn value_as_signed(&self, value: RawHandle) -> i64;
    fn value_as_unsigned(&self, value: RawHandle) -> u64;
    fn value_byte_size(&self, value: RawHandle) -> u64;
    fn value_might_have_children(&self, value: RawHandle) -> bool;
    /// Copies the value's error state into `status`.
    fn value_error(&self, value: RawHandle, status: &mut Status);
    fn value_derive(&self, value: RawHandle, derivation: ValueDerivation) -> Option<RawHandle>;
    fn value_cast(&self, value: RawHandle, ty: RawHandle) -> Option<RawHandle>;
    fn value_load_address(&self, value: RawHandle) -> u64;
    fn value_value_type(&self, value: RawHandle) -> i32;
    fn value_set_from_str(&self, value: RawHandle, text: &str, status: &mut Status) -> bool;
    fn value_create_child_at_offset(&self, value: RawHandle, name: &str, ty: RawHandle, offset: u32)
        -> Option<RawHandle>;
    fn value_create_from_address(&self, value: RawHandle, name: &str, address: u64, ty: RawHandle)
        -> Option<RawHandle>;
    fn value_create_from_expression(&self, value: RawHandle, name: &str, expression: &str) -> Option<RawHandle>;
    fn value_watch(
        &self,
        value: RawHandle,
        resolve_location: bool,
        read: bool,
        write: bool,
        status: &mut Status,
    ) -> Option<RawHandle>;
    fn value_is_pointer_type(&self, value: RawHandle) -> bool;

    // Value list

    fn value_list_size(&self, list: RawHandle) -> u32;
    fn value_list_at_index(&self, list: RawHandle, index: u32) -> Option<RawHandle>;
    fn value_list_first_by_name(&self, list: RawHandle, name: &str) -> Option<RawHandle>;

    // Type

    fn type_name(&self, ty: RawHandle, display: bool) -> Option<String>;
    fn type_has_trait(&self, ty: RawHandle, type_trait: TypeTrait) -> bool;
    fn type_derive(&self, ty: RawHandle, derivation: TypeDerivation) -> Option<RawHandle>;
    fn type_count(&self, ty: RawHandle, count: TypeCount) -> u64;
    fn type_basic_type(&self, ty: RawHandle) -> i32;

    // Module and symbol context

    fn module_file_path(&self, module: RawHandle, platform: bool) -> Option<String>;
    fn module_num_symbols(&self, module: RawHandle) -> u32;
    fn symbol_context_module(&self, context: RawHandle) -> Option<RawHandle>;
    fn symbol_context_function_name(&self, context: RawHandle) -> Option<String>;

    // Command interpreter

    fn command_return_object_create(&self) -> Option<RawHandle>;
    fn interpreter_handle_command(
        &self,
        interpreter: RawHandle,
        command: &str,
        result: RawHandle,
        add_to_history: bool,
    ) -> i32;
    fn interpreter_command_exists(&self, interpreter: RawHandle, command: &str) -> bool;
    fn interpreter_alias_exists(&self, interpreter: RawHandle, alias: &str) -> bool;
    fn return_object_text(&self, result: RawHandle, text: ReturnText) -> Option<String>;
    fn return_object_succeeded(&self, result: RawHandle) -> bool;
    fn return_object_clear(&self, result: RawHandle);
}
