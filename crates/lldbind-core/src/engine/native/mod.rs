//! # Native Engine
//!
//! [`NativeEngine`] drives a real LLDB through the flat C surface exported by
//! `liblldb_wrapper`. The library is opened at runtime; required entry points
//! must all resolve, optional ones determine the [`Capabilities`].
//!
//! ## Conversions at the boundary
//!
//! - Object pointers map one-to-one onto [`RawHandle`]s; null is `None`.
//! - `int` booleans become `bool`.
//! - Strings passed in are copied into `CString`s. Text with an interior NUL
//!   cannot cross the boundary and the call returns its neutral default.
//! - Strings returned are borrowed from the wrapper's thread-local storage
//!   and copied immediately.
//! - Error objects are created per call, read back into the caller's
//!   [`Status`] and destroyed before the call returns.

mod library;
mod symbols;

use std::ffi::{c_int, CStr, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr;

use tracing::{debug, info, warn};

use self::library::Library;
use self::symbols::{EntryPoints, Obj, Str};
use super::{
    BreakpointSpec, Engine, FrameRegister, FrameText, OutputStream, ProcessControl, ReturnText, StepKind, TypeCount,
    TypeDerivation, TypeTrait, ValueDerivation, ValueText, VariableOptions,
};
use crate::capability::Capabilities;
use crate::config;
use crate::error::{LldbindError, LldbindResult};
use crate::handle::{ObjectKind, RawHandle};
use crate::launch::LaunchInfo;
use crate::status::Status;
use crate::types::{MemoryRegionInfo, SymbolContextItem};

/// Call a required entry point.
macro_rules! call {
    ($engine:expr, $name:ident($($arg:expr),* $(,)?)) => {
        // SAFETY: handles come from the wrapper and were validity-checked by the
        // object graph, strings are NUL-terminated and outlive the call, and
        // buffers are passed together with their length.
        unsafe { ($engine.api.$name)($($arg),*) }
    };
}

/// Call an optional entry point, or yield `$default` when it is not exported.
macro_rules! call_optional {
    ($engine:expr, $name:ident($($arg:expr),* $(,)?), $default:expr) => {
        match $engine.api.$name {
            // SAFETY: as for `call!`.
            Some(entry) => unsafe { entry($($arg),*) },
            None => $default,
        }
    };
}

/// Call an entry point returning `const char*` and copy the result.
macro_rules! call_text {
    ($engine:expr, $name:ident($($arg:expr),* $(,)?)) => {{
        let text = call!($engine, $name($($arg),*));
        // SAFETY: the wrapper returns null or a NUL-terminated string that stays
        // valid until its next call on this thread.
        unsafe { copy_c_str(text) }
    }};
}

/// The dynamically loaded wrapper library
pub struct NativeEngine
{
    api: EntryPoints,
    capabilities: Capabilities,
    // Declared last so the entry points are dropped before the library closes.
    library: Library,
}

impl NativeEngine
{
    /// Load the wrapper library from the first candidate location that works.
    ///
    /// Candidates come from [`config::wrapper_library_candidates`].
    ///
    /// ## Errors
    ///
    /// Returns [`LldbindError::LibraryLoad`] listing why each candidate
    /// failed.
    pub fn load() -> LldbindResult<Self>
    {
        let mut failures = Vec::new();
        for candidate in config::wrapper_library_candidates() {
            match Self::open(&candidate) {
                Ok(engine) => return Ok(engine),
                Err(LldbindError::LibraryLoad(reason)) => {
                    debug!("Skipping wrapper candidate: {reason}");
                    failures.push(reason);
                }
                Err(other) => return Err(other),
            }
        }
        Err(LldbindError::LibraryLoad(failures.join("; ")))
    }

    /// Load the wrapper library at `path`.
    ///
    /// ## Errors
    ///
    /// Returns [`LldbindError::LibraryLoad`] when the library cannot be opened
    /// or lacks a required entry point.
    pub fn open(path: &Path) -> LldbindResult<Self>
    {
        let library = Library::open(path)?;
        let api = EntryPoints::resolve(&library)?;
        let capabilities = Capabilities::probe(|name| library.symbol(name).is_some());

        let missing = capabilities.unsupported();
        if missing.is_empty() {
            info!("Loaded {} with all optional entry points", path.display());
        } else {
            info!("Loaded {} without {} optional entry points", path.display(), missing.len());
            for feature in missing {
                debug!("Unsupported: {feature} ({})", feature.entry_point());
            }
        }

        Ok(Self {
            api,
            capabilities,
            library,
        })
    }

    /// Path the library was opened from.
    #[must_use]
    pub fn library_path(&self) -> &Path
    {
        self.library.path()
    }

    /// Run `call` with a fresh error object and copy its outcome into `status`.
    fn with_error<T, F>(&self, status: &mut Status, call: F) -> T
    where
        T: Default,
        F: FnOnce(Obj) -> T,
    {
        let error = call!(self, lldb_error_create());
        if error.is_null() {
            status.set_error("failed to allocate an error object");
            return T::default();
        }

        let result = call(error);
        if truth(call!(self, lldb_error_fail(error))) {
            status.set_error(call_text!(self, lldb_error_get_cstring(error)).unwrap_or_default());
            status.set_code(call!(self, lldb_error_get_error(error)));
        }
        call!(self, lldb_error_destroy(error));
        result
    }

    fn build_launch_info(&self, info: &LaunchInfo) -> Result<Obj, &'static str>
    {
        let args = c_strings(info.args()).ok_or("launch argument contains a NUL byte")?;
        let environment = c_strings(info.environment()).ok_or("environment entry contains a NUL byte")?;
        let working_dir = match info.working_dir() {
            Some(dir) => Some(CString::new(dir.as_os_str().as_bytes()).map_err(|_| "working directory contains a NUL byte")?),
            None => None,
        };

        let argv = null_terminated(&args);
        let launch_info = call!(self, lldb_launch_info_create(argv.as_ptr()));
        if launch_info.is_null() {
            return Err("failed to create launch info");
        }
        if let Some(dir) = &working_dir {
            call!(self, lldb_launch_info_set_working_directory(launch_info, dir.as_ptr()));
        }
        if !environment.is_empty() || !info.appends_environment() {
            let envp = null_terminated(&environment);
            call!(
                self,
                lldb_launch_info_set_environment_entries(launch_info, envp.as_ptr(), flag(info.appends_environment()))
            );
        }
        call!(self, lldb_launch_info_set_launch_flags(launch_info, info.launch_flags().bits()));
        Ok(launch_info)
    }
}

fn obj(handle: RawHandle) -> Obj
{
    handle.as_ptr()
}

fn adopt(ptr: Obj) -> Option<RawHandle>
{
    RawHandle::from_ptr(ptr)
}

/// The object a status-reporting call returned, or `None` when it is null or
/// the call also reported an error. A failed call's object is released unread.
fn unless_failed(status: &Status, object: Option<RawHandle>, release: impl FnOnce(Obj)) -> Option<Obj>
{
    let object = obj(object?);
    if status.fail() {
        warn!("Engine returned an object alongside a failed status, releasing it");
        release(object);
        return None;
    }
    Some(object)
}

fn flag(value: bool) -> c_int
{
    c_int::from(value)
}

fn truth(value: c_int) -> bool
{
    value != 0
}

fn c_string(text: &str) -> Option<CString>
{
    match CString::new(text) {
        Ok(text) => Some(text),
        Err(_) => {
            warn!("String argument {text:?} contains a NUL byte");
            None
        }
    }
}

/// `Some(None)` for an absent argument, `None` when the text cannot be passed.
fn c_string_opt(text: Option<&str>) -> Option<Option<CString>>
{
    match text {
        None => Some(None),
        Some(text) => c_string(text).map(Some),
    }
}

fn c_strings(texts: &[String]) -> Option<Vec<CString>>
{
    texts.iter().map(|text| c_string(text)).collect()
}

fn opt_ptr(text: Option<&CString>) -> Str
{
    text.map_or(ptr::null(), |text| text.as_ptr())
}

fn null_terminated(strings: &[CString]) -> Vec<Str>
{
    strings.iter().map(|s| s.as_ptr()).chain(std::iter::once(ptr::null())).collect()
}

/// Copy a borrowed C string.
///
/// ## Safety
///
/// `text` must be null or point to a NUL-terminated string.
unsafe fn copy_c_str(text: Str) -> Option<String>
{
    if text.is_null() {
        None
    } else {
        Some(CStr::from_ptr(text).to_string_lossy().into_owned())
    }
}

impl Engine for NativeEngine
{
    fn initialize(&self)
    {
        call!(self, lldb_initialize());
    }

    fn terminate(&self)
    {
        call!(self, lldb_terminate());
    }

    fn version_string(&self) -> Option<String>
    {
        call_text!(self, lldb_debugger_get_version_string())
    }

    fn capabilities(&self) -> Capabilities
    {
        self.capabilities
    }

    fn is_valid(&self, kind: ObjectKind, handle: RawHandle) -> bool
    {
        let h = obj(handle);
        truth(match kind {
            ObjectKind::Debugger => call!(self, lldb_debugger_is_valid(h)),
            ObjectKind::Target => call!(self, lldb_target_is_valid(h)),
            ObjectKind::Process => call!(self, lldb_process_is_valid(h)),
            ObjectKind::Thread => call!(self, lldb_thread_is_valid(h)),
            ObjectKind::Frame => call!(self, lldb_frame_is_valid(h)),
            ObjectKind::Breakpoint => call!(self, lldb_breakpoint_is_valid(h)),
            ObjectKind::BreakpointLocation => call!(self, lldb_breakpoint_location_is_valid(h)),
            ObjectKind::Watchpoint => call!(self, lldb_watchpoint_is_valid(h)),
            ObjectKind::Value => call!(self, lldb_value_is_valid(h)),
            ObjectKind::ValueList => call!(self, lldb_value_list_is_valid(h)),
            ObjectKind::Type => call!(self, lldb_type_is_valid(h)),
            ObjectKind::Module => call!(self, lldb_module_is_valid(h)),
            ObjectKind::SymbolContext => call!(self, lldb_symbol_context_is_valid(h)),
            ObjectKind::CommandInterpreter => call!(self, lldb_command_interpreter_is_valid(h)),
            ObjectKind::CommandReturnObject => call!(self, lldb_command_return_object_is_valid(h)),
        })
    }

    fn destroy(&self, kind: ObjectKind, handle: RawHandle)
    {
        let h = obj(handle);
        match kind {
            ObjectKind::Debugger => call!(self, lldb_debugger_destroy(h)),
            ObjectKind::Target => call!(self, lldb_target_destroy(h)),
            ObjectKind::Process => call!(self, lldb_process_destroy(h)),
            ObjectKind::Thread => call!(self, lldb_thread_destroy(h)),
            ObjectKind::Frame => call!(self, lldb_frame_destroy(h)),
            ObjectKind::Breakpoint => call!(self, lldb_breakpoint_destroy(h)),
            ObjectKind::BreakpointLocation => call!(self, lldb_breakpoint_location_destroy(h)),
            ObjectKind::Watchpoint => call!(self, lldb_watchpoint_destroy(h)),
            ObjectKind::Value => call!(self, lldb_value_destroy(h)),
            ObjectKind::ValueList => call!(self, lldb_value_list_destroy(h)),
            ObjectKind::Type => call!(self, lldb_type_destroy(h)),
            ObjectKind::Module => call!(self, lldb_module_destroy(h)),
            ObjectKind::SymbolContext => call!(self, lldb_symbol_context_destroy(h)),
            ObjectKind::CommandInterpreter => call!(self, lldb_command_interpreter_destroy(h)),
            ObjectKind::CommandReturnObject => call!(self, lldb_command_return_object_destroy(h)),
        }
    }

    // Debugger

    fn debugger_create(&self) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_debugger_create()))
    }

    fn debugger_create_target(
        &self,
        debugger: RawHandle,
        filename: &str,
        arch: Option<&str>,
        platform: Option<&str>,
        add_dependent_modules: bool,
        status: &mut Status,
    ) -> Option<RawHandle>
    {
        let (Some(filename), Some(arch), Some(platform)) = (c_string(filename), c_string_opt(arch), c_string_opt(platform))
        else {
            status.set_error("target argument contains a NUL byte");
            return None;
        };
        self.with_error(status, |error| {
            adopt(call!(
                self,
                lldb_debugger_create_target(
                    obj(debugger),
                    filename.as_ptr(),
                    opt_ptr(arch.as_ref()),
                    opt_ptr(platform.as_ref()),
                    flag(add_dependent_modules),
                    error,
                )
            ))
        })
    }

    fn debugger_num_targets(&self, debugger: RawHandle) -> u32
    {
        call!(self, lldb_debugger_get_num_targets(obj(debugger)))
    }

    fn debugger_target_at_index(&self, debugger: RawHandle, index: u32) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_debugger_get_target_at_index(obj(debugger), index)))
    }

    fn debugger_selected_target(&self, debugger: RawHandle) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_debugger_get_selected_target(obj(debugger))))
    }

    fn debugger_set_selected_target(&self, debugger: RawHandle, target: RawHandle)
    {
        call!(self, lldb_debugger_set_selected_target(obj(debugger), obj(target)));
    }

    fn debugger_delete_target(&self, debugger: RawHandle, target: RawHandle) -> bool
    {
        truth(call!(self, lldb_debugger_delete_target(obj(debugger), obj(target))))
    }

    fn debugger_find_target_with_process_id(&self, debugger: RawHandle, pid: u64) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_debugger_find_target_with_process_id(obj(debugger), pid)))
    }

    fn debugger_async(&self, debugger: RawHandle) -> bool
    {
        truth(call!(self, lldb_debugger_get_async(obj(debugger))))
    }

    fn debugger_set_async(&self, debugger: RawHandle, is_async: bool)
    {
        call!(self, lldb_debugger_set_async(obj(debugger), flag(is_async)));
    }

    fn debugger_command_interpreter(&self, debugger: RawHandle) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_debugger_get_command_interpreter(obj(debugger))))
    }

    fn debugger_handle_command(&self, debugger: RawHandle, command: &str)
    {
        if let Some(command) = c_string(command) {
            call!(self, lldb_debugger_handle_command(obj(debugger), command.as_ptr()));
        }
    }

    // Target

    fn target_launch(&self, target: RawHandle, info: &LaunchInfo, status: &mut Status) -> Option<RawHandle>
    {
        let launch_info = match self.build_launch_info(info) {
            Ok(launch_info) => launch_info,
            Err(message) => {
                status.set_error(message);
                return None;
            }
        };
        let process = self.with_error(status, |error| adopt(call!(self, lldb_target_launch(obj(target), launch_info, error))));
        call!(self, lldb_launch_info_destroy(launch_info));
        process
    }

    fn target_attach_to_pid(&self, target: RawHandle, pid: u64, status: &mut Status) -> Option<RawHandle>
    {
        self.with_error(status, |error| adopt(call!(self, lldb_target_attach_to_process_with_id(obj(target), pid, error))))
    }

    fn target_attach_to_name(
        &self,
        target: RawHandle,
        name: &str,
        wait_for: bool,
        status: &mut Status,
    ) -> Option<RawHandle>
    {
        let Some(name) = c_string(name) else {
            status.set_error("process name contains a NUL byte");
            return None;
        };
        self.with_error(status, |error| {
            adopt(call!(
                self,
                lldb_target_attach_to_process_with_name(obj(target), name.as_ptr(), flag(wait_for), error)
            ))
        })
    }

    fn target_create_breakpoint(&self, target: RawHandle, spec: &BreakpointSpec) -> Option<RawHandle>
    {
        let t = obj(target);
        let created = match spec {
            BreakpointSpec::Name { symbol, module } => {
                let symbol = c_string(symbol)?;
                let module = c_string_opt(module.as_deref())?;
                call!(self, lldb_target_breakpoint_create_by_name(t, symbol.as_ptr(), opt_ptr(module.as_ref())))
            }
            BreakpointSpec::Location { file, line } => {
                let file = c_string(file)?;
                call!(self, lldb_target_breakpoint_create_by_location(t, file.as_ptr(), *line))
            }
            BreakpointSpec::Address(address) => {
                call_optional!(self, lldb_target_breakpoint_create_by_address(t, *address), ptr::null_mut())
            }
            BreakpointSpec::Regex { pattern, module } => {
                let pattern = c_string(pattern)?;
                let module = c_string_opt(module.as_deref())?;
                call_optional!(
                    self,
                    lldb_target_breakpoint_create_by_regex(t, pattern.as_ptr(), opt_ptr(module.as_ref())),
                    ptr::null_mut()
                )
            }
            BreakpointSpec::SourceRegex { pattern, file } => {
                let pattern = c_string(pattern)?;
                let file = c_string_opt(file.as_deref())?;
                call!(self, lldb_target_breakpoint_create_by_source_regex(t, pattern.as_ptr(), opt_ptr(file.as_ref())))
            }
        };
        adopt(created)
    }

    fn target_delete_breakpoint(&self, target: RawHandle, id: i32) -> bool
    {
        truth(call!(self, lldb_target_delete_breakpoint(obj(target), id)))
    }

    fn target_delete_all_breakpoints(&self, target: RawHandle) -> bool
    {
        truth(call!(self, lldb_target_delete_all_breakpoints(obj(target))))
    }

    fn target_set_all_breakpoints_enabled(&self, target: RawHandle, enabled: bool) -> bool
    {
        let t = obj(target);
        truth(if enabled {
            call!(self, lldb_target_enable_all_breakpoints(t))
        } else {
            call!(self, lldb_target_disable_all_breakpoints(t))
        })
    }

    fn target_find_breakpoint(&self, target: RawHandle, id: i32) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_target_find_breakpoint_by_id(obj(target), id)))
    }

    fn target_num_breakpoints(&self, target: RawHandle) -> u32
    {
        call!(self, lldb_target_get_num_breakpoints(obj(target)))
    }

    fn target_breakpoint_at_index(&self, target: RawHandle, index: u32) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_target_get_breakpoint_at_index(obj(target), index)))
    }

    fn target_process(&self, target: RawHandle) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_target_get_process(obj(target))))
    }

    fn target_executable_path(&self, target: RawHandle) -> Option<String>
    {
        call_text!(self, lldb_target_get_executable_path(obj(target)))
    }

    fn target_num_modules(&self, target: RawHandle) -> u32
    {
        call!(self, lldb_target_get_num_modules(obj(target)))
    }

    fn target_module_at_index(&self, target: RawHandle, index: u32) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_target_get_module_at_index(obj(target), index)))
    }

    fn target_evaluate_expression(&self, target: RawHandle, expression: &str) -> Option<RawHandle>
    {
        let expression = c_string(expression)?;
        adopt(call!(self, lldb_target_evaluate_expression(obj(target), expression.as_ptr())))
    }

    fn target_read_memory(&self, target: RawHandle, address: u64, buf: &mut [u8], status: &mut Status) -> usize
    {
        self.with_error(status, |error| {
            call!(self, lldb_target_read_memory(obj(target), address, buf.as_mut_ptr().cast(), buf.len(), error))
        })
    }

    fn target_address_byte_size(&self, target: RawHandle) -> u32
    {
        call!(self, lldb_target_get_address_byte_size(obj(target)))
    }

    fn target_triple(&self, target: RawHandle) -> Option<String>
    {
        call_text!(self, lldb_target_get_triple(obj(target)))
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
        self.with_error(status, |error| {
            adopt(call!(
                self,
                lldb_target_watch_address(obj(target), address, size, flag(read), flag(write), error)
            ))
        })
    }

    fn target_delete_watchpoint(&self, target: RawHandle, id: i32) -> bool
    {
        truth(call!(self, lldb_target_delete_watchpoint(obj(target), id)))
    }

    fn target_delete_all_watchpoints(&self, target: RawHandle) -> bool
    {
        truth(call!(self, lldb_target_delete_all_watchpoints(obj(target))))
    }

    fn target_find_watchpoint(&self, target: RawHandle, id: i32) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_target_find_watchpoint_by_id(obj(target), id)))
    }

    fn target_num_watchpoints(&self, target: RawHandle) -> u32
    {
        call!(self, lldb_target_get_num_watchpoints(obj(target)))
    }

    fn target_watchpoint_at_index(&self, target: RawHandle, index: u32) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_target_get_watchpoint_at_index(obj(target), index)))
    }

    // Process

    fn process_control(&self, process: RawHandle, control: ProcessControl) -> bool
    {
        let p = obj(process);
        truth(match control {
            ProcessControl::Continue => call!(self, lldb_process_continue(p)),
            ProcessControl::Stop => call!(self, lldb_process_stop(p)),
            ProcessControl::Kill => call!(self, lldb_process_kill(p)),
            ProcessControl::Detach => call!(self, lldb_process_detach(p)),
            ProcessControl::Destroy => call!(self, lldb_process_destroy_process(p)),
            ProcessControl::SendAsyncInterrupt => call!(self, lldb_process_send_async_interrupt(p)),
        })
    }

    fn process_signal(&self, process: RawHandle, signal: i32) -> bool
    {
        truth(call!(self, lldb_process_signal(obj(process), signal)))
    }

    fn process_state(&self, process: RawHandle) -> i32
    {
        call!(self, lldb_process_get_state(obj(process)))
    }

    fn process_num_threads(&self, process: RawHandle) -> u32
    {
        call!(self, lldb_process_get_num_threads(obj(process)))
    }

    fn process_thread_at_index(&self, process: RawHandle, index: u32) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_process_get_thread_at_index(obj(process), index)))
    }

    fn process_thread_by_id(&self, process: RawHandle, tid: u64) -> Option<RawHandle>
    {
        adopt(call_optional!(self, lldb_process_get_thread_by_id(obj(process), tid), ptr::null_mut()))
    }

    fn process_thread_by_index_id(&self, process: RawHandle, index_id: u32) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_process_get_thread_by_index_id(obj(process), index_id)))
    }

    fn process_selected_thread(&self, process: RawHandle) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_process_get_selected_thread(obj(process))))
    }

    fn process_select_thread_by_id(&self, process: RawHandle, tid: u64) -> bool
    {
        truth(call!(self, lldb_process_set_selected_thread_by_id(obj(process), tid)))
    }

    fn process_select_thread_by_index_id(&self, process: RawHandle, index_id: u32) -> bool
    {
        truth(call!(self, lldb_process_set_selected_thread_by_index_id(obj(process), index_id)))
    }

    fn process_pid(&self, process: RawHandle) -> u64
    {
        call!(self, lldb_process_get_process_id(obj(process)))
    }

    fn process_exit_status(&self, process: RawHandle) -> i32
    {
        call!(self, lldb_process_get_exit_status(obj(process)))
    }

    fn process_exit_description(&self, process: RawHandle) -> Option<String>
    {
        call_text!(self, lldb_process_get_exit_description(obj(process)))
    }

    fn process_read_memory(&self, process: RawHandle, address: u64, buf: &mut [u8], status: &mut Status) -> usize
    {
        self.with_error(status, |error| {
            call_optional!(
                self,
                lldb_process_read_memory(obj(process), address, buf.as_mut_ptr().cast(), buf.len(), error),
                0
            )
        })
    }

    fn process_write_memory(&self, process: RawHandle, address: u64, data: &[u8], status: &mut Status) -> usize
    {
        self.with_error(status, |error| {
            call_optional!(
                self,
                lldb_process_write_memory(obj(process), address, data.as_ptr().cast(), data.len(), error),
                0
            )
        })
    }

    fn process_allocate_memory(&self, process: RawHandle, size: usize, permissions: u32, status: &mut Status) -> u64
    {
        self.with_error(status, |error| {
            call!(self, lldb_process_allocate_memory(obj(process), size, permissions, error))
        })
    }

    fn process_deallocate_memory(&self, process: RawHandle, address: u64) -> bool
    {
        truth(call!(self, lldb_process_deallocate_memory(obj(process), address)))
    }

    fn process_read_cstring(&self, process: RawHandle, address: u64, buf: &mut [u8], status: &mut Status) -> usize
    {
        self.with_error(status, |error| {
            call!(
                self,
                lldb_process_read_cstring_from_memory(obj(process), address, buf.as_mut_ptr().cast(), buf.len(), error)
            )
        })
    }

    fn process_read_output(&self, process: RawHandle, stream: OutputStream, buf: &mut [u8]) -> usize
    {
        let p = obj(process);
        match stream {
            OutputStream::Stdout => call!(self, lldb_process_get_stdout(p, buf.as_mut_ptr().cast(), buf.len())),
            OutputStream::Stderr => call!(self, lldb_process_get_stderr(p, buf.as_mut_ptr().cast(), buf.len())),
        }
    }

    fn process_put_stdin(&self, process: RawHandle, data: &[u8]) -> usize
    {
        call!(self, lldb_process_put_stdin(obj(process), data.as_ptr().cast(), data.len()))
    }

    fn process_num_supported_hardware_watchpoints(&self, process: RawHandle, status: &mut Status) -> u32
    {
        self.with_error(status, |error| {
            call!(self, lldb_process_get_num_supported_hardware_watchpoints(obj(process), error))
        })
    }

    fn process_unique_id(&self, process: RawHandle) -> u32
    {
        call!(self, lldb_process_get_unique_id(obj(process)))
    }

    fn process_memory_region_info(
        &self,
        process: RawHandle,
        address: u64,
        status: &mut Status,
    ) -> Option<MemoryRegionInfo>
    {
        let region = self.with_error(status, |error| {
            adopt(call_optional!(
                self,
                lldb_process_get_memory_region_info(obj(process), address, error),
                ptr::null_mut()
            ))
        });
        let r = unless_failed(status, region, |stray| {
            call!(self, lldb_memory_region_info_destroy(stray));
        })?;
        let info = MemoryRegionInfo {
            base: call!(self, lldb_memory_region_info_get_region_base(r)),
            end: call!(self, lldb_memory_region_info_get_region_end(r)),
            readable: truth(call!(self, lldb_memory_region_info_is_readable(r))),
            writable: truth(call!(self, lldb_memory_region_info_is_writable(r))),
            executable: truth(call!(self, lldb_memory_region_info_is_executable(r))),
            mapped: truth(call!(self, lldb_memory_region_info_is_mapped(r))),
            name: call_text!(self, lldb_memory_region_info_get_name(r)),
        };
        call!(self, lldb_memory_region_info_destroy(r));
        Some(info)
    }

    // Thread

    fn thread_step(&self, thread: RawHandle, kind: StepKind) -> bool
    {
        let t = obj(thread);
        truth(match kind {
            StepKind::Over => call_optional!(self, lldb_thread_step_over(t), 0),
            StepKind::Into => call_optional!(self, lldb_thread_step_into(t), 0),
            StepKind::Out => call_optional!(self, lldb_thread_step_out(t), 0),
            StepKind::Instruction { over_calls } => {
                call_optional!(self, lldb_thread_step_instruction(t, flag(over_calls)), 0)
            }
        })
    }

    fn thread_run_to_address(&self, thread: RawHandle, address: u64) -> bool
    {
        truth(call!(self, lldb_thread_run_to_address(obj(thread), address)))
    }

    fn thread_num_frames(&self, thread: RawHandle) -> u32
    {
        call!(self, lldb_thread_get_num_frames(obj(thread)))
    }

    fn thread_frame_at_index(&self, thread: RawHandle, index: u32) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_thread_get_frame_at_index(obj(thread), index)))
    }

    fn thread_selected_frame(&self, thread: RawHandle) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_thread_get_selected_frame(obj(thread))))
    }

    fn thread_select_frame(&self, thread: RawHandle, index: u32) -> bool
    {
        truth(call!(self, lldb_thread_set_selected_frame(obj(thread), index)))
    }

    fn thread_id(&self, thread: RawHandle) -> u64
    {
        call!(self, lldb_thread_get_thread_id(obj(thread)))
    }

    fn thread_index_id(&self, thread: RawHandle) -> u32
    {
        call!(self, lldb_thread_get_index_id(obj(thread)))
    }

    fn thread_name(&self, thread: RawHandle) -> Option<String>
    {
        call_text!(self, lldb_thread_get_name(obj(thread)))
    }

    fn thread_queue_name(&self, thread: RawHandle) -> Option<String>
    {
        call_text!(self, lldb_thread_get_queue_name(obj(thread)))
    }

    fn thread_stop_reason(&self, thread: RawHandle) -> i32
    {
        call!(self, lldb_thread_get_stop_reason(obj(thread)))
    }

    fn thread_stop_description(&self, thread: RawHandle, max_len: usize) -> Option<String>
    {
        call_text!(self, lldb_thread_get_stop_description(obj(thread), max_len))
    }

    fn thread_stop_reason_data_count(&self, thread: RawHandle) -> u64
    {
        call!(self, lldb_thread_get_stop_reason_data_count(obj(thread)))
    }

    fn thread_stop_reason_data_at_index(&self, thread: RawHandle, index: u32) -> u64
    {
        call!(self, lldb_thread_get_stop_reason_data_at_index(obj(thread), index))
    }

    fn thread_is_stopped(&self, thread: RawHandle) -> bool
    {
        truth(call!(self, lldb_thread_is_stopped(obj(thread))))
    }

    fn thread_is_suspended(&self, thread: RawHandle) -> bool
    {
        truth(call!(self, lldb_thread_is_suspended(obj(thread))))
    }

    fn thread_set_suspended(&self, thread: RawHandle, suspended: bool) -> bool
    {
        let t = obj(thread);
        truth(if suspended {
            call!(self, lldb_thread_suspend(t))
        } else {
            call!(self, lldb_thread_resume(t))
        })
    }

    fn thread_process(&self, thread: RawHandle) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_thread_get_process(obj(thread))))
    }

    // Frame

    fn frame_text(&self, frame: RawHandle, text: FrameText) -> Option<String>
    {
        let f = obj(frame);
        match text {
            FrameText::FunctionName => call_text!(self, lldb_frame_get_function_name(f)),
            FrameText::DisplayFunctionName => call_text!(self, lldb_frame_get_display_function_name(f)),
            FrameText::FilePath => call_text!(self, lldb_frame_get_file_path(f)),
            FrameText::Disassembly => call_text!(self, lldb_frame_disassemble(f)),
        }
    }

    fn frame_line(&self, frame: RawHandle) -> u32
    {
        call!(self, lldb_frame_get_line(obj(frame)))
    }

    fn frame_column(&self, frame: RawHandle) -> u32
    {
        call!(self, lldb_frame_get_column(obj(frame)))
    }

    fn frame_register(&self, frame: RawHandle, register: FrameRegister) -> u64
    {
        let f = obj(frame);
        match register {
            FrameRegister::Pc => call!(self, lldb_frame_get_pc(f)),
            FrameRegister::Sp => call!(self, lldb_frame_get_sp(f)),
            FrameRegister::Fp => call!(self, lldb_frame_get_fp(f)),
        }
    }

    fn frame_set_pc(&self, frame: RawHandle, pc: u64) -> bool
    {
        truth(call!(self, lldb_frame_set_pc(obj(frame), pc)))
    }

    fn frame_find_variable(&self, frame: RawHandle, name: &str) -> Option<RawHandle>
    {
        let name = c_string(name)?;
        adopt(call_optional!(self, lldb_frame_find_variable(obj(frame), name.as_ptr()), ptr::null_mut()))
    }

    fn frame_evaluate_expression(&self, frame: RawHandle, expression: &str) -> Option<RawHandle>
    {
        let expression = c_string(expression)?;
        adopt(call_optional!(
            self,
            lldb_frame_evaluate_expression(obj(frame), expression.as_ptr()),
            ptr::null_mut()
        ))
    }

    fn frame_value_for_variable_path(&self, frame: RawHandle, path: &str) -> Option<RawHandle>
    {
        let path = c_string(path)?;
        adopt(call!(self, lldb_frame_get_value_for_variable_path(obj(frame), path.as_ptr())))
    }

    fn frame_id(&self, frame: RawHandle) -> u32
    {
        call!(self, lldb_frame_get_frame_id(obj(frame)))
    }

    fn frame_thread(&self, frame: RawHandle) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_frame_get_thread(obj(frame))))
    }

    fn frame_symbol_context(&self, frame: RawHandle, scope: SymbolContextItem) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_frame_get_symbol_context(obj(frame), scope.bits())))
    }

    fn frame_variables(&self, frame: RawHandle, options: VariableOptions) -> Option<RawHandle>
    {
        adopt(call!(
            self,
            lldb_frame_get_variables(
                obj(frame),
                flag(options.arguments),
                flag(options.locals),
                flag(options.statics),
                flag(options.in_scope_only),
            )
        ))
    }

    fn frame_registers(&self, frame: RawHandle) -> Option<RawHandle>
    {
        adopt(call_optional!(self, lldb_frame_get_registers(obj(frame)), ptr::null_mut()))
    }

    fn frame_is_inlined(&self, frame: RawHandle) -> bool
    {
        truth(call!(self, lldb_frame_is_inlined(obj(frame))))
    }

    fn frame_module(&self, frame: RawHandle) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_frame_get_module(obj(frame))))
    }

    // Stop points

    fn stop_point_id(&self, kind: ObjectKind, handle: RawHandle) -> i32
    {
        let h = obj(handle);
        match kind {
            ObjectKind::Breakpoint => call!(self, lldb_breakpoint_get_id(h)),
            ObjectKind::BreakpointLocation => call!(self, lldb_breakpoint_location_get_id(h)),
            ObjectKind::Watchpoint => call!(self, lldb_watchpoint_get_id(h)),
            _ => -1,
        }
    }

    fn stop_point_is_enabled(&self, kind: ObjectKind, handle: RawHandle) -> bool
    {
        let h = obj(handle);
        truth(match kind {
            ObjectKind::Breakpoint => call!(self, lldb_breakpoint_is_enabled(h)),
            ObjectKind::BreakpointLocation => call!(self, lldb_breakpoint_location_is_enabled(h)),
            ObjectKind::Watchpoint => call!(self, lldb_watchpoint_is_enabled(h)),
            _ => 0,
        })
    }

    fn stop_point_set_enabled(&self, kind: ObjectKind, handle: RawHandle, enabled: bool)
    {
        let (h, enabled) = (obj(handle), flag(enabled));
        match kind {
            ObjectKind::Breakpoint => call!(self, lldb_breakpoint_set_enabled(h, enabled)),
            ObjectKind::BreakpointLocation => call!(self, lldb_breakpoint_location_set_enabled(h, enabled)),
            ObjectKind::Watchpoint => call!(self, lldb_watchpoint_set_enabled(h, enabled)),
            _ => {}
        }
    }

    fn stop_point_hit_count(&self, kind: ObjectKind, handle: RawHandle) -> u32
    {
        let h = obj(handle);
        match kind {
            ObjectKind::Breakpoint => call!(self, lldb_breakpoint_get_hit_count(h)),
            ObjectKind::BreakpointLocation => call!(self, lldb_breakpoint_location_get_hit_count(h)),
            ObjectKind::Watchpoint => call!(self, lldb_watchpoint_get_hit_count(h)),
            _ => 0,
        }
    }

    fn stop_point_ignore_count(&self, kind: ObjectKind, handle: RawHandle) -> u32
    {
        let h = obj(handle);
        match kind {
            ObjectKind::Breakpoint => call!(self, lldb_breakpoint_get_ignore_count(h)),
            ObjectKind::BreakpointLocation => call!(self, lldb_breakpoint_location_get_ignore_count(h)),
            ObjectKind::Watchpoint => call!(self, lldb_watchpoint_get_ignore_count(h)),
            _ => 0,
        }
    }

    fn stop_point_set_ignore_count(&self, kind: ObjectKind, handle: RawHandle, count: u32)
    {
        let h = obj(handle);
        match kind {
            ObjectKind::Breakpoint => call!(self, lldb_breakpoint_set_ignore_count(h, count)),
            ObjectKind::BreakpointLocation => call!(self, lldb_breakpoint_location_set_ignore_count(h, count)),
            ObjectKind::Watchpoint => call!(self, lldb_watchpoint_set_ignore_count(h, count)),
            _ => {}
        }
    }

    fn stop_point_condition(&self, kind: ObjectKind, handle: RawHandle) -> Option<String>
    {
        let h = obj(handle);
        match kind {
            ObjectKind::Breakpoint => call_text!(self, lldb_breakpoint_get_condition(h)),
            ObjectKind::BreakpointLocation => call_text!(self, lldb_breakpoint_location_get_condition(h)),
            ObjectKind::Watchpoint => call_text!(self, lldb_watchpoint_get_condition(h)),
            _ => None,
        }
    }

    fn stop_point_set_condition(&self, kind: ObjectKind, handle: RawHandle, condition: Option<&str>)
    {
        let Some(condition) = c_string_opt(condition) else {
            return;
        };
        let (h, c) = (obj(handle), opt_ptr(condition.as_ref()));
        match kind {
            ObjectKind::Breakpoint => call!(self, lldb_breakpoint_set_condition(h, c)),
            ObjectKind::BreakpointLocation => call!(self, lldb_breakpoint_location_set_condition(h, c)),
            ObjectKind::Watchpoint => call!(self, lldb_watchpoint_set_condition(h, c)),
            _ => {}
        }
    }

    // Breakpoint

    fn breakpoint_is_one_shot(&self, breakpoint: RawHandle) -> bool
    {
        truth(call!(self, lldb_breakpoint_is_one_shot(obj(breakpoint))))
    }

    fn breakpoint_set_one_shot(&self, breakpoint: RawHandle, one_shot: bool)
    {
        call!(self, lldb_breakpoint_set_one_shot(obj(breakpoint), flag(one_shot)));
    }

    fn breakpoint_num_locations(&self, breakpoint: RawHandle) -> u32
    {
        call!(self, lldb_breakpoint_get_num_locations(obj(breakpoint)))
    }

    fn breakpoint_location_at_index(&self, breakpoint: RawHandle, index: u32) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_breakpoint_get_location_at_index(obj(breakpoint), index)))
    }

    fn breakpoint_find_location(&self, breakpoint: RawHandle, id: i32) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_breakpoint_find_location_by_id(obj(breakpoint), id)))
    }

    fn breakpoint_is_hardware(&self, breakpoint: RawHandle) -> bool
    {
        truth(call!(self, lldb_breakpoint_is_hardware(obj(breakpoint))))
    }

    fn breakpoint_auto_continue(&self, breakpoint: RawHandle) -> bool
    {
        truth(call!(self, lldb_breakpoint_get_auto_continue(obj(breakpoint))))
    }

    fn breakpoint_set_auto_continue(&self, breakpoint: RawHandle, auto_continue: bool)
    {
        call!(self, lldb_breakpoint_set_auto_continue(obj(breakpoint), flag(auto_continue)));
    }

    fn breakpoint_thread_id(&self, breakpoint: RawHandle) -> u64
    {
        call!(self, lldb_breakpoint_get_thread_id(obj(breakpoint)))
    }

    fn breakpoint_set_thread_id(&self, breakpoint: RawHandle, tid: u64)
    {
        call!(self, lldb_breakpoint_set_thread_id(obj(breakpoint), tid));
    }

    fn breakpoint_thread_name(&self, breakpoint: RawHandle) -> Option<String>
    {
        call_text!(self, lldb_breakpoint_get_thread_name(obj(breakpoint)))
    }

    fn breakpoint_set_thread_name(&self, breakpoint: RawHandle, name: Option<&str>)
    {
        if let Some(name) = c_string_opt(name) {
            call!(self, lldb_breakpoint_set_thread_name(obj(breakpoint), opt_ptr(name.as_ref())));
        }
    }

    fn breakpoint_thread_index(&self, breakpoint: RawHandle) -> u32
    {
        call!(self, lldb_breakpoint_get_thread_index(obj(breakpoint)))
    }

    fn breakpoint_set_thread_index(&self, breakpoint: RawHandle, index: u32)
    {
        call!(self, lldb_breakpoint_set_thread_index(obj(breakpoint), index));
    }

    // Breakpoint location

    fn location_load_address(&self, location: RawHandle) -> u64
    {
        call!(self, lldb_breakpoint_location_get_load_address(obj(location)))
    }

    fn location_breakpoint(&self, location: RawHandle) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_breakpoint_location_get_breakpoint(obj(location))))
    }

    // Watchpoint

    fn watchpoint_address(&self, watchpoint: RawHandle) -> u64
    {
        call!(self, lldb_watchpoint_get_watch_address(obj(watchpoint)))
    }

    fn watchpoint_size(&self, watchpoint: RawHandle) -> usize
    {
        call!(self, lldb_watchpoint_get_watch_size(obj(watchpoint)))
    }

    fn watchpoint_is_watching_reads(&self, watchpoint: RawHandle) -> bool
    {
        truth(call!(self, lldb_watchpoint_is_watching_reads(obj(watchpoint))))
    }

    fn watchpoint_is_watching_writes(&self, watchpoint: RawHandle) -> bool
    {
        truth(call!(self, lldb_watchpoint_is_watching_writes(obj(watchpoint))))
    }

    // Value

    fn value_text(&self, value: RawHandle, text: ValueText) -> Option<String>
    {
        let v = obj(value);
        match text {
            ValueText::Name => call_text!(self, lldb_value_get_name(v)),
            ValueText::Value => call_text!(self, lldb_value_get_value(v)),
            ValueText::Summary => call_text!(self, lldb_value_get_summary(v)),
            ValueText::TypeName => call_text!(self, lldb_value_get_type_name(v)),
            ValueText::ExpressionPath => call_text!(self, lldb_value_get_expression_path(v)),
        }
    }

    fn value_type(&self, value: RawHandle) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_value_get_type(obj(value))))
    }

    fn value_num_children(&self, value: RawHandle) -> u32
    {
        call!(self, lldb_value_get_num_children(obj(value)))
    }

    fn value_child_at_index(&self, value: RawHandle, index: u32) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_value_get_child_at_index(obj(value), index)))
    }

    fn value_child_member_with_name(&self, value: RawHandle, name: &str) -> Option<RawHandle>
    {
        let name = c_string(name)?;
        adopt(call!(self, lldb_value_get_child_member_with_name(obj(value), name.as_ptr())))
    }

    fn value_as_signed(&self, value: RawHandle) -> i64
    {
        call!(self, lldb_value_get_value_as_signed(obj(value)))
    }

    fn value_as_unsigned(&self, value: RawHandle) -> u64
    {
        call!(self, lldb_value_get_value_as_unsigned(obj(value)))
    }

    fn value_byte_size(&self, value: RawHandle) -> u64
    {
        call!(self, lldb_value_get_byte_size(obj(value)))
    }

    fn value_might_have_children(&self, value: RawHandle) -> bool
    {
        truth(call!(self, lldb_value_might_have_children(obj(value))))
    }

    fn value_error(&self, value: RawHandle, status: &mut Status)
    {
        self.with_error(status, |error| call!(self, lldb_value_get_error(obj(value), error)));
    }

    fn value_derive(&self, value: RawHandle, derivation: ValueDerivation) -> Option<RawHandle>
    {
        let v = obj(value);
        adopt(match derivation {
            ValueDerivation::Dereference => call!(self, lldb_value_dereference(v)),
            ValueDerivation::AddressOf => call!(self, lldb_value_address_of(v)),
            ValueDerivation::NonSynthetic => call!(self, lldb_value_get_non_synthetic_value(v)),
        })
    }

    fn value_cast(&self, value: RawHandle, ty: RawHandle) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_value_cast(obj(value), obj(ty))))
    }

    fn value_load_address(&self, value: RawHandle) -> u64
    {
        call!(self, lldb_value_get_load_address(obj(value)))
    }

    fn value_value_type(&self, value: RawHandle) -> i32
    {
        call!(self, lldb_value_get_value_type(obj(value)))
    }

    fn value_set_from_str(&self, value: RawHandle, text: &str, status: &mut Status) -> bool
    {
        let Some(text) = c_string(text) else {
            status.set_error("value text contains a NUL byte");
            return false;
        };
        self.with_error(status, |error| {
            truth(call!(self, lldb_value_set_value_from_cstring(obj(value), text.as_ptr(), error)))
        })
    }

    fn value_create_child_at_offset(&self, value: RawHandle, name: &str, ty: RawHandle, offset: u32)
        -> Option<RawHandle>
    {
        let name = c_string(name)?;
        adopt(call!(self, lldb_value_create_child_at_offset(obj(value), name.as_ptr(), obj(ty), offset)))
    }

    fn value_create_from_address(&self, value: RawHandle, name: &str, address: u64, ty: RawHandle)
        -> Option<RawHandle>
    {
        let name = c_string(name)?;
        adopt(call!(
            self,
            lldb_value_create_value_from_address(obj(value), name.as_ptr(), address, obj(ty))
        ))
    }

    fn value_create_from_expression(&self, value: RawHandle, name: &str, expression: &str) -> Option<RawHandle>
    {
        let name = c_string(name)?;
        let expression = c_string(expression)?;
        adopt(call!(
            self,
            lldb_value_create_value_from_expression(obj(value), name.as_ptr(), expression.as_ptr())
        ))
    }

    fn value_watch(
        &self,
        value: RawHandle,
        resolve_location: bool,
        read: bool,
        write: bool,
        status: &mut Status,
    ) -> Option<RawHandle>
    {
        self.with_error(status, |error| {
            adopt(call!(
                self,
                lldb_value_watch(obj(value), flag(resolve_location), flag(read), flag(write), error)
            ))
        })
    }

    fn value_is_pointer_type(&self, value: RawHandle) -> bool
    {
        truth(call!(self, lldb_value_is_pointer_type(obj(value))))
    }

    // Value list

    fn value_list_size(&self, list: RawHandle) -> u32
    {
        call!(self, lldb_value_list_get_size(obj(list)))
    }

    fn value_list_at_index(&self, list: RawHandle, index: u32) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_value_list_get_value_at_index(obj(list), index)))
    }

    fn value_list_first_by_name(&self, list: RawHandle, name: &str) -> Option<RawHandle>
    {
        let name = c_string(name)?;
        adopt(call!(self, lldb_value_list_get_first_value_by_name(obj(list), name.as_ptr())))
    }

    // Type

    fn type_name(&self, ty: RawHandle, display: bool) -> Option<String>
    {
        let t = obj(ty);
        if display {
            call_text!(self, lldb_type_get_display_type_name(t))
        } else {
            call_text!(self, lldb_type_get_name(t))
        }
    }

    fn type_has_trait(&self, ty: RawHandle, type_trait: TypeTrait) -> bool
    {
        let t = obj(ty);
        truth(match type_trait {
            TypeTrait::Pointer => call!(self, lldb_type_is_pointer_type(t)),
            TypeTrait::Reference => call!(self, lldb_type_is_reference_type(t)),
            TypeTrait::Array => call!(self, lldb_type_is_array_type(t)),
            TypeTrait::Vector => call!(self, lldb_type_is_vector_type(t)),
            TypeTrait::Typedef => call!(self, lldb_type_is_typedef_type(t)),
            TypeTrait::Function => call!(self, lldb_type_is_function_type(t)),
            TypeTrait::PolymorphicClass => call!(self, lldb_type_is_polymorphic_class(t)),
        })
    }

    fn type_derive(&self, ty: RawHandle, derivation: TypeDerivation) -> Option<RawHandle>
    {
        let t = obj(ty);
        adopt(match derivation {
            TypeDerivation::Pointer => call!(self, lldb_type_get_pointer_type(t)),
            TypeDerivation::Pointee => call!(self, lldb_type_get_pointee_type(t)),
            TypeDerivation::Reference => call!(self, lldb_type_get_reference_type(t)),
            TypeDerivation::Dereferenced => call!(self, lldb_type_get_dereferenced_type(t)),
            TypeDerivation::Unqualified => call!(self, lldb_type_get_unqualified_type(t)),
            TypeDerivation::Canonical => call!(self, lldb_type_get_canonical_type(t)),
            TypeDerivation::ArrayElement => call!(self, lldb_type_get_array_element_type(t)),
        })
    }

    fn type_count(&self, ty: RawHandle, count: TypeCount) -> u64
    {
        let t = obj(ty);
        match count {
            TypeCount::ByteSize => call!(self, lldb_type_get_byte_size(t)),
            TypeCount::ArraySize => call!(self, lldb_type_get_array_size(t)),
            TypeCount::Fields => u64::from(call!(self, lldb_type_get_num_fields(t))),
            TypeCount::DirectBaseClasses => u64::from(call!(self, lldb_type_get_num_direct_base_classes(t))),
            TypeCount::VirtualBaseClasses => u64::from(call!(self, lldb_type_get_num_virtual_base_classes(t))),
        }
    }

    fn type_basic_type(&self, ty: RawHandle) -> i32
    {
        call!(self, lldb_type_get_basic_type(obj(ty)))
    }

    // Module and symbol context

    fn module_file_path(&self, module: RawHandle, platform: bool) -> Option<String>
    {
        let m = obj(module);
        if platform {
            call_text!(self, lldb_module_get_platform_file_path(m))
        } else {
            call_text!(self, lldb_module_get_file_path(m))
        }
    }

    fn module_num_symbols(&self, module: RawHandle) -> u32
    {
        call!(self, lldb_module_get_num_symbols(obj(module)))
    }

    fn symbol_context_module(&self, context: RawHandle) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_symbol_context_get_module(obj(context))))
    }

    fn symbol_context_function_name(&self, context: RawHandle) -> Option<String>
    {
        call_text!(self, lldb_symbol_context_get_function_name(obj(context)))
    }

    // Command interpreter

    fn command_return_object_create(&self) -> Option<RawHandle>
    {
        adopt(call!(self, lldb_command_return_object_create()))
    }

    fn interpreter_handle_command(
        &self,
        interpreter: RawHandle,
        command: &str,
        result: RawHandle,
        add_to_history: bool,
    ) -> i32
    {
        let Some(command) = c_string(command) else {
            return 0;
        };
        call!(
            self,
            lldb_command_interpreter_handle_command(obj(interpreter), command.as_ptr(), obj(result), flag(add_to_history))
        )
    }

    fn interpreter_command_exists(&self, interpreter: RawHandle, command: &str) -> bool
    {
        c_string(command)
            .is_some_and(|command| truth(call!(self, lldb_command_interpreter_command_exists(obj(interpreter), command.as_ptr()))))
    }

    fn interpreter_alias_exists(&self, interpreter: RawHandle, alias: &str) -> bool
    {
        c_string(alias)
            .is_some_and(|alias| truth(call!(self, lldb_command_interpreter_alias_exists(obj(interpreter), alias.as_ptr()))))
    }

    fn return_object_text(&self, result: RawHandle, text: ReturnText) -> Option<String>
    {
        let r = obj(result);
        match text {
            ReturnText::Output => call_text!(self, lldb_command_return_object_get_output(r)),
            ReturnText::Error => call_text!(self, lldb_command_return_object_get_error(r)),
        }
    }

    fn return_object_succeeded(&self, result: RawHandle) -> bool
    {
        truth(call!(self, lldb_command_return_object_succeeded(obj(result))))
    }

    fn return_object_clear(&self, result: RawHandle)
    {
        call!(self, lldb_command_return_object_clear(obj(result)));
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_open_missing_library_fails()
    {
        let result = NativeEngine::open(Path::new("/nonexistent/liblldb_wrapper.so"));
        assert!(matches!(result, Err(LldbindError::LibraryLoad(_))));
    }

    #[test]
    fn test_null_terminated_argv()
    {
        let args = c_strings(&["--verbose".to_string(), "input.txt".to_string()]).unwrap();
        let argv = null_terminated(&args);
        assert_eq!(argv.len(), 3);
        assert!(argv[2].is_null());
        assert!(!argv[0].is_null());
    }

    #[test]
    fn test_nul_bytes_are_rejected()
    {
        assert!(c_string("ma\0in").is_none());
        assert!(c_string_opt(Some("ma\0in")).is_none());
        assert_eq!(c_string_opt(None), Some(None));
        assert!(c_strings(&["ok".to_string(), "b\0ad".to_string()]).is_none());
    }

    #[test]
    fn test_copy_c_str()
    {
        let text = CString::new("lldb version 17.0.6").unwrap();
        // SAFETY: text is a live NUL-terminated string.
        assert_eq!(unsafe { copy_c_str(text.as_ptr()) }.as_deref(), Some("lldb version 17.0.6"));
        // SAFETY: null is accepted.
        assert_eq!(unsafe { copy_c_str(ptr::null()) }, None);
    }

    #[test]
    fn test_failed_call_releases_returned_object()
    {
        let region = RawHandle::new(0x7f00_1000);
        let mut released = Vec::new();

        let mut status = Status::new();
        let kept = unless_failed(&status, region, |stray| released.push(stray as usize));
        assert_eq!(kept.map(|object| object as usize), Some(0x7f00_1000));
        assert!(released.is_empty());

        status.set_error("error: region lookup failed");
        assert!(unless_failed(&status, region, |stray| released.push(stray as usize)).is_none());
        assert_eq!(released, [0x7f00_1000]);

        assert!(unless_failed(&status, None, |stray| released.push(stray as usize)).is_none());
        assert_eq!(released.len(), 1);
    }
}
