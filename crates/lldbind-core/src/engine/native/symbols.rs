//! Entry point table of the wrapper library.
//!
//! Required entry points must all resolve or loading fails. Optional entry
//! points back a [`Feature`](crate::capability::Feature) and are `None` when
//! the library was built without them.

use std::ffi::{c_char, c_int, c_void};

use super::library::Library;
use crate::error::{LldbindError, LldbindResult};

/// Opaque object pointer
pub(crate) type Obj = *mut c_void;
/// Borrowed C string
pub(crate) type Str = *const c_char;

macro_rules! entry_points {
    (
        required { $($req:ident: fn($($req_arg:ty),*) $(-> $req_ret:ty)?;)* }
        optional { $($opt:ident: fn($($opt_arg:ty),*) $(-> $opt_ret:ty)?;)* }
    ) => {
        /// Resolved function pointers, one field per exported symbol
        pub(crate) struct EntryPoints
        {
            $(pub(crate) $req: unsafe extern "C" fn($($req_arg),*) $(-> $req_ret)?,)*
            $(pub(crate) $opt: Option<unsafe extern "C" fn($($opt_arg),*) $(-> $opt_ret)?>,)*
        }

        impl EntryPoints
        {
            /// Resolve every entry point from `library`.
            ///
            /// ## Errors
            ///
            /// Returns [`LldbindError::LibraryLoad`] naming the first missing
            /// required symbol.
            pub(crate) fn resolve(library: &Library) -> LldbindResult<Self>
            {
                Ok(Self {
                    $($req: {
                        let address = library.symbol(stringify!($req)).ok_or_else(|| missing(library, stringify!($req)))?;
                        // SAFETY: the symbol is declared with this signature in lldb_wrapper.h.
                        unsafe { std::mem::transmute::<*mut c_void, unsafe extern "C" fn($($req_arg),*) $(-> $req_ret)?>(address) }
                    },)*
                    $($opt: library.symbol(stringify!($opt)).map(|address| {
                        // SAFETY: the symbol is declared with this signature in lldb_wrapper.h.
                        unsafe { std::mem::transmute::<*mut c_void, unsafe extern "C" fn($($opt_arg),*) $(-> $opt_ret)?>(address) }
                    }),)*
                })
            }
        }
    };
}

fn missing(library: &Library, symbol: &str) -> LldbindError
{
    LldbindError::LibraryLoad(format!("{}: missing symbol {symbol}", library.path().display()))
}

entry_points! {
    required {
        lldb_initialize: fn();
        lldb_terminate: fn();

        lldb_error_create: fn() -> Obj;
        lldb_error_destroy: fn(Obj);
        lldb_error_fail: fn(Obj) -> c_int;
        lldb_error_get_cstring: fn(Obj) -> Str;
        lldb_error_get_error: fn(Obj) -> u32;

        lldb_debugger_create: fn() -> Obj;
        lldb_debugger_destroy: fn(Obj);
        lldb_debugger_is_valid: fn(Obj) -> c_int;
        lldb_debugger_create_target: fn(Obj, Str, Str, Str, c_int, Obj) -> Obj;
        lldb_debugger_get_num_targets: fn(Obj) -> u32;
        lldb_debugger_get_target_at_index: fn(Obj, u32) -> Obj;
        lldb_debugger_get_selected_target: fn(Obj) -> Obj;
        lldb_debugger_set_selected_target: fn(Obj, Obj);
        lldb_debugger_delete_target: fn(Obj, Obj) -> c_int;
        lldb_debugger_find_target_with_process_id: fn(Obj, u64) -> Obj;
        lldb_debugger_set_async: fn(Obj, c_int);
        lldb_debugger_get_async: fn(Obj) -> c_int;
        lldb_debugger_get_version_string: fn() -> Str;
        lldb_debugger_get_command_interpreter: fn(Obj) -> Obj;
        lldb_debugger_handle_command: fn(Obj, Str);

        lldb_target_destroy: fn(Obj);
        lldb_target_is_valid: fn(Obj) -> c_int;
        lldb_target_launch: fn(Obj, Obj, Obj) -> Obj;
        lldb_target_attach_to_process_with_id: fn(Obj, u64, Obj) -> Obj;
        lldb_target_attach_to_process_with_name: fn(Obj, Str, c_int, Obj) -> Obj;
        lldb_target_breakpoint_create_by_name: fn(Obj, Str, Str) -> Obj;
        lldb_target_breakpoint_create_by_location: fn(Obj, Str, u32) -> Obj;
        lldb_target_breakpoint_create_by_source_regex: fn(Obj, Str, Str) -> Obj;
        lldb_target_delete_breakpoint: fn(Obj, i32) -> c_int;
        lldb_target_delete_all_breakpoints: fn(Obj) -> c_int;
        lldb_target_enable_all_breakpoints: fn(Obj) -> c_int;
        lldb_target_disable_all_breakpoints: fn(Obj) -> c_int;
        lldb_target_find_breakpoint_by_id: fn(Obj, i32) -> Obj;
        lldb_target_get_num_breakpoints: fn(Obj) -> u32;
        lldb_target_get_breakpoint_at_index: fn(Obj, u32) -> Obj;
        lldb_target_get_process: fn(Obj) -> Obj;
        lldb_target_get_executable_path: fn(Obj) -> Str;
        lldb_target_get_num_modules: fn(Obj) -> u32;
        lldb_target_get_module_at_index: fn(Obj, u32) -> Obj;
        lldb_target_evaluate_expression: fn(Obj, Str) -> Obj;
        lldb_target_read_memory: fn(Obj, u64, *mut c_void, usize, Obj) -> usize;
        lldb_target_get_address_byte_size: fn(Obj) -> u32;
        lldb_target_get_triple: fn(Obj) -> Str;
        lldb_target_watch_address: fn(Obj, u64, usize, c_int, c_int, Obj) -> Obj;
        lldb_target_delete_watchpoint: fn(Obj, i32) -> c_int;
        lldb_target_delete_all_watchpoints: fn(Obj) -> c_int;
        lldb_target_find_watchpoint_by_id: fn(Obj, i32) -> Obj;
        lldb_target_get_num_watchpoints: fn(Obj) -> u32;
        lldb_target_get_watchpoint_at_index: fn(Obj, u32) -> Obj;

        lldb_launch_info_create: fn(*const Str) -> Obj;
        lldb_launch_info_destroy: fn(Obj);
        lldb_launch_info_set_working_directory: fn(Obj, Str);
        lldb_launch_info_set_environment_entries: fn(Obj, *const Str, c_int);
        lldb_launch_info_set_launch_flags: fn(Obj, u32);

        lldb_process_destroy: fn(Obj);
        lldb_process_is_valid: fn(Obj) -> c_int;
        lldb_process_continue: fn(Obj) -> c_int;
        lldb_process_stop: fn(Obj) -> c_int;
        lldb_process_kill: fn(Obj) -> c_int;
        lldb_process_detach: fn(Obj) -> c_int;
        lldb_process_destroy_process: fn(Obj) -> c_int;
        lldb_process_send_async_interrupt: fn(Obj) -> c_int;
        lldb_process_signal: fn(Obj, c_int) -> c_int;
        lldb_process_get_state: fn(Obj) -> c_int;
        lldb_process_get_num_threads: fn(Obj) -> u32;
        lldb_process_get_thread_at_index: fn(Obj, u32) -> Obj;
        lldb_process_get_thread_by_index_id: fn(Obj, u32) -> Obj;
        lldb_process_get_selected_thread: fn(Obj) -> Obj;
        lldb_process_set_selected_thread_by_id: fn(Obj, u64) -> c_int;
        lldb_process_set_selected_thread_by_index_id: fn(Obj, u32) -> c_int;
        lldb_process_get_process_id: fn(Obj) -> u64;
        lldb_process_get_exit_status: fn(Obj) -> c_int;
        lldb_process_get_exit_description: fn(Obj) -> Str;
        lldb_process_allocate_memory: fn(Obj, usize, u32, Obj) -> u64;
        lldb_process_deallocate_memory: fn(Obj, u64) -> c_int;
        lldb_process_read_cstring_from_memory: fn(Obj, u64, *mut c_void, usize, Obj) -> usize;
        lldb_process_get_stdout: fn(Obj, *mut c_char, usize) -> usize;
        lldb_process_get_stderr: fn(Obj, *mut c_char, usize) -> usize;
        lldb_process_put_stdin: fn(Obj, Str, usize) -> usize;
        lldb_process_get_num_supported_hardware_watchpoints: fn(Obj, Obj) -> u32;
        lldb_process_get_unique_id: fn(Obj) -> u32;

        lldb_memory_region_info_destroy: fn(Obj);
        lldb_memory_region_info_get_region_base: fn(Obj) -> u64;
        lldb_memory_region_info_get_region_end: fn(Obj) -> u64;
        lldb_memory_region_info_is_readable: fn(Obj) -> c_int;
        lldb_memory_region_info_is_writable: fn(Obj) -> c_int;
        lldb_memory_region_info_is_executable: fn(Obj) -> c_int;
        lldb_memory_region_info_is_mapped: fn(Obj) -> c_int;
        lldb_memory_region_info_get_name: fn(Obj) -> Str;

        lldb_thread_destroy: fn(Obj);
        lldb_thread_is_valid: fn(Obj) -> c_int;
        lldb_thread_run_to_address: fn(Obj, u64) -> c_int;
        lldb_thread_get_num_frames: fn(Obj) -> u32;
        lldb_thread_get_frame_at_index: fn(Obj, u32) -> Obj;
        lldb_thread_get_selected_frame: fn(Obj) -> Obj;
        lldb_thread_set_selected_frame: fn(Obj, u32) -> c_int;
        lldb_thread_get_thread_id: fn(Obj) -> u64;
        lldb_thread_get_index_id: fn(Obj) -> u32;
        lldb_thread_get_name: fn(Obj) -> Str;
        lldb_thread_get_queue_name: fn(Obj) -> Str;
        lldb_thread_get_stop_reason: fn(Obj) -> c_int;
        lldb_thread_get_stop_description: fn(Obj, usize) -> Str;
        lldb_thread_get_stop_reason_data_count: fn(Obj) -> u64;
        lldb_thread_get_stop_reason_data_at_index: fn(Obj, u32) -> u64;
        lldb_thread_is_stopped: fn(Obj) -> c_int;
        lldb_thread_is_suspended: fn(Obj) -> c_int;
        lldb_thread_suspend: fn(Obj) -> c_int;
        lldb_thread_resume: fn(Obj) -> c_int;
        lldb_thread_get_process: fn(Obj) -> Obj;

        lldb_frame_destroy: fn(Obj);
        lldb_frame_is_valid: fn(Obj) -> c_int;
        lldb_frame_get_function_name: fn(Obj) -> Str;
        lldb_frame_get_display_function_name: fn(Obj) -> Str;
        lldb_frame_get_line: fn(Obj) -> u32;
        lldb_frame_get_file_path: fn(Obj) -> Str;
        lldb_frame_get_column: fn(Obj) -> u32;
        lldb_frame_get_pc: fn(Obj) -> u64;
        lldb_frame_set_pc: fn(Obj, u64) -> c_int;
        lldb_frame_get_sp: fn(Obj) -> u64;
        lldb_frame_get_fp: fn(Obj) -> u64;
        lldb_frame_get_value_for_variable_path: fn(Obj, Str) -> Obj;
        lldb_frame_get_frame_id: fn(Obj) -> u32;
        lldb_frame_get_thread: fn(Obj) -> Obj;
        lldb_frame_get_symbol_context: fn(Obj, u32) -> Obj;
        lldb_frame_get_variables: fn(Obj, c_int, c_int, c_int, c_int) -> Obj;
        lldb_frame_is_inlined: fn(Obj) -> c_int;
        lldb_frame_disassemble: fn(Obj) -> Str;
        lldb_frame_get_module: fn(Obj) -> Obj;

        lldb_breakpoint_destroy: fn(Obj);
        lldb_breakpoint_is_valid: fn(Obj) -> c_int;
        lldb_breakpoint_get_id: fn(Obj) -> i32;
        lldb_breakpoint_is_enabled: fn(Obj) -> c_int;
        lldb_breakpoint_set_enabled: fn(Obj, c_int);
        lldb_breakpoint_is_one_shot: fn(Obj) -> c_int;
        lldb_breakpoint_set_one_shot: fn(Obj, c_int);
        lldb_breakpoint_get_hit_count: fn(Obj) -> u32;
        lldb_breakpoint_get_ignore_count: fn(Obj) -> u32;
        lldb_breakpoint_set_ignore_count: fn(Obj, u32);
        lldb_breakpoint_get_condition: fn(Obj) -> Str;
        lldb_breakpoint_set_condition: fn(Obj, Str);
        lldb_breakpoint_get_num_locations: fn(Obj) -> u32;
        lldb_breakpoint_get_location_at_index: fn(Obj, u32) -> Obj;
        lldb_breakpoint_find_location_by_id: fn(Obj, i32) -> Obj;
        lldb_breakpoint_is_hardware: fn(Obj) -> c_int;
        lldb_breakpoint_get_auto_continue: fn(Obj) -> c_int;
        lldb_breakpoint_set_auto_continue: fn(Obj, c_int);
        lldb_breakpoint_get_thread_id: fn(Obj) -> u64;
        lldb_breakpoint_set_thread_id: fn(Obj, u64);
        lldb_breakpoint_get_thread_name: fn(Obj) -> Str;
        lldb_breakpoint_set_thread_name: fn(Obj, Str);
        lldb_breakpoint_get_thread_index: fn(Obj) -> u32;
        lldb_breakpoint_set_thread_index: fn(Obj, u32);

        lldb_breakpoint_location_destroy: fn(Obj);
        lldb_breakpoint_location_is_valid: fn(Obj) -> c_int;
        lldb_breakpoint_location_get_id: fn(Obj) -> i32;
        lldb_breakpoint_location_get_load_address: fn(Obj) -> u64;
        lldb_breakpoint_location_is_enabled: fn(Obj) -> c_int;
        lldb_breakpoint_location_set_enabled: fn(Obj, c_int);
        lldb_breakpoint_location_get_hit_count: fn(Obj) -> u32;
        lldb_breakpoint_location_get_ignore_count: fn(Obj) -> u32;
        lldb_breakpoint_location_set_ignore_count: fn(Obj, u32);
        lldb_breakpoint_location_get_condition: fn(Obj) -> Str;
        lldb_breakpoint_location_set_condition: fn(Obj, Str);
        lldb_breakpoint_location_get_breakpoint: fn(Obj) -> Obj;

        lldb_watchpoint_destroy: fn(Obj);
        lldb_watchpoint_is_valid: fn(Obj) -> c_int;
        lldb_watchpoint_get_id: fn(Obj) -> i32;
        lldb_watchpoint_is_enabled: fn(Obj) -> c_int;
        lldb_watchpoint_set_enabled: fn(Obj, c_int);
        lldb_watchpoint_get_hit_count: fn(Obj) -> u32;
        lldb_watchpoint_get_ignore_count: fn(Obj) -> u32;
        lldb_watchpoint_set_ignore_count: fn(Obj, u32);
        lldb_watchpoint_get_condition: fn(Obj) -> Str;
        lldb_watchpoint_set_condition: fn(Obj, Str);
        lldb_watchpoint_get_watch_address: fn(Obj) -> u64;
        lldb_watchpoint_get_watch_size: fn(Obj) -> usize;
        lldb_watchpoint_is_watching_reads: fn(Obj) -> c_int;
        lldb_watchpoint_is_watching_writes: fn(Obj) -> c_int;

        lldb_value_destroy: fn(Obj);
        lldb_value_is_valid: fn(Obj) -> c_int;
        lldb_value_get_name: fn(Obj) -> Str;
        lldb_value_get_value: fn(Obj) -> Str;
        lldb_value_get_summary: fn(Obj) -> Str;
        lldb_value_get_type_name: fn(Obj) -> Str;
        lldb_value_get_type: fn(Obj) -> Obj;
        lldb_value_get_num_children: fn(Obj) -> u32;
        lldb_value_get_child_at_index: fn(Obj, u32) -> Obj;
        lldb_value_get_child_member_with_name: fn(Obj, Str) -> Obj;
        lldb_value_get_value_as_signed: fn(Obj) -> i64;
        lldb_value_get_value_as_unsigned: fn(Obj) -> u64;
        lldb_value_get_byte_size: fn(Obj) -> u64;
        lldb_value_might_have_children: fn(Obj) -> c_int;
        lldb_value_get_error: fn(Obj, Obj) -> c_int;
        lldb_value_dereference: fn(Obj) -> Obj;
        lldb_value_address_of: fn(Obj) -> Obj;
        lldb_value_cast: fn(Obj, Obj) -> Obj;
        lldb_value_get_load_address: fn(Obj) -> u64;
        lldb_value_get_value_type: fn(Obj) -> c_int;
        lldb_value_set_value_from_cstring: fn(Obj, Str, Obj) -> c_int;
        lldb_value_create_child_at_offset: fn(Obj, Str, Obj, u32) -> Obj;
        lldb_value_create_value_from_address: fn(Obj, Str, u64, Obj) -> Obj;
        lldb_value_create_value_from_expression: fn(Obj, Str, Str) -> Obj;
        lldb_value_watch: fn(Obj, c_int, c_int, c_int, Obj) -> Obj;
        lldb_value_get_expression_path: fn(Obj) -> Str;
        lldb_value_is_pointer_type: fn(Obj) -> c_int;
        lldb_value_get_non_synthetic_value: fn(Obj) -> Obj;

        lldb_value_list_destroy: fn(Obj);
        lldb_value_list_is_valid: fn(Obj) -> c_int;
        lldb_value_list_get_size: fn(Obj) -> u32;
        lldb_value_list_get_value_at_index: fn(Obj, u32) -> Obj;
        lldb_value_list_get_first_value_by_name: fn(Obj, Str) -> Obj;

        lldb_module_destroy: fn(Obj);
        lldb_module_is_valid: fn(Obj) -> c_int;
        lldb_module_get_file_path: fn(Obj) -> Str;
        lldb_module_get_platform_file_path: fn(Obj) -> Str;
        lldb_module_get_num_symbols: fn(Obj) -> u32;

        lldb_symbol_context_destroy: fn(Obj);
        lldb_symbol_context_is_valid: fn(Obj) -> c_int;
        lldb_symbol_context_get_module: fn(Obj) -> Obj;
        lldb_symbol_context_get_function_name: fn(Obj) -> Str;

        lldb_type_destroy: fn(Obj);
        lldb_type_is_valid: fn(Obj) -> c_int;
        lldb_type_get_name: fn(Obj) -> Str;
        lldb_type_get_display_type_name: fn(Obj) -> Str;
        lldb_type_get_byte_size: fn(Obj) -> u64;
        lldb_type_is_pointer_type: fn(Obj) -> c_int;
        lldb_type_is_reference_type: fn(Obj) -> c_int;
        lldb_type_is_array_type: fn(Obj) -> c_int;
        lldb_type_is_vector_type: fn(Obj) -> c_int;
        lldb_type_is_typedef_type: fn(Obj) -> c_int;
        lldb_type_is_function_type: fn(Obj) -> c_int;
        lldb_type_is_polymorphic_class: fn(Obj) -> c_int;
        lldb_type_get_pointer_type: fn(Obj) -> Obj;
        lldb_type_get_pointee_type: fn(Obj) -> Obj;
        lldb_type_get_reference_type: fn(Obj) -> Obj;
        lldb_type_get_dereferenced_type: fn(Obj) -> Obj;
        lldb_type_get_unqualified_type: fn(Obj) -> Obj;
        lldb_type_get_canonical_type: fn(Obj) -> Obj;
        lldb_type_get_array_element_type: fn(Obj) -> Obj;
        lldb_type_get_array_size: fn(Obj) -> u64;
        lldb_type_get_num_fields: fn(Obj) -> u32;
        lldb_type_get_num_direct_base_classes: fn(Obj) -> u32;
        lldb_type_get_num_virtual_base_classes: fn(Obj) -> u32;
        lldb_type_get_basic_type: fn(Obj) -> c_int;

        lldb_command_interpreter_destroy: fn(Obj);
        lldb_command_interpreter_is_valid: fn(Obj) -> c_int;
        lldb_command_interpreter_handle_command: fn(Obj, Str, Obj, c_int) -> c_int;
        lldb_command_interpreter_command_exists: fn(Obj, Str) -> c_int;
        lldb_command_interpreter_alias_exists: fn(Obj, Str) -> c_int;

        lldb_command_return_object_create: fn() -> Obj;
        lldb_command_return_object_destroy: fn(Obj);
        lldb_command_return_object_is_valid: fn(Obj) -> c_int;
        lldb_command_return_object_get_output: fn(Obj) -> Str;
        lldb_command_return_object_get_error: fn(Obj) -> Str;
        lldb_command_return_object_succeeded: fn(Obj) -> c_int;
        lldb_command_return_object_clear: fn(Obj);
    }
    optional {
        lldb_target_breakpoint_create_by_address: fn(Obj, u64) -> Obj;
        lldb_target_breakpoint_create_by_regex: fn(Obj, Str, Str) -> Obj;
        lldb_process_read_memory: fn(Obj, u64, *mut c_void, usize, Obj) -> usize;
        lldb_process_write_memory: fn(Obj, u64, *const c_void, usize, Obj) -> usize;
        lldb_process_get_thread_by_id: fn(Obj, u64) -> Obj;
        lldb_process_get_memory_region_info: fn(Obj, u64, Obj) -> Obj;
        lldb_thread_step_into: fn(Obj) -> c_int;
        lldb_thread_step_over: fn(Obj) -> c_int;
        lldb_thread_step_out: fn(Obj) -> c_int;
        lldb_thread_step_instruction: fn(Obj, c_int) -> c_int;
        lldb_frame_get_registers: fn(Obj) -> Obj;
        lldb_frame_find_variable: fn(Obj, Str) -> Obj;
        lldb_frame_evaluate_expression: fn(Obj, Str) -> Obj;
    }
}
