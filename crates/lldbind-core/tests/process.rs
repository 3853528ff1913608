//! Tests for process memory, threads, stepping and control

use lldbind_core::engine::sim::{SimEngine, SimProgram};
use lldbind_core::prelude::*;

const PROGRAM: &str = "/usr/local/bin/demo";
const HEAP: u64 = 0x60_2000;

fn stopped_in_compute() -> (Target, Process)
{
    let lldb = Lldb::simulated(SimEngine::new().with_program(SimProgram::demo(PROGRAM)));
    let target = lldb.create_debugger().unwrap().create_target(PROGRAM).unwrap();
    target.breakpoint_create_by_name("compute", None).unwrap();
    let process = target.launch(LaunchInfo::default()).unwrap();
    (target, process)
}

fn top_frame(process: &Process) -> Frame
{
    process
        .selected_thread()
        .unwrap()
        .unwrap()
        .frame_at_index(0)
        .unwrap()
        .unwrap()
}

#[test]
fn test_read_and_write_heap()
{
    let (_target, process) = stopped_in_compute();

    assert_eq!(process.write_memory(HEAP + 0x10, b"hello\0").unwrap(), 6);
    assert_eq!(process.read_memory(HEAP + 0x10, 5).unwrap(), b"hello");
    assert_eq!(process.read_cstring_from_memory(HEAP + 0x10, 64).unwrap(), "hello");
    assert_eq!(process.read_cstring_from_memory(HEAP + 0x10, 3).unwrap(), "hel");
}

#[test]
fn test_memory_errors()
{
    let (_target, process) = stopped_in_compute();

    // Text is mapped read-only
    let err = process.write_memory(0x40_1000, &[0xcc]).unwrap_err();
    assert_eq!(err.to_string(), "error: memory write failed for 0x401000");

    let err = process.read_memory(0x10, 4).unwrap_err();
    assert!(matches!(&err, LldbindError::Engine(message) if message == "error: memory read failed for 0x10"));

    // Reads are truncated at the end of a region
    let tail = process.read_memory(HEAP + 0xffe, 8).unwrap();
    assert_eq!(tail.len(), 2);
}

#[test]
fn test_text_holds_prologues()
{
    let (_target, process) = stopped_in_compute();
    let bytes = process.read_memory(0x40_1200, 4).unwrap();
    assert_eq!(bytes, [0x55, 0x48, 0x89, 0xe5]);
}

#[test]
fn test_allocate_and_deallocate()
{
    let (_target, process) = stopped_in_compute();

    let first = process.allocate_memory(10, Permissions::rw()).unwrap();
    assert_eq!(first, 0x1000_0000);
    let second = process.allocate_memory(0x1001, Permissions::READABLE).unwrap();
    assert_eq!(second, 0x1000_2000);

    assert_eq!(process.write_memory(first, &[1, 2, 3]).unwrap(), 3);
    assert_eq!(process.read_memory(first, 3).unwrap(), [1, 2, 3]);
    assert!(process.write_memory(second, &[1]).is_err());

    let region = process.memory_region_info(second).unwrap().unwrap();
    assert_eq!(region.size(), 0x2000);
    assert_eq!(region.permissions(), "r--");

    assert!(process.deallocate_memory(first).unwrap());
    assert!(!process.deallocate_memory(first).unwrap());
    assert!(process.read_memory(first, 1).is_err());

    let err = process.allocate_memory(0, Permissions::rw()).unwrap_err();
    assert_eq!(err.to_string(), "error: cannot allocate 0 bytes");
}

#[test]
fn test_memory_region_info()
{
    let (_target, process) = stopped_in_compute();

    let heap = process.memory_region_info(HEAP + 4).unwrap().unwrap();
    assert_eq!(heap.base, HEAP);
    assert_eq!(heap.end, HEAP + 0x1000);
    assert_eq!(heap.name.as_deref(), Some("[heap]"));
    assert_eq!(heap.permissions(), "rw-");
    assert!(heap.mapped);

    let text = process.memory_region_info(0x40_1000).unwrap().unwrap();
    assert_eq!(text.permissions(), "r-x");
    assert_eq!(text.name.as_deref(), Some(PROGRAM));

    let gap = process.memory_region_info(HEAP + 0x2000).unwrap().unwrap();
    assert!(!gap.mapped);
    assert_eq!(gap.base, HEAP + 0x1000);
    assert!(gap.contains(HEAP + 0x2000));
}

#[test]
fn test_memory_requires_live_process()
{
    let (_target, process) = stopped_in_compute();
    process.kill().unwrap();

    let err = process.read_memory(HEAP, 1).unwrap_err();
    assert_eq!(err.to_string(), "error: invalid process");
    assert_eq!(process.num_supported_hardware_watchpoints(), 0);
}

#[test]
fn test_threads()
{
    let (_target, process) = stopped_in_compute();

    assert_eq!(process.num_threads(), 1);
    let thread = process.thread_at_index(0).unwrap().unwrap();
    assert_eq!(thread.thread_id(), ThreadId(4242));
    assert_eq!(thread.index_id(), 1);
    assert_eq!(thread.num_frames(), 3);
    assert!(thread.is_stopped());

    assert!(process.thread_by_id(ThreadId(4242)).unwrap().is_some());
    assert!(process.thread_by_id(ThreadId(1)).unwrap().is_none());
    assert!(process.thread_by_index_id(1).unwrap().is_some());
    assert!(process.thread_at_index(1).unwrap().is_none());

    assert!(process.select_thread_by_id(ThreadId(4242)).unwrap());
    assert!(!process.select_thread_by_index_id(2).unwrap());
    assert_eq!(process.threads().len(), 1);
}

#[test]
fn test_select_frame()
{
    let (_target, process) = stopped_in_compute();
    let thread = process.selected_thread().unwrap().unwrap();

    assert!(thread.select_frame(1).unwrap());
    let selected = thread.selected_frame().unwrap().unwrap();
    assert_eq!(selected.function_name().as_deref(), Some("main"));
    assert!(!thread.select_frame(7).unwrap());
}

#[test]
fn test_step_over_advances_one_line()
{
    let (_target, process) = stopped_in_compute();
    let thread = process.selected_thread().unwrap().unwrap();

    assert!(thread.step_over().unwrap());
    assert!(process.is_stopped());
    assert_eq!(thread.stop_reason(), StopReason::PlanComplete);
    assert_eq!(thread.stop_description().as_deref(), Some("step over"));

    let frame = top_frame(&process);
    assert_eq!(frame.function_name().as_deref(), Some("compute"));
    assert_eq!(frame.line(), 4);
    assert_eq!(frame.pc(), 0x40_1204);
}

#[test]
fn test_step_out_returns_to_caller()
{
    let (_target, process) = stopped_in_compute();
    let thread = process.selected_thread().unwrap().unwrap();

    assert!(thread.step_out().unwrap());
    let frame = top_frame(&process);
    assert_eq!(frame.function_name().as_deref(), Some("main"));
    assert_eq!(frame.line(), 13);
    assert_eq!(thread.num_frames(), 2);
}

#[test]
fn test_step_instruction_and_run_to_address()
{
    let (_target, process) = stopped_in_compute();
    let thread = process.selected_thread().unwrap().unwrap();

    assert!(thread.step_instruction(false).unwrap());
    assert_eq!(top_frame(&process).pc(), 0x40_1204);
    assert_eq!(thread.stop_description().as_deref(), Some("instruction step into"));

    assert!(thread.run_to_address(0x40_1300).unwrap());
    let frame = top_frame(&process);
    assert_eq!(frame.function_name().as_deref(), Some("report"));
    assert_eq!(frame.line(), 12);

    assert!(!thread.run_to_address(0x10).unwrap());
}

#[test]
fn test_suspended_thread_does_not_step()
{
    let (_target, process) = stopped_in_compute();
    let thread = process.selected_thread().unwrap().unwrap();

    assert!(thread.suspend().unwrap());
    assert!(thread.is_suspended());
    assert!(!thread.step_over().unwrap());

    assert!(thread.resume().unwrap());
    assert!(!thread.is_suspended());
    assert!(thread.step_over().unwrap());
}

#[test]
fn test_stop_interrupts_running_process()
{
    let (_target, process) = stopped_in_compute();

    assert!(process.continue_execution().unwrap());
    assert!(process.is_running());
    assert!(!process.continue_execution().unwrap());

    assert!(process.stop().unwrap());
    assert_eq!(process.state(), State::Stopped);
    let thread = process.selected_thread().unwrap().unwrap();
    assert_eq!(thread.stop_reason(), StopReason::Signal);
}

#[test]
fn test_kill_reports_sigkill()
{
    let (_target, process) = stopped_in_compute();

    assert!(process.kill().unwrap());
    assert_eq!(process.state(), State::Exited);
    assert_eq!(process.exit_status(), 9);
    assert_eq!(process.exit_description().unwrap().as_deref(), Some("SIGKILL"));
    assert!(!process.kill().unwrap());
}

#[test]
fn test_signals()
{
    let (_target, process) = stopped_in_compute();

    // Harmless signals are delivered without a state change
    assert!(process.signal(10).unwrap());
    assert!(process.is_stopped());

    assert!(process.signal(9).unwrap());
    assert!(process.is_exited());
    assert!(!process.signal(10).unwrap());
}

#[test]
fn test_put_stdin()
{
    let (_target, process) = stopped_in_compute();
    assert_eq!(process.put_stdin(b"input\n").unwrap(), 6);

    process.kill().unwrap();
    assert_eq!(process.put_stdin(b"late").unwrap(), 0);
}
