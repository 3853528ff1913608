//! Tests for launching and attaching in synchronous and asynchronous mode

use std::rc::Rc;
use std::time::Duration;

use lldbind_core::engine::sim::{SimEngine, SimProgram};
use lldbind_core::prelude::*;
use lldbind_core::WaitConfig;

const PROGRAM: &str = "/usr/local/bin/demo";

fn session(program: SimProgram) -> (Debugger, Target)
{
    let path = program.path.clone();
    let lldb = Lldb::simulated(SimEngine::new().with_program(program));
    let debugger = lldb.create_debugger().unwrap();
    let target = debugger.create_target(&path).unwrap();
    (debugger, target)
}

fn short_wait() -> WaitConfig
{
    WaitConfig::new(Duration::from_millis(1), Duration::from_millis(50))
}

#[test]
fn test_launch_without_breakpoints_stops_at_entry()
{
    let (_debugger, target) = session(SimProgram::demo(PROGRAM));

    let process = target.launch(LaunchInfo::default()).unwrap();
    assert_eq!(process.state(), State::Stopped);
    assert_eq!(process.pid(), ProcessId(4242));

    let thread = process.selected_thread().unwrap().unwrap();
    assert_eq!(thread.stop_reason(), StopReason::Signal);
    let frame = thread.frame_at_index(0).unwrap().unwrap();
    assert_eq!(frame.function_name().as_deref(), Some("_start"));
    assert_eq!(frame.pc(), 0x40_1000);
}

#[test]
fn test_launch_continues_to_first_breakpoint()
{
    let (_debugger, target) = session(SimProgram::demo(PROGRAM));
    let breakpoint = target.breakpoint_create_by_name("compute", None).unwrap();

    let process = target.launch(LaunchInfo::default()).unwrap();
    assert!(process.is_stopped());
    assert_eq!(breakpoint.hit_count(), 1);

    let thread = process.selected_thread().unwrap().unwrap();
    assert!(thread.is_stopped_at_breakpoint());
    assert_eq!(thread.stop_description().as_deref(), Some("breakpoint 1.1"));
    assert_eq!(thread.stop_reason_data(), vec![1, 1]);

    let frames = thread.frames();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].function_name().as_deref(), Some("compute"));
    assert_eq!(frames[0].location().as_deref(), Some("main.c:3"));
    assert_eq!(frames[1].function_name().as_deref(), Some("main"));
    assert_eq!(frames[1].line(), 12);
    assert_eq!(frames[2].location(), None);
}

#[test]
fn test_continue_through_hits_to_exit()
{
    let (debugger, target) = session(SimProgram::demo(PROGRAM));
    let breakpoint = target.breakpoint_create_by_name("compute", None).unwrap();
    let wait = debugger.wait_config();

    let process = target.launch(LaunchInfo::default()).unwrap();
    assert_eq!(breakpoint.hit_count(), 1);

    assert!(process.continue_execution().unwrap());
    assert_eq!(process.wait_for_stop(&wait).unwrap(), State::Stopped);
    assert_eq!(breakpoint.hit_count(), 2);

    assert!(process.continue_execution().unwrap());
    assert_eq!(process.wait_for_stop(&wait).unwrap(), State::Exited);
    assert!(process.is_exited());
    assert_eq!(process.exit_status(), 0);
    assert_eq!(process.stdout(1024).unwrap(), "result = 42\nresult = 42\n");
}

#[test]
fn test_unresolved_breakpoint_still_runs_past_entry()
{
    let (_debugger, target) = session(SimProgram::new("/bin/exit3").exit_code(3));
    let breakpoint = target.breakpoint_create_by_name("nosuch", None).unwrap();
    assert_eq!(breakpoint.num_locations(), 0);

    let process = target.launch(LaunchInfo::default()).unwrap();
    assert_eq!(process.state(), State::Exited);
    assert_eq!(process.exit_status(), 3);
    assert_eq!(process.exit_description().unwrap(), None);
}

#[test]
fn test_launch_forces_stop_at_entry()
{
    let engine = Rc::new(SimEngine::new().with_program(SimProgram::demo(PROGRAM)));
    let lldb = Lldb::with_engine(engine.clone());
    let target = lldb.create_debugger().unwrap().create_target(PROGRAM).unwrap();

    let info = LaunchInfo::new(["--fast"])
        .env("DEMO_MODE", "1")
        .flags(LaunchFlags::DISABLE_ASLR);
    target.launch(info).unwrap();

    let last = engine.stats().last_launch.unwrap();
    assert_eq!(last.args(), ["--fast"]);
    assert_eq!(last.environment(), ["DEMO_MODE=1"]);
    assert!(last.launch_flags().contains(LaunchFlags::STOP_AT_ENTRY));
    assert!(last.launch_flags().contains(LaunchFlags::DISABLE_ASLR));
}

#[test]
fn test_launch_with_info_does_not_wait()
{
    let (debugger, target) = session(SimProgram::demo(PROGRAM).exit_code(7));

    let process = target.launch_with_info(&LaunchInfo::default()).unwrap();
    assert_eq!(process.state(), State::Launching);

    let state = process.wait_for_stop(&debugger.wait_config()).unwrap();
    assert_eq!(state, State::Exited);
    assert_eq!(process.exit_status(), 7);
}

#[test]
fn test_async_launch_returns_immediately()
{
    let (debugger, target) = session(SimProgram::demo(PROGRAM));
    debugger.set_async(true).unwrap();
    assert!(debugger.is_async());
    target.breakpoint_create_by_name("compute", None).unwrap();

    let process = target.launch(LaunchInfo::default()).unwrap();
    assert_eq!(process.state(), State::Launching);

    // Asynchronous callers drive the process themselves
    assert_eq!(process.wait_for_stop(&debugger.wait_config()).unwrap(), State::Stopped);
    let thread = process.selected_thread().unwrap().unwrap();
    assert_eq!(thread.stop_reason(), StopReason::Signal);
}

#[test]
fn test_launch_failure_carries_engine_message()
{
    let (_debugger, target) = session(SimProgram::demo(PROGRAM).fail_launch("error: permission denied"));

    let err = target.launch(LaunchInfo::default()).unwrap_err();
    assert!(matches!(&err, LldbindError::Launch(message) if message == "error: permission denied"));
    assert!(err.is_process_start());
    assert!(target.current_process().is_none());
}

#[test]
fn test_launch_timeout()
{
    let (debugger, target) = session(SimProgram::demo(PROGRAM).hang());
    debugger.set_wait_config(short_wait());

    let err = target.launch(LaunchInfo::default()).unwrap_err();
    assert_eq!(err.to_string(), "Process failed to stop within 0.05 seconds");
    assert!(matches!(err, LldbindError::Launch(_)));
}

#[test]
fn test_second_launch_is_rejected_while_live()
{
    let (_debugger, target) = session(SimProgram::demo(PROGRAM));
    let first = target.launch(LaunchInfo::default()).unwrap();

    let err = target.launch(LaunchInfo::default()).unwrap_err();
    assert_eq!(err.to_string(), "error: a process is already being debugged");

    first.kill().unwrap();
    let second = target.launch(LaunchInfo::default()).unwrap();
    assert_eq!(second.pid(), ProcessId(4243));
    assert_eq!(target.current_process().unwrap().pid(), second.pid());
}

#[test]
fn test_crash_is_terminal()
{
    let (_debugger, target) = session(SimProgram::demo(PROGRAM).crash());
    target.breakpoint_create_by_name("nosuch", None).unwrap();

    let process = target.launch(LaunchInfo::default()).unwrap();
    assert!(process.is_crashed());

    let thread = process.selected_thread().unwrap().unwrap();
    assert_eq!(thread.stop_reason(), StopReason::Exception);
    assert_eq!(
        thread.stop_description().as_deref(),
        Some("EXC_BAD_ACCESS (code=1, address=0x0)")
    );
    let frame = thread.frame_at_index(0).unwrap().unwrap();
    assert_eq!(frame.function_name().as_deref(), Some("report"));
}

#[test]
fn test_attach_by_pid()
{
    let engine = SimEngine::new()
        .with_program(SimProgram::demo(PROGRAM))
        .with_attachable(777, "demo");
    let lldb = Lldb::simulated(engine);
    let target = lldb.create_debugger().unwrap().create_target(PROGRAM).unwrap();

    let process = target.attach(ProcessId(777)).unwrap();
    assert_eq!(process.state(), State::Stopped);
    assert_eq!(process.pid(), ProcessId(777));

    let frame = process.selected_thread().unwrap().unwrap().frame_at_index(0).unwrap().unwrap();
    assert_eq!(frame.function_name().as_deref(), Some("main"));
    assert_eq!(frame.line(), 11);

    assert!(process.detach().unwrap());
    assert!(!process.is_valid());
}

#[test]
fn test_attach_by_name()
{
    let engine = SimEngine::new()
        .with_program(SimProgram::demo(PROGRAM))
        .with_attachable(901, "demo");
    let lldb = Lldb::simulated(engine);
    let target = lldb.create_debugger().unwrap().create_target(PROGRAM).unwrap();

    let process = target.attach_with_name("demo", false).unwrap();
    assert_eq!(process.pid(), ProcessId(901));
    assert!(process.is_stopped());
}

#[test]
fn test_attach_failures()
{
    let (debugger, target) = session(SimProgram::demo(PROGRAM));

    let err = target.attach(ProcessId(5)).unwrap_err();
    assert!(matches!(&err, LldbindError::Attach(message) if message == "error: attach failed: no such process (pid 5)"));
    assert!(err.is_process_start());

    let err = target.attach_with_name("ghost", false).unwrap_err();
    assert_eq!(err.to_string(), "error: attach failed: no process named 'ghost'");

    // Waiting for a process that never appears times out
    debugger.set_wait_config(short_wait());
    let err = target.attach_with_name("ghost", true).unwrap_err();
    assert!(matches!(&err, LldbindError::Attach(message) if message.starts_with("Process failed to stop within")));
}
