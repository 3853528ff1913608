//! Tests for breakpoints, breakpoint locations and watchpoints

use lldbind_core::engine::sim::{SimEngine, SimProgram};
use lldbind_core::prelude::*;

const PROGRAM: &str = "/usr/local/bin/demo";

fn demo_target() -> Target
{
    let lldb = Lldb::simulated(SimEngine::new().with_program(SimProgram::demo(PROGRAM)));
    lldb.create_debugger().unwrap().create_target(PROGRAM).unwrap()
}

fn stop_function(process: &Process) -> Option<String>
{
    let thread = process.selected_thread().unwrap()?;
    thread.frame_at_index(0).unwrap()?.function_name()
}

#[test]
fn test_breakpoint_by_name_resolves_locations()
{
    let target = demo_target();

    let breakpoint = target.breakpoint_create_by_name("compute", None).unwrap();
    assert!(breakpoint.is_valid());
    assert_eq!(breakpoint.id(), BreakpointId(1));
    assert_eq!(breakpoint.num_locations(), 1);

    let location = breakpoint.location_at_index(0).unwrap().unwrap();
    assert_eq!(location.load_address(), 0x40_1200);
    assert_eq!(location.breakpoint().id(), breakpoint.id());
    assert!(location.is_enabled());

    let in_module = target.breakpoint_create_by_name("compute", Some("demo")).unwrap();
    assert_eq!(in_module.num_locations(), 1);
    let elsewhere = target.breakpoint_create_by_name("compute", Some("libc.so.6")).unwrap();
    assert_eq!(elsewhere.num_locations(), 0);

    assert_eq!(target.num_breakpoints(), 3);
    assert_eq!(target.tracked_breakpoint_ids(), vec![BreakpointId(1), BreakpointId(2), BreakpointId(3)]);
}

#[test]
fn test_breakpoint_by_location()
{
    let target = demo_target();
    let breakpoint = target.breakpoint_create_by_location("main.c", 5).unwrap();
    assert_eq!(breakpoint.num_locations(), 1);
    assert_eq!(breakpoint.locations()[0].load_address(), 0x40_1208);

    let process = target.launch(LaunchInfo::default()).unwrap();
    let frame = process.selected_thread().unwrap().unwrap().frame_at_index(0).unwrap().unwrap();
    assert_eq!(frame.function_name().as_deref(), Some("compute"));
    assert_eq!(frame.line(), 5);

    let outside = target.breakpoint_create_by_location("main.c", 99).unwrap();
    assert_eq!(outside.num_locations(), 0);
}

#[test]
fn test_breakpoint_by_address()
{
    let target = demo_target();
    let breakpoint = target.breakpoint_create_by_address(0x40_1300).unwrap();
    assert_eq!(breakpoint.num_locations(), 1);

    let process = target.launch(LaunchInfo::default()).unwrap();
    assert_eq!(stop_function(&process).as_deref(), Some("report"));
}

#[test]
fn test_breakpoint_by_regex()
{
    let target = demo_target();

    let compute = target.breakpoint_create_by_regex("^comp", None).unwrap();
    assert_eq!(compute.num_locations(), 1);

    let everything = target.breakpoint_create_by_regex(".", None).unwrap();
    assert_eq!(everything.num_locations(), 4);

    let source = target.breakpoint_create_by_source_regex(r"report\(", Some("util.c")).unwrap();
    assert_eq!(source.num_locations(), 1);
    let wrong_file = target.breakpoint_create_by_source_regex(r"report\(", Some("main.c")).unwrap();
    assert_eq!(wrong_file.num_locations(), 0);
}

#[test]
fn test_unsupported_breakpoint_kinds()
{
    let capabilities = Capabilities::all()
        .without(Feature::BreakpointByAddress)
        .without(Feature::BreakpointByRegex);
    let engine = SimEngine::new()
        .with_program(SimProgram::demo(PROGRAM))
        .with_capabilities(capabilities);
    let target = Lldb::simulated(engine).create_debugger().unwrap().create_target(PROGRAM).unwrap();

    let err = target.breakpoint_create_by_address(0x40_1200).unwrap_err();
    assert_eq!(
        err.to_string(),
        "API 'breakpoint_by_address' is not supported in this LLDB version or binding"
    );
    assert!(matches!(
        target.breakpoint_create_by_regex("comp", None),
        Err(LldbindError::UnsupportedApi(name)) if name == "breakpoint_by_regex"
    ));

    // Nothing was recorded for the rejected requests
    assert!(target.tracked_breakpoint_ids().is_empty());
    assert!(target.breakpoint_create_by_name("compute", None).is_ok());
}

#[test]
fn test_ignore_count_skips_hits()
{
    let target = demo_target();
    let breakpoint = target.breakpoint_create_by_name("compute", None).unwrap();
    breakpoint.set_ignore_count(1).unwrap();
    assert_eq!(breakpoint.ignore_count(), 1);

    let process = target.launch(LaunchInfo::default()).unwrap();
    assert!(process.is_stopped());
    // The skipped hit still counts
    assert_eq!(breakpoint.hit_count(), 2);
    assert_eq!(breakpoint.ignore_count(), 0);
}

#[test]
fn test_condition_filters_hits()
{
    let target = demo_target();
    let hit = target.breakpoint_create_by_name("compute", None).unwrap();
    hit.set_condition(Some("x == 21")).unwrap();
    assert_eq!(hit.condition().as_deref(), Some("x == 21"));

    let process = target.launch(LaunchInfo::default()).unwrap();
    assert_eq!(stop_function(&process).as_deref(), Some("compute"));
    process.kill().unwrap();

    hit.set_condition(Some("x != 21")).unwrap();
    let process = target.launch(LaunchInfo::default()).unwrap();
    assert!(process.is_exited());

    hit.set_condition(None).unwrap();
    assert_eq!(hit.condition(), None);
}

#[test]
fn test_one_shot_breakpoint_is_removed_after_hit()
{
    let target = demo_target();
    let breakpoint = target.breakpoint_create_by_name("compute", None).unwrap();
    breakpoint.set_one_shot(true).unwrap();
    assert!(breakpoint.is_one_shot());

    let process = target.launch(LaunchInfo::default()).unwrap();
    assert_eq!(stop_function(&process).as_deref(), Some("compute"));
    assert_eq!(target.num_breakpoints(), 0);
    assert!(!breakpoint.is_valid());

    process.continue_execution().unwrap();
    assert_eq!(process.wait_for_stop(&target.debugger().wait_config()).unwrap(), State::Exited);
}

#[test]
fn test_auto_continue_counts_without_stopping()
{
    let target = demo_target();
    let breakpoint = target.breakpoint_create_by_name("compute", None).unwrap();
    breakpoint.set_auto_continue(true).unwrap();
    assert!(breakpoint.auto_continue());

    let process = target.launch(LaunchInfo::default()).unwrap();
    assert!(process.is_exited());
    assert_eq!(breakpoint.hit_count(), 2);
}

#[test]
fn test_disabled_breakpoints_do_not_stop()
{
    let target = demo_target();
    let breakpoint = target.breakpoint_create_by_name("compute", None).unwrap();
    breakpoint.disable().unwrap();
    assert!(!breakpoint.is_enabled());

    let process = target.launch(LaunchInfo::default()).unwrap();
    assert!(process.is_exited());
    assert_eq!(breakpoint.hit_count(), 0);

    assert!(target.enable_all_breakpoints().unwrap());
    assert!(breakpoint.is_enabled());
    assert!(target.disable_all_breakpoints().unwrap());
    assert!(!breakpoint.is_enabled());
}

#[test]
fn test_thread_filter()
{
    let target = demo_target();
    let breakpoint = target.breakpoint_create_by_name("compute", None).unwrap();
    breakpoint.set_thread_id(ThreadId(1)).unwrap();
    assert_eq!(breakpoint.thread_id(), ThreadId(1));
    breakpoint.set_thread_name(Some("worker")).unwrap();
    assert_eq!(breakpoint.thread_name().as_deref(), Some("worker"));
    breakpoint.set_thread_index(2).unwrap();
    assert_eq!(breakpoint.thread_index(), 2);

    // The only thread has the process id as its tid
    let process = target.launch(LaunchInfo::default()).unwrap();
    assert!(process.is_exited());
}

#[test]
fn test_delete_keeps_bookkeeping_in_step()
{
    let target = demo_target();
    let first = target.breakpoint_create_by_name("compute", None).unwrap();
    let second = target.breakpoint_create_by_name("report", None).unwrap();

    let deleted = first.id();
    assert_eq!(target.num_breakpoints(), 2);

    assert!(target.delete_breakpoint(deleted).unwrap());
    assert!(!first.is_valid());
    assert_eq!(target.num_breakpoints(), 1);
    assert!(!target.breakpoints().iter().any(|bp| bp.id() == deleted));
    assert_eq!(target.tracked_breakpoint_ids(), vec![second.id()]);

    // Unknown ids are refused and nothing changes
    assert!(!target.delete_breakpoint(BreakpointId(42)).unwrap());
    assert_eq!(target.tracked_breakpoint_ids(), vec![second.id()]);

    let found = target.find_breakpoint_by_id(second.id()).unwrap().unwrap();
    assert_eq!(found.id(), second.id());
    assert!(target.find_breakpoint_by_id(first.id()).unwrap().is_none());

    assert!(second.delete().unwrap());
    assert!(target.tracked_breakpoint_ids().is_empty());
    assert_eq!(target.num_breakpoints(), 0);
}

#[test]
fn test_launch_stops_at_main_breakpoint()
{
    let target = demo_target();
    let breakpoint = target.breakpoint_create_by_name("main", None).unwrap();
    assert_eq!(breakpoint.num_locations(), 1);
    let address = breakpoint.location_at_index(0).unwrap().unwrap().load_address();

    let process = target.launch(LaunchInfo::default()).unwrap();
    assert_eq!(process.state(), State::Stopped);

    let thread = process.selected_thread().unwrap().unwrap();
    assert_eq!(thread.stop_reason(), StopReason::Breakpoint);
    let frame = thread.frame_at_index(0).unwrap().unwrap();
    assert_eq!(frame.function_name().as_deref(), Some("main"));
    assert_eq!(frame.pc(), address);
    assert_eq!(breakpoint.hit_count(), 1);

    // Nothing else is armed, so the process runs to exit
    process.continue_execution().unwrap();
    while process.state() == State::Running {}
    assert!(process.is_exited());
}

#[test]
fn test_delete_all_breakpoints()
{
    let target = demo_target();
    target.breakpoint_create_by_name("compute", None).unwrap();
    target.breakpoint_create_by_name("report", None).unwrap();

    assert!(target.delete_all_breakpoints().unwrap());
    assert_eq!(target.num_breakpoints(), 0);
    assert!(target.tracked_breakpoint_ids().is_empty());
}

#[test]
fn test_watchpoint_requires_process()
{
    let target = demo_target();
    let err = target.watch_address(0x60_2000, 4, false, true).unwrap_err();
    assert!(matches!(&err, LldbindError::Engine(message) if message == "error: invalid process"));
}

#[test]
fn test_watchpoints_on_live_process()
{
    let target = demo_target();
    target.breakpoint_create_by_name("compute", None).unwrap();
    let process = target.launch(LaunchInfo::default()).unwrap();
    assert!(process.is_stopped());

    let watchpoint = target.watch_address(0x60_2000, 4, false, true).unwrap();
    assert_eq!(watchpoint.id(), WatchpointId(1));
    assert_eq!(watchpoint.address(), 0x60_2000);
    assert_eq!(watchpoint.size(), 4);
    assert!(watchpoint.is_watching_writes());
    assert!(!watchpoint.is_watching_reads());
    assert!(watchpoint.is_enabled());

    let err = target.watch_address(0x60_2000, 3, false, true).unwrap_err();
    assert_eq!(err.to_string(), "error: invalid watchpoint size: 3");
    let err = target.watch_address(0x10, 4, true, false).unwrap_err();
    assert_eq!(err.to_string(), "error: invalid watch address 0x10");

    for offset in 1..4 {
        target.watch_address(0x60_2000 + offset * 8, 8, true, true).unwrap();
    }
    let err = target.watch_address(0x60_2100, 8, true, true).unwrap_err();
    assert_eq!(err.to_string(), "error: no more hardware watchpoints available");
    assert_eq!(target.num_watchpoints(), 4);
    assert_eq!(process.num_supported_hardware_watchpoints(), 4);

    assert!(target.delete_watchpoint(watchpoint.id()).unwrap());
    assert!(!watchpoint.is_valid());
    assert_eq!(target.tracked_watchpoint_ids().len(), 3);

    assert!(target.delete_all_watchpoints().unwrap());
    assert!(target.tracked_watchpoint_ids().is_empty());
    assert!(target.watchpoints().is_empty());
}

#[test]
fn test_watch_variable_through_value()
{
    let target = demo_target();
    target.breakpoint_create_by_name("compute", None).unwrap();
    let process = target.launch(LaunchInfo::default()).unwrap();
    let frame = process.selected_thread().unwrap().unwrap().frame_at_index(0).unwrap().unwrap();
    let result = frame.find_variable("result").unwrap().unwrap();

    let watchpoint = result.watch(true, false, true).unwrap().unwrap();
    assert_eq!(watchpoint.address(), result.load_address());
    assert_eq!(watchpoint.size(), 4);
    assert_eq!(target.tracked_watchpoint_ids(), vec![watchpoint.id()]);
    assert!(target.find_watchpoint_by_id(watchpoint.id()).unwrap().is_some());
}
