//! Tests for handle ownership and runtime lifecycle

use std::rc::Rc;

use lldbind_core::engine::sim::{SimEngine, SimProgram};
use lldbind_core::prelude::*;

const PROGRAM: &str = "/usr/local/bin/demo";

fn shared_engine() -> Rc<SimEngine>
{
    Rc::new(SimEngine::new().with_program(SimProgram::demo(PROGRAM)))
}

#[test]
fn test_debugger_create_requires_initialize()
{
    let lldb = Lldb::with_engine(shared_engine());

    let result = Debugger::create(&lldb);
    assert!(matches!(result, Err(LldbindError::NotInitialized)));

    lldb.initialize();
    let debugger = Debugger::create(&lldb).unwrap();
    assert!(debugger.is_valid());
}

#[test]
fn test_initialize_and_terminate_are_idempotent()
{
    let engine = shared_engine();
    let lldb = Lldb::with_engine(engine.clone());

    lldb.terminate();
    assert_eq!(engine.stats().terminate_calls, 0);

    lldb.initialize();
    lldb.initialize();
    assert!(lldb.is_initialized());
    assert_eq!(engine.stats().initialize_calls, 1);

    lldb.terminate();
    lldb.terminate();
    assert!(!lldb.is_initialized());
    assert_eq!(engine.stats().terminate_calls, 1);
    assert!(matches!(lldb.ensure_initialized(), Err(LldbindError::NotInitialized)));
}

#[test]
fn test_runtime_outlives_sessions()
{
    let engine = shared_engine();
    let lldb = Lldb::with_engine(engine.clone());
    let debugger = lldb.create_debugger().unwrap();

    drop(lldb);
    assert_eq!(engine.stats().terminate_calls, 0);
    assert!(debugger.runtime().is_initialized());

    drop(debugger);
    assert_eq!(engine.stats().terminate_calls, 1);
}

#[test]
fn test_release_is_at_most_once()
{
    let engine = shared_engine();
    let lldb = Lldb::with_engine(engine.clone());
    let debugger = lldb.create_debugger().unwrap();
    let target = debugger.create_target(PROGRAM).unwrap();

    target.release();
    target.release();
    assert!(!target.is_valid());

    drop(target);
    let stats = engine.stats();
    assert_eq!(stats.stale_destroys, 0);
}

#[test]
fn test_no_handles_leak_after_session()
{
    let engine = shared_engine();
    {
        let lldb = Lldb::with_engine(engine.clone());
        let debugger = lldb.create_debugger().unwrap();
        let target = debugger.create_target(PROGRAM).unwrap();
        target.breakpoint_create_by_name("compute", None).unwrap();

        let process = target.launch(LaunchInfo::default()).unwrap();
        let thread = process.selected_thread().unwrap().unwrap();
        let frame = thread.frame_at_index(0).unwrap().unwrap();
        let value = frame.find_variable("point").unwrap().unwrap();
        assert_eq!(value.children().len(), 2);
        assert!(engine.stats().live_handles > 0);
    }

    let stats = engine.stats();
    assert_eq!(stats.live_handles, 0);
    assert_eq!(stats.stale_destroys, 0);
}

#[test]
fn test_released_object_reports_invalid()
{
    let lldb = Lldb::simulated(SimEngine::new().with_program(SimProgram::demo(PROGRAM)));
    let debugger = lldb.create_debugger().unwrap();
    let target = debugger.create_target(PROGRAM).unwrap();

    target.release();

    // Read accessors fall back to neutral defaults
    assert_eq!(target.num_breakpoints(), 0);
    assert_eq!(target.executable_path(), None);

    // Mutators and child accessors fail
    let err = target.breakpoint_create_by_name("main", None).unwrap_err();
    assert!(matches!(err, LldbindError::InvalidObject("Target")));
    assert_eq!(err.to_string(), "Target is not valid");
}

#[test]
fn test_deleted_target_invalidates_clones()
{
    let lldb = Lldb::simulated(SimEngine::new().with_program(SimProgram::demo(PROGRAM)));
    let debugger = lldb.create_debugger().unwrap();
    let target = debugger.create_target(PROGRAM).unwrap();
    let clone = target.clone();

    assert_eq!(debugger.num_targets(), 1);
    assert!(debugger.delete_target(&target).unwrap());
    assert_eq!(debugger.num_targets(), 0);
    assert!(!clone.is_valid());
}

#[test]
fn test_frames_go_stale_when_process_resumes()
{
    let lldb = Lldb::simulated(SimEngine::new().with_program(SimProgram::demo(PROGRAM)));
    let debugger = lldb.create_debugger().unwrap();
    let target = debugger.create_target(PROGRAM).unwrap();
    target.breakpoint_create_by_name("compute", None).unwrap();

    let process = target.launch(LaunchInfo::default()).unwrap();
    let thread = process.selected_thread().unwrap().unwrap();
    let frame = thread.frame_at_index(0).unwrap().unwrap();
    let result = frame.find_variable("result").unwrap().unwrap();
    assert!(frame.is_valid());
    assert!(result.is_valid());

    process.continue_execution().unwrap();
    assert!(!frame.is_valid());
    assert!(!result.is_valid());
    assert_eq!(frame.line(), 0);
    assert!(matches!(frame.find_variable("x"), Err(LldbindError::InvalidObject("Frame"))));
}

#[test]
fn test_terminate_invalidates_live_objects()
{
    let engine = shared_engine();
    let lldb = Lldb::with_engine(engine.clone());
    let debugger = lldb.create_debugger().unwrap();
    let target = debugger.create_target(PROGRAM).unwrap();
    target.breakpoint_create_by_name("compute", None).unwrap();
    let process = target.launch(LaunchInfo::default()).unwrap();
    let destroys = engine.stats().destroy_calls;

    lldb.terminate();
    assert!(!debugger.is_valid());
    assert!(!target.is_valid());
    assert!(!process.is_valid());
    assert_eq!(process.num_threads(), 0);
    assert!(matches!(debugger.create_target(PROGRAM), Err(LldbindError::NotInitialized)));
    assert!(matches!(target.launch(LaunchInfo::default()), Err(LldbindError::NotInitialized)));
    assert!(matches!(process.continue_execution(), Err(LldbindError::NotInitialized)));

    // Objects from a terminated runtime are dropped without engine calls
    drop(process);
    drop(target);
    drop(debugger);
    let stats = engine.stats();
    assert_eq!(stats.destroy_calls, destroys);
    assert_eq!(stats.stale_destroys, 0);
    assert_eq!(stats.uninitialized_calls, 0);
    assert_eq!(stats.terminate_calls, 1);
}

#[test]
fn test_process_keeps_runtime_alive()
{
    let engine = shared_engine();
    let process = {
        let lldb = Lldb::with_engine(engine.clone());
        let target = lldb.create_debugger().unwrap().create_target(PROGRAM).unwrap();
        target.breakpoint_create_by_name("compute", None).unwrap();
        target.launch(LaunchInfo::default()).unwrap()
    };

    assert_eq!(engine.stats().terminate_calls, 0);
    assert!(process.is_valid());
    assert!(process.is_stopped());
    assert!(process.continue_execution().unwrap());

    drop(process);
    let stats = engine.stats();
    assert_eq!(stats.terminate_calls, 1);
    assert_eq!(stats.live_handles, 0);
    assert_eq!(stats.uninitialized_calls, 0);
}

#[test]
fn test_reinitialize_does_not_revive_old_objects()
{
    let lldb = Lldb::with_engine(shared_engine());
    let debugger = lldb.create_debugger().unwrap();

    lldb.terminate();
    lldb.initialize();
    assert!(!debugger.is_valid());
    assert!(matches!(debugger.create_target(PROGRAM), Err(LldbindError::NotInitialized)));

    let fresh = lldb.create_debugger().unwrap();
    assert!(fresh.create_target(PROGRAM).is_ok());
}
