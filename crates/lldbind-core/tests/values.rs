//! Tests for frames, values, types, modules and the command interpreter

use lldbind_core::engine::sim::{SimEngine, SimProgram};
use lldbind_core::prelude::*;
use lldbind_core::types::SymbolContextItem;

const PROGRAM: &str = "/usr/local/bin/demo";

/// A target stopped at the first call of `compute(21)`.
fn stopped_in_compute() -> (Target, Process, Frame)
{
    let lldb = Lldb::simulated(SimEngine::new().with_program(SimProgram::demo(PROGRAM)));
    let target = lldb.create_debugger().unwrap().create_target(PROGRAM).unwrap();
    target.breakpoint_create_by_name("compute", None).unwrap();
    let process = target.launch(LaunchInfo::default()).unwrap();
    let frame = process
        .selected_thread()
        .unwrap()
        .unwrap()
        .selected_frame()
        .unwrap()
        .unwrap();
    (target, process, frame)
}

#[test]
fn test_frame_location()
{
    let (_target, _process, frame) = stopped_in_compute();

    assert_eq!(frame.frame_id(), 0);
    assert_eq!(frame.function_name().as_deref(), Some("compute"));
    assert_eq!(frame.display_function_name().as_deref(), Some("compute(int)"));
    assert_eq!(frame.file_path().as_deref(), Some("main.c"));
    assert_eq!(frame.line(), 3);
    assert_eq!(frame.column(), 3);
    assert_eq!(frame.pc(), 0x40_1200);
    assert!(frame.sp() < frame.fp());
    assert!(!frame.is_inlined());

    let listing = frame.disassemble().unwrap();
    assert!(listing.contains("->  0x401200"));

    let context = frame.symbol_context(SymbolContextItem::EVERYTHING).unwrap().unwrap();
    assert_eq!(context.function_name().as_deref(), Some("compute"));
    assert_eq!(context.module().unwrap().file_path().as_deref(), Some(PROGRAM));
    assert_eq!(frame.module().unwrap().unwrap().file_path().as_deref(), Some(PROGRAM));
}

#[test]
fn test_find_variable()
{
    let (_target, _process, frame) = stopped_in_compute();

    let x = frame.find_variable("x").unwrap().unwrap();
    assert_eq!(x.name().as_deref(), Some("x"));
    assert_eq!(x.value().as_deref(), Some("21"));
    assert_eq!(x.signed(), 21);
    assert_eq!(x.type_name().as_deref(), Some("int"));
    assert_eq!(x.byte_size(), 4);
    assert_eq!(x.value_type(), ValueType::VariableArgument);
    assert!(!x.has_error().unwrap());

    let result = frame.find_variable("result").unwrap().unwrap();
    assert_eq!(result.unsigned(), 42);
    assert_eq!(result.value_type(), ValueType::VariableLocal);

    assert!(frame.find_variable("missing").unwrap().is_none());
}

#[test]
fn test_struct_children()
{
    let (_target, _process, frame) = stopped_in_compute();
    let point = frame.find_variable("point").unwrap().unwrap();

    assert_eq!(point.type_name().as_deref(), Some("point"));
    assert_eq!(point.value(), None);
    assert!(point.might_have_children());
    assert_eq!(point.num_children(), 2);

    let children = point.children();
    assert_eq!(children[0].name().as_deref(), Some("x"));
    assert_eq!(children[0].signed(), 3);
    assert_eq!(children[1].expression_path().as_deref(), Some("point.y"));

    let y = point.child_member_with_name("y").unwrap().unwrap();
    assert_eq!(y.signed(), 4);
    assert_eq!(y.load_address(), point.load_address() + 4);
    assert!(point.child_member_with_name("z").unwrap().is_none());
}

#[test]
fn test_evaluate()
{
    let (_target, _process, frame) = stopped_in_compute();

    assert_eq!(frame.evaluate("x").unwrap().signed(), 21);
    assert_eq!(frame.evaluate("point.y").unwrap().signed(), 4);

    let literal = frame.evaluate("0x10").unwrap();
    assert_eq!(literal.signed(), 16);
    assert_eq!(literal.value_type(), ValueType::ConstantResult);
    assert!(literal.name().unwrap().starts_with('$'));

    let err = frame.evaluate("nosuch").unwrap_err();
    assert!(matches!(&err, LldbindError::Evaluation(message) if message == "error: use of undeclared identifier 'nosuch'"));

    // The lenient form hands back the failed value
    let failed = frame.evaluate_expression("nosuch").unwrap().unwrap();
    assert!(failed.has_error().unwrap());
    assert_eq!(
        failed.error().unwrap().message(),
        Some("error: use of undeclared identifier 'nosuch'")
    );
}

#[test]
fn test_value_for_variable_path()
{
    let (_target, _process, frame) = stopped_in_compute();

    let x = frame.value_for_variable_path("point.x").unwrap().unwrap();
    assert_eq!(x.signed(), 3);
    assert!(frame.value_for_variable_path("point.z").unwrap().is_none());
}

#[test]
fn test_variables_and_registers()
{
    let (_target, _process, frame) = stopped_in_compute();

    let all = frame.variables(VariableOptions::default()).unwrap().unwrap();
    assert_eq!(all.len(), 3);
    assert!(!all.is_empty());
    let names: Vec<String> = all.to_vec().iter().filter_map(Value::name).collect();
    assert_eq!(names, ["x", "result", "point"]);
    assert_eq!(all.first_by_name("result").unwrap().unwrap().signed(), 42);
    assert!(all.get(3).unwrap().is_none());

    let arguments = VariableOptions {
        locals: false,
        ..VariableOptions::default()
    };
    let only_args = frame.variables(arguments).unwrap().unwrap();
    assert_eq!(only_args.len(), 1);

    let registers = frame.registers().unwrap().unwrap();
    let gpr = registers.get(0).unwrap().unwrap();
    assert_eq!(gpr.value_type(), ValueType::RegisterSet);
    let rip = gpr.child_member_with_name("rip").unwrap().unwrap();
    assert_eq!(rip.unsigned(), frame.pc());
    assert_eq!(rip.value_type(), ValueType::Register);
}

#[test]
fn test_set_value_from_str()
{
    let (_target, _process, frame) = stopped_in_compute();
    let result = frame.find_variable("result").unwrap().unwrap();

    assert!(result.set_value_from_str("7").unwrap());
    assert_eq!(frame.find_variable("result").unwrap().unwrap().signed(), 7);

    let err = result.set_value_from_str("seven").unwrap_err();
    assert_eq!(err.to_string(), "error: could not parse 'seven' as an integer");

    let point = frame.find_variable("point").unwrap().unwrap();
    let err = point.set_value_from_str("1").unwrap_err();
    assert!(matches!(&err, LldbindError::Engine(message) if message == "error: cannot assign to a value of type 'point'"));
}

#[test]
fn test_pointer_round_trip()
{
    let (_target, _process, frame) = stopped_in_compute();
    let result = frame.find_variable("result").unwrap().unwrap();

    let pointer = result.address_of().unwrap().unwrap();
    assert!(pointer.is_pointer_type());
    assert_eq!(pointer.type_name().as_deref(), Some("int *"));
    assert_eq!(pointer.unsigned(), result.load_address());

    let pointee = pointer.dereference().unwrap().unwrap();
    assert_eq!(pointee.signed(), 42);

    // Dereferencing a non-pointer yields a value carrying the error
    let bad = result.dereference().unwrap().unwrap();
    assert!(bad.has_error().unwrap());
    assert_eq!(bad.value(), None);
}

#[test]
fn test_types()
{
    let (_target, _process, frame) = stopped_in_compute();
    let x = frame.find_variable("x").unwrap().unwrap();
    let int = x.type_info().unwrap().unwrap();

    assert_eq!(int.name().as_deref(), Some("int"));
    assert_eq!(int.byte_size(), 4);
    assert_eq!(int.basic_type(), BasicType::Int);
    assert!(!int.is_pointer());

    let pointer = int.pointer_type().unwrap().unwrap();
    assert!(pointer.is_pointer());
    assert_eq!(pointer.name().as_deref(), Some("int *"));
    assert_eq!(pointer.byte_size(), 8);
    assert_eq!(pointer.pointee_type().unwrap().unwrap().name().as_deref(), Some("int"));
    assert!(int.pointee_type().unwrap().is_none());

    let point = frame.find_variable("point").unwrap().unwrap();
    let point_type = point.type_info().unwrap().unwrap();
    assert_eq!(point_type.num_fields(), 2);
    assert_eq!(point_type.basic_type(), BasicType::Invalid);
}

#[test]
fn test_synthesized_values()
{
    let (_target, _process, frame) = stopped_in_compute();
    let point = frame.find_variable("point").unwrap().unwrap();
    let result = frame.find_variable("result").unwrap().unwrap();
    let int = result.type_info().unwrap().unwrap();

    assert_eq!(point.cast(&int).unwrap().unwrap().signed(), 3);

    let y = point.create_child_at_offset("y", &int, 4).unwrap().unwrap();
    assert_eq!(y.signed(), 4);

    let copy = point.create_value_from_address("copy", result.load_address(), &int).unwrap().unwrap();
    assert_eq!(copy.name().as_deref(), Some("copy"));
    assert_eq!(copy.signed(), 42);

    let from_expr = point.create_value_from_expression("tmp", "x").unwrap().unwrap();
    assert_eq!(from_expr.name().as_deref(), Some("tmp"));
    assert_eq!(from_expr.signed(), 21);

    let raw = point.non_synthetic_value().unwrap().unwrap();
    assert_eq!(raw.num_children(), 2);
}

#[test]
fn test_target_level_evaluation_and_modules()
{
    let (target, _process, _frame) = stopped_in_compute();

    let two = target.evaluate_expression("2").unwrap().unwrap();
    assert_eq!(two.signed(), 2);
    // No frame in scope, so variables are unknown
    let x = target.evaluate_expression("x").unwrap().unwrap();
    assert!(x.has_error().unwrap());

    assert_eq!(target.num_modules(), 2);
    let modules = target.modules();
    assert_eq!(modules[0].file_path().as_deref(), Some(PROGRAM));
    assert_eq!(modules[0].num_symbols(), 4);
    assert_eq!(modules[1].file_path().as_deref(), Some("/usr/lib/x86_64-linux-gnu/libc.so.6"));
    assert_eq!(target.address_byte_size(), 8);
    assert_eq!(target.triple().as_deref(), Some("x86_64-unknown-linux-gnu"));
}

#[test]
fn test_command_interpreter()
{
    let lldb = Lldb::simulated(SimEngine::new().with_program(SimProgram::demo(PROGRAM)));
    let debugger = lldb.create_debugger().unwrap();
    let interpreter = debugger.command_interpreter().unwrap().unwrap();

    let version = interpreter.handle_command("version", false).unwrap();
    assert!(version.succeeded());
    assert_eq!(version.output().as_deref(), Some("lldb version 17.0.6\n"));
    assert_eq!(version.error(), None);

    let bogus = interpreter.handle_command("bogus", true).unwrap();
    assert!(!bogus.succeeded());
    assert_eq!(bogus.error().as_deref(), Some("error: 'bogus' is not a valid command.\n"));
    bogus.clear().unwrap();
    assert_eq!(bogus.error(), None);

    assert!(interpreter.command_exists("breakpoint"));
    assert!(!interpreter.command_exists("bogus"));
    assert!(interpreter.alias_exists("b"));

    let target = debugger.create_target(PROGRAM).unwrap();
    let empty = interpreter.handle_command("breakpoint list", false).unwrap();
    assert_eq!(empty.output().as_deref(), Some("No breakpoints currently set.\n"));
    target.breakpoint_create_by_name("compute", None).unwrap();
    let listed = interpreter.handle_command("br list", false).unwrap();
    assert!(listed.output().unwrap().starts_with("Current breakpoints:\n1: "));

    debugger.handle_command("version").unwrap();
}
