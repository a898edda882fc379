//! Plugin tests share the process-wide registry, so every test registers
//! functions under its own names.

use super::helpers::{can_compiler, compile_error, execute};
use crate::builtins::registry::{register_builtin, PluginContext, PLUGIN_USES_CAN_DATA};
use crate::bytecode_debug::disassemble;
use crate::can::CanFrame;
use crate::compiler::Compiler;
use crate::error::{CompileError, RegistryError, VmError};
use crate::options::{CompilerOptions, Placeholder};
use crate::store::MemoryStore;
use equation_types::sync::Arc;
use equation_types::TypedValue;

fn double_it(ctx: &mut PluginContext<'_>) -> Result<(), VmError> {
    let v = ctx.stack.pop()?;
    ctx.stack.push(TypedValue::f64(v.to_f64() * 2.0))
}

fn hypot(ctx: &mut PluginContext<'_>) -> Result<(), VmError> {
    let (a, b) = ctx.stack.pop2()?;
    ctx.stack.push(TypedValue::f64(a.to_f64().hypot(b.to_f64())))
}

fn always_fails(_ctx: &mut PluginContext<'_>) -> Result<(), VmError> {
    Err(VmError::Plugin {
        name: "plugin_test_fails".to_string(),
        message: "sensor offline".to_string(),
    })
}

fn constant_seven(ctx: &mut PluginContext<'_>) -> Result<(), VmError> {
    ctx.stack.push(TypedValue::u64(7))
}

// ============================================================================
// Calling Plugins
// ============================================================================

#[test]
fn test_plugin_call_in_expression() {
    register_builtin("plugin_test_double", 1, 1, 0, double_it).unwrap();
    assert_eq!(execute("plugin_test_double(20) + 2").unwrap().to_f64(), 42.0);
    assert_eq!(
        execute("plugin_test_double(plugin_test_double(1.5))").unwrap().to_f64(),
        6.0
    );
}

#[test]
fn test_plugin_parameter_order() {
    register_builtin("plugin_test_hypot", 2, 2, 0, hypot).unwrap();
    assert_eq!(execute("plugin_test_hypot(3, 4)").unwrap().to_f64(), 5.0);
}

#[test]
fn test_plugin_without_parameters() {
    register_builtin("plugin_test_seven", 0, 0, 0, constant_seven).unwrap();
    assert_eq!(execute("plugin_test_seven() * 6").unwrap().to_u64(), 42);
}

#[test]
fn test_plugin_in_direct_evaluation() {
    register_builtin("plugin_test_direct", 1, 1, 0, double_it).unwrap();
    let compiler = Compiler::new(Arc::new(MemoryStore::new()));
    let result = compiler.evaluate("plugin_test_direct(4)").unwrap();
    assert_eq!(result.value, TypedValue::f64(8.0));
}

#[test]
fn test_plugin_error_fails_execution() {
    register_builtin("plugin_test_fails", 0, 0, 0, always_fails).unwrap();
    let store = Arc::new(MemoryStore::new());
    let mut program = Compiler::new(store).compile("1 + plugin_test_fails()").unwrap();
    assert!(matches!(
        program.execute_tagged(),
        Err(VmError::Plugin { .. })
    ));
    assert_eq!(program.execute(), 0.0);
}

#[test]
fn test_disassembly_shows_plugin_name() {
    register_builtin("plugin_test_listed", 1, 1, 0, double_it).unwrap();
    let program = Compiler::new(Arc::new(MemoryStore::new()))
        .compile("plugin_test_listed(1)")
        .unwrap();
    let listing = disassemble(&program);
    assert!(listing.lines().any(|line| line.ends_with("plugin_test_listed")));
}

// ============================================================================
// Declarations
// ============================================================================

#[test]
fn test_plugin_arity_is_checked() {
    register_builtin("plugin_test_ranged", 1, 2, 0, double_it).unwrap();
    let store = Arc::new(MemoryStore::new());
    let err = compile_error(&store, CompilerOptions::default(), "plugin_test_ranged(1, 2, 3)");
    assert_eq!(
        err.error,
        CompileError::Arity {
            function: "plugin_test_ranged".to_string(),
            expected: "1 to 2".to_string(),
            got: 3,
        }
    );
    let err = compile_error(&store, CompilerOptions::default(), "plugin_test_ranged()");
    assert!(matches!(err.error, CompileError::Arity { got: 0, .. }));
}

#[test]
fn test_duplicate_registration() {
    register_builtin("plugin_test_once", 1, 1, 0, double_it).unwrap();
    assert_eq!(
        register_builtin("plugin_test_once", 1, 1, 0, double_it),
        Err(RegistryError::Duplicate("plugin_test_once".to_string()))
    );
}

#[test]
fn test_builtin_names_are_reserved() {
    for name in ["sqrt", "canbyte", "strcmp", "phys"] {
        assert_eq!(
            register_builtin(name, 1, 1, 0, double_it),
            Err(RegistryError::Duplicate(name.to_string()))
        );
    }
}

// ============================================================================
// CAN Plugins
// ============================================================================

fn first_can_byte_plus(ctx: &mut PluginContext<'_>) -> Result<(), VmError> {
    let v = ctx.stack.pop()?;
    ctx.stack.push(TypedValue::u64(v.to_u64() + 1))
}

/// Payload size of the current frame plus the argument
fn frame_size_plus(ctx: &mut PluginContext<'_>) -> Result<(), VmError> {
    let frame = ctx.require_can_frame("plugin_test_frame_size")?;
    let extra = ctx.stack.pop()?.to_u64();
    ctx.stack.push(TypedValue::u64(frame.size() as u64 + extra))
}

#[test]
fn test_can_plugin_is_gated() {
    register_builtin(
        "plugin_test_can",
        1,
        1,
        PLUGIN_USES_CAN_DATA,
        first_can_byte_plus,
    )
    .unwrap();
    let store = Arc::new(MemoryStore::new());
    let err = compile_error(&store, CompilerOptions::default(), "plugin_test_can(1)");
    assert!(matches!(err.error, CompileError::Context(_)));

    let mut program = can_compiler(&store)
        .compile("plugin_test_can(canbyte(0))")
        .unwrap();
    assert!(program.uses_can_data());
    let frame = CanFrame::new(0x10, vec![41]);
    assert_eq!(program.execute_with_can_context(&frame).unwrap().to_u64(), 42);

    let report = can_compiler(&store)
        .check_syntax("plugin_test_can(3) + 1", false)
        .unwrap();
    assert!(report.uses_can_data);
}

#[test]
fn test_can_plugin_reads_the_frame() {
    register_builtin(
        "plugin_test_frame_size",
        1,
        1,
        PLUGIN_USES_CAN_DATA,
        frame_size_plus,
    )
    .unwrap();
    let store = Arc::new(MemoryStore::new());
    let mut program = can_compiler(&store)
        .compile("plugin_test_frame_size(100)")
        .unwrap();

    let frame = CanFrame::new(0x10, vec![1, 2, 3, 4, 5]);
    assert_eq!(program.execute_with_can_context(&frame).unwrap().to_u64(), 105);
    assert!(matches!(
        program.execute_tagged(),
        Err(VmError::Plugin { ref name, .. }) if name == "plugin_test_frame_size"
    ));
}

// ============================================================================
// Execution Context
// ============================================================================

fn parameter_times_ten(ctx: &mut PluginContext<'_>) -> Result<(), VmError> {
    ctx.stack.push(TypedValue::f64(ctx.parameter.to_f64() * 10.0))
}

fn own_opcode(ctx: &mut PluginContext<'_>) -> Result<(), VmError> {
    ctx.stack.push(TypedValue::u64(ctx.instruction.op.id().0 as u64))
}

#[test]
fn test_plugin_sees_parameter() {
    register_builtin("plugin_test_param", 0, 0, 0, parameter_times_ten).unwrap();
    let compiler = Compiler::new(Arc::new(MemoryStore::new())).with_options(CompilerOptions {
        placeholder: Placeholder::Parameter,
        ..Default::default()
    });
    let mut program = compiler.compile("plugin_test_param() + $").unwrap();
    assert_eq!(program.execute_with_parameter(1.5), 16.5);
}

#[test]
fn test_plugin_sees_its_instruction() {
    let id = register_builtin("plugin_test_opcode", 0, 0, 0, own_opcode).unwrap();
    assert_eq!(execute("plugin_test_opcode()").unwrap().to_u64(), id.0 as u64);
}
