use super::helpers::compile_error;
use crate::compiler::Compiler;
use crate::error::{BindingKind, CompileError};
use crate::options::{CompilerOptions, MissingVariables};
use crate::store::MemoryStore;
use equation_types::sync::Arc;
use equation_types::DataType;

fn with_policy(missing_variables: MissingVariables) -> CompilerOptions {
    CompilerOptions {
        missing_variables,
        ..Default::default()
    }
}

// ============================================================================
// Attachment Counting
// ============================================================================

#[test]
fn test_one_attachment_per_access() {
    let store = Arc::new(MemoryStore::new());
    store.define("x", DataType::F64, 1.0);
    store.define("y", DataType::F64, 2.0);

    let program = Compiler::new(store.clone()).compile("x + x * y").unwrap();
    assert_eq!(program.bindings().count(), 3);
    assert_eq!(store.attachments("x"), Some(2));
    assert_eq!(store.attachments("y"), Some(1));

    drop(program);
    assert_eq!(store.attachments("x"), Some(0));
    assert_eq!(store.attachments("y"), Some(0));
}

#[test]
fn test_compound_assignment_binds_twice() {
    let store = Arc::new(MemoryStore::new());
    store.define("x", DataType::I32, 0.0);
    let program = Compiler::new(store.clone()).compile("x += 1").unwrap();
    assert_eq!(store.attachments("x"), Some(2));
    drop(program);
    assert_eq!(store.attachments("x"), Some(0));
}

#[test]
fn test_shared_programs_release_independently() {
    let store = Arc::new(MemoryStore::new());
    store.define("x", DataType::F64, 1.0);
    let program = Compiler::new(store.clone()).compile("x * 2").unwrap();
    let copy = program.share();
    assert_eq!(store.attachments("x"), Some(2));
    assert_eq!(copy.source(), "x * 2");

    drop(program);
    assert_eq!(store.attachments("x"), Some(1));
    drop(copy);
    assert_eq!(store.attachments("x"), Some(0));
}

#[test]
fn test_failed_compile_leaves_counts_unchanged() {
    let store = Arc::new(MemoryStore::new());
    store.define("x", DataType::F64, 1.0);
    let err = compile_error(&store, CompilerOptions::default(), "x + newvar + nosuch(1)");
    assert!(matches!(err.error, CompileError::Syntax(_)));
    assert_eq!(store.attachments("x"), Some(0));
    assert!(!store.contains("newvar"));
}

// ============================================================================
// Created Variables
// ============================================================================

#[test]
fn test_created_variable_lives_with_program() {
    let store = Arc::new(MemoryStore::new());
    let mut program = Compiler::new(store.clone()).compile("fresh = 4").unwrap();
    assert!(store.contains("fresh"));
    assert_eq!(program.execute(), 4.0);
    assert_eq!(store.value("fresh").map(|v| v.to_f64()), Some(4.0));

    drop(program);
    assert!(!store.contains("fresh"));
}

#[test]
fn test_owner_is_recorded_on_creation() {
    let store = Arc::new(MemoryStore::new());
    store.define("known", DataType::F64, 0.0);
    let options = CompilerOptions {
        owner_pid: Some(77),
        ..Default::default()
    };
    let _program = Compiler::new(store.clone())
        .with_options(options)
        .compile("made = known")
        .unwrap();
    assert_eq!(store.owner("made"), Some(77));
    assert_eq!(store.owner("known"), None);
}

#[test]
fn test_registration_tracks_live_programs() {
    let store = Arc::new(MemoryStore::new());
    let compiler = Compiler::new(store.clone());
    let mut first = compiler.compile("1").unwrap();
    let mut second = compiler.compile("2").unwrap();
    first.set_registration(3);
    second.set_registration(9);
    assert_eq!(store.live_equations(), vec![3, 9]);

    let copy = first.share();
    assert_eq!(copy.registration(), 0);
    drop(first);
    assert_eq!(store.live_equations(), vec![9]);
}

// ============================================================================
// Missing Variable Policies
// ============================================================================

#[test]
fn test_stop_on_access() {
    let store = Arc::new(MemoryStore::new());
    let options = with_policy(MissingVariables::StopOnAccess);
    let err = compile_error(&store, options.clone(), "ghost + 1");
    assert_eq!(err.error, CompileError::binding(BindingKind::Read, "ghost"));
    let err = compile_error(&store, options, "ghost = 1");
    assert_eq!(err.error, CompileError::binding(BindingKind::Write, "ghost"));
    assert!(!store.contains("ghost"));
}

#[test]
fn test_stop_on_write_still_creates_on_read() {
    let store = Arc::new(MemoryStore::new());
    let options = with_policy(MissingVariables::StopOnWrite);
    let err = compile_error(&store, options.clone(), "ghost = 1");
    assert_eq!(err.error, CompileError::binding(BindingKind::Write, "ghost"));

    let program = Compiler::new(store.clone())
        .with_options(options)
        .compile("ghost + 1")
        .unwrap();
    assert!(program.warnings().is_empty());
    assert!(store.contains("ghost"));
}

#[test]
fn test_warn_on_access_records_every_creation() {
    let store = Arc::new(MemoryStore::new());
    let program = Compiler::new(store.clone())
        .with_options(with_policy(MissingVariables::WarnOnAccess))
        .compile("out = in * 2")
        .unwrap();
    assert_eq!(
        program.warnings(),
        [
            "cannot read from variable \"in\"",
            "cannot write to variable \"out\""
        ]
    );
}

#[test]
fn test_warnings_survive_a_later_stop() {
    let store = Arc::new(MemoryStore::new());
    let err = compile_error(
        &store,
        with_policy(MissingVariables::WarnOnAccess),
        "in * 2 + (",
    );
    assert_eq!(err.warnings, ["cannot read from variable \"in\""]);
    assert!(err.report().starts_with("cannot read from variable \"in\"\n"));
}
