use crate::bytecode::Program;
use crate::bytecode_debug::disassemble;
use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::store::MemoryStore;
use equation_types::sync::Arc;
use equation_types::DataType;

fn watch(source: &str) -> (Arc<MemoryStore>, Program) {
    let store = Arc::new(MemoryStore::new());
    store.define("v", DataType::F64, 0.0);
    let program = Compiler::new(store.clone()).compile(source).unwrap();
    (store, program)
}

/// Feed `inputs` through `v` and collect one result per execution
fn feed(store: &MemoryStore, program: &mut Program, inputs: &[f64]) -> Vec<f64> {
    inputs
        .iter()
        .map(|&x| {
            store.define("v", DataType::F64, x);
            program.execute()
        })
        .collect()
}

// ============================================================================
// Edge Detectors
// ============================================================================

#[test]
fn test_slope_up() {
    let (store, mut program) = watch("slope_up(v)");
    assert_eq!(feed(&store, &mut program, &[1.0, 5.0, 3.0, 4.0]), [0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn test_slope_down() {
    let (store, mut program) = watch("slope_down(v)");
    assert_eq!(feed(&store, &mut program, &[4.0, 2.0, 2.0, 3.0, 1.0]), [0.0, 1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_has_changed() {
    let (store, mut program) = watch("has_changed(v)");
    assert_eq!(feed(&store, &mut program, &[2.0, 2.0, 3.0, 3.0, 2.5]), [0.0, 0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn test_first_execution_never_fires() {
    let (store, mut program) = watch("has_changed(v)");
    assert_eq!(feed(&store, &mut program, &[100.0]), [0.0]);
}

#[test]
fn test_each_detector_keeps_its_own_state() {
    let (store, mut program) = watch("slope_up(v) + 2 * slope_up(0 - v)");
    assert_eq!(feed(&store, &mut program, &[1.0, 2.0, 1.0]), [0.0, 1.0, 2.0]);
}

// ============================================================================
// State Management
// ============================================================================

#[test]
fn test_reset_edges() {
    let (store, mut program) = watch("slope_up(v)");
    feed(&store, &mut program, &[1.0]);
    program.reset_edges();
    assert_eq!(feed(&store, &mut program, &[5.0, 6.0]), [0.0, 1.0]);
}

#[test]
fn test_shared_copy_starts_from_current_state() {
    let (store, mut program) = watch("slope_up(v)");
    feed(&store, &mut program, &[5.0]);

    let mut copy = program.share();
    assert_eq!(feed(&store, &mut copy, &[6.0]), [1.0]);
    // the source program still remembers 5
    assert_eq!(feed(&store, &mut program, &[5.5]), [1.0]);
    assert_eq!(feed(&store, &mut copy, &[5.5]), [0.0]);
}

#[test]
fn test_listing_shows_remembered_value() {
    let (store, mut program) = watch("slope_up(v)");
    assert!(disassemble(&program).contains("last=-"));
    feed(&store, &mut program, &[2.0]);
    assert!(disassemble(&program).contains("last=2"));
}

#[test]
fn test_detectors_need_a_compiled_program() {
    let store = Arc::new(MemoryStore::new());
    store.define("v", DataType::F64, 0.0);
    let compiler = Compiler::new(store);
    assert!(matches!(
        compiler.evaluate("slope_down(v)").unwrap_err().error,
        CompileError::Context(_)
    ));
    assert!(matches!(
        compiler.check_syntax("has_changed(v)", false).unwrap_err().error,
        CompileError::Context(_)
    ));
}
