use super::helpers::can_compiler;
use crate::can::CanFrame;
use crate::compiler::Compiler;
use crate::error::{CompileError, VmError};
use crate::store::MemoryStore;
use equation_types::sync::Arc;
use equation_types::{DataType, TypedValue, Value};

fn frame() -> CanFrame {
    let mut frame = CanFrame::new(0x18FF_0A01, vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    frame.cycles = 12;
    frame.should_be_sent = true;
    frame
}

fn run(source: &str, frame: &CanFrame) -> TypedValue {
    let store = Arc::new(MemoryStore::new());
    let mut program = can_compiler(&store).compile(source).unwrap();
    assert!(program.uses_can_data());
    program.execute_with_can_context(frame).unwrap()
}

// ============================================================================
// Frame Data Access
// ============================================================================

#[test]
fn test_byte_word_dword() {
    let frame = frame();
    assert_eq!(run("canbyte(1)", &frame).to_u64(), 0x22);
    assert_eq!(run("canword(0)", &frame).to_u64(), 0x2211);
    assert_eq!(run("candword(0)", &frame).to_u64(), 0x4433_2211);
    assert_eq!(run("canbyte(0) + canbyte(5)", &frame).to_u64(), 0x77);
}

#[test]
fn test_index_is_clamped_to_frame() {
    let frame = frame();
    assert_eq!(run("canbyte(40)", &frame).to_u64(), 0x66);
    assert_eq!(run("canword(40)", &frame).to_u64(), 0x6655);
}

#[test]
fn test_frame_metadata() {
    let frame = frame();
    assert_eq!(run("can_id()", &frame), TypedValue::u64(0x18FF_0A01));
    assert_eq!(run("can_size()", &frame).to_u64(), 6);
    assert_eq!(run("can_cycles()", &frame).to_u64(), 12);
    assert_eq!(run("can_cyclic()", &frame).to_u64(), 1);
}

#[test]
fn test_data_changed() {
    let mut frame = frame();
    assert_eq!(run("can_data_changed(0, 0)", &frame).to_u64(), 0);
    frame.data[4] = 0;
    assert_eq!(run("can_data_changed(0, 0)", &frame).to_u64(), 1);
    assert_eq!(run("can_data_changed(0, 4)", &frame).to_u64(), 0);
    assert_eq!(run("can_data_changed(3, 2)", &frame).to_u64(), 1);
}

#[test]
fn test_frame_crc_skips_crc_byte() {
    let check = CanFrame::new(1, b"123456789".to_vec());
    assert_eq!(
        run("can_crc8_rev_in_out(7, 99, 0, 0)", &check),
        TypedValue::new(Value::U64(0xF4), 1)
    );

    let mut with_crc = check.clone();
    with_crc.data.push(0xAB);
    assert_eq!(run("can_crc8_rev_in_out(7, 9, 0, 0)", &with_crc).to_u64(), 0xF4);
}

#[test]
fn test_frame_crc_arguments_saturate() {
    let frame = frame();
    let crc = |source: &str| run(source, &frame).to_u64();
    assert_eq!(crc("can_crc8_rev_in_out(0x107, 99, 0, 0)"), 155);
    assert_eq!(crc("can_crc8_rev_in_out(0x107, 99, 0, 0)"), crc("can_crc8_rev_in_out(0xFF, 99, 0, 0)"));
    // index 0x102 clamps past the payload, nothing is skipped
    assert_eq!(crc("can_crc8_rev_in_out(7, 0x102, 0, 0)"), crc("can_crc8_rev_in_out(7, 99, 0, 0)"));
    assert_eq!(crc("can_crc8_rev_in_out(7, 99, 0x100, 0)"), crc("can_crc8_rev_in_out(7, 99, 1, 0)"));
    assert_eq!(crc("can_crc8_rev_in_out(7, 99, -1, 0)"), crc("can_crc8_rev_in_out(7, 99, 0, 0)"));
}

#[test]
fn test_can_data_with_variables() {
    let store = Arc::new(MemoryStore::new());
    store.define("index", DataType::U8, 2u64);
    let mut program = can_compiler(&store).compile("canbyte(index) * 2").unwrap();
    assert_eq!(program.execute_with_can_context(&frame()).unwrap().to_u64(), 0x66);
}

// ============================================================================
// Context Rules
// ============================================================================

#[test]
fn test_missing_frame_is_a_runtime_error() {
    let store = Arc::new(MemoryStore::new());
    let mut program = can_compiler(&store).compile("can_size() + 1").unwrap();
    assert!(matches!(
        program.execute_tagged(),
        Err(VmError::MissingCanFrame(_))
    ));
    assert_eq!(program.execute(), 0.0);
}

#[test]
fn test_can_builtins_need_can_configuration() {
    let store = Arc::new(MemoryStore::new());
    let err = Compiler::new(store.clone()).compile("canbyte(0)").unwrap_err();
    assert!(matches!(err.error, CompileError::Context(_)));

    let err = can_compiler(&store).evaluate("canbyte(0)").unwrap_err();
    assert!(matches!(err.error, CompileError::Context(_)));
}

#[test]
fn test_plain_program_does_not_use_can_data() {
    let store = Arc::new(MemoryStore::new());
    let program = can_compiler(&store).compile("1 + 2").unwrap();
    assert!(!program.uses_can_data());
}

#[test]
fn test_syntax_check_stubs_frame_reads() {
    let store = Arc::new(MemoryStore::new());
    let report = can_compiler(&store)
        .check_syntax("canword(1) + can_data_changed(0, 8)", false)
        .unwrap();
    assert!(report.uses_can_data);
    assert!(report.warnings.is_empty());

    let report = can_compiler(&store).check_syntax("2 * 3", false).unwrap();
    assert!(!report.uses_can_data);
}
