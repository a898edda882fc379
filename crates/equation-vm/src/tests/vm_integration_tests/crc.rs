use super::helpers::{compile_error, execute, execute_in};
use crate::error::CompileError;
use crate::options::CompilerOptions;
use crate::store::MemoryStore;
use equation_types::sync::Arc;
use equation_types::{DataType, TypedValue, Value};

/// The ASCII check string "123456789" as parameters
const CHECK: &str = "49, 50, 51, 52, 53, 54, 55, 56, 57";

fn crc(function: &str, params: &str) -> TypedValue {
    execute(&format!("{}({}, {})", function, params, CHECK)).unwrap()
}

// ============================================================================
// User Polynomial
// ============================================================================

#[test]
fn test_crc8_user_poly() {
    assert_eq!(
        crc("crc8_user_poly", "0xFF, 0x1D"),
        TypedValue::new(Value::U64(0x4B), 1)
    );
}

#[test]
fn test_crc16_user_poly() {
    assert_eq!(
        crc("crc16_user_poly", "0, 0x8005"),
        TypedValue::new(Value::U64(0xBB3D), 2)
    );
}

#[test]
fn test_user_poly_without_data() {
    let result = execute("crc8_user_poly(0, 0x1D)").unwrap();
    assert_eq!(result, TypedValue::new(Value::U64(0xFF), 1));
}

// ============================================================================
// Reflect Family
// ============================================================================

#[test]
fn test_crc8_reflect_variants() {
    assert_eq!(
        crc("crc8_user_poly_reflect", "0x07, 0, 0, 0, 0"),
        TypedValue::new(Value::U64(0xF4), 1)
    );
    assert_eq!(
        crc("crc8_user_poly_reflect", "0x31, 0, 0, 1, 1").to_u64(),
        0xA1
    );
}

#[test]
fn test_crc16_reflect() {
    assert_eq!(
        crc("crc16_user_poly_reflect", "0x1021, 0xFFFF, 0, 0, 0"),
        TypedValue::new(Value::U64(0x29B1), 2)
    );
}

#[test]
fn test_crc32_reflect() {
    assert_eq!(
        crc(
            "crc32_user_poly_reflect",
            "0x04C11DB7, 0xFFFFFFFF, 0xFFFFFFFF, 1, 1"
        ),
        TypedValue::new(Value::U64(0xCBF4_3926), 4)
    );
}

#[test]
fn test_data_bytes_from_variables() {
    let store = Arc::new(MemoryStore::new());
    for (i, b) in b"123456789".iter().enumerate() {
        store.define(&format!("b{}", i), DataType::U8, *b as u64);
    }
    let source = "crc8_user_poly(0xFF, 0x1D, b0, b1, b2, b3, b4, b5, b6, b7, b8)";
    assert_eq!(execute_in(&store, source).unwrap().to_u64(), 0x4B);
}

#[test]
fn test_crc_result_composes() {
    let result = execute(&format!("crc8_user_poly(0xFF, 0x1D, {}) + 1", CHECK)).unwrap();
    assert_eq!(result.to_u64(), 0x4C);
}

// ============================================================================
// Parameter Counts
// ============================================================================

#[test]
fn test_too_few_parameters() {
    let store = Arc::new(MemoryStore::new());
    let err = compile_error(&store, CompilerOptions::default(), "crc8_user_poly(0xFF)");
    assert_eq!(
        err.error,
        CompileError::Arity {
            function: "crc8_user_poly".to_string(),
            expected: "2 to 32".to_string(),
            got: 1,
        }
    );

    let err = compile_error(
        &store,
        CompilerOptions::default(),
        "crc16_user_poly_reflect(0x1021, 0, 0, 0)",
    );
    assert!(matches!(err.error, CompileError::Arity { got: 4, .. }));
}
