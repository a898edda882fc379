use super::helpers::{execute, execute_f64, execute_in};
use crate::store::MemoryStore;
use approx::assert_relative_eq;
use equation_types::sync::Arc;
use equation_types::{DataType, TypedValue, Value};
use std::f64::consts::{E, FRAC_PI_2};

// ============================================================================
// Math Functions
// ============================================================================

#[test]
fn test_trigonometry() {
    assert_relative_eq!(execute_f64("sin(0)"), 0.0);
    assert_relative_eq!(execute_f64("cos(0)"), 1.0);
    assert_relative_eq!(execute_f64("tan(0.5)"), 0.5f64.tan());
    assert_relative_eq!(execute_f64("atan(1) * 4"), std::f64::consts::PI);
    assert_relative_eq!(execute_f64("tanh(0)"), 0.0);
    assert_relative_eq!(execute_f64("cosh(0) + sinh(0)"), 1.0);
}

#[test]
fn test_inverse_trig_domain_guards() {
    assert_relative_eq!(execute_f64("asin(1.5)"), FRAC_PI_2);
    assert_relative_eq!(execute_f64("acos(2)"), 0.0);
    assert_relative_eq!(execute_f64("asin(0.5)"), 0.5f64.asin());
}

#[test]
fn test_exponentials() {
    assert_relative_eq!(execute_f64("exp(1)"), E);
    assert_relative_eq!(execute_f64("log(exp(2))"), 2.0, epsilon = 1e-12);
    assert_relative_eq!(execute_f64("log10(1000)"), 3.0, epsilon = 1e-12);
    assert_relative_eq!(execute_f64("pow(2, 10)"), 1024.0);
    assert_relative_eq!(execute_f64("sqrt(2) * sqrt(2)"), 2.0, epsilon = 1e-12);
    assert_eq!(execute_f64("sqrt(-4)"), 0.0);
}

#[test]
fn test_rounding() {
    assert_eq!(execute_f64("round(2.5)"), 3.0);
    assert_eq!(execute_f64("round(-2.5)"), -2.0);
    assert_eq!(execute_f64("round_up(2.1)"), 3.0);
    assert_eq!(execute_f64("round_down(-2.1)"), -3.0);
}

#[test]
fn test_abs_min_max() {
    assert_eq!(execute("abs(-5)").unwrap(), TypedValue::new(Value::I64(5), 4));
    assert_eq!(execute_f64("abs(-2.5)"), 2.5);
    assert_eq!(execute("min(3, -2)").unwrap().to_i64(), -2);
    assert_eq!(execute("max(1.5, 2)").unwrap(), TypedValue::f64(2.0));
}

#[test]
fn test_modulo_function() {
    assert_eq!(execute("modulo(7, 3)").unwrap().to_i64(), 1);
    assert_eq!(execute("modulo(-7, 3)").unwrap().to_i64(), -1);
    assert_eq!(execute("modulo(7, 0)").unwrap(), TypedValue::u64(0));
}

#[test]
fn test_overflow_underflow() {
    assert_eq!(execute("overflow(0, 10, 11)").unwrap().to_i64(), 0);
    assert_eq!(execute("overflow(0, 10, 7)").unwrap().to_i64(), 7);
    assert_eq!(execute("underflow(0, 10, -1)").unwrap().to_i64(), 10);
    assert_eq!(execute_f64("underflow(0, 10, 0.5)"), 0.5);
}

#[test]
fn test_equal_decimals() {
    assert_eq!(execute_f64("equal(1.25, 1.25)"), 1.0);
    assert_eq!(execute_f64("equal(1.0, 1.05, 0.1)"), 1.0);
    assert_eq!(execute_f64("equal(1.0, 1.5, 0.1)"), 0.0);
}

// ============================================================================
// Casts
// ============================================================================

#[test]
fn test_signed_casts_clamp() {
    assert_eq!(execute("int8(300)").unwrap(), TypedValue::new(Value::I64(127), 1));
    assert_eq!(execute("int16(-40000)").unwrap(), TypedValue::new(Value::I64(-32768), 2));
    assert_eq!(execute("int32(2.4)").unwrap(), TypedValue::new(Value::I64(2), 4));
    assert_eq!(execute("int64(-1)").unwrap(), TypedValue::i64(-1));
}

#[test]
fn test_unsigned_casts_clamp() {
    assert_eq!(execute("uint8(-5)").unwrap(), TypedValue::new(Value::U64(0), 1));
    assert_eq!(execute("uint16(70000)").unwrap(), TypedValue::new(Value::U64(65535), 2));
    assert_eq!(execute("uint32(1.5)").unwrap(), TypedValue::new(Value::U64(2), 4));
    assert_eq!(execute("uint64(5)").unwrap(), TypedValue::u64(5));
}

#[test]
fn test_double_cast() {
    assert_eq!(execute("double(3)").unwrap(), TypedValue::f64(3.0));
    assert_eq!(execute_f64("double(7) / 2"), 3.5);
}

#[test]
fn test_calc_data_introspection() {
    assert_eq!(execute("get_calc_data_type(-1)").unwrap().to_i64(), 0);
    assert_eq!(execute("get_calc_data_type(1 + 1)").unwrap().to_i64(), 1);
    assert_eq!(execute("get_calc_data_type(1.5)").unwrap().to_i64(), 2);
    assert_eq!(execute("get_calc_data_width(int16(1))").unwrap().to_i64(), 2);
    assert_eq!(execute("get_calc_data_width(7)").unwrap().to_i64(), 4);
}

// ============================================================================
// Bit Functions
// ============================================================================

#[test]
fn test_bit_fields() {
    assert_eq!(execute("getbits(0xABCD, 4, 8)").unwrap().to_u64(), 0xBC);
    assert_eq!(execute("setbits(0xFFFF, 4, 8, 0)").unwrap().to_u64(), 0xF00F);
    assert_eq!(execute("andbits(0xFF, 0, 4, 5)").unwrap().to_u64(), 0xF5);
    assert_eq!(execute("orbits(0, 4, 4, 0xFF)").unwrap().to_u64(), 0xF0);
    assert_eq!(execute("xorbits(0xFF, 0, 8, 0x0F)").unwrap().to_u64(), 0xF0);
}

#[test]
fn test_bitwise_functions() {
    assert_eq!(execute("and(12, 10)").unwrap(), TypedValue::u64(8));
    assert_eq!(execute("or(12, 10)").unwrap(), TypedValue::u64(14));
    assert_eq!(execute("xor(12, 10)").unwrap().to_u64(), 6);
    assert_eq!(execute("invert(0u8)").unwrap().to_u64(), 0xFF);
    assert_eq!(execute("invert(0x0Fu16)").unwrap().to_u64(), 0xFFF0);
}

#[test]
fn test_shift_functions() {
    assert_eq!(execute("shift_left(1, 4)").unwrap().to_u64(), 16);
    assert_eq!(execute("shift_left(1, 64)").unwrap().to_u64(), 0);
    assert_eq!(execute("shift_right(256, 4)").unwrap().to_u64(), 16);
    assert_eq!(execute("shift_right(256, 32)").unwrap().to_u64(), 0);
}

#[test]
fn test_byte_swaps() {
    assert_eq!(execute("swap16(0x1234)").unwrap(), TypedValue::new(Value::U64(0x3412), 2));
    assert_eq!(
        execute("swap32(0x12345678)").unwrap(),
        TypedValue::new(Value::U64(0x7856_3412), 4)
    );
}

#[test]
fn test_byte_and_nibble_sums() {
    assert_eq!(execute("add_msb_lsb(0x1234)").unwrap(), TypedValue::i64(0x46));
    assert_eq!(execute("add_msn_lsn(0x5A)").unwrap(), TypedValue::i64(15));
}

// ============================================================================
// Raw Storage Bits
// ============================================================================

#[test]
fn test_get_binary_of_float() {
    let store = Arc::new(MemoryStore::new());
    store.define("f", DataType::F32, 1.0);
    assert_eq!(
        execute_in(&store, "get_binary(f)").unwrap(),
        TypedValue::new(Value::U64(0x3F80_0000), 4)
    );
}

#[test]
fn test_set_binary_reinterprets_bits() {
    let store = Arc::new(MemoryStore::new());
    store.define("b", DataType::I8, 0.0);
    assert_eq!(execute_in(&store, "set_binary(b, 0x80)").unwrap().to_i64(), -128);
    assert_eq!(store.value("b"), Some(TypedValue::new(Value::I64(-128), 1)));
}

#[test]
fn test_ones_complement() {
    let store = Arc::new(MemoryStore::new());
    store.define("u", DataType::U8, 0x0Fu64);
    assert_eq!(
        execute_in(&store, "ones_complement(u)").unwrap(),
        TypedValue::new(Value::U64(0xF0), 1)
    );
}
