//! Storage types of store variables.

use crate::value::{TypedValue, Value};
use serde::{Deserialize, Serialize};

/// How a variable is laid out in its store.
///
/// `Unknown` marks a variable that was created by name before anyone declared
/// a type for it; it stores whatever value is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DataType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    #[default]
    Unknown,
}

impl DataType {
    /// Byte width of the storage slot.
    pub fn width(self) -> u8 {
        match self {
            DataType::I8 | DataType::U8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::I32 | DataType::U32 | DataType::F32 => 4,
            DataType::I64 | DataType::U64 | DataType::F64 | DataType::Unknown => 8,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            DataType::I8 | DataType::I16 | DataType::I32 | DataType::I64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::F32 | DataType::F64 | DataType::Unknown)
    }

    /// Convert a value into this storage type, saturating integer targets.
    pub fn coerce(self, v: TypedValue) -> TypedValue {
        match self {
            DataType::I8 => TypedValue::new(Value::I64(v.saturate_signed(i8::MIN as i64, i8::MAX as i64)), 1),
            DataType::I16 => TypedValue::new(Value::I64(v.saturate_signed(i16::MIN as i64, i16::MAX as i64)), 2),
            DataType::I32 => TypedValue::new(Value::I64(v.saturate_signed(i32::MIN as i64, i32::MAX as i64)), 4),
            DataType::I64 => TypedValue::new(Value::I64(v.saturate_signed(i64::MIN, i64::MAX)), 8),
            DataType::U8 => TypedValue::new(Value::U64(v.saturate_unsigned(u8::MAX as u64)), 1),
            DataType::U16 => TypedValue::new(Value::U64(v.saturate_unsigned(u16::MAX as u64)), 2),
            DataType::U32 => TypedValue::new(Value::U64(v.saturate_unsigned(u32::MAX as u64)), 4),
            DataType::U64 => TypedValue::new(Value::U64(v.saturate_unsigned(u64::MAX)), 8),
            DataType::F32 => TypedValue::new(Value::F64(v.to_f64() as f32 as f64), 4),
            DataType::F64 | DataType::Unknown => TypedValue::f64(v.to_f64()),
        }
    }

    /// Raw storage bits of a value already held in this type.
    pub fn to_bits(self, v: TypedValue) -> u64 {
        match self {
            DataType::F32 => (v.to_f64() as f32).to_bits() as u64,
            DataType::F64 | DataType::Unknown => v.to_f64().to_bits(),
            _ => v.to_u64() & crate::value::width_mask(self.width()),
        }
    }

    /// Reinterpret raw storage bits as a typed value.
    pub fn from_bits(self, bits: u64) -> TypedValue {
        match self {
            DataType::I8 => TypedValue::new(Value::I64(bits as u8 as i8 as i64), 1),
            DataType::I16 => TypedValue::new(Value::I64(bits as u16 as i16 as i64), 2),
            DataType::I32 => TypedValue::new(Value::I64(bits as u32 as i32 as i64), 4),
            DataType::I64 => TypedValue::new(Value::I64(bits as i64), 8),
            DataType::U8 => TypedValue::new(Value::U64(bits & 0xFF), 1),
            DataType::U16 => TypedValue::new(Value::U64(bits & 0xFFFF), 2),
            DataType::U32 => TypedValue::new(Value::U64(bits & 0xFFFF_FFFF), 4),
            DataType::U64 => TypedValue::new(Value::U64(bits), 8),
            DataType::F32 => TypedValue::new(Value::F64(f32::from_bits(bits as u32) as f64), 4),
            DataType::F64 | DataType::Unknown => TypedValue::f64(f64::from_bits(bits)),
        }
    }
}
