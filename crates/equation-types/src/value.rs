//! Tagged numeric values.
//!
//! Every value that flows through the compiler, the evaluation stack and the
//! variable stores is a [`TypedValue`]: one of three numeric domains plus the
//! byte width the value was declared or computed with. Arithmetic never
//! reinterprets raw bits; conversions between domains go through the rules
//! implemented here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric payload of a stack entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    I64(i64),
    U64(u64),
    F64(f64),
}

/// Numeric domain of a value.
///
/// The discriminants are the codes reported by `get_calc_data_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    I64 = 0,
    U64 = 1,
    F64 = 2,
}

/// A value together with its byte width (1, 2, 4 or 8).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypedValue {
    pub value: Value,
    pub width: u8,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::I64(_) => ValueKind::I64,
            Value::U64(_) => ValueKind::U64,
            Value::F64(_) => ValueKind::F64,
        }
    }
}

impl TypedValue {
    pub const fn new(value: Value, width: u8) -> Self {
        Self { value, width }
    }

    /// Signed 64-bit value, width 8
    pub const fn i64(v: i64) -> Self {
        Self::new(Value::I64(v), 8)
    }

    /// Unsigned 64-bit value, width 8
    pub const fn u64(v: u64) -> Self {
        Self::new(Value::U64(v), 8)
    }

    /// Double value, width 8
    pub const fn f64(v: f64) -> Self {
        Self::new(Value::F64(v), 8)
    }

    /// Boolean result as produced by comparisons: `U64` 0 or 1.
    pub const fn from_bool(b: bool) -> Self {
        Self::u64(b as u64)
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    pub fn is_float(&self) -> bool {
        matches!(self.value, Value::F64(_))
    }

    /// Plain numeric cast to double.
    pub fn to_f64(&self) -> f64 {
        match self.value {
            Value::I64(v) => v as f64,
            Value::U64(v) => v as f64,
            Value::F64(v) => v,
        }
    }

    /// Signed view of the value.
    ///
    /// Unsigned values are reinterpreted bit for bit; doubles are rounded half
    /// away from zero and saturate at the `i64` range.
    pub fn to_i64(&self) -> i64 {
        match self.value {
            Value::I64(v) => v,
            Value::U64(v) => v as i64,
            Value::F64(d) => round_half_away(d) as i64,
        }
    }

    /// Unsigned view of the value.
    ///
    /// Signed values are reinterpreted bit for bit; doubles are rounded by
    /// adding one half, negative doubles become 0.
    pub fn to_u64(&self) -> u64 {
        match self.value {
            Value::I64(v) => v as u64,
            Value::U64(v) => v,
            Value::F64(d) => (d + 0.5) as u64,
        }
    }

    /// Truth value. A double counts as true once it rounds to a non-zero integer.
    pub fn to_bool(&self) -> bool {
        match self.value {
            Value::I64(v) => v != 0,
            Value::U64(v) => v != 0,
            Value::F64(d) => d + 0.5 >= 1.0 || d - 0.5 <= -1.0,
        }
    }

    /// Value as a 128-bit signed integer, or `None` for doubles.
    pub fn to_i128(&self) -> Option<i128> {
        match self.value {
            Value::I64(v) => Some(v as i128),
            Value::U64(v) => Some(v as i128),
            Value::F64(_) => None,
        }
    }

    /// Integer view clamped into `[min, max]`, used by the signed casts.
    pub fn saturate_signed(&self, min: i64, max: i64) -> i64 {
        match self.value {
            Value::I64(v) => v.clamp(min, max),
            Value::U64(v) => {
                if v > max as u64 {
                    max
                } else {
                    (v as i64).max(min)
                }
            }
            Value::F64(d) => {
                let clamped = d.clamp(min as f64, max as f64);
                (round_half_away(clamped) as i64).clamp(min, max)
            }
        }
    }

    /// Integer view clamped into `[0, max]`, used by the unsigned casts.
    pub fn saturate_unsigned(&self, max: u64) -> u64 {
        match self.value {
            Value::I64(v) => {
                if v < 0 {
                    0
                } else {
                    (v as u64).min(max)
                }
            }
            Value::U64(v) => v.min(max),
            Value::F64(d) => {
                let clamped = d.clamp(0.0, max as f64);
                ((clamped + 0.5) as u64).min(max)
            }
        }
    }

    /// Bit mask covering the value's width.
    pub fn width_mask(&self) -> u64 {
        width_mask(self.width)
    }
}

impl Default for TypedValue {
    fn default() -> Self {
        Self::f64(0.0)
    }
}

impl From<f64> for TypedValue {
    fn from(v: f64) -> Self {
        Self::f64(v)
    }
}

impl From<i64> for TypedValue {
    fn from(v: i64) -> Self {
        Self::i64(v)
    }
}

impl From<u64> for TypedValue {
    fn from(v: u64) -> Self {
        Self::u64(v)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::I64(v) => write!(f, "{}i{}", v, self.width as u32 * 8),
            Value::U64(v) => write!(f, "{}u{}", v, self.width as u32 * 8),
            Value::F64(v) => write!(f, "{}", v),
        }
    }
}

/// Mask with the low `width` bytes set. Widths of 8 or more give all ones.
pub fn width_mask(width: u8) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (width as u32 * 8)) - 1
    }
}

fn round_half_away(d: f64) -> f64 {
    if d >= 0.0 {
        (d + 0.5).floor()
    } else {
        (d - 0.5).ceil()
    }
}
