//! Value operation helpers
//!
//! Integer operands are widened to `i128`, combined, and narrowed back with
//! saturation: a negative result becomes `I64` (floor `i64::MIN`), anything
//! else becomes `U64` (ceiling `u64::MAX`). As soon as one operand is a
//! double the operation runs in `f64` instead.

use equation_types::{TypedValue, Value};
use std::cmp::Ordering;

/// Implementation of value operations for the VM
pub(crate) struct ValueOperations;

impl ValueOperations {
    /// Narrow a 128-bit intermediate into the 64-bit result domain
    pub(crate) fn saturate(r: i128) -> TypedValue {
        if r < 0 {
            TypedValue::i64(r.max(i64::MIN as i128) as i64)
        } else {
            TypedValue::u64(r.min(u64::MAX as i128) as u64)
        }
    }

    fn ints(left: &TypedValue, right: &TypedValue) -> Option<(i128, i128)> {
        Some((left.to_i128()?, right.to_i128()?))
    }

    pub(crate) fn add_values(left: &TypedValue, right: &TypedValue) -> TypedValue {
        match Self::ints(left, right) {
            Some((a, b)) => Self::saturate(a + b),
            None => TypedValue::f64(left.to_f64() + right.to_f64()),
        }
    }

    pub(crate) fn sub_values(left: &TypedValue, right: &TypedValue) -> TypedValue {
        match Self::ints(left, right) {
            Some((a, b)) => Self::saturate(a - b),
            None => TypedValue::f64(left.to_f64() - right.to_f64()),
        }
    }

    pub(crate) fn mul_values(left: &TypedValue, right: &TypedValue) -> TypedValue {
        match Self::ints(left, right) {
            // u64 * u64 can exceed i128
            Some((a, b)) => match a.checked_mul(b) {
                Some(r) => Self::saturate(r),
                None if (a < 0) != (b < 0) => TypedValue::i64(i64::MIN),
                None => TypedValue::u64(u64::MAX),
            },
            None => TypedValue::f64(left.to_f64() * right.to_f64()),
        }
    }

    /// Division truncating toward zero. Division by zero yields a sentinel.
    pub(crate) fn div_values(left: &TypedValue, right: &TypedValue) -> TypedValue {
        match Self::ints(left, right) {
            Some((_, 0)) => TypedValue::u64(u64::MAX),
            Some((a, b)) => Self::saturate(a / b),
            None => TypedValue::f64(Self::float_div(left.to_f64(), right.to_f64())),
        }
    }

    /// Remainder carrying the sign of the dividend
    pub(crate) fn mod_values(left: &TypedValue, right: &TypedValue) -> TypedValue {
        match Self::ints(left, right) {
            Some((_, 0)) => TypedValue::u64(0),
            Some((a, b)) => Self::saturate(a % b),
            None => {
                let (a, b) = (left.to_f64(), right.to_f64());
                if b == 0.0 {
                    TypedValue::f64(Self::float_div(a, b))
                } else {
                    TypedValue::f64(a % b)
                }
            }
        }
    }

    fn float_div(a: f64, b: f64) -> f64 {
        if b != 0.0 {
            a / b
        } else if a > 0.0 {
            f64::MAX
        } else if a < 0.0 {
            -f64::MAX
        } else {
            1.0
        }
    }

    pub(crate) fn neg_value(value: &TypedValue) -> TypedValue {
        match value.value {
            Value::I64(v) => TypedValue::i64(v.wrapping_neg()),
            Value::U64(v) => TypedValue::i64((v as i64).wrapping_neg()),
            Value::F64(d) => TypedValue::f64(-d),
        }
    }

    /// Exact equality; doubles compare by their difference
    pub(crate) fn eq_values(left: &TypedValue, right: &TypedValue) -> bool {
        match Self::ints(left, right) {
            Some((a, b)) => a == b,
            None => {
                let d = left.to_f64() - right.to_f64();
                d <= 0.0 && d >= 0.0
            }
        }
    }

    /// Ordering for `< <= > >=`, `min` and `max`
    ///
    /// `None` when a NaN is involved; every ordering test is then false.
    pub(crate) fn cmp_values(left: &TypedValue, right: &TypedValue) -> Option<Ordering> {
        match Self::ints(left, right) {
            Some((a, b)) => Some(a.cmp(&b)),
            None => left.to_f64().partial_cmp(&right.to_f64()),
        }
    }
}
