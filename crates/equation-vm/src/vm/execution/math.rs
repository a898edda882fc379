//! Math instruction execution

use crate::error::VmError;
use crate::opcode::OpCode;
use crate::vm::ops::ValueOperations;
use crate::vm::Vm;
use equation_types::{TypedValue, Value};
use std::cmp::Ordering;
use std::f64::consts::FRAC_PI_2;

impl Vm<'_> {
    /// Execute math instructions
    pub(crate) fn execute_math(&mut self, opcode: OpCode) -> Result<(), VmError> {
        use OpCode::*;
        let result = match opcode {
            Sin | Cos | Tan | Sinh | Cosh | Tanh | Asin | Acos | Atan | Exp | Sqrt | Log
            | Log10 | Round | RoundUp | RoundDown => {
                let x = self.stack.pop()?.to_f64();
                TypedValue::f64(unary(opcode, x))
            }
            Pow => {
                let (base, exp) = self.stack.pop2()?;
                TypedValue::f64(base.to_f64().powf(exp.to_f64()))
            }
            Abs => abs(self.stack.pop()?),
            Min | Max => {
                let (a, b) = self.stack.pop2()?;
                min_max(opcode, a, b)
            }
            Overflow | Underflow => {
                let args = self.stack.pop_n(3)?;
                limit(opcode, args[0], args[1], args[2])
            }
            EqualDecimals => {
                let args = self.stack.pop_n(3)?;
                let diff = (args[0].to_f64() - args[1].to_f64()).abs();
                TypedValue::from_bool(diff <= args[2].to_f64().abs())
            }
            _ => unreachable!("not a math opcode: {}", opcode),
        };
        self.stack.push(result)
    }
}

fn unary(opcode: OpCode, x: f64) -> f64 {
    match opcode {
        OpCode::Sin => x.sin(),
        OpCode::Cos => x.cos(),
        OpCode::Tan => x.tan(),
        OpCode::Sinh => x.sinh(),
        OpCode::Cosh => x.cosh(),
        OpCode::Tanh => x.tanh(),
        OpCode::Asin if x >= 1.0 => FRAC_PI_2,
        OpCode::Asin => x.asin(),
        OpCode::Acos if x >= 1.0 => 0.0,
        OpCode::Acos => x.acos(),
        OpCode::Atan => x.atan(),
        OpCode::Exp => x.exp(),
        OpCode::Sqrt if x <= 0.0 => 0.0,
        OpCode::Sqrt => x.sqrt(),
        OpCode::Log => x.ln(),
        OpCode::Log10 => x.log10(),
        OpCode::Round => (x + 0.5).floor(),
        OpCode::RoundUp => x.ceil(),
        OpCode::RoundDown => x.floor(),
        _ => unreachable!("not a unary math opcode: {}", opcode),
    }
}

/// Absolute value in the operand's own domain and width
fn abs(v: TypedValue) -> TypedValue {
    let value = match v.value {
        Value::I64(i) => Value::I64(i.wrapping_abs()),
        Value::U64(u) => Value::U64(u),
        Value::F64(d) => Value::F64(d.abs()),
    };
    TypedValue::new(value, v.width)
}

/// Integer operands keep their tag; a double on either side compares as double
fn min_max(opcode: OpCode, a: TypedValue, b: TypedValue) -> TypedValue {
    if a.is_float() || b.is_float() {
        let (x, y) = (a.to_f64(), b.to_f64());
        return TypedValue::f64(match opcode {
            OpCode::Min if y < x => y,
            OpCode::Max if y > x => y,
            _ => x,
        });
    }
    let ord = ValueOperations::cmp_values(&a, &b);
    match (opcode, ord) {
        (OpCode::Min, Some(Ordering::Less)) | (OpCode::Max, Some(Ordering::Greater)) => a,
        _ => b,
    }
}

/// `overflow(min, max, x)` and `underflow(min, max, x)`
///
/// Overflow yields `min` once `x` exceeds `max`; underflow yields `max` once
/// `x` drops below `min`. Otherwise `x` passes through.
fn limit(opcode: OpCode, min: TypedValue, max: TypedValue, x: TypedValue) -> TypedValue {
    if opcode == OpCode::Overflow {
        let above = if max.is_float() || x.is_float() {
            x.to_f64() > max.to_f64()
        } else {
            ValueOperations::cmp_values(&x, &max) == Some(Ordering::Greater)
        };
        if above {
            min
        } else {
            x
        }
    } else {
        let below = if max.is_float() || x.is_float() {
            x.to_f64() < min.to_f64()
        } else {
            ValueOperations::cmp_values(&x, &min) == Some(Ordering::Less)
        };
        if below {
            max
        } else {
            x
        }
    }
}
