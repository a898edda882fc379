//! Comparison and logic instruction execution

use crate::error::VmError;
use crate::opcode::OpCode;
use crate::vm::ops::ValueOperations;
use crate::vm::Vm;
use equation_types::TypedValue;
use std::cmp::Ordering;

impl Vm<'_> {
    /// Execute comparison instructions. Every result is `U64` 0 or 1.
    pub(crate) fn execute_comparison(&mut self, opcode: OpCode) -> Result<(), VmError> {
        if opcode == OpCode::Not {
            let value = self.stack.pop()?;
            return self.stack.push(TypedValue::from_bool(!value.to_bool()));
        }

        let (left, right) = self.stack.pop2()?;
        let result = match opcode {
            OpCode::Eq => ValueOperations::eq_values(&left, &right),
            OpCode::Ne => !ValueOperations::eq_values(&left, &right),
            OpCode::Lt => matches!(
                ValueOperations::cmp_values(&left, &right),
                Some(Ordering::Less)
            ),
            OpCode::Le => matches!(
                ValueOperations::cmp_values(&left, &right),
                Some(Ordering::Less | Ordering::Equal)
            ),
            OpCode::Gt => matches!(
                ValueOperations::cmp_values(&left, &right),
                Some(Ordering::Greater)
            ),
            OpCode::Ge => matches!(
                ValueOperations::cmp_values(&left, &right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            OpCode::And => left.to_bool() && right.to_bool(),
            OpCode::Or => left.to_bool() || right.to_bool(),
            _ => unreachable!("not a comparison opcode: {}", opcode),
        };
        self.stack.push(TypedValue::from_bool(result))
    }
}
