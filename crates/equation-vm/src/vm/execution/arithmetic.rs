//! Arithmetic instruction execution

use crate::error::VmError;
use crate::opcode::OpCode;
use crate::vm::ops::ValueOperations;
use crate::vm::Vm;

impl Vm<'_> {
    /// Execute arithmetic instructions
    pub(crate) fn execute_arithmetic(&mut self, opcode: OpCode) -> Result<(), VmError> {
        if opcode == OpCode::Neg {
            let value = self.stack.pop()?;
            return self.stack.push(ValueOperations::neg_value(&value));
        }

        let (left, right) = self.stack.pop2()?;
        let result = match opcode {
            OpCode::Add => ValueOperations::add_values(&left, &right),
            OpCode::Sub => ValueOperations::sub_values(&left, &right),
            OpCode::Mul => ValueOperations::mul_values(&left, &right),
            OpCode::Div => ValueOperations::div_values(&left, &right),
            OpCode::Modulo => ValueOperations::mod_values(&left, &right),
            _ => unreachable!("not an arithmetic opcode: {}", opcode),
        };
        self.stack.push(result)
    }
}
