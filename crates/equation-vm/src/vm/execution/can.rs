//! CAN frame instruction execution

use super::crc::{byte_arg, can_crc8};
use crate::error::VmError;
use crate::opcode::OpCode;
use crate::vm::Vm;
use equation_types::{TypedValue, Value};

impl Vm<'_> {
    /// Execute CAN instructions against the frame passed to this execution
    pub(crate) fn execute_can(&mut self, opcode: OpCode) -> Result<(), VmError> {
        let frame = self
            .can_frame
            .ok_or(VmError::MissingCanFrame(opcode.name()))?;
        let result = match opcode {
            OpCode::CanByte => TypedValue::u64(frame.byte(self.stack.pop()?.to_u64()) as u64),
            OpCode::CanWord => TypedValue::u64(frame.word(self.stack.pop()?.to_u64()) as u64),
            OpCode::CanDword => TypedValue::u64(frame.dword(self.stack.pop()?.to_u64()) as u64),
            OpCode::CanCyclic => TypedValue::from_bool(frame.should_be_sent),
            OpCode::CanId => TypedValue::u64(frame.id as u64),
            OpCode::CanCycles => TypedValue::u64(frame.cycles as u64),
            OpCode::CanSize => TypedValue::u64(frame.size() as u64),
            OpCode::CanDataChanged => {
                let (start, size) = self.stack.pop2()?;
                TypedValue::from_bool(frame.data_changed(start.to_i64(), size.to_i64()))
            }
            OpCode::CanCrc8RevInOut => {
                let args = self.stack.pop_n(4)?;
                let crc = can_crc8(
                    &frame.data,
                    byte_arg(&args[0]),
                    byte_arg(&args[1]) as usize,
                    byte_arg(&args[2]) != 0,
                    byte_arg(&args[3]) != 0,
                );
                TypedValue::new(Value::U64(crc as u64), 1)
            }
            _ => unreachable!("not a CAN opcode: {}", opcode),
        };
        self.stack.push(result)
    }
}
