//! Type cast instruction execution

use crate::error::VmError;
use crate::opcode::OpCode;
use crate::vm::Vm;
use equation_types::{TypedValue, Value};

impl Vm<'_> {
    /// Execute cast instructions. Integer casts clamp into the target range.
    pub(crate) fn execute_cast(&mut self, opcode: OpCode) -> Result<(), VmError> {
        let v = self.stack.pop()?;
        let result = match opcode {
            OpCode::ToDouble => TypedValue::f64(v.to_f64()),
            OpCode::ToInt8 => signed(v, i8::MIN as i64, i8::MAX as i64, 1),
            OpCode::ToInt16 => signed(v, i16::MIN as i64, i16::MAX as i64, 2),
            OpCode::ToInt32 => signed(v, i32::MIN as i64, i32::MAX as i64, 4),
            OpCode::ToInt64 => signed(v, i64::MIN, i64::MAX, 8),
            OpCode::ToUint8 => unsigned(v, u8::MAX as u64, 1),
            OpCode::ToUint16 => unsigned(v, u16::MAX as u64, 2),
            OpCode::ToUint32 => unsigned(v, u32::MAX as u64, 4),
            OpCode::ToUint64 => unsigned(v, u64::MAX, 8),
            OpCode::CalcDataType => TypedValue::i64(v.kind() as i64),
            OpCode::CalcDataWidth => TypedValue::i64(v.width as i64),
            _ => unreachable!("not a cast opcode: {}", opcode),
        };
        self.stack.push(result)
    }
}

fn signed(v: TypedValue, min: i64, max: i64, width: u8) -> TypedValue {
    TypedValue::new(Value::I64(v.saturate_signed(min, max)), width)
}

fn unsigned(v: TypedValue, max: u64, width: u8) -> TypedValue {
    TypedValue::new(Value::U64(v.saturate_unsigned(max)), width)
}
