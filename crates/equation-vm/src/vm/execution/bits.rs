//! Bit manipulation instruction execution
//!
//! All results are `U64` width 8 except the byte swaps, which report the
//! width they operate on, and the nibble/byte sums, which are signed.

use crate::error::VmError;
use crate::opcode::OpCode;
use crate::vm::Vm;
use equation_types::{TypedValue, Value};

/// Clamp a bit field to the 64-bit word
fn field(start: u64, size: u64) -> (u32, u32) {
    let start = start.min(63);
    let size = size.min(64 - start);
    (start as u32, size as u32)
}

fn low_mask(size: u32) -> u64 {
    if size >= 64 {
        u64::MAX
    } else {
        !(u64::MAX << size)
    }
}

/// Mask covering everything outside `start..start + size`
fn outside_mask(start: u32, size: u32) -> u64 {
    let above = if start + size < 64 {
        u64::MAX << (start + size)
    } else {
        0
    };
    above | !(u64::MAX << start)
}

pub(crate) fn get_bits(value: u64, start: u64, size: u64) -> u64 {
    let (start, size) = field(start, size);
    (value >> start) & low_mask(size)
}

pub(crate) fn set_bits(value: u64, start: u64, size: u64, bits: u64) -> u64 {
    let (start, size) = field(start, size);
    let bits = bits & low_mask(size);
    (value & outside_mask(start, size)) | (bits << start)
}

pub(crate) fn and_bits(value: u64, start: u64, size: u64, bits: u64) -> u64 {
    let (start, size) = field(start, size);
    let bits = bits & low_mask(size);
    value & ((bits << start) | outside_mask(start, size))
}

pub(crate) fn or_bits(value: u64, start: u64, size: u64, bits: u64) -> u64 {
    let (start, size) = field(start, size);
    value | ((bits & low_mask(size)) << start)
}

pub(crate) fn xor_bits(value: u64, start: u64, size: u64, bits: u64) -> u64 {
    let (start, size) = field(start, size);
    value ^ ((bits & low_mask(size)) << start)
}

impl Vm<'_> {
    /// Execute bit manipulation instructions
    pub(crate) fn execute_bits(&mut self, opcode: OpCode) -> Result<(), VmError> {
        let result = match opcode {
            OpCode::GetBits => {
                let args = self.stack.pop_n(3)?;
                let r = get_bits(args[0].to_u64(), args[1].to_u64(), args[2].to_u64());
                TypedValue::u64(r)
            }
            OpCode::SetBits | OpCode::AndBits | OpCode::OrBits | OpCode::XorBits => {
                let args = self.stack.pop_n(4)?;
                let (v, start, size, bits) = (
                    args[0].to_u64(),
                    args[1].to_u64(),
                    args[2].to_u64(),
                    args[3].to_u64(),
                );
                let r = match opcode {
                    OpCode::SetBits => set_bits(v, start, size, bits),
                    OpCode::AndBits => and_bits(v, start, size, bits),
                    OpCode::OrBits => or_bits(v, start, size, bits),
                    _ => xor_bits(v, start, size, bits),
                };
                TypedValue::u64(r)
            }
            OpCode::BitAnd => {
                let (a, b) = self.stack.pop2()?;
                TypedValue::u64(a.to_u64() & b.to_u64())
            }
            OpCode::BitOr => {
                let (a, b) = self.stack.pop2()?;
                TypedValue::u64(a.to_u64() | b.to_u64())
            }
            OpCode::BitXor => {
                let (a, b) = self.stack.pop2()?;
                TypedValue::u64((a.to_u64() ^ b.to_u64()) & a.width_mask())
            }
            OpCode::BitInvert => {
                let a = self.stack.pop()?;
                TypedValue::u64(!a.to_u64() & a.width_mask())
            }
            OpCode::ShiftLeft => {
                let (a, bits) = self.stack.pop2()?;
                let bits = bits.to_u64();
                TypedValue::u64(if bits >= 64 { 0 } else { a.to_u64() << bits })
            }
            OpCode::ShiftRight => {
                let (a, bits) = self.stack.pop2()?;
                let bits = bits.to_u64();
                // only 32 bits of shift distance are honoured
                TypedValue::u64(if bits >= 32 { 0 } else { a.to_u64() >> bits })
            }
            OpCode::Swap16 => {
                let v = self.stack.pop()?.to_u64() as u16;
                TypedValue::new(Value::U64(v.swap_bytes() as u64), 2)
            }
            OpCode::Swap32 => {
                let v = self.stack.pop()?.to_u64() as u32;
                TypedValue::new(Value::U64(v.swap_bytes() as u64), 4)
            }
            OpCode::AddMsbLsb => {
                let v = self.stack.pop()?.to_i64();
                TypedValue::i64((v & 0xFF) + ((v >> 8) & 0xFF))
            }
            OpCode::AddMsnLsn => {
                let v = self.stack.pop()?.to_i64();
                TypedValue::i64((v & 0xF) + ((v >> 4) & 0xF))
            }
            _ => unreachable!("not a bit opcode: {}", opcode),
        };
        self.stack.push(result)
    }
}
