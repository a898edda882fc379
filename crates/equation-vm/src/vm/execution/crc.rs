//! CRC instruction execution
//!
//! The CRC builtins are variadic: the compiler records how many stack values
//! an instruction consumes in its [`Payload::ArgCount`].

use crate::bytecode::Payload;
use crate::error::VmError;
use crate::opcode::OpCode;
use crate::vm::Vm;
use equation_types::{TypedValue, Value};

/// Fewest parameters of `crc8_user_poly` / `crc16_user_poly`: seed and polynomial
pub const USER_POLY_MIN_ARGS: usize = 2;

/// Fewest parameters of the reflect family: poly, init, xorout, refin, refout
pub const REFLECT_MIN_ARGS: usize = 5;

/// Parameter model of the `crcN_user_poly_reflect` builtins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrcParams {
    pub width: u32,
    pub poly: u32,
    pub init: u32,
    pub xorout: u32,
    pub refin: bool,
    pub refout: bool,
}

impl CrcParams {
    fn top_bit(&self) -> u32 {
        1 << (self.width - 1)
    }

    fn mask(&self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1 << self.width) - 1
        }
    }

    /// Textbook bitwise CRC over `data`
    pub fn checksum(&self, data: &[u8]) -> u32 {
        let mask = self.mask();
        let mut crc = self.init & mask;
        for &byte in data {
            let byte = if self.refin { byte.reverse_bits() } else { byte };
            crc ^= (byte as u32) << (self.width - 8);
            for _ in 0..8 {
                crc = if crc & self.top_bit() != 0 {
                    ((crc << 1) ^ self.poly) & mask
                } else {
                    (crc << 1) & mask
                };
            }
        }
        if self.refout {
            crc = crc.reverse_bits() >> (32 - self.width);
        }
        (crc ^ self.xorout) & mask
    }
}

/// MSB-first CRC-8 with the register complemented at the end
pub fn crc8_user_poly(seed: u8, poly: u8, data: &[u8]) -> u8 {
    let mut crc = seed;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ poly
            } else {
                crc << 1
            };
        }
    }
    !crc
}

/// Augmented CRC-16: bytes enter the register LSB first, the message is
/// padded with 16 zero bits and the register is bit-reversed at the end.
pub fn crc16_user_poly(seed: u16, poly: u16, data: &[u8]) -> u16 {
    let mut reg = seed;
    let step = |reg: &mut u16, bit: u16| {
        let carry = *reg & 0x8000 != 0;
        *reg = (*reg << 1) | bit;
        if carry {
            *reg ^= poly;
        }
    };
    for &byte in data {
        for i in 0..8 {
            step(&mut reg, ((byte >> i) & 1) as u16);
        }
    }
    for _ in 0..16 {
        step(&mut reg, 0);
    }
    reg.reverse_bits()
}

/// CRC-8 over a CAN payload, skipping the byte at `crc_index`
///
/// Each data bit is compared against the register MSB, so no initial XOR of
/// whole bytes takes place. `rev_in` feeds bytes LSB first.
pub fn can_crc8(data: &[u8], poly: u8, crc_index: usize, rev_in: bool, rev_out: bool) -> u8 {
    let mut crc: u8 = 0;
    for (idx, &byte) in data.iter().enumerate() {
        if idx == crc_index {
            continue;
        }
        for bit in 0..8 {
            let set = if rev_in {
                byte & (1 << bit) != 0
            } else {
                byte & (0x80 >> bit) != 0
            };
            crc = if set != (crc & 0x80 != 0) {
                (crc << 1) ^ poly
            } else {
                crc << 1
            };
        }
    }
    if rev_out {
        crc.reverse_bits()
    } else {
        crc
    }
}

/// Byte-sized argument, saturated into `0..=255`
pub(super) fn byte_arg(v: &TypedValue) -> u8 {
    v.saturate_unsigned(u8::MAX as u64) as u8
}

impl Vm<'_> {
    /// Execute CRC instructions
    pub(crate) fn execute_crc(&mut self, opcode: OpCode, payload: &Payload) -> Result<(), VmError> {
        let Payload::ArgCount(count) = *payload else {
            return Err(VmError::MalformedPayload(opcode.name()));
        };
        let count = count as usize;
        let min = match opcode {
            OpCode::Crc8UserPoly | OpCode::Crc16UserPoly => USER_POLY_MIN_ARGS,
            _ => REFLECT_MIN_ARGS,
        };
        if count < min {
            return Err(VmError::CrcArguments {
                op: opcode.name(),
                min,
                got: count,
            });
        }
        let args = self.stack.pop_n(count)?;

        let result = match opcode {
            OpCode::Crc8UserPoly => {
                let data: Vec<u8> = args[2..].iter().map(byte_arg).collect();
                let crc = crc8_user_poly(byte_arg(&args[0]), byte_arg(&args[1]), &data);
                TypedValue::new(Value::U64(crc as u64), 1)
            }
            OpCode::Crc16UserPoly => {
                let seed = args[0].saturate_unsigned(u16::MAX as u64) as u16;
                let poly = args[1].saturate_unsigned(u16::MAX as u64) as u16;
                let data: Vec<u8> = args[2..].iter().map(byte_arg).collect();
                TypedValue::new(Value::U64(crc16_user_poly(seed, poly, &data) as u64), 2)
            }
            OpCode::Crc8UserPolyReflect
            | OpCode::Crc16UserPolyReflect
            | OpCode::Crc32UserPolyReflect => {
                let width: u32 = match opcode {
                    OpCode::Crc8UserPolyReflect => 8,
                    OpCode::Crc16UserPolyReflect => 16,
                    _ => 32,
                };
                let max = u32::MAX as u64 >> (32 - width);
                let clamp = |v: &TypedValue| v.to_u64().min(max) as u32;
                let params = CrcParams {
                    width,
                    poly: clamp(&args[0]),
                    init: clamp(&args[1]),
                    xorout: clamp(&args[2]),
                    refin: args[3].to_u64() >= 1,
                    refout: args[4].to_u64() >= 1,
                };
                let data: Vec<u8> = args[5..]
                    .iter()
                    .map(|v| v.to_u64().min(u8::MAX as u64) as u8)
                    .collect();
                TypedValue::new(Value::U64(params.checksum(&data) as u64), (width / 8) as u8)
            }
            _ => unreachable!("not a CRC opcode: {}", opcode),
        };
        self.stack.push(result)
    }
}
