//! Instruction execution handlers

mod arithmetic;
mod bits;
mod can;
mod casts;
mod comparison;
pub(crate) mod crc;
mod edge;
mod math;
mod variables;
