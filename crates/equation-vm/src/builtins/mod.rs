//! Built-in functions of the equation language
//!
//! Function names resolve in three tiers:
//! - Fixed table: [`BUILTINS`], one opcode per name
//! - Irregular builtins: [`IRREGULAR_BUILTINS`], which parse their own
//!   parameter text (variable names, strings, enum texts)
//! - Plugins: functions added at runtime through [`registry::register_builtin`]
//!
//! Plugin names can never shadow the first two tiers.

pub mod registry;

use crate::opcode::{OpCode, OpcodeId};
use std::fmt;

/// Most parameters a single builtin call may pass
pub const MAX_ARGS: usize = 32;

/// Accepted parameter counts of a builtin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(u8),
    /// Inclusive range
    Range(u8, u8),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n as usize,
            Arity::Range(min, max) => (min as usize..=max as usize).contains(&count),
        }
    }

    pub fn min(self) -> u8 {
        match self {
            Arity::Exact(n) | Arity::Range(n, _) => n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Range(min, max) => write!(f, "{} to {}", min, max),
        }
    }
}

/// Where a builtin may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Anywhere,
    /// Needs CAN commands enabled and a compiled or syntax-checked equation
    Can,
    /// Keeps state between executions, so only compiled programs may use it
    Stateful,
}

/// Entry of the fixed builtin table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinSpec {
    pub name: &'static str,
    pub op: OpCode,
    pub arity: Arity,
    pub gate: Gate,
    /// The opcode receives its parameter count in the instruction payload
    pub variadic: bool,
}

const fn fixed(name: &'static str, op: OpCode, args: u8) -> BuiltinSpec {
    BuiltinSpec {
        name,
        op,
        arity: Arity::Exact(args),
        gate: Gate::Anywhere,
        variadic: false,
    }
}

const fn can(name: &'static str, op: OpCode, args: u8) -> BuiltinSpec {
    BuiltinSpec {
        gate: Gate::Can,
        ..fixed(name, op, args)
    }
}

const fn stateful(name: &'static str, op: OpCode) -> BuiltinSpec {
    BuiltinSpec {
        gate: Gate::Stateful,
        ..fixed(name, op, 1)
    }
}

const fn variadic(name: &'static str, op: OpCode, min: u8) -> BuiltinSpec {
    BuiltinSpec {
        name,
        op,
        arity: Arity::Range(min, MAX_ARGS as u8),
        gate: Gate::Anywhere,
        variadic: true,
    }
}

/// The fixed builtin table
pub static BUILTINS: &[BuiltinSpec] = &[
    // ========================================================================
    // Math
    // ========================================================================
    fixed("sin", OpCode::Sin, 1),
    fixed("cos", OpCode::Cos, 1),
    fixed("tan", OpCode::Tan, 1),
    fixed("sinh", OpCode::Sinh, 1),
    fixed("cosh", OpCode::Cosh, 1),
    fixed("tanh", OpCode::Tanh, 1),
    fixed("asin", OpCode::Asin, 1),
    fixed("acos", OpCode::Acos, 1),
    fixed("atan", OpCode::Atan, 1),
    fixed("exp", OpCode::Exp, 1),
    fixed("pow", OpCode::Pow, 2),
    fixed("sqrt", OpCode::Sqrt, 1),
    fixed("log", OpCode::Log, 1),
    fixed("log10", OpCode::Log10, 1),
    fixed("abs", OpCode::Abs, 1),
    fixed("round", OpCode::Round, 1),
    fixed("round_up", OpCode::RoundUp, 1),
    fixed("round_down", OpCode::RoundDown, 1),
    fixed("modulo", OpCode::Modulo, 2),
    fixed("min", OpCode::Min, 2),
    fixed("max", OpCode::Max, 2),
    fixed("overflow", OpCode::Overflow, 3),
    fixed("underflow", OpCode::Underflow, 3),
    BuiltinSpec {
        arity: Arity::Range(2, 3),
        ..fixed("equal", OpCode::EqualDecimals, 3)
    },
    // ========================================================================
    // Bit Manipulation
    // ========================================================================
    fixed("getbits", OpCode::GetBits, 3),
    fixed("setbits", OpCode::SetBits, 4),
    fixed("andbits", OpCode::AndBits, 4),
    fixed("orbits", OpCode::OrBits, 4),
    fixed("xorbits", OpCode::XorBits, 4),
    fixed("and", OpCode::BitAnd, 2),
    fixed("or", OpCode::BitOr, 2),
    fixed("xor", OpCode::BitXor, 2),
    fixed("invert", OpCode::BitInvert, 1),
    fixed("swap16", OpCode::Swap16, 1),
    fixed("swap32", OpCode::Swap32, 1),
    fixed("shift_left", OpCode::ShiftLeft, 2),
    fixed("shift_right", OpCode::ShiftRight, 2),
    fixed("add_msb_lsb", OpCode::AddMsbLsb, 1),
    fixed("add_msn_lsn", OpCode::AddMsnLsn, 1),
    // ========================================================================
    // Casts
    // ========================================================================
    fixed("double", OpCode::ToDouble, 1),
    fixed("int8", OpCode::ToInt8, 1),
    fixed("int16", OpCode::ToInt16, 1),
    fixed("int32", OpCode::ToInt32, 1),
    fixed("int64", OpCode::ToInt64, 1),
    fixed("uint8", OpCode::ToUint8, 1),
    fixed("uint16", OpCode::ToUint16, 1),
    fixed("uint32", OpCode::ToUint32, 1),
    fixed("uint64", OpCode::ToUint64, 1),
    fixed("get_calc_data_type", OpCode::CalcDataType, 1),
    fixed("get_calc_data_width", OpCode::CalcDataWidth, 1),
    // ========================================================================
    // Edge Detection
    // ========================================================================
    stateful("has_changed", OpCode::HasChanged),
    stateful("slope_up", OpCode::SlopeUp),
    stateful("slope_down", OpCode::SlopeDown),
    // ========================================================================
    // CAN Frame
    // ========================================================================
    can("canbyte", OpCode::CanByte, 1),
    can("canword", OpCode::CanWord, 1),
    can("candword", OpCode::CanDword, 1),
    can("can_cyclic", OpCode::CanCyclic, 0),
    can("can_id", OpCode::CanId, 0),
    can("can_cycles", OpCode::CanCycles, 0),
    can("can_size", OpCode::CanSize, 0),
    can("can_data_changed", OpCode::CanDataChanged, 2),
    can("can_crc8_rev_in_out", OpCode::CanCrc8RevInOut, 4),
    // ========================================================================
    // CRC
    // ========================================================================
    variadic("crc8_user_poly", OpCode::Crc8UserPoly, 2),
    variadic("crc16_user_poly", OpCode::Crc16UserPoly, 2),
    variadic("crc8_user_poly_reflect", OpCode::Crc8UserPolyReflect, 5),
    variadic("crc16_user_poly_reflect", OpCode::Crc16UserPolyReflect, 5),
    variadic("crc32_user_poly_reflect", OpCode::Crc32UserPolyReflect, 5),
];

/// Builtins that parse their own parameter text instead of expressions
///
/// The opcode is what the call compiles to; the query and string builtins
/// fold into a literal.
pub static IRREGULAR_BUILTINS: &[BuiltinSpec] = &[
    fixed("phys", OpCode::ReadPhys, 1),
    fixed("enum", OpCode::Literal, 1),
    fixed("exist", OpCode::Literal, 1),
    fixed("env_exist", OpCode::Literal, 1),
    fixed("file_exist", OpCode::Literal, 1),
    fixed("get_process_state", OpCode::Literal, 1),
    fixed("strcmp", OpCode::Literal, 2),
    fixed("stricmp", OpCode::Literal, 2),
    fixed("strncmp", OpCode::Literal, 3),
    fixed("strnicmp", OpCode::Literal, 3),
    fixed("get_binary", OpCode::GetBinary, 1),
    fixed("ones_complement", OpCode::OnesComplement, 1),
    fixed("set_binary", OpCode::SetBinary, 2),
];

/// Look up a name in the fixed table
pub fn lookup(name: &str) -> Option<&'static BuiltinSpec> {
    BUILTINS.iter().find(|spec| spec.name == name)
}

fn lookup_irregular(name: &str) -> Option<&'static BuiltinSpec> {
    IRREGULAR_BUILTINS.iter().find(|spec| spec.name == name)
}

/// Whether a name belongs to the fixed or the irregular tier
pub fn is_reserved(name: &str) -> bool {
    lookup(name).is_some() || lookup_irregular(name).is_some()
}

/// Resolve a function name through all three tiers
///
/// Returns the opcode the call compiles to and whether `arg_count`
/// parameters are accepted, or `None` for an unknown name.
pub fn resolve_builtin(name: &str, arg_count: usize) -> Option<(OpcodeId, bool)> {
    if let Some(spec) = lookup(name).or_else(|| lookup_irregular(name)) {
        let ok = arg_count <= MAX_ARGS && spec.arity.accepts(arg_count);
        return Some((spec.op.id(), ok));
    }
    registry::lookup_plugin(name).map(|meta| (meta.id, meta.accepts(arg_count)))
}
