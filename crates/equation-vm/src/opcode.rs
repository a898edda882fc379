//! OpCode definitions for the equation VM
//!
//! Every built-in operation is one variant of [`OpCode`]. Plugin functions
//! registered at runtime are addressed by [`OpcodeId`]s above
//! [`PLUGIN_OPCODE_OFFSET`], so built-in and plugin ids never overlap.

use std::fmt;

/// First opcode id handed out to plugin functions.
pub const PLUGIN_OPCODE_OFFSET: u16 = 0x100;

/// Built-in virtual machine operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // ===== Stack & Literals =====
    /// Push the instruction's literal payload
    Literal = 0,
    /// Push the execution parameter
    GetParam = 1,
    /// Exchange the two topmost entries
    Swap = 2,

    // ===== Variables =====
    /// Push the bound variable's value
    Read = 10,
    /// Store the top of stack into the bound variable, leaving it on the stack
    Write = 11,
    /// Push the bound variable's physical (converted) value
    ReadPhys = 12,
    /// Store the top of stack as physical value
    WritePhys = 13,
    /// Push the bound variable's raw storage bits
    GetBinary = 14,
    /// Reinterpret the top of stack as raw bits and store them
    SetBinary = 15,
    /// Push the inverted raw bits of the bound variable
    OnesComplement = 16,

    // ===== Arithmetic =====
    Add = 20,
    Sub = 21,
    Mul = 22,
    Div = 23,
    Neg = 24,
    Modulo = 25,

    // ===== Comparison & Logic =====
    Eq = 30,
    Ne = 31,
    Lt = 32,
    Le = 33,
    Gt = 34,
    Ge = 35,
    /// Logical and: `a && b`
    And = 36,
    /// Logical or: `a || b`
    Or = 37,
    /// Logical not: `!a`
    Not = 38,

    // ===== Bit Manipulation =====
    /// `a & b`, also `and(a, b)`
    BitAnd = 40,
    /// `a | b`, also `or(a, b)`
    BitOr = 41,
    /// `a ^ b`, masked by the width of `a`
    BitXor = 42,
    /// `invert(a)`, masked by the width of `a`
    BitInvert = 43,
    ShiftLeft = 44,
    ShiftRight = 45,
    GetBits = 46,
    SetBits = 47,
    AndBits = 48,
    OrBits = 49,
    XorBits = 50,
    Swap16 = 51,
    Swap32 = 52,
    AddMsbLsb = 53,
    AddMsnLsn = 54,

    // ===== Math =====
    Sin = 60,
    Cos = 61,
    Tan = 62,
    Sinh = 63,
    Cosh = 64,
    Tanh = 65,
    Asin = 66,
    Acos = 67,
    Atan = 68,
    Exp = 69,
    Pow = 70,
    Sqrt = 71,
    Log = 72,
    Log10 = 73,
    Abs = 74,
    Round = 75,
    RoundUp = 76,
    RoundDown = 77,
    Min = 78,
    Max = 79,
    Overflow = 80,
    Underflow = 81,
    /// Tolerant equality: `equal(a, b, range)`
    EqualDecimals = 82,

    // ===== Casts =====
    ToDouble = 90,
    ToInt8 = 91,
    ToInt16 = 92,
    ToInt32 = 93,
    ToInt64 = 94,
    ToUint8 = 95,
    ToUint16 = 96,
    ToUint32 = 97,
    ToUint64 = 98,
    /// Domain code of the operand: 0 = i64, 1 = u64, 2 = f64
    CalcDataType = 99,
    /// Byte width of the operand
    CalcDataWidth = 100,

    // ===== Edge Detection =====
    /// 1 when the operand differs from the previous execution
    HasChanged = 110,
    /// 1 when the operand rose since the previous execution
    SlopeUp = 111,
    /// 1 when the operand fell since the previous execution
    SlopeDown = 112,

    // ===== CAN Frame =====
    CanByte = 120,
    CanWord = 121,
    CanDword = 122,
    CanCyclic = 123,
    CanId = 124,
    CanCycles = 125,
    CanSize = 126,
    CanDataChanged = 127,
    CanCrc8RevInOut = 128,

    // ===== CRC =====
    Crc8UserPoly = 140,
    Crc16UserPoly = 141,
    Crc8UserPolyReflect = 142,
    Crc16UserPolyReflect = 143,
    Crc32UserPolyReflect = 144,
}

impl OpCode {
    /// Convert from byte to OpCode
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(OpCode::Literal),
            1 => Some(OpCode::GetParam),
            2 => Some(OpCode::Swap),
            10 => Some(OpCode::Read),
            11 => Some(OpCode::Write),
            12 => Some(OpCode::ReadPhys),
            13 => Some(OpCode::WritePhys),
            14 => Some(OpCode::GetBinary),
            15 => Some(OpCode::SetBinary),
            16 => Some(OpCode::OnesComplement),
            20 => Some(OpCode::Add),
            21 => Some(OpCode::Sub),
            22 => Some(OpCode::Mul),
            23 => Some(OpCode::Div),
            24 => Some(OpCode::Neg),
            25 => Some(OpCode::Modulo),
            30 => Some(OpCode::Eq),
            31 => Some(OpCode::Ne),
            32 => Some(OpCode::Lt),
            33 => Some(OpCode::Le),
            34 => Some(OpCode::Gt),
            35 => Some(OpCode::Ge),
            36 => Some(OpCode::And),
            37 => Some(OpCode::Or),
            38 => Some(OpCode::Not),
            40 => Some(OpCode::BitAnd),
            41 => Some(OpCode::BitOr),
            42 => Some(OpCode::BitXor),
            43 => Some(OpCode::BitInvert),
            44 => Some(OpCode::ShiftLeft),
            45 => Some(OpCode::ShiftRight),
            46 => Some(OpCode::GetBits),
            47 => Some(OpCode::SetBits),
            48 => Some(OpCode::AndBits),
            49 => Some(OpCode::OrBits),
            50 => Some(OpCode::XorBits),
            51 => Some(OpCode::Swap16),
            52 => Some(OpCode::Swap32),
            53 => Some(OpCode::AddMsbLsb),
            54 => Some(OpCode::AddMsnLsn),
            60 => Some(OpCode::Sin),
            61 => Some(OpCode::Cos),
            62 => Some(OpCode::Tan),
            63 => Some(OpCode::Sinh),
            64 => Some(OpCode::Cosh),
            65 => Some(OpCode::Tanh),
            66 => Some(OpCode::Asin),
            67 => Some(OpCode::Acos),
            68 => Some(OpCode::Atan),
            69 => Some(OpCode::Exp),
            70 => Some(OpCode::Pow),
            71 => Some(OpCode::Sqrt),
            72 => Some(OpCode::Log),
            73 => Some(OpCode::Log10),
            74 => Some(OpCode::Abs),
            75 => Some(OpCode::Round),
            76 => Some(OpCode::RoundUp),
            77 => Some(OpCode::RoundDown),
            78 => Some(OpCode::Min),
            79 => Some(OpCode::Max),
            80 => Some(OpCode::Overflow),
            81 => Some(OpCode::Underflow),
            82 => Some(OpCode::EqualDecimals),
            90 => Some(OpCode::ToDouble),
            91 => Some(OpCode::ToInt8),
            92 => Some(OpCode::ToInt16),
            93 => Some(OpCode::ToInt32),
            94 => Some(OpCode::ToInt64),
            95 => Some(OpCode::ToUint8),
            96 => Some(OpCode::ToUint16),
            97 => Some(OpCode::ToUint32),
            98 => Some(OpCode::ToUint64),
            99 => Some(OpCode::CalcDataType),
            100 => Some(OpCode::CalcDataWidth),
            110 => Some(OpCode::HasChanged),
            111 => Some(OpCode::SlopeUp),
            112 => Some(OpCode::SlopeDown),
            120 => Some(OpCode::CanByte),
            121 => Some(OpCode::CanWord),
            122 => Some(OpCode::CanDword),
            123 => Some(OpCode::CanCyclic),
            124 => Some(OpCode::CanId),
            125 => Some(OpCode::CanCycles),
            126 => Some(OpCode::CanSize),
            127 => Some(OpCode::CanDataChanged),
            128 => Some(OpCode::CanCrc8RevInOut),
            140 => Some(OpCode::Crc8UserPoly),
            141 => Some(OpCode::Crc16UserPoly),
            142 => Some(OpCode::Crc8UserPolyReflect),
            143 => Some(OpCode::Crc16UserPolyReflect),
            144 => Some(OpCode::Crc32UserPolyReflect),
            _ => None,
        }
    }

    /// Convert OpCode to byte
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Literal => "LITERAL",
            OpCode::GetParam => "GET_PARAM",
            OpCode::Swap => "SWAP",
            OpCode::Read => "READ",
            OpCode::Write => "WRITE",
            OpCode::ReadPhys => "READ_PHYS",
            OpCode::WritePhys => "WRITE_PHYS",
            OpCode::GetBinary => "GET_BINARY",
            OpCode::SetBinary => "SET_BINARY",
            OpCode::OnesComplement => "ONES_COMPLEMENT",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Neg => "NEG",
            OpCode::Modulo => "MODULO",
            OpCode::Eq => "EQ",
            OpCode::Ne => "NE",
            OpCode::Lt => "LT",
            OpCode::Le => "LE",
            OpCode::Gt => "GT",
            OpCode::Ge => "GE",
            OpCode::And => "AND",
            OpCode::Or => "OR",
            OpCode::Not => "NOT",
            OpCode::BitAnd => "BIT_AND",
            OpCode::BitOr => "BIT_OR",
            OpCode::BitXor => "BIT_XOR",
            OpCode::BitInvert => "BIT_INVERT",
            OpCode::ShiftLeft => "SHIFT_LEFT",
            OpCode::ShiftRight => "SHIFT_RIGHT",
            OpCode::GetBits => "GET_BITS",
            OpCode::SetBits => "SET_BITS",
            OpCode::AndBits => "AND_BITS",
            OpCode::OrBits => "OR_BITS",
            OpCode::XorBits => "XOR_BITS",
            OpCode::Swap16 => "SWAP16",
            OpCode::Swap32 => "SWAP32",
            OpCode::AddMsbLsb => "ADD_MSB_LSB",
            OpCode::AddMsnLsn => "ADD_MSN_LSN",
            OpCode::Sin => "SIN",
            OpCode::Cos => "COS",
            OpCode::Tan => "TAN",
            OpCode::Sinh => "SINH",
            OpCode::Cosh => "COSH",
            OpCode::Tanh => "TANH",
            OpCode::Asin => "ASIN",
            OpCode::Acos => "ACOS",
            OpCode::Atan => "ATAN",
            OpCode::Exp => "EXP",
            OpCode::Pow => "POW",
            OpCode::Sqrt => "SQRT",
            OpCode::Log => "LOG",
            OpCode::Log10 => "LOG10",
            OpCode::Abs => "ABS",
            OpCode::Round => "ROUND",
            OpCode::RoundUp => "ROUND_UP",
            OpCode::RoundDown => "ROUND_DOWN",
            OpCode::Min => "MIN",
            OpCode::Max => "MAX",
            OpCode::Overflow => "OVERFLOW",
            OpCode::Underflow => "UNDERFLOW",
            OpCode::EqualDecimals => "EQUAL_DECIMALS",
            OpCode::ToDouble => "TO_DOUBLE",
            OpCode::ToInt8 => "TO_INT8",
            OpCode::ToInt16 => "TO_INT16",
            OpCode::ToInt32 => "TO_INT32",
            OpCode::ToInt64 => "TO_INT64",
            OpCode::ToUint8 => "TO_UINT8",
            OpCode::ToUint16 => "TO_UINT16",
            OpCode::ToUint32 => "TO_UINT32",
            OpCode::ToUint64 => "TO_UINT64",
            OpCode::CalcDataType => "CALC_DATA_TYPE",
            OpCode::CalcDataWidth => "CALC_DATA_WIDTH",
            OpCode::HasChanged => "HAS_CHANGED",
            OpCode::SlopeUp => "SLOPE_UP",
            OpCode::SlopeDown => "SLOPE_DOWN",
            OpCode::CanByte => "CAN_BYTE",
            OpCode::CanWord => "CAN_WORD",
            OpCode::CanDword => "CAN_DWORD",
            OpCode::CanCyclic => "CAN_CYCLIC",
            OpCode::CanId => "CAN_ID",
            OpCode::CanCycles => "CAN_CYCLES",
            OpCode::CanSize => "CAN_SIZE",
            OpCode::CanDataChanged => "CAN_DATA_CHANGED",
            OpCode::CanCrc8RevInOut => "CAN_CRC8_REV_IN_OUT",
            OpCode::Crc8UserPoly => "CRC8_USER_POLY",
            OpCode::Crc16UserPoly => "CRC16_USER_POLY",
            OpCode::Crc8UserPolyReflect => "CRC8_USER_POLY_REFLECT",
            OpCode::Crc16UserPolyReflect => "CRC16_USER_POLY_REFLECT",
            OpCode::Crc32UserPolyReflect => "CRC32_USER_POLY_REFLECT",
        }
    }

    /// Whether the instruction reads a bound variable and owns an attachment
    pub fn reads_variable(self) -> bool {
        matches!(
            self,
            OpCode::Read | OpCode::ReadPhys | OpCode::GetBinary | OpCode::OnesComplement
        )
    }

    /// Whether the instruction writes a bound variable and owns an attachment
    pub fn writes_variable(self) -> bool {
        matches!(
            self,
            OpCode::Write | OpCode::WritePhys | OpCode::SetBinary
        )
    }

    /// Whether the instruction carries per-instruction edge state
    pub fn is_stateful(self) -> bool {
        matches!(
            self,
            OpCode::HasChanged | OpCode::SlopeUp | OpCode::SlopeDown
        )
    }

    /// Opcode id in the shared id space
    pub fn id(self) -> OpcodeId {
        OpcodeId(self as u16)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Dense opcode id covering both built-in and plugin operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpcodeId(pub u16);

impl OpcodeId {
    pub fn is_plugin(self) -> bool {
        self.0 >= PLUGIN_OPCODE_OFFSET
    }

    /// Index into the plugin table, if this id belongs to a plugin
    pub fn plugin_index(self) -> Option<usize> {
        self.is_plugin()
            .then(|| (self.0 - PLUGIN_OPCODE_OFFSET) as usize)
    }

    pub fn builtin(self) -> Option<OpCode> {
        u8::try_from(self.0).ok().and_then(OpCode::from_u8)
    }
}

impl fmt::Display for OpcodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.builtin() {
            Some(op) => write!(f, "{}", op),
            None => write!(f, "PLUGIN#{}", self.0),
        }
    }
}
