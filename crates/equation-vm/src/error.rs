//! Error types for the compiler and the VM

use crate::store::VarId;
use std::fmt;
use thiserror::Error;

/// Which side of a variable binding failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Read,
    Write,
    /// Physical access to a variable without a conversion
    Conversion,
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::Read => write!(f, "cannot read from"),
            BindingKind::Write => write!(f, "cannot write to"),
            BindingKind::Conversion => write!(f, "no conversion attached to"),
        }
    }
}

/// Stop-class compile errors. Any of these aborts the compilation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// Illegal character, missing `)`, missing operand and similar
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Builtin called with a wrong number of parameters
    #[error("function \"{function}\" expects {expected} parameter(s) but got {got}")]
    Arity {
        function: String,
        expected: String,
        got: usize,
    },

    /// Variable could not be bound under the active policy
    #[error("{kind} variable \"{name}\"")]
    Binding { kind: BindingKind, name: String },

    /// Builtin used where it is not permitted
    #[error("{0}")]
    Context(String),

    /// Immediate evaluation failed
    #[error("cannot solve equation: {0}")]
    Execution(#[from] VmError),
}

impl CompileError {
    pub(crate) fn syntax(msg: impl Into<String>) -> Self {
        CompileError::Syntax(msg.into())
    }

    pub(crate) fn context(msg: impl Into<String>) -> Self {
        CompileError::Context(msg.into())
    }

    pub(crate) fn binding(kind: BindingKind, name: impl Into<String>) -> Self {
        CompileError::Binding {
            kind,
            name: name.into(),
        }
    }
}

/// A failed compilation, direct evaluation or syntax check
///
/// Carries the equation text and every continue-class warning that was
/// recorded before the stop-class error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error} in equation \"{equation}\"")]
pub struct EquationError {
    pub error: CompileError,
    pub equation: String,
    pub warnings: Vec<String>,
}

impl EquationError {
    /// All messages of the failed pass, newline separated
    pub fn report(&self) -> String {
        let mut lines = self.warnings.clone();
        lines.push(self.to_string());
        lines.join("\n")
    }
}

/// Variable store failures surfaced while binding names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("variable \"{0}\" does not exist")]
    NotFound(String),

    #[error("variable \"{name}\" cannot be created: {reason}")]
    Rejected { name: String, reason: String },
}

/// Variable store failures at execution time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unknown variable id {0}")]
    UnknownVariable(VarId),

    #[error("variable id {0} has no conversion")]
    NoConversion(VarId),
}

/// VM runtime errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VmError {
    /// More entries than the evaluation stack holds
    #[error("stack overflow (capacity {0})")]
    StackOverflow(usize),

    /// Pop from an empty stack
    #[error("stack underflow")]
    StackUnderflow,

    /// CRC builtin without its mandatory parameters
    #[error("{op} needs at least {min} parameters, got {got}")]
    CrcArguments {
        op: &'static str,
        min: usize,
        got: usize,
    },

    /// CAN operation executed without a frame context
    #[error("{0} needs a CAN frame")]
    MissingCanFrame(&'static str),

    /// Instruction payload does not match its opcode
    #[error("malformed payload for {0}")]
    MalformedPayload(&'static str),

    /// Plugin opcode id that is not registered
    #[error("unknown plugin opcode {0}")]
    UnknownPlugin(u16),

    /// Error reported by a plugin function
    #[error("plugin {name}: {message}")]
    Plugin { name: String, message: String },

    /// Program finished with nothing on the stack
    #[error("equation left no result")]
    EmptyResult,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Plugin registration failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("function \"{0}\" is already registered")]
    Duplicate(String),

    #[error("\"{0}\" is not a valid function name")]
    InvalidName(String),

    #[error("invalid parameter range {min}..={max}")]
    InvalidArity { min: u8, max: u8 },

    #[error("plugin opcode table is full")]
    Full,
}
