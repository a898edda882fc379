//! Equation Virtual Machine
//!
//! This crate compiles single-line arithmetic/logic equations into bytecode
//! for a small stack machine and runs them against an external variable
//! store. Equations can also be evaluated directly in one pass, without
//! keeping a program around.
//!
//! # Architecture
//!
//! - One-pass recursive-descent compiler, no AST
//! - Stack machine with a fixed 64-slot evaluation stack
//! - Tagged numeric values (`I64`/`U64`/`F64` plus byte width) with
//!   saturating integer arithmetic
//! - Programs hold one store attachment per variable access and release
//!   them when dropped
//! - Edge-detecting builtins keep their state inside the instruction
//!
//! # Modules
//!
//! - `opcode`: Instruction set definitions
//! - `bytecode`: Program and instruction format
//! - `compiler`: Equation text to bytecode
//! - `vm`: Execution engine
//! - `builtins`: Builtin function table and plugin registry
//! - `store`: Variable store interface and an in-memory store
//! - `can`: CAN frame context for the CAN builtins
//! - `options`: Compiler configuration
//! - `error`: Error types for compiler, VM and store

#![allow(clippy::result_large_err)]

pub mod builtins;
pub mod bytecode;
pub mod bytecode_debug;
pub mod can;
pub mod compiler;
pub mod error;
pub mod opcode;
pub mod options;
pub mod store;
pub mod vm;

// Re-export main types
pub use builtins::resolve_builtin;
pub use builtins::registry::{register_builtin, PluginContext, PluginFn, PLUGIN_USES_CAN_DATA};
pub use bytecode::{Program, Instruction, Operation, Payload};
pub use bytecode_debug::disassemble;
pub use can::CanFrame;
pub use compiler::{Compiler, Evaluation, ScriptScope, SyntaxReport};
pub use equation_types::{DataType, TypedValue, Value, ValueKind};
pub use error::{
    BindError, BindingKind, CompileError, EquationError, RegistryError, StoreError, VmError,
};
pub use opcode::{OpCode, OpcodeId};
pub use options::{CompilerOptions, MissingVariables, Placeholder, ReplaceVariable};
pub use store::{Binding, ExistPolicy, MemoryStore, ProcessState, VarId, VariableStore};
pub use vm::{EvalStack, Vm};
