//! Bytecode format and data structures

use crate::opcode::{OpCode, OpcodeId};
use crate::store::{VarId, VariableStore};
use equation_types::sync::Arc;
use equation_types::TypedValue;
use std::fmt;
use tracing::trace;

/// What an instruction does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Builtin(OpCode),
    /// Registered plugin function, id above the plugin offset
    Plugin(OpcodeId),
}

impl Operation {
    pub fn id(&self) -> OpcodeId {
        match self {
            Operation::Builtin(op) => op.id(),
            Operation::Plugin(id) => *id,
        }
    }

    fn binds_variable(&self) -> bool {
        match self {
            Operation::Builtin(op) => op.reads_variable() || op.writes_variable(),
            Operation::Plugin(_) => false,
        }
    }
}

impl From<OpCode> for Operation {
    fn from(op: OpCode) -> Self {
        Operation::Builtin(op)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Builtin(op) => write!(f, "{}", op),
            Operation::Plugin(id) => write!(f, "{}", id),
        }
    }
}

/// Memory of an edge-detecting instruction between executions
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EdgeState {
    #[default]
    Uninitialized,
    LastValue(f64),
}

/// Per-instruction operand
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload {
    None,
    Literal(TypedValue),
    Variable(VarId),
    /// Number of stack values consumed by a variadic builtin
    ArgCount(u8),
    Edge(EdgeState),
}

/// One bytecode instruction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    pub op: Operation,
    pub payload: Payload,
}

impl Instruction {
    pub fn new(op: impl Into<Operation>, payload: Payload) -> Self {
        Self {
            op: op.into(),
            payload,
        }
    }

    /// Variable this instruction holds an attachment on
    pub fn binding(&self) -> Option<VarId> {
        match self.payload {
            Payload::Variable(id) if self.op.binds_variable() => Some(id),
            _ => None,
        }
    }
}

/// A compiled equation bound to concrete variable ids
///
/// The program owns one store attachment per variable-accessing instruction
/// and returns all of them when dropped.
pub struct Program {
    instructions: Vec<Instruction>,
    store: Arc<dyn VariableStore>,
    source: String,
    warnings: Vec<String>,
    uses_can_data: bool,
    lock_held: bool,
    registration: u64,
}

impl Program {
    pub(crate) fn new(store: Arc<dyn VariableStore>, source: &str) -> Self {
        Self {
            instructions: Vec::new(),
            store,
            source: source.to_string(),
            warnings: Vec::new(),
            uses_can_data: false,
            lock_held: false,
            registration: 0,
        }
    }

    /// Append an instruction. A variable payload must carry an attachment
    /// that the program now owns.
    pub(crate) fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub(crate) fn finish(&mut self, warnings: Vec<String>, uses_can_data: bool) {
        self.warnings = warnings;
        self.uses_can_data = uses_can_data;
    }

    pub(crate) fn instructions_mut(&mut self) -> &mut [Instruction] {
        &mut self.instructions
    }

    /// Number of instructions
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Equation text the program was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Continue-class messages recorded during compilation
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Whether the program touches CAN frame data
    pub fn uses_can_data(&self) -> bool {
        self.uses_can_data
    }

    /// Whether the `execute*` entry points run with the store lock
    /// already held by the caller
    pub fn lock_held(&self) -> bool {
        self.lock_held
    }

    /// Set by the compiler from [`CompilerOptions::lock_held`](crate::CompilerOptions)
    pub fn set_lock_held(&mut self, lock_held: bool) {
        self.lock_held = lock_held;
    }

    pub fn store(&self) -> &Arc<dyn VariableStore> {
        &self.store
    }

    /// Every bound variable, once per owning instruction
    pub fn bindings(&self) -> impl Iterator<Item = VarId> + '_ {
        self.instructions.iter().filter_map(Instruction::binding)
    }

    /// Opaque number the host uses to track live programs, 0 when unregistered
    pub fn registration(&self) -> u64 {
        self.registration
    }

    pub fn set_registration(&mut self, registration: u64) {
        if self.registration != 0 {
            self.store.detach_equation(self.registration);
        }
        self.registration = registration;
        if registration != 0 {
            self.store.attach_equation(registration);
        }
    }

    /// Duplicate the program for another owner
    ///
    /// Every binding is attached again, so both copies can be dropped
    /// independently. Edge state is copied as-is; the copy is unregistered.
    pub fn share(&self) -> Program {
        for id in self.bindings() {
            self.store.attach(id);
        }
        Program {
            instructions: self.instructions.clone(),
            store: Arc::clone(&self.store),
            source: self.source.clone(),
            warnings: self.warnings.clone(),
            uses_can_data: self.uses_can_data,
            lock_held: self.lock_held,
            registration: 0,
        }
    }

    /// Forget all edge detector state, as if the program was freshly compiled
    pub fn reset_edges(&mut self) {
        for inst in &mut self.instructions {
            if let Payload::Edge(state) = &mut inst.payload {
                *state = EdgeState::Uninitialized;
            }
        }
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        let mut detached = 0usize;
        for id in self.instructions.iter().filter_map(Instruction::binding) {
            self.store.detach(id);
            detached += 1;
        }
        if self.registration != 0 {
            self.store.detach_equation(self.registration);
        }
        trace!(detached, "program released");
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("source", &self.source)
            .field("instructions", &self.instructions)
            .field("uses_can_data", &self.uses_can_data)
            .field("registration", &self.registration)
            .finish()
    }
}
