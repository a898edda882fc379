//! Virtual Machine implementation

use crate::builtins::registry::{self, PluginContext};
use crate::bytecode::{Instruction, Operation, Payload, Program};
use crate::can::CanFrame;
use crate::error::VmError;
use crate::opcode::OpCode;
use crate::store::{VarId, VariableStore};
use equation_types::sync::Arc;
use equation_types::TypedValue;
use tracing::{error, trace};

// Module structure
mod execution;
pub(crate) mod ops;
mod stack;

// Re-export public types
pub use stack::{EvalStack, STACK_SIZE};

/// Stack machine executing compiled programs
///
/// The per-call inputs are set up with the `with_*` builders; the stack is
/// reset at the start of every [`execute`](Vm::execute).
#[derive(Debug, Default)]
pub struct Vm<'a> {
    pub(crate) stack: EvalStack,
    parameter: TypedValue,
    can_frame: Option<&'a CanFrame>,
    replaced: Option<(VarId, TypedValue)>,
    lock_held: bool,
}

impl<'a> Vm<'a> {
    /// Create a new VM
    pub fn new() -> Self {
        Self::default()
    }

    /// Value pushed by `GET_PARAM` (`#`/`$` in parameter mode)
    pub fn with_parameter(mut self, parameter: impl Into<TypedValue>) -> Self {
        self.parameter = parameter.into();
        self
    }

    pub fn with_can_frame(mut self, frame: &'a CanFrame) -> Self {
        self.can_frame = Some(frame);
        self
    }

    /// Reads of `id` yield `value` instead of the stored value
    pub fn with_replaced_variable(mut self, id: VarId, value: impl Into<TypedValue>) -> Self {
        self.replaced = Some((id, value.into()));
        self
    }

    /// The caller already holds the store's process-wide lock
    pub fn with_lock_held(mut self, lock_held: bool) -> Self {
        self.lock_held = lock_held;
        self
    }

    pub fn stack(&self) -> &EvalStack {
        &self.stack
    }

    /// Run every instruction of `program` in order and return stack slot 0
    pub fn execute(&mut self, program: &mut Program) -> Result<TypedValue, VmError> {
        self.stack.clear();
        let store = Arc::clone(program.store());
        for (pc, inst) in program.instructions_mut().iter_mut().enumerate() {
            trace!(pc, op = %inst.op, depth = self.stack.len(), "dispatch");
            self.step(inst, store.as_ref())?;
        }
        self.stack.bottom().ok_or(VmError::EmptyResult)
    }

    /// Execute a single instruction against the current stack
    pub(crate) fn step(
        &mut self,
        inst: &mut Instruction,
        store: &dyn VariableStore,
    ) -> Result<(), VmError> {
        match inst.op {
            Operation::Builtin(op) => self.execute_builtin(op, &mut inst.payload, store),
            Operation::Plugin(id) => {
                let mut ctx = PluginContext {
                    stack: &mut self.stack,
                    can_frame: self.can_frame,
                    parameter: self.parameter,
                    instruction: inst,
                };
                registry::call(id, &mut ctx)
            }
        }
    }

    fn execute_builtin(
        &mut self,
        op: OpCode,
        payload: &mut Payload,
        store: &dyn VariableStore,
    ) -> Result<(), VmError> {
        use OpCode::*;
        match op {
            Literal | GetParam | Swap => self.execute_stack_op(op, payload),
            Read | Write | ReadPhys | WritePhys | GetBinary | SetBinary | OnesComplement => {
                self.execute_variable(op, payload, store)
            }
            Add | Sub | Mul | Div | Neg | Modulo => self.execute_arithmetic(op),
            Eq | Ne | Lt | Le | Gt | Ge | And | Or | Not => self.execute_comparison(op),
            BitAnd | BitOr | BitXor | BitInvert | ShiftLeft | ShiftRight | GetBits | SetBits
            | AndBits | OrBits | XorBits | Swap16 | Swap32 | AddMsbLsb | AddMsnLsn => {
                self.execute_bits(op)
            }
            Sin | Cos | Tan | Sinh | Cosh | Tanh | Asin | Acos | Atan | Exp | Pow | Sqrt | Log
            | Log10 | Abs | Round | RoundUp | RoundDown | Min | Max | Overflow | Underflow
            | EqualDecimals => self.execute_math(op),
            ToDouble | ToInt8 | ToInt16 | ToInt32 | ToInt64 | ToUint8 | ToUint16 | ToUint32
            | ToUint64 | CalcDataType | CalcDataWidth => self.execute_cast(op),
            HasChanged | SlopeUp | SlopeDown => self.execute_edge(op, payload),
            CanByte | CanWord | CanDword | CanCyclic | CanId | CanCycles | CanSize
            | CanDataChanged | CanCrc8RevInOut => self.execute_can(op),
            Crc8UserPoly | Crc16UserPoly | Crc8UserPolyReflect | Crc16UserPolyReflect
            | Crc32UserPolyReflect => self.execute_crc(op, payload),
        }
    }

    fn execute_stack_op(&mut self, op: OpCode, payload: &Payload) -> Result<(), VmError> {
        match op {
            OpCode::Literal => match payload {
                Payload::Literal(v) => self.stack.push(*v),
                _ => Err(VmError::MalformedPayload(op.name())),
            },
            OpCode::GetParam => self.stack.push(self.parameter),
            OpCode::Swap => self.stack.swap_top(),
            _ => unreachable!("not a stack opcode: {}", op),
        }
    }
}

/// Entry points running a fresh [`Vm`]
///
/// Writes pass [`Program::lock_held`] to the store, which the compiler takes
/// from `CompilerOptions::lock_held`. For a one-off override run
/// `Vm::new().with_lock_held(..).execute(&mut program)` instead.
impl Program {
    fn vm<'a>(&self) -> Vm<'a> {
        Vm::new().with_lock_held(self.lock_held())
    }

    /// Execute and return the result as a double, 0.0 on failure
    pub fn execute(&mut self) -> f64 {
        self.try_execute().unwrap_or_else(|err| {
            error!(equation = %self.source(), %err, "cannot solve equation");
            0.0
        })
    }

    pub fn try_execute(&mut self) -> Result<f64, VmError> {
        self.execute_tagged().map(|v| v.to_f64())
    }

    /// Execute and return the result with its numeric domain and width
    pub fn execute_tagged(&mut self) -> Result<TypedValue, VmError> {
        self.vm().execute(self)
    }

    /// Execute with `value` bound to the `#`/`$` parameter, 0.0 on failure
    pub fn execute_with_parameter(&mut self, value: f64) -> f64 {
        match self.vm().with_parameter(value).execute(self) {
            Ok(v) => v.to_f64(),
            Err(err) => {
                error!(equation = %self.source(), %err, "cannot solve equation");
                0.0
            }
        }
    }

    pub fn execute_with_can_context(&mut self, frame: &CanFrame) -> Result<TypedValue, VmError> {
        self.vm().with_can_frame(frame).execute(self)
    }

    /// Execute with every read of `id` yielding `value`
    pub fn execute_replace_variable(&mut self, id: VarId, value: f64) -> Result<f64, VmError> {
        self.vm()
            .with_replaced_variable(id, value)
            .execute(self)
            .map(|v| v.to_f64())
    }
}
