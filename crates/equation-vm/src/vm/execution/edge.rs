//! Edge detection instruction execution
//!
//! The detectors remember the operand of their previous execution in the
//! instruction payload. The first execution only records the value.

use crate::bytecode::{EdgeState, Payload};
use crate::error::VmError;
use crate::opcode::OpCode;
use crate::vm::Vm;
use equation_types::TypedValue;

impl Vm<'_> {
    pub(crate) fn execute_edge(
        &mut self,
        opcode: OpCode,
        payload: &mut Payload,
    ) -> Result<(), VmError> {
        let Payload::Edge(state) = payload else {
            return Err(VmError::MalformedPayload(opcode.name()));
        };
        let current = self.stack.pop()?.to_f64();
        let fired = match *state {
            EdgeState::Uninitialized => false,
            EdgeState::LastValue(last) => match opcode {
                OpCode::HasChanged => {
                    let d = current - last;
                    !(d <= 0.0 && d >= 0.0)
                }
                OpCode::SlopeUp => current > last,
                OpCode::SlopeDown => current < last,
                _ => unreachable!("not an edge opcode: {}", opcode),
            },
        };
        *state = EdgeState::LastValue(current);
        self.stack.push(TypedValue::f64(if fired { 1.0 } else { 0.0 }))
    }
}
