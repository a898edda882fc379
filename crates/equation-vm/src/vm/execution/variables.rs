//! Variable access instruction execution

use crate::bytecode::Payload;
use crate::error::VmError;
use crate::opcode::OpCode;
use crate::store::{VarId, VariableStore};
use crate::vm::Vm;
use equation_types::{TypedValue, Value};

impl Vm<'_> {
    /// Execute instructions that touch a bound variable
    ///
    /// Writes leave the written value on the stack so assignments compose.
    pub(crate) fn execute_variable(
        &mut self,
        opcode: OpCode,
        payload: &Payload,
        store: &dyn VariableStore,
    ) -> Result<(), VmError> {
        let Payload::Variable(id) = *payload else {
            return Err(VmError::MalformedPayload(opcode.name()));
        };
        match opcode {
            OpCode::Read => {
                let value = match self.replacement(id) {
                    Some(v) => v,
                    None => store.read_variable(id),
                };
                self.stack.push(value)
            }
            OpCode::ReadPhys => {
                let value = match self.replacement(id) {
                    Some(v) => v,
                    None => TypedValue::f64(store.read_physical(id)?),
                };
                self.stack.push(value)
            }
            OpCode::Write => {
                let value = self.stack.peek()?;
                store.write_variable(id, value, self.lock_held)?;
                Ok(())
            }
            OpCode::WritePhys => {
                let value = self.stack.peek()?;
                store.write_physical(id, value.to_f64(), self.lock_held)?;
                Ok(())
            }
            OpCode::GetBinary => {
                let data_type = store.data_type(id);
                let bits = data_type.to_bits(store.read_variable(id));
                self.stack
                    .push(TypedValue::new(Value::U64(bits), data_type.width()))
            }
            OpCode::OnesComplement => {
                let data_type = store.data_type(id);
                let raw = TypedValue::new(
                    Value::U64(data_type.to_bits(store.read_variable(id))),
                    data_type.width(),
                );
                self.stack
                    .push(TypedValue::new(Value::U64(!raw.to_u64() & raw.width_mask()), raw.width))
            }
            OpCode::SetBinary => {
                let bits = self.stack.pop()?.to_u64();
                let value = store.data_type(id).from_bits(bits);
                store.write_variable(id, value, self.lock_held)?;
                self.stack.push(value)
            }
            _ => unreachable!("not a variable opcode: {}", opcode),
        }
    }

    fn replacement(&self, id: VarId) -> Option<TypedValue> {
        self.replaced
            .filter(|(replaced, _)| *replaced == id)
            .map(|(_, value)| value)
    }
}
