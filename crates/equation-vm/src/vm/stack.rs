//! Fixed-capacity evaluation stack

use crate::error::VmError;
use equation_types::TypedValue;

/// Number of slots on the evaluation stack
pub const STACK_SIZE: usize = 64;

/// Value stack of one execution
///
/// Plugin functions receive the stack directly: they pop their arguments and
/// push exactly one result.
#[derive(Debug, Clone)]
pub struct EvalStack {
    data: [TypedValue; STACK_SIZE],
    len: usize,
}

impl EvalStack {
    pub fn new() -> Self {
        Self {
            data: [TypedValue::default(); STACK_SIZE],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn push(&mut self, value: TypedValue) -> Result<(), VmError> {
        if self.len >= STACK_SIZE {
            return Err(VmError::StackOverflow(STACK_SIZE));
        }
        self.data[self.len] = value;
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<TypedValue, VmError> {
        if self.len == 0 {
            return Err(VmError::StackUnderflow);
        }
        self.len -= 1;
        Ok(self.data[self.len])
    }

    /// Pop two operands, returned in push order
    pub fn pop2(&mut self) -> Result<(TypedValue, TypedValue), VmError> {
        let b = self.pop()?;
        let a = self.pop()?;
        Ok((a, b))
    }

    /// Pop the topmost `n` entries, returned in push order
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<TypedValue>, VmError> {
        if n > self.len {
            return Err(VmError::StackUnderflow);
        }
        self.len -= n;
        Ok(self.data[self.len..self.len + n].to_vec())
    }

    pub fn peek(&self) -> Result<TypedValue, VmError> {
        self.len
            .checked_sub(1)
            .map(|top| self.data[top])
            .ok_or(VmError::StackUnderflow)
    }

    pub fn swap_top(&mut self) -> Result<(), VmError> {
        if self.len < 2 {
            return Err(VmError::StackUnderflow);
        }
        self.data.swap(self.len - 1, self.len - 2);
        Ok(())
    }

    /// Deepest entry, which holds the result once a program has run
    pub fn bottom(&self) -> Option<TypedValue> {
        (self.len > 0).then(|| self.data[0])
    }
}

impl Default for EvalStack {
    fn default() -> Self {
        Self::new()
    }
}
