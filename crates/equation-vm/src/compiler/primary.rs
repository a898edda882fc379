//! Operands: literals, unary operators, groups, names and assignments

use crate::bytecode::Payload;
use crate::compiler::lexer::Token;
use crate::compiler::Parser;
use crate::error::CompileError;
use crate::opcode::OpCode;
use crate::options::Placeholder;
use equation_types::{TypedValue, Value};

impl<'c, 'src> Parser<'c, 'src> {
    pub(crate) fn primary(&mut self) -> Result<(), CompileError> {
        match self.token.clone() {
            Token::Number(value) => {
                self.advance()?;
                self.emit_literal(value)
            }
            Token::Minus => {
                self.advance()?;
                if let Token::Number(value) = self.token {
                    if let Some(negated) = negate_literal(value) {
                        self.advance()?;
                        return self.emit_literal(negated);
                    }
                }
                self.primary()?;
                self.emit(OpCode::Neg, Payload::None)
            }
            Token::Plus => {
                self.advance()?;
                self.primary()
            }
            Token::Bang => {
                self.advance()?;
                self.primary()?;
                self.emit(OpCode::Not, Payload::None)
            }
            Token::LParen => {
                self.advance()?;
                self.expression()?;
                if self.token != Token::RParen {
                    return Err(CompileError::syntax("missing ')'"));
                }
                self.advance()
            }
            Token::Placeholder => {
                self.advance()?;
                self.placeholder()
            }
            Token::Call { name, args } => {
                self.advance()?;
                self.call(name, args)
            }
            Token::Star => {
                self.advance()?;
                let Token::Name(name) = self.token else {
                    return Err(CompileError::syntax("expecting a variable name after '*'"));
                };
                let target = self.dereference(name)?;
                self.advance()?;
                self.variable(&target)
            }
            Token::Name(name) => {
                self.advance()?;
                self.variable(name)
            }
            _ => Err(CompileError::syntax(
                "expecting a primary (value, variable, (), or a command)",
            )),
        }
    }

    fn placeholder(&mut self) -> Result<(), CompileError> {
        match &self.options.placeholder {
            Placeholder::None => Err(CompileError::syntax("placeholder '#' not allowed here")),
            Placeholder::Parameter => self.emit(OpCode::GetParam, Payload::None),
            Placeholder::Value(value) => {
                let value = *value;
                self.emit_literal(value)
            }
            Placeholder::Variable(name) => {
                let name = name.clone();
                self.variable(&name)
            }
        }
    }

    /// A variable operand: a read, or an assignment when one follows
    pub(crate) fn variable(&mut self, name: &str) -> Result<(), CompileError> {
        if self.token.is_assignment() {
            self.assignment(name, false)
        } else {
            self.variable_op(OpCode::Read, name)
        }
    }

    /// `name = rhs` or `name op= rhs` with the current token on the operator
    ///
    /// The written value stays on the stack, so assignments chain.
    pub(crate) fn assignment(&mut self, name: &str, phys: bool) -> Result<(), CompileError> {
        let compound = match self.token {
            Token::Assign => None,
            Token::PlusAssign => Some(OpCode::Add),
            Token::MinusAssign => Some(OpCode::Sub),
            Token::StarAssign => Some(OpCode::Mul),
            Token::SlashAssign => Some(OpCode::Div),
            _ => return Err(CompileError::syntax(format!("expecting '=' after \"{}\"", name))),
        };
        let (read, write) = if phys {
            (OpCode::ReadPhys, OpCode::WritePhys)
        } else {
            (OpCode::Read, OpCode::Write)
        };

        self.advance()?;
        self.expression()?;
        if let Some(op) = compound {
            self.variable_op(read, name)?;
            self.emit(OpCode::Swap, Payload::None)?;
            self.emit(op, Payload::None)?;
        }
        self.variable_op(write, name)
    }
}

/// Fold a unary minus into a signed or float literal, keeping its width
fn negate_literal(literal: TypedValue) -> Option<TypedValue> {
    match literal.value {
        Value::I64(i) => Some(TypedValue::new(Value::I64(i.wrapping_neg()), literal.width)),
        Value::F64(d) => Some(TypedValue::new(Value::F64(-d), literal.width)),
        Value::U64(_) => None,
    }
}
