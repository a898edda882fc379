//! Binary operator precedence ladder
//!
//! Lowest to highest: `||`, `&&`, `|`, `^`, `&`, equality, relational,
//! shift, additive, multiplicative. Every level is left-associative.

use crate::bytecode::Payload;
use crate::compiler::lexer::Token;
use crate::compiler::Parser;
use crate::error::CompileError;
use crate::opcode::OpCode;

type Level<'c, 'src> = fn(&mut Parser<'c, 'src>) -> Result<(), CompileError>;

impl<'c, 'src> Parser<'c, 'src> {
    pub(crate) fn expression(&mut self) -> Result<(), CompileError> {
        self.logical_or()
    }

    /// `operand (op operand)*`, emitting one instruction per operator
    fn left_assoc(
        &mut self,
        operand: Level<'c, 'src>,
        operator: fn(&Token<'_>) -> Option<OpCode>,
    ) -> Result<(), CompileError> {
        operand(self)?;
        while let Some(op) = operator(&self.token) {
            self.advance()?;
            operand(self)?;
            self.emit(op, Payload::None)?;
        }
        Ok(())
    }

    fn logical_or(&mut self) -> Result<(), CompileError> {
        self.left_assoc(Self::logical_and, |t| {
            matches!(t, Token::PipePipe).then_some(OpCode::Or)
        })
    }

    fn logical_and(&mut self) -> Result<(), CompileError> {
        self.left_assoc(Self::bit_or, |t| {
            matches!(t, Token::AmpAmp).then_some(OpCode::And)
        })
    }

    fn bit_or(&mut self) -> Result<(), CompileError> {
        self.left_assoc(Self::bit_xor, |t| {
            matches!(t, Token::Pipe).then_some(OpCode::BitOr)
        })
    }

    fn bit_xor(&mut self) -> Result<(), CompileError> {
        self.left_assoc(Self::bit_and, |t| {
            matches!(t, Token::Caret).then_some(OpCode::BitXor)
        })
    }

    fn bit_and(&mut self) -> Result<(), CompileError> {
        self.left_assoc(Self::equality, |t| {
            matches!(t, Token::Amp).then_some(OpCode::BitAnd)
        })
    }

    fn equality(&mut self) -> Result<(), CompileError> {
        self.left_assoc(Self::relational, |t| match t {
            Token::EqEq => Some(OpCode::Eq),
            Token::NotEq => Some(OpCode::Ne),
            _ => None,
        })
    }

    fn relational(&mut self) -> Result<(), CompileError> {
        self.left_assoc(Self::shift, |t| match t {
            Token::Less => Some(OpCode::Lt),
            Token::LessEq => Some(OpCode::Le),
            Token::Greater => Some(OpCode::Gt),
            Token::GreaterEq => Some(OpCode::Ge),
            _ => None,
        })
    }

    fn shift(&mut self) -> Result<(), CompileError> {
        self.left_assoc(Self::additive, |t| match t {
            Token::ShiftLeft => Some(OpCode::ShiftLeft),
            Token::ShiftRight => Some(OpCode::ShiftRight),
            _ => None,
        })
    }

    fn additive(&mut self) -> Result<(), CompileError> {
        self.left_assoc(Self::term, |t| match t {
            Token::Plus => Some(OpCode::Add),
            Token::Minus => Some(OpCode::Sub),
            _ => None,
        })
    }

    fn term(&mut self) -> Result<(), CompileError> {
        self.left_assoc(Self::primary, |t| match t {
            Token::Star => Some(OpCode::Mul),
            Token::Slash => Some(OpCode::Div),
            _ => None,
        })
    }
}
