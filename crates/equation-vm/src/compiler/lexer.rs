//! Tokenizer for equation text

use crate::error::CompileError;
use equation_types::{TypedValue, Value};
use std::fmt;

/// Longest accepted variable name
pub(crate) const MAX_NAME_LEN: usize = 511;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token<'src> {
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    ShiftLeft,
    ShiftRight,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    Bang,
    Number(TypedValue),
    Name(&'src str),
    /// Function head; `args` is the trimmed text between the parentheses
    Call {
        name: &'src str,
        args: &'src str,
    },
    /// `#` or `$`
    Placeholder,
    /// End of input or a top-level `,`
    End,
}

impl Token<'_> {
    pub(crate) fn is_assignment(&self) -> bool {
        matches!(
            self,
            Token::Assign
                | Token::PlusAssign
                | Token::MinusAssign
                | Token::StarAssign
                | Token::SlashAssign
        )
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Token::Number(v) => return write!(f, "number {}", v.to_f64()),
            Token::Name(name) => return write!(f, "'{}'", name),
            Token::Call { name, .. } => return write!(f, "'{}()'", name),
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Assign => "=",
            Token::PlusAssign => "+=",
            Token::MinusAssign => "-=",
            Token::StarAssign => "*=",
            Token::SlashAssign => "/=",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Less => "<",
            Token::LessEq => "<=",
            Token::Greater => ">",
            Token::GreaterEq => ">=",
            Token::ShiftLeft => "<<",
            Token::ShiftRight => ">>",
            Token::Amp => "&",
            Token::AmpAmp => "&&",
            Token::Pipe => "|",
            Token::PipePipe => "||",
            Token::Caret => "^",
            Token::Bang => "!",
            Token::Placeholder => "#",
            Token::End => "end of equation",
        };
        write!(f, "'{}'", symbol)
    }
}

pub(crate) struct Lexer<'src> {
    src: &'src str,
    pos: usize,
}

impl<'src> Lexer<'src> {
    pub(crate) fn new(src: &'src str) -> Self {
        Self { src, pos: 0 }
    }

    /// Input not consumed yet
    pub(crate) fn rest(&self) -> &'src str {
        &self.src[self.pos..]
    }

    fn peek_byte(&self, offset: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek_byte(0).is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Single-byte operator, or the two-byte form when `second` follows
    fn operator(&mut self, second: u8, double: Token<'src>, single: Token<'src>) -> Token<'src> {
        if self.peek_byte(1) == Some(second) {
            self.pos += 2;
            double
        } else {
            self.pos += 1;
            single
        }
    }

    pub(crate) fn next_token(&mut self) -> Result<Token<'src>, CompileError> {
        self.skip_whitespace();
        let Some(ch) = self.peek_byte(0) else {
            return Ok(Token::End);
        };
        let token = match ch {
            b',' => Token::End,
            b'+' => self.operator(b'=', Token::PlusAssign, Token::Plus),
            b'-' => self.operator(b'=', Token::MinusAssign, Token::Minus),
            b'*' => self.operator(b'=', Token::StarAssign, Token::Star),
            b'/' => self.operator(b'=', Token::SlashAssign, Token::Slash),
            b'=' => self.operator(b'=', Token::EqEq, Token::Assign),
            b'!' => self.operator(b'=', Token::NotEq, Token::Bang),
            b'&' => self.operator(b'&', Token::AmpAmp, Token::Amp),
            b'|' => self.operator(b'|', Token::PipePipe, Token::Pipe),
            b'<' => match self.peek_byte(1) {
                Some(b'<') => self.operator(b'<', Token::ShiftLeft, Token::Less),
                _ => self.operator(b'=', Token::LessEq, Token::Less),
            },
            b'>' => match self.peek_byte(1) {
                Some(b'>') => self.operator(b'>', Token::ShiftRight, Token::Greater),
                _ => self.operator(b'=', Token::GreaterEq, Token::Greater),
            },
            b'^' => {
                self.pos += 1;
                Token::Caret
            }
            b'(' => {
                self.pos += 1;
                Token::LParen
            }
            b')' => {
                self.pos += 1;
                Token::RParen
            }
            b'#' | b'$' => {
                self.pos += 1;
                Token::Placeholder
            }
            b'0'..=b'9' | b'.' => self.number()?,
            c if c.is_ascii_alphabetic() || c == b'_' => self.identifier()?,
            _ => {
                let illegal = self.src[self.pos..].chars().next().unwrap_or('?');
                return Err(CompileError::syntax(format!(
                    "illegal character '{}'",
                    illegal.escape_default()
                )));
            }
        };
        Ok(token)
    }

    fn number(&mut self) -> Result<Token<'src>, CompileError> {
        let start = self.pos;
        let rest = &self.src.as_bytes()[start..];
        let (value, int_len) = parse_c_integer(rest);

        if matches!(rest.get(int_len), Some(b'.' | b'e' | b'E')) {
            let len = float_prefix_len(rest);
            let text = &self.src[start..start + len];
            let d = match text.parse::<f64>() {
                Ok(d) if len >= int_len => d,
                _ => {
                    return Err(CompileError::syntax(format!(
                        "malformed number \"{}\"",
                        &self.src[start..start + int_len.max(len).max(1)]
                    )))
                }
            };
            self.pos = start + len;
            return Ok(Token::Number(TypedValue::f64(d)));
        }

        let literal = match parse_suffix(&rest[int_len..]) {
            Some((true, width, len)) => {
                self.pos = start + int_len + len;
                TypedValue::new(Value::I64(value as i64), width)
            }
            Some((false, width, len)) => {
                self.pos = start + int_len + len;
                TypedValue::new(Value::U64(value), width)
            }
            None => {
                self.pos = start + int_len;
                if value <= i32::MAX as u64 {
                    TypedValue::new(Value::I64(value as i64), 4)
                } else if value <= i64::MAX as u64 {
                    TypedValue::i64(value as i64)
                } else {
                    TypedValue::u64(value)
                }
            }
        };
        Ok(Token::Number(literal))
    }

    fn identifier(&mut self) -> Result<Token<'src>, CompileError> {
        let start = self.pos;
        while self.peek_byte(0).is_some_and(is_name_byte) {
            self.pos += 1;
        }
        let name = &self.src[start..self.pos];
        if name.len() > MAX_NAME_LEN {
            return Err(CompileError::syntax(format!(
                "label size exceeds {} chars",
                MAX_NAME_LEN
            )));
        }

        self.skip_whitespace();
        if self.peek_byte(0) != Some(b'(') {
            return Ok(Token::Name(name));
        }

        let open = self.pos;
        let mut depth = 0usize;
        for (offset, b) in self.src.as_bytes()[open + 1..].iter().enumerate() {
            match b {
                b'(' => depth += 1,
                b')' if depth == 0 => {
                    let close = open + 1 + offset;
                    self.pos = close + 1;
                    return Ok(Token::Call {
                        name,
                        args: self.src[open + 1..close].trim(),
                    });
                }
                b')' => depth -= 1,
                _ => {}
            }
        }
        Err(CompileError::syntax(format!("expect a ')' in {}()", name)))
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'[' | b']' | b'.' | b':' | b'{' | b'}' | b'@')
}

/// Whether `name` is a complete variable name token
pub(crate) fn is_variable_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    matches!(bytes.first(), Some(c) if c.is_ascii_alphabetic() || *c == b'_')
        && bytes.iter().all(|&b| is_name_byte(b))
        && name.len() <= MAX_NAME_LEN
}

/// Unsigned integer prefix in C notation: `0x` hex, leading `0` octal,
/// decimal otherwise. Values that do not fit saturate at `u64::MAX`.
fn parse_c_integer(s: &[u8]) -> (u64, usize) {
    let (radix, mut i) = match s {
        [b'0', b'x' | b'X', d, ..] if d.is_ascii_hexdigit() => (16u32, 2),
        [b'0', ..] => (8, 1),
        _ => (10, 0),
    };
    let mut value = 0u64;
    let mut saturated = false;
    while let Some(digit) = s.get(i).and_then(|&c| (c as char).to_digit(radix)) {
        match value
            .checked_mul(radix as u64)
            .and_then(|v| v.checked_add(digit as u64))
        {
            Some(v) => value = v,
            None => saturated = true,
        }
        i += 1;
    }
    (if saturated { u64::MAX } else { value }, i)
}

/// Length of the decimal floating point literal at the start of `s`
fn float_prefix_len(s: &[u8]) -> usize {
    let digits = |from: usize| {
        s[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };
    let mut i = digits(0);
    if s.get(i) == Some(&b'.') {
        i += 1;
        i += digits(i);
    }
    if matches!(s.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(s.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp = digits(j);
        if exp > 0 {
            i = j + exp;
        }
    }
    i
}

/// Type suffix of an integer literal: (signed, byte width, suffix length)
fn parse_suffix(s: &[u8]) -> Option<(bool, u8, usize)> {
    let (signed, skip) = match s {
        [b'u', b'i', ..] => (false, 2),
        [b'u', ..] => (false, 1),
        [b'i', ..] => (true, 1),
        _ => return None,
    };
    let (width, len) = match &s[skip..] {
        [b'8', ..] => (1, 1),
        [b'1', b'6', ..] => (2, 2),
        [b'3', b'2', ..] => (4, 2),
        [b'6', b'4', ..] => (8, 2),
        _ => return None,
    };
    Some((signed, width, skip + len))
}

/// Split a parameter list on top-level commas. Empty input has no parameters.
pub(crate) fn split_args(text: &str) -> Vec<&str> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            b',' if depth == 0 => {
                args.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(text[start..].trim());
    args
}
