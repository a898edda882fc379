//! Equation compiler (text to bytecode)
//!
//! A single recursive-descent pass reads the equation and emits
//! instructions as it goes. The same parser serves three modes:
//! - Compile: instructions are appended to a bound [`Program`]
//! - Direct: each instruction runs immediately on a scratch VM
//! - Syntax check: like direct, but variables are neither bound nor touched

use crate::bytecode::{Instruction, Operation, Payload, Program};
use crate::error::{BindingKind, CompileError, EquationError, VmError};
use crate::opcode::OpCode;
use crate::options::CompilerOptions;
use crate::store::{Binding, ExistPolicy, VariableStore};
use crate::vm::Vm;
use equation_types::sync::Arc;
use equation_types::TypedValue;
use std::mem;
use tracing::{debug, warn};

// Module structure
mod calls;
mod expressions;
pub(crate) mod lexer;
mod primary;

use lexer::{Lexer, Token};

/// Script-local variables visible to direct evaluation
///
/// Only consulted when [`CompilerOptions::script_locals`] is set.
pub trait ScriptScope: Send + Sync {
    fn read_local(&self, name: &str) -> Option<TypedValue>;

    /// Assign a local. Returns false when `name` is not a local.
    fn write_local(&self, name: &str, value: TypedValue) -> bool;

    /// Store variable a reference local (`*name`) points to
    fn dereference(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Compile,
    Direct,
    SyntaxCheck { vars_must_exist: bool },
}

/// Result of a direct evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: TypedValue,
    pub warnings: Vec<String>,
}

/// Result of a successful syntax check
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyntaxReport {
    pub uses_can_data: bool,
    pub warnings: Vec<String>,
}

/// Equation compiler bound to one variable store
#[derive(Clone)]
pub struct Compiler {
    store: Arc<dyn VariableStore>,
    options: CompilerOptions,
    scope: Option<Arc<dyn ScriptScope>>,
}

impl Compiler {
    pub fn new(store: Arc<dyn VariableStore>) -> Self {
        Self {
            store,
            options: CompilerOptions::default(),
            scope: None,
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_script_scope(mut self, scope: Arc<dyn ScriptScope>) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn store(&self) -> &Arc<dyn VariableStore> {
        &self.store
    }

    /// Compile an equation into a reusable program
    ///
    /// On failure every variable bound so far is released again.
    pub fn compile(&self, source: &str) -> Result<Program, EquationError> {
        let mut parser = Parser::new(self, source, Mode::Compile);
        if let Err(error) = parser.parse_all() {
            return Err(parser.fail(error));
        }
        let warnings = mem::take(&mut parser.warnings);
        let uses_can_data = parser.uses_can_data;
        let mut program = match parser.program.take() {
            Some(program) => program,
            None => return Err(parser.fail(CompileError::context("no program to compile into"))),
        };
        program.finish(warnings, uses_can_data);
        debug!(
            equation = source,
            instructions = program.len(),
            bindings = program.bindings().count(),
            uses_can_data,
            "equation compiled"
        );
        Ok(program)
    }

    /// Parse and execute an equation in one pass
    pub fn evaluate(&self, source: &str) -> Result<Evaluation, EquationError> {
        let mut parser = Parser::new(self, source, Mode::Direct);
        let value = parser
            .parse_all()
            .and_then(|()| parser.vm.stack.bottom().ok_or(VmError::EmptyResult.into()));
        match value {
            Ok(value) => {
                debug!(equation = source, result = value.to_f64(), "equation evaluated");
                Ok(Evaluation {
                    value,
                    warnings: mem::take(&mut parser.warnings),
                })
            }
            Err(error) => Err(parser.fail(error)),
        }
    }

    /// Check an equation without binding or touching any variable
    ///
    /// With `vars_must_exist`, reading a name the store does not know is an
    /// error.
    pub fn check_syntax(
        &self,
        source: &str,
        vars_must_exist: bool,
    ) -> Result<SyntaxReport, EquationError> {
        let mut parser = Parser::new(self, source, Mode::SyntaxCheck { vars_must_exist });
        match parser.parse_all() {
            Ok(()) => Ok(SyntaxReport {
                uses_can_data: parser.uses_can_data,
                warnings: mem::take(&mut parser.warnings),
            }),
            Err(error) => Err(parser.fail(error)),
        }
    }
}

/// State of one compile, evaluate or syntax-check call
pub(crate) struct Parser<'c, 'src> {
    source: &'src str,
    lexer: Lexer<'src>,
    token: Token<'src>,
    mode: Mode,
    options: &'c CompilerOptions,
    store: &'c Arc<dyn VariableStore>,
    scope: Option<&'c dyn ScriptScope>,
    /// Compile mode output
    program: Option<Program>,
    /// Scratch machine for direct and syntax-check mode
    vm: Vm<'static>,
    /// Attachments taken by direct-mode writes
    bindings: Vec<Binding>,
    warnings: Vec<String>,
    uses_can_data: bool,
}

impl<'c, 'src> Parser<'c, 'src> {
    fn new(compiler: &'c Compiler, source: &'src str, mode: Mode) -> Self {
        let program = (mode == Mode::Compile).then(|| {
            let mut program = Program::new(Arc::clone(&compiler.store), source);
            program.set_lock_held(compiler.options.lock_held);
            program
        });
        Self {
            source,
            lexer: Lexer::new(source),
            token: Token::End,
            mode,
            options: &compiler.options,
            store: &compiler.store,
            scope: compiler.scope.as_deref(),
            program,
            vm: Vm::new().with_lock_held(compiler.options.lock_held),
            bindings: Vec::new(),
            warnings: Vec::new(),
            uses_can_data: false,
        }
    }

    /// Wrap a stop-class error; the partial program is released here
    fn fail(&mut self, error: CompileError) -> EquationError {
        self.program = None;
        debug!(equation = self.source, %error, "equation rejected");
        EquationError {
            error,
            equation: self.source.to_string(),
            warnings: mem::take(&mut self.warnings),
        }
    }

    pub(crate) fn advance(&mut self) -> Result<(), CompileError> {
        self.token = self.lexer.next_token()?;
        Ok(())
    }

    /// Parse the whole input as one expression
    fn parse_all(&mut self) -> Result<(), CompileError> {
        self.advance()?;
        self.expression()?;
        if self.token != Token::End {
            return Err(CompileError::syntax(format!("unexpected {}", self.token)));
        }
        if !self.lexer.rest().trim().is_empty() {
            return Err(CompileError::syntax("unexpected ','"));
        }
        Ok(())
    }

    /// Parse `text` as a complete nested expression, then resume the outer input
    pub(crate) fn sub_expression(&mut self, text: &'src str) -> Result<(), CompileError> {
        let outer_lexer = mem::replace(&mut self.lexer, Lexer::new(text));
        let outer_token = mem::replace(&mut self.token, Token::End);
        let result = self.parse_all();
        self.lexer = outer_lexer;
        self.token = outer_token;
        result
    }

    /// Append an instruction, or run it right away outside compile mode
    pub(crate) fn emit(
        &mut self,
        op: impl Into<Operation>,
        payload: Payload,
    ) -> Result<(), CompileError> {
        let mut inst = Instruction::new(op, payload);
        match &mut self.program {
            Some(program) => program.push(inst),
            None => self.vm.step(&mut inst, &**self.store)?,
        }
        Ok(())
    }

    pub(crate) fn emit_literal(&mut self, value: TypedValue) -> Result<(), CompileError> {
        self.emit(OpCode::Literal, Payload::Literal(value))
    }

    pub(crate) fn is_compiling(&self) -> bool {
        self.mode == Mode::Compile
    }

    pub(crate) fn is_checking(&self) -> bool {
        matches!(self.mode, Mode::SyntaxCheck { .. })
    }

    /// Script scope, when locals are active for this call
    pub(crate) fn locals(&self) -> Option<&'c dyn ScriptScope> {
        if self.is_compiling() || !self.options.script_locals {
            return None;
        }
        self.scope
    }

    /// Record a continue-class message
    pub(crate) fn warn(&mut self, message: String) {
        warn!(equation = self.source, "{}", message);
        self.warnings.push(message);
    }

    /// Emit an instruction that accesses the variable `name`
    pub(crate) fn variable_op(&mut self, op: OpCode, name: &str) -> Result<(), CompileError> {
        match self.mode {
            Mode::Compile => self.bind_variable(op, name),
            Mode::Direct => self.access_variable(op, name),
            Mode::SyntaxCheck { vars_must_exist } => {
                if op.writes_variable() {
                    return Ok(());
                }
                let known = self.store.lookup(name).is_some()
                    || self.locals().is_some_and(|scope| scope.read_local(name).is_some());
                if vars_must_exist && !known {
                    return Err(CompileError::binding(BindingKind::Read, name));
                }
                self.emit_literal(TypedValue::f64(1.0))
            }
        }
    }

    fn bind_variable(&mut self, op: OpCode, name: &str) -> Result<(), CompileError> {
        let (policy, kind) = if op.writes_variable() {
            (self.options.missing_variables.write_policy(), BindingKind::Write)
        } else {
            (self.options.missing_variables.read_policy(), BindingKind::Read)
        };
        let binding = self
            .store
            .resolve_or_create_variable(name, policy, self.options.owner_pid)
            .map_err(|_| CompileError::binding(kind, name))?;
        // The program owns the attachment from here on
        self.emit(op, Payload::Variable(binding.id))?;

        if binding.created && policy == ExistPolicy::ShouldExist {
            self.warn(CompileError::binding(kind, name).to_string());
        }
        if is_physical(op) && !self.store.has_conversion(binding.id) {
            return Err(CompileError::binding(BindingKind::Conversion, name));
        }
        Ok(())
    }

    fn access_variable(&mut self, op: OpCode, name: &str) -> Result<(), CompileError> {
        let replaced = self
            .options
            .replace_variable
            .as_ref()
            .filter(|replace| replace.name == name)
            .map(|replace| replace.value);
        if let Some(value) = replaced {
            if op.writes_variable() {
                return Err(CompileError::context(format!(
                    "cannot write to replaced variable \"{}\"",
                    name
                )));
            }
            return self.emit_literal(value);
        }

        if let Some(scope) = self.locals() {
            match op {
                OpCode::Read => {
                    if let Some(value) = scope.read_local(name) {
                        return self.emit_literal(value);
                    }
                }
                OpCode::Write => {
                    if scope.write_local(name, self.vm.stack.peek()?) {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }

        let id = if op.writes_variable() {
            let policy = self.options.missing_variables.write_policy();
            let binding = self
                .store
                .resolve_or_create_variable(name, policy, self.options.owner_pid)
                .map_err(|_| CompileError::binding(BindingKind::Write, name))?;
            self.bindings.push(binding);
            if binding.created && policy == ExistPolicy::ShouldExist {
                self.warn(CompileError::binding(BindingKind::Write, name).to_string());
            }
            binding.id
        } else {
            self.store
                .lookup(name)
                .ok_or_else(|| CompileError::binding(BindingKind::Read, name))?
        };

        if is_physical(op) && !self.store.has_conversion(id) {
            return Err(CompileError::binding(BindingKind::Conversion, name));
        }
        self.emit(op, Payload::Variable(id))
    }

    /// Store variable behind a reference local
    pub(crate) fn dereference(&self, name: &str) -> Result<String, CompileError> {
        match self.locals() {
            Some(scope) => scope
                .dereference(name)
                .ok_or_else(|| CompileError::binding(BindingKind::Read, format!("*{}", name))),
            None => Err(CompileError::syntax(format!(
                "no dereference \"*{}\" allowed",
                name
            ))),
        }
    }
}

impl Drop for Parser<'_, '_> {
    fn drop(&mut self) {
        let remove_created = self.options.missing_variables.removes_created();
        for binding in self.bindings.drain(..) {
            // Created variables keep their attachment so they outlive the call
            if !binding.created || remove_created {
                self.store.detach(binding.id);
            }
        }
    }
}

fn is_physical(op: OpCode) -> bool {
    matches!(op, OpCode::ReadPhys | OpCode::WritePhys)
}
