//! Function calls
//!
//! Names resolve against the fixed builtin table first, then the irregular
//! builtins that read their own parameter text, then registered plugins.

use crate::builtins::{self, registry, Arity, BuiltinSpec, Gate, MAX_ARGS};
use crate::bytecode::{EdgeState, Operation, Payload};
use crate::compiler::lexer::{is_variable_name, split_args};
use crate::compiler::{Mode, Parser};
use crate::error::{BindingKind, CompileError};
use crate::opcode::OpCode;
use equation_types::{DataType, TypedValue};
use std::cmp::Ordering;
use std::path::Path;

impl<'c, 'src> Parser<'c, 'src> {
    pub(crate) fn call(&mut self, name: &str, args: &'src str) -> Result<(), CompileError> {
        if let Some(spec) = builtins::lookup(name) {
            return self.fixed_builtin(spec, args);
        }
        match name {
            "phys" => self.phys(args),
            "enum" => self.enum_value(args),
            "exist" | "env_exist" | "file_exist" | "get_process_state" => self.query(name, args),
            "strcmp" | "stricmp" | "strncmp" | "strnicmp" => self.compare_strings(name, args),
            "get_binary" => self.raw_bits(OpCode::GetBinary, name, args),
            "ones_complement" => self.raw_bits(OpCode::OnesComplement, name, args),
            "set_binary" => self.set_binary(args),
            _ => self.plugin(name, args),
        }
    }

    fn fixed_builtin(&mut self, spec: &BuiltinSpec, args: &'src str) -> Result<(), CompileError> {
        let params = split_args(args);
        check_arity(spec.name, spec.arity, params.len())?;
        self.check_gate(spec.gate, spec.name)?;
        self.arguments(spec.name, &params)?;

        if spec.op == OpCode::EqualDecimals && params.len() == 2 {
            self.emit_literal(TypedValue::f64(0.0))?;
        }
        if spec.gate == Gate::Can && self.is_checking() {
            return self.stub_result(params.len());
        }
        let payload = if spec.variadic {
            Payload::ArgCount(params.len() as u8)
        } else if spec.gate == Gate::Stateful {
            Payload::Edge(EdgeState::Uninitialized)
        } else {
            Payload::None
        };
        self.emit(spec.op, payload)
    }

    fn plugin(&mut self, name: &str, args: &'src str) -> Result<(), CompileError> {
        let Some(meta) = registry::lookup_plugin(name) else {
            return Err(CompileError::syntax(format!(
                "unknown builtin function '{}'",
                name
            )));
        };
        let params = split_args(args);
        let arity = if meta.min_args == meta.max_args {
            Arity::Exact(meta.min_args)
        } else {
            Arity::Range(meta.min_args, meta.max_args)
        };
        check_arity(name, arity, params.len())?;
        if meta.uses_can_data() {
            self.check_gate(Gate::Can, name)?;
        }
        self.arguments(name, &params)?;

        if meta.uses_can_data() && self.is_checking() {
            return self.stub_result(params.len());
        }
        self.emit(Operation::Plugin(meta.id), Payload::None)
    }

    /// Emit every parameter as a nested expression, in order
    fn arguments(&mut self, function: &str, params: &[&'src str]) -> Result<(), CompileError> {
        for &param in params {
            if param.is_empty() {
                return Err(CompileError::syntax(format!(
                    "empty parameter in {}()",
                    function
                )));
            }
            self.sub_expression(param)?;
        }
        Ok(())
    }

    fn check_gate(&mut self, gate: Gate, name: &str) -> Result<(), CompileError> {
        match gate {
            Gate::Anywhere => Ok(()),
            Gate::Can => {
                if self.mode == Mode::Direct || !self.options.can_commands {
                    return Err(CompileError::context(format!(
                        "builtin function '{}' only allowed in CAN configuration",
                        name
                    )));
                }
                self.uses_can_data = true;
                Ok(())
            }
            Gate::Stateful => {
                if self.is_compiling() {
                    Ok(())
                } else {
                    Err(not_allowed(name))
                }
            }
        }
    }

    /// Syntax check stand-in for operations that need a CAN frame
    fn stub_result(&mut self, consumed: usize) -> Result<(), CompileError> {
        self.vm.stack.pop_n(consumed)?;
        self.vm.stack.push(TypedValue::f64(0.0))?;
        Ok(())
    }

    // ========================================================================
    // Irregular builtins
    // ========================================================================

    /// `phys(name)` or `phys(*name)`, optionally followed by an assignment
    fn phys(&mut self, args: &str) -> Result<(), CompileError> {
        let name = match args.strip_prefix('*') {
            Some(reference) => self.dereference(reference.trim())?,
            None => variable_name("phys", args)?.to_string(),
        };
        if self.token.is_assignment() {
            self.assignment(&name, true)
        } else {
            self.variable_op(OpCode::ReadPhys, &name)
        }
    }

    /// `enum(variable.TEXT)` or `enum(variable@TEXT)`
    fn enum_value(&mut self, args: &str) -> Result<(), CompileError> {
        let Some(split) = args.rfind(|c| c == '.' || c == '@') else {
            return Err(CompileError::syntax(format!(
                "expecting \"variable.TEXT\" in enum({})",
                args
            )));
        };
        let (variable, text) = (args[..split].trim(), args[split + 1..].trim());

        if self.is_checking() {
            return self.variable_op(OpCode::Read, variable);
        }
        let id = self
            .store
            .lookup(variable)
            .ok_or_else(|| CompileError::binding(BindingKind::Read, variable))?;
        let raw = self.store.enum_value(id, text).ok_or_else(|| {
            CompileError::syntax(format!(
                "variable \"{}\" has no enum \"{}\"",
                variable, text
            ))
        })?;
        self.emit_literal(TypedValue::f64(raw as f64))
    }

    /// Lookups against the host environment, direct evaluation only
    fn query(&mut self, name: &str, args: &str) -> Result<(), CompileError> {
        if self.is_compiling() {
            return Err(not_allowed(name));
        }
        let subject = unquote(args);
        if name == "env_exist" && subject.contains('%') {
            return Err(CompileError::syntax(format!(
                "expecting a plain environment variable name in env_exist({})",
                args
            )));
        }
        if self.is_checking() {
            return self.emit_literal(TypedValue::f64(1.0));
        }

        let answer = match name {
            "exist" => self
                .store
                .lookup(subject)
                .is_some_and(|id| self.store.data_type(id) != DataType::Unknown)
                as i32,
            "env_exist" => (is_env_name(subject) && std::env::var_os(subject).is_some()) as i32,
            "file_exist" => Path::new(subject).exists() as i32,
            _ => self.store.process_state(subject) as i32,
        };
        self.emit_literal(TypedValue::f64(answer as f64))
    }

    /// `strcmp(a, b)` and friends; the `n` variants take a length expression
    fn compare_strings(&mut self, name: &str, args: &'src str) -> Result<(), CompileError> {
        if self.is_compiling() {
            return Err(not_allowed(name));
        }
        let bounded = name.starts_with("strn");
        let ignore_case = matches!(name, "stricmp" | "strnicmp");
        let params = split_args(args);
        check_arity(name, Arity::Exact(if bounded { 3 } else { 2 }), params.len())?;

        let limit = if bounded {
            self.arguments(name, &params[2..])?;
            Some(self.vm.stack.pop()?.to_u64() as usize)
        } else {
            None
        };
        if self.is_checking() {
            return self.emit_literal(TypedValue::f64(1.0));
        }

        let normalize = |s: &str| -> Vec<u8> {
            let bytes = unquote(s).bytes();
            let bytes: Vec<u8> = if ignore_case {
                bytes.map(|b| b.to_ascii_lowercase()).collect()
            } else {
                bytes.collect()
            };
            match limit {
                Some(n) => bytes.into_iter().take(n).collect(),
                None => bytes,
            }
        };
        let ordering = match normalize(params[0]).cmp(&normalize(params[1])) {
            Ordering::Less => -1.0,
            Ordering::Equal => 0.0,
            Ordering::Greater => 1.0,
        };
        self.emit_literal(TypedValue::f64(ordering))
    }

    /// `get_binary(name)` and `ones_complement(name)`
    fn raw_bits(&mut self, op: OpCode, function: &str, args: &str) -> Result<(), CompileError> {
        let name = variable_name(function, args)?;
        self.variable_op(op, name)
    }

    /// `set_binary(name, bits)`
    fn set_binary(&mut self, args: &'src str) -> Result<(), CompileError> {
        let params = split_args(args);
        check_arity("set_binary", Arity::Exact(2), params.len())?;
        let name = variable_name("set_binary", params[0])?;
        self.arguments("set_binary", &params[1..])?;
        self.variable_op(OpCode::SetBinary, name)
    }
}

fn check_arity(function: &str, arity: Arity, got: usize) -> Result<(), CompileError> {
    if got > MAX_ARGS || !arity.accepts(got) {
        return Err(CompileError::Arity {
            function: function.to_string(),
            expected: arity.to_string(),
            got,
        });
    }
    Ok(())
}

fn not_allowed(function: &str) -> CompileError {
    CompileError::context(format!("function {}() not allowed in this context", function))
}

/// The single variable name parameter of an irregular builtin
fn variable_name<'a>(function: &str, args: &'a str) -> Result<&'a str, CompileError> {
    let name = args.trim();
    if is_variable_name(name) {
        Ok(name)
    } else {
        Err(CompileError::syntax(format!(
            "expecting a variable name in {}({})",
            function, args
        )))
    }
}

fn is_env_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['=', '\0'])
}

fn unquote(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}
