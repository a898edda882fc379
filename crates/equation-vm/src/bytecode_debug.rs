//! Bytecode debugging utilities

use crate::builtins::registry;
use crate::bytecode::{EdgeState, Instruction, Operation, Payload, Program};
use std::fmt::Write;

/// Render a program as one instruction per line
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "; {}", program.source());
    let _ = writeln!(
        out,
        "; {} instructions, {} bindings{}",
        program.len(),
        program.bindings().count(),
        if program.uses_can_data() { ", uses CAN data" } else { "" }
    );
    for (pc, inst) in program.instructions().iter().enumerate() {
        let _ = writeln!(out, "{:04}  {}", pc, disassemble_instruction(inst));
    }
    out
}

/// Disassemble a single instruction
pub fn disassemble_instruction(inst: &Instruction) -> String {
    let name = match inst.op {
        Operation::Builtin(op) => op.name().to_string(),
        Operation::Plugin(id) => registry::plugin_name(id).unwrap_or_else(|| id.to_string()),
    };
    match inst.payload {
        Payload::None => name,
        Payload::Literal(v) => format!("{:<16}{}", name, v),
        Payload::Variable(id) => format!("{:<16}var#{}", name, id),
        Payload::ArgCount(n) => format!("{:<16}argc={}", name, n),
        Payload::Edge(EdgeState::Uninitialized) => format!("{:<16}last=-", name),
        Payload::Edge(EdgeState::LastValue(v)) => format!("{:<16}last={}", name, v),
    }
}
