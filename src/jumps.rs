//! Jump target resolution.

use crate::bytecode::{Instruction, Opcode};

/// Pair every `JumpIfZero` with its `JumpIfNonZero` and store the distances between them:
/// positive on the forward jump, negative on the backward one.
///
/// Brackets must already be balanced; this is only reachable through
/// [`Compiler::compile`](crate::bytecode::Compiler::compile), which validates first.
/// Open loops are kept on an explicit stack so nesting depth is not limited by the call stack.
pub(crate) fn resolve_jumps(instructions: &mut [Instruction]) {
    let mut open = Vec::new();

    for index in 0..instructions.len() {
        match instructions[index].opcode {
            Opcode::JumpIfZero => open.push(index),
            Opcode::JumpIfNonZero => {
                let Some(start) = open.pop() else {
                    debug_assert!(false, "unbalanced jump at {index}");
                    continue;
                };

                let distance = (index - start) as i32;
                instructions[start].operand = distance;
                instructions[index].operand = -distance;
            }
            _ => {}
        }
    }

    debug_assert!(open.is_empty(), "unclosed jumps at {open:?}");
}
