//! Bytecode representation and the optimizing compiler that produces it

use std::fmt;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::{
    error::Result,
    jumps::resolve_jumps,
    lexer::strip_comments,
    token::Command,
    validate::check_brackets,
};

/// Supported instructions of the bytecode.
///
/// The discriminant is the dispatch tag of the instruction.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Opcode {
    /// Flush output and halt
    End = 0,
    /// Add the operand to the current cell
    AddValue = 1,
    /// Move the pointer by the operand
    MovePointer = 2,
    /// Loop entry. Jumps forward by the operand if the current cell is zero
    JumpIfZero = 3,
    /// Loop exit. Jumps backward by the operand if the current cell is not zero
    JumpIfNonZero = 4,
    /// Set the current cell to zero
    SetZero = 5,
    /// Move the pointer by the operand until a zero cell is reached
    SeekZero = 6,
    /// Add the current cell to the cell at the operand offset, then zero it
    MoveAdd = 7,
    /// Write the current cell as a byte
    Output = 8,
    /// Read a byte into the current cell
    Input = 9,
}

impl Opcode {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::End => "END",
            Opcode::AddValue => "ADD",
            Opcode::MovePointer => "MOVE",
            Opcode::JumpIfZero => "JZ",
            Opcode::JumpIfNonZero => "JNZ",
            Opcode::SetZero => "ZERO",
            Opcode::SeekZero => "SEEK",
            Opcode::MoveAdd => "MADD",
            Opcode::Output => "OUT",
            Opcode::Input => "IN",
        }
    }
}

/// One compiled instruction.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    /// Count, offset or jump distance depending on the opcode
    pub operand: i32,
    /// Pointer displacement applied right before the instruction runs
    pub pre_move: i32,
}

/// A compiled and jump-resolved program. Always ends with [`Opcode::End`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, ins) in self.instructions.iter().enumerate() {
            write!(f, "{index:>6}  ")?;
            if ins.pre_move != 0 {
                write!(f, "{:<8}", format!("@{:+}", ins.pre_move))?;
            } else {
                write!(f, "{:<8}", "")?;
            }
            match ins.opcode {
                Opcode::End | Opcode::SetZero | Opcode::Output | Opcode::Input => {
                    writeln!(f, "{}", ins.opcode.mnemonic())?
                }
                Opcode::JumpIfZero | Opcode::JumpIfNonZero => writeln!(
                    f,
                    "{:<5} {}",
                    ins.opcode.mnemonic(),
                    index as i64 + ins.operand as i64
                )?,
                _ => writeln!(f, "{:<5} {:+}", ins.opcode.mnemonic(), ins.operand)?,
            }
        }
        Ok(())
    }
}

/// How much rewriting the compiler does. Each level includes the previous ones.
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum OptLevel {
    /// One instruction per command
    None,
    /// Runs of identical `+ - < >` folded into one signed instruction
    Fold,
    /// Clear, seek and move-add loops replaced by single instructions
    Peephole,
    /// Pointer moves merged into the following instruction
    #[default]
    Coalesce,
}

impl FromStr for OptLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "0" | "none" => Ok(OptLevel::None),
            "1" | "fold" => Ok(OptLevel::Fold),
            "2" | "peephole" => Ok(OptLevel::Peephole),
            "3" | "coalesce" => Ok(OptLevel::Coalesce),
            _ => Err(format!("unknown optimization level '{s}', expected 0 to 3")),
        }
    }
}

/// Working arrays of the compiler, kept index-aligned.
///
/// A `None` opcode marks a slot deleted by a rewrite; [`CompileContext::compact`] removes them.
struct CompileContext {
    ops: Vec<Option<Opcode>>,
    coeffs: Vec<i32>,
    moves: Vec<i32>,
}

impl CompileContext {
    fn with_capacity(capacity: usize) -> Result<Self> {
        let mut ops = Vec::new();
        let mut coeffs = Vec::new();
        let mut moves = Vec::new();
        ops.try_reserve_exact(capacity)?;
        coeffs.try_reserve_exact(capacity)?;
        moves.try_reserve_exact(capacity)?;
        Ok(CompileContext { ops, coeffs, moves })
    }

    fn push(&mut self, opcode: Opcode, coeff: i32) {
        self.ops.push(Some(opcode));
        self.coeffs.push(coeff);
        self.moves.push(0);
    }

    fn len(&self) -> usize {
        self.ops.len()
    }

    /// Translate normalized code into instructions, folding runs of identical `+ - < >`
    /// into one signed instruction when `fold_runs` is set. An `End` is appended.
    fn fold(code: &[u8], fold_runs: bool) -> Result<Self> {
        // +1 for the trailing `End`
        let mut ctx = Self::with_capacity(code.len() + 1)?;
        let mut commands = code.iter().filter_map(|&ch| Command::from_byte(ch)).peekable();

        while let Some(command) = commands.next() {
            let opcode = match command {
                Command::Incr | Command::Decr => Opcode::AddValue,
                Command::Left | Command::Right => Opcode::MovePointer,
                Command::LoopStart => Opcode::JumpIfZero,
                Command::LoopEnd => Opcode::JumpIfNonZero,
                Command::Read => Opcode::Input,
                Command::Write => Opcode::Output,
            };

            let coeff = match command.step() {
                Some(step) => {
                    let mut count = 1i32;
                    // Longer runs continue in a new instruction
                    while fold_runs && count < i32::MAX && commands.next_if_eq(&command).is_some()
                    {
                        count += 1;
                    }
                    step * count
                }
                None => 0,
            };

            ctx.push(opcode, coeff);
        }

        ctx.push(Opcode::End, 0);
        Ok(ctx)
    }

    /// Replace the clear, seek and move-add loop idioms by single instructions.
    /// Returns the number of loops rewritten.
    fn rewrite_loops(&mut self) -> usize {
        use Opcode::*;

        let mut rewritten = 0;
        let mut i = 0;
        while i + 2 < self.len() {
            let c = &self.coeffs[i..];
            let found = match self.ops[i..] {
                // [-]
                [Some(JumpIfZero), Some(AddValue), Some(JumpIfNonZero), ..] if c[1] == -1 => {
                    Some((3, SetZero, 0))
                }
                // [>] or [<<]
                [Some(JumpIfZero), Some(MovePointer), Some(JumpIfNonZero), ..] => {
                    Some((3, SeekZero, c[1]))
                }
                // [->+<] with opposite moves
                [Some(JumpIfZero), Some(AddValue), Some(MovePointer), Some(AddValue), Some(MovePointer), Some(JumpIfNonZero), ..]
                    if c[1] == -1 && c[3] == 1 && c[2] == -c[4] =>
                {
                    Some((6, MoveAdd, c[2]))
                }
                _ => None,
            };

            match found {
                Some((width, opcode, coeff)) => {
                    trace!(at = i, ?opcode, coeff, "rewrote loop");
                    self.ops[i] = Some(opcode);
                    self.coeffs[i] = coeff;
                    for slot in &mut self.ops[i + 1..i + width] {
                        *slot = None;
                    }
                    rewritten += 1;
                    i += width;
                }
                None => i += 1,
            }
        }
        rewritten
    }

    /// Merge pointer moves into the instruction that follows them.
    /// Must run on a compacted context. Returns the number of moves merged.
    ///
    /// Moves in opposite directions are never summed: under `Abort` and `Block` a step
    /// off the tape and back is not the same as staying put. A move that reverses the
    /// previous one keeps its slot and carries the previous one as its pre-move.
    fn coalesce_moves(&mut self) -> usize {
        let mut merged = 0;
        // The last slot is always `End`, so every move has a follower
        for i in 0..self.len().saturating_sub(1) {
            if self.ops[i] != Some(Opcode::MovePointer) {
                continue;
            }
            let (pre_move, step) = (self.moves[i], self.coeffs[i]);
            if pre_move != 0 && pre_move.signum() != step.signum() {
                continue;
            }
            let displacement = pre_move.saturating_add(step);
            self.moves[i + 1] = self.moves[i + 1].saturating_add(displacement);
            self.ops[i] = None;
            merged += 1;
        }
        merged
    }

    /// Remove deleted slots, closing the gaps in all three arrays.
    fn compact(&mut self) {
        let mut j = 0;
        for i in 0..self.len() {
            if self.ops[i].is_some() {
                self.ops[j] = self.ops[i];
                self.coeffs[j] = self.coeffs[i];
                self.moves[j] = self.moves[i];
                j += 1;
            }
        }
        self.ops.truncate(j);
        self.coeffs.truncate(j);
        self.moves.truncate(j);
    }

    fn into_program(self) -> Result<Program> {
        let mut instructions = Vec::new();
        instructions.try_reserve_exact(self.len())?;
        instructions.extend(
            self.ops
                .iter()
                .zip(&self.coeffs)
                .zip(&self.moves)
                .filter_map(|((opcode, &operand), &pre_move)| {
                    opcode.map(|opcode| Instruction {
                        opcode,
                        operand,
                        pre_move,
                    })
                }),
        );
        Ok(Program { instructions })
    }
}

/// Compiler to generate bytecode from program text
pub struct Compiler {
    level: OptLevel,
}

impl Compiler {
    pub fn new(level: OptLevel) -> Self {
        Compiler { level }
    }

    /// Validate, normalize, optimize and resolve `source` into a `Program`
    pub fn compile(&self, source: &[u8]) -> Result<Program> {
        check_brackets(source)?;

        let mut code = Vec::new();
        code.try_reserve_exact(source.len())?;
        code.extend_from_slice(source);
        strip_comments(&mut code);

        let mut ctx = CompileContext::fold(&code, self.level >= OptLevel::Fold)?;
        debug!(
            raw = source.len(),
            commands = code.len(),
            instructions = ctx.len(),
            "folded"
        );

        if self.level >= OptLevel::Peephole {
            let rewritten = ctx.rewrite_loops();
            ctx.compact();
            debug!(rewritten, instructions = ctx.len(), "rewrote loops");
        }

        if self.level >= OptLevel::Coalesce {
            let merged = ctx.coalesce_moves();
            ctx.compact();
            debug!(merged, instructions = ctx.len(), "coalesced moves");
        }

        let mut program = ctx.into_program()?;
        resolve_jumps(&mut program.instructions);

        Ok(program)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new(OptLevel::default())
    }
}
