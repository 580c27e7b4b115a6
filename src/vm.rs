//! Virtual machine that runs the bytecode

use std::io::{self, BufWriter, Read, Write};

use tracing::debug;

use crate::{
    bytecode::{Opcode, Program},
    config::{Config, EofBehavior},
    error::Result,
    tape::{Cell, Tape},
};

/// Virtual machine representation
///
/// Owns the tape for the whole run. Output is collected in a buffer of
/// [`Config::chunk_size`] bytes and written out as soon as it is full, before every input
/// and when the program ends.
pub struct Vm<'a, C, R, W: Write> {
    program: &'a Program,
    ip: usize, // instruction pointer
    tape: Tape<C>,
    input: R,
    output: BufWriter<W>,
    eof: EofBehavior,
    pub halted: bool,
}

impl<'a, C: Cell, R: Read, W: Write> Vm<'a, C, R, W> {
    pub fn new(program: &'a Program, config: &Config, input: R, output: W) -> Result<Self> {
        config.validate()?;
        let tape = Tape::new(config.tape_len, config.bounds)?;

        Ok(Vm {
            program,
            ip: 0,
            tape,
            input,
            output: BufWriter::with_capacity(config.chunk_size.max(1), output),
            eof: config.eof,
            halted: false,
        })
    }

    /// Run until the program ends. Does nothing on a halted machine.
    pub fn run(&mut self) -> Result<()> {
        while !self.halted {
            self.next_instruction()?;
        }
        Ok(())
    }

    /// Execute a single instruction, its pre-move included.
    pub fn next_instruction(&mut self) -> Result<()> {
        if self.halted {
            return Ok(());
        }

        let ins = self.program.instructions()[self.ip];
        self.tape.shift(ins.pre_move)?;

        match ins.opcode {
            Opcode::End => return self.ins_end(),
            Opcode::AddValue => self.ins_add_value(ins.operand)?,
            Opcode::MovePointer => self.tape.shift(ins.operand)?,
            // The sign of the resolved distance tells the two apart
            Opcode::JumpIfZero | Opcode::JumpIfNonZero => self.ins_jump(ins.operand)?,
            Opcode::SetZero => self.tape.set(C::default())?,
            Opcode::SeekZero => self.ins_seek_zero(ins.operand)?,
            Opcode::MoveAdd => self.ins_move_add(ins.operand)?,
            Opcode::Output => self.ins_output()?,
            Opcode::Input => self.ins_input()?,
        }

        self.ip += 1;
        Ok(())
    }

    pub fn tape(&self) -> &Tape<C> {
        &self.tape
    }

    pub fn into_tape(self) -> Tape<C> {
        self.tape
    }

    /// Opcode of the next instruction to run
    pub fn current_opcode(&self) -> Opcode {
        self.program.instructions()[self.ip].opcode
    }

    fn ins_add_value(&mut self, amount: i32) -> Result<()> {
        let value = self.tape.get()?;
        self.tape.set(value.wrapping_add_i32(amount))
    }

    /// Forward jumps are taken on zero, backward jumps on non-zero. Execution continues
    /// right after the matching bracket.
    fn ins_jump(&mut self, distance: i32) -> Result<()> {
        let zero = self.tape.get()?.is_zero();
        if (distance > 0 && zero) || (distance < 0 && !zero) {
            self.ip = self.ip.wrapping_add_signed(distance as isize);
        }
        Ok(())
    }

    /// Step by `step` cells until the current cell is zero
    fn ins_seek_zero(&mut self, step: i32) -> Result<()> {
        while !self.tape.get()?.is_zero() {
            self.tape.shift(step)?;
        }
        Ok(())
    }

    /// Add the current cell to the one `offset` cells away and clear the current cell
    fn ins_move_add(&mut self, offset: i32) -> Result<()> {
        let value = self.tape.get()?;
        // The loop body never runs on a zero cell, so the target is left alone
        if value.is_zero() {
            return Ok(());
        }
        let target = self.tape.resolve(offset)?;
        let cell = self.tape.cell_mut(target)?;
        *cell = cell.wrapping_add_cell(value);
        self.tape.set(C::default())
    }

    fn ins_output(&mut self) -> Result<()> {
        let byte = self.tape.get()?.to_byte();
        self.output.write_all(&[byte])?;
        if self.output.buffer().len() >= self.output.capacity() {
            self.output.flush()?;
        }
        Ok(())
    }

    /// Pending output goes out before blocking on input
    fn ins_input(&mut self) -> Result<()> {
        self.output.flush()?;

        match self.read_byte()? {
            Some(byte) => self.tape.set(C::from_byte(byte)),
            None => match self.eof {
                EofBehavior::Unchanged => Ok(()),
                EofBehavior::Set(value) => self.tape.set(C::from_i32(value)),
            },
        }
    }

    fn ins_end(&mut self) -> Result<()> {
        self.output.flush()?;
        self.halted = true;
        debug!(
            tape_len = self.tape.len(),
            position = self.tape.position(),
            "program halted"
        );
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}
