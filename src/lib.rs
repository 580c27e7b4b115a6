//! Tape VM (tapevm) is an optimizing compiler and virtual machine for the eight-command
//! tape language.
//!
//! # Example
//!
//! ```text
//! ++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.
//! >---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.
//! ```
//!
//! prints `Hello World!`.
//!
//! # Commands
//!
//! | Command | Brief |
//! |---------|-------|
//! | `+`     | Increment the current cell. |
//! | `-`     | Decrement the current cell. |
//! | `>`     | Move the pointer one cell to the right. |
//! | `<`     | Move the pointer one cell to the left. |
//! | `[`     | Jump past the matching `]` if the current cell is zero. |
//! | `]`     | Jump back after the matching `[` if the current cell is not zero. |
//! | `.`     | Write the current cell as a byte. |
//! | `,`     | Read a byte into the current cell. |
//!
//! Every other byte is a comment.
//!
//! # Bytecode
//!
//! | Tag | Instruction   | Operand | Brief |
//! |-----|---------------|---------|-------|
//! | 0   | End           | -       | Flush the output and halt. |
//! | 1   | AddValue      | amount  | Add `amount` to the current cell. Folded runs of `+`/`-`. |
//! | 2   | MovePointer   | offset  | Move the pointer. Folded runs of `>`/`<`. |
//! | 3   | JumpIfZero    | distance| Loop entry. |
//! | 4   | JumpIfNonZero | distance| Loop exit. |
//! | 5   | SetZero       | -       | `[-]` |
//! | 6   | SeekZero      | step    | `[>]`, `[<<]`, ... |
//! | 7   | MoveAdd       | offset  | `[->+<]`, `[-<<+>>]`, ... |
//! | 8   | Output        | -       | `.` |
//! | 9   | Input         | -       | `,` |
//!
//! Every instruction also carries a pre-move: a pointer displacement applied right before
//! it runs, which replaces the `MovePointer` instructions at the highest optimization level.
//!
//! # Important notes
//!
//! - Brackets are checked before anything else. A mismatch is reported with its position.
//! - Pointer moves past the ends of the tape are handled by the configured
//!   [`BoundsPolicy`](tape::BoundsPolicy).
//! - Every error is fatal.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

pub mod bytecode;
pub mod config;
pub mod error;
mod jumps;
mod lexer;
pub mod tape;
pub mod token;
mod validate;
pub mod vm;

pub use bytecode::{Compiler, Instruction, Opcode, OptLevel, Program};
pub use config::{Config, EofBehavior};
pub use error::{Error, Result};
pub use tape::{BoundsPolicy, Cell, Tape};
pub use vm::Vm;

/// Read the whole program file.
pub fn load_source(path: &Path) -> Result<Vec<u8>> {
    let source_err = |source| Error::Source {
        path: path.to_path_buf(),
        source,
    };

    let mut file = fs::File::open(path).map_err(source_err)?;
    let mut source = Vec::new();
    if let Ok(metadata) = file.metadata() {
        source.try_reserve_exact(metadata.len() as usize)?;
    }
    file.read_to_end(&mut source).map_err(source_err)?;

    Ok(source)
}

/// Compile and run `source`, returning the final tape.
pub fn execute<C: Cell, R: Read, W: Write>(
    source: &[u8],
    config: &Config,
    input: R,
    output: W,
) -> Result<Tape<C>> {
    config.validate()?;
    let program = Compiler::new(config.opt_level).compile(source)?;

    let mut vm = Vm::<C, R, W>::new(&program, config, input, output)?;
    vm.run()?;

    Ok(vm.into_tape())
}

/// Test utilities
#[cfg(test)]
pub(crate) mod test_utils {
    pub const HELLO_WORLD: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

    /// Show library logs in test output. Call at the start of a test.
    pub fn init_test_logging() {
        use tracing_subscriber::{fmt, EnvFilter};

        // Ignore the error if another test already installed it
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
