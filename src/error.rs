//! Fatal error conditions. Nothing here is recoverable: every error ends the run.

use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Wrong command line invocation.
    #[error("{0} (exactly one program file is expected, see --help)")]
    Usage(String),

    /// The program source could not be opened or fully read.
    #[error("the file {} could not be read", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Unbalanced brackets in the program text.
    #[error("unmatched bracket at position {position}")]
    Syntax { position: usize },

    /// The initial tape must hold at least one cell.
    #[error("the initial tape length must be at least 1 cell")]
    ArrayConfig,

    /// Memory could not be obtained.
    #[error("memory could not be allocated")]
    Allocation(#[from] TryReserveError),

    /// The pointer left the tape under the abort policy, or an unchecked pointer was
    /// dereferenced outside of the tape.
    #[error("attempt to reach cell {index} which is outside of the tape (0 - {last})")]
    MemoryBounds { index: isize, last: usize },

    /// Reading input or writing output failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
