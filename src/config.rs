//! Execution settings

use crate::bytecode::OptLevel;
use crate::error::{Error, Result};
use crate::tape::BoundsPolicy;

pub const DEFAULT_TAPE_LEN: usize = 30000;
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// What an input instruction does when the input stream is exhausted.
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq)]
pub enum EofBehavior {
    /// Leave the current cell as it is
    #[default]
    Unchanged,
    /// Store this value (wrapped to the cell width) in the current cell
    Set(i32),
}

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Config {
    /// Initial number of cells, at least 1
    pub tape_len: usize,
    pub bounds: BoundsPolicy,
    pub eof: EofBehavior,
    /// Output is written out in chunks of this many bytes
    pub chunk_size: usize,
    pub opt_level: OptLevel,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.tape_len == 0 {
            return Err(Error::ArrayConfig);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tape_len: DEFAULT_TAPE_LEN,
            bounds: BoundsPolicy::default(),
            eof: EofBehavior::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            opt_level: OptLevel::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.tape_len, 30000);
        assert_eq!(config.bounds, BoundsPolicy::Abort);
        assert_eq!(config.eof, EofBehavior::Unchanged);
        assert_eq!(config.opt_level, OptLevel::Coalesce);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_tape() {
        let config = Config {
            tape_len: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::ArrayConfig)));
    }
}
