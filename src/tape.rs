//! Runtime memory: a tape of integer cells and the pointer into it

use std::fmt::Debug;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};

/// A fixed-width integer usable as a tape cell. Arithmetic wraps.
pub trait Cell: Copy + Default + Eq + Debug {
    /// Add a signed amount, wrapping at the cell width
    fn wrapping_add_i32(self, amount: i32) -> Self;
    /// Add another cell, wrapping at the cell width
    fn wrapping_add_cell(self, other: Self) -> Self;
    fn from_byte(byte: u8) -> Self;
    /// The low byte of the cell
    fn to_byte(self) -> u8;
    /// Convert a configured value, wrapping at the cell width
    fn from_i32(value: i32) -> Self;

    fn is_zero(self) -> bool {
        self == Self::default()
    }
}

macro_rules! impl_cell {
    ($($ty:ty),*) => {
        $(
            impl Cell for $ty {
                #[inline(always)]
                fn wrapping_add_i32(self, amount: i32) -> Self {
                    self.wrapping_add(amount as $ty)
                }

                #[inline(always)]
                fn wrapping_add_cell(self, other: Self) -> Self {
                    self.wrapping_add(other)
                }

                #[inline(always)]
                fn from_byte(byte: u8) -> Self {
                    byte as $ty
                }

                #[inline(always)]
                fn to_byte(self) -> u8 {
                    self as u8
                }

                #[inline(always)]
                fn from_i32(value: i32) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_cell!(u8, u16, u32, u64, i8, i16, i32, i64);

/// What happens when the pointer is moved outside of the tape.
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq)]
pub enum BoundsPolicy {
    /// No check at all. The pointer may leave the tape; reading or writing a cell
    /// there fails with [`Error::MemoryBounds`].
    Unchecked,
    /// Grow the tape with zeroed cells on whichever side was crossed
    Extend,
    /// Fail with [`Error::MemoryBounds`]
    #[default]
    Abort,
    /// Continue from the other end
    Wrap,
    /// Stop at the first or last cell
    Block,
}

impl FromStr for BoundsPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "unchecked" | "none" => Ok(BoundsPolicy::Unchecked),
            "extend" => Ok(BoundsPolicy::Extend),
            "abort" => Ok(BoundsPolicy::Abort),
            "wrap" => Ok(BoundsPolicy::Wrap),
            "block" => Ok(BoundsPolicy::Block),
            _ => Err(format!(
                "unknown bounds policy '{s}', expected one of unchecked, extend, abort, wrap, block"
            )),
        }
    }
}

/// Cells plus the pointer. The pointer starts at cell 0.
#[derive(Debug, Clone)]
pub struct Tape<C> {
    cells: Vec<C>,
    ptr: isize,
    policy: BoundsPolicy,
}

impl<C: Cell> Tape<C> {
    pub fn new(len: usize, policy: BoundsPolicy) -> Result<Self> {
        if len == 0 {
            return Err(Error::ArrayConfig);
        }

        let mut cells = Vec::new();
        cells.try_reserve_exact(len)?;
        cells.resize(len, C::default());

        Ok(Tape {
            cells,
            ptr: 0,
            policy,
        })
    }

    pub fn cells(&self) -> &[C] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn position(&self) -> isize {
        self.ptr
    }

    pub fn policy(&self) -> BoundsPolicy {
        self.policy
    }

    /// Value of the current cell
    #[inline]
    pub fn get(&self) -> Result<C> {
        self.cells
            .get(self.ptr as usize)
            .copied()
            .ok_or_else(|| self.out_of_bounds(self.ptr))
    }

    /// Overwrite the current cell
    #[inline]
    pub fn set(&mut self, value: C) -> Result<()> {
        *self.cell_mut(self.ptr)? = value;
        Ok(())
    }

    /// Mutable access to the cell at `index`
    #[inline]
    pub fn cell_mut(&mut self, index: isize) -> Result<&mut C> {
        let last = self.cells.len() - 1;
        // A negative index turns into a huge one and misses as well
        self.cells
            .get_mut(index as usize)
            .ok_or(Error::MemoryBounds { index, last })
    }

    /// Move the pointer by `offset` cells.
    #[inline]
    pub fn shift(&mut self, offset: i32) -> Result<()> {
        if offset != 0 {
            self.ptr = self.resolve(offset)?;
        }
        Ok(())
    }

    /// Index of the cell `offset` cells away from the pointer, with the bounds policy applied.
    ///
    /// The pointer itself stays on the same cell, although under `Extend` its index changes
    /// when the tape grows to the left.
    pub fn resolve(&mut self, offset: i32) -> Result<isize> {
        let requested = self.ptr.saturating_add(offset as isize);
        let len = self.cells.len() as isize;

        if (0..len).contains(&requested) {
            return Ok(requested);
        }

        match self.policy {
            BoundsPolicy::Unchecked => Ok(requested),
            BoundsPolicy::Extend => self.extend(requested),
            BoundsPolicy::Abort => Err(self.out_of_bounds(requested)),
            BoundsPolicy::Wrap => Ok(requested.rem_euclid(len)),
            BoundsPolicy::Block => Ok(requested.clamp(0, len - 1)),
        }
    }

    /// Grow the tape so that `requested` is a valid index and return its new index.
    fn extend(&mut self, requested: isize) -> Result<isize> {
        let old_len = self.cells.len();

        if requested >= 0 {
            let new_len = requested as usize + 1;
            self.cells.try_reserve(new_len - old_len)?;
            self.cells.resize(new_len, C::default());
            debug!(old_len, new_len, "extended tape to the right");
            Ok(requested)
        } else {
            // Existing cells move up by `grow` and the new cells go in front
            let grow = requested.unsigned_abs();
            self.cells.try_reserve(grow)?;
            self.cells.resize(old_len + grow, C::default());
            self.cells.rotate_right(grow);
            self.ptr += grow as isize;
            debug!(old_len, new_len = self.cells.len(), "extended tape to the left");
            Ok(0)
        }
    }

    fn out_of_bounds(&self, index: isize) -> Error {
        Error::MemoryBounds {
            index,
            last: self.cells.len() - 1,
        }
    }
}
