//! Child Tables
//!
//! Every process owns a fixed table of child slots. A parent names its
//! children by slot number only; nothing outside the parent can reach
//! the table.
//!
//! # Design
//! - Fixed-size array of 256 slots, filled lazily
//! - Slots are addressed by [`ChildSlot`] indices
//! - Operations: lookup, lookup-or-create

use super::ProcId;

/// Number of child slots per process.
pub const CHILD_SLOTS: usize = 256;

/// A slot index in a child table.
///
/// Any `u8` is a valid slot, so construction from a register cannot fail.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[repr(transparent)]
pub struct ChildSlot(u8);

impl ChildSlot {
    /// Create a slot index.
    #[inline]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Take the slot number from the low byte of a syscall register.
    #[inline]
    pub const fn from_reg(reg: u32) -> Self {
        Self((reg & 0xff) as u8)
    }

    /// Get the index value.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for ChildSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The child slots of one process.
#[derive(Debug)]
pub struct ChildTable {
    slots: [Option<ProcId>; CHILD_SLOTS],
}

impl ChildTable {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            slots: [None; CHILD_SLOTS],
        }
    }

    /// Look up the child in a slot.
    #[inline]
    pub fn get(&self, slot: ChildSlot) -> Option<ProcId> {
        self.slots[slot.index()]
    }

    /// Return the child in `slot`, filling an empty slot with `make`.
    pub fn get_or_try_insert<E>(
        &mut self,
        slot: ChildSlot,
        make: impl FnOnce() -> Result<ProcId, E>,
    ) -> Result<ProcId, E> {
        let entry = &mut self.slots[slot.index()];
        match *entry {
            Some(child) => Ok(child),
            None => {
                let child = make()?;
                *entry = Some(child);
                Ok(child)
            }
        }
    }
}

impl Default for ChildTable {
    fn default() -> Self {
        Self::new()
    }
}
