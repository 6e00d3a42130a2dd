//! Link to the next free block, unsynchronized.

use core::{
    cell::Cell,
    ptr::NonNull,
};

use super::FreeBlock;

/// BlockLink
///
/// A link threading a block onto the circular list of free blocks.
///
/// The list being circular, a link within it always points to a `FreeBlock`; it is dangling, not null, until the
/// block is threaded on.
pub(crate) struct BlockLink(Cell<NonNull<FreeBlock>>);

impl BlockLink {
    /// Creates a dangling instance.
    pub(crate) const fn dangling() -> Self { Self(Cell::new(NonNull::dangling())) }

    /// Returns the block linked to.
    pub(crate) fn get(&self) -> NonNull<FreeBlock> { self.0.get() }

    /// Sets the block linked to.
    pub(crate) fn set(&self, ptr: NonNull<FreeBlock>) { self.0.set(ptr); }
}

// mod tests
