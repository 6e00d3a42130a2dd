//! An intrusive, circular, singly-linked list of free blocks.
//!
//! The list is anchored by a sentinel block owned by the list itself: the last free block links back to the
//! sentinel, so that traversal needs no null checks. Insertion always happens at the front, making reuse last-in
//! first-out.
//!
//! An empty list is a sentinel linked to itself. A Rust `const fn` cannot name the address of the instance it is
//! constructing, so a fresh list starts with a dangling sentinel link instead, and completes its initialization on
//! first use.

use core::{cell::Cell, ptr::NonNull};

use super::blocks::FreeBlock;

/// FreeList
///
/// #   Warning
///
/// The sentinel is linked into the list by address: once `push_front` or `take_first_fit` has been called, the list
/// must no longer be moved in memory.
pub(crate) struct FreeList {
    sentinel: FreeBlock,
    initialized: Cell<bool>,
}

impl FreeList {
    /// Creates an empty list.
    pub(crate) const fn new() -> Self {
        Self { sentinel: FreeBlock::new_sentinel(), initialized: Cell::new(false) }
    }

    /// Prepends `block` to the front of the list.
    pub(crate) fn push_front(&self, block: NonNull<FreeBlock>) {
        self.ensure_initialized();

        //  Safety:
        //  -   Bounded lifetime.
        let block_ref = unsafe { block.as_ref() };

        block_ref.set_next(self.sentinel.next());
        self.sentinel.set_next(block);
    }

    /// Removes and returns the first block of at least `size` bytes, scanning from the front.
    ///
    /// Returns None if no linked block is large enough.
    pub(crate) fn take_first_fit(&self, size: usize) -> Option<NonNull<FreeBlock>> {
        self.ensure_initialized();

        let sentinel = self.sentinel_address();

        let mut previous = sentinel;

        //  Safety:
        //  -   Bounded lifetime.
        let mut current = unsafe { previous.as_ref() }.next();

        while current != sentinel {
            //  Safety:
            //  -   Bounded lifetime.
            let current_ref = unsafe { current.as_ref() };

            if current_ref.header().size() >= size {
                //  Safety:
                //  -   Bounded lifetime.
                unsafe { previous.as_ref() }.set_next(current_ref.next());

                return Some(current);
            }

            previous = current;
            current = current_ref.next();
        }

        None
    }

    /// Returns the address of the sentinel; traversals start, and stop, there.
    pub(crate) fn sentinel_address(&self) -> NonNull<FreeBlock> { NonNull::from(&self.sentinel) }

    /// Links the sentinel to itself, the first time around.
    ///
    /// Must be called before any traversal starting at `sentinel_address`, as the sentinel link of a fresh list is
    /// dangling.
    pub(crate) fn ensure_initialized(&self) {
        if self.initialized.get() {
            return;
        }

        self.sentinel.set_next(self.sentinel_address());
        self.initialized.set(true);
    }
}

// mod tests
