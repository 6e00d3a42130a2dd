//! Block header codec.
//!
//! Every block carved out of the heap starts with a header of `HEADER_SIZE` bytes, immediately followed by the
//! payload handed out to the user. The header packs the total size of the block, in bytes, and the allocation flag
//! into a single word: sizes are always multiples of `ALIGNMENT`, so the low bit of the size is free to carry the
//! flag.
//!
//! Whilst a block is free, the first word of its payload is reused to thread the block onto the free list; see
//! `FreeBlock`.

use core::{
    cell::Cell,
    mem,
    ptr::{self, NonNull},
};

use crate::internals::checker;
use crate::utils::{self, ALIGNMENT, PowerOf2};

use super::BlockLink;

/// The number of bytes occupied by a block header; also the offset from a block to its payload.
///
/// Equal to `ALIGNMENT`, so that the payload following an aligned header is itself aligned.
pub const HEADER_SIZE: usize = mem::size_of::<BlockHeader>();

/// BlockHeader
///
/// The header prefixing every block, allocated or free.
#[repr(C)]
#[cfg_attr(target_pointer_width = "32", repr(align(8)))]
#[cfg_attr(target_pointer_width = "64", repr(align(16)))]
pub(crate) struct BlockHeader {
    size: Cell<usize>,
}

impl BlockHeader {
    const ALLOCATED: usize = 1;

    /// Creates a header for a block of 0 bytes, not allocated.
    ///
    /// No allocation request can ever be served from such a block.
    pub(crate) const fn new() -> Self { Self { size: Cell::new(0) } }

    /// In-place constructs a `BlockHeader` for a free block of `size` bytes.
    ///
    /// #   Safety
    ///
    /// -   Assumes that access to the memory location is exclusive.
    /// -   Assumes that there are at least `size` bytes available, starting at `at`.
    /// -   Assumes that the pointer is aligned on an `ALIGNMENT` boundary.
    #[allow(clippy::cast_ptr_alignment)]
    pub(crate) unsafe fn initialize(at: NonNull<u8>, size: usize) -> NonNull<BlockHeader> {
        debug_assert!(utils::is_sufficiently_aligned_for(at, PowerOf2::align_of::<BlockHeader>()));
        checker::expect_aligned(size);

        //  Safety:
        //  -   `at` is assumed to be sufficiently aligned.
        let ptr = at.as_ptr() as *mut BlockHeader;

        //  Safety:
        //  -   Access to the memory location is exclusive.
        //  -   `ptr` is assumed to be sufficiently sized.
        ptr::write(ptr, BlockHeader { size: Cell::new(size) });

        at.cast()
    }

    /// In-place reinterprets the memory preceding `payload` as a `BlockHeader`.
    ///
    /// #   Safety
    ///
    /// -   Assumes that `payload` was obtained by a prior call to `Self::payload`.
    pub(crate) unsafe fn from_payload(payload: NonNull<u8>) -> NonNull<BlockHeader> {
        debug_assert!(utils::is_sufficiently_aligned_for(payload, ALIGNMENT));

        //  Safety:
        //  -   `payload` is assumed to be preceded by its header.
        let ptr = payload.as_ptr().sub(HEADER_SIZE) as *mut BlockHeader;

        //  Safety:
        //  -   `ptr` is derived from a non-null pointer by subtraction within the same block.
        NonNull::new_unchecked(ptr)
    }

    /// Returns the address of the payload of the block.
    pub(crate) fn payload(&self) -> NonNull<u8> {
        let address = self as *const Self as *mut u8;

        //  Safety:
        //  -   A block extends at least one payload word beyond its header.
        let payload = unsafe { address.add(HEADER_SIZE) };

        //  Safety:
        //  -   `payload` is derived from a non-null reference by addition.
        unsafe { NonNull::new_unchecked(payload) }
    }

    /// Returns the total size of the block, in bytes, header included.
    pub(crate) fn size(&self) -> usize { self.size.get() & !Self::ALLOCATED }

    /// Returns whether the block is currently allocated.
    pub(crate) fn is_allocated(&self) -> bool { self.size.get() & Self::ALLOCATED != 0 }

    /// Marks the block as allocated; its size is unaffected.
    pub(crate) fn mark_allocated(&self) { self.size.set(self.size.get() | Self::ALLOCATED); }

    /// Marks the block as free; its size is unaffected.
    pub(crate) fn mark_free(&self) { self.size.set(self.size.get() & !Self::ALLOCATED); }
}

/// FreeBlock
///
/// The view of a block whilst it is threaded onto the free list: the header, followed by the link occupying the
/// first payload word.
///
/// The view is only valid whilst the allocation flag of the block is clear; an allocated block's payload belongs to
/// the user, link word included.
#[repr(C)]
pub(crate) struct FreeBlock {
    header: BlockHeader,
    next: BlockLink,
}

impl FreeBlock {
    /// Creates a stand-alone instance, for use as a list sentinel.
    pub(crate) const fn new_sentinel() -> Self {
        Self { header: BlockHeader::new(), next: BlockLink::dangling() }
    }

    /// In-place reinterprets a free block as a `FreeBlock`, resetting its link.
    ///
    /// #   Safety
    ///
    /// -   Assumes that access to the block is exclusive.
    /// -   Assumes that the block extends at least one payload word beyond its header.
    #[allow(clippy::cast_ptr_alignment)]
    pub(crate) unsafe fn from_header(header: NonNull<BlockHeader>) -> NonNull<FreeBlock> {
        checker::expect_free(header.as_ref());

        //  Safety:
        //  -   The block is assumed to extend at least one payload word beyond its header.
        let link = (header.as_ptr() as *mut u8).add(HEADER_SIZE) as *mut BlockLink;

        //  Safety:
        //  -   Access to the block is exclusive.
        //  -   The payload word may hold arbitrary bytes; it is overwritten here, before it is ever read as a link.
        ptr::write(link, BlockLink::dangling());

        header.cast()
    }

    /// Returns the header of the block.
    pub(crate) fn header(&self) -> &BlockHeader { &self.header }

    /// Returns the block linked to.
    pub(crate) fn next(&self) -> NonNull<FreeBlock> {
        checker::expect_free(&self.header);

        self.next.get()
    }

    /// Links the block to `next`.
    pub(crate) fn set_next(&self, next: NonNull<FreeBlock>) {
        checker::expect_free(&self.header);

        self.next.set(next);
    }
}

// mod tests
