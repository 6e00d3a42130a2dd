//! Heap.
//!
//! A single-threaded first-fit heap, carving its blocks out of memory obtained from a `Platform`.
//!
//! Released blocks are linked into a free list and recycled; they are never returned to the platform, never split,
//! and never coalesced. A request no free block can satisfy extends the heap instead.

use core::{
    cmp,
    fmt,
    ptr::{self, NonNull},
};

#[cfg(feature = "checked")]
use core::cell::Cell;

use crate::Platform;
use crate::internals::blocks::{BlockHeader, FreeBlock, HEADER_SIZE};
use crate::internals::checker;
use crate::internals::free_list::FreeList;
use crate::utils::{self, ALIGNMENT};

#[cfg(feature = "checked")]
use crate::internals::checker::FreeListDump;

/// A single-threaded first-fit heap.
///
/// The heap is not thread-safe; it is up to the caller to guarantee that no two threads ever call into the same
/// instance concurrently.
///
/// #   Warning
///
/// The free list is anchored by the address of the instance: once any method has been called, the instance must no
/// longer be moved in memory. A `static` instance trivially satisfies this constraint.
pub struct Heap<P> {
    platform: P,
    free_list: FreeList,
    #[cfg(feature = "checked")]
    extended: Cell<usize>,
}

impl<P> Heap<P> {
    /// Creates an instance.
    ///
    /// No memory is requested from `platform` until the first allocation.
    pub const fn new(platform: P) -> Self {
        Self {
            platform,
            free_list: FreeList::new(),
            #[cfg(feature = "checked")]
            extended: Cell::new(0),
        }
    }
}

impl<P> Heap<P>
where
    P: Platform,
{
    /// Allocates a block of at least `size` bytes, aligned on `ALIGNMENT`.
    ///
    /// Returns None if `size` is zero, if the block size computation overflows, or if the platform cannot supply
    /// any further memory. The content of the block is left uninitialized.
    #[inline(always)]
    pub fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        let result = self.allocate_impl(size);

        trace_event(format_args!("allocate({}) -> {:?}", size, result));

        result
    }

    /// Allocates a block of at least `number * size` bytes, aligned on `ALIGNMENT`, with every byte set to zero.
    ///
    /// Returns None if `number * size` is zero or overflows, or if allocation fails.
    #[inline(always)]
    pub fn allocate_zeroed(&self, number: usize, size: usize) -> Option<NonNull<u8>> {
        let result = self.allocate_zeroed_impl(number, size);

        trace_event(format_args!("allocate_zeroed({}, {}) -> {:?}", number, size, result));

        result
    }

    /// Reallocates `ptr` into a block of at least `new_size` bytes, carrying over as much of the existing content
    /// as both blocks can hold.
    ///
    /// A None `ptr` is equivalent to `allocate(new_size)`. On success, the old block is released, and must no
    /// longer be referenced. On failure, None is returned and the old block is untouched, still valid.
    ///
    /// The block is never grown nor shrunk in place; a successful call always returns a fresh block.
    ///
    /// #   Safety
    ///
    /// -   Assumes that `ptr`, if any, was allocated by `self`, and not yet released.
    #[inline(always)]
    pub unsafe fn reallocate(&self, ptr: Option<NonNull<u8>>, new_size: usize) -> Option<NonNull<u8>> {
        let result = self.reallocate_impl(ptr, new_size);

        trace_event(format_args!("reallocate({:?}, {}) -> {:?}", ptr, new_size, result));

        result
    }

    /// Releases `ptr`, linking its block at the front of the free list for reuse.
    ///
    /// The memory is not returned to the platform.
    ///
    /// #   Safety
    ///
    /// -   Assumes that `ptr` was allocated by `self`, and not yet released.
    #[inline(always)]
    pub unsafe fn release(&self, ptr: NonNull<u8>) {
        trace_event(format_args!("release({:?})", ptr));

        self.release_impl(ptr);
    }
}

#[cfg(feature = "checked")]
impl<P> Heap<P> {
    /// Returns the cumulative number of bytes obtained from the platform.
    pub fn extended_bytes(&self) -> usize { self.extended.get() }

    /// Returns a Debug-formattable snapshot of the free list.
    pub fn dump_free_list(&self) -> FreeListDump<'_> { FreeListDump::new(&self.free_list) }
}

//
//  Implementation
//

impl<P> Heap<P>
where
    P: Platform,
{
    fn allocate_impl(&self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }

        let required = block_size(size)?;

        checker::verify_free_list(&self.free_list);

        loop {
            if let Some(block) = self.free_list.take_first_fit(required) {
                //  Safety:
                //  -   Bounded lifetime.
                let header = unsafe { block.as_ref() }.header();

                header.mark_allocated();

                checker::verify_free_list(&self.free_list);

                return Some(header.payload());
            }

            //  No fitting block; the freshly extended block is picked up on the next pass.
            self.extend(required)?;
        }
    }

    fn allocate_zeroed_impl(&self, number: usize, size: usize) -> Option<NonNull<u8>> {
        let total = number.checked_mul(size)?;

        let pointer = self.allocate_impl(total)?;

        //  Safety:
        //  -   `pointer` points to at least `total` exclusively owned bytes.
        unsafe { ptr::write_bytes(pointer.as_ptr(), 0, total) };

        Some(pointer)
    }

    unsafe fn reallocate_impl(&self, ptr: Option<NonNull<u8>>, new_size: usize) -> Option<NonNull<u8>> {
        let old_pointer = match ptr {
            Some(pointer) => pointer,
            None => return self.allocate_impl(new_size),
        };

        //  Safety:
        //  -   `old_pointer` is assumed to be a live payload handed out by `self`.
        let old_header = BlockHeader::from_payload(old_pointer);

        //  Safety:
        //  -   Bounded lifetime.
        checker::expect_allocated(old_header.as_ref());

        //  Safety:
        //  -   Bounded lifetime.
        let old_size = old_header.as_ref().size();

        let new_pointer = self.allocate_impl(new_size)?;

        //  Safety:
        //  -   `new_pointer` was just handed out by `self`.
        let new_total = BlockHeader::from_payload(new_pointer).as_ref().size();

        //  Both blocks hold at least `preserved` payload bytes past their headers.
        let preserved = cmp::min(old_size, new_total) - HEADER_SIZE;

        //  Safety:
        //  -   The old block was not in the free list, hence is distinct from the new one.
        //  -   Both blocks hold at least `preserved` payload bytes.
        ptr::copy_nonoverlapping(old_pointer.as_ptr(), new_pointer.as_ptr(), preserved);

        //  Safety:
        //  -   `old_pointer` is live, and no longer referenced.
        self.release_impl(old_pointer);

        Some(new_pointer)
    }

    unsafe fn release_impl(&self, ptr: NonNull<u8>) {
        //  Safety:
        //  -   `ptr` is assumed to be a live payload handed out by `self`.
        let header = BlockHeader::from_payload(ptr);

        //  Safety:
        //  -   Bounded lifetime.
        checker::expect_allocated(header.as_ref());

        //  Safety:
        //  -   Bounded lifetime.
        header.as_ref().mark_free();

        //  Safety:
        //  -   The block is free, and its payload is no longer referenced by the caller.
        let block = FreeBlock::from_header(header);

        self.free_list.push_front(block);

        checker::verify_free_list(&self.free_list);
    }

    //  Requests `required + ALIGNMENT` fresh bytes from the platform, and links them in as one new free block.
    //
    //  The slack absorbs a misaligned grant: if the granted address is already aligned, the whole grant becomes the
    //  block; otherwise the block starts at the next aligned address and spans exactly `required` bytes, the
    //  consumed slack being lost for good.
    #[cold]
    #[inline(never)]
    fn extend(&self, required: usize) -> Option<()> {
        let additional = required.checked_add(ALIGNMENT.value())?;

        //  Safety:
        //  -   Single-threaded access, as per the contract of `Heap`.
        let grant = unsafe { self.platform.extend(additional) }?;

        #[cfg(feature = "checked")]
        self.extended.set(self.extended.get() + additional);

        let (at, size) = if utils::is_sufficiently_aligned_for(grant, ALIGNMENT) {
            (grant, additional)
        } else {
            let address = ALIGNMENT.round_up(grant.as_ptr() as usize);

            //  Safety:
            //  -   `address` is strictly greater than `grant`, itself non-zero.
            let at = unsafe { NonNull::new_unchecked(address as *mut u8) };

            (at, required)
        };

        //  Safety:
        //  -   `at` is aligned on `ALIGNMENT`, and the start of `size` exclusively owned bytes.
        //  -   `size` is a multiple of `ALIGNMENT`.
        let header = unsafe { BlockHeader::initialize(at, size) };

        //  Safety:
        //  -   The block is freshly carved, hence free and unreferenced.
        let block = unsafe { FreeBlock::from_header(header) };

        self.free_list.push_front(block);

        checker::verify_free_list(&self.free_list);

        Some(())
    }
}

//  Total size of the block serving a payload of `size` bytes: header plus payload, rounded up to `ALIGNMENT`.
//
//  Returns None if the computation overflows.
fn block_size(size: usize) -> Option<usize> {
    let unaligned = HEADER_SIZE.checked_add(size)?;

    let padded = unaligned.checked_add(ALIGNMENT.value() - 1)?;

    Some(ALIGNMENT.round_down(padded))
}

#[cfg(feature = "trace")]
fn trace_event(args: fmt::Arguments<'_>) { log::trace!("{}", args); }

#[cfg(not(feature = "trace"))]
#[inline(always)]
fn trace_event(_: fmt::Arguments<'_>) {}

// mod tests
