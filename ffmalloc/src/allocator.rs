//! Allocator

use core::{
    alloc::{GlobalAlloc, Layout},
    ptr::{self, NonNull},
};

use ffmalloc_core::{ALIGNMENT, Heap};

#[cfg(feature = "checked")]
use ffmalloc_core::FreeListDump;

use crate::FFPlatform;

/// First-Fit Allocator.
///
/// All instances are handles to the one process-wide heap.
///
/// #   Warning
///
/// The heap is not thread-safe: every call, through any instance and including the `GlobalAlloc` implementation,
/// must come from one single thread.
#[derive(Default)]
pub struct FFAllocator;

impl FFAllocator {
    /// Creates an instance.
    pub const fn new() -> Self { Self }

    /// Allocates a block of at least `size` bytes, aligned on `ALIGNMENT`.
    ///
    /// Returns None if `size` is zero, or if the process break cannot be pushed any further.
    #[inline(always)]
    pub fn allocate(&self, size: usize) -> Option<NonNull<u8>> { HEAP.get().allocate(size) }

    /// Allocates a block of at least `number * size` bytes, aligned on `ALIGNMENT`, with every byte set to zero.
    ///
    /// Returns None if `number * size` is zero or overflows, or if allocation fails.
    #[inline(always)]
    pub fn allocate_zeroed(&self, number: usize, size: usize) -> Option<NonNull<u8>> {
        HEAP.get().allocate_zeroed(number, size)
    }

    /// Reallocates `ptr` into a block of at least `new_size` bytes, carrying over as much of the existing content
    /// as both blocks can hold.
    ///
    /// A None `ptr` is equivalent to `allocate(new_size)`. On success, the old block is released, and must no
    /// longer be referenced. On failure, None is returned and the old block is untouched, still valid.
    ///
    /// #   Safety
    ///
    /// -   Assumes `ptr`, if any, has been returned by a prior call to `allocate`, `allocate_zeroed`, or
    ///     `reallocate`, and has not been released since.
    #[inline(always)]
    pub unsafe fn reallocate(&self, ptr: Option<NonNull<u8>>, new_size: usize) -> Option<NonNull<u8>> {
        HEAP.get().reallocate(ptr, new_size)
    }

    /// Releases the memory located at `ptr`, making it available for further allocations.
    ///
    /// The memory is never returned to the operating system.
    ///
    /// #   Safety
    ///
    /// -   Assumes `ptr` has been returned by a prior call to `allocate`, `allocate_zeroed`, or `reallocate`, and
    ///     has not been released since.
    /// -   Assumes the memory pointed to by `ptr` is no longer in use.
    #[inline(always)]
    pub unsafe fn release(&self, ptr: NonNull<u8>) { HEAP.get().release(ptr) }
}

#[cfg(feature = "checked")]
impl FFAllocator {
    /// Returns the cumulative number of bytes obtained from the operating system.
    pub fn extended_bytes(&self) -> usize { HEAP.get().extended_bytes() }

    /// Returns a Debug-formattable snapshot of the free list.
    pub fn dump_free_list(&self) -> FreeListDump<'static> { HEAP.get().dump_free_list() }
}

unsafe impl GlobalAlloc for FFAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > ALIGNMENT.value() {
            return ptr::null_mut();
        }

        self.allocate(layout.size()).map(|pointer| pointer.as_ptr()).unwrap_or(ptr::null_mut())
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        if layout.align() > ALIGNMENT.value() {
            return ptr::null_mut();
        }

        self.allocate_zeroed(1, layout.size()).map(|pointer| pointer.as_ptr()).unwrap_or(ptr::null_mut())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _: Layout) {
        if let Some(pointer) = NonNull::new(ptr) {
            self.release(pointer);
        }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if layout.align() > ALIGNMENT.value() {
            return ptr::null_mut();
        }

        self.reallocate(NonNull::new(ptr), new_size).map(|pointer| pointer.as_ptr()).unwrap_or(ptr::null_mut())
    }
}

//
//  Implementation
//

//  Process-wide heap.
//
//  A `static` both pins the free list in memory and makes `FFAllocator` a zero-sized handle, usable as a
//  `#[global_allocator]`.
static HEAP: SingleThreaded<Heap<FFPlatform>> = SingleThreaded(Heap::new(FFPlatform::new()));

struct SingleThreaded<T>(T);

impl<T> SingleThreaded<T> {
    #[inline(always)]
    fn get(&self) -> &T { &self.0 }
}

//  Safety:
//  -   `T` is only ever accessed from a single thread, as per the contract of `FFAllocator`.
unsafe impl<T> Sync for SingleThreaded<T> {}
