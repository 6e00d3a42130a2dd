#![no_std]
#![deny(missing_docs)]

//! Exposition of the FFAllocator API via a C ABI.

use core::ptr::{self, NonNull};

use ffmalloc::FFAllocator;

/// Allocates `size` bytes of memory, aligned on `ALIGNMENT`.
///
/// Returns NULL if `size` is 0, or if memory is exhausted; exhaustion sets `errno` to ENOMEM.
#[no_mangle]
pub extern fn ff_malloc(size: usize) -> *mut u8 {
    match ALLOCATOR.allocate(size) {
        Some(pointer) => pointer.as_ptr(),
        None if size == 0 => ptr::null_mut(),
        None => fail_with(libc::ENOMEM),
    }
}

/// Allocates `number * size` bytes of memory, aligned on `ALIGNMENT`, with every byte set to zero.
///
/// Returns NULL if `number * size` is 0, if it overflows (setting `errno` to EOVERFLOW), or if memory is exhausted
/// (setting `errno` to ENOMEM).
#[no_mangle]
pub extern fn ff_calloc(number: usize, size: usize) -> *mut u8 {
    if size != 0 && number > usize::MAX / size {
        return fail_with(libc::EOVERFLOW);
    }

    match ALLOCATOR.allocate_zeroed(number, size) {
        Some(pointer) => pointer.as_ptr(),
        None if number == 0 || size == 0 => ptr::null_mut(),
        None => fail_with(libc::ENOMEM),
    }
}

/// Reallocates the memory located at `pointer` to at least `new_size` bytes, preserving the content both blocks
/// can hold.
///
/// A NULL `pointer` is equivalent to `ff_malloc(new_size)`. On success, the old pointer is invalidated. On
/// failure, NULL is returned, `errno` is set to ENOMEM, and the old pointer remains valid. A `new_size` of 0
/// returns NULL without touching `errno`, leaving `pointer` valid.
///
/// #   Safety
///
/// -   Assumes `pointer` is NULL, or has been returned by a prior call to `ff_malloc`, `ff_calloc`, or
///     `ff_realloc`, and has not been freed since.
#[no_mangle]
pub unsafe extern fn ff_realloc(pointer: *mut u8, new_size: usize) -> *mut u8 {
    match ALLOCATOR.reallocate(NonNull::new(pointer), new_size) {
        Some(pointer) => pointer.as_ptr(),
        None if new_size == 0 => ptr::null_mut(),
        None => fail_with(libc::ENOMEM),
    }
}

/// Frees the memory located at `pointer`, making it available for further allocations.
///
/// A NULL `pointer` is a no-op.
///
/// #   Safety
///
/// -   Assumes `pointer` is NULL, or has been returned by a prior call to `ff_malloc`, `ff_calloc`, or
///     `ff_realloc`, and has not been freed since.
/// -   Assumes the memory pointed to by `pointer` is no longer in use.
#[no_mangle]
pub unsafe extern fn ff_free(pointer: *mut u8) {
    if let Some(pointer) = NonNull::new(pointer) {
        ALLOCATOR.release(pointer);
    }
}

/// Returns the cumulative number of bytes obtained from the operating system.
#[cfg(feature = "checked")]
#[no_mangle]
pub extern fn ff_extended_bytes() -> usize { ALLOCATOR.extended_bytes() }

//
//  Implementation
//

static ALLOCATOR: FFAllocator = FFAllocator::new();

//  Required to link the `cdylib` and `staticlib` artifacts, which are `no_std`; only defined when panics abort, as
//  test builds (forced to unwind, and linking `std`) would otherwise see a duplicate `panic_impl` lang item.
#[cfg(panic = "abort")]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    //  Safety:
    //  -   `abort` is always safe to call.
    unsafe { libc::abort() }
}

#[cold]
#[inline(never)]
fn fail_with(error: i32) -> *mut u8 {
    //  Safety:
    //  -   `__errno_location` returns a valid, thread-local address.
    unsafe { *libc::__errno_location() = error };

    ptr::null_mut()
}
