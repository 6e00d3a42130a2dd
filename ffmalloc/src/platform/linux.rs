//! Implementation of Linux specific calls.

use core::{convert::TryInto, ptr::NonNull};

use ffmalloc_core::Platform;

/// Implementation of the Platform trait, for Linux.
#[derive(Default)]
pub(crate) struct FFPlatform;

impl FFPlatform {
    /// Creates an instance.
    pub(crate) const fn new() -> Self { Self }
}

impl Platform for FFPlatform {
    unsafe fn extend(&self, additional: usize) -> Option<NonNull<u8>> { sbrk_extend(additional) }
}

//  Pushes the program break up by `additional` bytes, returning the start of the fresh memory on success.
//
//  A failed `sbrk` returns (void*)-1, with errno set by the C library.
unsafe fn sbrk_extend(additional: usize) -> Option<NonNull<u8>> {
    let increment: libc::intptr_t = additional.try_into().ok()?;

    let result = libc::sbrk(increment);

    if result == usize::MAX as *mut libc::c_void {
        return None;
    }

    NonNull::new(result as *mut u8)
}

#[cfg(test)]
mod tests {

use super::*;

#[test]
fn sbrk_extend_zero_returns_current_break() {
    //  Safety:
    //  -   An increment of 0 does not move the break; reading it is thread-safe.
    let result = unsafe { sbrk_extend(0) };

    assert!(result.is_some());
}

#[test]
fn sbrk_extend_unrepresentable_increment() {
    //  Safety:
    //  -   The increment is rejected before reaching the system.
    let result = unsafe { sbrk_extend(usize::MAX) };

    assert!(result.is_none());
}

} // mod tests
