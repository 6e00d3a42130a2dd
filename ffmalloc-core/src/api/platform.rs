//! Platform
//!
//! The Platform trait is used to request memory directly from the Platform. By abstracting the underlying platform,
//! it becomes possible to easily port the code to a different OS, or even to a bare-metal target.

use core::ptr::NonNull;

/// Abstraction of platform specific address-space extension.
pub trait Platform {
    /// Extends the address space available to the allocator by `additional` bytes.
    ///
    /// Returns a pointer to the first of the `additional` fresh bytes, or None if the request cannot be satisfied.
    ///
    /// There is no companion operation for returning memory: the allocator holds on to every byte it is granted for
    /// the remainder of the process.
    ///
    /// #   Safety
    ///
    /// The caller may assume that if the returned pointer is not null then:
    /// -   The number of usable bytes is _greater than or equal_ to `additional`.
    /// -   The bytes are not handed out again by a later call.
    ///
    /// The returned pointer is NOT guaranteed to be aligned on any particular boundary; the caller handles
    /// misaligned grants.
    ///
    /// `extend` assumes that:
    /// -   The instance is not accessed concurrently from multiple threads.
    unsafe fn extend(&self, additional: usize) -> Option<NonNull<u8>>;
}
