//! A collection of utilities.

use core::{mem, ptr::NonNull};

mod power_of_2;

pub use power_of_2::PowerOf2;

/// The alignment guaranteed for every payload handed out by the allocator, and the granularity of block sizes.
///
/// Twice the size of a pointer, covering the strictest alignment required by the fundamental types.
//  Safety:
//  -   `2 * size_of::<usize>()` is a power of 2.
pub const ALIGNMENT: PowerOf2 = unsafe { PowerOf2::new_unchecked(2 * mem::size_of::<usize>()) };

/// Returns whether the pointer is sufficiently aligned for the given alignment.
pub(crate) fn is_sufficiently_aligned_for(ptr: NonNull<u8>, alignment: PowerOf2) -> bool {
    (ptr.as_ptr() as usize) % alignment == 0
}
