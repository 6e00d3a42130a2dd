#![no_std]
#![deny(missing_docs)]

//! A First-Fit Memory Allocator library.
//!
//! The type `FFAllocator` provides a simple first-fit memory allocator over the process break, as a drop-in
//! replacement for regular allocators within a single-threaded process.
//!
//! #   Warning
//!
//! This memory allocator is not suitable for all applications; most notably, it is not thread-safe.
//!
//! See the README.md file for the limitations and trade-offs made.

mod allocator;
mod platform;

pub use allocator::FFAllocator;

pub use ffmalloc_core::{ALIGNMENT, HEADER_SIZE};

#[cfg(feature = "checked")]
pub use ffmalloc_core::FreeListDump;

use platform::FFPlatform;
