#![no_std]

#![deny(missing_docs)]

//! Building blocks for a single-threaded first-fit heap allocator.
//!
//! ffmalloc-core is a set of building blocks to build a simple malloc replacement with ease. It contains:
//! -   A platform trait, used to obtain raw memory from the process break, or any other one-way source.
//! -   A heap type implementing allocation, zeroed allocation, reallocation, and release over such a platform,
//!     leaving it up to the user to arrange the instance in memory and guard it against concurrent access.

mod api;
mod internals;
mod utils;

pub use api::*;
