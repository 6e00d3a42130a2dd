//! The internals of ffmalloc-core.
//!
//! The internals provide all the heavy-lifting.

pub mod blocks;
pub mod free_list;

pub(crate) mod checker;
