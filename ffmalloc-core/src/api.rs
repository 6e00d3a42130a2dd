//! The API of ffmalloc-core.

mod heap;
mod platform;

pub use heap::Heap;
pub use platform::Platform;

pub use crate::internals::blocks::HEADER_SIZE;
pub use crate::utils::{ALIGNMENT, PowerOf2};

#[cfg(feature = "checked")]
pub use crate::internals::checker::FreeListDump;
