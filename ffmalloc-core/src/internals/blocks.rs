//! Blocks
//!
//! A Block represents a unit of allocation: a header, followed by the payload handed out to the user.
//!
//! Whilst allocated, the payload of a block is purely in the hands of the user. Whilst free, the first word of the
//! payload is reused to thread the block onto the free list.
//!
//! Note: Blocks are never _constructed_, instead raw memory is reinterpreted as blocks.

mod block_header;
mod block_link;

pub(crate) use block_header::{BlockHeader, FreeBlock};
pub(crate) use block_link::BlockLink;

pub use block_header::HEADER_SIZE;


#[cfg(test)]
pub(crate) use test::AlignedStore;
