//! Optional consistency checks over the allocator's data structures.
//!
//! Every check in this module compiles down to nothing unless the `checked` feature is enabled. Enabled, a failed
//! check is fatal: the heap meta-data is corrupted, and carrying on would silently corrupt user data.

use super::blocks::BlockHeader;
use super::free_list::FreeList;

#[cfg(feature = "checked")]
use core::fmt;

#[cfg(feature = "checked")]
use crate::utils::ALIGNMENT;

/// Asserts that the block is not marked allocated.
#[cfg(feature = "checked")]
pub(crate) fn expect_free(header: &BlockHeader) {
    assert!(!header.is_allocated(),
        "Block {:#x} is marked allocated where a free block is required", header as *const _ as usize);
}

#[cfg(not(feature = "checked"))]
#[inline(always)]
pub(crate) fn expect_free(_: &BlockHeader) {}

/// Asserts that the block is marked allocated.
#[cfg(feature = "checked")]
pub(crate) fn expect_allocated(header: &BlockHeader) {
    assert!(header.is_allocated(),
        "Block {:#x} is not marked allocated where an allocated block is required", header as *const _ as usize);
}

#[cfg(not(feature = "checked"))]
#[inline(always)]
pub(crate) fn expect_allocated(_: &BlockHeader) {}

/// Asserts that `size` is a multiple of `ALIGNMENT`.
#[cfg(feature = "checked")]
pub(crate) fn expect_aligned(size: usize) {
    assert!(size % ALIGNMENT == 0,
        "Size {} is not a multiple of {}", size, ALIGNMENT.value());
}

#[cfg(not(feature = "checked"))]
#[inline(always)]
pub(crate) fn expect_aligned(_: usize) {}

/// Walks the entire free list, asserting that no reachable block is marked allocated.
#[cfg(feature = "checked")]
pub(crate) fn verify_free_list(list: &FreeList) {
    list.ensure_initialized();

    let sentinel = list.sentinel_address();

    //  Safety:
    //  -   Bounded lifetime.
    let mut current = unsafe { sentinel.as_ref() }.next();

    while current != sentinel {
        //  Safety:
        //  -   Bounded lifetime.
        let current_ref = unsafe { current.as_ref() };

        assert!(!current_ref.header().is_allocated(),
            "Block {:#x} is marked allocated, yet reachable from the free list", current.as_ptr() as usize);

        current = current_ref.next();
    }
}

#[cfg(not(feature = "checked"))]
#[inline(always)]
pub(crate) fn verify_free_list(_: &FreeList) {}

/// A Debug-formattable snapshot of the free list: one `address: size` entry per block, front to back.
#[cfg(feature = "checked")]
pub struct FreeListDump<'a>(&'a FreeList);

#[cfg(feature = "checked")]
impl<'a> FreeListDump<'a> {
    /// Creates an instance.
    pub(crate) fn new(list: &'a FreeList) -> Self { Self(list) }
}

#[cfg(feature = "checked")]
impl fmt::Debug for FreeListDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.ensure_initialized();

        let sentinel = self.0.sentinel_address();

        write!(f, "FreeList {{")?;

        //  Safety:
        //  -   Bounded lifetime.
        let mut current = unsafe { sentinel.as_ref() }.next();

        let mut separator = "";

        while current != sentinel {
            //  Safety:
            //  -   Bounded lifetime.
            let current_ref = unsafe { current.as_ref() };

            write!(f, "{} {:#x}: {}", separator, current.as_ptr() as usize, current_ref.header().size())?;

            separator = ",";
            current = current_ref.next();
        }

        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {

use crate::internals::blocks::AlignedStore;

use super::*;

#[test]
fn expect_free_accepts_free_block() {
    let store = AlignedStore::default();

    //  Safety:
    //  -   The block does not overlap another.
    let block = unsafe { store.create_block(0, 32) };

    //  Safety:
    //  -   Bounded lifetime.
    expect_free(unsafe { block.as_ref() }.header());
}

#[test]
fn expect_allocated_accepts_allocated_block() {
    let store = AlignedStore::default();

    //  Safety:
    //  -   The block does not overlap another.
    let block = unsafe { store.create_block(0, 32) };

    //  Safety:
    //  -   Bounded lifetime.
    let header = unsafe { block.as_ref() }.header();

    header.mark_allocated();

    expect_allocated(header);
}

#[cfg(feature = "checked")]
#[test]
#[should_panic(expected = "marked allocated where a free block is required")]
fn expect_free_rejects_allocated_block() {
    let store = AlignedStore::default();

    //  Safety:
    //  -   The block does not overlap another.
    let block = unsafe { store.create_block(0, 32) };

    //  Safety:
    //  -   Bounded lifetime.
    let header = unsafe { block.as_ref() }.header();

    header.mark_allocated();

    expect_free(header);
}

#[cfg(feature = "checked")]
#[test]
#[should_panic(expected = "not marked allocated")]
fn expect_allocated_rejects_free_block() {
    let store = AlignedStore::default();

    //  Safety:
    //  -   The block does not overlap another.
    let block = unsafe { store.create_block(0, 32) };

    //  Safety:
    //  -   Bounded lifetime.
    expect_allocated(unsafe { block.as_ref() }.header());
}

#[cfg(feature = "checked")]
#[test]
#[should_panic(expected = "not a multiple of")]
fn expect_aligned_rejects_unaligned_size() {
    expect_aligned(33);
}

#[test]
fn verify_free_list_accepts_untouched_list() {
    let list = FreeList::new();

    verify_free_list(&list);
}

#[test]
fn verify_free_list_accepts_free_blocks() {
    let store = AlignedStore::default();

    //  Safety:
    //  -   The blocks do not overlap.
    let (a, b) = unsafe { (store.create_block(0, 32), store.create_block(32, 64)) };

    let list = FreeList::new();
    list.push_front(a);
    list.push_front(b);

    verify_free_list(&list);
}

#[cfg(feature = "checked")]
#[test]
#[should_panic(expected = "reachable from the free list")]
fn verify_free_list_rejects_reachable_allocated_block() {
    let store = AlignedStore::default();

    //  Safety:
    //  -   The blocks do not overlap.
    let (a, b) = unsafe { (store.create_block(0, 32), store.create_block(32, 64)) };

    let list = FreeList::new();
    list.push_front(a);
    list.push_front(b);

    //  Simulates meta-data corruption: the front block has its allocation flag raised behind the list's back.
    //  Safety:
    //  -   Bounded lifetime.
    unsafe { b.as_ref() }.header().mark_allocated();

    verify_free_list(&list);
}

#[cfg(feature = "checked")]
#[test]
fn free_list_dump_formats_entries() {
    use core::fmt::Write;

    struct FixedWriter {
        buffer: [u8; 256],
        length: usize,
    }

    impl fmt::Write for FixedWriter {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let bytes = s.as_bytes();

            if self.length + bytes.len() > self.buffer.len() {
                return Err(fmt::Error);
            }

            self.buffer[self.length..self.length + bytes.len()].copy_from_slice(bytes);
            self.length += bytes.len();

            Ok(())
        }
    }

    let store = AlignedStore::default();

    //  Safety:
    //  -   The blocks do not overlap.
    let (a, b) = unsafe { (store.create_block(0, 48), store.create_block(48, 96)) };

    let list = FreeList::new();
    list.push_front(a);
    list.push_front(b);

    let mut writer = FixedWriter { buffer: [0; 256], length: 0 };
    write!(writer, "{:?}", FreeListDump::new(&list)).expect("Sufficient buffer");

    let text = core::str::from_utf8(&writer.buffer[..writer.length]).expect("Valid UTF-8");

    assert!(text.starts_with("FreeList {"), "{}", text);
    assert!(text.contains(": 96"), "{}", text);
    assert!(text.contains(": 48"), "{}", text);
    assert!(text.ends_with(" }"), "{}", text);
}

} // mod tests
