use std::alloc::{GlobalAlloc, Layout};
use std::ptr::NonNull;

use serial_test::serial;

use ffmalloc::{ALIGNMENT, FFAllocator};

static FF_ALLOCATOR: FFAllocator = FFAllocator::new();

//
//  Tests
//
//  The heap is process-wide and never returns memory, so blocks released by one test are legitimate candidates for
//  the next. Every test is written to hold regardless of what the free list already contains: a just-released
//  block sits at the front of the list, and a first-fit search returns it for any request it satisfies.
//

#[serial]
#[test]
fn allocate_returns_aligned_usable_blocks() {
    let mut pointers = Vec::new();

    for &size in &[1usize, 2, 3, 15, 16, 17, 100, 1000] {
        let pointer = FF_ALLOCATOR.allocate(size).expect("allocation");

        assert_eq!(0, pointer.as_ptr() as usize % ALIGNMENT.value(), "size {}", size);

        //  Every byte of the requested size is usable.
        fill(pointer, size);
        verify(pointer, size);

        pointers.push(pointer);
    }

    for pointer in pointers {
        //  Safety:
        //  -   `pointer` is live, and no longer referenced.
        unsafe { FF_ALLOCATOR.release(pointer) };
    }
}

#[serial]
#[test]
fn allocate_zero_size_returns_none() {
    assert_eq!(None, FF_ALLOCATOR.allocate(0));
}

#[serial]
#[test]
fn release_then_equal_allocate_reuses_block() {
    let first = FF_ALLOCATOR.allocate(100).expect("allocation");

    //  Safety:
    //  -   `first` is live, and no longer referenced.
    unsafe { FF_ALLOCATOR.release(first) };

    let second = FF_ALLOCATOR.allocate(100).expect("allocation");

    assert_eq!(first, second);

    //  Safety:
    //  -   `second` is live, and no longer referenced.
    unsafe { FF_ALLOCATOR.release(second) };
}

#[serial]
#[test]
fn release_then_smaller_allocate_reuses_block() {
    let first = FF_ALLOCATOR.allocate(100).expect("allocation");

    //  Safety:
    //  -   `first` is live, and no longer referenced.
    unsafe { FF_ALLOCATOR.release(first) };

    let second = FF_ALLOCATOR.allocate(10).expect("allocation");

    assert_eq!(first, second);

    //  Safety:
    //  -   `second` is live, and no longer referenced.
    unsafe { FF_ALLOCATOR.release(second) };
}

#[serial]
#[test]
fn allocate_zeroed_zeroes_recycled_block() {
    let dirty = FF_ALLOCATOR.allocate(64).expect("allocation");

    //  Safety:
    //  -   `dirty` points to at least 64 writable bytes.
    unsafe { std::ptr::write_bytes(dirty.as_ptr(), 0xFF, 64) };

    //  Safety:
    //  -   `dirty` is live, and no longer referenced.
    unsafe { FF_ALLOCATOR.release(dirty) };

    let zeroed = FF_ALLOCATOR.allocate_zeroed(8, 8).expect("allocation");

    //  The released block is at the front of the list, and large enough.
    assert_eq!(dirty, zeroed);

    for i in 0..64 {
        //  Safety:
        //  -   `zeroed` points to at least 64 readable bytes.
        assert_eq!(0, unsafe { zeroed.as_ptr().add(i).read() }, "byte {}", i);
    }

    //  Safety:
    //  -   `zeroed` is live, and no longer referenced.
    unsafe { FF_ALLOCATOR.release(zeroed) };
}

#[serial]
#[test]
fn allocate_zeroed_overflow_returns_none() {
    assert_eq!(None, FF_ALLOCATOR.allocate_zeroed(2, usize::MAX / 2 + 2));
}

#[serial]
#[test]
fn reallocate_preserves_content_across_grow_and_shrink() {
    let original = FF_ALLOCATOR.allocate(50).expect("allocation");

    fill(original, 50);

    //  Safety:
    //  -   `original` is live, and no longer referenced.
    let grown = unsafe { FF_ALLOCATOR.reallocate(Some(original), 200) }.expect("reallocation");

    verify(grown, 50);

    //  Safety:
    //  -   `grown` is live, and no longer referenced.
    let shrunk = unsafe { FF_ALLOCATOR.reallocate(Some(grown), 7) }.expect("reallocation");

    verify(shrunk, 7);

    //  Safety:
    //  -   `shrunk` is live, and no longer referenced.
    unsafe { FF_ALLOCATOR.release(shrunk) };
}

#[serial]
#[test]
fn reallocate_null_is_allocate() {
    //  Safety:
    //  -   A None pointer is always valid.
    let pointer = unsafe { FF_ALLOCATOR.reallocate(None, 30) }.expect("reallocation");

    assert_eq!(0, pointer.as_ptr() as usize % ALIGNMENT.value());

    //  Safety:
    //  -   `pointer` is live, and no longer referenced.
    unsafe { FF_ALLOCATOR.release(pointer) };
}

#[serial]
#[test]
fn global_alloc_allocates_and_deallocates() {
    let layout = Layout::from_size_align(64, 8).expect("valid layout");

    //  Safety:
    //  -   `layout` has a non-zero size.
    let pointer = unsafe { FF_ALLOCATOR.alloc(layout) };

    let pointer = NonNull::new(pointer).expect("allocation");

    assert_eq!(0, pointer.as_ptr() as usize % ALIGNMENT.value());

    fill(pointer, 64);
    verify(pointer, 64);

    //  Safety:
    //  -   `pointer` is live, and no longer referenced.
    unsafe { FF_ALLOCATOR.dealloc(pointer.as_ptr(), layout) };
}

#[serial]
#[test]
fn global_alloc_rejects_overlarge_alignment() {
    let layout = Layout::from_size_align(64, 2 * ALIGNMENT.value()).expect("valid layout");

    //  Safety:
    //  -   `layout` has a non-zero size.
    unsafe {
        assert!(FF_ALLOCATOR.alloc(layout).is_null());
        assert!(FF_ALLOCATOR.alloc_zeroed(layout).is_null());
    }
}

#[serial]
#[test]
fn global_alloc_realloc_preserves_content() {
    let layout = Layout::from_size_align(32, ALIGNMENT.value()).expect("valid layout");

    //  Safety:
    //  -   `layout` has a non-zero size.
    let pointer = unsafe { FF_ALLOCATOR.alloc(layout) };

    let pointer = NonNull::new(pointer).expect("allocation");

    fill(pointer, 32);

    //  Safety:
    //  -   `pointer` is live, and no longer referenced.
    let moved = unsafe { FF_ALLOCATOR.realloc(pointer.as_ptr(), layout, 500) };

    let moved = NonNull::new(moved).expect("reallocation");

    verify(moved, 32);

    //  Safety:
    //  -   `moved` is live, and no longer referenced.
    unsafe { FF_ALLOCATOR.dealloc(moved.as_ptr(), layout) };
}

#[serial]
#[test]
fn global_alloc_dealloc_null_is_noop() {
    let first = FF_ALLOCATOR.allocate(40).expect("allocation");

    //  Safety:
    //  -   `first` is live, and no longer referenced.
    unsafe { FF_ALLOCATOR.release(first) };

    let layout = Layout::from_size_align(40, 1).expect("valid layout");

    //  Safety:
    //  -   A null pointer must be ignored.
    unsafe { FF_ALLOCATOR.dealloc(std::ptr::null_mut(), layout) };

    //  The free list is unaffected: the released block is still at its front.
    let second = FF_ALLOCATOR.allocate(40).expect("allocation");

    assert_eq!(first, second);

    //  Safety:
    //  -   `second` is live, and no longer referenced.
    unsafe { FF_ALLOCATOR.release(second) };
}

#[cfg(feature = "checked")]
#[serial]
#[test]
fn extended_bytes_grows_on_fresh_allocation() {
    let before = FF_ALLOCATOR.extended_bytes();

    //  No earlier test releases a block of a megabyte, so the heap must extend.
    let pointer = FF_ALLOCATOR.allocate(1024 * 1024).expect("allocation");

    assert!(FF_ALLOCATOR.extended_bytes() > before);

    //  Safety:
    //  -   `pointer` is live, and no longer referenced.
    unsafe { FF_ALLOCATOR.release(pointer) };
}

//
//  Implementation
//

fn fill(pointer: NonNull<u8>, count: usize) {
    for i in 0..count {
        //  Safety:
        //  -   `pointer` points to at least `count` writable bytes.
        unsafe { pointer.as_ptr().add(i).write(i as u8) };
    }
}

fn verify(pointer: NonNull<u8>, count: usize) {
    for i in 0..count {
        //  Safety:
        //  -   `pointer` points to at least `count` readable bytes.
        assert_eq!(i as u8, unsafe { pointer.as_ptr().add(i).read() }, "byte {}", i);
    }
}
