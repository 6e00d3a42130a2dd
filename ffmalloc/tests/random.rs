use std::ptr::NonNull;

use serial_test::serial;

use ffmalloc::FFAllocator;
use ffmalloc_test::{Allocator, Scenario};

static FF_ALLOCATOR: FFAllocator = FFAllocator::new();

//
//  Tests
//

#[serial]
#[test]
fn random_workload_small_sizes() {
    initialize_logger();

    let mut scenario = Scenario::new(0xFF00_0001, 128);

    scenario.run(&Driver, 10_000);
}

#[serial]
#[test]
fn random_workload_large_sizes() {
    initialize_logger();

    let mut scenario = Scenario::new(0xFF00_0002, 4096);

    scenario.run(&Driver, 10_000);
}

//
//  Implementation
//

//  A local new-type, as `Allocator` cannot be implemented for the foreign `FFAllocator` here.
struct Driver;

impl Allocator for Driver {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> { FF_ALLOCATOR.allocate(size) }

    fn allocate_zeroed(&self, number: usize, size: usize) -> Option<NonNull<u8>> {
        FF_ALLOCATOR.allocate_zeroed(number, size)
    }

    unsafe fn reallocate(&self, ptr: Option<NonNull<u8>>, new_size: usize) -> Option<NonNull<u8>> {
        FF_ALLOCATOR.reallocate(ptr, new_size)
    }

    unsafe fn release(&self, ptr: NonNull<u8>) { FF_ALLOCATOR.release(ptr) }
}

fn initialize_logger() {
    //  Only the first test to run gets to install the logger; later attempts are fine to fail.
    let _ = env_logger::builder().is_test(true).try_init();
}
