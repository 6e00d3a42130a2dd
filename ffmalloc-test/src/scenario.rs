//! A test-runner for detecting heap corruption.

use core::{cmp, ptr::NonNull};

use rand::{Rng, SeedableRng, rngs::SmallRng};

/// The allocator interface exercised by a `Scenario`.
///
/// The four methods mirror the entry points of a malloc-style allocator.
pub trait Allocator {
    /// Allocates a block of at least `size` bytes, or None on failure.
    fn allocate(&self, size: usize) -> Option<NonNull<u8>>;

    /// Allocates a block of at least `number * size` bytes, all zeroed, or None on overflow or failure.
    fn allocate_zeroed(&self, number: usize, size: usize) -> Option<NonNull<u8>>;

    /// Reallocates `ptr` to a block of at least `new_size` bytes, preserving the content both blocks can hold.
    ///
    /// On failure, returns None and leaves `ptr` valid.
    ///
    /// #   Safety
    ///
    /// -   Assumes that `ptr`, if any, is live, and was obtained from `self`.
    unsafe fn reallocate(&self, ptr: Option<NonNull<u8>>, new_size: usize) -> Option<NonNull<u8>>;

    /// Releases `ptr`.
    ///
    /// #   Safety
    ///
    /// -   Assumes that `ptr` is live, and was obtained from `self`.
    unsafe fn release(&self, ptr: NonNull<u8>);
}

/// A deterministic stream of bytes, regenerable at will from its seed.
///
/// Storing the seed of the stream written to a block is enough to later verify the block byte for byte, without
/// keeping a copy of its content around.
#[derive(Clone, Copy, Debug)]
pub struct ByteStream(u64);

impl ByteStream {
    /// Creates a stream.
    pub fn new(seed: u64) -> Self { Self(seed) }

    /// Returns the next byte of the stream.
    pub fn next_byte(&mut self) -> u8 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);

        (self.0 >> 56) as u8
    }
}

/// Scenario is a test-runner exercising an allocator through a randomized workload, checking as it goes that no
/// live block is ever modified by an unrelated operation.
///
/// Each live block is filled from a `ByteStream`; before every operation, every live block is compared against a
/// regenerated stream, so that a stray write by the allocator is caught within one step.
///
/// Allocation failures are tolerated, and simply skip the step: exercising an allocator up to, and past, memory
/// exhaustion is a valid workload.
pub struct Scenario {
    jobs: [Option<Job>; MAXIMUM_JOBS],
    rng: SmallRng,
    maximum_size: usize,
    counter: u64,
}

impl Scenario {
    /// Creates a scenario; `maximum_size` caps the payload size of any single allocation.
    ///
    /// A given `seed` always replays the exact same workload.
    pub fn new(seed: u64, maximum_size: usize) -> Self {
        assert!(maximum_size > 0);

        Self {
            jobs: [None; MAXIMUM_JOBS],
            rng: SmallRng::seed_from_u64(seed),
            maximum_size,
            counter: 0,
        }
    }

    /// Runs `steps` random operations against `allocator`, then releases every block still live.
    ///
    /// #   Panics
    ///
    /// -   If the content of any live block differs from what was last written to it.
    pub fn run<A: Allocator>(&mut self, allocator: &A, steps: usize) {
        for _ in 0..steps {
            self.step(allocator);
        }

        self.drain(allocator);
    }
}

//
//  Implementation
//

const MAXIMUM_JOBS: usize = 64;

//  A live allocation: where it is, how many bytes, and the seed regenerating its expected content.
#[derive(Clone, Copy)]
struct Job {
    pointer: NonNull<u8>,
    size: usize,
    seed: u64,
}

impl Scenario {
    fn step<A: Allocator>(&mut self, allocator: &A) {
        self.verify_all();

        let index = self.rng.gen_range(0..self.jobs.len());

        match self.jobs[index] {
            None => self.allocate_job(allocator, index),
            Some(job) => {
                if self.rng.gen_bool(0.5) {
                    self.release_job(allocator, index, job);
                } else {
                    self.reallocate_job(allocator, index, job);
                }
            },
        }
    }

    fn allocate_job<A: Allocator>(&mut self, allocator: &A, index: usize) {
        let size = self.rng.gen_range(1..=self.maximum_size);

        let pointer = if self.rng.gen_bool(0.5) {
            match allocator.allocate_zeroed(1, size) {
                Some(pointer) => {
                    expect_zeroed(pointer, size);
                    pointer
                },
                None => return,
            }
        } else {
            match allocator.allocate(size) {
                Some(pointer) => pointer,
                None => return,
            }
        };

        let job = Job { pointer, size, seed: self.next_seed() };

        fill(job);

        self.jobs[index] = Some(job);
    }

    fn release_job<A: Allocator>(&mut self, allocator: &A, index: usize, job: Job) {
        //  Safety:
        //  -   `job.pointer` is live, and forgotten immediately after.
        unsafe { allocator.release(job.pointer) };

        self.jobs[index] = None;
    }

    fn reallocate_job<A: Allocator>(&mut self, allocator: &A, index: usize, job: Job) {
        let new_size = self.rng.gen_range(1..=self.maximum_size);

        //  Safety:
        //  -   `job.pointer` is live, and forgotten on success.
        let pointer = match unsafe { allocator.reallocate(Some(job.pointer), new_size) } {
            Some(pointer) => pointer,
            None => {
                //  A failed reallocation leaves the old block untouched.
                verify(job, job.size);
                return;
            },
        };

        //  The overlapping prefix carried over to the new block.
        let preserved = cmp::min(job.size, new_size);

        verify(Job { pointer, size: preserved, seed: job.seed }, preserved);

        let job = Job { pointer, size: new_size, seed: self.next_seed() };

        fill(job);

        self.jobs[index] = Some(job);
    }

    fn drain<A: Allocator>(&mut self, allocator: &A) {
        self.verify_all();

        for slot in self.jobs.iter_mut() {
            if let Some(job) = slot.take() {
                //  Safety:
                //  -   `job.pointer` is live, and forgotten immediately after.
                unsafe { allocator.release(job.pointer) };
            }
        }
    }

    fn verify_all(&self) {
        for job in self.jobs.iter().flatten() {
            verify(*job, job.size);
        }
    }

    //  Job contents identify the step that wrote them, a boon when chasing a corruption.
    fn next_seed(&mut self) -> u64 {
        let seed = self.counter;
        self.counter += 1;
        seed
    }
}

fn fill(job: Job) {
    let mut stream = ByteStream::new(job.seed);

    for i in 0..job.size {
        //  Safety:
        //  -   `job.pointer` points to at least `job.size` writable bytes.
        unsafe { job.pointer.as_ptr().add(i).write(stream.next_byte()) };
    }
}

fn verify(job: Job, length: usize) {
    let mut stream = ByteStream::new(job.seed);

    for i in 0..length {
        let expected = stream.next_byte();

        //  Safety:
        //  -   `job.pointer` points to at least `length` readable bytes.
        let actual = unsafe { job.pointer.as_ptr().add(i).read() };

        assert_eq!(expected, actual,
            "corrupted byte {} of block {:?} (stream seed {})", i, job.pointer, job.seed);
    }
}

fn expect_zeroed(pointer: NonNull<u8>, size: usize) {
    for i in 0..size {
        //  Safety:
        //  -   `pointer` points to at least `size` readable bytes.
        let byte = unsafe { pointer.as_ptr().add(i).read() };

        assert_eq!(0, byte, "non-zero byte {} in zeroed block {:?}", i, pointer);
    }
}

// mod tests
