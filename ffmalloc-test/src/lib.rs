#![no_std]

//! Test utilities for exercising a malloc-style allocator through randomized workloads.

mod scenario;

pub use scenario::{Allocator, ByteStream, Scenario};
