#![feature(test)]
extern crate test;
use test::Bencher;

use tagalloc::Allocator;

mod repeated_allocation_deallocation {
    use super::*;

    /// Run a benchmark, which repeatedly allocates and deallocates a single
    /// byte. The benchmark will allocate the given amount of bytes
    /// beforehand (before running the actual benchmark) in order to fill up
    /// the heap with unrelated allocations.
    ///
    /// # Panics
    /// This will panic, if the requested pre-allocations will fill up the
    /// whole heap (so the actual benchmark cannot allocate anymore).
    fn benchmark_with_preallocation(b: &mut Bencher, pre_allocations: usize) {
        let mut heap = Allocator::<u8, 8192>::new().unwrap();
        // pre-allocate much memory to see the real impact of the linear scan
        for _ in 0..pre_allocations {
            heap.allocate(1).unwrap();
        }

        // make sure there is enough room for the next allocation
        let address = heap.allocate(1).unwrap();
        assert!(!address.is_null());
        heap.deallocate(address);

        // run actual benchmark: allocate & deallocate a single byte repeatedly
        b.iter(|| {
            let address = heap.allocate(1).unwrap();
            let address = test::black_box(address);
            heap.deallocate(address);
        });
    }

    #[bench]
    fn no_memory_usage(b: &mut Bencher) {
        benchmark_with_preallocation(b, 0);
    }

    #[bench]
    fn low_memory_usage(b: &mut Bencher) {
        benchmark_with_preallocation(b, 8);
    }

    #[bench]
    fn medium_memory_usage(b: &mut Bencher) {
        benchmark_with_preallocation(b, 510);
    }

    #[bench]
    fn high_memory_usage(b: &mut Bencher) {
        benchmark_with_preallocation(b, 1020);
    }
}
