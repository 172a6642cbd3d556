//! Randomized stress test for the two invariants the allocator must never
//! break: [`Allocator::is_valid`] after every mutating call, and "no two
//! adjacent blocks are ever both free" (checked indirectly, since the
//! public API has no way to observe adjacency directly: we check it by
//! confirming a full-heap allocation always succeeds once everything live
//! has been freed).
//!
//! No `proptest`/`quickcheck` dependency: a small deterministic xorshift
//! generator, seeded per test run, is enough to get broad coverage of
//! allocate/deallocate interleavings without pulling in a crate none of
//! the sibling allocators in this corner of the ecosystem use.

use tagalloc::Allocator;

/// A tiny xorshift32 PRNG. Deterministic for a given seed, which keeps a
/// failing run reproducible without needing to record the sequence.
struct Xorshift32(u32);

impl Xorshift32 {
    fn new(seed: u32) -> Self {
        Self(if seed == 0 { 0xdead_beef } else { seed })
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    fn below(&mut self, bound: u32) -> u32 {
        self.next_u32() % bound
    }
}

#[test]
fn random_alloc_dealloc_sequence_never_breaks_validity() {
    const SEED: u32 = 0x5EED_1234;
    const ROUNDS: usize = 20_000;

    let mut heap = Allocator::<u8, 512>::new().unwrap();
    let mut rng = Xorshift32::new(SEED);
    let mut live: Vec<tagalloc::Address<u8>> = Vec::new();

    for _ in 0..ROUNDS {
        let allocate = live.is_empty() || rng.below(3) != 0;
        if allocate {
            let n = 1 + rng.below(40) as usize;
            if let Ok(address) = heap.allocate(n) {
                if !address.is_null() {
                    live.push(address);
                }
            }
        } else {
            let index = rng.below(live.len() as u32) as usize;
            let address = live.swap_remove(index);
            heap.deallocate(address);
        }
        assert!(heap.is_valid(), "heap became invalid mid-sequence");
    }

    for address in live {
        heap.deallocate(address);
    }
    assert!(heap.is_valid());

    // everything should have coalesced back into one reclaimable block.
    let whole = heap.allocate(504).unwrap();
    heap.deallocate(whole);
}

#[test]
fn random_sequences_across_several_seeds_stay_valid() {
    for seed in [1, 2, 0x1234_5678, 0xffff_ffff, 42] {
        let mut heap = Allocator::<i32, 256>::new().unwrap();
        let mut rng = Xorshift32::new(seed);
        let mut live: Vec<tagalloc::Address<i32>> = Vec::new();

        for _ in 0..2_000 {
            if live.is_empty() || rng.below(2) == 0 {
                let n = 1 + rng.below(6) as usize;
                if let Ok(address) = heap.allocate(n) {
                    if !address.is_null() {
                        unsafe { heap.construct(address, n as i32) };
                        live.push(address);
                    }
                }
            } else {
                let index = rng.below(live.len() as u32) as usize;
                let address = live.swap_remove(index);
                unsafe { heap.destroy(address) };
                heap.deallocate(address);
            }
            assert!(heap.is_valid());
        }

        for address in live {
            unsafe { heap.destroy(address) };
            heap.deallocate(address);
        }
        assert!(heap.is_valid());
    }
}
