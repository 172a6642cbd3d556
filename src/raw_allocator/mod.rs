//! This module provides the raw allocator and its support types.
//!
//! A "raw allocator" is one that works purely in terms of byte offsets and
//! counts; it knows nothing about the element type `T` the public
//! [`crate::Allocator`] is generic over. It owns the [`Buffer`] and
//! implements the boundary-tag algorithm: first-fit allocation with
//! split-or-absorb, and three-way coalescing on release.
mod buffer;
mod sentinel;

use buffer::Buffer;
use sentinel::{Sentinel, WIDTH};

/// An error from a [`RawAllocator`] operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawError {
    /// `N` is too small to hold even a single sentinel pair.
    InsufficientCapacity,
    /// No free block large enough for the request was found.
    OutOfSpace,
}

/// A raw, boundary-tag allocator over a fixed `N`-byte buffer.
///
/// Every block is `[left sentinel][payload][right sentinel]`, where both
/// sentinels carry the same signed payload length (positive: free,
/// negative: busy). See `SPEC_FULL.md` §3 for the full data model.
pub struct RawAllocator<const N: usize> {
    buffer: Buffer<N>,
}

impl<const N: usize> RawAllocator<N> {
    /// Create a new [`RawAllocator`], writing the initial single free block.
    ///
    /// # Errors
    /// Returns [`RawError::InsufficientCapacity`] if `N < 2 * WIDTH`, or if
    /// the initial payload length `N - 2 * WIDTH` does not fit in a
    /// sentinel (a buffer larger than `i32::MAX` bytes of payload has no
    /// representable initial block).
    pub fn new() -> Result<Self, RawError> {
        if N < 2 * WIDTH {
            return Err(RawError::InsufficientCapacity);
        }
        let payload = N - 2 * WIDTH;
        if payload > i32::MAX as usize {
            return Err(RawError::InsufficientCapacity);
        }
        let mut buffer = Buffer::new();
        let initial = Sentinel::free(payload);
        buffer.write_sentinel(0, initial);
        buffer.write_sentinel(N - WIDTH, initial);
        Ok(Self { buffer })
    }

    /// Allocate `need` contiguous payload bytes, first-fit.
    ///
    /// Returns the byte offset of the payload (i.e. the offset just past the
    /// left sentinel of the chosen block).
    ///
    /// # Errors
    /// Returns [`RawError::OutOfSpace`] if no free block has payload `>=
    /// need`.
    pub fn allocate(&mut self, need: usize) -> Result<usize, RawError> {
        let mut offset = 0;
        while offset + WIDTH <= N {
            let left = self.buffer.read_sentinel(offset);
            let payload = left.payload_len();

            if left.is_free() && payload >= need {
                let slack = payload - need;
                if slack <= 2 * WIDTH {
                    self.absorb(offset, left);
                } else {
                    self.split(offset, payload, need);
                }
                debug_assert!(self.is_valid(), "allocate produced an invalid heap");
                return Ok(offset + WIDTH);
            }

            offset += 2 * WIDTH + payload;
        }
        Err(RawError::OutOfSpace)
    }

    /// Grant the whole of a free block to the caller (residue too small to
    /// host a block of its own).
    fn absorb(&mut self, offset: usize, left: Sentinel) {
        let busy = left.flipped();
        let right_offset = offset + WIDTH + left.payload_len();
        self.buffer.write_sentinel(offset, busy);
        self.buffer.write_sentinel(right_offset, busy);
    }

    /// Split a free block into a busy block of `need` bytes followed by a
    /// smaller free block holding the residue.
    fn split(&mut self, offset: usize, payload: usize, need: usize) {
        let allocated = Sentinel::busy(need);
        let allocated_right_offset = offset + WIDTH + need;
        self.buffer.write_sentinel(offset, allocated);
        self.buffer.write_sentinel(allocated_right_offset, allocated);

        let residue = Sentinel::free(payload - need - 2 * WIDTH);
        let residue_left_offset = allocated_right_offset + WIDTH;
        let residue_right_offset = offset + WIDTH + payload; // the original right sentinel
        self.buffer.write_sentinel(residue_left_offset, residue);
        self.buffer.write_sentinel(residue_right_offset, residue);
    }

    /// Release the block whose payload starts at `payload_offset`, merging
    /// with a free left and/or right neighbor.
    pub fn deallocate(&mut self, payload_offset: usize) {
        let mut left_offset = payload_offset - WIDTH;
        let busy = self.buffer.read_sentinel(left_offset);
        let mut right_offset = left_offset + WIDTH + busy.payload_len();
        let mut freed = busy.flipped();

        // left coalesce
        if left_offset > 0 {
            let prev_right_offset = left_offset - WIDTH;
            let prev_right = self.buffer.read_sentinel(prev_right_offset);
            if prev_right.is_free() {
                let prev_len = prev_right.payload_len();
                left_offset -= 2 * WIDTH + prev_len;
                freed = Sentinel::free(prev_len + freed.payload_len() + 2 * WIDTH);
            }
        }

        // right coalesce
        let next_left_offset = right_offset + WIDTH;
        if next_left_offset + WIDTH <= N {
            let next_left = self.buffer.read_sentinel(next_left_offset);
            if next_left.is_free() {
                let next_len = next_left.payload_len();
                right_offset = next_left_offset + WIDTH + next_len;
                freed = Sentinel::free(freed.payload_len() + next_len + 2 * WIDTH);
            }
        }

        self.buffer.write_sentinel(left_offset, freed);
        self.buffer.write_sentinel(right_offset, freed);
        debug_assert!(self.is_valid(), "deallocate produced an invalid heap");
    }

    /// A pointer to the byte at `offset`, for payload access by the typed
    /// front end.
    pub fn payload_ptr(&mut self, offset: usize) -> *mut u8 {
        self.buffer.payload_ptr(offset)
    }

    /// The validity predicate: traverse all blocks, checking that each
    /// block's two sentinels agree and that the traversal covers exactly
    /// `[0, N)`.
    pub fn is_valid(&self) -> bool {
        let mut offset = 0;
        while offset + WIDTH <= N {
            let left = self.buffer.read_sentinel(offset);
            let right_offset = offset + WIDTH + left.payload_len();
            if right_offset + WIDTH > N {
                return false;
            }
            let right = self.buffer.read_sentinel(right_offset);
            if left.to_raw() != right.to_raw() {
                return false;
            }
            offset = right_offset + WIDTH;
        }
        offset == N
    }

    /// Whether any two adjacent blocks are both free.
    ///
    /// Not part of the public validity predicate (`spec.md` §4.6 only
    /// checks sentinel agreement and coverage), but it is a heap invariant
    /// (`spec.md` §3) that the split/coalesce algorithms must uphold, so it
    /// is exercised directly by the white-box tests below.
    #[cfg(test)]
    fn has_free_free_adjacency(&self) -> bool {
        let mut offset = 0;
        let mut previous_was_free = false;
        while offset + WIDTH <= N {
            let left = self.buffer.read_sentinel(offset);
            if previous_was_free && left.is_free() {
                return true;
            }
            previous_was_free = left.is_free();
            offset += 2 * WIDTH + left.payload_len();
        }
        false
    }
}
