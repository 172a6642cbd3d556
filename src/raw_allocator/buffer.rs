use super::sentinel::{Sentinel, WIDTH};

use core::mem::MaybeUninit;

/// The buffer memory backing the heap.
///
/// Bytes are only ever read after having been written as part of a sentinel
/// or a caller's `construct`; everything else stays `MaybeUninit` for the
/// lifetime of the allocator, exactly like the teacher's `Buffer`.
#[repr(align(4))]
pub struct Buffer<const N: usize>([MaybeUninit<u8>; N]);

impl<const N: usize> Buffer<N> {
    /// Create a fully uninitialized buffer.
    ///
    /// This does *not* write the initial sentinel pair; the caller
    /// ([`super::RawAllocator::new`]) does that after checking `N` is large
    /// enough, since that check can fail and buffer construction itself must
    /// not panic.
    pub const fn new() -> Self {
        Self([MaybeUninit::uninit(); N])
    }

    /// Read the sentinel at the given byte offset.
    ///
    /// # Panics
    /// Panics if the read would run past the end of the buffer.
    ///
    /// The caller must only read offsets that were previously written by
    /// [`Self::write_sentinel`]; this mirrors the teacher's `Buffer::at`,
    /// which carries the same informal contract for its `Entry` headers.
    pub fn read_sentinel(&self, offset: usize) -> Sentinel {
        assert!(
            offset + WIDTH <= N,
            "sentinel read at {offset} out of bounds for buffer of size {N}"
        );
        // SAFETY: the bound is checked above. The bytes at `offset` were
        // written by a prior `write_sentinel` call (every sentinel position
        // is written before it is ever read, starting with the initial
        // block written by `RawAllocator::new`).
        let bytes: [u8; WIDTH] = unsafe {
            let mut raw = [0u8; WIDTH];
            for (i, slot) in raw.iter_mut().enumerate() {
                *slot = self.0[offset + i].assume_init();
            }
            raw
        };
        Sentinel::from_raw(i32::from_ne_bytes(bytes))
    }

    /// Write a sentinel at the given byte offset.
    ///
    /// # Panics
    /// Panics if the write would run past the end of the buffer.
    pub fn write_sentinel(&mut self, offset: usize, sentinel: Sentinel) {
        assert!(
            offset + WIDTH <= N,
            "sentinel write at {offset} out of bounds for buffer of size {N}"
        );
        for (i, byte) in sentinel.to_raw().to_ne_bytes().into_iter().enumerate() {
            self.0[offset + i] = MaybeUninit::new(byte);
        }
    }

    /// A raw pointer to the byte at `offset`, for payload access.
    ///
    /// The caller is responsible for keeping the access within the bounds of
    /// the block's payload; this is the same trust boundary the teacher
    /// places on `memory_of_mut`.
    pub fn payload_ptr(&mut self, offset: usize) -> *mut u8 {
        debug_assert!(offset <= N);
        self.0.as_mut_ptr().wrapping_add(offset).cast::<u8>()
    }
}
