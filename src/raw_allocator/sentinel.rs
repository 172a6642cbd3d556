//! The sentinel value framing each block.
//!
//! A sentinel is a signed 32-bit integer whose magnitude is a payload
//! length in bytes and whose sign encodes whether the block is free or
//! busy. Every block carries two sentinels (one at each end) which must
//! always agree; that agreement is the core of the validity predicate in
//! [`super::buffer`].

use core::mem;

/// Width in bytes of a single sentinel.
pub const WIDTH: usize = mem::size_of::<i32>();

/// A decoded sentinel: a payload length together with a free/busy tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentinel(i32);

impl Sentinel {
    /// A sentinel describing a free block of the given payload length.
    ///
    /// # Panics
    /// Panics if `payload_len` does not fit in an `i32`.
    pub fn free(payload_len: usize) -> Self {
        Self(i32::try_from(payload_len).expect("payload length exceeds sentinel width"))
    }

    /// A sentinel describing a busy block of the given payload length.
    ///
    /// # Panics
    /// Panics if `payload_len` does not fit in an `i32`.
    pub fn busy(payload_len: usize) -> Self {
        Self(-i32::try_from(payload_len).expect("payload length exceeds sentinel width"))
    }

    /// Decode a raw sentinel value read from the buffer.
    pub fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw signed value, as it is written to the buffer.
    pub fn to_raw(self) -> i32 {
        self.0
    }

    /// The payload length this sentinel frames, regardless of status.
    pub fn payload_len(self) -> usize {
        self.0.unsigned_abs() as usize
    }

    /// Whether the block this sentinel frames is free.
    pub fn is_free(self) -> bool {
        self.0 >= 0
    }

    /// Whether the block this sentinel frames is busy.
    pub fn is_busy(self) -> bool {
        self.0 < 0
    }

    /// The same payload length, with the sign flipped (free <-> busy).
    pub fn flipped(self) -> Self {
        Self(-self.0)
    }
}
