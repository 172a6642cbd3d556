//! A fixed-capacity, in-place heap allocator generic over an element type.
//!
//! This crate provides a single type called [`Allocator`]. Unlike most
//! allocators in this corner of the ecosystem it does not implement
//! [`core::alloc::GlobalAlloc`]: it is a typed, STL-`std::allocator`-style
//! allocator, generic over an element kind `T` and a const byte capacity
//! `N`, meant to hand out and reclaim storage for values of `T` one request
//! at a time. No growth, no thread safety, no freelist index — just a
//! single byte buffer carved into variable-length blocks on demand.
//!
//! # Usage
//! ```
//! let mut heap = tagalloc::Allocator::<u32, 64>::new().unwrap();
//! let address = heap.allocate(4).unwrap(); // room for 4 u32s
//! unsafe { heap.construct(address, 42) };
//! // ... use the address ...
//! let value = unsafe { heap.destroy(address) };
//! assert_eq!(value, 42);
//! heap.deallocate(address);
//! ```
//!
//! # Implementation
//! Every block is framed by two *sentinels*, one at each end, each a signed
//! 32-bit integer whose magnitude is the block's payload length in bytes
//! and whose sign says whether the block is free (positive) or busy
//! (negative). The two sentinels of one block always carry the same value;
//! checking that agreement for every block, end to end, is the whole of the
//! validity predicate ([`Allocator::is_valid`]).
//!
//! 1. A fresh buffer is a single free block spanning everything but the two
//!    outer sentinels.
//!    ```text
//!    [+92][ ... 92 bytes ... ][+92]
//!    ```
//! 2. `allocate` does a first-fit left-to-right scan. Once a large-enough
//!    free block is found, the remaining slack decides what happens:
//!    - if the slack (`block payload - bytes needed`) is at most two
//!      sentinel widths, there isn't room for the slack to host a block of
//!      its own, so the *whole* free block is handed out (absorb);
//!    - otherwise the block is split into a busy block of exactly the
//!      requested size and a smaller free block holding the rest.
//!    ```text
//!    [-40][ 40 bytes ][-40][+44][ 44 bytes ][+44]
//!    ```
//! 3. `deallocate` flips the freed block's sentinels back to positive, then
//!    merges with a free left neighbor, a free right neighbor, or both at
//!    once (a three-way merge) — the heap invariant is that no two adjacent
//!    blocks are ever both free, so coalescing always runs in both
//!    directions, not just one.
//!
//! `allocate`/`deallocate` deal in opaque [`Address<T>`] handles rather than
//! raw pointers: an address is a validated offset into the buffer, mapped
//! to a pointer only at the point payload access is actually needed. This
//! keeps the pointer arithmetic that the two-sentinel scheme needs
//! internal to the crate.
#![no_std]

mod raw_allocator;

use raw_allocator::{RawAllocator, RawError};

use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr;

/// An error from an [`Allocator`] operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// `N` is too small to hold even a single sentinel pair
    /// (`N < 2 * size_of::<i32>()`).
    InsufficientCapacity,
    /// No free block large enough for the request was found.
    OutOfSpace,
    /// The request itself is not representable, e.g. `n * size_of::<T>()`
    /// overflows `usize`.
    InvalidRequest,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::InsufficientCapacity => "heap buffer too small for a single sentinel pair",
            Self::OutOfSpace => "no free block large enough for the request",
            Self::InvalidRequest => "requested element count does not fit in the address space",
        };
        f.write_str(message)
    }
}

impl core::error::Error for AllocError {}

impl From<RawError> for AllocError {
    fn from(error: RawError) -> Self {
        match error {
            RawError::InsufficientCapacity => Self::InsufficientCapacity,
            RawError::OutOfSpace => Self::OutOfSpace,
        }
    }
}

/// An opaque handle to a (possibly unallocated) slot in an [`Allocator`].
///
/// This is a validated byte offset into the allocator's buffer tagged with
/// the element type it addresses, not a raw pointer: the offset is mapped
/// to a pointer only when payload access is actually needed, via
/// [`Allocator::as_ptr`]/[`Allocator::as_mut_ptr`].
pub struct Address<T> {
    offset: usize,
    _marker: PhantomData<T>,
}

impl<T> Address<T> {
    const NULL: usize = usize::MAX;

    /// The null address returned by `allocate(0)`.
    pub const fn null() -> Self {
        Self {
            offset: Self::NULL,
            _marker: PhantomData,
        }
    }

    /// Whether this address is the null address.
    pub const fn is_null(&self) -> bool {
        self.offset == Self::NULL
    }
}

impl<T> Clone for Address<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Address<T> {}
impl<T> PartialEq for Address<T> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}
impl<T> Eq for Address<T> {}
impl<T> fmt::Debug for Address<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("Address(null)")
        } else {
            f.debug_tuple("Address").field(&self.offset).finish()
        }
    }
}

/// A fixed-capacity allocator handing out storage for values of `T` from an
/// in-place, `N`-byte buffer.
///
/// See the [crate-level](crate) documentation for the algorithm. `T` must
/// have a fixed, known size; the caller is responsible for not requesting
/// an alignment beyond what the sentinel width (4 bytes) guarantees — see
/// `SPEC_FULL.md` §6 for the full element-kind contract.
pub struct Allocator<T, const N: usize> {
    raw: RawAllocator<N>,
    _marker: PhantomData<T>,
}

impl<T, const N: usize> Allocator<T, N> {
    /// Create a new [`Allocator`], writing the initial single free block.
    ///
    /// # Errors
    /// Returns [`AllocError::InsufficientCapacity`] if `N` cannot hold even
    /// a single pair of sentinels.
    pub fn new() -> Result<Self, AllocError> {
        Ok(Self {
            raw: RawAllocator::new()?,
            _marker: PhantomData,
        })
    }

    /// Allocate storage for `n` elements of `T`.
    ///
    /// `allocate(0)` always succeeds and returns [`Address::null`] without
    /// touching the heap.
    ///
    /// # Errors
    /// Returns [`AllocError::InvalidRequest`] if `n * size_of::<T>()`
    /// overflows `usize`, or [`AllocError::OutOfSpace`] if no free block is
    /// large enough.
    pub fn allocate(&mut self, n: usize) -> Result<Address<T>, AllocError> {
        if n == 0 {
            return Ok(Address::null());
        }
        let need = n
            .checked_mul(mem::size_of::<T>())
            .ok_or(AllocError::InvalidRequest)?;
        let offset = self.raw.allocate(need)?;
        Ok(Address {
            offset,
            _marker: PhantomData,
        })
    }

    /// Release the block backing `address` for reuse, coalescing with free
    /// neighbors as needed.
    ///
    /// A null address is a no-op.
    ///
    /// # Safety
    /// `address` must have been returned by a prior `allocate` on this same
    /// instance and must not already have been deallocated.
    pub fn deallocate(&mut self, address: Address<T>) {
        if address.is_null() {
            return;
        }
        self.raw.deallocate(address.offset);
    }

    /// Initialize the storage at `address` with `value`.
    ///
    /// Does not touch sentinels; only writes the payload bytes.
    ///
    /// # Safety
    /// `address` must address storage currently allocated (and not yet
    /// constructed) on this instance.
    pub unsafe fn construct(&mut self, address: Address<T>, value: T) {
        debug_assert!(self.is_valid());
        // SAFETY: `address` is a previously-allocated, unconstructed slot of
        // size and alignment suitable for `T` (the element-kind contract in
        // `SPEC_FULL.md` §6 places the alignment requirement on the caller).
        unsafe {
            let ptr = self.as_mut_ptr(address);
            ptr::write(ptr, value);
        }
        debug_assert!(self.is_valid());
    }

    /// Tear down the value at `address`, returning it by value.
    ///
    /// The C++ original this crate is modeled on runs the destructor in
    /// place and discards the result; Rust has no placement-destroy
    /// primitive, so handing the value back to the caller is the closest
    /// faithful analogue — the caller may then drop it or inspect it.
    ///
    /// # Safety
    /// `address` must address a value of `T` previously written by
    /// `construct` on this instance, and `destroy` must not be called twice
    /// for the same construction.
    pub unsafe fn destroy(&mut self, address: Address<T>) -> T {
        debug_assert!(self.is_valid());
        // SAFETY: see above; the caller guarantees a live `T` is present.
        let value = unsafe {
            let ptr = self.as_mut_ptr(address);
            ptr::read(ptr)
        };
        debug_assert!(self.is_valid());
        value
    }

    /// A raw pointer to the payload at `address`.
    ///
    /// # Safety
    /// `address` must be a non-null address previously returned by
    /// `allocate` on this instance.
    pub unsafe fn as_ptr(&mut self, address: Address<T>) -> *const T {
        self.as_mut_ptr(address).cast_const()
    }

    /// A mutable raw pointer to the payload at `address`.
    ///
    /// # Safety
    /// `address` must be a non-null address previously returned by
    /// `allocate` on this instance.
    pub unsafe fn as_mut_ptr(&mut self, address: Address<T>) -> *mut T {
        debug_assert!(!address.is_null());
        self.raw.payload_ptr(address.offset).cast::<T>()
    }

    /// The validity predicate: every block's two sentinels agree, and the
    /// traversal covers the buffer exactly.
    ///
    /// Pure inspector, safe to call between any two mutations.
    pub fn is_valid(&self) -> bool {
        self.raw.is_valid()
    }
}

/// All instances of a given `(T, N)` pair compare equal: the allocator is
/// stateless as a *type*, not as a resource.
impl<T, const N: usize> PartialEq for Allocator<T, N> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}
impl<T, const N: usize> Eq for Allocator<T, N> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct_and_destroy_round_trip() {
        let mut heap = Allocator::<u32, 64>::new().unwrap();
        let address = heap.allocate(1).unwrap();
        unsafe { heap.construct(address, 42) };
        assert_eq!(unsafe { heap.destroy(address) }, 42);
        heap.deallocate(address);
        assert!(heap.is_valid());
    }

    #[test]
    fn allocate_zero_returns_null_without_touching_heap() {
        let mut heap = Allocator::<u32, 64>::new().unwrap();
        let address = heap.allocate(0).unwrap();
        assert!(address.is_null());
        heap.deallocate(address); // no-op, must not panic
        assert!(heap.is_valid());
    }

    #[test]
    fn insufficient_capacity_is_reported() {
        assert_eq!(
            Allocator::<u32, 4>::new().unwrap_err(),
            AllocError::InsufficientCapacity
        );
    }

    #[test]
    fn instances_are_always_equal() {
        let a = Allocator::<u32, 64>::new().unwrap();
        let b = Allocator::<u32, 64>::new().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn out_of_space_is_reported() {
        let mut heap = Allocator::<u8, 32>::new().unwrap();
        heap.allocate(24).unwrap();
        assert_eq!(heap.allocate(1).unwrap_err(), AllocError::OutOfSpace);
    }
}
