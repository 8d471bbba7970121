// tuplevec - tuplevec
// Module: Fixed-capacity tuple vector with optional overflow
// SW-REQ-ID: REQ_SOA_FIXED_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! [`FixedTupleVec`]: a [`TupleVec`] whose first block is a buffer lent by
//! the caller.
//!
//! The buffer is either an [`InlineBuffer`] sized for exactly `N` rows or an
//! arbitrary byte slice. Growing past the buffer either fails with
//! [`Error::CAPACITY_EXCEEDED`](crate::Error::CAPACITY_EXCEEDED) (overflow disabled, the container is left as
//! it was) or moves every row into a block from the overflow allocator.
//!
//! The wrapper dereferences to the inner [`TupleVec`], so the whole row API
//! is available. [`shrink_to_fit`](FixedTupleVec::shrink_to_fit) is
//! overridden to move rows back into the buffer when they fit again.
//!
//! # Examples
//!
//! ```
//! use tuplevec::{FixedTupleVec, InlineBuffer};
//!
//! let mut buffer = InlineBuffer::<(u32, f32), 4>::new();
//! let mut vec: FixedTupleVec<'_, (u32, f32)> = FixedTupleVec::new(&mut buffer)?;
//! assert_eq!(vec.max_size(), 4);
//!
//! for i in 0..4 {
//!     vec.push((i, i as f32))?;
//! }
//! assert!(vec.full());
//! assert!(!vec.has_overflowed());
//!
//! vec.push((4, 4.0))?;
//! assert!(vec.has_overflowed());
//! assert_eq!(vec.column::<0>(), &[0, 1, 2, 3, 4]);
//! # Ok::<(), tuplevec::Error>(())
//! ```

#![allow(unsafe_code)]

use core::{
    fmt,
    mem::{self, size_of, MaybeUninit},
    ops::{Deref, DerefMut},
    slice,
};

use tuplevec_alloc::{Allocator, FixedBufferAllocator, HeapAllocator};
use tuplevec_error::Result;

use crate::{fields::Fields, raw::RawStorage, tuple_vec::TupleVec};

/// Uninitialized storage for exactly `N` rows of `F`.
///
/// Lend it to [`FixedTupleVec::new`]. It outlives the container, so it
/// usually sits on the stack next to it.
pub struct InlineBuffer<F: Fields, const N: usize> {
    storage: MaybeUninit<F::Inline<N>>,
}

impl<F: Fields, const N: usize> InlineBuffer<F, N> {
    /// Uninitialized buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            storage: MaybeUninit::uninit(),
        }
    }

    /// Number of rows the buffer is sized for.
    #[must_use]
    pub const fn rows(&self) -> usize {
        N
    }

    fn as_bytes_mut(&mut self) -> &mut [MaybeUninit<u8>] {
        // SAFETY: any byte pattern is a valid `MaybeUninit<u8>`, and the
        // slice covers exactly the storage.
        unsafe {
            slice::from_raw_parts_mut(
                self.storage.as_mut_ptr().cast::<MaybeUninit<u8>>(),
                size_of::<F::Inline<N>>(),
            )
        }
    }
}

impl<F: Fields, const N: usize> Default for InlineBuffer<F, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Fields, const N: usize> fmt::Debug for InlineBuffer<F, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineBuffer")
            .field("rows", &N)
            .field("bytes", &size_of::<F::Inline<N>>())
            .finish()
    }
}

/// The allocator type a [`FixedTupleVec`] stores its rows with.
pub type FixedAllocator<'buf, O, const OVERFLOW: bool> = FixedBufferAllocator<'buf, O, OVERFLOW>;

/// A [`TupleVec`] that starts in a caller-lent buffer.
///
/// # Type Parameters
///
/// - `F`: the record shape
/// - `O`: the overflow allocator
/// - `OVERFLOW`: whether growth past the buffer may use `O`
pub struct FixedTupleVec<'buf, F: Fields, O: Allocator = HeapAllocator, const OVERFLOW: bool = true> {
    inner: TupleVec<F, FixedAllocator<'buf, O, OVERFLOW>>,
    max_size: usize,
}

impl<'buf, F: Fields, O: Allocator + Default, const OVERFLOW: bool> FixedTupleVec<'buf, F, O, OVERFLOW> {
    /// Empty container over `buffer` with a default overflow allocator.
    pub fn new<const N: usize>(buffer: &'buf mut InlineBuffer<F, N>) -> Result<Self> {
        Self::new_in(buffer, O::default())
    }
}

impl<'buf, F: Fields, O: Allocator, const OVERFLOW: bool> FixedTupleVec<'buf, F, O, OVERFLOW> {
    /// Empty container over `buffer`, overflowing into `overflow`.
    ///
    /// The fixed capacity is exactly `N` rows.
    pub fn new_in<const N: usize>(buffer: &'buf mut InlineBuffer<F, N>, overflow: O) -> Result<Self> {
        let size = F::plan(N)?.size();
        let bytes = buffer.as_bytes_mut();
        debug_assert!(size <= bytes.len());
        // Trailing padding of the inline storage may fit extra rows.
        Self::over_bytes(&mut bytes[..size], overflow, N)
    }

    /// Empty container over an arbitrary byte buffer.
    ///
    /// The fixed capacity is the largest row count whose layout fits into
    /// the buffer after aligning its start.
    pub fn from_bytes(buffer: &'buf mut [MaybeUninit<u8>], overflow: O) -> Result<Self> {
        Self::over_bytes(buffer, overflow, usize::MAX)
    }

    /// Empty container over `buffer` holding at most `limit` rows in it.
    fn over_bytes(buffer: &'buf mut [MaybeUninit<u8>], overflow: O, limit: usize) -> Result<Self> {
        let alloc = FixedBufferAllocator::new(buffer, overflow);
        let raw = match alloc.aligned_region(F::ALIGN)? {
            Some((start, bytes)) => {
                let plan = F::plan(rows_fitting::<F>(bytes).min(limit))?;
                // SAFETY: `start` is aligned to `F::ALIGN` and the plan fits
                // into the `bytes` bytes after it, borrowed for `'buf`.
                unsafe { RawStorage::from_block(start, &plan) }
            }
            None => RawStorage::empty(),
        };
        storage_event!(
            debug,
            rows = raw.capacity(),
            can_overflow = OVERFLOW,
            "fixed tuple vector over lent buffer"
        );
        let max_size = raw.capacity();
        let mut inner = TupleVec::from_raw_parts(raw, 0, alloc);
        inner.set_allocator_name(crate::FIXED_DEFAULT_NAME);
        Ok(Self { inner, max_size })
    }

    /// Rows the lent buffer holds.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Whether the rows have moved out of the lent buffer.
    pub fn has_overflowed(&self) -> bool {
        self.inner.raw.data().is_some_and(|data| !self.inner.alloc.owns(data))
    }

    /// Whether the lent buffer is used up.
    pub fn full(&self) -> bool {
        self.inner.len() >= self.max_size() || self.has_overflowed()
    }

    /// Whether growth past the buffer may use the overflow allocator.
    pub const fn can_overflow(&self) -> bool {
        OVERFLOW
    }

    /// The overflow allocator.
    pub fn overflow_allocator(&self) -> &O {
        self.inner.alloc.overflow_allocator()
    }

    /// Release memory not needed for the current rows.
    ///
    /// After an overflow, rows that fit into the lent buffer again are
    /// moved back into it; otherwise the overflow block is rebuilt at the
    /// current length. Without an overflow nothing changes.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        if !self.has_overflowed() {
            return Ok(());
        }
        let max_size = self.max_size();
        if self.inner.len() > max_size {
            return self.inner.shrink_to_fit();
        }
        let raw = match self.inner.alloc.aligned_region(F::ALIGN)? {
            Some((start, _)) => {
                let plan = F::plan(max_size)?;
                // SAFETY: the buffer holds no rows while the container has
                // overflowed, and the plan for `max_size` rows fits into it.
                unsafe { RawStorage::from_block(start, &plan) }
            }
            None => RawStorage::empty(),
        };
        storage_event!(debug, rows = self.inner.len(), "moving rows back into lent buffer");
        self.inner.replace_storage(raw);
        Ok(())
    }

    /// Exchange contents, buffers and allocators with `other`. Never
    /// allocates.
    pub fn swap(&mut self, other: &mut Self) {
        self.inner.swap(&mut other.inner);
        mem::swap(&mut self.max_size, &mut other.max_size);
    }

    /// The inner container.
    pub fn into_inner(self) -> TupleVec<F, FixedAllocator<'buf, O, OVERFLOW>> {
        self.inner
    }
}

/// Largest row count whose layout fits into `bytes` bytes.
fn rows_fitting<F: Fields>(bytes: usize) -> usize {
    if F::ROW_SIZE == 0 {
        return usize::MAX;
    }
    let fits = |rows: usize| F::plan(rows).is_ok_and(|plan| plan.size() <= bytes);
    let mut rows = bytes / F::ROW_SIZE;
    while rows > 0 && !fits(rows) {
        rows -= 1;
    }
    rows
}

impl<'buf, F: Fields, O: Allocator, const OVERFLOW: bool> Deref for FixedTupleVec<'buf, F, O, OVERFLOW> {
    type Target = TupleVec<F, FixedAllocator<'buf, O, OVERFLOW>>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<F: Fields, O: Allocator, const OVERFLOW: bool> DerefMut for FixedTupleVec<'_, F, O, OVERFLOW> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<F: Fields, O: Allocator, const OVERFLOW: bool> fmt::Debug for FixedTupleVec<'_, F, O, OVERFLOW> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedTupleVec")
            .field("len", &self.inner.len())
            .field("capacity", &self.inner.capacity())
            .field("max_size", &self.max_size())
            .field("has_overflowed", &self.has_overflowed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuplevec_alloc::TrackingAllocator;
    use tuplevec_error::Error;

    #[test]
    fn test_inline_capacity_is_exact() -> Result<()> {
        let mut buffer = InlineBuffer::<(u8, u64, u16), 7>::new();
        let vec: FixedTupleVec<'_, (u8, u64, u16)> = FixedTupleVec::new(&mut buffer)?;
        assert_eq!(vec.max_size(), 7);
        assert_eq!(vec.capacity(), 7);
        assert!(!vec.full());
        vec.validate()
    }

    #[test]
    fn test_rows_fitting_accounts_for_padding() {
        // 3 rows of (u8, u64) need 3 + 5 padding + 24 = 32 bytes.
        assert_eq!(rows_fitting::<(u8, u64)>(32), 3);
        assert_eq!(rows_fitting::<(u8, u64)>(31), 2);
        assert_eq!(rows_fitting::<(u8, u64)>(0), 0);
        assert_eq!(rows_fitting::<((),)>(0), usize::MAX);
    }

    #[test]
    fn test_no_overflow_refuses_growth() -> Result<()> {
        let mut buffer = InlineBuffer::<(u32,), 2>::new();
        let mut vec: FixedTupleVec<'_, (u32,), HeapAllocator, false> = FixedTupleVec::new(&mut buffer)?;
        vec.push((1,))?;
        vec.push((2,))?;
        assert_eq!(vec.push((3,)), Err(Error::CAPACITY_EXCEEDED));
        assert_eq!(vec.column::<0>(), &[1, 2]);
        assert!(vec.full());
        assert!(!vec.has_overflowed());
        Ok(())
    }

    #[test]
    fn test_shrink_moves_rows_back() -> Result<()> {
        let tracking = TrackingAllocator::new(HeapAllocator::new());
        let mut buffer = InlineBuffer::<(u16, char), 2>::new();
        let mut vec = FixedTupleVec::<'_, _, _, true>::new_in(&mut buffer, &tracking)?;
        vec.extend_rows([(1, 'a'), (2, 'b'), (3, 'c')])?;
        assert!(vec.has_overflowed());
        assert_eq!(tracking.stats().outstanding(), 1);

        vec.pop();
        vec.shrink_to_fit()?;
        assert!(!vec.has_overflowed());
        assert_eq!(vec.capacity(), 2);
        assert_eq!(vec.column::<1>(), &['a', 'b']);
        assert_eq!(tracking.stats().outstanding(), 0);
        Ok(())
    }

    #[test]
    fn test_inline_capacity_ignores_trailing_padding() -> Result<()> {
        // One row needs 1 byte, but the buffer is padded to 8.
        let mut buffer = InlineBuffer::<(u8, [u64; 0]), 1>::new();
        let mut vec: FixedTupleVec<'_, (u8, [u64; 0]), HeapAllocator, false> =
            FixedTupleVec::new(&mut buffer)?;
        assert_eq!(vec.max_size(), 1);
        assert_eq!(vec.capacity(), 1);
        vec.push((1, []))?;
        assert!(vec.full());
        assert_eq!(vec.push((2, [])), Err(Error::CAPACITY_EXCEEDED));
        vec.validate()
    }

    #[test]
    fn test_empty_byte_buffer_has_no_rows() -> Result<()> {
        let tracking = TrackingAllocator::new(HeapAllocator::new());
        let mut bytes = [MaybeUninit::<u8>::uninit(); 0];
        let mut vec = FixedTupleVec::<'_, (u32,), _, true>::from_bytes(&mut bytes, &tracking)?;
        assert_eq!(vec.max_size(), 0);
        assert!(!vec.has_overflowed());
        vec.push((7,))?;
        assert!(vec.has_overflowed());
        drop(vec);
        assert_eq!(tracking.stats().outstanding(), 0);
        Ok(())
    }

    #[test]
    fn test_byte_buffer() -> Result<()> {
        let mut bytes = [MaybeUninit::<u8>::uninit(); 40];
        let vec: FixedTupleVec<'_, (u32, u16)> = FixedTupleVec::from_bytes(&mut bytes, HeapAllocator::new())?;
        // Up to 3 bytes go to aligning the start; 6 bytes per row.
        assert!(vec.max_size() >= 6);
        assert!(vec.can_overflow());
        vec.validate()
    }
}
