// tuplevec - tuplevec
// Module: Layout planner for shared column allocations
// SW-REQ-ID: REQ_SOA_LAYOUT_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Layout planning for N columns packed into one allocation.
//!
//! Columns are placed in declaration order. Each column starts at the
//! running offset rounded up to the alignment of its element type and
//! occupies `capacity * size_of::<T>()` bytes. The allocation is aligned to
//! the largest column alignment, so every column start is valid for its
//! element type.
//!
//! # Characteristics
//!
//! - Deterministic: the same type list and capacity always give the same plan
//! - Checked: byte arithmetic that overflows reports
//!   [`Error::CAPACITY_OVERFLOW`] before any allocator is involved
//! - A zero capacity (or zero-sized columns only) yields a plan of size 0

use core::{
    alloc::Layout,
    mem::{align_of, size_of},
};

use tuplevec_error::{Error, Result};

/// Round `offset` up to the next multiple of `align` (a power of two).
#[inline]
#[must_use]
pub const fn align_up(offset: usize, align: usize) -> Option<usize> {
    match offset.checked_add(align - 1) {
        Some(bumped) => Some(bumped & !(align - 1)),
        None => None,
    }
}

/// Largest value of a non-empty alignment list; 1 for an empty list.
#[must_use]
pub const fn max_align(aligns: &[usize]) -> usize {
    let mut max = 1;
    let mut i = 0;
    while i < aligns.len() {
        if aligns[i] > max {
            max = aligns[i];
        }
        i += 1;
    }
    max
}

/// Result of planning a storage generation.
///
/// `O` is the offset table, `[usize; N]` for an N-column record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutPlan<O> {
    size:     usize,
    align:    usize,
    capacity: usize,
    offsets:  O,
}

impl<O> LayoutPlan<O> {
    /// Total bytes of the allocation.
    #[inline]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Alignment of the allocation.
    #[inline]
    pub const fn align(&self) -> usize {
        self.align
    }

    /// Row capacity the plan was made for.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Byte offset of each column from the start of the allocation.
    #[inline]
    pub const fn offsets(&self) -> &O {
        &self.offsets
    }

    /// Whether no memory needs to be requested for this plan.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The plan as a [`Layout`].
    pub fn to_layout(&self) -> Result<Layout> {
        Layout::from_size_align(self.size, self.align).map_err(|_| Error::CAPACITY_OVERFLOW)
    }
}

/// Running state of a layout computation.
///
/// Call [`column`](Self::column) once per column type in declaration order,
/// then [`finish`](Self::finish) with the collected offsets.
///
/// # Examples
///
/// ```
/// use tuplevec::LayoutPlanner;
///
/// let mut planner = LayoutPlanner::new(3);
/// let offsets = [
///     planner.column::<u8>()?,
///     planner.column::<u64>()?,
///     planner.column::<u16>()?,
/// ];
/// let plan = planner.finish(offsets)?;
///
/// assert_eq!(plan.offsets(), &[0, 8, 32]);
/// assert_eq!(plan.size(), 38);
/// assert_eq!(plan.align(), 8);
/// # Ok::<(), tuplevec::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LayoutPlanner {
    capacity: usize,
    offset:   usize,
    align:    usize,
}

impl LayoutPlanner {
    /// Start planning for `capacity` rows.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            offset: 0,
            align: 1,
        }
    }

    /// Place the next column and return its byte offset.
    pub fn column<T>(&mut self) -> Result<usize> {
        self.place(size_of::<T>(), align_of::<T>())
    }

    /// Place a column of `size`-byte elements aligned to `align`.
    pub fn place(&mut self, size: usize, align: usize) -> Result<usize> {
        debug_assert!(align.is_power_of_two());
        let start = align_up(self.offset, align).ok_or(Error::CAPACITY_OVERFLOW)?;
        let bytes = size.checked_mul(self.capacity).ok_or(Error::CAPACITY_OVERFLOW)?;
        self.offset = start.checked_add(bytes).ok_or(Error::CAPACITY_OVERFLOW)?;
        self.align = self.align.max(align);
        Ok(start)
    }

    /// Bytes used so far.
    #[inline]
    pub const fn size(&self) -> usize {
        self.offset
    }

    /// Close the plan.
    ///
    /// Fails when the size rounded up to the alignment would exceed
    /// `isize::MAX`, the limit of any Rust allocation.
    pub fn finish<O>(self, offsets: O) -> Result<LayoutPlan<O>> {
        if self.offset > isize::MAX as usize - (self.align - 1) {
            return Err(Error::CAPACITY_OVERFLOW);
        }
        Ok(LayoutPlan {
            size: self.offset,
            align: self.align,
            capacity: self.capacity,
            offsets,
        })
    }
}

// ============ KANI Formal Verification ============

#[cfg(kani)]
mod verification {
    use super::*;

    /// Every placed column is aligned and lies after the previous one.
    #[kani::proof]
    fn verify_planner_offsets() {
        let capacity: usize = kani::any();
        kani::assume(capacity <= 1024);
        let mut planner = LayoutPlanner::new(capacity);

        let a = planner.column::<u8>();
        let b = planner.column::<u64>();
        let c = planner.column::<u16>();

        if let (Ok(a), Ok(b), Ok(c)) = (a, b, c) {
            assert!(b % align_of::<u64>() == 0);
            assert!(c % align_of::<u16>() == 0);
            assert!(a + capacity <= b);
            assert!(b + capacity * 8 <= c);
            assert!(planner.size() == c + capacity * 2);
        }
    }

    /// `align_up` never rounds down and always yields a multiple.
    #[kani::proof]
    fn verify_align_up() {
        let offset: usize = kani::any();
        let shift: u32 = kani::any();
        kani::assume(shift < 12);
        let align = 1usize << shift;
        if let Some(aligned) = align_up(offset, align) {
            assert!(aligned >= offset);
            assert!(aligned % align == 0);
            assert!(aligned - offset < align);
        }
    }
}
