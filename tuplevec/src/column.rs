// tuplevec - tuplevec
// Module: Typed column pointer and per-column primitives
// SW-REQ-ID: REQ_SOA_COLUMN_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! [`Column`]: a typed pointer into the shared allocation.
//!
//! A column does not know its length or capacity; the owning container
//! passes explicit row ranges to every operation. All operations are
//! `unsafe` and share one contract:
//!
//! # Safety
//!
//! - Every row index passed in is below the capacity of the storage the
//!   column points into.
//! - Rows the operation reads from are live (initialized); rows it writes to
//!   are uninitialized, unless stated otherwise.
//! - The caller updates its row count so that a panic in `Clone` or `Drop`
//!   can only leak rows, never expose a row twice.
//!
//! Moves are bitwise copies. Shifting a tail therefore relocates it with a
//! single overlapping copy into uninitialized territory and then constructs
//! the freed rows in place, so no row is ever read after it has been
//! dropped and no scratch buffer is needed.

#![allow(unsafe_code)]
#![allow(clippy::missing_safety_doc)] // shared contract in the module docs

use core::{fmt, ptr, ptr::NonNull, slice};

/// Typed pointer to the first row of one column.
pub struct Column<T> {
    ptr: NonNull<T>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Column<T> {}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Column").field(&self.ptr).finish()
    }
}

impl<T> Column<T> {
    /// A well-aligned pointer that is never dereferenced for a non-zero
    /// count of non-zero-sized rows.
    #[inline]
    pub const fn dangling() -> Self {
        Self {
            ptr: NonNull::dangling(),
        }
    }

    /// Column starting `offset` bytes after `base`.
    ///
    /// # Safety
    ///
    /// `base + offset` stays within (or one past) the allocation of `base`
    /// and is aligned for `T`.
    #[inline]
    pub(crate) unsafe fn at_offset(base: NonNull<u8>, offset: usize) -> Self {
        // SAFETY: guaranteed by the caller.
        let ptr = unsafe { base.add(offset) }.cast::<T>();
        debug_assert!(ptr.as_ptr().is_aligned());
        Self { ptr }
    }

    /// Pointer to the first row.
    #[inline]
    pub const fn as_ptr(self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Pointer to the first row.
    #[inline]
    pub const fn as_non_null(self) -> NonNull<T> {
        self.ptr
    }

    /// Address of the first row.
    #[inline]
    pub fn addr(self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Whether the column, with room for `capacity` rows, lies inside the
    /// byte range `[base, base + size)` and is aligned for `T`.
    pub fn lies_within(self, base: usize, size: usize, capacity: usize) -> bool {
        let start = self.addr();
        let Some(bytes) = capacity.checked_mul(size_of::<T>()) else {
            return false;
        };
        let aligned = start % align_of::<T>() == 0;
        if bytes == 0 {
            return aligned;
        }
        aligned && start >= base && start.checked_add(bytes).is_some_and(|end| end <= base + size)
    }

    #[inline]
    unsafe fn slot(self, index: usize) -> *mut T {
        // SAFETY: `index` is within the capacity.
        unsafe { self.ptr.as_ptr().add(index) }
    }

    /// Construct row `index`.
    #[inline]
    pub unsafe fn write(self, index: usize, value: T) {
        // SAFETY: the slot is uninitialized and in bounds.
        unsafe { ptr::write(self.slot(index), value) }
    }

    /// Move row `index` out, leaving the slot uninitialized.
    #[inline]
    pub unsafe fn read(self, index: usize) -> T {
        // SAFETY: the slot is live and in bounds.
        unsafe { ptr::read(self.slot(index)) }
    }

    /// Swap the live row `index` with `value`.
    #[inline]
    pub unsafe fn replace(self, index: usize, value: T) -> T {
        // SAFETY: the slot is live and in bounds.
        unsafe { ptr::replace(self.slot(index), value) }
    }

    /// Shared reference to the live row `index`.
    #[inline]
    pub unsafe fn get<'a>(self, index: usize) -> &'a T {
        // SAFETY: the slot is live; the caller ties `'a` to a borrow of the
        // owning container.
        unsafe { &*self.slot(index) }
    }

    /// Exclusive reference to the live row `index`.
    #[inline]
    pub unsafe fn get_mut<'a>(self, index: usize) -> &'a mut T {
        // SAFETY: as for `get`, with an exclusive borrow.
        unsafe { &mut *self.slot(index) }
    }

    /// The live rows `[0, len)` as a slice.
    #[inline]
    pub unsafe fn as_slice<'a>(self, len: usize) -> &'a [T] {
        // SAFETY: rows `[0, len)` are live and contiguous.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), len) }
    }

    /// The live rows `[0, len)` as a mutable slice.
    #[inline]
    pub unsafe fn as_mut_slice<'a>(self, len: usize) -> &'a mut [T] {
        // SAFETY: rows `[0, len)` are live and contiguous.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), len) }
    }

    /// Relocate the live rows `[begin, end)` into another column starting at
    /// `dest_begin`. The source rows become uninitialized.
    ///
    /// The two ranges must not overlap; this is used only between two
    /// storage generations.
    #[inline]
    pub unsafe fn move_and_destroy(self, begin: usize, end: usize, dest: Self, dest_begin: usize) {
        debug_assert!(begin <= end);
        // SAFETY: distinct allocations, both ranges in bounds.
        unsafe { ptr::copy_nonoverlapping(self.slot(begin), dest.slot(dest_begin), end - begin) }
    }

    /// Move `count` rows from `from` to `to` within this column. The ranges
    /// may overlap; rows of the source not covered by the destination
    /// become uninitialized.
    #[inline]
    pub unsafe fn shift(self, from: usize, to: usize, count: usize) {
        // SAFETY: both ranges are in bounds.
        unsafe { ptr::copy(self.slot(from), self.slot(to), count) }
    }

    /// Drop the live rows `[begin, end)`.
    #[inline]
    pub unsafe fn drop_range(self, begin: usize, end: usize) {
        debug_assert!(begin <= end);
        // SAFETY: the rows are live and are not used again.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.slot(begin), end - begin));
        }
    }

    /// Shift `[pos, len)` right by one and move `value` into `pos`.
    pub unsafe fn insert_one(self, pos: usize, len: usize, value: T) {
        // SAFETY: row `len` is uninitialized capacity.
        unsafe {
            self.shift(pos, pos + 1, len - pos);
            self.write(pos, value);
        }
    }

    /// Drop `[first, last)` and close the gap with the rows `[last, len)`.
    pub unsafe fn erase(self, first: usize, last: usize, len: usize) {
        // SAFETY: the erased rows are dropped before being overwritten.
        unsafe {
            self.drop_range(first, last);
            self.shift(last, first, len - last);
        }
    }

    /// Move row `pos` out and fill its slot with the last row.
    pub unsafe fn swap_remove(self, pos: usize, len: usize) -> T {
        // SAFETY: `pos < len`; row `len - 1` becomes uninitialized.
        unsafe {
            let removed = self.read(pos);
            if pos != len - 1 {
                ptr::copy_nonoverlapping(self.slot(len - 1), self.slot(pos), 1);
            }
            removed
        }
    }

    /// Move row `pos` out and close the gap, preserving order.
    pub unsafe fn remove(self, pos: usize, len: usize) -> T {
        // SAFETY: `pos < len`; row `len - 1` becomes uninitialized.
        unsafe {
            let removed = self.read(pos);
            self.shift(pos + 1, pos, len - pos - 1);
            removed
        }
    }

    /// Rotate the live rows `[begin, end)` left by `mid`.
    pub unsafe fn rotate_left(self, begin: usize, end: usize, mid: usize) {
        // SAFETY: the rows are live.
        unsafe { slice::from_raw_parts_mut(self.slot(begin), end - begin).rotate_left(mid) }
    }

    /// Swap two live rows.
    #[inline]
    pub unsafe fn swap(self, a: usize, b: usize) {
        // SAFETY: both rows are live; `ptr::swap` allows `a == b`.
        unsafe { ptr::swap(self.slot(a), self.slot(b)) }
    }
}

impl<T: Clone> Column<T> {
    /// Construct `n` clones of `value` at `[begin, begin + n)`.
    pub unsafe fn fill(self, begin: usize, n: usize, value: &T) {
        for index in begin..begin + n {
            // SAFETY: the slots are uninitialized and in bounds.
            unsafe { self.write(index, value.clone()) };
        }
    }

    /// Construct clones of `src[src_begin..src_begin + n]` at
    /// `[dest_begin, dest_begin + n)`.
    pub unsafe fn clone_from_column(self, dest_begin: usize, src: Self, src_begin: usize, n: usize) {
        for k in 0..n {
            // SAFETY: source rows are live, destination rows uninitialized.
            unsafe { self.write(dest_begin + k, src.get(src_begin + k).clone()) };
        }
    }

    /// Shift `[pos, len)` right by `n` and fill the gap with clones of
    /// `value`.
    pub unsafe fn insert_and_fill(self, pos: usize, n: usize, len: usize, value: &T) {
        // SAFETY: rows `[len, len + n)` are uninitialized capacity.
        unsafe {
            self.shift(pos, pos + n, len - pos);
            self.fill(pos, n, value);
        }
    }

    /// Shift `[pos, len)` right by `n` and fill the gap with clones of
    /// `src[src_begin..src_begin + n]`.
    ///
    /// `src` must be a different column from `self`.
    pub unsafe fn insert_range(self, pos: usize, n: usize, len: usize, src: Self, src_begin: usize) {
        // SAFETY: as for `insert_and_fill`.
        unsafe {
            self.shift(pos, pos + n, len - pos);
            self.clone_from_column(pos, src, src_begin, n);
        }
    }
}
