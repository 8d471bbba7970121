// tuplevec - tuplevec
// Module: Growable structure-of-arrays container
// SW-REQ-ID: REQ_SOA_STORAGE_002
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! [`TupleVec`]: a growable sequence of records stored column by column.
//!
//! Every column lives in the same block. The block is replaced as a whole
//! when the container grows: the new block is requested first, the live rows
//! are relocated, and only then is the old block released. A failed request
//! therefore leaves rows, length and capacity untouched.
//!
//! # Growth
//!
//! Appending and inserting beyond the capacity request
//! `max(2 * capacity, required)` rows (1 for an empty container).
//! [`reserve`](TupleVec::reserve) and [`assign`](TupleVec::assign) request
//! exactly what they need; [`shrink_to_fit`](TupleVec::shrink_to_fit)
//! always rebuilds the block at the current length.
//!
//! # Panics
//!
//! Out-of-range indices and ranges are contract violations and panic with a
//! message naming the operation. Allocation failure is reported as an
//! [`Error`].
//!
//! # Examples
//!
//! ```
//! use tuplevec::TupleVec;
//!
//! let mut particles: TupleVec<(u32, f32, bool)> = TupleVec::new();
//! particles.push((1, 0.5, true))?;
//! particles.push((2, 1.5, false))?;
//!
//! // Each column is one contiguous slice.
//! let (ids, speeds, alive) = particles.as_slices();
//! assert_eq!(ids, &[1, 2]);
//! assert_eq!(speeds, &[0.5, 1.5]);
//! assert_eq!(alive, &[true, false]);
//!
//! // Rows are tuples of references.
//! for (id, speed, _) in &particles {
//!     assert!(*speed > 0.0 && *id > 0);
//! }
//! # Ok::<(), tuplevec::Error>(())
//! ```

#![allow(unsafe_code)]

use core::{
    cmp::Ordering,
    fmt,
    marker::PhantomData,
    mem,
    ops::{Bound, Range, RangeBounds},
};

use tuplevec_alloc::{Allocator, HeapAllocator};
use tuplevec_error::{Error, Result};

#[cfg(feature = "tracing")]
use crate::trace::StorageTrace;
use crate::{
    fields::{CloneFields, ColumnAt, ColumnOf, DebugFields, EqFields, Fields, OrdFields},
    iter::{IntoIter, Iter, IterMut},
    raw::RawStorage,
};

/// Growable container of records `F = (T0, T1, ..)` stored as one column
/// per field, all columns sharing a single allocation from `A`.
pub struct TupleVec<F: Fields, A: Allocator = HeapAllocator> {
    pub(crate) raw:   RawStorage<F>,
    pub(crate) len:   usize,
    pub(crate) alloc: A,
    _marker:          PhantomData<F>,
}

impl<F: Fields> TupleVec<F> {
    /// Empty container on the heap. Does not allocate.
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(HeapAllocator::with_name(crate::DEFAULT_NAME))
    }

    /// Empty container on the heap with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_capacity_in(capacity, HeapAllocator::with_name(crate::DEFAULT_NAME))
    }

    /// `n` clones of `value`.
    pub fn from_elem(n: usize, value: &F) -> Result<Self>
    where
        F: CloneFields,
    {
        Self::from_elem_in(n, value, HeapAllocator::with_name(crate::DEFAULT_NAME))
    }

    /// `n` default rows.
    pub fn from_default(n: usize) -> Result<Self>
    where
        F: Default,
    {
        Self::from_default_in(n, HeapAllocator::with_name(crate::DEFAULT_NAME))
    }

    /// Rows of an iterator, in order.
    pub fn try_from_iter<I: IntoIterator<Item = F>>(rows: I) -> Result<Self> {
        Self::try_from_iter_in(rows, HeapAllocator::with_name(crate::DEFAULT_NAME))
    }

    /// Rows of a literal array, in order.
    pub fn from_rows<const N: usize>(rows: [F; N]) -> Result<Self> {
        Self::try_from_iter(rows)
    }
}

impl<F: Fields, A: Allocator> TupleVec<F, A> {
    // ---- construction ----

    /// Empty container using `alloc`. Does not allocate.
    pub fn new_in(alloc: A) -> Self {
        Self::from_raw_parts(RawStorage::empty(), 0, alloc)
    }

    /// Empty container using `alloc` with room for `capacity` rows.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self> {
        let raw = RawStorage::allocate(&alloc, capacity)?;
        Ok(Self::from_raw_parts(raw, 0, alloc))
    }

    /// `n` clones of `value` using `alloc`.
    pub fn from_elem_in(n: usize, value: &F, alloc: A) -> Result<Self>
    where
        F: CloneFields,
    {
        let mut vec = Self::with_capacity_in(n, alloc)?;
        // SAFETY: rows `[0, n)` are uninitialized capacity.
        unsafe { F::fill(vec.raw.columns(), 0, n, value) };
        vec.len = n;
        Ok(vec)
    }

    /// `n` default rows using `alloc`.
    pub fn from_default_in(n: usize, alloc: A) -> Result<Self>
    where
        F: Default,
    {
        let mut vec = Self::with_capacity_in(n, alloc)?;
        vec.fill_default(n);
        Ok(vec)
    }

    /// Rows of an iterator using `alloc`.
    pub fn try_from_iter_in<I: IntoIterator<Item = F>>(rows: I, alloc: A) -> Result<Self> {
        let rows = rows.into_iter();
        let mut vec = Self::with_capacity_in(rows.size_hint().0, alloc)?;
        vec.extend_rows(rows)?;
        Ok(vec)
    }

    /// Rows of a literal array using `alloc`.
    pub fn from_rows_in<const N: usize>(rows: [F; N], alloc: A) -> Result<Self> {
        Self::try_from_iter_in(rows, alloc)
    }

    pub(crate) fn from_raw_parts(raw: RawStorage<F>, len: usize, alloc: A) -> Self {
        debug_assert!(len <= raw.capacity());
        Self {
            raw,
            len,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Clone every row into a new container with a clone of the allocator.
    pub fn try_clone(&self) -> Result<Self>
    where
        F: CloneFields,
        A: Clone,
    {
        self.try_clone_in(self.alloc.clone())
    }

    /// Clone every row into a new container using `alloc`.
    pub fn try_clone_in<B: Allocator>(&self, alloc: B) -> Result<TupleVec<F, B>>
    where
        F: CloneFields,
    {
        let mut clone = TupleVec::with_capacity_in(self.len, alloc)?;
        // SAFETY: the source rows are live; the destination has room for them.
        unsafe { F::clone_range(clone.raw.columns(), 0, self.raw.columns(), 0, self.len) };
        clone.len = self.len;
        Ok(clone)
    }

    /// Move every row into a new block from a different allocator.
    ///
    /// On error the rows are dropped together with `self`.
    pub fn rebind<B: Allocator>(mut self, alloc: B) -> Result<TupleVec<F, B>> {
        #[cfg(feature = "tracing")]
        let _span = StorageTrace::rebinding(self.alloc.name(), alloc.name(), self.len).entered();
        let mut target = TupleVec::with_capacity_in(self.len, alloc)?;
        // SAFETY: distinct blocks; the source rows are given up by setting
        // the source length to 0 right after.
        unsafe { F::relocate(self.raw.columns(), 0, self.len, target.raw.columns(), 0) };
        target.len = mem::replace(&mut self.len, 0);
        Ok(target)
    }

    /// Move the container under `alloc`.
    ///
    /// When `alloc` compares equal to the current allocator the block is
    /// kept; otherwise every row is moved into a new block from `alloc`.
    pub fn move_with_allocator(mut self, alloc: A) -> Result<Self>
    where
        A: PartialEq,
    {
        if self.alloc == alloc {
            self.alloc = alloc;
            Ok(self)
        } else {
            self.rebind(alloc)
        }
    }

    // ---- size and capacity ----

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the container holds no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of rows the current block holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// The allocator.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Rename the allocator for diagnostics.
    pub fn set_allocator_name(&mut self, name: &'static str) {
        self.alloc.set_name(name);
    }

    /// Grow the capacity to exactly `capacity` rows if it is smaller.
    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        if capacity > self.capacity() {
            self.reallocate(capacity)?;
        }
        Ok(())
    }

    /// Rebuild the block with room for exactly the current rows.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        storage_event!(debug, allocator = self.alloc.name(), from = self.capacity(), to = self.len, "shrinking");
        self.reallocate(self.len)
    }

    /// Exchange contents and allocators with `other`. Never allocates.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    // ---- appending and inserting ----

    /// Append one row.
    pub fn push(&mut self, row: F) -> Result<()> {
        if self.len == self.capacity() {
            self.grow_for(1)?;
        }
        // SAFETY: row `len` is uninitialized capacity.
        unsafe { F::write(self.raw.columns(), self.len, row) };
        self.len += 1;
        Ok(())
    }

    /// Append a default row and return it for in-place editing.
    pub fn push_default(&mut self) -> Result<F::Mut<'_>>
    where
        F: Default,
    {
        self.push(F::default())?;
        // SAFETY: the row was just constructed; the borrow of `self` covers
        // the returned references.
        Ok(unsafe { F::get_mut(self.raw.columns(), self.len - 1) })
    }

    /// Insert one row at `index`, shifting later rows back.
    ///
    /// Returns `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, row: F) -> Result<usize> {
        self.assert_insert_index(index);
        let len = self.len;
        if len == self.capacity() {
            self.reallocate_with_gap(index, 1)?;
            // SAFETY: row `index` is the gap.
            unsafe { F::write(self.raw.columns(), index, row) };
        } else {
            // SAFETY: row `len` is uninitialized capacity.
            unsafe { F::insert_one(self.raw.columns(), index, len, row) };
        }
        self.len = len + 1;
        Ok(index)
    }

    /// Insert `n` clones of `value` at `index`.
    ///
    /// Returns the index of the first inserted row.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_n(&mut self, index: usize, n: usize, value: &F) -> Result<usize>
    where
        F: CloneFields,
    {
        self.assert_insert_index(index);
        if n == 0 {
            return Ok(index);
        }
        let len = self.len;
        let new_len = len.checked_add(n).ok_or(Error::CAPACITY_OVERFLOW)?;
        if new_len > self.capacity() {
            self.reallocate_with_gap(index, n)?;
            // SAFETY: `[index, index + n)` is the gap.
            unsafe { F::fill(self.raw.columns(), index, n, value) };
        } else {
            self.len = index;
            // SAFETY: `[len, new_len)` is uninitialized capacity.
            unsafe { F::insert_and_fill(self.raw.columns(), index, n, len, value) };
        }
        self.len = new_len;
        Ok(index)
    }

    /// Insert clones of the rows `range` of `src` at `index`.
    ///
    /// Returns the index of the first inserted row.
    ///
    /// # Panics
    ///
    /// Panics if `index > len` or `range` is out of bounds for `src`.
    pub fn insert_from<B, R>(&mut self, index: usize, src: &TupleVec<F, B>, range: R) -> Result<usize>
    where
        F: CloneFields,
        B: Allocator,
        R: RangeBounds<usize>,
    {
        self.assert_insert_index(index);
        let Range { start, end } = resolve_range(range, src.len);
        let n = end - start;
        if n == 0 {
            return Ok(index);
        }
        let len = self.len;
        let new_len = len.checked_add(n).ok_or(Error::CAPACITY_OVERFLOW)?;
        if new_len > self.capacity() {
            self.reallocate_with_gap(index, n)?;
            // SAFETY: `[index, index + n)` is the gap; the source rows are live.
            unsafe { F::clone_range(self.raw.columns(), index, src.raw.columns(), start, n) };
        } else {
            self.len = index;
            // SAFETY: `src` is a different container, so the columns differ.
            unsafe { F::insert_range(self.raw.columns(), index, n, len, src.raw.columns(), start) };
        }
        self.len = new_len;
        Ok(index)
    }

    /// Insert the rows of an iterator at `index`, in order.
    ///
    /// Iterators with an exact size hint open a gap once; others are
    /// appended and rotated into place. On error the container holds the
    /// same rows as before.
    ///
    /// Returns the index of the first inserted row.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_iter<I: IntoIterator<Item = F>>(&mut self, index: usize, rows: I) -> Result<usize> {
        self.assert_insert_index(index);
        let rows = rows.into_iter();
        match rows.size_hint() {
            (lower, Some(upper)) if lower == upper => self.insert_exact(index, lower, rows),
            (lower, _) => self.insert_by_rotation(index, lower, rows),
        }
    }

    /// Append the rows of an iterator. On error the container holds the same
    /// rows as before.
    pub fn extend_rows<I: IntoIterator<Item = F>>(&mut self, rows: I) -> Result<()> {
        self.insert_iter(self.len, rows).map(|_| ())
    }

    fn insert_exact<I: Iterator<Item = F>>(&mut self, index: usize, n: usize, mut rows: I) -> Result<usize> {
        if n == 0 {
            return Ok(index);
        }
        let len = self.len;
        let new_len = len.checked_add(n).ok_or(Error::CAPACITY_OVERFLOW)?;
        if new_len > self.capacity() {
            self.reallocate_with_gap(index, n)?;
        } else {
            self.len = index;
            // SAFETY: `[len, new_len)` is uninitialized capacity.
            unsafe { F::shift(self.raw.columns(), index, index + n, len - index) };
        }
        let columns = *self.raw.columns();
        let mut written = 0;
        for row in rows.by_ref().take(n) {
            // SAFETY: `index + written` lies in the gap.
            unsafe { F::write(&columns, index + written, row) };
            written += 1;
        }
        if written < n {
            // The iterator yielded less than it promised.
            // SAFETY: closes the unfilled part of the gap.
            unsafe { F::shift(&columns, index + n, index + written, len - index) };
        }
        self.len = len + written;
        Ok(index)
    }

    fn insert_by_rotation<I: Iterator<Item = F>>(
        &mut self,
        index: usize,
        lower: usize,
        rows: I,
    ) -> Result<usize> {
        let old_len = self.len;
        let required = old_len.checked_add(lower).ok_or(Error::CAPACITY_OVERFLOW)?;
        if required > self.capacity() {
            self.grow_for(lower)?;
        }
        for row in rows {
            if let Err(error) = self.push(row) {
                self.truncate(old_len);
                return Err(error);
            }
        }
        // SAFETY: rows `[index, len)` are live.
        unsafe { F::rotate_left(self.raw.columns(), index, self.len, old_len - index) };
        Ok(index)
    }

    // ---- removing ----

    /// Remove the rows `range`, preserving the order of the rest.
    ///
    /// Returns the index of the first row after the removed ones.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds.
    pub fn erase<R: RangeBounds<usize>>(&mut self, range: R) -> usize {
        let Range { start, end } = resolve_range(range, self.len);
        if start == end {
            return start;
        }
        let len = self.len;
        self.len = start;
        // SAFETY: `[start, end)` are live and dropped; `[end, len)` close the gap.
        unsafe { F::erase(self.raw.columns(), start, end, len) };
        self.len = len - (end - start);
        start
    }

    /// Remove and return row `index`, preserving the order of the rest.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> F {
        let len = self.len;
        assert!(index < len, "removal index (is {index}) should be < len (is {len})");
        // SAFETY: `index` is live; the last slot becomes uninitialized.
        let row = unsafe { F::remove(self.raw.columns(), index, len) };
        self.len = len - 1;
        row
    }

    /// Remove and return row `index`, moving the last row into its place.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn swap_remove(&mut self, index: usize) -> F {
        let len = self.len;
        assert!(index < len, "swap_remove index (is {index}) should be < len (is {len})");
        // SAFETY: `index` is live; the last slot becomes uninitialized.
        let row = unsafe { F::swap_remove(self.raw.columns(), index, len) };
        self.len = len - 1;
        row
    }

    /// Drop row `index` and move the last row into its place.
    ///
    /// Returns `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn erase_unsorted(&mut self, index: usize) -> usize {
        drop(self.swap_remove(index));
        index
    }

    /// Remove and return the last row.
    pub fn pop(&mut self) -> Option<F> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the former last row is live and no longer counted.
        Some(unsafe { F::read(self.raw.columns(), self.len) })
    }

    /// Drop the rows from `len` on. Capacity is kept.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let old_len = mem::replace(&mut self.len, len);
        // SAFETY: `[len, old_len)` are live and no longer counted.
        unsafe { F::drop_range(self.raw.columns(), len, old_len) };
    }

    /// Drop every row. Capacity is kept.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Forget every row without dropping it. Capacity is kept.
    ///
    /// Intended for rows without drop glue, or storage whose rows are owned
    /// elsewhere.
    pub fn reset_lose_memory(&mut self) {
        self.len = 0;
    }

    // ---- replacing contents ----

    /// Replace the contents with `n` clones of `value`.
    ///
    /// Needing more than the capacity requests a block for exactly `n` rows
    /// before any row is dropped.
    pub fn assign(&mut self, n: usize, value: &F) -> Result<()>
    where
        F: CloneFields,
    {
        self.prepare_assign(n)?;
        // SAFETY: the container is empty and holds at least `n` rows.
        unsafe { F::fill(self.raw.columns(), 0, n, value) };
        self.len = n;
        Ok(())
    }

    /// Replace the contents with the rows of an iterator.
    ///
    /// Needing more than the capacity for an exactly sized iterator requests
    /// the new block before any row is dropped. Other iterators are appended
    /// after the old rows, which are only dropped once every new row is in.
    /// On error the container holds the same rows as before.
    pub fn assign_iter<I: IntoIterator<Item = F>>(&mut self, rows: I) -> Result<()> {
        let rows = rows.into_iter();
        match rows.size_hint() {
            (lower, Some(upper)) if lower == upper => {
                self.prepare_assign(lower)?;
                self.extend_rows(rows)
            }
            _ => {
                let old_len = self.len;
                self.extend_rows(rows)?;
                self.erase(..old_len);
                Ok(())
            }
        }
    }

    /// Replace the contents with clones of the rows `range` of `src`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds for `src`.
    pub fn assign_range<B, R>(&mut self, src: &TupleVec<F, B>, range: R) -> Result<()>
    where
        F: CloneFields,
        B: Allocator,
        R: RangeBounds<usize>,
    {
        let Range { start, end } = resolve_range(range, src.len);
        let n = end - start;
        self.prepare_assign(n)?;
        // SAFETY: the container is empty and holds at least `n` rows.
        unsafe { F::clone_range(self.raw.columns(), 0, src.raw.columns(), start, n) };
        self.len = n;
        Ok(())
    }

    /// Empty the container and make room for exactly `n` rows if needed.
    fn prepare_assign(&mut self, n: usize) -> Result<()> {
        if n > self.capacity() {
            let raw = RawStorage::allocate(&self.alloc, n)?;
            self.clear();
            self.replace_storage(raw);
        } else {
            self.clear();
        }
        Ok(())
    }

    /// Grow with clones of `value` or shrink to `n` rows.
    pub fn resize(&mut self, n: usize, value: &F) -> Result<()>
    where
        F: CloneFields,
    {
        if n > self.len {
            self.insert_n(self.len, n - self.len, value)?;
        } else {
            self.truncate(n);
        }
        Ok(())
    }

    /// Grow with default rows or shrink to `n` rows.
    pub fn resize_default(&mut self, n: usize) -> Result<()>
    where
        F: Default,
    {
        if n > self.len {
            self.grow_for(n - self.len)?;
            self.fill_default(n);
        } else {
            self.truncate(n);
        }
        Ok(())
    }

    fn fill_default(&mut self, n: usize)
    where
        F: Default,
    {
        debug_assert!(n <= self.capacity());
        while self.len < n {
            // SAFETY: row `len` is uninitialized capacity.
            unsafe { F::write(self.raw.columns(), self.len, F::default()) };
            self.len += 1;
        }
    }

    /// Swap the contents of row `index` with `row` and return the old row.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn replace(&mut self, index: usize, row: F) -> F {
        self.assert_index(index);
        // SAFETY: `index` is live.
        unsafe { F::replace(self.raw.columns(), index, row) }
    }

    // ---- access ----

    /// Row `index`, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<F::Ref<'_>> {
        // SAFETY: `index` is live.
        (index < self.len).then(|| unsafe { F::get(self.raw.columns(), index) })
    }

    /// Row `index` for editing, or `None` if out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<F::Mut<'_>> {
        // SAFETY: `index` is live and `self` is borrowed exclusively.
        (index < self.len).then(|| unsafe { F::get_mut(self.raw.columns(), index) })
    }

    /// Row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn at(&self, index: usize) -> F::Ref<'_> {
        self.assert_index(index);
        // SAFETY: `index` is live.
        unsafe { F::get(self.raw.columns(), index) }
    }

    /// Row `index` for editing.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    #[track_caller]
    pub fn at_mut(&mut self, index: usize) -> F::Mut<'_> {
        self.assert_index(index);
        // SAFETY: `index` is live and `self` is borrowed exclusively.
        unsafe { F::get_mut(self.raw.columns(), index) }
    }

    /// First row.
    pub fn first(&self) -> Option<F::Ref<'_>> {
        self.get(0)
    }

    /// Last row.
    pub fn last(&self) -> Option<F::Ref<'_>> {
        self.len.checked_sub(1).and_then(|index| self.get(index))
    }

    /// First row for editing.
    pub fn first_mut(&mut self) -> Option<F::Mut<'_>> {
        self.get_mut(0)
    }

    /// Last row for editing.
    pub fn last_mut(&mut self) -> Option<F::Mut<'_>> {
        let index = self.len.checked_sub(1)?;
        self.get_mut(index)
    }

    /// Every column as a slice over the live rows.
    pub fn as_slices(&self) -> F::Slices<'_> {
        // SAFETY: rows `[0, len)` are live.
        unsafe { F::slices(self.raw.columns(), self.len) }
    }

    /// Every column as a mutable slice over the live rows.
    pub fn as_mut_slices(&mut self) -> F::SlicesMut<'_> {
        // SAFETY: rows `[0, len)` are live and `self` is borrowed exclusively.
        unsafe { F::slices_mut(self.raw.columns(), self.len) }
    }

    /// Column `I` as a slice.
    pub fn column<const I: usize>(&self) -> &[<F as ColumnAt<I>>::Type]
    where
        F: ColumnAt<I>,
    {
        // SAFETY: rows `[0, len)` are live.
        unsafe { F::column(self.raw.columns()).as_slice(self.len) }
    }

    /// Column `I` as a mutable slice.
    pub fn column_mut<const I: usize>(&mut self) -> &mut [<F as ColumnAt<I>>::Type]
    where
        F: ColumnAt<I>,
    {
        // SAFETY: rows `[0, len)` are live and `self` is borrowed exclusively.
        unsafe { F::column(self.raw.columns()).as_mut_slice(self.len) }
    }

    /// Pointer to the first row of column `I`.
    ///
    /// Dangling, but aligned, while the container has no block.
    pub fn column_ptr<const I: usize>(&self) -> *const <F as ColumnAt<I>>::Type
    where
        F: ColumnAt<I>,
    {
        F::column(self.raw.columns()).as_ptr()
    }

    /// Mutable pointer to the first row of column `I`.
    pub fn column_mut_ptr<const I: usize>(&mut self) -> *mut <F as ColumnAt<I>>::Type
    where
        F: ColumnAt<I>,
    {
        F::column(self.raw.columns()).as_ptr()
    }

    /// The column of type `T` as a slice.
    ///
    /// Only compiles when `T` occurs once in `F`.
    ///
    /// ```
    /// use tuplevec::TupleVec;
    ///
    /// let names = TupleVec::from_rows([(7u32, 'a'), (9, 'b')])?;
    /// assert_eq!(names.column_of::<char, _>(), &['a', 'b']);
    /// # Ok::<(), tuplevec::Error>(())
    /// ```
    pub fn column_of<T, I>(&self) -> &[T]
    where
        F: ColumnOf<T, I>,
    {
        // SAFETY: rows `[0, len)` are live.
        unsafe { F::column_of(self.raw.columns()).as_slice(self.len) }
    }

    /// The column of type `T` as a mutable slice.
    pub fn column_of_mut<T, I>(&mut self) -> &mut [T]
    where
        F: ColumnOf<T, I>,
    {
        // SAFETY: rows `[0, len)` are live and `self` is borrowed exclusively.
        unsafe { F::column_of(self.raw.columns()).as_mut_slice(self.len) }
    }

    /// Iterator over the rows.
    pub fn iter(&self) -> Iter<'_, F> {
        // SAFETY: the borrow of `self` keeps the rows unchanged.
        unsafe { Iter::new(*self.raw.columns(), self.len) }
    }

    /// Iterator over the rows for editing.
    pub fn iter_mut(&mut self) -> IterMut<'_, F> {
        // SAFETY: `self` is borrowed exclusively for the iterator's lifetime.
        unsafe { IterMut::new(*self.raw.columns(), self.len) }
    }

    /// Check the internal invariants: the row count fits the capacity and
    /// every column lies inside the block.
    pub fn validate(&self) -> Result<()> {
        if self.len > self.capacity() {
            return Err(Error::integrity_violation("row count exceeds capacity"));
        }
        if !self.raw.is_consistent() {
            return Err(Error::integrity_violation("column outside its allocation"));
        }
        Ok(())
    }

    // ---- storage generations ----

    /// Grow so that `additional` more rows fit, following the growth policy.
    fn grow_for(&mut self, additional: usize) -> Result<()> {
        let required = self.len.checked_add(additional).ok_or(Error::CAPACITY_OVERFLOW)?;
        if required > self.capacity() {
            self.reallocate(grow_capacity(self.capacity(), required))?;
        }
        Ok(())
    }

    /// Move every row into a new block of exactly `capacity` rows.
    fn reallocate(&mut self, capacity: usize) -> Result<()> {
        debug_assert!(capacity >= self.len);
        #[cfg(feature = "tracing")]
        let _span =
            StorageTrace::reallocating(self.alloc.name(), self.capacity(), capacity, self.len).entered();
        let raw = RawStorage::allocate(&self.alloc, capacity)?;
        self.replace_storage(raw);
        Ok(())
    }

    /// Install `raw` as the storage, relocating the live rows into it and
    /// releasing the previous block.
    pub(crate) fn replace_storage(&mut self, raw: RawStorage<F>) {
        debug_assert!(raw.capacity() >= self.len);
        let old = mem::replace(&mut self.raw, raw);
        // SAFETY: rows `[0, len)` are live in `old`, the new storage is a
        // different block with room for them, and `old` came from `alloc`.
        unsafe {
            F::relocate(old.columns(), 0, self.len, self.raw.columns(), 0);
            old.release(&self.alloc);
        }
    }

    /// Move every row into a larger block leaving the rows
    /// `[index, index + n)` uninitialized.
    ///
    /// On return `len` is `index`; the caller constructs the gap and then
    /// sets the full length.
    fn reallocate_with_gap(&mut self, index: usize, n: usize) -> Result<()> {
        let len = self.len;
        let required = len.checked_add(n).ok_or(Error::CAPACITY_OVERFLOW)?;
        let capacity = grow_capacity(self.capacity(), required);
        #[cfg(feature = "tracing")]
        let _span = StorageTrace::reallocating(self.alloc.name(), self.capacity(), capacity, len).entered();
        let raw = RawStorage::allocate(&self.alloc, capacity)?;
        let old = mem::replace(&mut self.raw, raw);
        self.len = index;
        // SAFETY: as in `replace_storage`, with the tail placed after the gap.
        unsafe {
            F::relocate(old.columns(), 0, index, self.raw.columns(), 0);
            F::relocate(old.columns(), index, len, self.raw.columns(), index + n);
            old.release(&self.alloc);
        }
        Ok(())
    }

    #[track_caller]
    fn assert_index(&self, index: usize) {
        let len = self.len;
        assert!(index < len, "index out of bounds: the len is {len} but the index is {index}");
    }

    #[track_caller]
    fn assert_insert_index(&self, index: usize) {
        let len = self.len;
        assert!(index <= len, "insertion index (is {index}) should be <= len (is {len})");
    }
}

/// Capacity requested when `required` rows no longer fit in `capacity`.
#[inline]
fn grow_capacity(capacity: usize, required: usize) -> usize {
    let grown = if capacity > 0 { capacity.saturating_mul(2) } else { 1 };
    grown.max(required)
}

#[track_caller]
fn resolve_range<R: RangeBounds<usize>>(range: R, len: usize) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start
            .checked_add(1)
            .unwrap_or_else(|| panic!("attempted to index from after usize::MAX")),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&end) => end
            .checked_add(1)
            .unwrap_or_else(|| panic!("attempted to index up to usize::MAX")),
        Bound::Excluded(&end) => end,
        Bound::Unbounded => len,
    };
    assert!(start <= end, "range start index {start} should be <= range end index {end}");
    assert!(end <= len, "range end index {end} out of range for length {len}");
    start..end
}

impl<F: Fields, A: Allocator> Drop for TupleVec<F, A> {
    fn drop(&mut self) {
        let len = mem::replace(&mut self.len, 0);
        let raw = mem::replace(&mut self.raw, RawStorage::empty());
        // SAFETY: rows `[0, len)` are live; the block came from `alloc`.
        unsafe {
            F::drop_range(raw.columns(), 0, len);
            raw.release(&self.alloc);
        }
    }
}

impl<F: Fields, A: Allocator + Default> Default for TupleVec<F, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<F: EqFields, A: Allocator, B: Allocator> PartialEq<TupleVec<F, B>> for TupleVec<F, A> {
    fn eq(&self, other: &TupleVec<F, B>) -> bool {
        self.len == other.len
            // SAFETY: both rows are live.
            && (0..self.len).all(|i| unsafe { F::row_eq(self.raw.columns(), i, other.raw.columns(), i) })
    }
}

impl<F: EqFields + Eq, A: Allocator> Eq for TupleVec<F, A> {}

impl<F: OrdFields, A: Allocator, B: Allocator> PartialOrd<TupleVec<F, B>> for TupleVec<F, A> {
    fn partial_cmp(&self, other: &TupleVec<F, B>) -> Option<Ordering> {
        for i in 0..self.len.min(other.len) {
            // SAFETY: both rows are live.
            match unsafe { F::row_partial_cmp(self.raw.columns(), i, other.raw.columns(), i) } {
                Some(Ordering::Equal) => {}
                ordering => return ordering,
            }
        }
        self.len.partial_cmp(&other.len)
    }
}

struct RowDebug<'a, F: Fields> {
    columns: &'a F::Columns,
    index:   usize,
}

impl<F: DebugFields> fmt::Debug for RowDebug<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: only built for live rows.
        unsafe { F::fmt_row(self.columns, self.index, f) }
    }
}

impl<F: DebugFields, A: Allocator> fmt::Debug for TupleVec<F, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self.raw.columns();
        f.debug_list()
            .entries((0..self.len).map(|index| RowDebug::<F> { columns, index }))
            .finish()
    }
}

impl<F: Fields, A: Allocator> IntoIterator for TupleVec<F, A> {
    type Item = F;
    type IntoIter = IntoIter<F, A>;

    fn into_iter(self) -> IntoIter<F, A> {
        IntoIter::new(self)
    }
}

impl<'a, F: Fields + 'a, A: Allocator> IntoIterator for &'a TupleVec<F, A> {
    type Item = F::Ref<'a>;
    type IntoIter = Iter<'a, F>;

    fn into_iter(self) -> Iter<'a, F> {
        self.iter()
    }
}

impl<'a, F: Fields + 'a, A: Allocator> IntoIterator for &'a mut TupleVec<F, A> {
    type Item = F::Mut<'a>;
    type IntoIter = IterMut<'a, F>;

    fn into_iter(self) -> IterMut<'a, F> {
        self.iter_mut()
    }
}

// SAFETY: the container owns its rows and its block like `Vec<F>` does.
unsafe impl<F: Fields + Send, A: Allocator + Send> Send for TupleVec<F, A> {}
// SAFETY: shared access only reads rows.
unsafe impl<F: Fields + Sync, A: Allocator + Sync> Sync for TupleVec<F, A> {}

// ============ KANI Formal Verification ============

#[cfg(kani)]
mod verification {
    use super::*;

    /// The row count never exceeds the capacity across pushes and pops.
    #[kani::proof]
    #[kani::unwind(6)]
    fn verify_len_within_capacity() {
        let mut vec: TupleVec<(u8, u16)> = TupleVec::new();
        let pushes: usize = kani::any();
        kani::assume(pushes <= 4);
        for i in 0..pushes {
            if vec.push((i as u8, i as u16)).is_err() {
                return;
            }
            assert!(vec.len() <= vec.capacity());
        }
        let _ = vec.pop();
        assert!(vec.len() <= vec.capacity());
        assert!(vec.validate().is_ok());
    }

    /// Growth always satisfies the request.
    #[kani::proof]
    fn verify_grow_capacity() {
        let capacity: usize = kani::any();
        let required: usize = kani::any();
        kani::assume(required > capacity);
        let grown = grow_capacity(capacity, required);
        assert!(grown >= required);
        assert!(grown >= 1);
    }
}
