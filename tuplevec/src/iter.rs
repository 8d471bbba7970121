// tuplevec - tuplevec
// Module: Row iterators
// SW-REQ-ID: REQ_SOA_ITER_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Random-access row iterators.
//!
//! An iterator holds the column pointers of the container and a half-open
//! row range `[front, back)`. Every dereference recomputes the row view from
//! `(index, columns)`; nothing is cached. [`Iter`] additionally behaves as a
//! cursor: it can step backwards, look ahead and measure the distance to
//! another cursor over the same container.

#![allow(unsafe_code)]

use core::{cmp::Ordering, fmt, iter::FusedIterator, marker::PhantomData, mem::ManuallyDrop, ptr};

use tuplevec_alloc::Allocator;

use crate::{fields::Fields, raw::RawStorage, tuple_vec::TupleVec};

/// Shared iterator over the rows of a [`TupleVec`].
///
/// Yields `(&T0, &T1, ..)` per row.
///
/// The `==` and `<` operators compare cursor positions. The method calls
/// `.eq`, `.partial_cmp` and `.lt` resolve to [`Iterator`]'s versions, which
/// compare the yielded rows; use `PartialOrd::partial_cmp(&a, &b)` for the
/// position comparison.
pub struct Iter<'a, F: Fields + 'a> {
    columns: F::Columns,
    front:   usize,
    back:    usize,
    _marker: PhantomData<&'a F>,
}

impl<'a, F: Fields + 'a> Iter<'a, F> {
    /// # Safety
    ///
    /// Rows `[0, len)` of `columns` are live and stay unchanged for `'a`.
    pub(crate) unsafe fn new(columns: F::Columns, len: usize) -> Self {
        Self {
            columns,
            front: 0,
            back: len,
            _marker: PhantomData,
        }
    }

    /// Row index the next call to `next` yields.
    #[inline]
    pub fn position(&self) -> usize {
        self.front
    }

    /// The next row without advancing.
    #[inline]
    pub fn peek(&self) -> Option<F::Ref<'a>> {
        self.get(0)
    }

    /// The row `offset` places after the current position, if it is still
    /// ahead of the back of the iterator.
    pub fn get(&self, offset: usize) -> Option<F::Ref<'a>> {
        let index = self.front.checked_add(offset)?;
        if index < self.back {
            // SAFETY: `index` lies in the live range.
            Some(unsafe { F::get(&self.columns, index) })
        } else {
            None
        }
    }

    /// Move forward by `n` rows. Returns `false`, without moving, when fewer
    /// than `n` rows remain.
    pub fn advance(&mut self, n: usize) -> bool {
        if n <= self.back - self.front {
            self.front += n;
            true
        } else {
            false
        }
    }

    /// Move backward by `n` rows. Returns `false`, without moving, when that
    /// would step before the first row of the container.
    pub fn retreat(&mut self, n: usize) -> bool {
        if n <= self.front {
            self.front -= n;
            true
        } else {
            false
        }
    }

    /// Signed number of rows from `self` to `other`, or `None` when the two
    /// iterators belong to different containers.
    pub fn distance_to(&self, other: &Self) -> Option<isize> {
        if !self.same_container(other) {
            return None;
        }
        let to = isize::try_from(other.front).ok()?;
        let from = isize::try_from(self.front).ok()?;
        Some(to - from)
    }

    fn same_container(&self, other: &Self) -> bool {
        F::addresses(&self.columns) == F::addresses(&other.columns)
    }
}

impl<'a, F: Fields + 'a> Iterator for Iter<'a, F> {
    type Item = F::Ref<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let index = self.front;
        self.front += 1;
        // SAFETY: `index` lies in the live range.
        Some(unsafe { F::get(&self.columns, index) })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        if n < self.back - self.front {
            self.front += n;
            self.next()
        } else {
            self.front = self.back;
            None
        }
    }
}

impl<'a, F: Fields + 'a> DoubleEndedIterator for Iter<'a, F> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: `back` lies in the live range.
        Some(unsafe { F::get(&self.columns, self.back) })
    }

    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        if n < self.back - self.front {
            self.back -= n;
            self.next_back()
        } else {
            self.back = self.front;
            None
        }
    }
}

impl<'a, F: Fields + 'a> ExactSizeIterator for Iter<'a, F> {}
impl<'a, F: Fields + 'a> FusedIterator for Iter<'a, F> {}

impl<'a, F: Fields + 'a> Clone for Iter<'a, F> {
    fn clone(&self) -> Self {
        Self {
            columns: self.columns,
            front: self.front,
            back: self.back,
            _marker: PhantomData,
        }
    }
}

impl<'a, F: Fields + 'a> PartialEq for Iter<'a, F> {
    fn eq(&self, other: &Self) -> bool {
        self.same_container(other) && self.front == other.front
    }
}

impl<'a, F: Fields + 'a> PartialOrd for Iter<'a, F> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.same_container(other) {
            Some(self.front.cmp(&other.front))
        } else {
            None
        }
    }
}

impl<'a, F: Fields + 'a> fmt::Debug for Iter<'a, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("front", &self.front)
            .field("back", &self.back)
            .finish_non_exhaustive()
    }
}

// SAFETY: `Iter` only hands out shared references to rows.
unsafe impl<'a, F: Fields + Sync + 'a> Send for Iter<'a, F> {}
// SAFETY: as above.
unsafe impl<'a, F: Fields + Sync + 'a> Sync for Iter<'a, F> {}

/// Mutable iterator over the rows of a [`TupleVec`].
///
/// Yields `(&mut T0, &mut T1, ..)` per row.
pub struct IterMut<'a, F: Fields + 'a> {
    columns: F::Columns,
    front:   usize,
    back:    usize,
    _marker: PhantomData<&'a mut F>,
}

impl<'a, F: Fields + 'a> IterMut<'a, F> {
    /// # Safety
    ///
    /// Rows `[0, len)` of `columns` are live and exclusively borrowed for
    /// `'a`.
    pub(crate) unsafe fn new(columns: F::Columns, len: usize) -> Self {
        Self {
            columns,
            front: 0,
            back: len,
            _marker: PhantomData,
        }
    }

    /// Row index the next call to `next` yields.
    #[inline]
    pub fn position(&self) -> usize {
        self.front
    }
}

impl<'a, F: Fields + 'a> Iterator for IterMut<'a, F> {
    type Item = F::Mut<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let index = self.front;
        self.front += 1;
        // SAFETY: each index is yielded once, so the references never alias.
        Some(unsafe { F::get_mut(&self.columns, index) })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        if n < self.back - self.front {
            self.front += n;
            self.next()
        } else {
            self.front = self.back;
            None
        }
    }
}

impl<'a, F: Fields + 'a> DoubleEndedIterator for IterMut<'a, F> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: each index is yielded once.
        Some(unsafe { F::get_mut(&self.columns, self.back) })
    }
}

impl<'a, F: Fields + 'a> ExactSizeIterator for IterMut<'a, F> {}
impl<'a, F: Fields + 'a> FusedIterator for IterMut<'a, F> {}

impl<'a, F: Fields + 'a> fmt::Debug for IterMut<'a, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut")
            .field("front", &self.front)
            .field("back", &self.back)
            .finish_non_exhaustive()
    }
}

// SAFETY: `IterMut` behaves like `&mut [F]`.
unsafe impl<'a, F: Fields + Send + 'a> Send for IterMut<'a, F> {}
// SAFETY: as above.
unsafe impl<'a, F: Fields + Sync + 'a> Sync for IterMut<'a, F> {}

/// Owning iterator over the rows of a [`TupleVec`].
///
/// Rows are moved out, never cloned. Dropping the iterator drops the rows
/// it has not yielded and releases the block.
pub struct IntoIter<F: Fields, A: Allocator> {
    raw:   RawStorage<F>,
    alloc: A,
    front: usize,
    back:  usize,
}

impl<F: Fields, A: Allocator> IntoIter<F, A> {
    pub(crate) fn new(vec: TupleVec<F, A>) -> Self {
        let vec = ManuallyDrop::new(vec);
        // SAFETY: `vec` is never used or dropped again, so the storage and
        // the allocator are moved out exactly once.
        let (raw, alloc) = unsafe { (ptr::read(&vec.raw), ptr::read(&vec.alloc)) };
        Self {
            raw,
            alloc,
            front: 0,
            back: vec.len,
        }
    }

    /// The allocator the rows were stored with.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }
}

impl<F: Fields, A: Allocator> Iterator for IntoIter<F, A> {
    type Item = F;

    #[inline]
    fn next(&mut self) -> Option<F> {
        if self.front == self.back {
            return None;
        }
        let index = self.front;
        self.front += 1;
        // SAFETY: `index` is live and is never read again.
        Some(unsafe { F::read(self.raw.columns(), index) })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<F: Fields, A: Allocator> DoubleEndedIterator for IntoIter<F, A> {
    #[inline]
    fn next_back(&mut self) -> Option<F> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: `back` is live and is never read again.
        Some(unsafe { F::read(self.raw.columns(), self.back) })
    }
}

impl<F: Fields, A: Allocator> ExactSizeIterator for IntoIter<F, A> {}
impl<F: Fields, A: Allocator> FusedIterator for IntoIter<F, A> {}

impl<F: Fields, A: Allocator> Drop for IntoIter<F, A> {
    fn drop(&mut self) {
        let (front, back) = (self.front, self.back);
        self.front = back;
        let raw = core::mem::replace(&mut self.raw, RawStorage::empty());
        // SAFETY: rows `[front, back)` are the only live rows; the block came
        // from `alloc`.
        unsafe {
            F::drop_range(raw.columns(), front, back);
            raw.release(&self.alloc);
        }
    }
}

impl<F: Fields, A: Allocator> fmt::Debug for IntoIter<F, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoIter")
            .field("front", &self.front)
            .field("back", &self.back)
            .field("allocator", &self.alloc)
            .finish_non_exhaustive()
    }
}

// SAFETY: `IntoIter` owns its rows and its allocator.
unsafe impl<F: Fields + Send, A: Allocator + Send> Send for IntoIter<F, A> {}
// SAFETY: shared access only reads rows.
unsafe impl<F: Fields + Sync, A: Allocator + Sync> Sync for IntoIter<F, A> {}
