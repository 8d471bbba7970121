// tuplevec - tuplevec
// Module: Raw storage generation
// SW-REQ-ID: REQ_SOA_STORAGE_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! One storage generation: a block, its row capacity and the column
//! pointers planned into it.
//!
//! `RawStorage` knows nothing about which rows are live. The owning
//! container tracks the row count and drops rows before it releases the
//! block.

#![allow(unsafe_code)]

use core::{fmt, ptr::NonNull};

use tuplevec_alloc::{allocate_memory, deallocate_memory, Allocator};
use tuplevec_error::Result;

use crate::{fields::Fields, layout::LayoutPlan};

pub(crate) struct RawStorage<F: Fields> {
    data:     Option<NonNull<u8>>,
    size:     usize,
    capacity: usize,
    columns:  F::Columns,
}

impl<F: Fields> RawStorage<F> {
    /// Storage without a block and with capacity 0.
    pub(crate) fn empty() -> Self {
        Self {
            data: None,
            size: 0,
            capacity: 0,
            columns: F::dangling(),
        }
    }

    /// Request a block for `capacity` rows from `alloc`.
    ///
    /// A plan of size 0 (capacity 0 or zero-sized columns only) requests
    /// nothing and leaves the columns dangling.
    pub(crate) fn allocate<A: Allocator + ?Sized>(alloc: &A, capacity: usize) -> Result<Self> {
        let plan = F::plan(capacity)?;
        if plan.is_empty() {
            return Ok(Self {
                capacity,
                ..Self::empty()
            });
        }
        let data = allocate_memory(alloc, plan.size(), plan.align(), 0)?;
        // SAFETY: `data` is a fresh block of `plan.size()` bytes at
        // `plan.align()`.
        Ok(unsafe { Self::from_block(data, &plan) })
    }

    /// Storage over an existing block.
    ///
    /// # Safety
    ///
    /// `data` is aligned to `plan.align()` and valid for `plan.size()` bytes
    /// for as long as the storage is in use.
    pub(crate) unsafe fn from_block(data: NonNull<u8>, plan: &LayoutPlan<F::Offsets>) -> Self {
        Self {
            data: Some(data),
            size: plan.size(),
            capacity: plan.capacity(),
            // SAFETY: the offsets were planned for this block.
            columns: unsafe { F::columns_at(data, plan.offsets()) },
        }
    }

    /// Hand the block back to `alloc`.
    ///
    /// # Safety
    ///
    /// The block came from `alloc` (or is owned by it) and holds no live
    /// rows.
    pub(crate) unsafe fn release<A: Allocator + ?Sized>(self, alloc: &A) {
        if let Some(data) = self.data {
            // SAFETY: the block was requested with this size and alignment.
            unsafe { deallocate_memory(alloc, data, self.size, F::ALIGN, 0) }
        }
    }

    #[inline]
    pub(crate) fn columns(&self) -> &F::Columns {
        &self.columns
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn data(&self) -> Option<NonNull<u8>> {
        self.data
    }

    /// Whether every column lies inside the block.
    pub(crate) fn is_consistent(&self) -> bool {
        let (base, size) = self.data.map_or((0, 0), |data| (data.as_ptr() as usize, self.size));
        F::columns_within(&self.columns, base, size, self.capacity)
    }
}

impl<F: Fields> fmt::Debug for RawStorage<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawStorage")
            .field("data", &self.data)
            .field("size", &self.size)
            .field("capacity", &self.capacity)
            .field("columns", &self.columns)
            .finish()
    }
}
