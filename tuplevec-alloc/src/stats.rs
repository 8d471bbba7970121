// tuplevec - tuplevec-alloc
// Module: Allocation statistics and budgets
// SW-REQ-ID: REQ_MEM_002
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Forwarding allocators that observe or constrain another allocator.
//!
//! [`TrackingAllocator`] records how many blocks were requested and released
//! and how many bytes are live. [`BudgetAllocator`] refuses requests that
//! would push the live byte count past a limit. Both are usable through a
//! shared reference, so a test can keep inspecting them while a container
//! holds `&TrackingAllocator<_>` as its allocator.

#![allow(unsafe_code)]

use core::{
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::{Allocator, Error, Result};

/// Snapshot of the counters of a [`TrackingAllocator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationStats {
    /// Successful allocation requests
    pub allocations:   usize,
    /// Release requests
    pub deallocations: usize,
    /// Requests the inner allocator refused
    pub failures:      usize,
    /// Bytes currently handed out
    pub live_bytes:    usize,
    /// High-water mark of `live_bytes`
    pub peak_bytes:    usize,
}

impl AllocationStats {
    /// Blocks handed out and not yet released.
    #[must_use]
    pub const fn outstanding(&self) -> usize {
        self.allocations - self.deallocations
    }
}

/// Allocator wrapper that counts every request.
#[derive(Debug, Default)]
pub struct TrackingAllocator<A> {
    inner:         A,
    allocations:   AtomicUsize,
    deallocations: AtomicUsize,
    failures:      AtomicUsize,
    live_bytes:    AtomicUsize,
    peak_bytes:    AtomicUsize,
}

impl<A: Allocator> TrackingAllocator<A> {
    /// Wrap `inner` with zeroed counters.
    pub const fn new(inner: A) -> Self {
        Self {
            inner,
            allocations: AtomicUsize::new(0),
            deallocations: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            live_bytes: AtomicUsize::new(0),
            peak_bytes: AtomicUsize::new(0),
        }
    }

    /// Current counter values.
    pub fn stats(&self) -> AllocationStats {
        AllocationStats {
            allocations:   self.allocations.load(Ordering::Acquire),
            deallocations: self.deallocations.load(Ordering::Acquire),
            failures:      self.failures.load(Ordering::Acquire),
            live_bytes:    self.live_bytes.load(Ordering::Acquire),
            peak_bytes:    self.peak_bytes.load(Ordering::Acquire),
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        self.allocations.store(0, Ordering::Release);
        self.deallocations.store(0, Ordering::Release);
        self.failures.store(0, Ordering::Release);
        self.live_bytes.store(0, Ordering::Release);
        self.peak_bytes.store(0, Ordering::Release);
    }

    /// The wrapped allocator.
    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: Allocator> Allocator for TrackingAllocator<A> {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>> {
        let result = self.inner.allocate(size);
        self.record(size, result.is_ok());
        result
    }

    fn allocate_aligned(
        &self,
        size: usize,
        alignment: usize,
        offset: usize,
    ) -> Result<NonNull<u8>> {
        let result = self.inner.allocate_aligned(size, alignment, offset);
        self.record(size, result.is_ok());
        result
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize, alignment: usize) {
        self.deallocations.fetch_add(1, Ordering::AcqRel);
        self.live_bytes.fetch_sub(size, Ordering::AcqRel);
        // SAFETY: forwarded contract.
        unsafe { self.inner.deallocate(ptr, size, alignment) }
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn set_name(&mut self, name: &'static str) {
        self.inner.set_name(name);
    }
}

impl<A> TrackingAllocator<A> {
    fn record(&self, size: usize, succeeded: bool) {
        if succeeded {
            self.allocations.fetch_add(1, Ordering::AcqRel);
            let live = self.live_bytes.fetch_add(size, Ordering::AcqRel) + size;
            self.peak_bytes.fetch_max(live, Ordering::AcqRel);
        } else {
            self.failures.fetch_add(1, Ordering::AcqRel);
        }
    }
}

/// Allocator wrapper that enforces a limit on live bytes.
///
/// A request that would exceed the budget fails with
/// [`Error::OUT_OF_MEMORY`] without reaching the inner allocator.
#[derive(Debug)]
pub struct BudgetAllocator<A> {
    inner:  A,
    budget: AtomicUsize,
    live:   AtomicUsize,
}

impl<A: Allocator> BudgetAllocator<A> {
    /// Wrap `inner` with a budget of `budget` live bytes.
    pub const fn new(inner: A, budget: usize) -> Self {
        Self {
            inner,
            budget: AtomicUsize::new(budget),
            live: AtomicUsize::new(0),
        }
    }

    /// Change the budget. Blocks already handed out are unaffected.
    pub fn set_budget(&self, budget: usize) {
        self.budget.store(budget, Ordering::Release);
    }

    /// Bytes currently handed out.
    pub fn live_bytes(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Bytes still available under the budget.
    pub fn remaining(&self) -> usize {
        self.budget
            .load(Ordering::Acquire)
            .saturating_sub(self.live.load(Ordering::Acquire))
    }

    fn reserve(&self, size: usize) -> Result<()> {
        let budget = self.budget.load(Ordering::Acquire);
        let mut current = self.live.load(Ordering::Acquire);
        loop {
            let new_total = current.checked_add(size).ok_or(Error::CAPACITY_OVERFLOW)?;
            if new_total > budget {
                #[cfg(feature = "tracing")]
                tracing::debug!(size, live = current, budget, "allocation refused by budget");
                return Err(Error::OUT_OF_MEMORY);
            }
            match self.live.compare_exchange_weak(
                current,
                new_total,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }
}

impl<A: Allocator> Allocator for BudgetAllocator<A> {
    fn allocate_aligned(
        &self,
        size: usize,
        alignment: usize,
        offset: usize,
    ) -> Result<NonNull<u8>> {
        self.reserve(size)?;
        self.inner.allocate_aligned(size, alignment, offset).inspect_err(|_| {
            self.live.fetch_sub(size, Ordering::AcqRel);
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize, alignment: usize) {
        self.live.fetch_sub(size, Ordering::AcqRel);
        // SAFETY: forwarded contract.
        unsafe { self.inner.deallocate(ptr, size, alignment) }
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn set_name(&mut self, name: &'static str) {
        self.inner.set_name(name);
    }
}
