// tuplevec - tuplevec-alloc
// Module: Allocator Capability
// SW-REQ-ID: REQ_MEM_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Allocator capability consumed by the tuplevec containers.
//!
//! The containers never assume a concrete allocator. They request one
//! block of `(size, alignment, offset)` per storage generation and hand it
//! back exactly once through [`Allocator::deallocate`].
//!
//! # Provided allocators
//!
//! - [`HeapAllocator`]: the global Rust allocator.
//! - [`FixedBufferAllocator`]: a caller-lent buffer with an optional
//!   overflow allocator.
//! - [`TrackingAllocator`]: forwards requests and records statistics.
//! - [`BudgetAllocator`]: forwards requests while a byte budget holds.
//!
//! # Example
//!
//! ```
//! use tuplevec_alloc::{Allocator, HeapAllocator};
//!
//! let heap = HeapAllocator::new();
//! let block = heap.allocate_aligned(64, 32, 0)?;
//! assert_eq!(block.as_ptr() as usize % 32, 0);
//! // SAFETY: `block` was returned by `heap` for 64 bytes at alignment 32.
//! unsafe { heap.deallocate(block, 64, 32) };
//! # Ok::<(), tuplevec_error::Error>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(missing_docs)]

extern crate alloc;

use core::{fmt, ptr::NonNull};

pub use tuplevec_error::{codes, Error, ErrorCategory, Result};

pub mod fixed;
pub mod heap;
pub mod stats;

pub use fixed::FixedBufferAllocator;
pub use heap::HeapAllocator;
pub use stats::{AllocationStats, BudgetAllocator, TrackingAllocator};

/// Name reported by allocators that were never given one.
pub const DEFAULT_NAME: &str = "tuplevec";

/// Smallest alignment every allocator guarantees for plain requests.
///
/// Requests at or below this alignment go through [`Allocator::allocate`];
/// stricter ones go through [`Allocator::allocate_aligned`].
pub const MIN_ALIGNMENT: usize = 2 * core::mem::size_of::<usize>();

/// Memory provider for the containers.
///
/// Implementors hand out raw blocks and take them back. The block returned
/// for `(size, alignment, offset)` satisfies
/// `(ptr as usize - offset) % alignment == 0` and is valid for `size` bytes.
#[allow(unsafe_code)]
pub trait Allocator: fmt::Debug {
    /// Allocate `size` bytes at [`MIN_ALIGNMENT`].
    fn allocate(&self, size: usize) -> Result<NonNull<u8>> {
        self.allocate_aligned(size, MIN_ALIGNMENT, 0)
    }

    /// Allocate `size` bytes such that `ptr - offset` is aligned to
    /// `alignment`.
    fn allocate_aligned(&self, size: usize, alignment: usize, offset: usize)
        -> Result<NonNull<u8>>;

    /// Release a block.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by this allocator (or one comparing
    /// equal to it) for exactly `size` bytes at `alignment`, and must not have
    /// been released already.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize, alignment: usize);

    /// Diagnostic name.
    fn name(&self) -> &'static str {
        DEFAULT_NAME
    }

    /// Replace the diagnostic name. Allocators without storage for a name
    /// ignore the call.
    fn set_name(&mut self, name: &'static str) {
        let _ = name;
    }
}

#[allow(unsafe_code)]
impl<A: Allocator + ?Sized> Allocator for &A {
    #[inline]
    fn allocate(&self, size: usize) -> Result<NonNull<u8>> {
        (**self).allocate(size)
    }

    #[inline]
    fn allocate_aligned(
        &self,
        size: usize,
        alignment: usize,
        offset: usize,
    ) -> Result<NonNull<u8>> {
        (**self).allocate_aligned(size, alignment, offset)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize, alignment: usize) {
        // SAFETY: forwarded contract.
        unsafe { (**self).deallocate(ptr, size, alignment) }
    }

    #[inline]
    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Dispatch a request to the plain or the aligned entry point.
///
/// Alignments up to [`MIN_ALIGNMENT`] with no offset are served by
/// [`Allocator::allocate`].
pub fn allocate_memory<A: Allocator + ?Sized>(
    allocator: &A,
    size: usize,
    alignment: usize,
    offset: usize,
) -> Result<NonNull<u8>> {
    let ptr = if alignment <= MIN_ALIGNMENT && offset == 0 {
        allocator.allocate(size)?
    } else {
        allocator.allocate_aligned(size, alignment, offset)?
    };
    debug_assert_eq!(
        (ptr.as_ptr() as usize).wrapping_sub(offset) % alignment,
        0,
        "allocator returned a misaligned block"
    );
    Ok(ptr)
}

/// Alignment a block from [`allocate_memory`] was actually requested at.
#[inline]
#[must_use]
pub const fn effective_alignment(alignment: usize, offset: usize) -> usize {
    if alignment <= MIN_ALIGNMENT && offset == 0 { MIN_ALIGNMENT } else { alignment }
}

/// Release a block obtained from [`allocate_memory`].
///
/// # Safety
///
/// `ptr` must come from `allocate_memory(allocator, size, alignment, offset)`
/// on this allocator and must not have been released already.
#[allow(unsafe_code)]
pub unsafe fn deallocate_memory<A: Allocator + ?Sized>(
    allocator: &A,
    ptr: NonNull<u8>,
    size: usize,
    alignment: usize,
    offset: usize,
) {
    // SAFETY: the block was requested at the effective alignment.
    unsafe { allocator.deallocate(ptr, size, effective_alignment(alignment, offset)) }
}

/// Check that `alignment` is a non-zero power of two.
#[inline]
pub fn check_alignment(alignment: usize) -> Result<()> {
    if alignment.is_power_of_two() {
        Ok(())
    } else {
        Err(Error::INVALID_ALIGNMENT)
    }
}
