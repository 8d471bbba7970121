// tuplevec - tuplevec-alloc
// Module: Global heap allocator
// SW-REQ-ID: REQ_MEM_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! [`HeapAllocator`]: the default allocator of the containers, backed by the
//! global Rust allocator.

#![allow(unsafe_code)]

use alloc::alloc::{alloc, dealloc};
use core::{alloc::Layout, ptr, ptr::NonNull};

use crate::{check_alignment, Allocator, Error, Result, DEFAULT_NAME};

/// Allocator backed by the global Rust allocator.
///
/// All instances compare equal: a block obtained through one instance may be
/// released through any other. Zero-byte requests return a dangling, aligned
/// pointer and are never forwarded to the global allocator.
///
/// Alignment offsets are supported when they are a multiple of the
/// alignment, which reduces to a plain aligned request.
#[derive(Debug, Clone, Copy)]
pub struct HeapAllocator {
    name: &'static str,
}

impl HeapAllocator {
    /// Create a heap allocator named [`DEFAULT_NAME`].
    #[must_use]
    pub const fn new() -> Self {
        Self { name: DEFAULT_NAME }
    }

    /// Create a heap allocator with a diagnostic name.
    #[must_use]
    pub const fn with_name(name: &'static str) -> Self {
        Self { name }
    }
}

impl Default for HeapAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for HeapAllocator {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for HeapAllocator {}

impl Allocator for HeapAllocator {
    fn allocate_aligned(
        &self,
        size: usize,
        alignment: usize,
        offset: usize,
    ) -> Result<NonNull<u8>> {
        check_alignment(alignment)?;
        if offset % alignment != 0 {
            return Err(Error::UNSUPPORTED_ALIGNMENT_OFFSET);
        }
        if size == 0 {
            return NonNull::new(ptr::without_provenance_mut(alignment))
                .ok_or(Error::INVALID_ALIGNMENT);
        }
        let layout =
            Layout::from_size_align(size, alignment).map_err(|_| Error::CAPACITY_OVERFLOW)?;
        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc(layout) };
        NonNull::new(raw).ok_or_else(|| {
            #[cfg(feature = "tracing")]
            tracing::warn!(allocator = self.name, size, alignment, "heap allocation failed");
            Error::OUT_OF_MEMORY
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize, alignment: usize) {
        if size == 0 {
            return;
        }
        // SAFETY: the caller guarantees `ptr` was allocated with this exact
        // size and alignment, which formed a valid layout at that time.
        unsafe { dealloc(ptr.as_ptr(), Layout::from_size_align_unchecked(size, alignment)) }
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn set_name(&mut self, name: &'static str) {
        self.name = name;
    }
}
