// tuplevec - tuplevec-alloc
// Module: Fixed buffer allocator with overflow
// SW-REQ-ID: REQ_MEM_003
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Allocator over a caller-lent byte buffer.
//!
//! The buffer itself is installed directly as the first storage of a
//! fixed-capacity container; the allocator never carves blocks out of it.
//! Every further request goes to the overflow allocator when overflow is
//! enabled and fails with [`Error::CAPACITY_EXCEEDED`] otherwise.
//!
//! # Characteristics
//!
//! - Releasing any pointer inside the buffer is a no-op
//! - Releasing any other pointer is forwarded to the overflow allocator
//! - The buffer is borrowed for `'buf`, so it outlives every container
//!   that uses this allocator

#![allow(unsafe_code)]

use core::{fmt, marker::PhantomData, mem::MaybeUninit, ptr::NonNull};

use crate::{check_alignment, Allocator, Error, HeapAllocator, Result};

/// Allocator owning a borrowed fixed buffer and an overflow allocator.
///
/// # Type Parameters
///
/// - `O`: allocator used once the buffer is exhausted
/// - `OVERFLOW`: whether requests may fall through to `O`
pub struct FixedBufferAllocator<'buf, O = HeapAllocator, const OVERFLOW: bool = true> {
    buffer:   NonNull<u8>,
    len:      usize,
    overflow: O,
    name:     &'static str,
    _buffer:  PhantomData<&'buf mut [MaybeUninit<u8>]>,
}

impl<'buf, O: Allocator, const OVERFLOW: bool> FixedBufferAllocator<'buf, O, OVERFLOW> {
    /// Take exclusive use of `buffer` for `'buf`.
    pub fn new(buffer: &'buf mut [MaybeUninit<u8>], overflow: O) -> Self {
        let len = buffer.len();
        Self {
            buffer: NonNull::from(buffer).cast::<u8>(),
            len,
            overflow,
            name: crate::DEFAULT_NAME,
            _buffer: PhantomData,
        }
    }

    /// Start of the buffer.
    #[inline]
    pub fn buffer(&self) -> NonNull<u8> {
        self.buffer
    }

    /// Length of the buffer in bytes.
    #[inline]
    pub fn buffer_len(&self) -> usize {
        self.len
    }

    /// First address inside the buffer aligned to `alignment`, with the
    /// number of bytes that remain from there.
    ///
    /// Returns `None` when no aligned byte lies inside the buffer, so a
    /// returned start is always owned by it.
    pub fn aligned_region(&self, alignment: usize) -> Result<Option<(NonNull<u8>, usize)>> {
        check_alignment(alignment)?;
        let padding = self.buffer.as_ptr().align_offset(alignment);
        if padding >= self.len {
            return Ok(None);
        }
        // SAFETY: `padding < len`, so the result stays inside the buffer.
        let start = unsafe { self.buffer.add(padding) };
        Ok(Some((start, self.len - padding)))
    }

    /// Whether `ptr` points into the buffer. The end is exclusive.
    #[inline]
    pub fn owns(&self, ptr: NonNull<u8>) -> bool {
        let start = self.buffer.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        addr >= start && addr - start < self.len
    }

    /// Whether requests may fall through to the overflow allocator.
    #[inline]
    pub const fn can_overflow(&self) -> bool {
        OVERFLOW
    }

    /// The overflow allocator.
    #[inline]
    pub fn overflow_allocator(&self) -> &O {
        &self.overflow
    }
}

impl<O: Allocator, const OVERFLOW: bool> Allocator for FixedBufferAllocator<'_, O, OVERFLOW> {
    fn allocate_aligned(
        &self,
        size: usize,
        alignment: usize,
        offset: usize,
    ) -> Result<NonNull<u8>> {
        if OVERFLOW {
            #[cfg(feature = "tracing")]
            tracing::debug!(allocator = self.name, size, alignment, "fixed buffer overflowing");
            self.overflow.allocate_aligned(size, alignment, offset)
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                allocator = self.name,
                size,
                capacity = self.len,
                "fixed buffer exhausted and overflow is disabled"
            );
            Err(Error::CAPACITY_EXCEEDED)
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize, alignment: usize) {
        if self.owns(ptr) {
            return;
        }
        // SAFETY: any block outside the buffer came from the overflow
        // allocator under the same contract.
        unsafe { self.overflow.deallocate(ptr, size, alignment) }
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn set_name(&mut self, name: &'static str) {
        self.name = name;
    }
}

impl<O: fmt::Debug, const OVERFLOW: bool> fmt::Debug for FixedBufferAllocator<'_, O, OVERFLOW> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedBufferAllocator")
            .field("buffer", &self.buffer)
            .field("len", &self.len)
            .field("overflow", &self.overflow)
            .field("can_overflow", &OVERFLOW)
            .field("name", &self.name)
            .finish()
    }
}

// SAFETY: the allocator holds an exclusive borrow of the buffer; moving it
// to another thread moves that borrow with it.
unsafe impl<O: Send, const OVERFLOW: bool> Send for FixedBufferAllocator<'_, O, OVERFLOW> {}
// SAFETY: shared access never touches the buffer contents.
unsafe impl<O: Sync, const OVERFLOW: bool> Sync for FixedBufferAllocator<'_, O, OVERFLOW> {}
