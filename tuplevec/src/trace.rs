// tuplevec - tuplevec
// Module: Structured tracing of storage generations
// SW-REQ-ID: REQ_SOA_TRACE_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Tracing support for the containers.
//!
//! Spans wrap every change of storage generation so that a subscriber can
//! attribute allocator traffic to the container that caused it. Plain
//! events go through the crate-internal `storage_event!` macro, which
//! compiles to nothing without the `tracing` feature.

#![cfg(feature = "tracing")]

pub use tracing::{debug, trace, warn, Level, Span};
use tracing::trace_span;

/// Spans for storage lifecycle events.
#[derive(Debug, Clone)]
pub struct StorageTrace;

impl StorageTrace {
    /// Span covering a move of every row into a new storage generation.
    #[inline]
    pub fn reallocating(allocator: &str, from: usize, to: usize, rows: usize) -> Span {
        trace_span!("storage_reallocate", allocator = %allocator, from = %from, to = %to, rows = %rows)
    }

    /// Span covering a move into a different allocator.
    #[inline]
    pub fn rebinding(from: &str, to: &str, rows: usize) -> Span {
        trace_span!("storage_rebind", from = %from, to = %to, rows = %rows)
    }
}
