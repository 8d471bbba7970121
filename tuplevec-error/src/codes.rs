// tuplevec - tuplevec-error
// Module: Error Codes
// SW-REQ-ID: REQ_ERROR_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error codes for tuplevec
//!
//! Codes are grouped by category: memory errors in the 1000 range, capacity
//! errors in the 2000 range, parameter errors in the 3000 range and
//! validation errors in the 4000 range.

/// The allocator could not provide the requested block
pub const OUT_OF_MEMORY: u16 = 1000;
/// The allocator reported a failure other than exhaustion
pub const ALLOCATION_FAILED: u16 = 1001;
/// A deallocation was requested for a block the allocator does not own
pub const INVALID_DEALLOCATION: u16 = 1002;

/// A fixed-capacity store is full and may not overflow
pub const CAPACITY_EXCEEDED: u16 = 2000;
/// The byte size of a layout does not fit in `usize` / `isize::MAX`
pub const CAPACITY_OVERFLOW: u16 = 2001;

/// The requested alignment is zero or not a power of two
pub const INVALID_ALIGNMENT: u16 = 3000;
/// The requested alignment offset cannot be honoured by this allocator
pub const UNSUPPORTED_ALIGNMENT_OFFSET: u16 = 3001;
/// The size and alignment pair does not form a valid layout
pub const INVALID_LAYOUT: u16 = 3002;

/// Internal consistency check failed
pub const INTEGRITY_VIOLATION: u16 = 4000;
