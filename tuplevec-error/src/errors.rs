// tuplevec - tuplevec-error
// Module: Error Types
// SW-REQ-ID: REQ_ERROR_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error type shared by the allocator boundary and the containers.
//!
//! Only recoverable conditions are represented here. Contract violations
//! (bad row index, empty container access) are reported by panicking at the
//! call site and never reach this type.

use core::fmt;

use crate::codes;

/// `Error` categories for tuplevec operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCategory {
    /// Allocator errors
    Memory     = 1,
    /// Capacity limits (fixed buffers, arithmetic overflow of sizes)
    Capacity   = 2,
    /// Invalid arguments handed to an allocator
    Parameter  = 3,
    /// Internal consistency checks
    Validation = 4,
}

/// Base error type for all tuplevec operations
///
/// `Error` is `Copy` and carries only a `'static` message so it can be
/// returned from `no_std` code without allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Error {
    /// `Error` category
    pub category: ErrorCategory,
    /// `Error` code
    pub code:     u16,
    /// `Error` message
    pub message:  &'static str,
}

impl Error {
    /// Out of memory error
    pub const OUT_OF_MEMORY: Self =
        Self::new(ErrorCategory::Memory, codes::OUT_OF_MEMORY, "Out of memory");
    /// Fixed capacity exceeded with overflow disabled
    pub const CAPACITY_EXCEEDED: Self = Self::new(
        ErrorCategory::Capacity,
        codes::CAPACITY_EXCEEDED,
        "Fixed capacity exceeded and overflow is disabled",
    );
    /// Layout size overflow error
    pub const CAPACITY_OVERFLOW: Self = Self::new(
        ErrorCategory::Capacity,
        codes::CAPACITY_OVERFLOW,
        "Requested capacity overflows the addressable size",
    );
    /// Invalid alignment error
    pub const INVALID_ALIGNMENT: Self = Self::new(
        ErrorCategory::Parameter,
        codes::INVALID_ALIGNMENT,
        "Alignment must be a non-zero power of two",
    );
    /// Unsupported alignment offset error
    pub const UNSUPPORTED_ALIGNMENT_OFFSET: Self = Self::new(
        ErrorCategory::Parameter,
        codes::UNSUPPORTED_ALIGNMENT_OFFSET,
        "Alignment offset is not supported by this allocator",
    );

    /// Create a new error.
    #[must_use]
    pub const fn new(category: ErrorCategory, code: u16, message: &'static str) -> Self {
        Self {
            category,
            code,
            message,
        }
    }

    /// Create a validation error with a custom message
    #[must_use]
    pub const fn integrity_violation(message: &'static str) -> Self {
        Self::new(ErrorCategory::Validation, codes::INTEGRITY_VIOLATION, message)
    }

    /// Check if this is a memory error
    #[must_use]
    pub fn is_memory_error(&self) -> bool {
        self.category == ErrorCategory::Memory
    }

    /// Check if this is a capacity error
    #[must_use]
    pub fn is_capacity_error(&self) -> bool {
        self.category == ErrorCategory::Capacity
    }

    /// Check if this is a parameter error
    #[must_use]
    pub fn is_parameter_error(&self) -> bool {
        self.category == ErrorCategory::Parameter
    }

    /// Check if this is a validation error
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        self.category == ErrorCategory::Validation
    }

    /// Whether the failed request can be retried with a smaller size.
    ///
    /// Memory and capacity errors depend on the size requested; parameter and
    /// validation errors do not.
    #[must_use]
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self.category, ErrorCategory::Memory | ErrorCategory::Capacity)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}][E{:04X}] {}",
            self.category, self.code, self.message
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_errors() {
        assert!(Error::OUT_OF_MEMORY.is_memory_error());
        assert!(Error::CAPACITY_EXCEEDED.is_capacity_error());
        assert!(Error::CAPACITY_OVERFLOW.is_capacity_error());
        assert!(Error::INVALID_ALIGNMENT.is_parameter_error());
        assert_eq!(Error::OUT_OF_MEMORY.code, codes::OUT_OF_MEMORY);
    }

    #[test]
    fn test_resource_exhaustion() {
        assert!(Error::OUT_OF_MEMORY.is_resource_exhaustion());
        assert!(Error::CAPACITY_EXCEEDED.is_resource_exhaustion());
        assert!(!Error::UNSUPPORTED_ALIGNMENT_OFFSET.is_resource_exhaustion());
        assert!(!Error::integrity_violation("bad").is_resource_exhaustion());
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_display() {
        let rendered = std::format!("{}", Error::OUT_OF_MEMORY);
        assert_eq!(rendered, "[Memory][E03E8] Out of memory");
    }
}
