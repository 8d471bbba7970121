// tuplevec - tuplevec-error
// Module: Error Handling
// SW-REQ-ID: REQ_ERROR_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error handling for the tuplevec containers
//!
//! The containers distinguish two kinds of failure. Contract violations
//! (an out-of-range row index, popping an empty container through an
//! infallible accessor) panic at the call site. Resource exhaustion is the
//! only recoverable condition and is reported through [`Error`].
//!
//! # Error Categories
//!
//! ## Memory Errors (1000-1002)
//! - Allocator exhaustion
//! - Allocator failures and bad deallocations
//!
//! ## Capacity Errors (2000-2001)
//! - Fixed buffer full with overflow disabled
//! - Layout size arithmetic overflow
//!
//! ## Parameter Errors (3000-3002)
//! - Invalid alignment or alignment offset
//!
//! ## Validation Errors (4000)
//! - Internal consistency checks
//!
//! # Usage
//!
//! ```
//! use tuplevec_error::{codes, Error, ErrorCategory};
//!
//! let error = Error::new(ErrorCategory::Memory, codes::OUT_OF_MEMORY, "arena exhausted");
//! assert!(error.is_memory_error());
//! assert_eq!(error, Error::new(ErrorCategory::Memory, 1000, "arena exhausted"));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(clippy::perf)]
#![warn(clippy::pedantic)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Error codes for tuplevec
pub mod codes;
/// Error and error handling types
pub mod errors;

// Re-export key types
pub use errors::{Error, ErrorCategory};

/// A specialized `Result` type for tuplevec operations.
pub type Result<T> = core::result::Result<T, Error>;
