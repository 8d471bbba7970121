// tuplevec - tuplevec
// Module: Crate root
// SW-REQ-ID: REQ_SOA_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Structure-of-arrays containers.
//!
//! A [`TupleVec<(T0, T1, ..)>`](TupleVec) stores a sequence of records not
//! as an array of tuples but as one contiguous column per field, all
//! columns packed into a single allocation. Iterating one field touches
//! only that field's memory, while rows are still inserted, erased and
//! reordered as a unit.
//!
//! # Layout
//!
//! Columns are placed in declaration order; each starts at the running
//! offset rounded up to its element alignment. See [`LayoutPlanner`].
//!
//! ```text
//! (u8, u64, u16), capacity 3
//!
//! offset 0        8                        32          38
//!        [u8 u8 u8]..[u64     u64     u64 ][u16 u16 u16]
//! ```
//!
//! # Containers
//!
//! - [`TupleVec`]: growable, generic over an [`Allocator`].
//! - [`FixedTupleVec`]: starts in a caller-lent buffer and optionally
//!   overflows into another allocator.
//!
//! # Features
//!
//! - `std` (default): `std::error::Error` for [`Error`].
//! - `tracing` (default): structured events and spans on every change of
//!   storage generation.
//! - `kani`: formal verification harnesses.
//!
//! # Example
//!
//! ```
//! use tuplevec::TupleVec;
//!
//! let mut bodies: TupleVec<(u32, [f32; 3], f32)> = TupleVec::with_capacity(2)?;
//! bodies.push((1, [0.0, 0.0, 0.0], 10.0))?;
//! bodies.push((2, [1.0, 0.0, 0.0], 5.0))?;
//! bodies.push((3, [0.0, 1.0, 0.0], 1.0))?;
//!
//! let total_mass: f32 = bodies.column::<2>().iter().sum();
//! assert_eq!(total_mass, 16.0);
//!
//! bodies.erase(0..1);
//! assert_eq!(bodies.column::<0>(), &[2, 3]);
//! # Ok::<(), tuplevec::Error>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod column;
pub mod fields;
pub mod fixed;
pub mod iter;
pub mod layout;
mod raw;
#[cfg(feature = "tracing")]
pub mod trace;
pub mod tuple_vec;

pub use column::Column;
pub use fields::{
    CloneFields, ColumnAt, ColumnOf, DebugFields, EqFields, Fields, Idx, OrdFields, MAX_ARITY,
};
pub use fixed::{FixedAllocator, FixedTupleVec, InlineBuffer};
pub use iter::{IntoIter, Iter, IterMut};
pub use layout::{LayoutPlan, LayoutPlanner};
pub use tuple_vec::TupleVec;
pub use tuplevec_alloc::{
    AllocationStats, Allocator, BudgetAllocator, FixedBufferAllocator, HeapAllocator,
    TrackingAllocator,
};
pub use tuplevec_error::{codes, Error, ErrorCategory, Result};

/// Allocator name given to the heap allocator of [`TupleVec::new`].
pub const DEFAULT_NAME: &str = "tuplevec tuple-vector";

/// Allocator name given to the allocator of a [`FixedTupleVec`].
pub const FIXED_DEFAULT_NAME: &str = "tuplevec fixed-tuple-vector";
