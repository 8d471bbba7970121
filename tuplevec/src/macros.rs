// tuplevec - tuplevec
// Module: Macros
// SW-REQ-ID: REQ_SOA_USABILITY_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Literal construction macro and the internal logging shim.

/// Emit a `tracing` event when the `tracing` feature is enabled.
macro_rules! storage_event {
    ($level:ident, $($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        $crate::trace::$level!($($arg)*);
    };
}

/// Build a [`TupleVec`](crate::TupleVec) on the heap from literal rows.
///
/// Evaluates to a `Result`, since the allocation may fail.
///
/// # Examples
///
/// ```
/// use tuplevec::tuple_vec;
///
/// let points = tuple_vec![(1, 1.0), (2, 2.0), (3, 3.0)]?;
/// assert_eq!(points.column::<0>(), &[1, 2, 3]);
///
/// let zeros = tuple_vec![(0u8, 'x'); 4]?;
/// assert_eq!(zeros.len(), 4);
/// # Ok::<(), tuplevec::Error>(())
/// ```
#[macro_export]
macro_rules! tuple_vec {
    () => {
        ::core::result::Result::<_, $crate::Error>::Ok($crate::TupleVec::new())
    };
    ($row:expr; $n:expr) => {
        $crate::TupleVec::from_elem($n, &$row)
    };
    ($($row:expr),+ $(,)?) => {
        $crate::TupleVec::from_rows([$($row),+])
    };
}
