// tuplevec - tuplevec
// Module: Record shapes (ordered column type lists)
// SW-REQ-ID: REQ_SOA_FIELDS_001
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Record shapes: the ordered list of column types of a container.
//!
//! A record shape is a Rust tuple `(T0, T1, ..)` of 1 to [`MAX_ARITY`]
//! element types. [`Fields`] is implemented for every such tuple by
//! `impl_fields!`, which unrolls the per-column work at compile time: the
//! layout fold, the tuple of [`Column`] pointers, and every row-wide
//! primitive the storage core needs.
//!
//! Capability traits add behaviour when every column supports it:
//!
//! | trait           | requires on every column |
//! |-----------------|--------------------------|
//! | [`CloneFields`] | `Clone`                  |
//! | [`EqFields`]    | `PartialEq`              |
//! | [`OrdFields`]   | `PartialOrd`             |
//! | [`DebugFields`] | `Debug`                  |
//!
//! [`ColumnAt`] maps a column index to its type. [`ColumnOf`] maps a column
//! type to its index; it only resolves when the type occurs once in the
//! record, so asking for a duplicated type fails to compile.
//!
//! The row-wide `unsafe` functions follow the contract documented on
//! [`Column`], applied to every column at once.

#![allow(unsafe_code)]
#![allow(clippy::missing_safety_doc)] // shared contract in the module docs

use core::{
    cmp::Ordering,
    fmt,
    mem::{align_of, size_of, MaybeUninit},
    ptr::NonNull,
};

use tuplevec_error::Result;

use crate::{
    column::Column,
    layout::{max_align, LayoutPlan, LayoutPlanner},
};

/// Largest supported number of columns.
pub const MAX_ARITY: usize = 12;

mod sealed {
    pub trait Sealed {}
}

/// Two column blocks laid out back to back, used to size inline buffers.
#[doc(hidden)]
#[repr(C)]
pub struct InlineCons<H, T> {
    head: H,
    tail: T,
}

/// Ordered list of column types.
///
/// Sealed; implemented for tuples of 1 to [`MAX_ARITY`] types.
pub trait Fields: Sized + sealed::Sealed {
    /// Number of columns.
    const COUNT: usize;
    /// Alignment of the shared allocation (largest column alignment).
    const ALIGN: usize;
    /// Sum of the element sizes of all columns.
    const ROW_SIZE: usize;

    /// One [`Column`] per element type.
    type Columns: Copy + fmt::Debug;
    /// One byte offset (or address) per column.
    type Offsets: Copy + fmt::Debug + PartialEq + AsRef<[usize]>;
    /// Shared view of one row: a tuple of references.
    type Ref<'a>
    where
        Self: 'a;
    /// Exclusive view of one row: a tuple of mutable references.
    type Mut<'a>
    where
        Self: 'a;
    /// Every column as a slice.
    type Slices<'a>
    where
        Self: 'a;
    /// Every column as a mutable slice.
    type SlicesMut<'a>
    where
        Self: 'a;
    /// Storage large enough for `N` rows laid out by [`Fields::plan`].
    type Inline<const N: usize>;

    /// Plan the shared allocation for `capacity` rows.
    fn plan(capacity: usize) -> Result<LayoutPlan<Self::Offsets>>;

    /// Columns of a storage without an allocation.
    fn dangling() -> Self::Columns;

    /// Columns of the allocation at `base` laid out by `offsets`.
    unsafe fn columns_at(base: NonNull<u8>, offsets: &Self::Offsets) -> Self::Columns;

    /// Address of the first row of every column.
    fn addresses(columns: &Self::Columns) -> Self::Offsets;

    /// Whether every column, sized for `capacity` rows, lies inside
    /// `[base, base + size)` and is aligned.
    fn columns_within(columns: &Self::Columns, base: usize, size: usize, capacity: usize) -> bool;

    /// Construct row `index` from `row`.
    unsafe fn write(columns: &Self::Columns, index: usize, row: Self);
    /// Move row `index` out.
    unsafe fn read(columns: &Self::Columns, index: usize) -> Self;
    /// Swap row `index` with `row`.
    unsafe fn replace(columns: &Self::Columns, index: usize, row: Self) -> Self;

    /// Shared view of row `index`.
    unsafe fn get<'a>(columns: &Self::Columns, index: usize) -> Self::Ref<'a>
    where
        Self: 'a;
    /// Exclusive view of row `index`.
    unsafe fn get_mut<'a>(columns: &Self::Columns, index: usize) -> Self::Mut<'a>
    where
        Self: 'a;
    /// Rows `[0, len)` of every column.
    unsafe fn slices<'a>(columns: &Self::Columns, len: usize) -> Self::Slices<'a>
    where
        Self: 'a;
    /// Rows `[0, len)` of every column, mutably.
    unsafe fn slices_mut<'a>(columns: &Self::Columns, len: usize) -> Self::SlicesMut<'a>
    where
        Self: 'a;

    /// Relocate rows `[begin, end)` into another storage generation.
    unsafe fn relocate(
        src: &Self::Columns,
        begin: usize,
        end: usize,
        dest: &Self::Columns,
        dest_begin: usize,
    );
    /// Move `count` rows from `from` to `to` inside the same storage.
    unsafe fn shift(columns: &Self::Columns, from: usize, to: usize, count: usize);
    /// Drop rows `[begin, end)`.
    unsafe fn drop_range(columns: &Self::Columns, begin: usize, end: usize);
    /// Shift `[pos, len)` back by one and move `row` into `pos`.
    unsafe fn insert_one(columns: &Self::Columns, pos: usize, len: usize, row: Self);
    /// Drop `[first, last)` and close the gap.
    unsafe fn erase(columns: &Self::Columns, first: usize, last: usize, len: usize);
    /// Move row `pos` out and fill it with the last row.
    unsafe fn swap_remove(columns: &Self::Columns, pos: usize, len: usize) -> Self;
    /// Move row `pos` out and close the gap.
    unsafe fn remove(columns: &Self::Columns, pos: usize, len: usize) -> Self;
    /// Rotate rows `[begin, end)` left by `mid`.
    unsafe fn rotate_left(columns: &Self::Columns, begin: usize, end: usize, mid: usize);
    /// Swap two rows.
    unsafe fn swap_rows(columns: &Self::Columns, a: usize, b: usize);
}

/// Record shapes whose columns are all `Clone`.
pub trait CloneFields: Fields + Clone {
    /// Construct `n` clones of `value` from `begin` on.
    unsafe fn fill(columns: &Self::Columns, begin: usize, n: usize, value: &Self);
    /// Construct clones of `n` source rows at `dest_begin`.
    unsafe fn clone_range(
        dest: &Self::Columns,
        dest_begin: usize,
        src: &Self::Columns,
        src_begin: usize,
        n: usize,
    );
    /// Shift `[pos, len)` back by `n` and fill the gap with clones of `value`.
    unsafe fn insert_and_fill(columns: &Self::Columns, pos: usize, n: usize, len: usize, value: &Self);
    /// Shift `[pos, len)` back by `n` and fill the gap with clones of source rows.
    unsafe fn insert_range(
        columns: &Self::Columns,
        pos: usize,
        n: usize,
        len: usize,
        src: &Self::Columns,
        src_begin: usize,
    );
}

/// Record shapes whose columns are all `PartialEq`.
pub trait EqFields: Fields + PartialEq {
    /// Whether row `i` of `a` equals row `j` of `b`.
    unsafe fn row_eq(a: &Self::Columns, i: usize, b: &Self::Columns, j: usize) -> bool;
}

/// Record shapes whose columns are all `PartialOrd`.
pub trait OrdFields: EqFields + PartialOrd {
    /// Lexicographic comparison of two rows, column by column.
    unsafe fn row_partial_cmp(
        a: &Self::Columns,
        i: usize,
        b: &Self::Columns,
        j: usize,
    ) -> Option<Ordering>;
}

/// Record shapes whose columns are all `Debug`.
pub trait DebugFields: Fields + fmt::Debug {
    /// Format row `index` as a tuple.
    unsafe fn fmt_row(columns: &Self::Columns, index: usize, f: &mut fmt::Formatter<'_>)
        -> fmt::Result;
}

/// Column `I` of a record shape.
pub trait ColumnAt<const I: usize>: Fields {
    /// Element type of the column.
    type Type;

    /// The column pointer.
    fn column(columns: &Self::Columns) -> Column<Self::Type>;
}

/// Index marker used by [`ColumnOf`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Idx<const I: usize>;

/// The unique column of type `T` in a record shape.
///
/// `I` is inferred; it is ambiguous, and rejected by the compiler, when `T`
/// occurs more than once.
pub trait ColumnOf<T, I>: Fields {
    /// The column pointer.
    fn column_of(columns: &Self::Columns) -> Column<T>;
}

macro_rules! inline_storage {
    ($n:ident; $T:ident) => { [MaybeUninit<$T>; $n] };
    ($n:ident; $T:ident, $($rest:ident),+) => {
        InlineCons<[MaybeUninit<$T>; $n], inline_storage!($n; $($rest),+)>
    };
}

macro_rules! impl_fields {
    (@columns $gens:tt; $($idx:tt : $T:ident),+) => {
        $( impl_fields!(@column $gens; $idx : $T); )+
    };
    (@column ($($G:ident),+); $idx:tt : $T:ident) => {
        impl<$($G),+> ColumnAt<$idx> for ($($G,)+) {
            type Type = $T;

            #[inline]
            fn column(columns: &Self::Columns) -> Column<$T> {
                columns.$idx
            }
        }

        impl<$($G),+> ColumnOf<$T, Idx<$idx>> for ($($G,)+) {
            #[inline]
            fn column_of(columns: &Self::Columns) -> Column<$T> {
                columns.$idx
            }
        }
    };
    ($count:literal; $($idx:tt : $T:ident),+) => {
        impl<$($T),+> sealed::Sealed for ($($T,)+) {}

        impl<$($T),+> Fields for ($($T,)+) {
            const COUNT: usize = $count;
            const ALIGN: usize = max_align(&[$(align_of::<$T>()),+]);
            const ROW_SIZE: usize = 0 $(+ size_of::<$T>())+;

            type Columns = ($(Column<$T>,)+);
            type Offsets = [usize; $count];
            type Ref<'a> = ($(&'a $T,)+) where Self: 'a;
            type Mut<'a> = ($(&'a mut $T,)+) where Self: 'a;
            type Slices<'a> = ($(&'a [$T],)+) where Self: 'a;
            type SlicesMut<'a> = ($(&'a mut [$T],)+) where Self: 'a;
            type Inline<const N: usize> = inline_storage!(N; $($T),+);

            fn plan(capacity: usize) -> Result<LayoutPlan<Self::Offsets>> {
                let mut planner = LayoutPlanner::new(capacity);
                let offsets = [$(planner.column::<$T>()?),+];
                planner.finish(offsets)
            }

            #[inline]
            fn dangling() -> Self::Columns {
                ($(Column::<$T>::dangling(),)+)
            }

            #[inline]
            unsafe fn columns_at(base: NonNull<u8>, offsets: &Self::Offsets) -> Self::Columns {
                // SAFETY: `offsets` come from the plan of the allocation at `base`.
                unsafe { ($(Column::<$T>::at_offset(base, offsets[$idx]),)+) }
            }

            #[inline]
            fn addresses(columns: &Self::Columns) -> Self::Offsets {
                [$(columns.$idx.addr()),+]
            }

            fn columns_within(
                columns: &Self::Columns,
                base: usize,
                size: usize,
                capacity: usize,
            ) -> bool {
                true $(&& columns.$idx.lies_within(base, size, capacity))+
            }

            #[inline]
            unsafe fn write(columns: &Self::Columns, index: usize, row: Self) {
                // SAFETY: forwarded per column.
                unsafe { $(columns.$idx.write(index, row.$idx);)+ }
            }

            #[inline]
            unsafe fn read(columns: &Self::Columns, index: usize) -> Self {
                // SAFETY: forwarded per column.
                unsafe { ($(columns.$idx.read(index),)+) }
            }

            #[inline]
            unsafe fn replace(columns: &Self::Columns, index: usize, row: Self) -> Self {
                // SAFETY: forwarded per column.
                unsafe { ($(columns.$idx.replace(index, row.$idx),)+) }
            }

            #[inline]
            unsafe fn get<'a>(columns: &Self::Columns, index: usize) -> Self::Ref<'a>
            where
                Self: 'a,
            {
                // SAFETY: forwarded per column.
                unsafe { ($(columns.$idx.get(index),)+) }
            }

            #[inline]
            unsafe fn get_mut<'a>(columns: &Self::Columns, index: usize) -> Self::Mut<'a>
            where
                Self: 'a,
            {
                // SAFETY: forwarded per column; distinct columns never alias.
                unsafe { ($(columns.$idx.get_mut(index),)+) }
            }

            #[inline]
            unsafe fn slices<'a>(columns: &Self::Columns, len: usize) -> Self::Slices<'a>
            where
                Self: 'a,
            {
                // SAFETY: forwarded per column.
                unsafe { ($(columns.$idx.as_slice(len),)+) }
            }

            #[inline]
            unsafe fn slices_mut<'a>(columns: &Self::Columns, len: usize) -> Self::SlicesMut<'a>
            where
                Self: 'a,
            {
                // SAFETY: forwarded per column; distinct columns never alias.
                unsafe { ($(columns.$idx.as_mut_slice(len),)+) }
            }

            unsafe fn relocate(
                src: &Self::Columns,
                begin: usize,
                end: usize,
                dest: &Self::Columns,
                dest_begin: usize,
            ) {
                // SAFETY: forwarded per column.
                unsafe { $(src.$idx.move_and_destroy(begin, end, dest.$idx, dest_begin);)+ }
            }

            unsafe fn shift(columns: &Self::Columns, from: usize, to: usize, count: usize) {
                // SAFETY: forwarded per column.
                unsafe { $(columns.$idx.shift(from, to, count);)+ }
            }

            unsafe fn drop_range(columns: &Self::Columns, begin: usize, end: usize) {
                // SAFETY: forwarded per column.
                unsafe { $(columns.$idx.drop_range(begin, end);)+ }
            }

            unsafe fn insert_one(columns: &Self::Columns, pos: usize, len: usize, row: Self) {
                // SAFETY: forwarded per column.
                unsafe { $(columns.$idx.insert_one(pos, len, row.$idx);)+ }
            }

            unsafe fn erase(columns: &Self::Columns, first: usize, last: usize, len: usize) {
                // SAFETY: forwarded per column.
                unsafe { $(columns.$idx.erase(first, last, len);)+ }
            }

            unsafe fn swap_remove(columns: &Self::Columns, pos: usize, len: usize) -> Self {
                // SAFETY: forwarded per column.
                unsafe { ($(columns.$idx.swap_remove(pos, len),)+) }
            }

            unsafe fn remove(columns: &Self::Columns, pos: usize, len: usize) -> Self {
                // SAFETY: forwarded per column.
                unsafe { ($(columns.$idx.remove(pos, len),)+) }
            }

            unsafe fn rotate_left(columns: &Self::Columns, begin: usize, end: usize, mid: usize) {
                // SAFETY: forwarded per column.
                unsafe { $(columns.$idx.rotate_left(begin, end, mid);)+ }
            }

            unsafe fn swap_rows(columns: &Self::Columns, a: usize, b: usize) {
                // SAFETY: forwarded per column.
                unsafe { $(columns.$idx.swap(a, b);)+ }
            }
        }

        impl<$($T: Clone),+> CloneFields for ($($T,)+) {
            unsafe fn fill(columns: &Self::Columns, begin: usize, n: usize, value: &Self) {
                // SAFETY: forwarded per column.
                unsafe { $(columns.$idx.fill(begin, n, &value.$idx);)+ }
            }

            unsafe fn clone_range(
                dest: &Self::Columns,
                dest_begin: usize,
                src: &Self::Columns,
                src_begin: usize,
                n: usize,
            ) {
                // SAFETY: forwarded per column.
                unsafe { $(dest.$idx.clone_from_column(dest_begin, src.$idx, src_begin, n);)+ }
            }

            unsafe fn insert_and_fill(
                columns: &Self::Columns,
                pos: usize,
                n: usize,
                len: usize,
                value: &Self,
            ) {
                // SAFETY: forwarded per column.
                unsafe { $(columns.$idx.insert_and_fill(pos, n, len, &value.$idx);)+ }
            }

            unsafe fn insert_range(
                columns: &Self::Columns,
                pos: usize,
                n: usize,
                len: usize,
                src: &Self::Columns,
                src_begin: usize,
            ) {
                // SAFETY: forwarded per column.
                unsafe { $(columns.$idx.insert_range(pos, n, len, src.$idx, src_begin);)+ }
            }
        }

        impl<$($T: PartialEq),+> EqFields for ($($T,)+) {
            unsafe fn row_eq(a: &Self::Columns, i: usize, b: &Self::Columns, j: usize) -> bool {
                // SAFETY: both rows are live.
                unsafe { true $(&& a.$idx.get(i) == b.$idx.get(j))+ }
            }
        }

        impl<$($T: PartialOrd),+> OrdFields for ($($T,)+) {
            unsafe fn row_partial_cmp(
                a: &Self::Columns,
                i: usize,
                b: &Self::Columns,
                j: usize,
            ) -> Option<Ordering> {
                $(
                    // SAFETY: both rows are live.
                    match unsafe { a.$idx.get(i).partial_cmp(b.$idx.get(j)) } {
                        Some(Ordering::Equal) => {}
                        ordering => return ordering,
                    }
                )+
                Some(Ordering::Equal)
            }
        }

        impl<$($T: fmt::Debug),+> DebugFields for ($($T,)+) {
            unsafe fn fmt_row(
                columns: &Self::Columns,
                index: usize,
                f: &mut fmt::Formatter<'_>,
            ) -> fmt::Result {
                // SAFETY: the row is live.
                let row = unsafe { ($(columns.$idx.get(index),)+) };
                fmt::Debug::fmt(&row, f)
            }
        }

        impl_fields!(@columns ($($T),+); $($idx : $T),+);
    };
}

impl_fields!(1; 0: A);
impl_fields!(2; 0: A, 1: B);
impl_fields!(3; 0: A, 1: B, 2: C);
impl_fields!(4; 0: A, 1: B, 2: C, 3: D);
impl_fields!(5; 0: A, 1: B, 2: C, 3: D, 4: E);
impl_fields!(6; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F);
impl_fields!(7; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G);
impl_fields!(8; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H);
impl_fields!(9; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H, 8: I);
impl_fields!(10; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H, 8: I, 9: J);
impl_fields!(11; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H, 8: I, 9: J, 10: K);
impl_fields!(12; 0: A, 1: B, 2: C, 3: D, 4: E, 5: F, 6: G, 7: H, 8: I, 9: J, 10: K, 11: L);

#[cfg(test)]
mod tests {
    use super::*;

    fn inline_fits<F: Fields, const N: usize>() -> Result<bool> {
        let plan = F::plan(N)?;
        Ok(plan.size() <= size_of::<F::Inline<N>>() && plan.align() <= align_of::<F::Inline<N>>())
    }

    fn column_of_addr<F: ColumnOf<T, I>, T, I>(columns: &F::Columns) -> usize {
        F::column_of(columns).addr()
    }

    #[test]
    fn test_constants() {
        assert_eq!(<(u8, u64, u16) as Fields>::COUNT, 3);
        assert_eq!(<(u8, u64, u16) as Fields>::ALIGN, 8);
        assert_eq!(<(u8, u64, u16) as Fields>::ROW_SIZE, 11);
        assert_eq!(<((),) as Fields>::ROW_SIZE, 0);
        assert_eq!(
            <(u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u32) as Fields>::COUNT,
            MAX_ARITY
        );
    }

    #[test]
    fn test_plan_matches_planner() -> Result<()> {
        let plan = <(u8, u64, u16)>::plan(3)?;
        assert_eq!(plan.offsets(), &[0, 8, 32]);
        assert_eq!(plan.size(), 38);

        let empty = <(u32, f64)>::plan(0)?;
        assert!(empty.is_empty());
        Ok(())
    }

    #[test]
    fn test_inline_storage_holds_plan() -> Result<()> {
        // Rust tuples may reorder fields and come out smaller than the plan;
        // the inline storage keeps declaration order.
        assert!(inline_fits::<(u8, u32, u8), 1>()?);
        assert!(inline_fits::<(u8, u64, u16), 7>()?);
        assert!(inline_fits::<(u16, u8, u64, u8, u32), 13>()?);
        assert!(inline_fits::<(u64,), 4>()?);
        assert!(inline_fits::<(u8, u64), 0>()?);
        Ok(())
    }

    #[test]
    fn test_column_at_types() {
        fn column_size<F: ColumnAt<I>, const I: usize>() -> usize {
            size_of::<<F as ColumnAt<I>>::Type>()
        }
        assert_eq!(column_size::<(u8, u64, u16), 0>(), 1);
        assert_eq!(column_size::<(u8, u64, u16), 1>(), 8);
        assert_eq!(column_size::<(u8, u64, u16), 2>(), 2);
    }

    #[test]
    fn test_column_of_resolves_unique_type() -> Result<()> {
        let mut storage = [MaybeUninit::<u64>::uninit(); 8];
        let base = NonNull::from(&mut storage).cast::<u8>();
        let plan = <(u8, u64, u16)>::plan(2)?;
        // SAFETY: the plan needs 28 bytes at alignment 8; `storage` has 64.
        let columns = unsafe { <(u8, u64, u16)>::columns_at(base, plan.offsets()) };

        assert_eq!(column_of_addr::<(u8, u64, u16), u64, _>(&columns), columns.1.addr());
        assert_eq!(column_of_addr::<(u8, u64, u16), u16, _>(&columns), base.as_ptr() as usize + 24);
        assert_eq!(<(u8, u64, u16) as ColumnAt<0>>::column(&columns).addr(), base.as_ptr() as usize);
        Ok(())
    }

    #[test]
    fn test_row_helpers() -> Result<()> {
        let mut storage = [MaybeUninit::<u64>::uninit(); 8];
        let base = NonNull::from(&mut storage).cast::<u8>();
        let plan = <(u32, u16)>::plan(2)?;
        // SAFETY: the plan for 2 rows of (u32, u16) needs 12 bytes at
        // alignment 4; `storage` provides 64 bytes at alignment 8.
        unsafe {
            let columns = <(u32, u16)>::columns_at(base, plan.offsets());
            <(u32, u16)>::write(&columns, 0, (1, 10));
            <(u32, u16)>::write(&columns, 1, (2, 20));

            assert!(<(u32, u16)>::row_eq(&columns, 0, &columns, 0));
            assert_eq!(
                <(u32, u16)>::row_partial_cmp(&columns, 0, &columns, 1),
                Some(Ordering::Less)
            );
            assert_eq!(<(u32, u16)>::get(&columns, 1), (&2, &20));
            assert_eq!(<(u32, u16)>::slices(&columns, 2), (&[1u32, 2][..], &[10u16, 20][..]));

            <(u32, u16)>::swap_rows(&columns, 0, 1);
            assert_eq!(<(u32, u16)>::read(&columns, 0), (2, 20));
            assert_eq!(<(u32, u16)>::read(&columns, 1), (1, 10));
            assert!(<(u32, u16)>::columns_within(&columns, base.as_ptr() as usize, 12, 2));
        }
        Ok(())
    }
}
