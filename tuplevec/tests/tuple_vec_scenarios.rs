//! Integration tests for `TupleVec` row operations, allocator traffic and
//! drop accounting.

use std::{cell::Cell, rc::Rc};

use tuplevec::{
    tuple_vec, Allocator, BudgetAllocator, Error, HeapAllocator, Result, TrackingAllocator,
    TupleVec,
};

/// Value that counts how many instances are alive.
#[derive(Debug)]
struct Counted {
    value: u32,
    alive: Rc<Cell<isize>>,
}

impl Counted {
    fn new(value: u32, alive: &Rc<Cell<isize>>) -> Self {
        alive.set(alive.get() + 1);
        Self {
            value,
            alive: Rc::clone(alive),
        }
    }
}

impl Clone for Counted {
    fn clone(&self) -> Self {
        Self::new(self.value, &self.alive)
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        self.alive.set(self.alive.get() - 1);
    }
}

impl PartialEq for Counted {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

fn values<A: Allocator>(vec: &TupleVec<(Counted, u8), A>) -> Vec<u32> {
    vec.column::<0>().iter().map(|counted| counted.value).collect()
}

#[test]
fn test_push_past_capacity_reallocates_once() -> Result<()> {
    let tracking = TrackingAllocator::new(HeapAllocator::new());
    let mut vec: TupleVec<(i32, f64), _> = TupleVec::with_capacity_in(2, &tracking)?;
    assert_eq!(tracking.stats().allocations, 1);

    vec.push((1, 1.0))?;
    vec.push((2, 2.0))?;
    assert_eq!(tracking.stats().allocations, 1);
    vec.push((3, 3.0))?;

    assert_eq!(tracking.stats().allocations, 2);
    assert_eq!(tracking.stats().deallocations, 1);
    assert_eq!(vec.len(), 3);
    assert_eq!(vec.column::<0>(), &[1, 2, 3]);
    assert_eq!(vec.column::<1>(), &[1.0, 2.0, 3.0]);
    vec.validate()
}

#[test]
fn test_insert_n_in_place() -> Result<()> {
    let tracking = TrackingAllocator::new(HeapAllocator::new());
    let mut vec: TupleVec<(i32, f64), _> = TupleVec::with_capacity_in(5, &tracking)?;
    vec.extend_rows([(1, 1.0), (2, 2.0), (3, 3.0)])?;

    assert_eq!(vec.insert_n(1, 2, &(9, 9.0))?, 1);

    assert_eq!(tracking.stats().allocations, 1);
    assert_eq!(vec.capacity(), 5);
    let rows: Vec<(i32, f64)> = vec.iter().map(|(a, b)| (*a, *b)).collect();
    assert_eq!(rows, [(1, 1.0), (9, 9.0), (9, 9.0), (2, 2.0), (3, 3.0)]);
    Ok(())
}

#[test]
fn test_insert_n_past_capacity_builds_gap_in_new_block() -> Result<()> {
    let tracking = TrackingAllocator::new(HeapAllocator::new());
    let mut vec: TupleVec<(i32, f64), _> = TupleVec::with_capacity_in(4, &tracking)?;
    vec.extend_rows([(1, 1.0), (2, 2.0), (3, 3.0)])?;

    vec.insert_n(1, 2, &(9, 9.0))?;

    assert_eq!(tracking.stats().allocations, 2);
    assert_eq!(vec.capacity(), 8);
    assert_eq!(vec.column::<0>(), &[1, 9, 9, 2, 3]);
    assert_eq!(vec.column::<1>(), &[1.0, 9.0, 9.0, 2.0, 3.0]);
    Ok(())
}

#[test]
fn test_shrink_to_fit_reallocates_once() -> Result<()> {
    let tracking = TrackingAllocator::new(HeapAllocator::new());
    let mut vec: TupleVec<(u8, u64), _> = TupleVec::with_capacity_in(8, &tracking)?;
    vec.extend_rows([(1, 10), (2, 20), (3, 30)])?;
    tracking.reset();

    vec.shrink_to_fit()?;

    assert_eq!(vec.capacity(), 3);
    assert_eq!(tracking.stats().allocations, 1);
    assert_eq!(vec.column::<0>(), &[1, 2, 3]);
    assert_eq!(vec.column::<1>(), &[10, 20, 30]);
    Ok(())
}

#[test]
fn test_stable_erase_keeps_order() -> Result<()> {
    let mut vec = TupleVec::from_rows([(0, 'a'), (1, 'b'), (2, 'c'), (3, 'd'), (4, 'e')])?;
    assert_eq!(vec.erase(1..3), 1);
    assert_eq!(vec.column::<0>(), &[0, 3, 4]);
    assert_eq!(vec.column::<1>(), &['a', 'd', 'e']);

    assert_eq!(vec.erase(2..), 2);
    assert_eq!(vec.erase(..0), 0);
    assert_eq!(vec.column::<1>(), &['a', 'd']);
    Ok(())
}

#[test]
fn test_erase_unsorted_moves_last_row() -> Result<()> {
    let mut vec = TupleVec::from_rows([(0, 'a'), (1, 'b'), (2, 'c'), (3, 'd')])?;
    assert_eq!(vec.erase_unsorted(1), 1);
    assert_eq!(vec.column::<0>(), &[0, 3, 2]);
    assert_eq!(vec.column::<1>(), &['a', 'd', 'c']);

    assert_eq!(vec.swap_remove(2), (2, 'c'));
    assert_eq!(vec.remove(0), (0, 'a'));
    assert_eq!(vec.column::<0>(), &[3]);
    Ok(())
}

#[test]
fn test_swap_never_calls_the_allocator() -> Result<()> {
    let tracking = TrackingAllocator::new(HeapAllocator::new());
    let mut a = TupleVec::from_rows_in([(1u8, 1u32), (2, 2)], &tracking)?;
    let mut b = TupleVec::from_rows_in([(7u8, 7u32)], &tracking)?;
    let before = tracking.stats();
    let (a_capacity, b_capacity) = (a.capacity(), b.capacity());

    a.swap(&mut b);

    assert_eq!(tracking.stats(), before);
    assert_eq!(a.column::<0>(), &[7]);
    assert_eq!(b.column::<1>(), &[1, 2]);
    assert_eq!((a.capacity(), b.capacity()), (b_capacity, a_capacity));
    Ok(())
}

#[test]
fn test_failed_growth_leaves_state_unchanged() -> Result<()> {
    let budget = BudgetAllocator::new(HeapAllocator::new(), 64);
    let mut vec: TupleVec<(u32, u32), _> = TupleVec::with_capacity_in(4, &budget)?;
    vec.extend_rows([(1, 10), (2, 20), (3, 30), (4, 40)])?;
    let data_before = vec.column_ptr::<0>();

    // Growing to 8 rows needs 64 more bytes while 32 are live.
    assert_eq!(vec.push((5, 50)), Err(Error::OUT_OF_MEMORY));
    assert_eq!(vec.insert(0, (0, 0)), Err(Error::OUT_OF_MEMORY));
    assert_eq!(vec.insert_n(2, 5, &(9, 9)), Err(Error::OUT_OF_MEMORY));
    assert_eq!(vec.reserve(100), Err(Error::OUT_OF_MEMORY));
    assert_eq!(vec.insert_iter(1, [(7, 7); 6]), Err(Error::OUT_OF_MEMORY));

    assert_eq!(vec.len(), 4);
    assert_eq!(vec.capacity(), 4);
    assert_eq!(vec.column_ptr::<0>(), data_before);
    assert_eq!(vec.column::<0>(), &[1, 2, 3, 4]);
    assert_eq!(vec.column::<1>(), &[10, 20, 30, 40]);
    vec.validate()
}

#[test]
fn test_failed_assign_keeps_old_rows() -> Result<()> {
    let budget = BudgetAllocator::new(HeapAllocator::new(), 64);
    let mut vec: TupleVec<(u32, u32), _> = TupleVec::with_capacity_in(4, &budget)?;
    vec.extend_rows([(1, 1), (2, 2), (3, 3)])?;

    // A filtered iterator has no exact size hint.
    let rows = (0..20).filter(|_| true).map(|i| (i, i));
    assert_eq!(vec.assign_iter(rows), Err(Error::OUT_OF_MEMORY));
    assert_eq!(vec.len(), 3);
    assert_eq!(vec.capacity(), 4);
    assert_eq!(vec.column::<0>(), &[1, 2, 3]);
    assert_eq!(vec.column::<1>(), &[1, 2, 3]);
    vec.validate()?;

    vec.assign_iter((10..11).filter(|_| true).map(|i| (i, i * 2)))?;
    assert_eq!(vec.column::<0>(), &[10]);
    assert_eq!(vec.column::<1>(), &[20]);
    assert_eq!(vec.capacity(), 4);
    vec.validate()
}

#[test]
fn test_capacity_overflow_is_reported() {
    let mut vec: TupleVec<(u64, u64)> = TupleVec::new();
    assert_eq!(vec.reserve(usize::MAX / 8), Err(Error::CAPACITY_OVERFLOW));
    assert!(vec.is_empty());
}

#[test]
fn test_every_row_dropped_exactly_once() -> Result<()> {
    let alive = Rc::new(Cell::new(0));
    {
        let mut vec = TupleVec::new();
        for i in 0..10 {
            vec.push((Counted::new(i, &alive), i as u8))?;
        }
        vec.insert_n(3, 4, &(Counted::new(100, &alive), 0))?;
        assert_eq!(alive.get(), 14);

        vec.erase(0..2);
        drop(vec.remove(0));
        vec.erase_unsorted(0);
        vec.truncate(8);
        assert_eq!(alive.get(), 8);

        let clone = vec.try_clone()?;
        assert_eq!(values(&clone), values(&vec));
        vec.assign(2, &(Counted::new(5, &alive), 5))?;
        assert_eq!(values(&vec), [5, 5]);
        drop(clone);
        assert_eq!(alive.get(), 2);
    }
    assert_eq!(alive.get(), 0);
    Ok(())
}

#[test]
fn test_half_consumed_into_iter_drops_the_rest() -> Result<()> {
    let alive = Rc::new(Cell::new(0));
    let tracking = TrackingAllocator::new(HeapAllocator::new());
    {
        let mut vec = TupleVec::new_in(&tracking);
        for i in 0..6 {
            vec.push((Counted::new(i, &alive), i as u8))?;
        }
        let mut rows = vec.into_iter();
        let (first, _) = rows.next().ok_or(Error::OUT_OF_MEMORY)?;
        let (last, _) = rows.next_back().ok_or(Error::OUT_OF_MEMORY)?;
        assert_eq!((first.value, last.value), (0, 5));
        assert_eq!(rows.len(), 4);
        drop(rows);
        assert_eq!(alive.get(), 2);
    }
    assert_eq!(alive.get(), 0);
    assert_eq!(tracking.stats().outstanding(), 0);
    Ok(())
}

#[test]
fn test_assign_family() -> Result<()> {
    let tracking = TrackingAllocator::new(HeapAllocator::new());
    let mut vec = TupleVec::from_rows_in([(1u16, 'a'), (2, 'b'), (3, 'c')], &tracking)?;

    vec.assign(2, &(0, 'z'))?;
    assert_eq!(vec.column::<1>(), &['z', 'z']);
    assert_eq!(vec.capacity(), 3);

    vec.assign_iter((0..6).map(|i| (i, 'x')))?;
    assert_eq!(vec.capacity(), 6);
    assert_eq!(vec.column::<0>(), &[0, 1, 2, 3, 4, 5]);

    let source = TupleVec::from_rows([(7u16, 'p'), (8, 'q'), (9, 'r')])?;
    vec.assign_range(&source, 1..)?;
    assert_eq!(vec.column::<0>(), &[8, 9]);
    assert_eq!(tracking.stats().outstanding(), 1);
    Ok(())
}

#[test]
fn test_insert_from_other_container() -> Result<()> {
    let mut target = TupleVec::from_rows([(1, "one"), (4, "four")])?;
    let source = TupleVec::from_rows([(0, "zero"), (2, "two"), (3, "three")])?;

    assert_eq!(target.insert_from(1, &source, 1..3)?, 1);
    assert_eq!(target.column::<0>(), &[1, 2, 3, 4]);

    target.reserve(10)?;
    target.insert_from(0, &source, ..1)?;
    assert_eq!(target.column::<1>(), &["zero", "one", "two", "three", "four"]);
    assert_eq!(target.capacity(), 10);
    Ok(())
}

#[test]
fn test_resize_and_defaults() -> Result<()> {
    let mut vec: TupleVec<(u8, String)> = TupleVec::from_default(2)?;
    vec.resize(4, &(1, "x".to_owned()))?;
    assert_eq!(vec.column::<0>(), &[0, 0, 1, 1]);

    vec.resize_default(5)?;
    let (number, text) = vec.push_default()?;
    *number = 9;
    text.push_str("pushed");
    assert_eq!(vec.len(), 6);
    assert_eq!(vec.at(5), (&9, &"pushed".to_owned()));

    vec.resize(1, &(0, String::new()))?;
    assert_eq!(vec.len(), 1);
    assert!(vec.capacity() >= 6);
    Ok(())
}

#[test]
fn test_rebind_and_move_with_allocator() -> Result<()> {
    let tracking = TrackingAllocator::new(HeapAllocator::new());
    let vec = TupleVec::from_rows([(1u32, 1.5f32), (2, 2.5)])?;

    let moved = vec.move_with_allocator(HeapAllocator::new())?;
    assert_eq!(moved.column::<0>(), &[1, 2]);

    let rebound = moved.rebind(&tracking)?;
    assert_eq!(rebound.column::<1>(), &[1.5, 2.5]);
    assert_eq!(tracking.stats().allocations, 1);
    drop(rebound);
    assert_eq!(tracking.stats().outstanding(), 0);
    Ok(())
}

#[test]
fn test_cursor_operations() -> Result<()> {
    let vec = TupleVec::from_rows([(10, 'a'), (20, 'b'), (30, 'c'), (40, 'd')])?;
    let other = TupleVec::from_rows([(10, 'a')])?;

    let start = vec.iter();
    let mut cursor = vec.iter();
    assert!(cursor.advance(3));
    assert_eq!(cursor.peek(), Some((&40, &'d')));
    assert!(cursor.retreat(2));
    assert_eq!(cursor.position(), 1);
    assert_eq!(cursor.get(1), Some((&30, &'c')));
    assert!(!cursor.advance(4));

    assert_eq!(start.distance_to(&cursor), Some(1));
    assert!(start < cursor);
    assert_ne!(start, cursor);
    assert_eq!(PartialOrd::partial_cmp(&start, &other.iter()), None);
    assert_eq!(start.distance_to(&other.iter()), None);

    assert_eq!(vec.iter().nth(2), Some((&30, &'c')));
    assert_eq!(vec.iter().rev().nth(0), Some((&40, &'d')));
    assert_eq!(vec.iter().len(), 4);
    Ok(())
}

#[test]
fn test_iter_mut_edits_every_column() -> Result<()> {
    let mut vec = TupleVec::from_rows([(1u32, 1.0f64), (2, 2.0)])?;
    for (id, weight) in &mut vec {
        *id *= 10;
        *weight /= 2.0;
    }
    assert_eq!(vec.column::<0>(), &[10, 20]);
    assert_eq!(vec.column::<1>(), &[0.5, 1.0]);
    Ok(())
}

#[test]
fn test_literal_macro_and_names() -> Result<()> {
    let vec = tuple_vec![(1u8, true), (2, false)]?;
    assert_eq!(vec.len(), 2);
    assert_eq!(vec.allocator().name(), tuplevec::DEFAULT_NAME);

    let mut filled = tuple_vec![(0u8, 'q'); 3]?;
    filled.set_allocator_name("particles");
    assert_eq!(filled.allocator().name(), "particles");

    let empty: TupleVec<(u8,)> = tuple_vec![]?;
    assert!(empty.is_empty());
    Ok(())
}

#[test]
fn test_reset_lose_memory_keeps_capacity() -> Result<()> {
    let mut vec = TupleVec::from_rows([(1u64, 2u64), (3, 4)])?;
    let capacity = vec.capacity();
    vec.reset_lose_memory();
    assert!(vec.is_empty());
    assert_eq!(vec.capacity(), capacity);
    vec.push((5, 6))?;
    assert_eq!(vec.first(), Some((&5, &6)));
    Ok(())
}

#[test]
fn test_zero_sized_columns_never_allocate() -> Result<()> {
    let tracking = TrackingAllocator::new(HeapAllocator::new());
    let mut vec = TupleVec::new_in(&tracking);
    for _ in 0..100 {
        vec.push(((), ()))?;
    }
    assert_eq!(vec.len(), 100);
    assert_eq!(tracking.stats().allocations, 0);
    vec.validate()
}
