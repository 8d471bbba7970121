//! Integration tests for `FixedTupleVec`: lent buffers, overflow and the
//! no-overflow refusal.

use core::mem::MaybeUninit;

use tuplevec::{
    Error, FixedTupleVec, HeapAllocator, InlineBuffer, Result, TrackingAllocator,
};

#[test]
fn test_overflow_moves_rows_to_the_overflow_allocator() -> Result<()> {
    let tracking = TrackingAllocator::new(HeapAllocator::new());
    let mut buffer = InlineBuffer::<(u64, u8), 3>::new();
    let mut vec = FixedTupleVec::<'_, _, _, true>::new_in(&mut buffer, &tracking)?;

    vec.extend_rows([(1, 1), (2, 2), (3, 3)])?;
    assert!(vec.full());
    assert!(!vec.has_overflowed());
    assert_eq!(tracking.stats().allocations, 0);

    vec.push((4, 4))?;
    assert!(vec.has_overflowed());
    assert!(vec.full());
    assert_eq!(vec.max_size(), 3);
    assert_eq!(vec.capacity(), 6);
    assert_eq!(tracking.stats().allocations, 1);
    assert_eq!(vec.column::<0>(), &[1, 2, 3, 4]);
    vec.validate()?;

    drop(vec);
    assert_eq!(tracking.stats().outstanding(), 0);
    Ok(())
}

#[test]
fn test_no_overflow_leaves_container_unchanged() -> Result<()> {
    let mut buffer = InlineBuffer::<(u16, char), 2>::new();
    let mut vec: FixedTupleVec<'_, (u16, char), HeapAllocator, false> =
        FixedTupleVec::new(&mut buffer)?;
    assert!(!vec.can_overflow());

    vec.push((1, 'a'))?;
    vec.push((2, 'b'))?;
    assert_eq!(vec.push((3, 'c')), Err(Error::CAPACITY_EXCEEDED));
    assert_eq!(vec.insert_n(0, 1, &(0, 'z')), Err(Error::CAPACITY_EXCEEDED));
    assert_eq!(vec.reserve(3), Err(Error::CAPACITY_EXCEEDED));

    assert_eq!(vec.len(), 2);
    assert_eq!(vec.capacity(), 2);
    assert_eq!(vec.column::<1>(), &['a', 'b']);

    // Room inside the buffer is still usable.
    vec.pop();
    vec.insert(0, (0, 'z'))?;
    assert_eq!(vec.column::<0>(), &[0, 1]);
    Ok(())
}

#[test]
fn test_swap_exchanges_buffers_without_allocating() -> Result<()> {
    let tracking = TrackingAllocator::new(HeapAllocator::new());
    let mut small = InlineBuffer::<(u32,), 2>::new();
    let mut large = InlineBuffer::<(u32,), 8>::new();
    let mut a = FixedTupleVec::<'_, _, _, true>::new_in(&mut small, &tracking)?;
    let mut b = FixedTupleVec::<'_, _, _, true>::new_in(&mut large, &tracking)?;
    a.push((1,))?;
    b.extend_rows([(5,), (6,), (7,)])?;

    a.swap(&mut b);

    assert_eq!(tracking.stats().allocations, 0);
    assert_eq!(a.max_size(), 8);
    assert_eq!(b.max_size(), 2);
    assert_eq!(a.column::<0>(), &[5, 6, 7]);
    assert_eq!(b.column::<0>(), &[1]);
    assert!(!a.has_overflowed() && !b.has_overflowed());
    Ok(())
}

#[test]
fn test_shrink_to_fit_returns_to_the_buffer() -> Result<()> {
    let tracking = TrackingAllocator::new(HeapAllocator::new());
    let mut buffer = InlineBuffer::<(u32, u32), 4>::new();
    let mut vec = FixedTupleVec::<'_, _, _, true>::new_in(&mut buffer, &tracking)?;
    vec.extend_rows((0..6).map(|i| (i, i * i)))?;
    assert!(vec.has_overflowed());

    // Too many rows for the buffer: the overflow block is rebuilt.
    vec.shrink_to_fit()?;
    assert!(vec.has_overflowed());
    assert_eq!(vec.capacity(), 6);

    vec.truncate(3);
    vec.shrink_to_fit()?;
    assert!(!vec.has_overflowed());
    assert_eq!(vec.capacity(), 4);
    assert_eq!(vec.column::<1>(), &[0, 1, 4]);
    assert_eq!(tracking.stats().outstanding(), 0);

    // Without an overflow nothing changes.
    vec.shrink_to_fit()?;
    assert_eq!(vec.capacity(), 4);
    Ok(())
}

#[test]
fn test_byte_buffer_capacity_accounts_for_alignment() -> Result<()> {
    let mut bytes = [MaybeUninit::<u8>::uninit(); 100];
    let vec: FixedTupleVec<'_, (u8, u32, u16)> =
        FixedTupleVec::from_bytes(&mut bytes[1..], HeapAllocator::new())?;
    let max_size = vec.max_size();
    // 7 bytes per row plus at most 3 + 3 bytes of alignment padding.
    assert!((12..=14).contains(&max_size));
    assert_eq!(vec.capacity(), max_size);
    vec.validate()
}

#[test]
fn test_into_inner_keeps_rows() -> Result<()> {
    let mut buffer = InlineBuffer::<(i8, i8), 2>::new();
    let mut vec: FixedTupleVec<'_, (i8, i8)> = FixedTupleVec::new(&mut buffer)?;
    vec.push((-1, 1))?;
    let inner = vec.into_inner();
    assert_eq!(inner.first(), Some((&-1, &1)));
    assert_eq!(inner.allocator().buffer_len(), 4);
    Ok(())
}
