//! Allocators stacked on top of each other, as the containers use them.

#![allow(unsafe_code)]

use core::mem::MaybeUninit;

use tuplevec_alloc::{
    allocate_memory, deallocate_memory, Allocator, BudgetAllocator, Error, FixedBufferAllocator,
    HeapAllocator, Result, TrackingAllocator,
};

#[test]
fn test_tracking_over_budget() -> Result<()> {
    let tracking = TrackingAllocator::new(BudgetAllocator::new(HeapAllocator::new(), 256));

    let first = allocate_memory(&tracking, 200, 64, 0)?;
    assert_eq!(first.as_ptr() as usize % 64, 0);
    assert_eq!(allocate_memory(&tracking, 100, 8, 0), Err(Error::OUT_OF_MEMORY));

    let stats = tracking.stats();
    assert_eq!(stats.allocations, 1);
    assert_eq!(stats.failures, 1);
    assert_eq!(tracking.inner().remaining(), 56);

    // SAFETY: `first` came from `allocate_memory` with these parameters.
    unsafe { deallocate_memory(&tracking, first, 200, 64, 0) };
    assert_eq!(tracking.inner().live_bytes(), 0);
    assert_eq!(tracking.stats().outstanding(), 0);
    Ok(())
}

#[test]
fn test_fixed_buffer_overflow_through_tracking() -> Result<()> {
    let mut storage = [MaybeUninit::<u8>::uninit(); 32];
    let tracking = TrackingAllocator::new(HeapAllocator::new());
    let fixed: FixedBufferAllocator<'_, _, true> = FixedBufferAllocator::new(&mut storage, &tracking);

    let (start, bytes) = fixed.aligned_region(1)?.ok_or(Error::CAPACITY_EXCEEDED)?;
    assert_eq!(bytes, 32);
    // SAFETY: releasing the lent buffer is a no-op.
    unsafe { deallocate_memory(&fixed, start, bytes, 1, 0) };

    let block = allocate_memory(&fixed, 96, 16, 0)?;
    assert!(!fixed.owns(block));
    // SAFETY: `block` came from `allocate_memory` on `fixed`.
    unsafe { deallocate_memory(&fixed, block, 96, 16, 0) };

    let stats = tracking.stats();
    assert_eq!(stats.allocations, 1);
    assert_eq!(stats.deallocations, 1);
    Ok(())
}

#[test]
fn test_names() {
    let mut heap = HeapAllocator::with_name("arena");
    assert_eq!(heap.name(), "arena");
    heap.set_name("renamed");
    assert_eq!(heap.name(), "renamed");

    let mut storage = [MaybeUninit::<u8>::uninit(); 8];
    let mut fixed: FixedBufferAllocator<'_, HeapAllocator, false> =
        FixedBufferAllocator::new(&mut storage, HeapAllocator::new());
    fixed.set_name("fixed");
    assert_eq!(fixed.name(), "fixed");
    assert_eq!(fixed.overflow_allocator().name(), tuplevec_alloc::DEFAULT_NAME);
}
