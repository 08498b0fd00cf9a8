//! Allocation accounting.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use husk_factory::{RawAllocator, SYSTEM};

/// [`RawAllocator`] that counts calls and live bytes, delegating to the
/// system allocator.
///
/// `const`-constructible so tests can declare it as a `static`:
///
/// ```
/// use husk_test_utils::CountingAllocator;
///
/// static ALLOC: CountingAllocator = CountingAllocator::new();
/// assert_eq!(ALLOC.live(), 0);
/// ```
#[derive(Debug, Default)]
pub struct CountingAllocator {
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    live_bytes: AtomicUsize,
}

impl CountingAllocator {
    pub const fn new() -> Self {
        Self {
            allocations: AtomicUsize::new(0),
            deallocations: AtomicUsize::new(0),
            live_bytes: AtomicUsize::new(0),
        }
    }

    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    pub fn deallocations(&self) -> usize {
        self.deallocations.load(Ordering::SeqCst)
    }

    /// Allocations not yet released.
    pub fn live(&self) -> usize {
        self.allocations().saturating_sub(self.deallocations())
    }

    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::SeqCst)
    }
}

// SAFETY: delegates to `SYSTEM`, which upholds the contract.
unsafe impl RawAllocator for CountingAllocator {
    unsafe fn allocate_zeroed(&self, layout: Layout) -> NonNull<u8> {
        self.allocations.fetch_add(1, Ordering::SeqCst);
        self.live_bytes.fetch_add(layout.size(), Ordering::SeqCst);
        // SAFETY: forwarded caller guarantee.
        unsafe { SYSTEM.allocate_zeroed(layout) }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.deallocations.fetch_add(1, Ordering::SeqCst);
        self.live_bytes.fetch_sub(layout.size(), Ordering::SeqCst);
        // SAFETY: forwarded caller guarantee.
        unsafe { SYSTEM.deallocate(ptr, layout) }
    }
}
