//! Allocation failure of the fallible constructor.
//!
//! Runs in its own test binary, because it installs a global allocator that
//! refuses every request for the layout of [`Doomed`].

use std::{
    alloc::{GlobalAlloc, Layout, System},
    sync::atomic::{AtomicUsize, Ordering},
};

use sole_internals::RawOwn;

struct RefusingAllocator;

// SAFETY: Every request is either forwarded unchanged to `System` or refused
// by returning null, which the `GlobalAlloc` contract allows.
unsafe impl GlobalAlloc for RefusingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout == Layout::new::<Doomed>() {
            return std::ptr::null_mut();
        }
        // SAFETY: Forwarded with the caller's guarantees
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: Only memory handed out by `System` reaches this point
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static ALLOCATOR: RefusingAllocator = RefusingAllocator;

static DOOMED_DROPS: AtomicUsize = AtomicUsize::new(0);

/// A type with a layout nothing else in this binary asks for.
#[repr(C, align(2048))]
struct Doomed {
    _payload: [u8; 5000],
}

impl Drop for Doomed {
    fn drop(&mut self) {
        DOOMED_DROPS.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_try_new_reports_failed_layout() {
    let error = match RawOwn::try_new(Doomed { _payload: [7; 5000] }) {
        Ok(_) => panic!("the allocator refuses this layout"),
        Err(error) => error,
    };
    assert_eq!(error.layout(), Layout::new::<Doomed>());
    assert_eq!(DOOMED_DROPS.load(Ordering::SeqCst), 1);
    assert!(error.to_string().contains("align 2048"));

    // Other layouts are still served
    let owner = RawOwn::try_new(5_u64).unwrap();
    assert_eq!(owner.attached_len(), 0);
    drop(owner);
    assert_eq!(DOOMED_DROPS.load(Ordering::SeqCst), 1);
}
