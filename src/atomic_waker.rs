//! Waker slot shared between a waiting transfer and the completion interrupt.
//!
//! At most one future waits on a [`crate::Completion`] at a time, so a single slot is enough.

use core::{cell::UnsafeCell, task::Waker};

/// A single waker slot, guarded by critical sections.
pub struct AtomicWaker {
    waker: UnsafeCell<Option<Waker>>,
}

// SAFETY: The `UnsafeCell` is only accessed inside critical sections.
unsafe impl Send for AtomicWaker {}
// SAFETY: The `UnsafeCell` is only accessed inside critical sections.
unsafe impl Sync for AtomicWaker {}

impl AtomicWaker {
    /// Create an empty slot.
    pub const fn new() -> Self {
        Self {
            waker: UnsafeCell::new(None),
        }
    }

    /// Store the waker of the task waiting for completion, replacing any previous one.
    ///
    /// The waker is only cloned when it would not wake the same task as the stored one.
    pub fn register(&self, new_waker: &Waker) {
        critical_section::with(|_| {
            // SAFETY: Exclusive access inside the critical section, no reentrant access.
            let slot = unsafe { &mut *self.waker.get() };
            match slot {
                Some(w) if w.will_wake(new_waker) => {}
                _ => *slot = Some(new_waker.clone()),
            }
        });
    }

    /// Wake and clear the stored waker, if any.
    pub fn wake(&self) {
        // SAFETY: Exclusive access inside the critical section, no reentrant access.
        if let Some(w) = critical_section::with(|_| unsafe { &mut *self.waker.get() }.take()) {
            w.wake();
        }
    }
}
