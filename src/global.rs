//! The program-wide transport behind [`crate::tracef!`].
//!
//! One [`Trace`] implementation can be installed with [`set_global`]. Until then every call
//! is a successful no-op. Calls are serialized with an atomic flag instead of a critical
//! section, so the interrupt that completes a transfer can still run while a trace waits
//! for it. A call that arrives while another one is in progress, from an interrupt handler
//! or a second thread, does not wait: traces are dropped and sends report
//! [`AdapterError::Busy`].

use crate::{AdapterError, Trace};
use core::{
    cell::UnsafeCell,
    fmt,
    mem::MaybeUninit,
    sync::atomic::{AtomicBool, Ordering},
};

/// Error returned by [`set_global`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetGlobalError {
    /// A global transport is already installed.
    AlreadySet,
}

impl fmt::Display for SetGlobalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetGlobalError::AlreadySet => write!(f, "global transport already set"),
        }
    }
}

impl core::error::Error for SetGlobalError {}

type Slot = &'static mut (dyn Trace + Send);

struct GlobalState {
    transport: UnsafeCell<MaybeUninit<Slot>>,
    /// Set by the first `set_global`, never cleared.
    claimed: AtomicBool,
    installed: AtomicBool,
    /// Held for the duration of a call through the installed transport.
    busy: AtomicBool,
}

// SAFETY: `transport` is written once, before `installed` is set with Release ordering,
// by the single caller that won the `claimed` swap. Afterwards it is only accessed
// mutably by the holder of the `busy` flag, which is acquired with an atomic swap.
unsafe impl Sync for GlobalState {}

static GLOBAL: GlobalState = GlobalState {
    transport: UnsafeCell::new(MaybeUninit::uninit()),
    claimed: AtomicBool::new(false),
    installed: AtomicBool::new(false),
    busy: AtomicBool::new(false),
};

enum Access<R> {
    Unset,
    Busy,
    Done(R),
}

/// Run `f` on the installed transport unless none is installed or it is in use.
fn with_transport<R>(f: impl FnOnce(&mut (dyn Trace + Send)) -> R) -> Access<R> {
    // Acquire: synchronizes with the Release store in `set_global`, so the slot is
    // fully written.
    if !GLOBAL.installed.load(Ordering::Acquire) {
        return Access::Unset;
    }
    if GLOBAL.busy.swap(true, Ordering::Acquire) {
        return Access::Busy;
    }

    let _release = Release;

    // SAFETY: `installed` guarantees the slot is initialized and the `busy` flag gives
    // this call exclusive access until `_release` is dropped.
    let transport: &mut (dyn Trace + Send) =
        unsafe { &mut **(*GLOBAL.transport.get()).assume_init_mut() };
    Access::Done(f(transport))
}

/// Clears the `busy` flag when dropped, also when the closure panics.
struct Release;

impl Drop for Release {
    fn drop(&mut self) {
        // Release: the next holder sees every write made through the transport.
        GLOBAL.busy.store(false, Ordering::Release);
    }
}

/// Install the program-wide transport.
///
/// The transport is usually initialized beforehand, but it may also be initialized later
/// through [`with`].
///
/// # Errors
///
/// Returns [`SetGlobalError::AlreadySet`] if called more than once.
pub fn set_global(transport: &'static mut (dyn Trace + Send)) -> Result<(), SetGlobalError> {
    if GLOBAL.claimed.swap(true, Ordering::AcqRel) {
        return Err(SetGlobalError::AlreadySet);
    }

    // SAFETY: Winning the `claimed` swap makes this the only writer, and no reader touches
    // the slot before `installed` is set.
    unsafe { GLOBAL.transport.get().write(MaybeUninit::new(transport)) };
    // Release: ensures the write to `transport` is visible before `installed` becomes true.
    GLOBAL.installed.store(true, Ordering::Release);
    Ok(())
}

/// Returns `true` once [`set_global`] succeeded.
pub fn is_set() -> bool {
    GLOBAL.installed.load(Ordering::Acquire)
}

/// Run `f` with exclusive access to the installed transport.
///
/// Returns `None` if no transport is installed or another call is in progress.
pub fn with<R>(f: impl FnOnce(&mut (dyn Trace + Send)) -> R) -> Option<R> {
    match with_transport(f) {
        Access::Done(r) => Some(r),
        Access::Unset | Access::Busy => None,
    }
}

/// Trace through the installed transport. Used by [`crate::tracef!`].
pub fn trace(args: fmt::Arguments<'_>) {
    if let Access::Busy = with_transport(|t| t.trace_formatted(args)) {
        trace!("reentrant trace dropped");
    }
}

/// Send raw bytes through the installed transport.
///
/// Succeeds without effect when no transport is installed. Fails with
/// [`AdapterError::Busy`] if another global call is in progress.
pub fn send_bytes(data: &[u8]) -> Result<(), AdapterError> {
    match with_transport(|t| t.send_bytes(data)) {
        Access::Unset => Ok(()),
        Access::Busy => Err(AdapterError::Busy),
        Access::Done(r) => r,
    }
}
