//! Single-slot completion signal written from interrupt context.

use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "async-await")]
use crate::atomic_waker::AtomicWaker;

/// USART event bits a driver passes to [`Completion::signal`].
pub mod event {
    /// Send completed; the transmit buffer may be reused.
    pub const SEND_COMPLETE: u32 = 1 << 0;
    /// Receive completed.
    pub const RECEIVE_COMPLETE: u32 = 1 << 1;
    /// Transfer completed.
    pub const TRANSFER_COMPLETE: u32 = 1 << 2;
    /// Transmit completed, the last bit left the shift register.
    pub const TX_COMPLETE: u32 = 1 << 3;
    /// Transmit data not available.
    pub const TX_UNDERFLOW: u32 = 1 << 4;
    /// Receive data overflow.
    pub const RX_OVERFLOW: u32 = 1 << 5;
    /// Receive character timeout.
    pub const RX_TIMEOUT: u32 = 1 << 6;
    /// Break detected on receive.
    pub const RX_BREAK: u32 = 1 << 7;
    /// Framing error detected on receive.
    pub const RX_FRAMING_ERROR: u32 = 1 << 8;
    /// Parity error detected on receive.
    pub const RX_PARITY_ERROR: u32 = 1 << 9;
}

/// The last completion event reported by the driver.
///
/// The transport clears it before starting a transfer and then waits for it to become
/// non-zero. The driver, usually from its interrupt handler, calls [`signal`](Self::signal)
/// exactly once per finished transfer. Place it in a `static` and hand it to
/// [`crate::Transport::init`].
///
/// There is one producer (the interrupt) and one consumer (the transport).
pub struct Completion {
    event: AtomicU32,
    #[cfg(feature = "async-await")]
    waker: AtomicWaker,
}

impl Completion {
    /// Create a cleared signal.
    pub const fn new() -> Self {
        Self {
            event: AtomicU32::new(0),
            #[cfg(feature = "async-await")]
            waker: AtomicWaker::new(),
        }
    }

    /// Record `event` and wake the waiting task, if any.
    ///
    /// A zero event carries no information and is ignored.
    pub fn signal(&self, event: u32) {
        if event == 0 {
            return;
        }
        // Release: pairs with the Acquire load in `event`, so the waiter observes every
        // write the driver made before reporting completion.
        self.event.store(event, Ordering::Release);
        #[cfg(feature = "async-await")]
        self.waker.wake();
    }

    /// Clear the recorded event.
    pub fn reset(&self) {
        self.event.store(0, Ordering::SeqCst);
    }

    /// The recorded event mask, `0` if nothing was signalled since the last reset.
    #[inline]
    pub fn event(&self) -> u32 {
        self.event.load(Ordering::Acquire)
    }

    /// Returns `true` once an event has been signalled.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.event() != 0
    }

    /// Spin until an event is signalled and return it.
    ///
    /// There is no timeout. If the driver never signals, this never returns.
    pub fn wait_blocking(&self) -> u32 {
        loop {
            let event = self.event();
            if event != 0 {
                return event;
            }
            core::hint::spin_loop();
        }
    }

    /// Wait until an event is signalled and return it.
    #[cfg(feature = "async-await")]
    pub async fn wait(&self) -> u32 {
        core::future::poll_fn(|cx| {
            let event = self.event();
            if event != 0 {
                return core::task::Poll::Ready(event);
            }
            self.waker.register(cx.waker());
            // The signal may have landed between the check and the registration.
            match self.event() {
                0 => core::task::Poll::Pending,
                event => core::task::Poll::Ready(event),
            }
        })
        .await
    }
}

impl core::fmt::Debug for Completion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Completion")
            .field("event", &self.event())
            .finish()
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}
