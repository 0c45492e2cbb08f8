//! Coarse performance measurement with the free-running cycle counter.
//!
//! ```ignore
//! let mut timer = CycleTimer::new(Dwt::new(cp.DCB, cp.DWT));
//! let start = timer.start();
//! work();
//! let ns = cycles_to_nanoseconds(timer.elapsed(start), CORE_CLOCK_HZ);
//! ```
//!
//! The counter is 32 bits wide, so a measurement is only meaningful for spans shorter than
//! 2^32 cycles (about 10.7 s at 400 MHz).

use core::num::NonZeroU32;

/// A free-running counter incremented once per core clock cycle.
pub trait CycleCounter {
    /// Returns `true` if the counter is running.
    fn is_enabled(&self) -> bool;

    /// Start the counter.
    fn enable(&mut self);

    /// Current counter value.
    fn count(&self) -> u32;
}

/// Measures elapsed cycles on a [`CycleCounter`].
pub struct CycleTimer<C> {
    counter: C,
}

impl<C: CycleCounter> CycleTimer<C> {
    /// Wrap a counter.
    pub fn new(counter: C) -> Self {
        Self { counter }
    }

    /// Start the counter if it is not running and return its current value.
    pub fn start(&mut self) -> u32 {
        if !self.counter.is_enabled() {
            self.counter.enable();
        }
        self.counter.count()
    }

    /// Cycles elapsed since `start`, a value returned by [`start`](Self::start).
    ///
    /// Correct across one counter wrap.
    #[inline]
    pub fn elapsed(&self, start: u32) -> u32 {
        self.counter.count().wrapping_sub(start)
    }

    /// Give back the counter.
    pub fn free(self) -> C {
        self.counter
    }
}

/// Convert a cycle count to nanoseconds at the given core clock, rounding toward zero.
pub const fn cycles_to_nanoseconds(cycles: u32, core_clock_hz: NonZeroU32) -> u64 {
    cycles as u64 * 1_000_000_000 / core_clock_hz.get() as u64
}

/// Cycle counter of the Cortex-M DWT unit.
#[cfg(feature = "dwt")]
pub struct Dwt {
    dcb: cortex_m::peripheral::DCB,
    dwt: cortex_m::peripheral::DWT,
}

#[cfg(feature = "dwt")]
impl Dwt {
    /// Take ownership of the debug peripherals.
    pub fn new(dcb: cortex_m::peripheral::DCB, dwt: cortex_m::peripheral::DWT) -> Self {
        Self { dcb, dwt }
    }

    /// Give back the debug peripherals.
    pub fn free(self) -> (cortex_m::peripheral::DCB, cortex_m::peripheral::DWT) {
        (self.dcb, self.dwt)
    }
}

#[cfg(feature = "dwt")]
impl CycleCounter for Dwt {
    fn is_enabled(&self) -> bool {
        cortex_m::peripheral::DWT::cycle_counter_enabled()
    }

    fn enable(&mut self) {
        // DEMCR.TRCENA gates the whole DWT unit.
        self.dcb.enable_trace();
        self.dwt.enable_cycle_counter();
    }

    fn count(&self) -> u32 {
        cortex_m::peripheral::DWT::cycle_count()
    }
}
