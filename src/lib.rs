#![no_std]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod log;

pub mod adapter;
#[cfg(feature = "async-await")]
pub(crate) mod atomic_waker;
pub mod completion;
pub mod cycle_timer;
mod format;
pub mod global;
#[cfg(test)]
mod mock;
mod null;
mod transport;

pub use adapter::{
    AdapterError, DataBits, DriverVersion, FlowControl, Parity, PowerState, SerialAdapter,
    StopBits, UartConfig, status,
};
pub use completion::Completion;
#[cfg(feature = "dwt")]
pub use cycle_timer::Dwt;
pub use cycle_timer::{CycleCounter, CycleTimer, cycles_to_nanoseconds};
pub use global::{SetGlobalError, set_global};
pub use null::NullTransport;
pub use transport::{CompletionMode, DEFAULT_CAPACITY, Trace, Transport};

/// Format a message and send it through the global transport.
///
/// Takes the same arguments as [`format_args!`]. Does nothing until a transport is
/// installed with [`set_global`]. Blocks until the message is on the wire.
///
/// ```ignore
/// uart_trace::tracef!("adc={} temp={}\r\n", raw, celsius);
/// ```
#[cfg(not(feature = "disable-trace"))]
#[macro_export]
macro_rules! tracef {
    ($($arg:tt)*) => {
        $crate::global::trace(::core::format_args!($($arg)*))
    };
}

/// Format a message and send it through the global transport.
///
/// Compiled out by the `disable-trace` feature; the arguments are still type checked.
#[cfg(feature = "disable-trace")]
#[macro_export]
macro_rules! tracef {
    ($($arg:tt)*) => {{
        if false {
            $crate::global::trace(::core::format_args!($($arg)*))
        }
    }};
}
