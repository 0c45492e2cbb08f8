//! The serial peripheral contract the transport is written against.
//!
//! Board support code implements [`SerialAdapter`] for its UART driver. The transport only
//! ever calls the operations below, in the order documented on [`crate::Transport::init`].

use crate::Completion;
use core::fmt;

/// Error status reported by a [`SerialAdapter`].
///
/// The variants mirror the CMSIS driver status codes. The raw code is preserved, see
/// [`AdapterError::code`], so errors propagate verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdapterError {
    /// Unspecified error (`-1`).
    Error,
    /// Driver is busy (`-2`).
    Busy,
    /// Timeout occurred (`-3`).
    Timeout,
    /// Operation not supported (`-4`).
    Unsupported,
    /// Parameter error (`-5`).
    Parameter,
    /// Any other non-zero code, reported unchanged.
    Specific(i32),
}

impl AdapterError {
    /// The raw status code of this error.
    pub const fn code(self) -> i32 {
        match self {
            AdapterError::Error => -1,
            AdapterError::Busy => -2,
            AdapterError::Timeout => -3,
            AdapterError::Unsupported => -4,
            AdapterError::Parameter => -5,
            AdapterError::Specific(code) => code,
        }
    }
}

/// Convert a raw driver status code into a result.
///
/// `0` is the only success value. Positive codes are not defined by the driver model and are
/// reported as [`AdapterError::Specific`] unchanged.
pub const fn status(code: i32) -> Result<(), AdapterError> {
    match code {
        0 => Ok(()),
        -1 => Err(AdapterError::Error),
        -2 => Err(AdapterError::Busy),
        -3 => Err(AdapterError::Timeout),
        -4 => Err(AdapterError::Unsupported),
        -5 => Err(AdapterError::Parameter),
        code => Err(AdapterError::Specific(code)),
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::Error => write!(f, "driver error"),
            AdapterError::Busy => write!(f, "driver busy"),
            AdapterError::Timeout => write!(f, "driver timeout"),
            AdapterError::Unsupported => write!(f, "operation not supported"),
            AdapterError::Parameter => write!(f, "invalid parameter"),
            AdapterError::Specific(code) => write!(f, "driver specific error {code}"),
        }
    }
}

impl core::error::Error for AdapterError {}

/// Driver and API version reported by an adapter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverVersion {
    /// Version of the driver API.
    pub api: u16,
    /// Version of the driver implementation.
    pub drv: u16,
}

/// Peripheral power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Power off, no operation possible.
    Off,
    /// Low power mode, retains state.
    Low,
    /// Fully powered and operational.
    Full,
}

/// Number of data bits per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    /// 7 data bits.
    Seven,
    /// 8 data bits.
    Eight,
    /// 9 data bits.
    Nine,
}

/// Parity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    /// No parity bit.
    None,
    /// Even parity.
    Even,
    /// Odd parity.
    Odd,
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    /// 1 stop bit.
    One,
    /// 2 stop bits.
    Two,
}

/// Hardware flow control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlowControl {
    /// No flow control.
    None,
    /// RTS/CTS handshake.
    RtsCts,
}

/// Line configuration applied by [`crate::Transport::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second.
    pub baud_rate: u32,
    /// Number of data bits.
    pub data_bits: DataBits,
    /// Parity mode.
    pub parity: Parity,
    /// Number of stop bits.
    pub stop_bits: StopBits,
    /// Flow control.
    pub flow_control: FlowControl,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }
}

/// A UART driver as seen by the transport.
///
/// Transfers are started by [`begin_send`](Self::begin_send) and
/// [`begin_receive`](Self::begin_receive) and may finish later. Completion is reported
/// either through the byte counters, which the transport polls, or by calling
/// [`Completion::signal`] on the handle passed to [`initialize`](Self::initialize),
/// typically from the UART interrupt.
///
/// At most one transfer is outstanding at any time. Implementations do not need to
/// detect overlapping requests.
///
/// A driver that finishes transfers from its interrupt keeps using the slice handed to
/// `begin_send` or `begin_receive` after the call returns. Both methods are therefore
/// `unsafe`: the caller keeps the slice alive and leaves it alone until the transfer is
/// reported finished.
pub trait SerialAdapter {
    /// Driver version, logged during initialization.
    fn version(&self) -> DriverVersion {
        DriverVersion::default()
    }

    /// Route the UART signals to their pins.
    ///
    /// Called first during initialization. Boards with fixed pin assignments keep the
    /// default.
    fn configure_pins(&mut self) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Initialize the driver.
    ///
    /// When `completion` is `Some`, the driver must signal it once per finished transfer.
    fn initialize(&mut self, completion: Option<&'static Completion>) -> Result<(), AdapterError>;

    /// Change the peripheral power state.
    fn power_control(&mut self, state: PowerState) -> Result<(), AdapterError>;

    /// Apply the line configuration.
    fn configure(&mut self, config: &UartConfig) -> Result<(), AdapterError>;

    /// Enable or disable the transmitter.
    fn enable_tx(&mut self, on: bool) -> Result<(), AdapterError>;

    /// Enable or disable the receiver.
    fn enable_rx(&mut self, on: bool) -> Result<(), AdapterError>;

    /// Start transmitting `data`.
    ///
    /// Resets the transmitted byte counter.
    ///
    /// # Safety
    ///
    /// If this returns `Ok`, `data` must stay valid and unmodified until the transmitted
    /// count reaches `data.len()` or the completion is signalled.
    unsafe fn begin_send(&mut self, data: &[u8]) -> Result<(), AdapterError>;

    /// Start receiving `buffer.len()` bytes into `buffer`.
    ///
    /// Resets the received byte counter.
    ///
    /// # Safety
    ///
    /// If this returns `Ok`, `buffer` must stay valid and must not be read or written
    /// until the received count reaches `buffer.len()` or the completion is signalled.
    unsafe fn begin_receive(&mut self, buffer: &mut [u8]) -> Result<(), AdapterError>;

    /// Number of bytes transmitted since the last [`begin_send`](Self::begin_send).
    fn transmitted_count(&self) -> usize;

    /// Number of bytes received since the last [`begin_receive`](Self::begin_receive).
    fn received_count(&self) -> usize;
}
