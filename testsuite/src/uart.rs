//! Polled UART driver for the LM3S6965 (QEMU testing only).
//!
//! Transfers finish before `begin_send`/`begin_receive` return. When a [`Completion`] is
//! registered it is signalled right away, the same way a transfer-complete interrupt would.
//!
//! QEMU serial port mapping: `qemu-system-arm ... -serial <uart0>`.

use core::ptr::{with_exposed_provenance, with_exposed_provenance_mut};
use uart_trace::completion::event;
use uart_trace::{
    AdapterError, Completion, DataBits, DriverVersion, FlowControl, Parity, PowerState,
    SerialAdapter, StopBits, UartConfig,
};

const UART0_BASE: usize = 0x4000_C000;

/// Run mode clock gating control 1, bit 0 gates UART0.
const SYSCTL_RCGC1: usize = 0x400F_E104;

const UART_DR: usize = 0x000; // Data Register
const UART_FR: usize = 0x018; // Flag Register
const UART_IBRD: usize = 0x024; // Integer Baud-Rate Divisor
const UART_FBRD: usize = 0x028; // Fractional Baud-Rate Divisor
const UART_LCRH: usize = 0x02C; // Line Control
const UART_CTL: usize = 0x030; // Control

const FR_RXFE: u32 = 1 << 4; // Receive FIFO Empty
const FR_TXFF: u32 = 1 << 5; // Transmit FIFO Full

const LCRH_PEN: u32 = 1 << 1;
const LCRH_EPS: u32 = 1 << 2;
const LCRH_STP2: u32 = 1 << 3;
const LCRH_FEN: u32 = 1 << 4;
const LCRH_WLEN_7: u32 = 0b10 << 5;
const LCRH_WLEN_8: u32 = 0b11 << 5;

const CTL_UARTEN: u32 = 1 << 0;
const CTL_TXE: u32 = 1 << 8;
const CTL_RXE: u32 = 1 << 9;

/// UART module clock after reset.
const UART_CLOCK_HZ: u32 = 12_000_000;

fn read_reg(addr: usize) -> u32 {
    // SAFETY: Only called with addresses of memory mapped LM3S6965 registers.
    unsafe { with_exposed_provenance::<u32>(addr).read_volatile() }
}

fn write_reg(addr: usize, value: u32) {
    // SAFETY: Only called with addresses of memory mapped LM3S6965 registers.
    unsafe { with_exposed_provenance_mut::<u32>(addr).write_volatile(value) }
}

fn modify_reg(addr: usize, f: impl FnOnce(u32) -> u32) {
    write_reg(addr, f(read_reg(addr)));
}

/// UART0 of the LM3S6965.
pub struct Lm3sUart {
    base: usize,
    completion: Option<&'static Completion>,
    tx_count: usize,
    rx_count: usize,
}

impl Lm3sUart {
    /// The UART wired to the first `-serial` argument of QEMU.
    pub fn uart0() -> Self {
        Self {
            base: UART0_BASE,
            completion: None,
            tx_count: 0,
            rx_count: 0,
        }
    }

    fn set_ctl(&self, bit: u32, on: bool) {
        modify_reg(self.base + UART_CTL, |ctl| if on { ctl | bit } else { ctl & !bit });
    }

    fn complete(&self, event: u32) {
        if let Some(c) = self.completion {
            c.signal(event);
        }
    }
}

impl SerialAdapter for Lm3sUart {
    fn version(&self) -> DriverVersion {
        DriverVersion { api: 0x0200, drv: 0x0001 }
    }

    fn initialize(&mut self, completion: Option<&'static Completion>) -> Result<(), AdapterError> {
        self.completion = completion;
        self.tx_count = 0;
        self.rx_count = 0;
        Ok(())
    }

    fn power_control(&mut self, state: PowerState) -> Result<(), AdapterError> {
        match state {
            PowerState::Full => modify_reg(SYSCTL_RCGC1, |r| r | 1),
            PowerState::Off => modify_reg(SYSCTL_RCGC1, |r| r & !1),
            PowerState::Low => return Err(AdapterError::Unsupported),
        }
        Ok(())
    }

    fn configure(&mut self, config: &UartConfig) -> Result<(), AdapterError> {
        let mut lcrh = LCRH_FEN;
        lcrh |= match config.data_bits {
            DataBits::Seven => LCRH_WLEN_7,
            DataBits::Eight => LCRH_WLEN_8,
            DataBits::Nine => return Err(AdapterError::Unsupported),
        };
        lcrh |= match config.parity {
            Parity::None => 0,
            Parity::Odd => LCRH_PEN,
            Parity::Even => LCRH_PEN | LCRH_EPS,
        };
        if config.stop_bits == StopBits::Two {
            lcrh |= LCRH_STP2;
        }
        if config.flow_control != FlowControl::None {
            return Err(AdapterError::Unsupported);
        }
        if config.baud_rate == 0 {
            return Err(AdapterError::Parameter);
        }

        // Divisor in 1/64ths, rounded to nearest.
        let div = (8 * UART_CLOCK_HZ / config.baud_rate).div_ceil(2);

        self.set_ctl(CTL_UARTEN, false);
        write_reg(self.base + UART_IBRD, div >> 6);
        write_reg(self.base + UART_FBRD, div & 0x3f);
        // LCRH must be written after the divisors to latch them.
        write_reg(self.base + UART_LCRH, lcrh);
        self.set_ctl(CTL_UARTEN, true);
        Ok(())
    }

    fn enable_tx(&mut self, on: bool) -> Result<(), AdapterError> {
        self.set_ctl(CTL_TXE, on);
        Ok(())
    }

    fn enable_rx(&mut self, on: bool) -> Result<(), AdapterError> {
        self.set_ctl(CTL_RXE, on);
        Ok(())
    }

    unsafe fn begin_send(&mut self, data: &[u8]) -> Result<(), AdapterError> {
        self.tx_count = 0;
        for &byte in data {
            while read_reg(self.base + UART_FR) & FR_TXFF != 0 {}
            write_reg(self.base + UART_DR, byte as u32);
            self.tx_count += 1;
        }
        self.complete(event::SEND_COMPLETE);
        Ok(())
    }

    unsafe fn begin_receive(&mut self, buffer: &mut [u8]) -> Result<(), AdapterError> {
        self.rx_count = 0;
        for slot in buffer.iter_mut() {
            while read_reg(self.base + UART_FR) & FR_RXFE != 0 {}
            *slot = read_reg(self.base + UART_DR) as u8;
            self.rx_count += 1;
        }
        self.complete(event::RECEIVE_COMPLETE);
        Ok(())
    }

    fn transmitted_count(&self) -> usize {
        self.tx_count
    }

    fn received_count(&self) -> usize {
        self.rx_count
    }
}
