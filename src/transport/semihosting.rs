//! Semihosting mirror for QEMU testing.
//!
//! With the `qemu-test` feature every transfer completed by a ready transport is also
//! written to semihosting stdout, so the test harness can compare it with the UART capture.

use core::cell::RefCell;
use cortex_m_semihosting::hio::{self, HostStream};
use critical_section::Mutex;

static STDOUT: Mutex<RefCell<Option<HostStream>>> = Mutex::new(RefCell::new(None));

/// Writes bytes to semihosting stdout.
pub(crate) fn write(bytes: &[u8]) {
    critical_section::with(|cs| {
        let mut handle = STDOUT.borrow_ref_mut(cs);

        // Opened once, reopening would truncate the output.
        if handle.is_none() {
            *handle = hio::hstdout().ok();
        }

        if let Some(stdout) = handle.as_mut() {
            let _ = stdout.write_all(bytes);
        }
    });
}
