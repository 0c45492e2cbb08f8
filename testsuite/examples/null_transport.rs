//! `NullTransport` accepts every call and emits nothing.

#![no_std]
#![no_main]

use testsuite::uart::Lm3sUart;
use testsuite::{check, entry, exit_success};
use uart_trace::{NullTransport, Trace, Transport};

fn log_boot(t: &mut dyn Trace) {
    let _ = t.init(Some("[N] "), None);
    t.trace_formatted(format_args!("booted\n"));
    let _ = t.send_bytes(b"bytes\n");
}

#[entry]
fn main() -> ! {
    let mut null = NullTransport;
    log_boot(&mut null);
    check(!null.is_ready());

    let mut real: Transport<Lm3sUart> = Transport::new(Lm3sUart::uart0());
    log_boot(&mut real);
    check(real.is_ready());

    exit_success();
}
