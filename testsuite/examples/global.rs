//! The program-wide transport behind `tracef!`.

#![no_std]
#![no_main]

use testsuite::uart::Lm3sUart;
use testsuite::{check, entry, exit_success};
use uart_trace::{NullTransport, SetGlobalError, Transport, set_global, tracef};

#[entry]
fn main() -> ! {
    // Not installed yet: dropped.
    tracef!("too early\n");

    let transport = cortex_m::singleton!(: Transport<Lm3sUart> = Transport::new(Lm3sUart::uart0()))
        .unwrap();
    check(transport.init(Some("[G] "), None).is_ok());
    check(set_global(transport).is_ok());

    tracef!("global {}\n", 1);

    let other = cortex_m::singleton!(: NullTransport = NullTransport).unwrap();
    check(set_global(other) == Err(SetGlobalError::AlreadySet));

    check(uart_trace::global::send_bytes(b"raw\n").is_ok());
    tracef!("done\n");

    exit_success();
}
