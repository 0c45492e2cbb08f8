//! Polled transport with a prefix: formatted traces and raw sends.

#![no_std]
#![no_main]

use testsuite::uart::Lm3sUart;
use testsuite::{check, entry, exit_success};
use uart_trace::Transport;

#[entry]
fn main() -> ! {
    let mut transport: Transport<Lm3sUart> = Transport::new(Lm3sUart::uart0());
    check(transport.init(Some("[A] "), None).is_ok());
    check(transport.is_ready());

    transport.trace_formatted(format_args!("hello\n"));
    transport.trace_formatted(format_args!("{} + {} = {}\n", 2, 3, 2 + 3));
    check(transport.send_bytes(b"raw bytes\n").is_ok());

    exit_success();
}
