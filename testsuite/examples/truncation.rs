//! Messages longer than the scratch buffer are cut to capacity - 1 bytes.

#![no_std]
#![no_main]

use testsuite::uart::Lm3sUart;
use testsuite::{check, entry, exit_success};
use uart_trace::Transport;

#[entry]
fn main() -> ! {
    let mut transport: Transport<Lm3sUart, 32> = Transport::new(Lm3sUart::uart0());
    check(transport.init(Some("[T] "), None).is_ok());

    transport.trace_formatted(format_args!("{}\n", "abcdefghijklmnopqrstuvwxyz0123456789"));
    check(transport.send_bytes(b"\n").is_ok());
    transport.trace_formatted(format_args!("fits\n"));

    exit_success();
}
