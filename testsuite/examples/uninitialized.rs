//! Nothing reaches the wire before `init` succeeds.

#![no_std]
#![no_main]

use testsuite::uart::Lm3sUart;
use testsuite::{check, entry, exit_success};
use uart_trace::Transport;

#[entry]
fn main() -> ! {
    let mut transport: Transport<Lm3sUart> = Transport::new(Lm3sUart::uart0());
    let mut buf = [0u8; 4];

    check(transport.send_bytes(b"lost\n").is_ok());
    // SAFETY: Polled mode, the receive is over when this returns.
    check(unsafe { transport.receive_bytes(&mut buf, 4) }.is_ok());
    transport.trace_formatted(format_args!("lost too\n"));

    check(transport.init(None, None).is_ok());
    transport.trace_formatted(format_args!("after init\n"));

    exit_success();
}
