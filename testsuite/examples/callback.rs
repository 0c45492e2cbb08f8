//! Callback-driven completion: the driver signals a static `Completion`.

#![no_std]
#![no_main]

use testsuite::uart::Lm3sUart;
use testsuite::{check, entry, exit_success};
use uart_trace::completion::event;
use uart_trace::{Completion, CompletionMode, Transport};

static UART_DONE: Completion = Completion::new();

#[entry]
fn main() -> ! {
    let mut transport: Transport<Lm3sUart> = Transport::new(Lm3sUart::uart0());
    check(transport.init(Some("[cb] "), Some(&UART_DONE)).is_ok());
    check(matches!(transport.mode(), CompletionMode::CallbackDriven(_)));

    transport.trace_formatted(format_args!("callback mode\n"));
    check(UART_DONE.event() == event::SEND_COMPLETE);

    check(transport.send_bytes(b"second send\n").is_ok());
    check(UART_DONE.is_complete());

    exit_success();
}
