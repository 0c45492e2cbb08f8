use crate::{AdapterError, Completion, Trace};
use core::fmt;

/// A [`Trace`] implementation with tracing compiled out.
///
/// Every operation succeeds and does nothing, so call sites do not change when a build
/// drops the UART.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Trace for NullTransport {
    fn init(
        &mut self,
        _prefix: Option<&'static str>,
        _completion: Option<&'static Completion>,
    ) -> Result<(), AdapterError> {
        Ok(())
    }

    fn is_ready(&self) -> bool {
        false
    }

    fn send_bytes(&mut self, _data: &[u8]) -> Result<(), AdapterError> {
        Ok(())
    }

    unsafe fn receive_bytes(
        &mut self,
        _buffer: &mut [u8],
        _len: usize,
    ) -> Result<(), AdapterError> {
        Ok(())
    }

    fn trace_formatted(&mut self, _args: fmt::Arguments<'_>) {}
}
