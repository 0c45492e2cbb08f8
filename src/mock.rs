//! Host-side adapter double for unit tests.

extern crate std;

use crate::{AdapterError, Completion, PowerState, SerialAdapter, UartConfig, completion::event};
use core::cell::Cell;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use std::vec::Vec;

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    ConfigurePins,
    Initialize { completion: bool },
    PowerControl(PowerState),
    Configure(UartConfig),
    EnableTx(bool),
    EnableRx(bool),
    BeginSend(Vec<u8>),
    BeginReceive(usize),
}

/// Adapter operation to fail on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    ConfigurePins,
    Initialize,
    PowerControl,
    Configure,
    EnableTx,
    EnableRx,
    BeginSend,
    BeginReceive,
}

/// How the mock reports a finished transfer through the completion signal.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Signal {
    /// Signal from inside `begin_*`, like an interrupt that fires right away.
    Immediately,
    /// Signal from another thread after a delay.
    After(Duration),
    /// Never signal.
    Never,
}

pub(crate) struct MockAdapter {
    pub(crate) calls: Vec<Call>,
    /// Every byte handed to `begin_send`, in order. Shared so tests can inspect it after
    /// the adapter has been moved away.
    pub(crate) wire: Arc<Mutex<Vec<u8>>>,
    pub(crate) fail: Option<(Step, AdapterError)>,
    pub(crate) signal: Signal,
    /// Set by the delayed signalling thread right before it signals.
    pub(crate) fired: Arc<AtomicBool>,
    /// Bytes returned by `begin_receive`.
    pub(crate) rx_source: Vec<u8>,
    /// Counter progress per poll.
    pub(crate) step: usize,
    completion: Option<&'static Completion>,
    tx_len: usize,
    tx_done: Cell<usize>,
    pub(crate) tx_polls: Cell<usize>,
    rx_len: usize,
    rx_done: Cell<usize>,
    pub(crate) rx_polls: Cell<usize>,
}

impl MockAdapter {
    pub(crate) fn new() -> Self {
        Self {
            calls: Vec::new(),
            wire: Arc::new(Mutex::new(Vec::new())),
            fail: None,
            signal: Signal::Immediately,
            fired: Arc::new(AtomicBool::new(false)),
            rx_source: Vec::new(),
            step: 1,
            completion: None,
            tx_len: 0,
            tx_done: Cell::new(0),
            tx_polls: Cell::new(0),
            rx_len: 0,
            rx_done: Cell::new(0),
            rx_polls: Cell::new(0),
        }
    }

    pub(crate) fn failing(step: Step, error: AdapterError) -> Self {
        Self {
            fail: Some((step, error)),
            ..Self::new()
        }
    }

    fn check(&self, step: Step) -> Result<(), AdapterError> {
        match self.fail {
            Some((s, e)) if s == step => Err(e),
            _ => Ok(()),
        }
    }

    fn complete(&self, event: u32) {
        let Some(completion) = self.completion else {
            return;
        };
        match self.signal {
            Signal::Immediately => completion.signal(event),
            Signal::After(delay) => {
                let fired = self.fired.clone();
                thread::spawn(move || {
                    thread::sleep(delay);
                    fired.store(true, Ordering::SeqCst);
                    completion.signal(event);
                });
            }
            Signal::Never => {}
        }
    }

    /// Bytes transmitted so far.
    pub(crate) fn wire(&self) -> Vec<u8> {
        self.wire.lock().unwrap().clone()
    }

    /// Payload of every `begin_send` call.
    pub(crate) fn sends(&self) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::BeginSend(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }
}

fn advance(done: &Cell<usize>, len: usize, step: usize) -> usize {
    let n = (done.get() + step).min(len);
    done.set(n);
    n
}

impl SerialAdapter for MockAdapter {
    fn configure_pins(&mut self) -> Result<(), AdapterError> {
        self.calls.push(Call::ConfigurePins);
        self.check(Step::ConfigurePins)
    }

    fn initialize(&mut self, completion: Option<&'static Completion>) -> Result<(), AdapterError> {
        self.calls.push(Call::Initialize {
            completion: completion.is_some(),
        });
        self.check(Step::Initialize)?;
        self.completion = completion;
        Ok(())
    }

    fn power_control(&mut self, state: PowerState) -> Result<(), AdapterError> {
        self.calls.push(Call::PowerControl(state));
        self.check(Step::PowerControl)
    }

    fn configure(&mut self, config: &UartConfig) -> Result<(), AdapterError> {
        self.calls.push(Call::Configure(*config));
        self.check(Step::Configure)
    }

    fn enable_tx(&mut self, on: bool) -> Result<(), AdapterError> {
        self.calls.push(Call::EnableTx(on));
        self.check(Step::EnableTx)
    }

    fn enable_rx(&mut self, on: bool) -> Result<(), AdapterError> {
        self.calls.push(Call::EnableRx(on));
        self.check(Step::EnableRx)
    }

    unsafe fn begin_send(&mut self, data: &[u8]) -> Result<(), AdapterError> {
        self.calls.push(Call::BeginSend(data.to_vec()));
        self.check(Step::BeginSend)?;
        self.wire.lock().unwrap().extend_from_slice(data);
        self.tx_len = data.len();
        self.tx_done.set(0);
        self.tx_polls.set(0);
        self.complete(event::SEND_COMPLETE);
        Ok(())
    }

    unsafe fn begin_receive(&mut self, buffer: &mut [u8]) -> Result<(), AdapterError> {
        self.calls.push(Call::BeginReceive(buffer.len()));
        self.check(Step::BeginReceive)?;
        let n = buffer.len().min(self.rx_source.len());
        buffer[..n].copy_from_slice(&self.rx_source[..n]);
        self.rx_source.drain(..n);
        self.rx_len = buffer.len();
        self.rx_done.set(0);
        self.rx_polls.set(0);
        self.complete(event::RECEIVE_COMPLETE);
        Ok(())
    }

    fn transmitted_count(&self) -> usize {
        self.tx_polls.set(self.tx_polls.get() + 1);
        advance(&self.tx_done, self.tx_len, self.step)
    }

    fn received_count(&self) -> usize {
        self.rx_polls.set(self.rx_polls.get() + 1);
        advance(&self.rx_done, self.rx_len, self.step)
    }
}
