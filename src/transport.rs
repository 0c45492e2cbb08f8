use crate::format::{clamp_prefix, compose};
use crate::{AdapterError, Completion, PowerState, SerialAdapter, UartConfig};
use core::fmt;

#[cfg(feature = "qemu-test")]
mod semihosting;

/// Default scratch buffer capacity for [`Transport::trace_formatted`].
pub const DEFAULT_CAPACITY: usize = 256;

/// How the transport learns that a transfer finished.
#[derive(Debug, Clone, Copy)]
pub enum CompletionMode {
    /// Poll the adapter's byte counters.
    Polled,
    /// Wait for the driver to signal the [`Completion`].
    CallbackDriven(&'static Completion),
}

/// Operations shared by [`Transport`] and [`crate::NullTransport`].
///
/// Code that logs through `&mut dyn Trace` does not need to know whether tracing is
/// actually wired to a UART.
pub trait Trace {
    /// See [`Transport::init`].
    fn init(
        &mut self,
        prefix: Option<&'static str>,
        completion: Option<&'static Completion>,
    ) -> Result<(), AdapterError>;

    /// Returns `true` once [`init`](Self::init) succeeded.
    fn is_ready(&self) -> bool;

    /// See [`Transport::send_bytes`].
    fn send_bytes(&mut self, data: &[u8]) -> Result<(), AdapterError>;

    /// See [`Transport::receive_bytes`].
    ///
    /// # Safety
    ///
    /// Same requirements as [`Transport::receive_bytes`].
    unsafe fn receive_bytes(&mut self, buffer: &mut [u8], len: usize)
    -> Result<(), AdapterError>;

    /// See [`Transport::trace_formatted`].
    fn trace_formatted(&mut self, args: fmt::Arguments<'_>);
}

/// UART trace transport.
///
/// Owns the adapter, the line prefix and an `N` byte scratch buffer used to compose
/// messages. Every operation is a successful no-op until [`init`](Self::init) succeeds.
///
/// # Blocking
///
/// Sends always wait for the transfer to finish, by spinning on either the adapter's
/// transmitted byte counter or the [`Completion`] signal. There is no timeout: a
/// peripheral that never finishes blocks the caller forever.
///
/// # Reentrancy
///
/// The transport is not reentrant. All methods take `&mut self`, so sharing it between
/// threads or interrupt handlers requires external serialization, for example through
/// [`crate::set_global`] or a mutex owned by the application.
pub struct Transport<A, const N: usize = DEFAULT_CAPACITY> {
    adapter: A,
    config: UartConfig,
    prefix: &'static [u8],
    mode: CompletionMode,
    ready: bool,
    scratch: [u8; N],
}

impl<A: SerialAdapter, const N: usize> Transport<A, N> {
    /// Create an uninitialized transport using the default 115200 8N1 line configuration.
    pub fn new(adapter: A) -> Self {
        Self::with_config(adapter, UartConfig::default())
    }

    /// Create an uninitialized transport with a custom line configuration.
    pub fn with_config(adapter: A, config: UartConfig) -> Self {
        const { assert!(N > 0, "scratch buffer needs room for the terminator") };
        Self {
            adapter,
            config,
            prefix: &[],
            mode: CompletionMode::Polled,
            ready: false,
            scratch: [0; N],
        }
    }

    /// Configure the peripheral and make the transport ready.
    ///
    /// `prefix` is prepended to every [`trace_formatted`](Self::trace_formatted) message. A
    /// prefix longer than `N - 1` bytes is cut to that length. When `completion` is given,
    /// the driver is expected to signal it for every finished transfer and the transport
    /// waits on it instead of polling.
    ///
    /// The adapter calls are, in order: `configure_pins`, `initialize`,
    /// `power_control(Full)`, `configure`, `enable_tx(true)`, `enable_rx(true)`. The first
    /// failing call aborts the sequence and its error is returned unchanged; the transport
    /// then stays uninitialized.
    ///
    /// Calling this again repeats the hardware configuration. The new prefix and
    /// completion mode only take effect once the whole sequence succeeded, so a failed
    /// re-initialization leaves a ready transport working as before.
    pub fn init(
        &mut self,
        prefix: Option<&'static str>,
        completion: Option<&'static Completion>,
    ) -> Result<(), AdapterError> {
        let requested = prefix.map_or(&[][..], str::as_bytes);
        let prefix = clamp_prefix(requested, N);
        if prefix.len() < requested.len() {
            warn!(
                "trace prefix cut from {} to {} bytes",
                requested.len(),
                prefix.len()
            );
        }
        let mode = match completion {
            Some(c) => CompletionMode::CallbackDriven(c),
            None => CompletionMode::Polled,
        };

        let version = self.adapter.version();
        debug!("UART driver version api:{} drv:{}", version.api, version.drv);

        self.adapter
            .configure_pins()
            .inspect_err(|e| error!("UART pin configuration failed: {}", e))?;
        self.adapter
            .initialize(completion)
            .inspect_err(|e| error!("UART initialize failed: {}", e))?;
        self.adapter
            .power_control(PowerState::Full)
            .inspect_err(|e| error!("UART power up failed: {}", e))?;
        self.adapter
            .configure(&self.config)
            .inspect_err(|e| error!("UART line configuration failed: {}", e))?;
        self.adapter
            .enable_tx(true)
            .inspect_err(|e| error!("UART transmitter enable failed: {}", e))?;
        self.adapter
            .enable_rx(true)
            .inspect_err(|e| error!("UART receiver enable failed: {}", e))?;

        self.prefix = prefix;
        self.mode = mode;
        self.ready = true;
        info!("UART trace ready at {} baud", self.config.baud_rate);
        Ok(())
    }

    /// Returns `true` once [`init`](Self::init) succeeded.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// The completion mode selected by the last [`init`](Self::init).
    pub fn mode(&self) -> CompletionMode {
        self.mode
    }

    /// The prefix in use, after clamping.
    pub fn prefix(&self) -> &'static [u8] {
        self.prefix
    }

    /// The line configuration applied by [`init`](Self::init).
    pub fn config(&self) -> &UartConfig {
        &self.config
    }

    /// Borrow the adapter.
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Give back the adapter.
    pub fn release(self) -> A {
        self.adapter
    }

    /// Transmit `data` and wait until the adapter reports it sent.
    ///
    /// Returns `Ok(())` without touching the adapter when the transport is not ready or
    /// `data` is empty. Errors from starting the transfer are returned unchanged.
    pub fn send_bytes(&mut self, data: &[u8]) -> Result<(), AdapterError> {
        if !self.ready {
            return Ok(());
        }
        transmit(&mut self.adapter, self.mode, data)
    }

    /// Async version of [`send_bytes`](Self::send_bytes).
    ///
    /// In callback-driven mode the completion is awaited instead of spun on. In polled mode
    /// the counter is checked once per poll and the task wakes itself.
    ///
    /// Dropping the future while the transfer is in flight blocks until the transfer
    /// finishes, the same way [`send_bytes`](Self::send_bytes) would. The future must be
    /// dropped, not leaked, once it has been polled.
    #[cfg(feature = "async-await")]
    pub async fn send_bytes_async(&mut self, data: &[u8]) -> Result<(), AdapterError> {
        if !self.ready || data.is_empty() {
            return Ok(());
        }
        if let CompletionMode::CallbackDriven(c) = self.mode {
            c.reset();
        }
        // SAFETY: `in_flight` keeps `data` borrowed and waits for the transfer when dropped.
        unsafe { self.adapter.begin_send(data) }?;
        let in_flight = InFlight {
            adapter: &self.adapter,
            mode: self.mode,
            len: data.len(),
        };
        match self.mode {
            CompletionMode::Polled => {
                let adapter = &self.adapter;
                core::future::poll_fn(|cx| {
                    if adapter.transmitted_count() == data.len() {
                        core::task::Poll::Ready(())
                    } else {
                        cx.waker().wake_by_ref();
                        core::task::Poll::Pending
                    }
                })
                .await
            }
            CompletionMode::CallbackDriven(c) => {
                c.wait().await;
            }
        }
        core::mem::forget(in_flight);
        #[cfg(feature = "qemu-test")]
        semihosting::write(data);
        Ok(())
    }

    /// Receive `len` bytes into the start of `buffer`.
    ///
    /// In polled mode this waits until the adapter reports `len` bytes received. In
    /// callback-driven mode it returns as soon as the receive is started; the caller
    /// observes completion through the [`Completion`] handed to [`init`](Self::init), which
    /// is cleared before the receive starts.
    ///
    /// Returns `Ok(())` without touching the adapter when the transport is not ready or
    /// `len` is zero, and [`AdapterError::Parameter`] if `len` exceeds `buffer`.
    ///
    /// # Safety
    ///
    /// In callback-driven mode the driver may still write to `buffer` after this returns.
    /// If it returns `Ok`, the first `len` bytes of `buffer` must stay valid and must not
    /// be read or written until the completion is signalled. Polled mode places no
    /// requirement on the caller.
    pub unsafe fn receive_bytes(
        &mut self,
        buffer: &mut [u8],
        len: usize,
    ) -> Result<(), AdapterError> {
        if !self.ready || len == 0 {
            return Ok(());
        }
        let buffer = buffer.get_mut(..len).ok_or(AdapterError::Parameter)?;

        match self.mode {
            CompletionMode::Polled => {
                // SAFETY: `buffer` stays borrowed until the count shows the receive done.
                unsafe { self.adapter.begin_receive(buffer) }?;
                while self.adapter.received_count() != len {
                    core::hint::spin_loop();
                }
            }
            CompletionMode::CallbackDriven(c) => {
                c.reset();
                // SAFETY: Upheld by the caller until the completion is signalled.
                unsafe { self.adapter.begin_receive(buffer) }?;
            }
        }
        Ok(())
    }

    /// Format a message behind the prefix and send it.
    ///
    /// The prefix and message are composed in the scratch buffer. Whatever does not fit in
    /// `N - 1` bytes is dropped. The message ends at its first zero byte, if any.
    ///
    /// Failures are never reported: a trace that cannot be sent is lost. Use
    /// [`format_args!`] to build `args`, or the [`crate::tracef!`] macro for the global
    /// transport.
    pub fn trace_formatted(&mut self, args: fmt::Arguments<'_>) {
        if !self.ready {
            return;
        }
        let len = compose(&mut self.scratch, self.prefix, args);
        if let Err(e) = transmit(&mut self.adapter, self.mode, &self.scratch[..len]) {
            warn!("trace dropped: {}", e);
        }
    }
}

/// Start a send and spin until it is reported done.
fn transmit<A: SerialAdapter>(
    adapter: &mut A,
    mode: CompletionMode,
    data: &[u8],
) -> Result<(), AdapterError> {
    if data.is_empty() {
        return Ok(());
    }
    match mode {
        CompletionMode::Polled => {
            // SAFETY: `data` stays borrowed until the count shows the send done.
            unsafe { adapter.begin_send(data) }?;
            while adapter.transmitted_count() != data.len() {
                core::hint::spin_loop();
            }
        }
        CompletionMode::CallbackDriven(c) => {
            // Cleared before starting, the interrupt may fire before `begin_send` returns.
            c.reset();
            // SAFETY: `data` stays borrowed until the completion is signalled.
            unsafe { adapter.begin_send(data) }?;
            c.wait_blocking();
        }
    }
    #[cfg(feature = "qemu-test")]
    semihosting::write(data);
    Ok(())
}

/// A send that was started but not yet seen finishing.
///
/// Dropping it waits for the transfer, so the data outlives the driver's use of it and a
/// late completion event cannot be taken for the next transfer's.
#[cfg(feature = "async-await")]
struct InFlight<'a, A: SerialAdapter> {
    adapter: &'a A,
    mode: CompletionMode,
    len: usize,
}

#[cfg(feature = "async-await")]
impl<A: SerialAdapter> Drop for InFlight<'_, A> {
    fn drop(&mut self) {
        match self.mode {
            CompletionMode::Polled => {
                while self.adapter.transmitted_count() != self.len {
                    core::hint::spin_loop();
                }
            }
            CompletionMode::CallbackDriven(c) => {
                c.wait_blocking();
            }
        }
    }
}

impl<A: SerialAdapter, const N: usize> Trace for Transport<A, N> {
    fn init(
        &mut self,
        prefix: Option<&'static str>,
        completion: Option<&'static Completion>,
    ) -> Result<(), AdapterError> {
        Transport::init(self, prefix, completion)
    }

    fn is_ready(&self) -> bool {
        Transport::is_ready(self)
    }

    fn send_bytes(&mut self, data: &[u8]) -> Result<(), AdapterError> {
        Transport::send_bytes(self, data)
    }

    unsafe fn receive_bytes(
        &mut self,
        buffer: &mut [u8],
        len: usize,
    ) -> Result<(), AdapterError> {
        // SAFETY: Forwarded from the caller.
        unsafe { Transport::receive_bytes(self, buffer, len) }
    }

    fn trace_formatted(&mut self, args: fmt::Arguments<'_>) {
        Transport::trace_formatted(self, args)
    }
}

#[cfg(test)]
mod test {
    extern crate std;

    use super::*;
    use crate::completion::event;
    use crate::mock::{Call, MockAdapter, Signal, Step};
    use std::boxed::Box;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use std::vec;
    use std::vec::Vec;

    fn completion() -> &'static Completion {
        Box::leak(Box::new(Completion::new()))
    }

    fn ready(adapter: MockAdapter, prefix: Option<&'static str>) -> Transport<MockAdapter> {
        let mut t = Transport::new(adapter);
        t.init(prefix, None).unwrap();
        t
    }

    fn init_calls(completion: bool) -> Vec<Call> {
        vec![
            Call::ConfigurePins,
            Call::Initialize { completion },
            Call::PowerControl(PowerState::Full),
            Call::Configure(UartConfig::default()),
            Call::EnableTx(true),
            Call::EnableRx(true),
        ]
    }

    #[test]
    fn init_configures_in_order() {
        let t = ready(MockAdapter::new(), None);
        assert!(t.is_ready());
        assert!(matches!(t.mode(), CompletionMode::Polled));
        assert_eq!(t.adapter().calls, init_calls(false));
        assert_eq!(t.prefix(), b"");
    }

    #[test]
    fn init_with_completion_is_callback_driven() {
        let c = completion();
        let mut t: Transport<_> = Transport::new(MockAdapter::new());
        t.init(Some("[A] "), Some(c)).unwrap();
        assert!(matches!(t.mode(), CompletionMode::CallbackDriven(_)));
        assert_eq!(t.adapter().calls, init_calls(true));
        assert_eq!(t.prefix(), b"[A] ");
    }

    #[test]
    fn custom_line_configuration_is_applied() {
        let config = UartConfig {
            baud_rate: 921_600,
            ..UartConfig::default()
        };
        let mut t: Transport<_> = Transport::with_config(MockAdapter::new(), config);
        t.init(None, None).unwrap();
        assert!(t.adapter().calls.contains(&Call::Configure(config)));
        assert_eq!(t.config().baud_rate, 921_600);
    }

    #[test]
    fn init_failure_aborts_and_stays_uninitialized() {
        let steps = [
            Step::ConfigurePins,
            Step::Initialize,
            Step::PowerControl,
            Step::Configure,
            Step::EnableTx,
            Step::EnableRx,
        ];
        for (i, step) in steps.into_iter().enumerate() {
            let error = AdapterError::Specific(-100 - i as i32);
            let mut t: Transport<_> = Transport::new(MockAdapter::failing(step, error));

            assert_eq!(t.init(Some("> "), None), Err(error));
            assert!(!t.is_ready());
            // The failing call is the last one made.
            assert_eq!(t.adapter().calls, init_calls(false)[..=i]);

            assert_eq!(t.send_bytes(b"abc"), Ok(()));
            t.trace_formatted(format_args!("lost"));
            assert!(t.adapter().wire().is_empty());
        }
    }

    #[test]
    fn failed_reinit_keeps_previous_state() {
        let c = completion();
        let mut t = ready(MockAdapter::new(), Some("[x] "));
        t.adapter.fail = Some((Step::Initialize, AdapterError::Error));

        assert_eq!(t.init(Some("[y] "), Some(c)), Err(AdapterError::Error));
        assert!(t.is_ready());
        assert!(matches!(t.mode(), CompletionMode::Polled));
        assert_eq!(t.prefix(), b"[x] ");

        t.adapter.fail = None;
        t.trace_formatted(format_args!("still polled"));
        assert_eq!(t.adapter().wire(), b"[x] still polled");
    }

    #[test]
    fn operations_before_init_are_noops() {
        let mut t: Transport<_> = Transport::new(MockAdapter::new());
        let mut buf = [0u8; 4];

        assert_eq!(t.send_bytes(b"hello"), Ok(()));
        assert_eq!(unsafe { t.receive_bytes(&mut buf, 4) }, Ok(()));
        assert_eq!(unsafe { t.receive_bytes(&mut buf, 40) }, Ok(()));
        t.trace_formatted(format_args!("hello {}", 1));

        assert!(t.adapter().calls.is_empty());
        assert!(t.adapter().wire().is_empty());
    }

    #[test]
    fn trace_prepends_prefix_without_terminator() {
        let mut t = ready(MockAdapter::new(), Some("[A] "));
        t.trace_formatted(format_args!("hello"));
        assert_eq!(t.adapter().sends(), vec![b"[A] hello".to_vec()]);
        assert_eq!(t.adapter().wire().len(), 9);
    }

    #[test]
    fn trace_is_truncated_to_capacity() {
        let mut t: Transport<_, 32> = Transport::new(MockAdapter::new());
        t.init(Some("[T] "), None).unwrap();
        t.trace_formatted(format_args!("{}", "0123456789".repeat(5)));

        let sent = t.adapter().wire();
        assert_eq!(sent.len(), 31);
        assert_eq!(&sent[..4], b"[T] ");
        assert_eq!(&sent[4..], &"0123456789".repeat(5).as_bytes()[..27]);
    }

    #[test]
    fn oversized_prefix_is_clamped() {
        let mut t: Transport<_, 8> = Transport::new(MockAdapter::new());
        t.init(Some("0123456789"), None).unwrap();
        assert_eq!(t.prefix(), b"0123456");
        t.trace_formatted(format_args!("x"));
        assert_eq!(t.adapter().wire(), b"0123456");
    }

    #[test]
    fn sequential_traces_do_not_share_bytes() {
        let mut t: Transport<_> = Transport::new(MockAdapter::new());
        t.init(Some("[first prefix] "), None).unwrap();
        t.trace_formatted(format_args!("a rather long first payload {}", 12345));
        t.init(Some("[2] "), None).unwrap();
        t.trace_formatted(format_args!("b"));

        assert_eq!(
            t.adapter().sends(),
            vec![
                b"[first prefix] a rather long first payload 12345".to_vec(),
                b"[2] b".to_vec(),
            ]
        );
    }

    #[test]
    fn polled_send_waits_for_full_count() {
        let mut adapter = MockAdapter::new();
        adapter.step = 3;
        let mut t = ready(adapter, None);

        assert_eq!(t.send_bytes(b"0123456789"), Ok(()));
        // Counter reads 3, 6, 9 and finally 10.
        assert_eq!(t.adapter().tx_polls.get(), 4);
        assert_eq!(t.adapter().wire(), b"0123456789");
    }

    #[test]
    fn polled_send_of_nothing_returns_immediately() {
        let mut t = ready(MockAdapter::new(), None);
        assert_eq!(t.send_bytes(&[]), Ok(()));
        assert_eq!(t.adapter().calls, init_calls(false));
        assert_eq!(t.adapter().tx_polls.get(), 0);
    }

    #[test]
    fn callback_send_waits_for_event() {
        let c = completion();
        let mut adapter = MockAdapter::new();
        adapter.signal = Signal::After(Duration::from_millis(30));
        let fired = adapter.fired.clone();
        let mut t: Transport<_> = Transport::new(adapter);
        t.init(None, Some(c)).unwrap();

        assert_eq!(t.send_bytes(b"ping"), Ok(()));
        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(c.event(), event::SEND_COMPLETE);
        // Byte counters are not consulted in callback mode.
        assert_eq!(t.adapter().tx_polls.get(), 0);
    }

    #[test]
    fn callback_send_ignores_stale_event() {
        let c = completion();
        c.signal(event::RX_TIMEOUT);
        let mut adapter = MockAdapter::new();
        adapter.signal = Signal::After(Duration::from_millis(30));
        let fired = adapter.fired.clone();
        let mut t: Transport<_> = Transport::new(adapter);
        t.init(None, Some(c)).unwrap();

        assert_eq!(t.send_bytes(b"x"), Ok(()));
        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(c.event(), event::SEND_COMPLETE);
    }

    #[test]
    fn one_event_per_send() {
        let c = completion();
        let mut t: Transport<_> = Transport::new(MockAdapter::new());
        t.init(Some("# "), Some(c)).unwrap();

        t.trace_formatted(format_args!("one"));
        t.trace_formatted(format_args!("two"));
        assert_eq!(t.adapter().wire(), b"# one# two");
    }

    #[test]
    fn send_start_failure_is_returned() {
        let mut t = ready(MockAdapter::failing(Step::BeginSend, AdapterError::Busy), None);
        assert_eq!(t.send_bytes(b"abc"), Err(AdapterError::Busy));
        assert_eq!(t.adapter().tx_polls.get(), 0);
        assert!(t.adapter().wire().is_empty());
    }

    #[test]
    fn trace_swallows_send_failure() {
        let mut t = ready(
            MockAdapter::failing(Step::BeginSend, AdapterError::Specific(-9)),
            Some("> "),
        );
        t.trace_formatted(format_args!("dropped"));
        assert_eq!(t.adapter().sends(), vec![b"> dropped".to_vec()]);
        assert!(t.adapter().wire().is_empty());
    }

    #[test]
    fn polled_receive_waits_for_count() {
        let mut adapter = MockAdapter::new();
        adapter.rx_source = b"pong".to_vec();
        let mut t = ready(adapter, None);
        let mut buf = [0u8; 8];

        assert_eq!(unsafe { t.receive_bytes(&mut buf, 4) }, Ok(()));
        assert_eq!(&buf[..4], b"pong");
        assert_eq!(t.adapter().rx_polls.get(), 4);
        assert_eq!(t.adapter().calls.last(), Some(&Call::BeginReceive(4)));
    }

    #[test]
    fn callback_receive_returns_once_started() {
        let c = completion();
        c.signal(event::SEND_COMPLETE);
        let mut adapter = MockAdapter::new();
        adapter.signal = Signal::Never;
        let mut t: Transport<_> = Transport::new(adapter);
        t.init(None, Some(c)).unwrap();
        let mut buf = [0u8; 4];

        assert_eq!(unsafe { t.receive_bytes(&mut buf, 4) }, Ok(()));
        assert_eq!(t.adapter().rx_polls.get(), 0);
        assert!(!c.is_complete());
    }

    #[test]
    fn callback_receive_data_is_read_after_completion() {
        let c = completion();
        let mut adapter = MockAdapter::new();
        adapter.rx_source = b"ack".to_vec();
        adapter.signal = Signal::After(Duration::from_millis(20));
        let mut t: Transport<_> = Transport::new(adapter);
        t.init(None, Some(c)).unwrap();
        let mut buf = [0u8; 3];

        // SAFETY: `buf` is left alone until the completion is signalled.
        assert_eq!(unsafe { t.receive_bytes(&mut buf, 3) }, Ok(()));
        c.wait_blocking();
        assert_eq!(c.event(), event::RECEIVE_COMPLETE);
        assert_eq!(&buf, b"ack");
    }

    #[test]
    fn receive_longer_than_buffer_is_rejected() {
        let mut t = ready(MockAdapter::new(), None);
        let mut buf = [0u8; 2];
        assert_eq!(unsafe { t.receive_bytes(&mut buf, 3) }, Err(AdapterError::Parameter));
        assert_eq!(t.adapter().calls, init_calls(false));
    }

    #[test]
    fn receive_start_failure_is_returned() {
        let mut t = ready(MockAdapter::failing(Step::BeginReceive, AdapterError::Timeout), None);
        let mut buf = [0u8; 2];
        assert_eq!(unsafe { t.receive_bytes(&mut buf, 2) }, Err(AdapterError::Timeout));
        assert_eq!(t.adapter().rx_polls.get(), 0);
    }

    #[test]
    fn usable_as_trait_object() {
        let mut t = ready(MockAdapter::new(), Some("$ "));
        let dyn_t: &mut dyn Trace = &mut t;
        assert!(dyn_t.is_ready());
        dyn_t.trace_formatted(format_args!("{:>3}", 7));
        assert_eq!(t.release().wire(), b"$   7");
    }

    #[cfg(feature = "async-await")]
    mod async_send {
        use super::*;
        use std::sync::Arc;
        use std::task::{Context, Poll, Wake, Waker};
        use std::thread::{self, Thread};

        struct Unpark(Thread);
        impl Wake for Unpark {
            fn wake(self: Arc<Self>) {
                self.0.unpark();
            }
        }

        fn block_on<F: Future>(fut: F) -> F::Output {
            let mut fut = core::pin::pin!(fut);
            let waker = Waker::from(Arc::new(Unpark(thread::current())));
            let mut cx = Context::from_waker(&waker);
            loop {
                match fut.as_mut().poll(&mut cx) {
                    Poll::Ready(v) => return v,
                    Poll::Pending => thread::park(),
                }
            }
        }

        #[test]
        fn awaits_completion_event() {
            let c = completion();
            let mut adapter = MockAdapter::new();
            adapter.signal = Signal::After(Duration::from_millis(30));
            let fired = adapter.fired.clone();
            let mut t: Transport<_> = Transport::new(adapter);
            t.init(None, Some(c)).unwrap();

            assert_eq!(block_on(t.send_bytes_async(b"async")), Ok(()));
            assert!(fired.load(Ordering::SeqCst));
            assert_eq!(t.adapter().wire(), b"async");
        }

        #[test]
        fn polls_counter_until_done() {
            let mut adapter = MockAdapter::new();
            adapter.step = 2;
            let mut t = ready(adapter, None);

            assert_eq!(block_on(t.send_bytes_async(b"12345")), Ok(()));
            assert_eq!(t.adapter().tx_polls.get(), 3);
        }

        #[test]
        fn dropped_send_waits_for_its_completion() {
            let c = completion();
            let mut adapter = MockAdapter::new();
            adapter.signal = Signal::After(Duration::from_millis(50));
            let fired = adapter.fired.clone();
            let mut t: Transport<_> = Transport::new(adapter);
            t.init(None, Some(c)).unwrap();

            {
                let fut = t.send_bytes_async(b"first");
                let mut fut = core::pin::pin!(fut);
                let waker = Waker::noop();
                let mut cx = Context::from_waker(waker);
                assert!(fut.as_mut().poll(&mut cx).is_pending());
            }
            // The transfer finished before the future went away.
            assert!(fired.load(Ordering::SeqCst));
            assert_eq!(c.event(), event::SEND_COMPLETE);

            // No late event is left to complete the next send.
            c.reset();
            std::thread::sleep(Duration::from_millis(80));
            assert!(!c.is_complete());
        }

        #[test]
        fn dropped_polled_send_waits_for_count() {
            let mut adapter = MockAdapter::new();
            adapter.step = 2;
            let mut t = ready(adapter, None);

            {
                let fut = t.send_bytes_async(b"12345");
                let mut fut = core::pin::pin!(fut);
                let waker = Waker::noop();
                let mut cx = Context::from_waker(waker);
                assert!(fut.as_mut().poll(&mut cx).is_pending());
            }
            // One poll inside the future, then 4 and 5 from the drop.
            assert_eq!(t.adapter().tx_polls.get(), 3);
            assert_eq!(t.adapter.transmitted_count(), 5);
        }

        #[test]
        fn noop_before_init() {
            let mut t: Transport<_> = Transport::new(MockAdapter::new());
            assert_eq!(block_on(t.send_bytes_async(b"x")), Ok(()));
            assert!(t.adapter().calls.is_empty());
        }
    }
}
