//! Chat client coordinator.
//!
//! The [`ChatClient`] owns everything with state: the session identity,
//! the managed connection and its retry bookkeeping, the outbound gate
//! and the supervisor task that drives them. One instance corresponds
//! to one conversation session; multiple independent instances can
//! coexist (each with its own session and connection).
//!
//! See ARCHITECTURE.md Section 3.3 for the supervisor event loop.
//!
//! # Supervisor Loop
//!
//! The supervisor is a single tokio task that handles:
//!
//! - Opening transports to the session-scoped endpoint
//! - Inbound frames from the server (routed to the UI surface)
//! - Outbound frames admitted by the gate
//! - The deferred reconnect timer (linear backoff)
//! - `stop()` requests from the owner
//!
//! Events are handled one at a time, so inbound frames are processed
//! strictly in delivery order and no locking is needed beyond the
//! shared state handle. At most one reconnect sleep can be pending at
//! any time because the sleep lives inline in the loop.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `gate` | Outbound validation and local echo |
//! | `lifecycle` | Connection state machine and backoff schedule |
//! | `router` | Inbound event dispatch |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound message gate.
mod gate;

/// Connection lifecycle state machine.
pub mod lifecycle;

/// Inbound event routing.
mod router;

// ============================================================================
// Re-exports
// ============================================================================

pub use lifecycle::ConnectionState;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::protocol::{ClientFrame, ServerEvent};
use crate::render::render;
use crate::surface::{Role, UiSurface};
use crate::transport::{Connector, TransportSink, TransportStream, WsConnector};

use gate::OutboundGate;
use lifecycle::{Lifecycle, ReconnectDecision};

// ============================================================================
// Constants
// ============================================================================

/// Default delay unit for the linear reconnect backoff.
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Default maximum automatic reconnect attempts after a drop.
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Shown exactly once when the retry budget is spent.
const EXHAUSTED_NOTICE: &str =
    "Unable to reach the booking assistant. Please reload the page to try again.";

// ============================================================================
// Types
// ============================================================================

/// Requests from the owner to the supervisor task.
enum Command {
    /// Forward an admitted frame to the live transport.
    Send(ClientFrame),
    /// Close the transport, cancel any pending reconnect and exit.
    Stop,
}

/// Why the pump loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PumpOutcome {
    /// The transport dropped (remote close, stream end or write error).
    Remote,
    /// The owner requested shutdown.
    Stopped,
}

// ============================================================================
// ChatClientBuilder
// ============================================================================

/// Builder for configuring a [`ChatClient`] instance.
///
/// Use [`ChatClient::builder()`] to create a new builder.
pub struct ChatClientBuilder {
    /// Server endpoint, scheme and authority only (`ws://host:port`).
    endpoint: Option<String>,
    /// UI surface the client drives.
    surface: Option<Arc<dyn UiSurface>>,
    /// Transport connector; defaults to [`WsConnector`].
    connector: Option<Arc<dyn Connector>>,
    /// Delay unit for the linear backoff schedule.
    base_delay: Duration,
    /// Maximum automatic reconnect attempts.
    max_retries: u32,
}

impl Default for ChatClientBuilder {
    fn default() -> Self {
        Self {
            endpoint: None,
            surface: None,
            connector: None,
            base_delay: DEFAULT_BASE_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ChatClientBuilder {
    /// Creates a new builder with default backoff settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server endpoint.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Base URL, `ws` or `wss` scheme (e.g.
    ///   `"ws://localhost:8000"`). The session path is appended
    ///   automatically.
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the UI surface the client drives.
    #[inline]
    #[must_use]
    pub fn surface(mut self, surface: Arc<dyn UiSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Sets a custom transport connector.
    ///
    /// Defaults to [`WsConnector`]. Mainly useful for tests, which can
    /// script connection outcomes without a live server.
    #[inline]
    #[must_use]
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Sets the delay unit for the linear backoff schedule.
    #[inline]
    #[must_use]
    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Sets the maximum automatic reconnect attempts.
    #[inline]
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Builds the client with validation.
    ///
    /// Generates a fresh [`SessionId`] and derives the session-scoped
    /// endpoint from it. The client is not connected yet; call
    /// [`ChatClient::start`].
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if endpoint or surface is not set
    /// - [`Error::Config`] if the endpoint is not a valid `ws`/`wss` URL
    pub fn build(self) -> Result<ChatClient> {
        let endpoint = self.endpoint.ok_or_else(|| {
            Error::config(
                "Endpoint is required. Use .endpoint() to set it.\n\
                 Example: ChatClient::builder().endpoint(\"ws://localhost:8000\")",
            )
        })?;

        let base = Url::parse(&endpoint)
            .map_err(|e| Error::config(format!("Invalid endpoint URL: {e}")))?;

        match base.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::config(format!(
                    "Endpoint scheme must be ws or wss, got: {other}"
                )));
            }
        }

        let surface = self
            .surface
            .ok_or_else(|| Error::config("UI surface is required. Use .surface() to set it."))?;

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WsConnector) as Arc<dyn Connector>);

        let session = SessionId::generate();
        let url = base
            .join(&format!("/ws/{session}"))
            .map_err(|e| Error::config(format!("Failed to build session endpoint: {e}")))?;

        let lifecycle = Arc::new(Mutex::new(Lifecycle::new(
            self.base_delay,
            self.max_retries,
        )));
        let gate = OutboundGate::new(Arc::clone(&lifecycle), Arc::clone(&surface));

        debug!(session = %session, url = %url, "client built");

        Ok(ChatClient {
            inner: Arc::new(ClientInner {
                session,
                url,
                surface,
                connector,
                lifecycle,
                gate,
                command_tx: Mutex::new(None),
                supervisor: Mutex::new(None),
                started: AtomicBool::new(false),
            }),
        })
    }
}

// ============================================================================
// ChatClient
// ============================================================================

/// Internal shared state for the client.
struct ClientInner {
    /// Session identity, fixed for the client's lifetime.
    session: SessionId,
    /// Session-scoped WebSocket endpoint.
    url: Url,
    /// UI surface driven by the router, gate and supervisor.
    surface: Arc<dyn UiSurface>,
    /// Transport factory.
    connector: Arc<dyn Connector>,
    /// Connection state machine, mutated only by the supervisor.
    lifecycle: Arc<Mutex<Lifecycle>>,
    /// Outbound validation.
    gate: OutboundGate,
    /// Channel to the supervisor; present while running.
    command_tx: Mutex<Option<mpsc::UnboundedSender<Command>>>,
    /// Supervisor task handle, taken by [`ChatClient::await_terminated`].
    supervisor: Mutex<Option<JoinHandle<Result<()>>>>,
    /// One-shot start guard.
    started: AtomicBool,
}

/// Chat client coordinator.
///
/// Cheap to clone; clones share the same session and connection.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use booking_chat_client::{ChatClient, Result, Role, Span, UiSurface};
///
/// struct Console;
///
/// impl UiSurface for Console {
///     fn append_message(&self, fragment: &[Span], role: Role) {
///         println!("{role:?}: {}", booking_chat_client::to_plain_text(fragment));
///     }
///     fn set_typing_visible(&self, _visible: bool) {}
///     fn set_input_enabled(&self, _enabled: bool) {}
///     fn scroll_to_latest(&self) {}
/// }
///
/// # async fn example() -> Result<()> {
/// let client = ChatClient::builder()
///     .endpoint("ws://localhost:8000")
///     .surface(Arc::new(Console))
///     .build()?;
///
/// client.start()?;
/// client.send("Book a table for two at 19:00");
/// client.stop();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChatClient {
    /// Shared inner state.
    inner: Arc<ClientInner>,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("session", &self.inner.session)
            .field("url", &self.inner.url.as_str())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Creates a configuration builder for the client.
    #[inline]
    #[must_use]
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::new()
    }

    /// Returns the session identifier.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &SessionId {
        &self.inner.session
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.lifecycle.lock().state()
    }

    /// Starts the supervisor task and begins connecting.
    ///
    /// Must be called within a tokio runtime. A client starts at most
    /// once; after [`stop`](Self::stop) or exhaustion, build a fresh
    /// instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the client was already started.
    pub fn start(&self) -> Result<()> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Err(Error::config("Client already started"));
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        *self.inner.command_tx.lock() = Some(command_tx);

        let handle = tokio::spawn(run(Arc::clone(&self.inner), command_rx));
        *self.inner.supervisor.lock() = Some(handle);

        info!(session = %self.inner.session, "client started");
        Ok(())
    }

    /// Submits user-authored text.
    ///
    /// Both UI entry points feed this operation: the free-text input and
    /// quick-action buttons (which supply a literal string).
    ///
    /// The text is validated by the outbound gate. Accepted messages are
    /// echoed locally and forwarded to the transport; rejected ones
    /// surface a rendered notice instead. Never blocks, never buffers,
    /// never returns an error: while disconnected, messages are dropped
    /// by design rather than queued for replay.
    pub fn send(&self, text: &str) {
        let Some(frame) = self.inner.gate.admit(text) else {
            return;
        };

        let guard = self.inner.command_tx.lock();
        match guard.as_ref() {
            Some(tx) => {
                if tx.send(Command::Send(frame)).is_err() {
                    debug!("supervisor gone, dropping frame");
                }
            }
            None => debug!("client not running, dropping frame"),
        }
    }

    /// Stops the client: closes the transport and cancels any pending
    /// reconnect. Idempotent.
    pub fn stop(&self) {
        let tx = self.inner.command_tx.lock().take();
        if let Some(tx) = tx {
            debug!(session = %self.inner.session, "stop requested");
            let _ = tx.send(Command::Stop);
        }
    }

    /// Waits for the supervisor task to finish.
    ///
    /// Resolves `Ok(())` after a [`stop`](Self::stop), or
    /// [`Error::Exhausted`] once the retry budget is spent.
    ///
    /// # Errors
    ///
    /// - [`Error::Exhausted`] if reconnect attempts ran out
    /// - [`Error::Connection`] if the supervisor task failed abnormally
    pub async fn await_terminated(&self) -> Result<()> {
        let handle = self.inner.supervisor.lock().take();
        match handle {
            Some(handle) => handle
                .await
                .map_err(|e| Error::connection(format!("Supervisor task failed: {e}")))?,
            None => Ok(()),
        }
    }
}

// ============================================================================
// Supervisor
// ============================================================================

/// Supervisor event loop: connect, pump, back off, reconnect.
async fn run(inner: Arc<ClientInner>, mut command_rx: mpsc::UnboundedReceiver<Command>) -> Result<()> {
    loop {
        inner.lifecycle.lock().on_connecting();
        debug!(url = %inner.url, "opening transport");

        match inner.connector.connect(&inner.url).await {
            Ok((mut sink, mut stream)) => {
                inner.lifecycle.lock().on_open();
                inner.surface.set_input_enabled(true);
                info!(session = %inner.session, "connected");

                let outcome =
                    pump(&inner, sink.as_mut(), stream.as_mut(), &mut command_rx).await;
                inner.surface.set_input_enabled(false);

                if outcome == PumpOutcome::Stopped {
                    inner.lifecycle.lock().on_stopped();
                    info!(session = %inner.session, "client stopped");
                    return Ok(());
                }
                debug!("transport dropped");
            }

            Err(e) => {
                warn!(error = %e, "connection attempt failed");
                inner.surface.set_input_enabled(false);
            }
        }

        let decision = inner.lifecycle.lock().on_closed();
        match decision {
            ReconnectDecision::Retry { delay } => {
                if !wait_for_retry(delay, &mut command_rx).await {
                    inner.lifecycle.lock().on_stopped();
                    info!(session = %inner.session, "client stopped while waiting to reconnect");
                    return Ok(());
                }
            }

            ReconnectDecision::Exhausted => {
                let attempts = inner.lifecycle.lock().attempt_count();
                error!(session = %inner.session, attempts, "reconnect attempts exhausted");

                let fragment = render(EXHAUSTED_NOTICE);
                inner.surface.append_message(&fragment, Role::Error);
                inner.surface.scroll_to_latest();

                return Err(Error::exhausted(attempts));
            }
        }
    }
}

/// Pumps one live transport until it drops or the owner stops the
/// client.
async fn pump(
    inner: &ClientInner,
    sink: &mut dyn TransportSink,
    stream: &mut dyn TransportStream,
    command_rx: &mut mpsc::UnboundedReceiver<Command>,
) -> PumpOutcome {
    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(text) => match serde_json::from_str::<ServerEvent>(&text) {
                    Ok(event) => router::route(&event, inner.surface.as_ref()),
                    // Unparseable frame: logged and dropped, no state change.
                    Err(e) => warn!(error = %e, "dropping unparseable frame"),
                },
                None => return PumpOutcome::Remote,
            },

            command = command_rx.recv() => match command {
                Some(Command::Send(frame)) => {
                    if let Err(e) = sink.send(&frame).await {
                        warn!(error = %e, "send failed, dropping transport");
                        return PumpOutcome::Remote;
                    }
                    trace!("frame forwarded");
                }

                Some(Command::Stop) | None => {
                    sink.close().await;
                    return PumpOutcome::Stopped;
                }
            },
        }
    }
}

/// Sleeps out the backoff delay.
///
/// Frames submitted while disconnected are dropped here (drop-not-queue).
/// Returns `false` if a stop arrived before the delay elapsed.
async fn wait_for_retry(
    delay: Duration,
    command_rx: &mut mpsc::UnboundedReceiver<Command>,
) -> bool {
    debug!(delay_ms = delay.as_millis() as u64, "waiting to reconnect");

    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,

            command = command_rx.recv() => match command {
                Some(Command::Send(_)) => debug!("dropping frame sent while disconnected"),
                Some(Command::Stop) | None => return false,
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::AtomicU32;

    use async_trait::async_trait;
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio_test::assert_ok;
    use tokio_tungstenite::tungstenite::Message;

    use crate::render::Span;
    use crate::surface::recording::{RecordingSurface, SurfaceCall};

    // ------------------------------------------------------------------------
    // Test Support
    // ------------------------------------------------------------------------

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await;
        waited.unwrap_or_else(|_| panic!("timed out waiting for {what}"));
    }

    /// One scripted connection outcome.
    enum ScriptedAttempt {
        /// The connect call fails.
        Fail,
        /// The connect call yields a working in-memory transport.
        Open,
    }

    /// Scripted in-memory stand-in for the production connector.
    ///
    /// Records every frame the client writes, counts connect attempts
    /// and exposes per-connection feeders for injecting server frames.
    /// Attempts beyond the script fail.
    struct ScriptedConnector {
        script: Mutex<VecDeque<ScriptedAttempt>>,
        attempts: AtomicU32,
        sent: Arc<Mutex<Vec<ClientFrame>>>,
        feeders: Mutex<Vec<mpsc::UnboundedSender<String>>>,
    }

    impl ScriptedConnector {
        fn new(script: Vec<ScriptedAttempt>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                attempts: AtomicU32::new(0),
                sent: Arc::new(Mutex::new(Vec::new())),
                feeders: Mutex::new(Vec::new()),
            })
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }

        fn sent(&self) -> Vec<ClientFrame> {
            self.sent.lock().clone()
        }

        /// Feeds a raw frame into the most recent live connection.
        fn feed(&self, frame: &str) {
            let feeders = self.feeders.lock();
            let feeder = feeders.last().expect("no live connection");
            feeder.send(frame.to_string()).expect("connection gone");
        }

        /// Drops the oldest live connection, closing its stream.
        fn close_oldest(&self) {
            let feeder = self.feeders.lock().remove(0);
            drop(feeder);
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        async fn connect(
            &self,
            _url: &Url,
        ) -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>)> {
            self.attempts.fetch_add(1, Ordering::SeqCst);

            match self.script.lock().pop_front() {
                Some(ScriptedAttempt::Open) => {
                    let (feeder, rx) = mpsc::unbounded_channel();
                    self.feeders.lock().push(feeder);
                    Ok((
                        Box::new(SpySink {
                            sent: Arc::clone(&self.sent),
                        }),
                        Box::new(SpyStream { rx }),
                    ))
                }
                Some(ScriptedAttempt::Fail) | None => Err(Error::connection("scripted failure")),
            }
        }
    }

    struct SpySink {
        sent: Arc<Mutex<Vec<ClientFrame>>>,
    }

    #[async_trait]
    impl TransportSink for SpySink {
        async fn send(&mut self, frame: &ClientFrame) -> Result<()> {
            self.sent.lock().push(frame.clone());
            Ok(())
        }

        async fn close(&mut self) {}
    }

    struct SpyStream {
        rx: mpsc::UnboundedReceiver<String>,
    }

    #[async_trait]
    impl TransportStream for SpyStream {
        async fn next(&mut self) -> Option<String> {
            self.rx.recv().await
        }
    }

    fn client_with(
        connector: &Arc<ScriptedConnector>,
        surface: &Arc<RecordingSurface>,
        base_delay: Duration,
    ) -> ChatClient {
        ChatClient::builder()
            .endpoint("ws://localhost:8000")
            .surface(Arc::clone(surface) as Arc<dyn UiSurface>)
            .connector(Arc::clone(connector) as Arc<dyn Connector>)
            .base_delay(base_delay)
            .build()
            .expect("build client")
    }

    // ------------------------------------------------------------------------
    // Builder
    // ------------------------------------------------------------------------

    #[test]
    fn test_build_fails_without_endpoint() {
        let result = ChatClient::builder()
            .surface(RecordingSurface::new() as Arc<dyn UiSurface>)
            .build();

        let err = result.err().expect("build should fail");
        assert!(err.to_string().contains("Endpoint"));
    }

    #[test]
    fn test_build_fails_without_surface() {
        let result = ChatClient::builder().endpoint("ws://localhost:8000").build();

        let err = result.err().expect("build should fail");
        assert!(err.to_string().contains("surface"));
    }

    #[test]
    fn test_build_rejects_non_websocket_scheme() {
        let result = ChatClient::builder()
            .endpoint("http://localhost:8000")
            .surface(RecordingSurface::new() as Arc<dyn UiSurface>)
            .build();

        let err = result.err().expect("build should fail");
        assert!(err.to_string().contains("ws or wss"));
    }

    #[test]
    fn test_session_scoped_endpoint() {
        let client = ChatClient::builder()
            .endpoint("ws://localhost:8000")
            .surface(RecordingSurface::new() as Arc<dyn UiSurface>)
            .build()
            .expect("build client");

        let expected = format!("ws://localhost:8000/ws/{}", client.session());
        assert_eq!(client.inner.url.as_str(), expected);
    }

    #[test]
    fn test_sessions_are_unique_per_client() {
        let build = || {
            ChatClient::builder()
                .endpoint("ws://localhost:8000")
                .surface(RecordingSurface::new() as Arc<dyn UiSurface>)
                .build()
                .expect("build client")
        };

        assert_ne!(build().session(), build().session());
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_exhausted_after_six_failed_attempts() {
        init_tracing();

        let connector = ScriptedConnector::new(vec![]);
        let surface = RecordingSurface::new();
        let client = client_with(&connector, &surface, Duration::from_millis(1));

        assert_ok!(client.start());
        let err = client
            .await_terminated()
            .await
            .err()
            .expect("should exhaust");

        assert!(matches!(err, Error::Exhausted { attempts: 5 }));
        assert_eq!(connector.attempts(), 6, "1 initial + 5 retries");
        assert_eq!(client.state(), ConnectionState::Exhausted);

        // Terminal notice surfaced exactly once.
        let appended = surface.appended();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].1, Role::Error);
        assert_eq!(appended[0].0, vec![Span::text(EXHAUSTED_NOTICE)]);
    }

    #[tokio::test]
    async fn test_open_resets_the_backoff_schedule() {
        init_tracing();

        let connector = ScriptedConnector::new(vec![
            ScriptedAttempt::Fail,
            ScriptedAttempt::Open,
            ScriptedAttempt::Open,
        ]);
        let surface = RecordingSurface::new();
        let client = client_with(&connector, &surface, Duration::from_millis(1));

        client.start().expect("start");
        wait_until("first open", || {
            connector.attempts() == 2 && client.state() == ConnectionState::Open
        })
        .await;
        assert_eq!(client.inner.lifecycle.lock().attempt_count(), 0);

        // Drop the live connection; the client reconnects from a fresh
        // schedule and opens again.
        connector.close_oldest();
        wait_until("second open", || {
            connector.attempts() == 3 && client.state() == ConnectionState::Open
        })
        .await;
        assert_eq!(client.inner.lifecycle.lock().attempt_count(), 0);

        client.stop();
        client.await_terminated().await.expect("clean stop");
    }

    #[tokio::test]
    async fn test_stop_cancels_pending_reconnect() {
        init_tracing();

        let connector = ScriptedConnector::new(vec![]);
        let surface = RecordingSurface::new();
        // Long enough that the test would time out if the sleep were
        // not cancelled.
        let client = client_with(&connector, &surface, Duration::from_secs(600));

        client.start().expect("start");
        wait_until("first attempt", || connector.attempts() == 1).await;

        client.stop();
        client.await_terminated().await.expect("clean stop");

        assert_eq!(connector.attempts(), 1);
        assert_eq!(client.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let connector = ScriptedConnector::new(vec![ScriptedAttempt::Open]);
        let surface = RecordingSurface::new();
        let client = client_with(&connector, &surface, Duration::from_millis(1));

        client.start().expect("first start");
        let err = client.start().err().expect("second start should fail");
        assert!(err.to_string().contains("already started"));

        client.stop();
        client.await_terminated().await.expect("clean stop");
    }

    #[tokio::test]
    async fn test_input_toggles_with_connection() {
        init_tracing();

        let connector = ScriptedConnector::new(vec![ScriptedAttempt::Open]);
        let surface = RecordingSurface::new();
        // Long delay so the reconnect stays pending until the stop below.
        let client = client_with(&connector, &surface, Duration::from_secs(600));

        client.start().expect("start");
        wait_until("open", || client.state() == ConnectionState::Open).await;

        connector.close_oldest();
        wait_until("input disabled", || {
            surface.calls().contains(&SurfaceCall::InputEnabled(false))
        })
        .await;

        let toggles: Vec<_> = surface
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::InputEnabled(enabled) => Some(enabled),
                _ => None,
            })
            .collect();
        assert!(toggles.starts_with(&[true, false]));

        client.stop();
        client.await_terminated().await.expect("clean stop");
    }

    // ------------------------------------------------------------------------
    // Outbound
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_send_emits_no_frame_while_not_open() {
        let connector = ScriptedConnector::new(vec![]);
        let surface = RecordingSurface::new();
        let client = client_with(&connector, &surface, Duration::from_secs(600));

        // Not started yet: state is Idle.
        client.send("hello");

        client.start().expect("start");
        wait_until("first attempt", || connector.attempts() == 1).await;

        // Closed, waiting to reconnect.
        client.send("hello again");

        assert_eq!(connector.sent(), Vec::<ClientFrame>::new());

        // Both rejections surfaced locally as error fragments.
        let appended = surface.appended();
        assert_eq!(appended.len(), 2);
        assert!(appended.iter().all(|(_, role)| *role == Role::Error));

        client.stop();
        client.await_terminated().await.expect("clean stop");
    }

    #[tokio::test]
    async fn test_send_forwards_and_echoes_while_open() {
        init_tracing();

        let connector = ScriptedConnector::new(vec![ScriptedAttempt::Open]);
        let surface = RecordingSurface::new();
        let client = client_with(&connector, &surface, Duration::from_millis(1));

        client.start().expect("start");
        wait_until("open", || client.state() == ConnectionState::Open).await;

        client.send("Book a table for two");
        wait_until("frame forwarded", || connector.sent().len() == 1).await;

        assert_eq!(
            connector.sent(),
            vec![ClientFrame::new("Book a table for two")]
        );

        // Local echo landed before any server round trip.
        let appended = surface.appended();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].1, Role::User);
        assert_eq!(appended[0].0, vec![Span::text("Book a table for two")]);

        client.stop();
        client.await_terminated().await.expect("clean stop");
    }

    // ------------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_typing_then_response_flow() {
        init_tracing();

        let connector = ScriptedConnector::new(vec![ScriptedAttempt::Open]);
        let surface = RecordingSurface::new();
        let client = client_with(&connector, &surface, Duration::from_millis(1));

        client.start().expect("start");
        wait_until("open", || client.state() == ConnectionState::Open).await;

        connector.feed(r#"{"type":"typing","content":"Agent is typing..."}"#);
        connector.feed(r#"{"type":"response","content":"**Booked!** See you at 19:00"}"#);

        wait_until("response rendered", || !surface.appended().is_empty()).await;

        assert_eq!(surface.typing_toggles(), vec![true, false]);

        let appended = surface.appended();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].1, Role::Assistant);
        assert_eq!(
            appended[0].0,
            vec![
                Span::Strong("Booked!".into()),
                Span::text(" See you at "),
                Span::Time("19:00".into()),
            ]
        );

        client.stop();
        client.await_terminated().await.expect("clean stop");
    }

    #[tokio::test]
    async fn test_unknown_and_unparseable_frames_are_dropped() {
        init_tracing();

        let connector = ScriptedConnector::new(vec![ScriptedAttempt::Open]);
        let surface = RecordingSurface::new();
        let client = client_with(&connector, &surface, Duration::from_millis(1));

        client.start().expect("start");
        wait_until("open", || client.state() == ConnectionState::Open).await;

        connector.feed(r#"{"type":"heartbeat"}"#);
        connector.feed("not json at all");
        // A well-formed response acts as an ordering barrier.
        connector.feed(r#"{"type":"response","content":"still here"}"#);

        wait_until("response rendered", || !surface.appended().is_empty()).await;

        // Only the connect signal and the final response touched the
        // surface; the two bad frames left no trace and the connection
        // stayed open.
        assert_eq!(
            surface.calls(),
            vec![
                SurfaceCall::InputEnabled(true),
                SurfaceCall::TypingVisible(false),
                SurfaceCall::Append {
                    fragment: vec![Span::text("still here")],
                    role: Role::Assistant,
                },
                SurfaceCall::Scroll,
            ]
        );
        assert_eq!(client.state(), ConnectionState::Open);

        client.stop();
        client.await_terminated().await.expect("clean stop");
    }

    // ------------------------------------------------------------------------
    // End to End
    // ------------------------------------------------------------------------

    /// Full stack over a live localhost WebSocket server.
    #[tokio::test]
    async fn test_round_trip_against_live_server() -> anyhow::Result<()> {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let Ok(mut socket) = tokio_tungstenite::accept_async(stream).await else {
                return;
            };

            let banner = r#"{"type":"system","content":"Connected to restaurant booking assistant."}"#;
            socket
                .send(Message::Text(banner.into()))
                .await
                .expect("send banner");

            while let Some(Ok(message)) = socket.next().await {
                if let Message::Text(text) = message {
                    let frame: serde_json::Value =
                        serde_json::from_str(&text).expect("client frame");
                    assert_eq!(frame["message"], "Book a table");

                    let typing = r#"{"type":"typing","content":"Agent is typing..."}"#;
                    let response =
                        r#"{"type":"response","content":"Done! Ref ABC1234 on 2024-07-20"}"#;
                    socket
                        .send(Message::Text(typing.into()))
                        .await
                        .expect("send typing");
                    socket
                        .send(Message::Text(response.into()))
                        .await
                        .expect("send response");
                }
            }
        });

        let surface = RecordingSurface::new();
        let client = ChatClient::builder()
            .endpoint(format!("ws://{addr}"))
            .surface(Arc::clone(&surface) as Arc<dyn UiSurface>)
            .build()?;

        client.start()?;
        wait_until("open", || client.state() == ConnectionState::Open).await;

        client.send("Book a table");
        wait_until("assistant reply", || surface.appended().len() == 2).await;

        let appended = surface.appended();
        assert_eq!(appended[0].1, Role::User);
        assert_eq!(appended[1].1, Role::Assistant);
        assert_eq!(
            appended[1].0,
            vec![
                Span::text("Done! Ref "),
                Span::BookingRef("ABC1234".into()),
                Span::text(" on "),
                Span::Date("2024-07-20".into()),
            ]
        );
        assert_eq!(surface.typing_toggles(), vec![true, false]);

        client.stop();
        client.await_terminated().await?;
        Ok(())
    }
}
