//! Connection lifecycle state machine.
//!
//! Pure, synchronous bookkeeping for one connection: current state,
//! retry counter and the linear backoff schedule. The async supervisor
//! (ARCHITECTURE.md Section 3.3) feeds transitions in and interprets
//! the decisions that come back; tests can drive the machine directly
//! with synthetic event sequences.
//!
//! # State Machine
//!
//! ```text
//! Idle ──► Connecting ──► Open
//!              ▲            │
//!              │ retry      ▼
//!              └──────── Closed ──► Exhausted
//! ```
//!
//! `Closed → Connecting` happens while the retry budget lasts, after a
//! delay of `attempt × base_delay` (linear, not exponential). Once the
//! budget is spent the machine parks in `Exhausted`, which is terminal:
//! recovery requires a fresh client instance.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::debug;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the managed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection has been attempted, or the client was stopped.
    Idle,
    /// A transport is being opened.
    Connecting,
    /// The transport is live; outbound messages may flow.
    Open,
    /// The transport dropped; a reconnect may be pending.
    Closed,
    /// Retry budget spent. Terminal.
    Exhausted,
}

// ============================================================================
// ReconnectDecision
// ============================================================================

/// What to do after the transport dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReconnectDecision {
    /// Schedule one deferred reconnect after `delay`.
    Retry {
        /// How long to wait before re-entering `Connecting`.
        delay: Duration,
    },
    /// Budget spent; surface the terminal notice and stop.
    Exhausted,
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Per-connection state and retry bookkeeping.
///
/// Exclusively owned by the supervisor; other components only observe
/// [`ConnectionState`] through a shared handle.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    /// Current connection state.
    state: ConnectionState,
    /// Reconnect attempts made since the last successful open.
    attempt_count: u32,
    /// Delay unit for the linear backoff schedule.
    base_delay: Duration,
    /// Maximum automatic reconnect attempts.
    max_retries: u32,
}

impl Lifecycle {
    /// Creates a machine in `Idle` with a zeroed retry counter.
    pub(crate) fn new(base_delay: Duration, max_retries: u32) -> Self {
        Self {
            state: ConnectionState::Idle,
            attempt_count: 0,
            base_delay,
            max_retries,
        }
    }

    /// Returns the current state.
    #[inline]
    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the reconnect attempts made since the last open.
    #[inline]
    pub(crate) fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// A transport open is starting.
    pub(crate) fn on_connecting(&mut self) {
        debug!(from = ?self.state, "entering Connecting");
        self.state = ConnectionState::Connecting;
    }

    /// The transport opened. Resets the retry counter.
    pub(crate) fn on_open(&mut self) {
        debug!(attempts_used = self.attempt_count, "entering Open");
        self.state = ConnectionState::Open;
        self.attempt_count = 0;
    }

    /// The transport dropped (close or error, the machine does not
    /// distinguish). Decides between one deferred retry and giving up.
    pub(crate) fn on_closed(&mut self) -> ReconnectDecision {
        self.state = ConnectionState::Closed;

        if self.attempt_count < self.max_retries {
            self.attempt_count += 1;
            let delay = self.base_delay * self.attempt_count;
            debug!(
                attempt = self.attempt_count,
                delay_ms = delay.as_millis() as u64,
                "entering Closed, retry scheduled"
            );
            ReconnectDecision::Retry { delay }
        } else {
            debug!(attempts = self.attempt_count, "entering Exhausted");
            self.state = ConnectionState::Exhausted;
            ReconnectDecision::Exhausted
        }
    }

    /// The client was stopped by its owner.
    pub(crate) fn on_stopped(&mut self) {
        debug!(from = ?self.state, "entering Idle");
        self.state = ConnectionState::Idle;
    }
}

// ============================================================================
// Tests
// ============================================================================
