//! Outbound message gate.
//!
//! Validates user-authored text before it reaches the transport. The
//! gate enforces an explicit drop-not-queue policy: while the
//! connection is anything but open, messages are refused with a locally
//! rendered notice and are never buffered for replay. See
//! ARCHITECTURE.md Section 4.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::client::lifecycle::{ConnectionState, Lifecycle};
use crate::protocol::ClientFrame;
use crate::render::render;
use crate::surface::{Role, UiSurface};

// ============================================================================
// Notices
// ============================================================================

/// Shown when the user submits empty or whitespace-only text.
const EMPTY_TEXT_NOTICE: &str = "Please type a message before sending.";

/// Shown when the user submits while the connection is not open.
const NOT_CONNECTED_NOTICE: &str =
    "Not connected to the booking assistant. Please wait a moment and try again.";

// ============================================================================
// OutboundGate
// ============================================================================

/// Validates outbound text and produces wire frames.
pub(crate) struct OutboundGate {
    /// Shared lifecycle handle, read for the open check.
    lifecycle: Arc<Mutex<Lifecycle>>,
    /// Surface for local echo and rejection notices.
    surface: Arc<dyn UiSurface>,
}

impl OutboundGate {
    pub(crate) fn new(lifecycle: Arc<Mutex<Lifecycle>>, surface: Arc<dyn UiSurface>) -> Self {
        Self { lifecycle, surface }
    }

    /// Validates `text` and, if accepted, echoes it locally and returns
    /// the frame to forward.
    ///
    /// Rejections surface a rendered error notice and return `None`;
    /// nothing reaches the transport and no error reaches the caller.
    pub(crate) fn admit(&self, text: &str) -> Option<ClientFrame> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!("rejecting empty message");
            self.reject(EMPTY_TEXT_NOTICE);
            return None;
        }

        let state = self.lifecycle.lock().state();
        if state != ConnectionState::Open {
            debug!(?state, "rejecting message while not open");
            self.reject(NOT_CONNECTED_NOTICE);
            return None;
        }

        // Local echo lands before the server round trip completes.
        let fragment = render(trimmed);
        self.surface.append_message(&fragment, Role::User);
        self.surface.scroll_to_latest();

        Some(ClientFrame::new(trimmed))
    }

    /// Surfaces a rejection notice as a rendered error fragment.
    fn reject(&self, notice: &str) {
        let fragment = render(notice);
        self.surface.append_message(&fragment, Role::Error);
        self.surface.scroll_to_latest();
    }
}

// ============================================================================
// Tests
// ============================================================================
