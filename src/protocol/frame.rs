//! Wire frame types.
//!
//! Defines the message format for frames exchanged with the booking
//! assistant server over the session-scoped WebSocket.
//!
//! See ARCHITECTURE.md Section 2 for the wire contract.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// ClientFrame
// ============================================================================

/// A user-authored message from client to server.
///
/// Ephemeral: serialized, forwarded and dropped. Never retained or
/// replayed after a reconnect.
///
/// # Format
///
/// ```json
/// { "message": "Book a table for two at 19:00" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientFrame {
    /// The user's message text.
    pub message: String,
}

impl ClientFrame {
    /// Creates a new outbound frame.
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// ServerEvent
// ============================================================================

/// A tagged conversational event from server to client.
///
/// # Format
///
/// ```json
/// { "type": "response", "content": "Your table is booked. Ref ABC1234" }
/// ```
///
/// The `content` field is optional on the wire; missing content reads
/// as an empty string.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerEvent {
    /// Event tag (`system`, `typing`, `response`, `error`).
    #[serde(rename = "type")]
    pub kind: String,

    /// Event text payload, if any.
    #[serde(default)]
    pub content: Option<String>,
}

impl ServerEvent {
    /// Parses the event into a typed variant.
    ///
    /// Unrecognized tags map to [`ParsedEvent::Unknown`] rather than
    /// failing, so the router can log and ignore them.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        match self.kind.as_str() {
            "system" => ParsedEvent::System {
                content: self.content_text(),
            },
            "typing" => ParsedEvent::Typing,
            "response" => ParsedEvent::Response {
                content: self.content_text(),
            },
            "error" => ParsedEvent::Error {
                content: self.content_text(),
            },
            _ => ParsedEvent::Unknown {
                kind: self.kind.clone(),
            },
        }
    }

    /// Gets the content payload, defaulting to empty.
    #[inline]
    fn content_text(&self) -> String {
        self.content.clone().unwrap_or_default()
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Parsed server events for type-safe routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEvent {
    /// Connection banner; already surfaced by the page collaborator.
    System {
        /// Banner text.
        content: String,
    },

    /// The assistant started composing a reply.
    Typing,

    /// Assistant reply text.
    Response {
        /// Reply text, raw (not yet rendered).
        content: String,
    },

    /// Server-reported failure; the connection stays open.
    Error {
        /// Failure text, surfaced verbatim.
        content: String,
    },

    /// Unrecognized event tag.
    Unknown {
        /// The unrecognized tag value.
        kind: String,
    },
}

// ============================================================================
// Tests
// ============================================================================
