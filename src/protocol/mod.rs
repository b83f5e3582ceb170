//! WebSocket protocol message types.
//!
//! This module defines the wire format for communication between the
//! client and the booking assistant server.
//!
//! # Protocol Overview
//!
//! From ARCHITECTURE.md Section 2:
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`ClientFrame`] | Client → Server | User-authored message |
//! | [`ServerEvent`] | Server → Client | Tagged conversational event |
//!
//! # Event Tagging
//!
//! Server events carry a `type` tag:
//!
//! - `system` — connection banner, already surfaced by the page
//! - `typing` — the assistant started composing a reply
//! - `response` — assistant reply text
//! - `error` — server-reported failure text
//!
//! Unrecognized tags parse into [`ParsedEvent::Unknown`] so the router
//! can log and ignore them without failing.

// ============================================================================
// Submodules
// ============================================================================

/// Wire frame types for both directions.
pub mod frame;

// ============================================================================
// Re-exports
// ============================================================================

pub use frame::{ClientFrame, ParsedEvent, ServerEvent};
