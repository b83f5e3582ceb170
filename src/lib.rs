//! Resilient WebSocket chat client for the restaurant booking assistant.
//!
//! This library maintains a persistent real-time duplex connection to a
//! conversational server, renders inbound events into typed spans and
//! gates outbound user messages.
//!
//! # Architecture
//!
//! The client follows a supervisor model:
//!
//! - **Lifecycle manager**: owns the transport and drives a
//!   reconnect-with-linear-backoff state machine (2 s delay unit, at
//!   most 5 automatic retries, then terminal).
//! - **Outbound gate**: validates user text and refuses it while the
//!   connection is not open — messages are dropped, never queued.
//! - **Inbound router**: dispatches tagged server events (`system`,
//!   `typing`, `response`, `error`) to UI signals.
//! - **Rendering pipeline**: a fixed-order, single-pass transform from
//!   raw message text to typed spans (bold, italic, code, line breaks,
//!   bullets, booking references, dates, times).
//!
//! The host UI implements [`UiSurface`]; the client never touches a
//! widget tree directly.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use booking_chat_client::{ChatClient, Result, Role, Span, UiSurface, to_plain_text};
//!
//! struct Console;
//!
//! impl UiSurface for Console {
//!     fn append_message(&self, fragment: &[Span], role: Role) {
//!         println!("{role:?}: {}", to_plain_text(fragment));
//!     }
//!     fn set_typing_visible(&self, _visible: bool) {}
//!     fn set_input_enabled(&self, _enabled: bool) {}
//!     fn scroll_to_latest(&self) {}
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = ChatClient::builder()
//!         .endpoint("ws://localhost:8000")
//!         .surface(Arc::new(Console))
//!         .build()?;
//!
//!     client.start()?;
//!     client.send("Book a table for two at 19:00");
//!
//!     client.stop();
//!     client.await_terminated().await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`ChatClient`] coordinator, lifecycle and routing |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire frame types |
//! | [`render`] | Text-to-span rendering pipeline |
//! | [`surface`] | UI signal surface contract |
//! | [`transport`] | WebSocket transport layer |

// ============================================================================
// Modules
// ============================================================================

/// Chat client coordinator, lifecycle and routing.
///
/// Use [`ChatClient::builder()`] to create a configured client instance.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing opaque IDs with ordinary text.
pub mod identifiers;

/// Wire frame types.
///
/// Defines the JSON frames exchanged with the server.
pub mod protocol;

/// Message rendering pipeline.
///
/// Ordered, single-pass transform from raw text to typed spans.
pub mod render;

/// UI signal surface contract.
///
/// The host page implements [`UiSurface`]; the client drives it.
pub mod surface;

/// WebSocket transport layer.
///
/// The [`transport::Connector`] seam separates the client from
/// tokio-tungstenite so tests can script connections.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ChatClient, ChatClientBuilder, ConnectionState};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::SessionId;

// Protocol types
pub use protocol::{ClientFrame, ParsedEvent, ServerEvent};

// Rendering types
pub use render::{Fragment, Span, render, to_plain_text};

// Surface types
pub use surface::{Role, UiSurface};

// Transport types
pub use transport::{Connector, TransportSink, TransportStream, WsConnector};
