//! WebSocket transport layer.
//!
//! This module handles communication between the chat client and the
//! booking assistant server via a session-scoped WebSocket.
//!
//! See ARCHITECTURE.md Section 3 for the transport specification.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  ChatClient     │                              │  Server         │
//! │                 │         WebSocket            │  (booking       │
//! │  Connector      │─────────────────────────────►│   assistant)    │
//! │  → Sink/Stream  │   ws://host/ws/{session}     │                 │
//! │                 │◄─────────────────────────────│                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! The [`Connector`] seam exists so the client's supervisor can be
//! driven by a scripted in-memory transport in tests; production code
//! uses [`WsConnector`] over tokio-tungstenite.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Transport traits and the tungstenite implementation |

// ============================================================================
// Submodules
// ============================================================================

/// Transport traits and the tungstenite implementation.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connector, TransportSink, TransportStream, WsConnector};
