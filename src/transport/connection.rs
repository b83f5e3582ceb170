//! Transport traits and the tungstenite implementation.
//!
//! A connected transport is a pair of halves: a [`TransportSink`] that
//! serializes and writes outbound frames, and a [`TransportStream`] that
//! yields inbound text frames until the connection ends. Splitting the
//! two lets the supervisor select over inbound frames and caller
//! commands without borrow conflicts.
//!
//! See ARCHITECTURE.md Section 3.3 for the event loop that drives these.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Result;
use crate::protocol::ClientFrame;

// ============================================================================
// Types
// ============================================================================

/// The tungstenite socket type behind the production transport.
type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Traits
// ============================================================================

/// Write half of a connected transport.
#[async_trait]
pub trait TransportSink: Send {
    /// Serializes and sends one outbound frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`](crate::Error::Json) if serialization fails
    /// - [`Error::WebSocket`](crate::Error::WebSocket) if the write fails
    async fn send(&mut self, frame: &ClientFrame) -> Result<()>;

    /// Closes the transport gracefully. Errors are ignored; the
    /// connection is going away either way.
    async fn close(&mut self);
}

/// Read half of a connected transport.
#[async_trait]
pub trait TransportStream: Send {
    /// Yields the next inbound text frame.
    ///
    /// Returns `None` once the connection has ended, whether by a clean
    /// close or a transport error; the lifecycle manager treats both
    /// identically. Non-text frames (binary, ping, pong) are skipped.
    async fn next(&mut self) -> Option<String>;
}

/// Opens transports to a WebSocket endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establishes a connection and returns its two halves.
    ///
    /// # Errors
    ///
    /// Returns a connection-category error when the endpoint is
    /// unreachable or the handshake fails.
    async fn connect(&self, url: &Url) -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>)>;
}

// ============================================================================
// WsConnector
// ============================================================================

/// Production connector over tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>)> {
        let (socket, response) = connect_async(url.as_str()).await?;
        debug!(status = %response.status(), "WebSocket handshake completed");

        let (write, read) = socket.split();
        Ok((Box::new(WsSink { write }), Box::new(WsStream { read })))
    }
}

// ============================================================================
// WsSink
// ============================================================================

/// Write half over a tungstenite socket.
struct WsSink {
    write: SplitSink<Socket, Message>,
}

#[async_trait]
impl TransportSink for WsSink {
    async fn send(&mut self, frame: &ClientFrame) -> Result<()> {
        let json = serde_json::to_string(frame)?;
        self.write.send(Message::Text(json.into())).await?;

        trace!("frame sent");
        Ok(())
    }

    async fn close(&mut self) {
        if let Err(e) = self.write.close().await {
            debug!(error = %e, "error closing transport");
        }
    }
}

// ============================================================================
// WsStream
// ============================================================================

/// Read half over a tungstenite socket.
struct WsStream {
    read: SplitStream<Socket>,
}

#[async_trait]
impl TransportStream for WsStream {
    async fn next(&mut self) -> Option<String> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => return Some(text.to_string()),

                Some(Ok(Message::Close(_))) => {
                    debug!("WebSocket closed by remote");
                    return None;
                }

                Some(Err(e)) => {
                    warn!(error = %e, "WebSocket error");
                    return None;
                }

                None => {
                    debug!("WebSocket stream ended");
                    return None;
                }

                // Ignore Binary, Ping, Pong, Frame
                _ => {}
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
