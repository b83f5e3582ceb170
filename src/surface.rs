//! UI signal surface contract.
//!
//! The chat client never touches a DOM or widget tree directly. The host
//! page implements [`UiSurface`] and the client drives it through four
//! signals: append a rendered message, toggle the typing indicator,
//! toggle input availability, and keep the latest message in view.

// ============================================================================
// Imports
// ============================================================================

use crate::render::Span;

// ============================================================================
// Role
// ============================================================================

/// Who a rendered message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The local user (echo of their own message).
    User,
    /// The booking assistant.
    Assistant,
    /// An error notice, locally generated or server-reported.
    Error,
}

// ============================================================================
// UiSurface
// ============================================================================

/// Signals consumed by the host UI.
///
/// Implementations must be cheap and non-blocking: every method is
/// called from the client's event loop.
pub trait UiSurface: Send + Sync {
    /// Appends a rendered message to the conversation.
    fn append_message(&self, fragment: &[Span], role: Role);

    /// Shows or hides the "assistant is typing" indicator.
    fn set_typing_visible(&self, visible: bool);

    /// Enables or disables the message input.
    fn set_input_enabled(&self, enabled: bool);

    /// Scrolls the conversation to the latest message.
    fn scroll_to_latest(&self);
}

// ============================================================================
// Test Support
// ============================================================================
