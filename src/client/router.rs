//! Inbound event routing.
//!
//! Dispatches parsed server events to UI signals. Routing never fails:
//! unrecognized events are logged and dropped without touching the
//! surface. See ARCHITECTURE.md Section 5.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, warn};

use crate::protocol::{ParsedEvent, ServerEvent};
use crate::render::render;
use crate::surface::{Role, UiSurface};

// ============================================================================
// Routing
// ============================================================================

/// Routes one inbound event to the UI surface.
pub(crate) fn route(event: &ServerEvent, surface: &dyn UiSurface) {
    match event.parse() {
        // The page collaborator already shows the connection banner.
        ParsedEvent::System { content } => {
            debug!(content = %content, "system event, already surfaced by the page");
        }

        ParsedEvent::Typing => {
            surface.set_typing_visible(true);
        }

        ParsedEvent::Response { content } => {
            surface.set_typing_visible(false);
            let fragment = render(&content);
            surface.append_message(&fragment, Role::Assistant);
            surface.scroll_to_latest();
        }

        ParsedEvent::Error { content } => {
            surface.set_typing_visible(false);
            let fragment = render(&content);
            surface.append_message(&fragment, Role::Error);
            surface.scroll_to_latest();
        }

        ParsedEvent::Unknown { kind } => {
            warn!(kind = %kind, "ignoring event with unrecognized kind");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
