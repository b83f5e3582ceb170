//! Individual pipeline stages.
//!
//! Each stage is a pure function `Vec<Span> -> Vec<Span>` that inspects
//! only [`Span::Text`] runs and leaves every other span untouched. That
//! is the non-reentrancy guarantee: once a run has been committed to a
//! structural or highlight span, no later stage can re-match inside it.
//!
//! Stage ordering is owned by the pipeline table in the parent module.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::span::Span;

// ============================================================================
// Patterns
// ============================================================================

/// Bold delimiters: `**x**`.
static STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("strong pattern"));

/// Italic delimiters: `*x*`. Runs after the strong stage so leftover
/// single asterisks cannot eat bold markers.
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("emphasis pattern"));

/// Inline code delimiters: `` `x` ``.
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("code pattern"));

/// Booking reference: exactly three uppercase letters then four digits,
/// word-bounded (e.g. `ABC1234`).
static BOOKING_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{3}[0-9]{4}\b").expect("booking ref pattern"));

/// ISO calendar date, word-bounded.
static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{4}-[0-9]{2}-[0-9]{2}\b").expect("date pattern"));

/// Clock time with optional seconds, word-bounded.
static TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{2}:[0-9]{2}(?::[0-9]{2})?\b").expect("time pattern"));

/// Bullet glyph as emitted by the server, including its trailing space.
const BULLET_GLYPH: &str = "• ";

// ============================================================================
// Structural Stages
// ============================================================================

/// `**x**` → [`Span::Strong`].
pub(super) fn strong(spans: Vec<Span>) -> Vec<Span> {
    for_each_text(spans, |text| {
        split_on_pattern(&STRONG, text, |caps| Span::Strong(group(caps, 1)))
    })
}

/// `*x*` → [`Span::Emphasis`].
pub(super) fn emphasis(spans: Vec<Span>) -> Vec<Span> {
    for_each_text(spans, |text| {
        split_on_pattern(&EMPHASIS, text, |caps| Span::Emphasis(group(caps, 1)))
    })
}

/// `` `x` `` → [`Span::Code`].
pub(super) fn code(spans: Vec<Span>) -> Vec<Span> {
    for_each_text(spans, |text| {
        split_on_pattern(&CODE, text, |caps| Span::Code(group(caps, 1)))
    })
}

/// `\n` → [`Span::LineBreak`].
pub(super) fn line_breaks(spans: Vec<Span>) -> Vec<Span> {
    for_each_text(spans, |text| {
        let mut out = Vec::new();
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                out.push(Span::LineBreak);
            }
            if !part.is_empty() {
                out.push(Span::text(part));
            }
        }
        out
    })
}

/// `• ` → [`Span::Bullet`] (glyph normalized to `▪ `).
pub(super) fn bullets(spans: Vec<Span>) -> Vec<Span> {
    for_each_text(spans, |text| {
        let mut out = Vec::new();
        for (i, part) in text.split(BULLET_GLYPH).enumerate() {
            if i > 0 {
                out.push(Span::Bullet);
            }
            if !part.is_empty() {
                out.push(Span::text(part));
            }
        }
        out
    })
}

// ============================================================================
// Highlight Stages
// ============================================================================

/// `ABC1234`-shaped tokens → [`Span::BookingRef`].
pub(super) fn booking_refs(spans: Vec<Span>) -> Vec<Span> {
    for_each_text(spans, |text| {
        split_on_pattern(&BOOKING_REF, text, |caps| Span::BookingRef(group(caps, 0)))
    })
}

/// `YYYY-MM-DD` tokens → [`Span::Date`].
pub(super) fn dates(spans: Vec<Span>) -> Vec<Span> {
    for_each_text(spans, |text| {
        split_on_pattern(&DATE, text, |caps| Span::Date(group(caps, 0)))
    })
}

/// `HH:MM[:SS]` tokens → [`Span::Time`].
pub(super) fn times(spans: Vec<Span>) -> Vec<Span> {
    for_each_text(spans, |text| {
        split_on_pattern(&TIME, text, |caps| Span::Time(group(caps, 0)))
    })
}

// ============================================================================
// Helpers
// ============================================================================

/// Applies `split` to every text run, passing other spans through.
fn for_each_text(spans: Vec<Span>, split: impl Fn(&str) -> Vec<Span>) -> Vec<Span> {
    let mut out = Vec::with_capacity(spans.len());
    for span in spans {
        match span {
            Span::Text(text) => out.extend(split(&text)),
            other => out.push(other),
        }
    }
    out
}

/// Splits `text` around every match of `re`, converting each match via
/// `make` and keeping the runs in between as [`Span::Text`].
///
/// Empty text runs are never emitted.
fn split_on_pattern(
    re: &Regex,
    text: &str,
    make: impl Fn(&Captures<'_>) -> Span,
) -> Vec<Span> {
    let mut out = Vec::new();
    let mut cursor = 0;

    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };

        if whole.start() > cursor {
            out.push(Span::text(&text[cursor..whole.start()]));
        }
        out.push(make(&caps));
        cursor = whole.end();
    }

    if cursor < text.len() {
        out.push(Span::text(&text[cursor..]));
    }

    out
}

/// Gets a capture group as an owned string.
#[inline]
fn group(caps: &Captures<'_>, index: usize) -> String {
    caps.get(index)
        .map(|m| m.as_str().to_owned())
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
