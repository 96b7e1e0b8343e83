//! Control-zone scanner.
//!
//! [`scan`] makes a single left-to-right pass with a two-state machine:
//!
//! - **Top level**: escape sequences are recorded in [`ScanState::escapes`];
//!   the opening delimiter records the zone start and enters the zone.
//! - **In zone**: escape sequences go to the zone's own list; a nested
//!   opener increments the depth counter; a closer decrements it, or closes
//!   the zone when the counter is already zero.
//!
//! Scanning stops at the first complete zone. Callers loop by scanning
//! again from [`ControlZone::end`] with [`scan_from`].

use std::ops::Range;

use crate::{Cursor, EscapeKind, ScanError, Syntax};

/// One recognized escape sequence, `from..to` in the scanned text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EscapeRecord {
    pub from: usize,
    pub to: usize,
    pub kind: EscapeKind,
}

impl EscapeRecord {
    /// Byte length of the escape sequence in the source.
    #[inline]
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.to == self.from
    }
}

/// A delimited control zone.
///
/// Invariant: `start < end <= text.len()`, `start` is the first byte of the
/// opening delimiter and `end` is one past the closing delimiter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlZone {
    pub start: usize,
    pub end: usize,
    /// Escapes found between the delimiters, in text order.
    pub inner_escapes: Vec<EscapeRecord>,
}

impl ControlZone {
    /// Byte range of the whole zone, delimiters included.
    #[inline]
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Byte range between the opening and closing delimiters.
    #[inline]
    pub fn inner(&self, syntax: &Syntax) -> Range<usize> {
        self.start + syntax.open().len()..self.end - syntax.close().len()
    }
}

/// Result of one scanner pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanState {
    /// The first zone found, if any.
    pub zone: Option<ControlZone>,
    /// Top-level escapes seen before the zone (or up to end of text).
    pub escapes: Vec<EscapeRecord>,
}

#[derive(Clone, Copy, Debug)]
enum State {
    TopLevel,
    InZone { start: usize, depth: u32 },
}

/// Scan `text` from the beginning. See [`scan_from`].
pub fn scan(text: &str, syntax: &Syntax) -> Result<ScanState, ScanError> {
    scan_from(text, 0, syntax)
}

/// Find the next control zone at or after byte `offset`.
///
/// Returned positions are absolute offsets into `text`. An opening delimiter
/// without a matching close is an [`ScanError::UnterminatedZone`].
pub fn scan_from(text: &str, offset: usize, syntax: &Syntax) -> Result<ScanState, ScanError> {
    let mut cursor = Cursor::new(text, offset);
    let mut state = State::TopLevel;
    let mut escapes = Vec::new();
    let mut inner_escapes = Vec::new();

    while cursor.skip_to_any(syntax.lead_bytes()) {
        let pos = cursor.pos();
        match state {
            State::TopLevel => {
                if let Some(rule) = syntax.match_escape(cursor.rest(), false) {
                    escapes.push(EscapeRecord {
                        from: pos,
                        to: pos + rule.pattern.len(),
                        kind: rule.kind,
                    });
                    cursor.advance_n(rule.pattern.len());
                } else if cursor.starts_with(syntax.open()) {
                    state = State::InZone {
                        start: pos,
                        depth: 0,
                    };
                    cursor.advance_n(syntax.open().len());
                } else {
                    cursor.advance();
                }
            }
            State::InZone { start, depth } => {
                if let Some(rule) = syntax.match_escape(cursor.rest(), true) {
                    inner_escapes.push(EscapeRecord {
                        from: pos,
                        to: pos + rule.pattern.len(),
                        kind: rule.kind,
                    });
                    cursor.advance_n(rule.pattern.len());
                } else if cursor.starts_with(syntax.close()) {
                    if depth == 0 {
                        let zone = ControlZone {
                            start,
                            end: pos + syntax.close().len(),
                            inner_escapes,
                        };
                        return Ok(ScanState {
                            zone: Some(zone),
                            escapes,
                        });
                    }
                    state = State::InZone {
                        start,
                        depth: depth - 1,
                    };
                    cursor.advance_n(syntax.close().len());
                } else if cursor.starts_with(syntax.nest()) {
                    state = State::InZone {
                        start,
                        depth: depth + 1,
                    };
                    cursor.advance_n(syntax.nest().len());
                } else {
                    cursor.advance();
                }
            }
        }
    }

    match state {
        State::TopLevel => Ok(ScanState {
            zone: None,
            escapes,
        }),
        State::InZone { start, .. } => Err(ScanError::UnterminatedZone { offset: start }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
