//! Escape reconstruction.
//!
//! Literal spans are copied verbatim and every recorded escape is replaced by
//! the delimiter text it stands for. Only the recorded positions change, so
//! nothing the scanner treated as literal can turn back into a zone boundary
//! during scanning of the same text.

use std::borrow::Cow;
use std::ops::Range;

use crate::{EscapeRecord, Syntax};

/// Rebuild `text` with every escape in `escapes` resolved.
///
/// Borrows `text` unchanged when `escapes` is empty.
pub fn unescape<'a>(text: &'a str, escapes: &[EscapeRecord], syntax: &Syntax) -> Cow<'a, str> {
    unescape_span(text, 0..text.len(), escapes, syntax)
}

/// Rebuild `text[span]`, resolving the escapes that fall inside `span`.
///
/// `escapes` hold absolute offsets into `text` in left-to-right order;
/// records outside `span` are ignored.
pub fn unescape_span<'a>(
    text: &'a str,
    span: Range<usize>,
    escapes: &[EscapeRecord],
    syntax: &Syntax,
) -> Cow<'a, str> {
    let slice = text.get(span.clone()).unwrap_or("");
    let mut inside = escapes
        .iter()
        .skip_while(|e| e.from < span.start)
        .take_while(|e| e.to <= span.end)
        .peekable();
    if inside.peek().is_none() {
        return Cow::Borrowed(slice);
    }

    let mut out = String::with_capacity(slice.len());
    let mut cursor = span.start;
    for escape in inside {
        let pattern = &text[escape.from..escape.to];
        out.push_str(&text[cursor..escape.from]);
        out.push_str(syntax.unescaped(pattern).unwrap_or(pattern));
        cursor = escape.to;
    }
    out.push_str(&text[cursor..span.end]);
    Cow::Owned(out)
}
