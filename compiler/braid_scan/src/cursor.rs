//! Index cursor over an immutable template buffer.
//!
//! The cursor never copies: it holds the text and a byte position, and the
//! scanner reads delimiters through [`Cursor::starts_with`]. Between
//! delimiters it jumps with `memchr` to the next byte that can start a
//! pattern, so literal runs cost one SIMD search instead of a byte loop.
//!
//! Every read is bounds-checked: a delimiter that would extend past the end
//! of the text simply does not match.

/// Returns the earliest (minimum) of two optional positions.
///
/// Used to combine results from separate memchr calls when we need to
/// search for more bytes than `memchr3` supports.
fn earliest_of(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

/// Find the first occurrence of any byte in `needles` within `haystack`.
fn find_any(needles: &[u8], haystack: &[u8]) -> Option<usize> {
    match *needles {
        [] => None,
        [a] => memchr::memchr(a, haystack),
        [a, b] => memchr::memchr2(a, b, haystack),
        [a, b, c] => memchr::memchr3(a, b, c, haystack),
        [a, b, c, ref rest @ ..] => {
            earliest_of(memchr::memchr3(a, b, c, haystack), find_any(rest, haystack))
        }
    }
}

/// Cursor over template text. [`Copy`], so snapshots are free.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at byte `pos` of `src`.
    ///
    /// `pos` is clamped to the text length.
    pub fn new(src: &'a str, pos: usize) -> Self {
        Cursor {
            src,
            pos: pos.min(src.len()),
        }
    }

    /// Current byte offset.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns `true` once every byte has been consumed.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// The unread remainder of the text.
    ///
    /// Positions handed out by the scanner always sit on pattern starts,
    /// which are character boundaries; anywhere else this falls back to
    /// an empty remainder rather than panicking.
    #[inline]
    pub fn rest(&self) -> &'a str {
        self.src.get(self.pos..).unwrap_or("")
    }

    /// Returns the byte at the current position, if any.
    #[inline]
    pub fn current(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    /// Returns `true` if the unread text starts with `pattern`.
    #[inline]
    pub fn starts_with(&self, pattern: &str) -> bool {
        self.src
            .as_bytes()
            .get(self.pos..)
            .is_some_and(|rest| rest.starts_with(pattern.as_bytes()))
    }

    /// Advance by one byte.
    #[inline]
    pub fn advance(&mut self) {
        self.advance_n(1);
    }

    /// Advance by `n` bytes, stopping at end of text.
    #[inline]
    pub fn advance_n(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.src.len());
    }

    /// Jump to the next byte contained in `needles`.
    ///
    /// Returns `false` (and moves to end of text) if there is none.
    pub fn skip_to_any(&mut self, needles: &[u8]) -> bool {
        let remaining = self.src.as_bytes().get(self.pos..).unwrap_or(&[]);
        if let Some(offset) = find_any(needles, remaining) {
            self.pos += offset;
            true
        } else {
            self.pos = self.src.len();
            false
        }
    }

    /// Extract `start..end` of the underlying text.
    ///
    /// Returns an empty slice for ranges that are out of bounds or not on
    /// character boundaries.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        self.src.get(start..end).unwrap_or("")
    }
}
