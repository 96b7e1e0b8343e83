//! Zone tokenizer.
//!
//! Splits the inner text of a control zone into the macro name and its
//! parameters. Words are separated by whitespace runs; a nested zone is a
//! single token holding its raw inner text, so it can be rendered later as a
//! sub-template.
//!
//! ```text
//! for x in items {{- {{= x}}}}
//! └┬┘ │ └┬┘ └─┬─┘ └─────┬─────┘
//!  0  1  2    3         4        (token 4 = "- {{= x}}")
//! ```

use smallvec::SmallVec;

use crate::{scan_from, ScanError, Syntax};

/// Tokens of one zone. Most zones have a handful of words.
pub type Tokens<'a> = SmallVec<[&'a str; 8]>;

/// Whitespace that separates zone tokens: space, `\t`, `\n`, `\r`, `\v`.
#[inline]
pub fn is_zone_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{0B}')
}

/// Split a zone's inner text into tokens.
///
/// The first token is the macro name. Inner text that starts with
/// whitespace is not a macro call: the result is `["", inner]`.
pub fn tokenize<'a>(inner: &'a str, syntax: &Syntax) -> Result<Tokens<'a>, ScanError> {
    let mut tokens = Tokens::new();
    if inner.starts_with(is_zone_whitespace) {
        tokens.push("");
        tokens.push(inner);
        return Ok(tokens);
    }

    let mut cursor = 0;
    while let Some(zone) = scan_from(inner, cursor, syntax)?.zone {
        push_words(&inner[cursor..zone.start], &mut tokens);
        tokens.push(&inner[zone.inner(syntax)]);
        cursor = zone.end;
    }
    push_words(&inner[cursor..], &mut tokens);
    Ok(tokens)
}

fn push_words<'a>(text: &'a str, tokens: &mut Tokens<'a>) {
    tokens.extend(text.split(is_zone_whitespace).filter(|word| !word.is_empty()));
}
