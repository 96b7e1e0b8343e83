//! Expression tokens.

use braid_scan::Cursor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Punct {
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Question,
    Colon,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    AndAnd,
    OrOr,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Punct(Punct),
    Eof,
}

/// Longest match first.
const PUNCTS: &[(&str, Punct)] = &[
    ("===", Punct::EqEqEq),
    ("!==", Punct::NotEqEq),
    ("==", Punct::EqEq),
    ("!=", Punct::NotEq),
    ("<=", Punct::Le),
    (">=", Punct::Ge),
    ("&&", Punct::AndAnd),
    ("||", Punct::OrOr),
    (".", Punct::Dot),
    (",", Punct::Comma),
    ("(", Punct::LParen),
    (")", Punct::RParen),
    ("[", Punct::LBracket),
    ("]", Punct::RBracket),
    ("?", Punct::Question),
    (":", Punct::Colon),
    ("!", Punct::Bang),
    ("+", Punct::Plus),
    ("-", Punct::Minus),
    ("*", Punct::Star),
    ("/", Punct::Slash),
    ("%", Punct::Percent),
    ("<", Punct::Lt),
    (">", Punct::Gt),
];

pub(crate) fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

pub(crate) fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Split `src` into tokens, ending with [`Token::Eof`].
pub(crate) fn lex(src: &str) -> Result<Vec<Token>, String> {
    let mut cursor = Cursor::new(src, 0);
    let mut tokens = Vec::new();
    loop {
        while cursor.current().is_some_and(|b| b.is_ascii_whitespace()) {
            cursor.advance();
        }
        let Some(byte) = cursor.current() else {
            tokens.push(Token::Eof);
            return Ok(tokens);
        };
        let token = if byte.is_ascii_digit() {
            lex_number(&mut cursor)?
        } else if is_ident_start(byte) {
            let start = cursor.pos();
            while cursor.current().is_some_and(is_ident_continue) {
                cursor.advance();
            }
            Token::Ident(cursor.slice(start, cursor.pos()).to_owned())
        } else if byte == b'"' || byte == b'\'' {
            lex_string(&mut cursor, byte)?
        } else if let Some(&(text, punct)) = PUNCTS.iter().find(|(p, _)| cursor.starts_with(p)) {
            cursor.advance_n(text.len());
            Token::Punct(punct)
        } else {
            let ch = cursor.rest().chars().next().unwrap_or('?');
            return Err(format!("unexpected character {ch:?} at {}", cursor.pos()));
        };
        tokens.push(token);
    }
}

fn lex_number(cursor: &mut Cursor<'_>) -> Result<Token, String> {
    let start = cursor.pos();
    let digits = |c: &mut Cursor<'_>| {
        while c.current().is_some_and(|b| b.is_ascii_digit()) {
            c.advance();
        }
    };
    digits(cursor);
    if cursor.current() == Some(b'.') {
        cursor.advance();
        digits(cursor);
    }
    if matches!(cursor.current(), Some(b'e' | b'E')) {
        cursor.advance();
        if matches!(cursor.current(), Some(b'+' | b'-')) {
            cursor.advance();
        }
        digits(cursor);
    }
    let text = cursor.slice(start, cursor.pos());
    text.parse()
        .map(Token::Number)
        .map_err(|_| format!("invalid number {text:?}"))
}

fn lex_string(cursor: &mut Cursor<'_>, quote: u8) -> Result<Token, String> {
    let open = cursor.pos();
    cursor.advance();
    let mut out = String::new();
    loop {
        let segment = cursor.pos();
        if !cursor.skip_to_any(&[quote, b'\\']) {
            return Err(format!("unterminated string starting at {open}"));
        }
        out.push_str(cursor.slice(segment, cursor.pos()));
        if cursor.current() == Some(quote) {
            cursor.advance();
            return Ok(Token::Str(out));
        }
        // Backslash escape.
        cursor.advance();
        let escaped = cursor.rest().chars().next();
        match escaped {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => return Err(format!("unterminated string starting at {open}")),
        }
        cursor.advance_n(escaped.map_or(0, char::len_utf8));
    }
}
