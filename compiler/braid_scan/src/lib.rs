//! Braid Scan - control-zone scanner for braid templates.
//!
//! This crate finds control zones (`{{ ... }}` by default) in template text,
//! records escape sequences, splits zone contents into tokens and rebuilds
//! literal text from escape records. It knows nothing about macros or values.
//!
//! # Architecture
//!
//! ```text
//! &str ──► scan() ──► ScanState { zone, escapes }
//!                          │
//!                          ▼
//!            tokenize(inner) ──► ["macro", "param", "nested zone body", ...]
//!                          │
//!                          ▼
//!            unescape(text, escapes) ──► literal output
//! ```
//!
//! All positions are byte offsets into the text handed to [`scan`]. Nothing
//! is copied while scanning: the [`Cursor`] walks an immutable buffer and
//! tokens are borrowed slices of it.
//!
//! The delimiter and escape grammar is data ([`Syntax`]), so the double-brace
//! grammar and the single-trigger grammar share one state machine.

mod cursor;
mod errors;
mod scanner;
mod source_buffer;
mod syntax;
mod tokenizer;
mod unescape;

pub use cursor::Cursor;
pub use errors::ScanError;
pub use scanner::{scan, scan_from, ControlZone, EscapeRecord, ScanState};
pub use source_buffer::SourceBuffer;
pub use syntax::{EscapeKind, EscapeRule, EscapeSite, Syntax};
pub use tokenizer::{is_zone_whitespace, tokenize, Tokens};
pub use unescape::{unescape, unescape_span};
