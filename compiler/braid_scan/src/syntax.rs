//! Delimiter and escape grammar.
//!
//! A [`Syntax`] is pure data: the opening delimiter, the closing delimiter,
//! the sequence that opens a nested region inside a zone, and an ordered
//! table of escape sequences. The scanner consults it at every interesting
//! byte, so both supported grammars run through the same state machine:
//!
//! | Grammar | Zone | Nested | Escapes |
//! |---|---|---|---|
//! | [`Syntax::double_brace`] | `{{ ... }}` | `{{` | `{{[` → `{{`, `]}}` → `}}` |
//! | [`Syntax::trigger`]`("#")` | `#{ ... }` | `{` | `#{{` → `#{` (top level), `{{` → `{`, `}}` → `}` (in zones) |

use smallvec::SmallVec;

use crate::ScanError;

/// Which delimiter an escape sequence stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EscapeKind {
    /// Escaped opening delimiter.
    Open,
    /// Escaped closing delimiter.
    Close,
}

/// Where an escape sequence is recognized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EscapeSite {
    /// Only in literal text outside zones.
    TopLevel,
    /// Only inside a control zone.
    InZone,
    /// Both outside and inside zones.
    Anywhere,
}

impl EscapeSite {
    #[inline]
    fn matches(self, in_zone: bool) -> bool {
        match self {
            EscapeSite::TopLevel => !in_zone,
            EscapeSite::InZone => in_zone,
            EscapeSite::Anywhere => true,
        }
    }
}

/// One escape sequence: `pattern` in the source stands for `replacement`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EscapeRule {
    pub pattern: String,
    pub replacement: String,
    pub kind: EscapeKind,
    pub site: EscapeSite,
}

impl EscapeRule {
    pub fn new(
        pattern: impl Into<String>,
        replacement: impl Into<String>,
        kind: EscapeKind,
        site: EscapeSite,
    ) -> Self {
        EscapeRule {
            pattern: pattern.into(),
            replacement: replacement.into(),
            kind,
            site,
        }
    }
}

/// Delimiter grammar for control zones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Syntax {
    open: String,
    close: String,
    nest: String,
    /// Sorted longest pattern first so that `{{[` wins over `{{`.
    escapes: Vec<EscapeRule>,
    /// Distinct first bytes of every pattern above. The cursor jumps
    /// between occurrences of these bytes.
    lead_bytes: SmallVec<[u8; 4]>,
}

impl Syntax {
    /// Create a grammar without escape sequences.
    ///
    /// `open` starts a zone in literal text, `close` ends it, `nest` opens a
    /// balanced region inside a zone (often equal to `open`).
    pub fn new(
        open: impl Into<String>,
        close: impl Into<String>,
        nest: impl Into<String>,
    ) -> Result<Self, ScanError> {
        let open = open.into();
        let close = close.into();
        let nest = nest.into();
        for (what, value) in [("opening", &open), ("closing", &close), ("nesting", &nest)] {
            if value.is_empty() {
                return Err(ScanError::InvalidSyntax {
                    reason: format!("{what} delimiter must not be empty"),
                });
            }
        }
        if open.starts_with(close.as_str()) || close.starts_with(nest.as_str()) {
            return Err(ScanError::InvalidSyntax {
                reason: format!("delimiters {open:?} / {close:?} / {nest:?} overlap"),
            });
        }
        let mut syntax = Syntax {
            open,
            close,
            nest,
            escapes: Vec::new(),
            lead_bytes: SmallVec::new(),
        };
        syntax.refresh_lead_bytes();
        Ok(syntax)
    }

    /// Add an escape sequence.
    pub fn with_escape(mut self, rule: EscapeRule) -> Result<Self, ScanError> {
        if rule.pattern.is_empty() {
            return Err(ScanError::InvalidSyntax {
                reason: "escape pattern must not be empty".to_owned(),
            });
        }
        self.escapes.push(rule);
        self.escapes
            .sort_by(|a, b| b.pattern.len().cmp(&a.pattern.len()));
        self.refresh_lead_bytes();
        Ok(self)
    }

    /// The default grammar: `{{ ... }}` zones, `{{[` and `]}}` escapes.
    pub fn double_brace() -> Self {
        let escapes = vec![
            EscapeRule::new("{{[", "{{", EscapeKind::Open, EscapeSite::Anywhere),
            EscapeRule::new("]}}", "}}", EscapeKind::Close, EscapeSite::Anywhere),
        ];
        let mut syntax = Syntax {
            open: "{{".to_owned(),
            close: "}}".to_owned(),
            nest: "{{".to_owned(),
            escapes,
            lead_bytes: SmallVec::new(),
        };
        syntax.refresh_lead_bytes();
        syntax
    }

    /// The trigger grammar: `<trigger>{ ... }` zones with single braces.
    ///
    /// `<trigger>{{` escapes to `<trigger>{` in literal text; inside zones
    /// `{{` and `}}` escape to single braces.
    pub fn trigger(trigger: &str) -> Result<Self, ScanError> {
        if trigger.is_empty() {
            return Err(ScanError::InvalidSyntax {
                reason: "trigger must not be empty".to_owned(),
            });
        }
        Syntax::new(format!("{trigger}{{"), "}", "{")?
            .with_escape(EscapeRule::new(
                format!("{trigger}{{{{"),
                format!("{trigger}{{"),
                EscapeKind::Open,
                EscapeSite::TopLevel,
            ))?
            .with_escape(EscapeRule::new("{{", "{", EscapeKind::Open, EscapeSite::InZone))?
            .with_escape(EscapeRule::new("}}", "}", EscapeKind::Close, EscapeSite::InZone))
    }

    pub fn open(&self) -> &str {
        &self.open
    }

    pub fn close(&self) -> &str {
        &self.close
    }

    pub fn nest(&self) -> &str {
        &self.nest
    }

    pub fn escapes(&self) -> &[EscapeRule] {
        &self.escapes
    }

    pub(crate) fn lead_bytes(&self) -> &[u8] {
        &self.lead_bytes
    }

    /// Find the escape rule whose pattern starts `rest`.
    pub(crate) fn match_escape(&self, rest: &str, in_zone: bool) -> Option<&EscapeRule> {
        self.escapes
            .iter()
            .find(|rule| rule.site.matches(in_zone) && rest.starts_with(rule.pattern.as_str()))
    }

    /// The literal text an escape `pattern` stands for.
    pub fn unescaped(&self, pattern: &str) -> Option<&str> {
        self.escapes
            .iter()
            .find(|rule| rule.pattern == pattern)
            .map(|rule| rule.replacement.as_str())
    }

    fn refresh_lead_bytes(&mut self) {
        let mut lead: SmallVec<[u8; 4]> = SmallVec::new();
        let patterns = [&self.open, &self.close, &self.nest]
            .into_iter()
            .chain(self.escapes.iter().map(|rule| &rule.pattern));
        for pattern in patterns {
            if let Some(&first) = pattern.as_bytes().first() {
                if !lead.contains(&first) {
                    lead.push(first);
                }
            }
        }
        self.lead_bytes = lead;
    }
}

impl Default for Syntax {
    fn default() -> Self {
        Self::double_brace()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
