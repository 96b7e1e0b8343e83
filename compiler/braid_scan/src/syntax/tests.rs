use super::*;
use pretty_assertions::assert_eq;

#[test]
fn double_brace_delimiters() {
    let syntax = Syntax::double_brace();
    assert_eq!(syntax.open(), "{{");
    assert_eq!(syntax.close(), "}}");
    assert_eq!(syntax.nest(), "{{");
    assert_eq!(syntax.unescaped("{{["), Some("{{"));
    assert_eq!(syntax.unescaped("]}}"), Some("}}"));
}

#[test]
fn default_is_double_brace() {
    assert_eq!(Syntax::default(), Syntax::double_brace());
}

#[test]
fn trigger_delimiters() {
    let syntax = Syntax::trigger("#").unwrap();
    assert_eq!(syntax.open(), "#{");
    assert_eq!(syntax.close(), "}");
    assert_eq!(syntax.nest(), "{");
    assert_eq!(syntax.unescaped("#{{"), Some("#{"));
    assert_eq!(syntax.unescaped("{{"), Some("{"));
    assert_eq!(syntax.unescaped("}}"), Some("}"));
}

#[test]
fn multi_character_trigger() {
    let syntax = Syntax::trigger("@@").unwrap();
    assert_eq!(syntax.open(), "@@{");
    assert_eq!(syntax.unescaped("@@{{"), Some("@@{"));
}

#[test]
fn empty_trigger_is_rejected() {
    assert!(matches!(
        Syntax::trigger(""),
        Err(ScanError::InvalidSyntax { .. })
    ));
}

#[test]
fn empty_delimiters_are_rejected() {
    assert!(Syntax::new("", "}}", "{{").is_err());
    assert!(Syntax::new("{{", "", "{{").is_err());
    assert!(Syntax::new("{{", "}}", "").is_err());
}

#[test]
fn longest_escape_is_matched_first() {
    let syntax = Syntax::trigger("#").unwrap();
    // `#{{` (top level) must not be confused with the in-zone `{{`.
    let rule = syntax.match_escape("#{{x", false).unwrap();
    assert_eq!(rule.pattern, "#{{");
    assert!(syntax.match_escape("#{{x", true).is_none());
    assert_eq!(syntax.match_escape("{{x", true).unwrap().replacement, "{");
}

#[test]
fn escape_sites_are_respected() {
    let syntax = Syntax::trigger("#").unwrap();
    assert!(syntax.match_escape("}}", false).is_none());
    assert_eq!(
        syntax.match_escape("}}", true).unwrap().kind,
        EscapeKind::Close
    );
}

#[test]
fn lead_bytes_are_distinct() {
    let syntax = Syntax::double_brace();
    let mut lead = syntax.lead_bytes().to_vec();
    lead.sort_unstable();
    assert_eq!(lead, vec![b']', b'{', b'}']);
}
