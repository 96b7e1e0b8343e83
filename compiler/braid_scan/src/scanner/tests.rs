use super::*;
use pretty_assertions::assert_eq;

fn brace() -> Syntax {
    Syntax::double_brace()
}

fn hash() -> Syntax {
    Syntax::trigger("#").unwrap()
}

// === Plain Text ===

#[test]
fn text_without_zones() {
    let state = scan("just some text", &brace()).unwrap();
    assert_eq!(state, ScanState::default());
}

#[test]
fn empty_text() {
    let state = scan("", &brace()).unwrap();
    assert!(state.zone.is_none());
    assert!(state.escapes.is_empty());
}

#[test]
fn single_braces_are_literal() {
    let state = scan("fn main() { }", &brace()).unwrap();
    assert!(state.zone.is_none());
}

// === Zones ===

#[test]
fn finds_first_zone() {
    let text = "Hello {{= name}}!";
    let zone = scan(text, &brace()).unwrap().zone.unwrap();
    assert_eq!(zone.start, 6);
    assert_eq!(zone.end, 16);
    assert_eq!(&text[zone.span()], "{{= name}}");
    assert_eq!(&text[zone.inner(&brace())], "= name");
}

#[test]
fn stops_at_first_zone() {
    let text = "{{a}} and {{b}}";
    let zone = scan(text, &brace()).unwrap().zone.unwrap();
    assert_eq!(zone.end, 5);
}

#[test]
fn scan_from_finds_later_zone() {
    let text = "{{a}} and {{b}}";
    let zone = scan_from(text, 5, &brace()).unwrap().zone.unwrap();
    assert_eq!(&text[zone.span()], "{{b}}");
}

#[test]
fn nested_zone_is_part_of_outer_zone() {
    let text = "{{for x in xs {{- {{= x}}}} }} tail";
    let zone = scan(text, &brace()).unwrap().zone.unwrap();
    assert_eq!(&text[zone.span()], "{{for x in xs {{- {{= x}}}} }}");
    // The nested zone ends strictly before the outer zone.
    let nested_end = text.find("}}}}").unwrap() + 4;
    assert!(zone.end > nested_end);
}

#[test]
fn quadruple_brace_nests_twice() {
    let text = "{{for w in s {{{{= w}} }} }}";
    let zone = scan(text, &brace()).unwrap().zone.unwrap();
    assert_eq!(zone.end, text.len());
}

#[test]
fn unterminated_zone_is_an_error() {
    let err = scan("text {{= name", &brace()).unwrap_err();
    assert_eq!(err, ScanError::UnterminatedZone { offset: 5 });
}

#[test]
fn unbalanced_nesting_is_unterminated() {
    let err = scan("{{if a then {{b}}", &brace()).unwrap_err();
    assert_eq!(err, ScanError::UnterminatedZone { offset: 0 });
}

#[test]
fn delimiter_at_end_of_text_does_not_match() {
    let state = scan("trailing {", &brace()).unwrap();
    assert!(state.zone.is_none());
}

// === Escapes ===

#[test]
fn top_level_escapes_are_recorded() {
    let text = "There is {{[ much ]]}} here";
    let state = scan(text, &brace()).unwrap();
    assert!(state.zone.is_none());
    assert_eq!(
        state.escapes,
        vec![
            EscapeRecord {
                from: 9,
                to: 12,
                kind: EscapeKind::Open
            },
            EscapeRecord {
                from: 19,
                to: 22,
                kind: EscapeKind::Close
            },
        ]
    );
}

#[test]
fn escaped_opener_does_not_start_zone() {
    let state = scan("{{[not a zone", &brace()).unwrap();
    assert!(state.zone.is_none());
    assert_eq!(state.escapes.len(), 1);
}

#[test]
fn escapes_inside_zone_belong_to_zone() {
    let text = "a ]}} {{= x {{[ y ]}}}} b";
    let state = scan(text, &brace()).unwrap();
    assert_eq!(state.escapes.len(), 1);
    let zone = state.zone.unwrap();
    assert_eq!(zone.inner_escapes.len(), 2);
    assert_eq!(zone.inner_escapes[0].kind, EscapeKind::Open);
    assert_eq!(zone.inner_escapes[1].kind, EscapeKind::Close);
    assert_eq!(zone.end, text.len() - 2);
}

#[test]
fn escape_lengths_match_patterns() {
    let state = scan("{{[ ]}}", &brace()).unwrap();
    assert!(state.escapes.iter().all(|e| e.len() == 3));
}

// === Trigger Syntax ===

#[test]
fn trigger_zone() {
    let text = "Hi #{= name}!";
    let zone = scan(text, &hash()).unwrap().zone.unwrap();
    assert_eq!(&text[zone.span()], "#{= name}");
    assert_eq!(&text[zone.inner(&hash())], "= name");
}

#[test]
fn trigger_zone_with_nested_braces() {
    let text = "#{# {dummy braces} } after";
    let zone = scan(text, &hash()).unwrap().zone.unwrap();
    assert_eq!(&text[zone.span()], "#{# {dummy braces} }");
}

#[test]
fn trigger_escape_at_top_level() {
    let state = scan("literal #{{ here", &hash()).unwrap();
    assert!(state.zone.is_none());
    assert_eq!(
        state.escapes,
        vec![EscapeRecord {
            from: 8,
            to: 11,
            kind: EscapeKind::Open
        }]
    );
}

#[test]
fn trigger_double_braces_escape_in_zone() {
    let text = "#{= a {{ b }} }";
    let zone = scan(text, &hash()).unwrap().zone.unwrap();
    assert_eq!(zone.end, text.len());
    assert_eq!(zone.inner_escapes.len(), 2);
}

#[test]
fn trigger_closing_braces_are_literal_at_top_level() {
    let state = scan("a }} b", &hash()).unwrap();
    assert!(state.escapes.is_empty());
}

#[test]
fn multibyte_trigger() {
    let syntax = Syntax::trigger("§").unwrap();
    let text = "é §{= x} ü";
    let zone = scan(text, &syntax).unwrap().zone.unwrap();
    assert_eq!(&text[zone.span()], "§{= x}");
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn text_without_delimiter_bytes_has_no_zone(text in "[a-z \\n\\t.,!?0-9]{0,64}") {
            let state = scan(&text, &Syntax::double_brace()).unwrap();
            prop_assert!(state.zone.is_none());
            prop_assert!(state.escapes.is_empty());
        }

        #[test]
        fn wrapped_body_is_one_zone(prefix in "[a-z ]{0,16}", body in "[a-z =]{0,16}", suffix in "[a-z ]{0,16}") {
            let text = format!("{prefix}{{{{{body}}}}}{suffix}");
            let zone = scan(&text, &Syntax::double_brace()).unwrap().zone.unwrap();
            prop_assert_eq!(zone.start, prefix.len());
            prop_assert_eq!(&text[zone.span()], format!("{{{{{body}}}}}"));
        }

        #[test]
        fn nesting_depth_returns_to_zero(depth in 1usize..8) {
            let text = format!("{}{}", "{{x ".repeat(depth), "}}".repeat(depth));
            let zone = scan(&text, &Syntax::double_brace()).unwrap().zone.unwrap();
            prop_assert_eq!(zone.end, text.len());
        }
    }
}
