//! Parameter shapes of the `if` and `for` built-ins.
//!
//! Both execution strategies read the same shapes, so a template that is
//! malformed for one is malformed for the other.

use smallvec::SmallVec;

use crate::errors::{malformed_macro, TemplateError};

/// `cond then body [else if cond then body]... [else body]`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IfChain<'a> {
    /// `(condition, body)` pairs in order.
    pub arms: SmallVec<[(&'a str, &'a str); 2]>,
    pub otherwise: Option<&'a str>,
}

pub fn parse_if<'a>(params: &[&'a str]) -> Result<IfChain<'a>, TemplateError> {
    let mut arms = SmallVec::new();
    let mut rest = params;
    loop {
        let [condition, then, body, tail @ ..] = rest else {
            return Err(malformed_macro("if", "expected `<condition> then <body>`"));
        };
        if *then != "then" {
            return Err(malformed_macro(
                "if",
                format!("expected `then` after {condition:?}, found {then:?}"),
            ));
        }
        arms.push((*condition, *body));
        match tail {
            [] => {
                return Ok(IfChain {
                    arms,
                    otherwise: None,
                })
            }
            ["else", "if", more @ ..] => rest = more,
            ["else", body] => {
                return Ok(IfChain {
                    arms,
                    otherwise: Some(*body),
                })
            }
            [other, ..] => {
                return Err(malformed_macro(
                    "if",
                    format!("unexpected {other:?} after body"),
                ))
            }
        }
    }
}

/// `[key,] value in iterable body`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForLoop<'a> {
    pub key: Option<&'a str>,
    pub value: &'a str,
    pub iterable: &'a str,
    pub body: &'a str,
}

pub fn parse_for<'a>(params: &[&'a str]) -> Result<ForLoop<'a>, TemplateError> {
    let (key, rest) = match params {
        [first, rest @ ..] if first.len() > 1 && first.ends_with(',') => {
            let first: &'a str = first;
            (first.strip_suffix(','), rest)
        }
        _ => (None, params),
    };
    let [value, keyword, iterable, body] = rest else {
        return Err(malformed_macro(
            "for",
            "expected `[key,] value in <iterable> <body>`",
        ));
    };
    if *keyword != "in" {
        return Err(malformed_macro(
            "for",
            format!("expected `in` after {value:?}, found {keyword:?}"),
        ));
    }
    Ok(ForLoop {
        key,
        value: *value,
        iterable: *iterable,
        body: *body,
    })
}
