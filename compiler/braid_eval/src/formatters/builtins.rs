//! Built-in formatters.
//!
//! | Name | Effect |
//! |---|---|
//! | `plain` | text form of the value |
//! | `html`, `xml` | escape `&`, `<`, `>` |
//! | `xmlattr` | also escape `'` and `"` |
//! | `uri` | RFC 5987 percent-encoding |
//! | `!uri` | percent-decoding |
//! | `jsonstring` | escape for use inside a JSON string literal |
//! | `json` | JSON text, indented by the first parameter (at most 10) |
//! | `integer` | number rounded to an integer |
//! | `intradix` | number in the radix given by the first parameter |
//! | `float` | fixed-point with the given fraction digits |
//! | `exp` | exponent notation with the given fraction digits |
//!
//! Numeric formatters yield `""` for anything that is not a number. A missing
//! or unparsable digit count means zero digits.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use super::FormatterRegistry;
use crate::value::{number_to_string, Value};

/// JSON indentation is capped at this many spaces.
const MAX_JSON_INDENT: usize = 10;

/// Largest fraction digit count `float` and `exp` accept.
const MAX_FRACTION_DIGITS: usize = 100;

/// Digits after the point when expanding an `f64` exactly.
/// The smallest subnormal needs 1074.
const EXACT_PRECISION: usize = 1100;

pub(super) fn register_all(registry: &mut FormatterRegistry) {
    registry.register("plain", plain);
    registry.register("html", html);
    registry.register("xml", html);
    registry.register("xmlattr", xmlattr);
    registry.register("uri", uri);
    registry.register("!uri", uri_decode);
    registry.register("jsonstring", jsonstring);
    registry.register("json", json);
    registry.register("integer", integer);
    registry.register("intradix", intradix);
    registry.register("float", float);
    registry.register("exp", exp);
}

pub fn plain(value: &Value, _params: &[&str]) -> Result<Value, String> {
    Ok(Value::from(value.to_string()))
}

pub fn html(value: &Value, _params: &[&str]) -> Result<Value, String> {
    Ok(Value::from(escape_markup(&value.to_string(), false)))
}

pub fn xmlattr(value: &Value, _params: &[&str]) -> Result<Value, String> {
    Ok(Value::from(escape_markup(&value.to_string(), true)))
}

fn escape_markup(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' if attribute => out.push_str("&apos;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Percent-encode everything but `A-Z a-z 0-9 - _ . ~ ! | ` ^`.
pub fn uri(value: &Value, _params: &[&str]) -> Result<Value, String> {
    let text = value.to_string();
    let encoded = urlencoding::encode(&text)
        .replace("%21", "!")
        .replace("%7C", "|")
        .replace("%60", "`")
        .replace("%5E", "^");
    Ok(Value::from(encoded))
}

pub fn uri_decode(value: &Value, _params: &[&str]) -> Result<Value, String> {
    let text = value.to_string();
    urlencoding::decode(&text)
        .map(|decoded| Value::from(decoded.into_owned()))
        .map_err(|err| format!("malformed percent-encoding: {err}"))
}

pub fn jsonstring(value: &Value, _params: &[&str]) -> Result<Value, String> {
    let text = value.to_string();
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\u{0C}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            c => out.push(c),
        }
    }
    Ok(Value::from(out))
}

pub fn json(value: &Value, params: &[&str]) -> Result<Value, String> {
    let width = params.first().map_or(0, |p| json_indent(p));
    let mut out = Vec::new();
    if width == 0 {
        serde_json::to_writer(&mut out, value).map_err(|err| err.to_string())?;
    } else {
        let indent = " ".repeat(width);
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
        value
            .serialize(&mut serializer)
            .map_err(|err| err.to_string())?;
    }
    String::from_utf8(out)
        .map(Value::from)
        .map_err(|err| err.to_string())
}

/// Indentation from a numeric parameter; unparsable or non-positive means none.
fn json_indent(param: &str) -> usize {
    let trimmed = param.trim();
    let width: f64 = if trimmed.is_empty() {
        0.0
    } else {
        trimmed.parse().unwrap_or(0.0)
    };
    if width >= 1.0 {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "clamped to a small positive range"
        )]
        let width = width as usize;
        width.min(MAX_JSON_INDENT)
    } else {
        0
    }
}

pub fn integer(value: &Value, _params: &[&str]) -> Result<Value, String> {
    Ok(match value {
        Value::Number(n) => Value::from(to_fixed(*n, 0)),
        _ => Value::from(""),
    })
}

pub fn intradix(value: &Value, params: &[&str]) -> Result<Value, String> {
    let Value::Number(n) = value else {
        return Ok(Value::from(""));
    };
    let radix = match params.first().and_then(|p| parse_int(p)) {
        None => 10,
        Some(r) => u32::try_from(r)
            .ok()
            .filter(|r| (2..=36).contains(r))
            .ok_or_else(|| format!("radix must be between 2 and 36, got {r}"))?,
    };
    Ok(Value::from(to_radix(*n, radix)))
}

pub fn float(value: &Value, params: &[&str]) -> Result<Value, String> {
    let Value::Number(n) = value else {
        return Ok(Value::from(""));
    };
    let digits = fraction_digits(params)?;
    Ok(Value::from(to_fixed(*n, digits)))
}

pub fn exp(value: &Value, params: &[&str]) -> Result<Value, String> {
    let Value::Number(n) = value else {
        return Ok(Value::from(""));
    };
    let digits = fraction_digits(params)?;
    Ok(Value::from(to_exponential(*n, digits)))
}

fn fraction_digits(params: &[&str]) -> Result<usize, String> {
    let digits = params.first().and_then(|p| parse_int(p)).unwrap_or(0);
    usize::try_from(digits)
        .ok()
        .filter(|d| *d <= MAX_FRACTION_DIGITS)
        .ok_or_else(|| format!("fraction digits must be between 0 and {MAX_FRACTION_DIGITS}, got {digits}"))
}

/// Leading integer of `text`, ignoring surrounding whitespace and any
/// trailing garbage. `None` when there are no digits.
fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = unsigned
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let magnitude: i64 = unsigned[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

// Decimal rendering on the exact binary value, rounding half away from zero.

/// Exact decimal expansion of `magnitude` split at the point.
fn exact_expansion(magnitude: f64) -> (String, String) {
    let text = format!("{:.*}", EXACT_PRECISION, magnitude);
    match text.split_once('.') {
        Some((int, frac)) => (int.to_owned(), frac.to_owned()),
        None => (text, String::new()),
    }
}

/// Round the decimal digit string `kept` up when `next` is 5 or more.
/// Returns `true` if the carry produced an extra leading digit.
fn round_half_up(kept: &mut Vec<u8>, next: Option<u8>) -> bool {
    if !matches!(next, Some(d) if d >= b'5') {
        return false;
    }
    for digit in kept.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            return false;
        }
    }
    kept.insert(0, b'1');
    true
}

fn sign(n: f64) -> &'static str {
    if n < 0.0 {
        "-"
    } else {
        ""
    }
}

/// Fixed-point text with `digits` fraction digits.
pub(crate) fn to_fixed(n: f64, digits: usize) -> String {
    if !n.is_finite() || n.abs() >= 1e21 {
        return number_to_string(n);
    }
    let (int, frac) = exact_expansion(n.abs());
    let mut kept: Vec<u8> = int.bytes().chain(frac.bytes().take(digits)).collect();
    round_half_up(&mut kept, frac.as_bytes().get(digits).copied());
    let split = kept.len() - digits;
    let (int_digits, frac_digits) = kept.split_at(split);
    let mut out = String::from(sign(n));
    out.push_str(&String::from_utf8_lossy(int_digits));
    if digits > 0 {
        out.push('.');
        out.push_str(&String::from_utf8_lossy(frac_digits));
    }
    out
}

/// Exponent notation with `digits` fraction digits: `7.36e+1`.
pub(crate) fn to_exponential(n: f64, digits: usize) -> String {
    if !n.is_finite() {
        return number_to_string(n);
    }
    let (int, frac) = exact_expansion(n.abs());
    let all: Vec<u8> = int.bytes().chain(frac.bytes()).collect();
    let (kept, mut exponent) = match all.iter().position(|&d| d != b'0') {
        Some(lead) => {
            let significant = &all[lead..];
            let mut kept: Vec<u8> = significant.iter().copied().take(digits + 1).collect();
            kept.resize(digits + 1, b'0');
            let carried = round_half_up(&mut kept, significant.get(digits + 1).copied());
            #[allow(
                clippy::cast_possible_wrap,
                reason = "expansion length is bounded by EXACT_PRECISION"
            )]
            let mut exponent = int.len() as i64 - 1 - lead as i64;
            if carried {
                kept.pop();
                exponent += 1;
            }
            (kept, exponent)
        }
        None => (vec![b'0'; digits + 1], 0),
    };
    let mut out = String::from(sign(n));
    out.push(char::from(kept[0]));
    if digits > 0 {
        out.push('.');
        out.push_str(&String::from_utf8_lossy(&kept[1..]));
    }
    out.push('e');
    if exponent < 0 {
        out.push('-');
        exponent = -exponent;
    } else {
        out.push('+');
    }
    out.push_str(&exponent.to_string());
    out
}

/// Text of `n` in base `radix`, fraction digits included.
fn to_radix(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() {
        return number_to_string(n);
    }
    let base = f64::from(radix);
    let magnitude = n.abs();
    let mut int = magnitude.trunc();
    let mut fraction = magnitude - int;

    // Fraction digits, stopping once the remaining digits cannot change the
    // value. `delta` is half the distance to the next representable double.
    let mut frac_digits: Vec<u32> = Vec::new();
    let mut delta = (0.5 * (f64::from_bits(magnitude.to_bits() + 1) - magnitude)).max(f64::from_bits(1));
    if fraction >= delta {
        loop {
            fraction *= base;
            delta *= base;
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "fraction * base is below base"
            )]
            let digit = fraction as u32;
            frac_digits.push(digit);
            fraction -= f64::from(digit);
            if (fraction > 0.5 || (fraction == 0.5 && digit & 1 == 1)) && fraction + delta > 1.0 {
                // Round up, propagating the carry.
                loop {
                    match frac_digits.pop() {
                        Some(last) if last + 1 < radix => {
                            frac_digits.push(last + 1);
                            break;
                        }
                        Some(_) => {}
                        None => {
                            int += 1.0;
                            break;
                        }
                    }
                }
                break;
            }
            if fraction < delta {
                break;
            }
        }
    }

    let mut int_digits: Vec<u32> = Vec::new();
    loop {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "remainder is below radix"
        )]
        let digit = (int % base) as u32;
        int_digits.push(digit);
        int = ((int - f64::from(digit)) / base).trunc();
        if int < 1.0 {
            break;
        }
    }

    let to_char = |d: u32| char::from_digit(d, radix).unwrap_or('?');
    let mut out = String::from(sign(n));
    out.extend(int_digits.iter().rev().map(|&d| to_char(d)));
    if !frac_digits.is_empty() {
        out.push('.');
        out.extend(frac_digits.iter().map(|&d| to_char(d)));
    }
    out
}
