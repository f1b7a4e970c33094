// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Escape sequences and numeric literal decoding.

use crate::core::text_utils::{digit_value, is_ident_char};

/// Backslash escapes understood inside string and character literals.
const ESCAPES: &[(char, char)] = &[
    ('0', '\0'),
    ('a', '\x07'),
    ('b', '\x08'),
    ('t', '\t'),
    ('n', '\n'),
    ('v', '\x0b'),
    ('f', '\x0c'),
    ('r', '\r'),
    ('e', '\x1b'),
    ('s', ' '),
    ('"', '"'),
    ('\'', '\''),
    ('\\', '\\'),
    ('d', '\x7f'),
];

/// Decode the character following a backslash.
pub fn decode_escape(c: char) -> Option<char> {
    ESCAPES
        .iter()
        .find(|(code, _)| *code == c)
        .map(|(_, value)| *value)
}

/// Escape sequence for `c` when rendered inside a literal quoted with `quote`.
///
/// Space is only escaped as `\s` by the source author, never on output.
pub fn encode_escape(c: char, quote: char) -> Option<&'static str> {
    match c {
        '\0' => Some("\\0"),
        '\x07' => Some("\\a"),
        '\x08' => Some("\\b"),
        '\t' => Some("\\t"),
        '\n' => Some("\\n"),
        '\x0b' => Some("\\v"),
        '\x0c' => Some("\\f"),
        '\r' => Some("\\r"),
        '\x1b' => Some("\\e"),
        '\\' => Some("\\\\"),
        '\x7f' => Some("\\d"),
        '"' if quote == '"' => Some("\\\""),
        '\'' if quote == '\'' => Some("\\'"),
        _ => None,
    }
}

/// Render `text` as a quoted literal using `quote` as the delimiter.
pub fn quote_literal(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match encode_escape(c, quote) {
            Some(escape) => out.push_str(escape),
            None => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Decoded value of a numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Int(u64),
    Float(f64),
}

/// A scanned numeric literal: its value and its length in bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScannedNumber {
    pub value: NumberValue,
    pub len: usize,
}

/// Radix selected by a `b'`, `o'`, `d'` or `x'` marker at the start of `bytes`.
pub fn base_marker(bytes: &[u8]) -> Option<u32> {
    if bytes.get(1) != Some(&b'\'') {
        return None;
    }
    match bytes.first()?.to_ascii_lowercase() {
        b'b' => Some(2),
        b'o' => Some(8),
        b'd' => Some(10),
        b'x' => Some(16),
        _ => None,
    }
}

/// Scan a numeric literal at the start of `bytes`.
///
/// The grammar is `[base'] digits [. digits] [p [+-] digits]`, with `_`
/// allowed between digits. The exponent is a power of two in every radix.
pub fn scan_number(bytes: &[u8]) -> Result<ScannedNumber, &'static str> {
    let mut pos = 0usize;
    let radix = match base_marker(bytes) {
        Some(radix) => {
            pos = 2;
            radix
        }
        None => 10,
    };

    let mut mantissa: u64 = 0;
    let mut overflow = false;
    let mut float_mantissa = 0f64;
    let mut frac_digits = 0i32;
    let mut digits = 0usize;
    let mut seen_point = false;

    while let Some(&c) = bytes.get(pos) {
        if c == b'_' && digits > 0 {
            pos += 1;
            continue;
        }
        if c == b'.' {
            if seen_point {
                return Err("more than one decimal point");
            }
            seen_point = true;
            pos += 1;
            continue;
        }
        let Some(d) = digit_value(c, radix) else {
            break;
        };
        match mantissa
            .checked_mul(u64::from(radix))
            .and_then(|m| m.checked_add(u64::from(d)))
        {
            Some(m) => mantissa = m,
            None => overflow = true,
        }
        float_mantissa = float_mantissa * f64::from(radix) + f64::from(d);
        if seen_point {
            frac_digits += 1;
        }
        digits += 1;
        pos += 1;
    }
    if digits == 0 {
        return Err(if radix == 10 && pos == 0 {
            "expected digits"
        } else {
            "no digits after base marker"
        });
    }

    let mut exponent: Option<i32> = None;
    if matches!(bytes.get(pos), Some(b'p' | b'P')) {
        pos += 1;
        let negative = match bytes.get(pos) {
            Some(b'+') => {
                pos += 1;
                false
            }
            Some(b'-') => {
                pos += 1;
                true
            }
            _ => false,
        };
        let start = pos;
        let mut value: i32 = 0;
        while let Some(&c) = bytes.get(pos) {
            let Some(d) = digit_value(c, 10) else {
                break;
            };
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(d as i32))
                .ok_or("exponent out of range")?;
            pos += 1;
        }
        if pos == start {
            return Err("no digits after exponent marker");
        }
        exponent = Some(if negative { -value } else { value });
    }

    if bytes.get(pos).is_some_and(|&c| is_ident_char(c)) {
        return Err("invalid digit in numeric literal");
    }

    let value = if !seen_point && exponent.is_none() {
        if overflow {
            return Err("integer literal too large");
        }
        NumberValue::Int(mantissa)
    } else {
        let scaled = float_mantissa / f64::from(radix).powi(frac_digits);
        NumberValue::Float(scaled * 2f64.powi(exponent.unwrap_or(0)))
    };
    Ok(ScannedNumber { value, len: pos })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(text: &str) -> NumberValue {
        scan_number(text.as_bytes()).expect("valid number").value
    }

    #[test]
    fn escape_table_round_trips() {
        for &(code, decoded) in ESCAPES {
            if code == 's' {
                continue;
            }
            let quote = if decoded == '\'' { '\'' } else { '"' };
            let encoded = encode_escape(decoded, quote).expect("encodable");
            assert_eq!(encoded.chars().nth(1), Some(code));
            assert_eq!(decode_escape(code), Some(decoded));
        }
        assert_eq!(decode_escape('s'), Some(' '));
        assert_eq!(decode_escape('q'), None);
    }

    #[test]
    fn quotes_literal_with_escapes() {
        assert_eq!(quote_literal("a\"b\n", '"'), "\"a\\\"b\\n\"");
        assert_eq!(quote_literal("'", '\''), "'\\''");
        assert_eq!(quote_literal("'", '"'), "\"'\"");
    }

    #[test]
    fn decodes_based_integers() {
        assert_eq!(value("x'1f"), NumberValue::Int(31));
        assert_eq!(value("X'FF"), NumberValue::Int(255));
        assert_eq!(value("b'101"), NumberValue::Int(5));
        assert_eq!(value("o'17"), NumberValue::Int(15));
        assert_eq!(value("d'42"), NumberValue::Int(42));
        assert_eq!(value("1_000"), NumberValue::Int(1000));
    }

    #[test]
    fn decodes_fractions_and_exponents() {
        assert_eq!(value("d'3.14"), NumberValue::Float(3.14));
        assert_eq!(value("1p+3"), NumberValue::Float(8.0));
        assert_eq!(value("1p-1"), NumberValue::Float(0.5));
        assert_eq!(value("x'1.8"), NumberValue::Float(1.5));
    }

    #[test]
    fn stops_at_operator() {
        let scanned = scan_number(b"12+3").expect("valid number");
        assert_eq!(scanned.len, 2);
        assert_eq!(scanned.value, NumberValue::Int(12));
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert_eq!(scan_number(b"x'"), Err("no digits after base marker"));
        assert_eq!(scan_number(b"1.2.3"), Err("more than one decimal point"));
        assert_eq!(scan_number(b"1p"), Err("no digits after exponent marker"));
        assert_eq!(scan_number(b"b'102"), Err("invalid digit in numeric literal"));
        assert_eq!(scan_number(b"12ab"), Err("invalid digit in numeric literal"));
        assert_eq!(
            scan_number(b"x'1_0000_0000_0000_0000"),
            Err("integer literal too large")
        );
    }
}
