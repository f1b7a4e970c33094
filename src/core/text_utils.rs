// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Shared text utilities for tokenization and parsing.

/// Check if a byte can start an identifier.
///
/// Directives and local labels begin with a dot, so `.` counts as a start
/// character. Bytes of multi-byte UTF-8 sequences are accepted as well.
#[inline]
pub fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'.' || c >= 0x80
}

/// Check if a byte is a valid identifier continuation character.
#[inline]
pub fn is_ident_char(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

/// Check if a byte is horizontal whitespace (newlines end statements).
#[inline]
pub fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | 0x0b | 0x0c)
}

/// Value of `c` as a digit in `radix`, if it is one.
#[inline]
pub fn digit_value(c: u8, radix: u32) -> Option<u32> {
    (c as char).to_digit(radix)
}
