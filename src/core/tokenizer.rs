// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Tokenizer for assembly source with spans.
//!
//! The tokenizer is a lazy iterator over a whole compilation unit. Newlines
//! and `;` both produce [`TokenKind::Eos`]; `#` starts a comment that runs to
//! the end of the line. A tokenizer can be suspended by saving its
//! [`Position`] and later resumed from it with [`Tokenizer::resume`].

use std::fmt;

use crate::core::error::LexError;
use crate::core::literal::{base_marker, decode_escape, quote_literal, scan_number, NumberValue};
use crate::core::text_utils::{is_ident_char, is_ident_start, is_space};

/// Source region covered by a token or node.
///
/// `line` and `column` are 1-based; `column` counts bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32, offset: usize, len: usize) -> Self {
        Self {
            offset,
            len,
            line,
            column,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        let (first, last) = if self.offset <= other.offset {
            (self, other)
        } else {
            (other, self)
        };
        let end = (last.offset + last.len).max(first.offset + first.len);
        Span {
            offset: first.offset,
            len: end - first.offset,
            line: first.line,
            column: first.column,
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Empty span just past the end of `self`, on its first line.
    pub fn end_point(self) -> Span {
        Span::new(self.line, self.column + self.len as u32, self.end(), 0)
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.offset, span.len).into()
    }
}

/// Saved tokenizer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    BitNot,
    LogicNot,
    Increment,
    Decrement,
    Multiply,
    Divide,
    Mod,
    Plus,
    Minus,
    Shl,
    Shr,
    BitAnd,
    BitXor,
    BitOr,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    LogicAnd,
    LogicXor,
    LogicOr,
    Assign,
    MultiplyAssign,
    DivideAssign,
    ModAssign,
    PlusAssign,
    MinusAssign,
    ShlAssign,
    ShrAssign,
    BitAndAssign,
    BitXorAssign,
    BitOrAssign,
    LogicAndAssign,
    LogicXorAssign,
    LogicOrAssign,
    /// `+:` implicit-signed prefix.
    ImplicitSigned,
    /// `%:` implicit-unsigned prefix.
    ImplicitUnsigned,
}

impl OperatorKind {
    pub fn symbol(self) -> &'static str {
        match self {
            OperatorKind::BitNot => "~",
            OperatorKind::LogicNot => "!",
            OperatorKind::Increment => "++",
            OperatorKind::Decrement => "--",
            OperatorKind::Multiply => "*",
            OperatorKind::Divide => "/",
            OperatorKind::Mod => "%",
            OperatorKind::Plus => "+",
            OperatorKind::Minus => "-",
            OperatorKind::Shl => "<<",
            OperatorKind::Shr => ">>",
            OperatorKind::BitAnd => "&",
            OperatorKind::BitXor => "^",
            OperatorKind::BitOr => "|",
            OperatorKind::Eq => "==",
            OperatorKind::Ne => "!=",
            OperatorKind::Lt => "<",
            OperatorKind::Gt => ">",
            OperatorKind::Le => "<=",
            OperatorKind::Ge => ">=",
            OperatorKind::LogicAnd => "&&",
            OperatorKind::LogicXor => "^^",
            OperatorKind::LogicOr => "||",
            OperatorKind::Assign => "=",
            OperatorKind::MultiplyAssign => "*=",
            OperatorKind::DivideAssign => "/=",
            OperatorKind::ModAssign => "%=",
            OperatorKind::PlusAssign => "+=",
            OperatorKind::MinusAssign => "-=",
            OperatorKind::ShlAssign => "<<=",
            OperatorKind::ShrAssign => ">>=",
            OperatorKind::BitAndAssign => "&=",
            OperatorKind::BitXorAssign => "^=",
            OperatorKind::BitOrAssign => "|=",
            OperatorKind::LogicAndAssign => "&&=",
            OperatorKind::LogicXorAssign => "^^=",
            OperatorKind::LogicOrAssign => "||=",
            OperatorKind::ImplicitSigned => "+:",
            OperatorKind::ImplicitUnsigned => "%:",
        }
    }
}

/// Punctuation that is not part of the expression operator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punct {
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Comma,
    /// `:` label marker, also the join operator inside expressions.
    Colon,
    /// `::` public label marker.
    DoubleColon,
    /// `:?` weak label marker.
    ColonQuestion,
    /// `$` duplicated-argument separator.
    Dollar,
    /// `?` argument placeholder.
    Question,
}

impl Punct {
    pub fn symbol(self) -> &'static str {
        match self {
            Punct::OpenParen => "(",
            Punct::CloseParen => ")",
            Punct::OpenBracket => "[",
            Punct::CloseBracket => "]",
            Punct::OpenBrace => "{",
            Punct::CloseBrace => "}",
            Punct::Comma => ",",
            Punct::Colon => ":",
            Punct::DoubleColon => "::",
            Punct::ColonQuestion => ":?",
            Punct::Dollar => "$",
            Punct::Question => "?",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Symbol {
    Op(OperatorKind),
    Punct(Punct),
}

/// Operator and punctuation spellings, longest first.
const SYMBOLS: &[(&str, Symbol)] = &[
    ("<<=", Symbol::Op(OperatorKind::ShlAssign)),
    (">>=", Symbol::Op(OperatorKind::ShrAssign)),
    ("&&=", Symbol::Op(OperatorKind::LogicAndAssign)),
    ("^^=", Symbol::Op(OperatorKind::LogicXorAssign)),
    ("||=", Symbol::Op(OperatorKind::LogicOrAssign)),
    ("++", Symbol::Op(OperatorKind::Increment)),
    ("--", Symbol::Op(OperatorKind::Decrement)),
    ("<<", Symbol::Op(OperatorKind::Shl)),
    (">>", Symbol::Op(OperatorKind::Shr)),
    ("<=", Symbol::Op(OperatorKind::Le)),
    (">=", Symbol::Op(OperatorKind::Ge)),
    ("==", Symbol::Op(OperatorKind::Eq)),
    ("!=", Symbol::Op(OperatorKind::Ne)),
    ("&&", Symbol::Op(OperatorKind::LogicAnd)),
    ("^^", Symbol::Op(OperatorKind::LogicXor)),
    ("||", Symbol::Op(OperatorKind::LogicOr)),
    ("*=", Symbol::Op(OperatorKind::MultiplyAssign)),
    ("/=", Symbol::Op(OperatorKind::DivideAssign)),
    ("%=", Symbol::Op(OperatorKind::ModAssign)),
    ("+=", Symbol::Op(OperatorKind::PlusAssign)),
    ("-=", Symbol::Op(OperatorKind::MinusAssign)),
    ("&=", Symbol::Op(OperatorKind::BitAndAssign)),
    ("^=", Symbol::Op(OperatorKind::BitXorAssign)),
    ("|=", Symbol::Op(OperatorKind::BitOrAssign)),
    ("+:", Symbol::Op(OperatorKind::ImplicitSigned)),
    ("%:", Symbol::Op(OperatorKind::ImplicitUnsigned)),
    ("::", Symbol::Punct(Punct::DoubleColon)),
    (":?", Symbol::Punct(Punct::ColonQuestion)),
    ("~", Symbol::Op(OperatorKind::BitNot)),
    ("!", Symbol::Op(OperatorKind::LogicNot)),
    ("*", Symbol::Op(OperatorKind::Multiply)),
    ("/", Symbol::Op(OperatorKind::Divide)),
    ("%", Symbol::Op(OperatorKind::Mod)),
    ("+", Symbol::Op(OperatorKind::Plus)),
    ("-", Symbol::Op(OperatorKind::Minus)),
    ("<", Symbol::Op(OperatorKind::Lt)),
    (">", Symbol::Op(OperatorKind::Gt)),
    ("&", Symbol::Op(OperatorKind::BitAnd)),
    ("^", Symbol::Op(OperatorKind::BitXor)),
    ("|", Symbol::Op(OperatorKind::BitOr)),
    ("=", Symbol::Op(OperatorKind::Assign)),
    ("(", Symbol::Punct(Punct::OpenParen)),
    (")", Symbol::Punct(Punct::CloseParen)),
    ("[", Symbol::Punct(Punct::OpenBracket)),
    ("]", Symbol::Punct(Punct::CloseBracket)),
    ("{", Symbol::Punct(Punct::OpenBrace)),
    ("}", Symbol::Punct(Punct::CloseBrace)),
    (",", Symbol::Punct(Punct::Comma)),
    (":", Symbol::Punct(Punct::Colon)),
    ("$", Symbol::Punct(Punct::Dollar)),
    ("?", Symbol::Punct(Punct::Question)),
];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(u64),
    Float(f64),
    Str(String),
    Char(char),
    Operator(OperatorKind),
    Punct(Punct),
    /// End of statement: newline or `;`.
    Eos,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => f.write_str(name),
            TokenKind::Int(value) => write!(f, "{value}"),
            TokenKind::Float(value) => write!(f, "{value:?}"),
            TokenKind::Str(text) => f.write_str(&quote_literal(text, '"')),
            TokenKind::Char(c) => f.write_str(&quote_literal(&c.to_string(), '\'')),
            TokenKind::Operator(op) => f.write_str(op.symbol()),
            TokenKind::Punct(punct) => f.write_str(punct.symbol()),
            TokenKind::Eos => f.write_str(";"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source lexeme, or the canonical spelling for synthesized tokens.
    pub text: String,
    pub span: Span,
}

impl Token {
    /// Build a token that does not come from source text.
    pub fn synthetic(kind: TokenKind, span: Span) -> Self {
        let text = kind.to_string();
        Self { kind, text, span }
    }

    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_punct(&self, punct: Punct) -> bool {
        self.kind == TokenKind::Punct(punct)
    }

    pub fn is_operator(&self, op: OperatorKind) -> bool {
        self.kind == TokenKind::Operator(op)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eos => f.write_str(";"),
            _ => f.write_str(&self.text),
        }
    }
}

pub struct Tokenizer<'a> {
    source: &'a str,
    input: &'a [u8],
    cursor: usize,
    line: u32,
    line_start: usize,
}

impl<'a> Tokenizer<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self::resume(source, Position::default())
    }

    /// Continue tokenizing `source` from a previously saved position.
    #[must_use]
    pub fn resume(source: &'a str, position: Position) -> Self {
        let column = position.column.max(1) as usize;
        Self {
            source,
            input: source.as_bytes(),
            cursor: position.offset,
            line: position.line.max(1),
            line_start: position.offset.saturating_sub(column - 1),
        }
    }

    pub fn position(&self) -> Position {
        Position {
            offset: self.cursor,
            line: self.line,
            column: self.column_of(self.cursor),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    fn column_of(&self, offset: usize) -> u32 {
        (offset - self.line_start + 1) as u32
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.line, self.column_of(start), start, self.cursor - start)
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            text: self.source[start..self.cursor].to_string(),
            span: self.span_from(start),
        }
    }

    fn current_byte(&self) -> Option<u8> {
        self.input.get(self.cursor).copied()
    }

    fn current_char(&self) -> Option<char> {
        self.source[self.cursor..].chars().next()
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.current_byte() {
            if is_space(c) {
                self.cursor += 1;
            } else if c == b'#' {
                while self
                    .current_byte()
                    .is_some_and(|c| c != b'\n' && c != b'\r')
                {
                    self.cursor += 1;
                }
            } else {
                break;
            }
        }
    }

    fn scan_newline(&mut self) -> Token {
        let start = self.cursor;
        if self.input[self.cursor..].starts_with(b"\r\n") {
            self.cursor += 2;
        } else {
            self.cursor += 1;
        }
        let token = self.token(TokenKind::Eos, start);
        self.line += 1;
        self.line_start = self.cursor;
        token
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.cursor;
        while self.current_byte().is_some_and(is_ident_char) {
            self.cursor += 1;
        }
        let name = self.source[start..self.cursor].to_string();
        self.token(TokenKind::Ident(name), start)
    }

    fn scan_number(&mut self) -> Result<Token, LexError> {
        let start = self.cursor;
        match scan_number(&self.input[start..]) {
            Ok(scanned) => {
                self.cursor += scanned.len;
                let kind = match scanned.value {
                    NumberValue::Int(value) => TokenKind::Int(value),
                    NumberValue::Float(value) => TokenKind::Float(value),
                };
                Ok(self.token(kind, start))
            }
            Err(reason) => {
                while self
                    .current_byte()
                    .is_some_and(|c| is_ident_char(c) || c == b'\'')
                {
                    self.cursor += 1;
                }
                Err(LexError::MalformedNumber {
                    reason,
                    span: self.span_from(start),
                })
            }
        }
    }

    /// Scan a quoted literal body, returning the decoded text.
    ///
    /// On an invalid escape the scan continues to the closing quote so the
    /// tokenizer resumes after the literal.
    fn scan_quoted(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.cursor;
        self.cursor += 1;
        let mut text = String::new();
        let mut bad_escape: Option<LexError> = None;
        loop {
            let Some(c) = self.current_char() else {
                return Err(self.unterminated(quote, start));
            };
            match c {
                '\n' | '\r' => return Err(self.unterminated(quote, start)),
                _ if c == quote => {
                    self.cursor += 1;
                    break;
                }
                '\\' => {
                    let escape_start = self.cursor;
                    self.cursor += 1;
                    let Some(code) = self.current_char().filter(|c| *c != '\n' && *c != '\r')
                    else {
                        return Err(self.unterminated(quote, start));
                    };
                    self.cursor += code.len_utf8();
                    match decode_escape(code) {
                        Some(decoded) => text.push(decoded),
                        None => {
                            if bad_escape.is_none() {
                                bad_escape = Some(LexError::InvalidEscape {
                                    sequence: format!("\\{code}"),
                                    span: self.span_from(escape_start),
                                });
                            }
                        }
                    }
                }
                _ => {
                    text.push(c);
                    self.cursor += c.len_utf8();
                }
            }
        }
        match bad_escape {
            Some(err) => Err(err),
            None => Ok(text),
        }
    }

    fn unterminated(&self, quote: char, start: usize) -> LexError {
        let span = self.span_from(start);
        if quote == '"' {
            LexError::UnterminatedString { span }
        } else {
            LexError::UnterminatedChar { span }
        }
    }

    fn scan_string(&mut self) -> Result<Token, LexError> {
        let start = self.cursor;
        let text = self.scan_quoted('"')?;
        Ok(self.token(TokenKind::Str(text), start))
    }

    fn scan_char(&mut self) -> Result<Token, LexError> {
        let start = self.cursor;
        let text = self.scan_quoted('\'')?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(self.token(TokenKind::Char(c), start)),
            _ => Err(LexError::MalformedChar {
                span: self.span_from(start),
            }),
        }
    }

    fn scan_symbol(&mut self) -> Result<Token, LexError> {
        let start = self.cursor;
        let rest = &self.input[start..];
        if let Some((text, symbol)) = SYMBOLS
            .iter()
            .find(|(text, _)| rest.starts_with(text.as_bytes()))
        {
            self.cursor += text.len();
            let kind = match *symbol {
                Symbol::Op(op) => TokenKind::Operator(op),
                Symbol::Punct(punct) => TokenKind::Punct(punct),
            };
            return Ok(self.token(kind, start));
        }
        let ch = self.current_char().unwrap_or('\0');
        self.cursor += ch.len_utf8().max(1);
        Err(LexError::IllegalCharacter {
            ch,
            span: self.span_from(start),
        })
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_trivia();
        let c = self.current_byte()?;
        let start = self.cursor;
        Some(match c {
            b'\n' | b'\r' => Ok(self.scan_newline()),
            b';' => {
                self.cursor += 1;
                Ok(self.token(TokenKind::Eos, start))
            }
            b'"' => self.scan_string(),
            b'\'' => self.scan_char(),
            _ if c.is_ascii_digit() || base_marker(&self.input[start..]).is_some() => {
                self.scan_number()
            }
            _ if is_ident_start(c) => Ok(self.scan_identifier()),
            _ => self.scan_symbol(),
        })
    }
}

/// Tokenize a whole source, stopping at the first lexical error.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Tokenizer::new(source).collect()
}
