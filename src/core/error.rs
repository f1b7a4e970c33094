// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Structured errors for every front-end stage.
//!
//! Each stage has its own error enum. [`Error`] wraps them so the driver can
//! collect a single list. Every variant carries the [`Span`] it refers to;
//! rendering is left to the host.

use crate::core::tokenizer::Span;

/// Broad error category, used by hosts to group diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lexical,
    Syntactic,
    Macro,
    Scope,
}

/// Errors raised while turning source text into tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum LexError {
    #[error("unterminated string literal")]
    #[diagnostic(code(macroasm::lex::unterminated_string))]
    UnterminatedString { span: Span },

    #[error("unterminated character literal")]
    #[diagnostic(code(macroasm::lex::unterminated_char))]
    UnterminatedChar { span: Span },

    #[error("invalid escape sequence `{sequence}`")]
    #[diagnostic(
        code(macroasm::lex::invalid_escape),
        help("valid escapes are \\0 \\a \\b \\t \\n \\v \\f \\r \\e \\s \\\" \\' \\\\ \\d")
    )]
    InvalidEscape { sequence: String, span: Span },

    #[error("malformed number: {reason}")]
    #[diagnostic(code(macroasm::lex::malformed_number))]
    MalformedNumber { reason: &'static str, span: Span },

    #[error("character literal must contain exactly one character")]
    #[diagnostic(code(macroasm::lex::malformed_char))]
    MalformedChar { span: Span },

    #[error("illegal character `{ch}`")]
    #[diagnostic(code(macroasm::lex::illegal_character))]
    IllegalCharacter { ch: char, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString { span }
            | LexError::UnterminatedChar { span }
            | LexError::InvalidEscape { span, .. }
            | LexError::MalformedNumber { span, .. }
            | LexError::MalformedChar { span }
            | LexError::IllegalCharacter { span, .. } => *span,
        }
    }
}

/// Errors raised while grouping tokens and parsing statements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum SyntaxError {
    #[error("unexpected `{found}`, expected {expected}")]
    #[diagnostic(code(macroasm::syntax::unexpected_token))]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        span: Span,
    },

    #[error("unexpected end of statement, expected {expected}")]
    #[diagnostic(code(macroasm::syntax::unexpected_end))]
    UnexpectedEnd { expected: &'static str, span: Span },

    #[error("unmatched `{delimiter}`")]
    #[diagnostic(code(macroasm::syntax::unmatched_delimiter))]
    UnmatchedDelimiter { delimiter: char, span: Span },

    #[error("mismatched delimiter: expected `{expected}`, found `{found}`")]
    #[diagnostic(code(macroasm::syntax::mismatched_delimiter))]
    MismatchedDelimiter {
        expected: char,
        found: char,
        span: Span,
    },

    #[error("unexpected `{found}` after end of statement")]
    #[diagnostic(code(macroasm::syntax::trailing_tokens))]
    TrailingTokens { found: String, span: Span },

    #[error("malformed definition: {message}")]
    #[diagnostic(code(macroasm::syntax::malformed_definition))]
    MalformedDefinition { message: String, span: Span },
}

impl SyntaxError {
    pub fn span(&self) -> Span {
        match self {
            SyntaxError::UnexpectedToken { span, .. }
            | SyntaxError::UnexpectedEnd { span, .. }
            | SyntaxError::UnmatchedDelimiter { span, .. }
            | SyntaxError::MismatchedDelimiter { span, .. }
            | SyntaxError::TrailingTokens { span, .. }
            | SyntaxError::MalformedDefinition { span, .. } => *span,
        }
    }
}

/// Errors raised while defining or expanding macros.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum MacroError {
    #[error("unknown macro `{name}`")]
    #[diagnostic(code(macroasm::macros::unknown))]
    UnknownMacro { name: String, span: Span },

    #[error("macro `{name}` is already defined")]
    #[diagnostic(code(macroasm::macros::duplicate_definition))]
    DuplicateDefinition {
        name: String,
        span: Span,
        previous: Span,
    },

    #[error("macro `{name}` expects {expected} argument(s), found {found}")]
    #[diagnostic(code(macroasm::macros::arity))]
    Arity {
        name: String,
        expected: String,
        found: usize,
        span: Span,
    },

    #[error("parameter `{param}` of macro `{name}` is bound more than once")]
    #[diagnostic(code(macroasm::macros::duplicate_argument))]
    DuplicateArgument {
        name: String,
        param: String,
        span: Span,
    },

    #[error("macro `{name}` has no parameter `{param}`")]
    #[diagnostic(code(macroasm::macros::unknown_parameter))]
    UnknownParameter {
        name: String,
        param: String,
        span: Span,
    },

    #[error("variadic parameter `{param}` of macro `{name}` must be the last parameter")]
    #[diagnostic(code(macroasm::macros::non_final_variadic))]
    NonFinalVariadic {
        name: String,
        param: String,
        span: Span,
    },

    #[error("parameter `{param}` of macro `{name}` is declared more than once")]
    #[diagnostic(code(macroasm::macros::duplicate_parameter))]
    DuplicateParameter {
        name: String,
        param: String,
        span: Span,
    },

    #[error("expansion of macro `{name}` exceeded the maximum depth of {limit}")]
    #[diagnostic(
        code(macroasm::macros::recursion_limit),
        help("check for a macro that expands to itself, or raise the expansion depth")
    )]
    RecursionLimit {
        name: String,
        limit: usize,
        span: Span,
    },
}

impl MacroError {
    pub fn span(&self) -> Span {
        match self {
            MacroError::UnknownMacro { span, .. }
            | MacroError::DuplicateDefinition { span, .. }
            | MacroError::Arity { span, .. }
            | MacroError::DuplicateArgument { span, .. }
            | MacroError::UnknownParameter { span, .. }
            | MacroError::NonFinalVariadic { span, .. }
            | MacroError::DuplicateParameter { span, .. }
            | MacroError::RecursionLimit { span, .. } => *span,
        }
    }
}

/// Errors raised by the scope stack and label table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum ScopeError {
    #[error("`.end {found}` does not match the open scope `{expected}`")]
    #[diagnostic(code(macroasm::scope::mismatch))]
    Mismatch {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("`.end` without an open scope")]
    #[diagnostic(code(macroasm::scope::unmatched_end))]
    UnmatchedEnd { span: Span },

    #[error("scope `{name}` is never closed")]
    #[diagnostic(code(macroasm::scope::unclosed))]
    Unclosed { name: String, span: Span },

    #[error("label `{name}` is already declared in this scope")]
    #[diagnostic(code(macroasm::scope::duplicate_label))]
    DuplicateLabel {
        name: String,
        span: Span,
        previous: Span,
    },
}

impl ScopeError {
    pub fn span(&self) -> Span {
        match self {
            ScopeError::Mismatch { span, .. }
            | ScopeError::UnmatchedEnd { span }
            | ScopeError::Unclosed { span, .. }
            | ScopeError::DuplicateLabel { span, .. } => *span,
        }
    }
}

/// Any front-end error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Macro(#[from] MacroError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scope(#[from] ScopeError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Lex(_) => ErrorKind::Lexical,
            Error::Syntax(_) => ErrorKind::Syntactic,
            Error::Macro(_) => ErrorKind::Macro,
            Error::Scope(_) => ErrorKind::Scope,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Error::Lex(err) => err.span(),
            Error::Syntax(err) => err.span(),
            Error::Macro(err) => err.span(),
            Error::Scope(err) => err.span(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn wrapper_reports_inner_category_and_span() {
        let span = Span::new(4, 2, 10, 3);
        let err: Error = MacroError::RecursionLimit {
            name: "loop".to_string(),
            limit: 64,
            span,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Macro);
        assert_eq!(err.span(), span);
        assert_eq!(
            err.to_string(),
            "expansion of macro `loop` exceeded the maximum depth of 64"
        );
    }

    #[test]
    fn wrapper_forwards_diagnostic_code() {
        let err: Error = ScopeError::UnmatchedEnd {
            span: Span::default(),
        }
        .into();
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("macroasm::scope::unmatched_end"));
    }
}
