// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Delimiter-matched token trees.
//!
//! `( )`, `[ ]` and `{ }` become [`Group`]s. A brace group keeps its
//! end-of-statement tokens so it can hold several statements; parens and
//! brackets must close on the line they open.

use std::collections::VecDeque;
use std::fmt;

use crate::core::error::{Error, SyntaxError};
use crate::core::tokenizer::{Punct, Span, Token, TokenKind, Tokenizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    Paren,
    Bracket,
    Brace,
}

impl Delimiter {
    pub fn open_char(self) -> char {
        match self {
            Delimiter::Paren => '(',
            Delimiter::Bracket => '[',
            Delimiter::Brace => '{',
        }
    }

    pub fn close_char(self) -> char {
        match self {
            Delimiter::Paren => ')',
            Delimiter::Bracket => ']',
            Delimiter::Brace => '}',
        }
    }

    fn from_open(punct: Punct) -> Option<Self> {
        match punct {
            Punct::OpenParen => Some(Delimiter::Paren),
            Punct::OpenBracket => Some(Delimiter::Bracket),
            Punct::OpenBrace => Some(Delimiter::Brace),
            _ => None,
        }
    }

    fn from_close(punct: Punct) -> Option<Self> {
        match punct {
            Punct::CloseParen => Some(Delimiter::Paren),
            Punct::CloseBracket => Some(Delimiter::Bracket),
            Punct::CloseBrace => Some(Delimiter::Brace),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub delimiter: Delimiter,
    pub open: Span,
    pub close: Span,
    pub trees: Vec<TokenTree>,
}

impl Group {
    pub fn span(&self) -> Span {
        self.open.to(self.close)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenTree {
    Token(Token),
    Group(Group),
}

impl TokenTree {
    pub fn span(&self) -> Span {
        match self {
            TokenTree::Token(token) => token.span,
            TokenTree::Group(group) => group.span(),
        }
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            TokenTree::Token(token) => Some(token),
            TokenTree::Group(_) => None,
        }
    }

    pub fn ident(&self) -> Option<&str> {
        self.token().and_then(Token::ident)
    }

    pub fn is_punct(&self, punct: Punct) -> bool {
        self.token().is_some_and(|t| t.is_punct(punct))
    }

    pub fn is_eos(&self) -> bool {
        self.token().is_some_and(|t| t.kind == TokenKind::Eos)
    }
}

impl fmt::Display for TokenTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenTree::Token(token) => write!(f, "{token}"),
            TokenTree::Group(group) => {
                write!(f, "{}", group.delimiter.open_char())?;
                f.write_str(&render(&group.trees))?;
                write!(f, "{}", group.delimiter.close_char())
            }
        }
    }
}

/// One statement's worth of token trees.
pub type Line = Vec<TokenTree>;

/// Render trees back to source-like text, one space between trees.
pub fn render(trees: &[TokenTree]) -> String {
    trees
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Span covering a non-empty tree slice.
pub fn trees_span(trees: &[TokenTree]) -> Option<Span> {
    let first = trees.first()?.span();
    let last = trees.last()?.span();
    Some(first.to(last))
}

/// Split the contents of a brace group into statements, dropping empty ones.
pub fn split_statements(trees: &[TokenTree]) -> Vec<Line> {
    trees
        .split(TokenTree::is_eos)
        .filter(|line| !line.is_empty())
        .map(<[TokenTree]>::to_vec)
        .collect()
}

/// One comma-separated argument and the comma that followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub trees: Vec<TokenTree>,
    pub separator: Option<Token>,
}

/// Split trees on top-level commas.
///
/// An empty input yields no arguments. Otherwise `n` commas yield `n + 1`
/// arguments, any of which may be empty.
pub fn split_args(trees: &[TokenTree]) -> Vec<Argument> {
    if trees.is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut current = Vec::new();
    for tree in trees {
        match tree {
            TokenTree::Token(token) if token.is_punct(Punct::Comma) => {
                args.push(Argument {
                    trees: std::mem::take(&mut current),
                    separator: Some(token.clone()),
                });
            }
            _ => current.push(tree.clone()),
        }
    }
    args.push(Argument {
        trees: current,
        separator: None,
    });
    args
}

struct OpenGroup {
    delimiter: Delimiter,
    open: Span,
    trees: Vec<TokenTree>,
}

/// Lazily groups tokens into statement lines.
///
/// After an error the rest of the statement is discarded so iteration can
/// continue with the next one. Inside a `{ }` group only the failing inner
/// statement is dropped; its error is yielded first and the group itself
/// still comes back with the enclosing line.
pub struct Lines<'a> {
    tokens: Tokenizer<'a>,
    pending: VecDeque<Result<Line, Error>>,
    done: bool,
}

impl<'a> Lines<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::from_tokenizer(Tokenizer::new(source))
    }

    pub fn from_tokenizer(tokens: Tokenizer<'a>) -> Self {
        Self {
            tokens,
            pending: VecDeque::new(),
            done: false,
        }
    }

    fn resynchronize(&mut self) {
        for item in self.tokens.by_ref() {
            if matches!(item, Ok(Token { kind: TokenKind::Eos, .. })) {
                return;
            }
        }
        self.done = true;
    }

    fn fail(&mut self, err: Error, at_eos: bool) -> Option<Result<Line, Error>> {
        if !at_eos {
            self.resynchronize();
        }
        Some(Err(err))
    }

    /// Drop the statement being read in the innermost open `{ }` group,
    /// queueing `err`. Hands the error back when no brace group is open.
    fn recover_in_brace(&mut self, stack: &mut Vec<OpenGroup>, err: Error) -> Result<(), Error> {
        let Some(index) = stack
            .iter()
            .rposition(|open| open.delimiter == Delimiter::Brace)
        else {
            return Err(err);
        };
        stack.truncate(index + 1);
        if let Some(brace) = stack.last_mut() {
            let keep = brace
                .trees
                .iter()
                .rposition(TokenTree::is_eos)
                .map_or(0, |i| i + 1);
            brace.trees.truncate(keep);
        }
        self.pending.push_back(Err(err));
        Ok(())
    }

    fn close(stack: &mut Vec<OpenGroup>, line: &mut Line, close: Span) {
        if let Some(open) = stack.pop() {
            let group = TokenTree::Group(Group {
                delimiter: open.delimiter,
                open: open.open,
                close,
                trees: open.trees,
            });
            match stack.last_mut() {
                Some(parent) => parent.trees.push(group),
                None => line.push(group),
            }
        }
    }

    fn read_line(&mut self) -> Option<Result<Line, Error>> {
        let mut line: Line = Vec::new();
        let mut stack: Vec<OpenGroup> = Vec::new();
        // Brace nesting inside a statement being dropped.
        let mut skip: Option<usize> = None;
        loop {
            let token = match self.tokens.next() {
                None => {
                    self.done = true;
                    if let Some(open) = stack.first() {
                        return Some(Err(SyntaxError::UnmatchedDelimiter {
                            delimiter: open.delimiter.open_char(),
                            span: open.open,
                        }
                        .into()));
                    }
                    return (!line.is_empty()).then_some(Ok(line));
                }
                Some(Err(_)) if skip.is_some() => continue,
                Some(Err(err)) => match self.recover_in_brace(&mut stack, err.into()) {
                    Ok(()) => {
                        skip = Some(0);
                        continue;
                    }
                    Err(err) => return self.fail(err, false),
                },
                Some(Ok(token)) => token,
            };

            let punct = match &token.kind {
                TokenKind::Punct(punct) => Some(*punct),
                _ => None,
            };
            if let Some(depth) = skip {
                let opens = punct.and_then(Delimiter::from_open) == Some(Delimiter::Brace);
                let closes = punct.and_then(Delimiter::from_close) == Some(Delimiter::Brace);
                match depth {
                    _ if opens => {
                        skip = Some(depth + 1);
                        continue;
                    }
                    0 if closes || token.kind == TokenKind::Eos => skip = None,
                    _ if closes => {
                        skip = Some(depth - 1);
                        continue;
                    }
                    _ => continue,
                }
            }

            if token.kind == TokenKind::Eos {
                match stack.last_mut() {
                    None if line.is_empty() => {}
                    None => return Some(Ok(line)),
                    Some(open) if open.delimiter == Delimiter::Brace => {
                        open.trees.push(TokenTree::Token(token));
                    }
                    Some(open) => {
                        let err = SyntaxError::UnmatchedDelimiter {
                            delimiter: open.delimiter.open_char(),
                            span: open.open,
                        };
                        if let Err(err) = self.recover_in_brace(&mut stack, err.into()) {
                            return self.fail(err, true);
                        }
                    }
                }
            } else if let Some(delimiter) = punct.and_then(Delimiter::from_open) {
                stack.push(OpenGroup {
                    delimiter,
                    open: token.span,
                    trees: Vec::new(),
                });
            } else if let Some(found) = punct.and_then(Delimiter::from_close) {
                match stack.last() {
                    None => {
                        let err = SyntaxError::UnmatchedDelimiter {
                            delimiter: found.close_char(),
                            span: token.span,
                        };
                        return self.fail(err.into(), false);
                    }
                    Some(open) if open.delimiter != found => {
                        let err = SyntaxError::MismatchedDelimiter {
                            expected: open.delimiter.close_char(),
                            found: found.close_char(),
                            span: token.span,
                        };
                        if let Err(err) = self.recover_in_brace(&mut stack, err.into()) {
                            return self.fail(err, false);
                        }
                        if found == Delimiter::Brace {
                            Self::close(&mut stack, &mut line, token.span);
                        } else {
                            skip = Some(0);
                        }
                    }
                    Some(_) => Self::close(&mut stack, &mut line, token.span),
                }
            } else {
                match stack.last_mut() {
                    Some(open) => open.trees.push(TokenTree::Token(token)),
                    None => line.push(TokenTree::Token(token)),
                }
            }
        }
    }
}

impl Iterator for Lines<'_> {
    type Item = Result<Line, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pending.is_empty() && !self.done {
            if let Some(item) = self.read_line() {
                self.pending.push_back(item);
            }
        }
        self.pending.pop_front()
    }
}

/// Group a whole source into lines, stopping at the first error.
pub fn parse_lines(source: &str) -> Result<Vec<Line>, Error> {
    Lines::new(source).collect()
}
