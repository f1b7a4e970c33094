// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Parser for token trees: precedence-climbing expressions and statements.

use std::fmt;

use crate::core::error::{Error, SyntaxError};
use crate::core::literal::quote_literal;
use crate::core::operators::{InfixOp, PostfixOp, PrefixOp, ASSIGN_PRECEDENCE, BASE_PRECEDENCE};
use crate::core::scope::ScopeId;
use crate::core::signedness::{resolve_infix, resolve_prefix, Signedness, SignednessContext};
use crate::core::token_tree::{
    render, split_args, split_statements, trees_span, Delimiter, Group, Line, TokenTree,
};
use crate::core::tokenizer::{OperatorKind, Punct, Span, Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Ident(String),
    Int(u64),
    Float(f64),
    Str(String),
    Char(char),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Atom {
        atom: Atom,
        span: Span,
    },
    Group {
        inner: Box<Expr>,
        span: Span,
    },
    Array {
        inner: Box<Expr>,
        /// Set by a `!` directly after the closing bracket.
        non_empty: bool,
        span: Span,
    },
    Block {
        block: Block,
        span: Span,
    },
    Prefix {
        op: PrefixOp,
        operand: Box<Expr>,
        signedness: Option<Signedness>,
        span: Span,
    },
    Postfix {
        op: PostfixOp,
        operand: Box<Expr>,
        span: Span,
    },
    Infix {
        op: InfixOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        signedness: Option<Signedness>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Atom { span, .. }
            | Expr::Group { span, .. }
            | Expr::Array { span, .. }
            | Expr::Block { span, .. }
            | Expr::Prefix { span, .. }
            | Expr::Postfix { span, .. }
            | Expr::Infix { span, .. } => *span,
        }
    }
}

/// Statements of a `{ }` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    /// Scope opened for the block, when parsed with scope tracking.
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// `.name:`
    Local,
    /// `.name::`
    Hidden,
    /// `name:`
    Private,
    /// `name:?` or `.name:?`
    Weak,
    /// `name::`
    Public,
}

impl LabelKind {
    pub fn from_marker(name: &str, marker: Punct) -> Option<Self> {
        let dotted = name.starts_with('.');
        match marker {
            Punct::Colon if dotted => Some(LabelKind::Local),
            Punct::Colon => Some(LabelKind::Private),
            Punct::DoubleColon if dotted => Some(LabelKind::Hidden),
            Punct::DoubleColon => Some(LabelKind::Public),
            Punct::ColonQuestion => Some(LabelKind::Weak),
            _ => None,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            LabelKind::Local | LabelKind::Private => ":",
            LabelKind::Hidden | LabelKind::Public => "::",
            LabelKind::Weak => ":?",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    pub kind: LabelKind,
    pub scope: ScopeId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacroParam {
    pub name: String,
    /// `!name`: argument is expanded and folded before substitution.
    pub eager: bool,
    /// `*name`: collects all remaining arguments.
    pub variadic: bool,
    pub default: Option<Vec<TokenTree>>,
    pub span: Span,
}

impl MacroParam {
    pub fn is_required(&self) -> bool {
        !self.variadic && self.default.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Define {
    pub name: String,
    /// `None` for object-like definitions written without parentheses.
    pub params: Option<Vec<MacroParam>>,
    pub body: Vec<TokenTree>,
    pub span: Span,
}

/// `.macro name params` line, before its body is collected.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroHeader {
    pub name: String,
    pub params: Vec<MacroParam>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacroDefinition {
    pub name: String,
    pub params: Vec<MacroParam>,
    pub body: Vec<Line>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// `?`
    Placeholder(Span),
    Expr(Expr),
    /// `value $ count`
    Dup {
        value: Expr,
        count: Expr,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub args: Vec<Arg>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Label(Label),
    Define(Define),
    Macro(MacroDefinition),
    Directive(Directive),
    /// Assignment or other bare expression statement.
    Expr(Expr),
}

/// Directives handled by the front end itself. Matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreDirective {
    Define,
    Macro,
    End,
    Block,
    Nop,
    Signed,
    Unsigned,
}

impl CoreDirective {
    pub fn from_name(name: &str) -> Option<Self> {
        const NAMES: &[(&str, CoreDirective)] = &[
            (".define", CoreDirective::Define),
            (".macro", CoreDirective::Macro),
            (".end", CoreDirective::End),
            (".block", CoreDirective::Block),
            (".nop", CoreDirective::Nop),
            (".signed", CoreDirective::Signed),
            (".unsigned", CoreDirective::Unsigned),
        ];
        NAMES
            .iter()
            .find(|(text, _)| text.eq_ignore_ascii_case(name))
            .map(|(_, directive)| *directive)
    }

    /// Core directive at the head of a line.
    pub fn at_head(line: &[TokenTree]) -> Option<Self> {
        line.first()?.ident().and_then(Self::from_name)
    }
}

/// Parses `{ }` blocks with full statement processing.
///
/// Without a host, blocks are parsed as plain statements: no macro expansion
/// and no scope tracking.
pub trait BlockHost {
    fn parse_block(&mut self, group: &Group, ctx: SignednessContext) -> Result<Block, Error>;
}

pub struct Parser<'t, 'h> {
    trees: &'t [TokenTree],
    index: usize,
    end_span: Span,
    ctx: SignednessContext,
    host: Option<&'h mut dyn BlockHost>,
}

impl<'t, 'h> Parser<'t, 'h> {
    pub fn new(trees: &'t [TokenTree], ctx: SignednessContext) -> Self {
        let end_span = trees_span(trees).map(Span::end_point).unwrap_or_default();
        Self {
            trees,
            index: 0,
            end_span,
            ctx,
            host: None,
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: &'h mut dyn BlockHost) -> Self {
        self.host = Some(host);
        self
    }

    /// Span reported when input ends early.
    #[must_use]
    pub fn with_end_span(mut self, span: Span) -> Self {
        self.end_span = span;
        self
    }

    pub fn at_end(&self) -> bool {
        self.index >= self.trees.len()
    }

    /// Parse the whole input as one expression.
    pub fn parse_expression(&mut self) -> Result<Expr, Error> {
        let expr = self.parse_expr_bp(BASE_PRECEDENCE)?;
        self.expect_end()?;
        Ok(expr)
    }

    /// Precedence climbing: parse operators binding at least as tight as `min_prec`.
    pub fn parse_expr_bp(&mut self, min_prec: u8) -> Result<Expr, Error> {
        let mut lhs = self.parse_unary()?;
        loop {
            let trees = self.trees;
            let Some(TokenTree::Token(token)) = trees.get(self.index) else {
                break;
            };
            if let Some(op) = PostfixOp::from_token(token) {
                if op.info().precedence < min_prec {
                    break;
                }
                self.index += 1;
                let span = lhs.span().to(token.span);
                lhs = Expr::Postfix {
                    op,
                    operand: Box::new(lhs),
                    span,
                };
                continue;
            }
            let Some(op) = InfixOp::from_token(token) else {
                break;
            };
            let info = op.info();
            if info.precedence < min_prec {
                break;
            }
            self.index += 1;
            let (signedness, _) = resolve_infix(op, self.ctx);
            let rhs = self.parse_expr_bp(info.rhs_precedence())?;
            let span = lhs.span().to(rhs.span());
            lhs = Expr::Infix {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                signedness,
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        let trees = self.trees;
        let Some(tree) = trees.get(self.index) else {
            return Err(self.unexpected_end("expression"));
        };
        let token = match tree {
            TokenTree::Group(group) => {
                self.index += 1;
                return self.parse_group(group);
            }
            TokenTree::Token(token) => token,
        };

        if let Some(op) = PrefixOp::from_token(token) {
            self.index += 1;
            let (signedness, operand_ctx) = resolve_prefix(op, self.ctx);
            let outer = std::mem::replace(&mut self.ctx, operand_ctx);
            let operand = self.parse_expr_bp(op.info().precedence);
            self.ctx = outer;
            let operand = operand?;
            let span = token.span.to(operand.span());
            return Ok(Expr::Prefix {
                op,
                operand: Box::new(operand),
                signedness,
                span,
            });
        }

        let atom = match &token.kind {
            TokenKind::Ident(name) => Atom::Ident(name.clone()),
            TokenKind::Int(value) => Atom::Int(*value),
            TokenKind::Float(value) => Atom::Float(*value),
            TokenKind::Str(text) => Atom::Str(text.clone()),
            TokenKind::Char(c) => Atom::Char(*c),
            _ => return Err(unexpected(tree, "expression")),
        };
        self.index += 1;
        Ok(Expr::Atom {
            atom,
            span: token.span,
        })
    }

    fn parse_group(&mut self, group: &'t Group) -> Result<Expr, Error> {
        match group.delimiter {
            Delimiter::Paren => {
                let inner = self.parse_nested(&group.trees, group.close)?;
                Ok(Expr::Group {
                    inner: Box::new(inner),
                    span: group.span(),
                })
            }
            Delimiter::Bracket => {
                let inner = self.parse_nested(&group.trees, group.close)?;
                let mut span = group.span();
                let non_empty = self.match_operator(OperatorKind::LogicNot);
                if non_empty {
                    span = span.to(self.prev_span());
                }
                Ok(Expr::Array {
                    inner: Box::new(inner),
                    non_empty,
                    span,
                })
            }
            Delimiter::Brace => {
                let block = match self.host.as_deref_mut() {
                    Some(host) => host.parse_block(group, self.ctx)?,
                    None => parse_plain_block(group, self.ctx)?,
                };
                Ok(Expr::Block {
                    block,
                    span: group.span(),
                })
            }
        }
    }

    /// Parse group contents as a complete expression at the base level.
    fn parse_nested(&mut self, trees: &'t [TokenTree], close: Span) -> Result<Expr, Error> {
        let saved = (self.trees, self.index, self.end_span);
        self.trees = trees;
        self.index = 0;
        self.end_span = close;
        let result = self.parse_expression();
        (self.trees, self.index, self.end_span) = saved;
        result
    }

    /// Statement without a label: an expression statement when it starts
    /// with something other than a name or assigns to one, else a directive.
    pub fn parse_statement(&mut self) -> Result<Stmt, Error> {
        if is_expression_statement(&self.trees[self.index..]) {
            return self.parse_expression().map(Stmt::Expr);
        }
        self.parse_directive().map(Stmt::Directive)
    }

    /// `name [arg {, arg}]`
    pub fn parse_directive(&mut self) -> Result<Directive, Error> {
        let trees = self.trees;
        let (name, start) = match trees.get(self.index) {
            Some(tree) => match tree.ident() {
                Some(name) => (name.to_string(), tree.span()),
                None => return Err(unexpected(tree, "directive or instruction name")),
            },
            None => return Err(self.unexpected_end("directive or instruction name")),
        };
        self.index += 1;
        let rest = &trees[self.index..];
        self.index = trees.len();

        let mut args = Vec::new();
        for arg in split_args(rest) {
            let end = arg
                .separator
                .as_ref()
                .map(|comma| comma.span)
                .unwrap_or(self.end_span);
            args.push(self.parse_arg(&arg.trees, end)?);
        }
        let span = trees_span(rest).map_or(start, |rest| start.to(rest));
        Ok(Directive { name, args, span })
    }

    fn parse_arg(&mut self, trees: &[TokenTree], end: Span) -> Result<Arg, Error> {
        if let [tree] = trees {
            if tree.is_punct(Punct::Question) {
                return Ok(Arg::Placeholder(tree.span()));
            }
        }
        let mut parser = Parser {
            trees,
            index: 0,
            end_span: end,
            ctx: self.ctx,
            host: self.reborrow_host(),
        };
        let value = parser.parse_expr_bp(BASE_PRECEDENCE)?;
        if !parser.match_punct(Punct::Dollar) {
            parser.expect_end()?;
            return Ok(Arg::Expr(value));
        }
        let count = parser.parse_expression()?;
        let span = value.span().to(count.span());
        Ok(Arg::Dup { value, count, span })
    }

    fn reborrow_host(&mut self) -> Option<&mut dyn BlockHost> {
        match self.host {
            Some(ref mut host) => Some(&mut **host),
            None => None,
        }
    }

    fn expect_end(&self) -> Result<(), Error> {
        match self.peek() {
            Some(tree) => Err(SyntaxError::TrailingTokens {
                found: tree.to_string(),
                span: tree.span(),
            }
            .into()),
            None => Ok(()),
        }
    }

    fn match_operator(&mut self, op: OperatorKind) -> bool {
        match self.peek().and_then(TokenTree::token) {
            Some(token) if token.is_operator(op) => {
                self.index += 1;
                true
            }
            _ => false,
        }
    }

    fn match_punct(&mut self, punct: Punct) -> bool {
        if self.peek().is_some_and(|tree| tree.is_punct(punct)) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<&'t TokenTree> {
        self.trees.get(self.index)
    }

    fn prev_span(&self) -> Span {
        self.index
            .checked_sub(1)
            .and_then(|i| self.trees.get(i))
            .map_or(self.end_span, TokenTree::span)
    }

    fn unexpected_end(&self, expected: &'static str) -> Error {
        SyntaxError::UnexpectedEnd {
            expected,
            span: self.end_span,
        }
        .into()
    }
}

fn unexpected(tree: &TokenTree, expected: &'static str) -> Error {
    SyntaxError::UnexpectedToken {
        found: tree.to_string(),
        expected,
        span: tree.span(),
    }
    .into()
}

fn is_expression_statement(trees: &[TokenTree]) -> bool {
    let Some(first) = trees.first() else {
        return false;
    };
    if first.ident().is_none() {
        return true;
    }
    trees
        .get(1)
        .and_then(TokenTree::token)
        .and_then(InfixOp::from_token)
        .is_some_and(|op| op.info().precedence == ASSIGN_PRECEDENCE)
}

/// Label declared at the head of a line, and the trees after it.
pub fn split_label(line: &[TokenTree]) -> Option<(Label, &[TokenTree])> {
    let [TokenTree::Token(name), TokenTree::Token(marker), rest @ ..] = line else {
        return None;
    };
    let TokenKind::Punct(punct) = marker.kind else {
        return None;
    };
    let kind = LabelKind::from_marker(name.ident()?, punct)?;
    let label = Label {
        name: name.text.clone(),
        kind,
        scope: ScopeId::TOP_LEVEL,
        span: name.span.to(marker.span),
    };
    Some((label, rest))
}

fn expect_ident<'a>(
    tree: Option<&'a TokenTree>,
    end: Span,
    expected: &'static str,
) -> Result<&'a Token, Error> {
    match tree {
        Some(TokenTree::Token(token)) if token.ident().is_some() => Ok(token),
        Some(tree) => Err(unexpected(tree, expected)),
        None => Err(SyntaxError::UnexpectedEnd {
            expected,
            span: end,
        }
        .into()),
    }
}

fn malformed(message: impl Into<String>, span: Span) -> Error {
    SyntaxError::MalformedDefinition {
        message: message.into(),
        span,
    }
    .into()
}

/// Parse a parameter list: `[!|*]name [= default] {, ...}`.
pub fn parse_params(trees: &[TokenTree], end: Span) -> Result<Vec<MacroParam>, Error> {
    let mut params = Vec::new();
    for arg in split_args(trees) {
        let arg_end = arg.separator.as_ref().map_or(end, |comma| comma.span);
        let mut items = arg.trees.iter().peekable();
        let mut eager = false;
        let mut variadic = false;
        let first_span = items.peek().map_or(arg_end, |tree| tree.span());
        if let Some(token) = items.peek().and_then(|tree| tree.token()) {
            if token.is_operator(OperatorKind::LogicNot) {
                eager = true;
                items.next();
            } else if token.is_operator(OperatorKind::Multiply) {
                variadic = true;
                items.next();
            }
        }
        let name = expect_ident(items.next(), arg_end, "parameter name")?;
        let mut span = first_span.to(name.span);
        let default = match items.next() {
            None => None,
            Some(TokenTree::Token(eq)) if eq.is_operator(OperatorKind::Assign) => {
                let default: Vec<TokenTree> = items.cloned().collect();
                if let Some(default_span) = trees_span(&default) {
                    span = span.to(default_span);
                }
                Some(default)
            }
            Some(tree) => return Err(unexpected(tree, "`=` or `,` after parameter name")),
        };
        if variadic && default.is_some() {
            return Err(malformed(
                format!("variadic parameter `{}` cannot have a default", name.text),
                span,
            ));
        }
        params.push(MacroParam {
            name: name.text.clone(),
            eager,
            variadic,
            default,
            span,
        });
    }
    Ok(params)
}

/// `.define name[(params)] [= body]`
pub fn parse_define(line: &[TokenTree]) -> Result<Define, Error> {
    let start = line.first().map(TokenTree::span).unwrap_or_default();
    let end = trees_span(line).map_or(start, Span::end_point);
    let name = expect_ident(line.get(1), end, "macro name after `.define`")?;
    let mut index = 2;
    let params = match line.get(index) {
        Some(TokenTree::Group(group)) if group.delimiter == Delimiter::Paren => {
            index += 1;
            Some(parse_params(&group.trees, group.close)?)
        }
        _ => None,
    };
    let body = match line.get(index) {
        None => Vec::new(),
        Some(TokenTree::Token(eq)) if eq.is_operator(OperatorKind::Assign) => {
            line[index + 1..].to_vec()
        }
        Some(tree) => return Err(unexpected(tree, "`=` after macro name")),
    };
    Ok(Define {
        name: name.text.clone(),
        params,
        body,
        span: trees_span(line).unwrap_or(start),
    })
}

/// `.macro name [params]` or `.macro name(params)`
pub fn parse_macro_header(line: &[TokenTree]) -> Result<MacroHeader, Error> {
    let start = line.first().map(TokenTree::span).unwrap_or_default();
    let end = trees_span(line).map_or(start, Span::end_point);
    let name = expect_ident(line.get(1), end, "macro name after `.macro`")?;
    let rest = &line[2..];
    let params = match rest {
        [TokenTree::Group(group)] if group.delimiter == Delimiter::Paren => {
            parse_params(&group.trees, group.close)?
        }
        _ => parse_params(rest, end)?,
    };
    Ok(MacroHeader {
        name: name.text.clone(),
        params,
        span: trees_span(line).unwrap_or(start),
    })
}

/// Optional scope name after `.end` or `.block`.
pub fn parse_scope_name(line: &[TokenTree]) -> Result<Option<(String, Span)>, Error> {
    let Some(rest) = line.get(1..) else {
        return Ok(None);
    };
    match rest {
        [] => Ok(None),
        [tree] => match tree.token().filter(|token| token.ident().is_some()) {
            Some(token) => Ok(Some((token.text.clone(), token.span))),
            None => Err(unexpected(tree, "scope name")),
        },
        [first, extra, ..] => {
            if first.ident().is_none() {
                return Err(unexpected(first, "scope name"));
            }
            Err(SyntaxError::TrailingTokens {
                found: extra.to_string(),
                span: extra.span(),
            }
            .into())
        }
    }
}

/// Parse one line without macro expansion or scope tracking.
pub fn parse_line(line: &[TokenTree], ctx: SignednessContext) -> Result<Vec<Stmt>, Error> {
    let mut stmts = Vec::new();
    let mut rest = line;
    while let Some((label, tail)) = split_label(rest) {
        stmts.push(Stmt::Label(label));
        rest = tail;
    }
    if rest.is_empty() {
        return Ok(stmts);
    }
    if CoreDirective::at_head(rest) == Some(CoreDirective::Define) {
        stmts.push(Stmt::Define(parse_define(rest)?));
        return Ok(stmts);
    }
    stmts.push(Parser::new(rest, ctx).parse_statement()?);
    Ok(stmts)
}

fn parse_plain_block(group: &Group, ctx: SignednessContext) -> Result<Block, Error> {
    let mut stmts = Vec::new();
    for line in split_statements(&group.trees) {
        stmts.extend(parse_line(&line, ctx)?);
    }
    Ok(Block { stmts, scope: None })
}

/// Parse a standalone expression from trees.
pub fn parse_expr(trees: &[TokenTree], ctx: SignednessContext) -> Result<Expr, Error> {
    Parser::new(trees, ctx).parse_expression()
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Ident(name) => f.write_str(name),
            Atom::Int(value) => write!(f, "{value}"),
            Atom::Float(value) => write!(f, "{value:?}"),
            Atom::Str(text) => f.write_str(&quote_literal(text, '"')),
            Atom::Char(c) => f.write_str(&quote_literal(&c.to_string(), '\'')),
        }
    }
}

/// Fully parenthesised rendering.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Atom { atom, .. } => write!(f, "{atom}"),
            Expr::Group { inner, .. } => write!(f, "({inner})"),
            Expr::Array {
                inner, non_empty, ..
            } => {
                write!(f, "[{inner}]")?;
                if *non_empty {
                    f.write_str("!")?;
                }
                Ok(())
            }
            Expr::Block { block, .. } => write!(f, "{block}"),
            Expr::Prefix { op, operand, .. } => write!(f, "({op}{operand})"),
            Expr::Postfix { op, operand, .. } => write!(f, "({operand}{op})"),
            Expr::Infix { op, lhs, rhs, .. } => write!(f, "({lhs} {op} {rhs})"),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, stmt) in self.stmts.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { "; " })?;
            write!(f, "{stmt}")?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for MacroParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.eager {
            f.write_str("!")?;
        }
        if self.variadic {
            f.write_str("*")?;
        }
        f.write_str(&self.name)?;
        if let Some(default) = &self.default {
            write!(f, " = {}", render(default))?;
        }
        Ok(())
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[MacroParam]) -> fmt::Result {
    let params: Vec<String> = params.iter().map(ToString::to_string).collect();
    write!(f, "({})", params.join(", "))
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Placeholder(_) => f.write_str("?"),
            Arg::Expr(expr) => write!(f, "{expr}"),
            Arg::Dup { value, count, .. } => write!(f, "{value} $ {count}"),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            write!(f, "{arg}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Label(label) => write!(f, "{}{}", label.name, label.kind.marker()),
            Stmt::Define(define) => {
                write!(f, ".define {}", define.name)?;
                if let Some(params) = &define.params {
                    write_params(f, params)?;
                }
                write!(f, " = {}", render(&define.body))
            }
            Stmt::Macro(def) => {
                write!(f, ".macro {}", def.name)?;
                write_params(f, &def.params)?;
                write!(f, " [{} line(s)]", def.body.len())
            }
            Stmt::Directive(directive) => write!(f, "{directive}"),
            Stmt::Expr(expr) => write!(f, "{expr}"),
        }
    }
}
