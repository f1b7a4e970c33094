// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Statement driver for one compilation unit.
//!
//! Reads token-tree lines, records labels and scopes, handles the core
//! directives, expands macros and hands everything else to the parser.

use tracing::{debug, trace, warn};

use crate::core::error::{Error, ScopeError, SyntaxError};
use crate::core::macro_processor::{MacroDef, MacroTable, DEFAULT_MAX_DEPTH};
use crate::core::parser::{
    parse_define, parse_macro_header, parse_scope_name, split_label, Block, BlockHost,
    CoreDirective, Directive, Label, MacroDefinition, Parser, Stmt,
};
use crate::core::scope::{ScopeKind, ScopeStack};
use crate::core::signedness::{Signedness, SignednessContext};
use crate::core::symbol_table::{LabelEntry, LabelTable, ScopeTable, SymbolTableResult};
use crate::core::token_tree::{
    split_statements, trees_span, Delimiter, Group, Line, Lines, TokenTree,
};
use crate::core::tokenizer::Span;

/// What to do when a statement fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recovery {
    /// Return the first error.
    #[default]
    StopAtFirst,
    /// Record the error, drop the statement and carry on with the next one.
    NextStatement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontendConfig {
    pub max_expansion_depth: usize,
    pub recovery: Recovery,
    pub default_signedness: Signedness,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            max_expansion_depth: DEFAULT_MAX_DEPTH,
            recovery: Recovery::default(),
            default_signedness: Signedness::default(),
        }
    }
}

impl FrontendConfig {
    #[must_use]
    pub fn with_max_expansion_depth(mut self, depth: usize) -> Self {
        self.max_expansion_depth = depth;
        self
    }

    #[must_use]
    pub fn with_recovery(mut self, recovery: Recovery) -> Self {
        self.recovery = recovery;
        self
    }

    #[must_use]
    pub fn with_default_signedness(mut self, signedness: Signedness) -> Self {
        self.default_signedness = signedness;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub module: Module,
    pub scopes: ScopeTable,
    /// Errors recorded in [`Recovery::NextStatement`] mode.
    pub errors: Vec<Error>,
}

type LineSource<'s> = dyn Iterator<Item = Result<Line, Error>> + 's;

pub struct Frontend {
    config: FrontendConfig,
    macros: MacroTable,
    scopes: ScopeStack,
    labels: LabelTable,
    ctx: SignednessContext,
    depth: usize,
    errors: Vec<Error>,
}

impl Frontend {
    pub fn new(config: FrontendConfig) -> Self {
        Self {
            config,
            macros: MacroTable::new().with_max_depth(config.max_expansion_depth),
            scopes: ScopeStack::new(),
            labels: LabelTable::new(),
            ctx: SignednessContext::new(config.default_signedness),
            depth: 0,
            errors: Vec::new(),
        }
    }

    /// Process a whole source text.
    pub fn process(mut self, source: &str) -> Result<Output, Error> {
        let mut stmts = Vec::new();
        let mut lines = Lines::new(source);
        self.run_lines(&mut lines, &mut stmts)?;
        for err in self.scopes.close_all() {
            self.record(err.into())?;
        }
        debug!(
            statements = stmts.len(),
            errors = self.errors.len(),
            "unit finished"
        );
        Ok(Output {
            module: Module { stmts },
            scopes: ScopeTable {
                scopes: self.scopes.into_records(),
                labels: self.labels,
            },
            errors: self.errors,
        })
    }

    fn record(&mut self, err: Error) -> Result<(), Error> {
        match self.config.recovery {
            Recovery::StopAtFirst => Err(err),
            Recovery::NextStatement => {
                let span = err.span();
                warn!(line = span.line, column = span.column, error = %err, "statement dropped");
                self.errors.push(err);
                Ok(())
            }
        }
    }

    fn run_lines(&mut self, source: &mut LineSource<'_>, out: &mut Vec<Stmt>) -> Result<(), Error> {
        while let Some(line) = source.next() {
            let result = line.and_then(|line| self.process_line(&line, source, out));
            if let Err(err) = result {
                self.record(err)?;
            }
        }
        Ok(())
    }

    fn process_line(
        &mut self,
        line: &[TokenTree],
        source: &mut LineSource<'_>,
        out: &mut Vec<Stmt>,
    ) -> Result<(), Error> {
        let mut rest = line;
        while let Some((mut label, tail)) = split_label(rest) {
            self.declare_label(&mut label)?;
            out.push(Stmt::Label(label));
            rest = tail;
        }
        if rest.is_empty() {
            return Ok(());
        }
        let span = trees_span(rest).unwrap_or_default();
        let head_call = self.expand_head_call(rest)?;
        if let Some(expanded) = &head_call {
            rest = expanded.as_slice();
            if rest.is_empty() {
                return Ok(());
            }
        }

        match CoreDirective::at_head(rest) {
            Some(CoreDirective::Define) => {
                let define = parse_define(rest)?;
                self.macros.define(MacroDef::from_define(&define))?;
                out.push(Stmt::Define(define));
            }
            Some(CoreDirective::Macro) => {
                let def = self.collect_macro(rest, source)?;
                self.macros.define(MacroDef::from_macro(&def))?;
                out.push(Stmt::Macro(def));
            }
            Some(CoreDirective::Block) => {
                let name = parse_scope_name(rest)?;
                let directive = self.plain_directive(rest)?;
                self.scopes
                    .push(name.as_ref().map(|(name, _)| name.as_str()), ScopeKind::Block, span);
                out.push(Stmt::Directive(directive));
            }
            Some(CoreDirective::End) => {
                let name = parse_scope_name(rest)?;
                let directive = self.plain_directive(rest)?;
                let current = self.scopes.record(self.scopes.current());
                if matches!(
                    current.map(|record| record.kind),
                    Some(ScopeKind::Brace | ScopeKind::MacroBody)
                ) {
                    return Err(ScopeError::UnmatchedEnd { span }.into());
                }
                self.scopes
                    .pop(name.as_ref().map(|(name, _)| name.as_str()), span)?;
                out.push(Stmt::Directive(directive));
            }
            Some(
                directive @ (CoreDirective::Nop | CoreDirective::Signed | CoreDirective::Unsigned),
            ) => {
                if let Some(extra) = rest.get(1) {
                    return Err(SyntaxError::TrailingTokens {
                        found: extra.to_string(),
                        span: extra.span(),
                    }
                    .into());
                }
                match directive {
                    CoreDirective::Signed => self.ctx.set_default(Signedness::Signed),
                    CoreDirective::Unsigned => self.ctx.set_default(Signedness::Unsigned),
                    _ => {}
                }
                out.push(Stmt::Directive(self.plain_directive(rest)?));
            }
            None => self.process_statement(rest, span, head_call.is_some(), out)?,
        }
        Ok(())
    }

    /// Expand a function-like `.define` call that opens a statement. The
    /// whole statement is expanded with it.
    fn expand_head_call(&self, trees: &[TokenTree]) -> Result<Option<Vec<TokenTree>>, Error> {
        let is_call = match trees {
            [head, TokenTree::Group(group), ..] if group.delimiter == Delimiter::Paren => head
                .ident()
                .and_then(|name| self.macros.lookup_define(name))
                .is_some_and(|def| def.function_like),
            _ => false,
        };
        if !is_call {
            return Ok(None);
        }
        let expanded = self.macros.expand_trees(trees, self.ctx, self.depth)?;
        Ok(Some(expanded))
    }

    /// Expand macros in a non-core statement and parse it, or run it as a
    /// statement macro when its head names one.
    fn process_statement(
        &mut self,
        trees: &[TokenTree],
        span: Span,
        head_expanded: bool,
        out: &mut Vec<Stmt>,
    ) -> Result<(), Error> {
        let Some((head, tail)) = trees.split_first() else {
            return Ok(());
        };
        let tail = if head_expanded {
            tail.to_vec()
        } else {
            self.macros.expand_trees(tail, self.ctx, self.depth)?
        };

        if let Some(def) = head.ident().and_then(|name| self.macros.lookup_macro(name)) {
            let def = def.clone();
            return self.invoke(&def, &tail, span, out);
        }

        let mut expanded = Vec::with_capacity(tail.len() + 1);
        if head_expanded || head.ident().is_some() {
            expanded.push(head.clone());
        } else {
            expanded.extend(
                self.macros
                    .expand_trees(std::slice::from_ref(head), self.ctx, self.depth)?,
            );
        }
        expanded.extend(tail);

        let ctx = self.ctx;
        let stmt = Parser::new(&expanded, ctx)
            .with_host(self)
            .parse_statement()?;
        out.push(stmt);
        Ok(())
    }

    /// Run one statement macro invocation inside its own scope.
    fn invoke(
        &mut self,
        def: &MacroDef,
        args: &[TokenTree],
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> Result<(), Error> {
        let lines = self
            .macros
            .instantiate(def, args, span, self.ctx, self.depth)?;
        self.scopes.push_named(&def.name, ScopeKind::MacroBody, span);
        self.depth += 1;
        let mut source = lines.into_iter().map(Ok::<Line, Error>);
        let result = self.run_lines(&mut source, out);
        self.depth -= 1;
        let closed = self.scopes.pop_kind(ScopeKind::MacroBody, span);
        result?;
        closed?;
        Ok(())
    }

    /// Collect the body of a `.macro` up to its matching `.end`.
    fn collect_macro(
        &mut self,
        line: &[TokenTree],
        source: &mut LineSource<'_>,
    ) -> Result<MacroDefinition, Error> {
        let header = parse_macro_header(line)?;
        let body = self.collect_body(&header.name, header.span, source)?;
        Ok(MacroDefinition {
            name: header.name,
            params: header.params,
            body,
            span: header.span,
        })
    }

    /// Nested `.macro` and `.block` lines are counted so that their `.end`
    /// lines are not taken as the end of this body. A line that fails to
    /// group is left out of the body.
    fn collect_body(
        &mut self,
        name: &str,
        span: Span,
        source: &mut LineSource<'_>,
    ) -> Result<Vec<Line>, Error> {
        let mut body = Vec::new();
        let mut nesting = 0usize;
        while let Some(line) = source.next() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    self.record(err)?;
                    continue;
                }
            };
            let mut rest: &[TokenTree] = &line;
            while let Some((_, tail)) = split_label(rest) {
                rest = tail;
            }
            match CoreDirective::at_head(rest) {
                Some(CoreDirective::Macro | CoreDirective::Block) => nesting += 1,
                Some(CoreDirective::End) if nesting == 0 => {
                    if let Some((found, found_span)) = parse_scope_name(rest)? {
                        if found != name {
                            return Err(ScopeError::Mismatch {
                                expected: name.to_string(),
                                found,
                                span: found_span,
                            }
                            .into());
                        }
                    }
                    return Ok(body);
                }
                Some(CoreDirective::End) => nesting -= 1,
                _ => {}
            }
            body.push(line);
        }
        Err(ScopeError::Unclosed {
            name: name.to_string(),
            span,
        }
        .into())
    }

    fn declare_label(&mut self, label: &mut Label) -> Result<(), Error> {
        label.scope = self.scopes.current();
        let entry = LabelEntry {
            name: label.name.clone(),
            kind: label.kind,
            scope: label.scope,
            span: label.span,
        };
        if self.labels.add(entry) == SymbolTableResult::Duplicate {
            let previous = self
                .labels
                .entry(&label.name, label.scope)
                .map_or(label.span, |entry| entry.span);
            return Err(ScopeError::DuplicateLabel {
                name: label.name.clone(),
                span: label.span,
                previous,
            }
            .into());
        }
        trace!(label = %label.name, kind = ?label.kind, scope = label.scope.0, "label recorded");
        Ok(())
    }

    fn plain_directive(&self, trees: &[TokenTree]) -> Result<Directive, Error> {
        Parser::new(trees, self.ctx).parse_directive()
    }
}

impl BlockHost for Frontend {
    fn parse_block(&mut self, group: &Group, ctx: SignednessContext) -> Result<Block, Error> {
        let outer = std::mem::replace(&mut self.ctx, ctx);
        let scope = self.scopes.push_anonymous(ScopeKind::Brace, group.open);
        let mut stmts = Vec::new();
        let mut lines = split_statements(&group.trees)
            .into_iter()
            .map(Ok::<Line, Error>);
        let result = self.run_lines(&mut lines, &mut stmts);
        let closed = self.scopes.pop_kind(ScopeKind::Brace, group.close);
        self.ctx = outer;
        result?;
        closed?;
        Ok(Block {
            stmts,
            scope: Some(scope),
        })
    }
}

/// Process `source` with `config`.
pub fn process(source: &str, config: FrontendConfig) -> Result<Output, Error> {
    Frontend::new(config).process(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::MacroError;
    use crate::core::parser::{Expr, LabelKind};
    use crate::core::scope::ScopeId;

    fn run(source: &str) -> Output {
        process(source, FrontendConfig::default()).expect("process")
    }

    fn rendered(output: &Output) -> Vec<String> {
        output.module.stmts.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn emits_statements_in_order() {
        let output = run("start: lda 1\n.byte 1, 2\nx = 3");
        assert_eq!(output.module.stmts.len(), 4);
        assert!(matches!(output.module.stmts[0], Stmt::Label(_)));
        assert!(matches!(output.module.stmts[3], Stmt::Expr(Expr::Infix { .. })));
        assert!(output.errors.is_empty());
    }

    #[test]
    fn expands_defines_outside_the_head() {
        let output = run(".define N = 4\n.byte N * 2\nN = 1");
        let text = rendered(&output);
        assert_eq!(text[1], ".byte (4 * 2)");
        assert_eq!(text[2], "(N = 1)");
    }

    #[test]
    fn expands_function_like_define_at_the_head() {
        let output = run(".define SET(r) = r = 0\nSET(x)\n.define F(a) = a\nF(1) + 2");
        let text = rendered(&output);
        assert_eq!(text[1], "(x = 0)");
        assert_eq!(text[3], "(1 + 2)");
    }

    #[test]
    fn head_call_may_expand_to_a_core_directive() {
        let output = run(".define BLK(n) = .block n\nBLK(outer)\nnop\n.end outer");
        assert_eq!(rendered(&output)[1..], [".block outer", "nop", ".end outer"]);
        assert_eq!(output.scopes.scopes.len(), 2);
    }

    #[test]
    fn signedness_directives_change_the_ambient_default() {
        let output = run(".unsigned\nx = a / b\n.signed\ny = a / b");
        let signedness: Vec<_> = output
            .module
            .stmts
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Expr(Expr::Infix { rhs, .. }) => match rhs.as_ref() {
                    Expr::Infix { signedness, .. } => *signedness,
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert_eq!(signedness, vec![Signedness::Unsigned, Signedness::Signed]);
    }

    #[test]
    fn core_directives_reject_arguments() {
        let err = process(".nop 1", FrontendConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Syntax(SyntaxError::TrailingTokens { .. })));
    }

    #[test]
    fn end_does_not_close_implicit_scopes() {
        let err = process("x = {\n.end\n}", FrontendConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Scope(ScopeError::UnmatchedEnd { .. })));

        let source = ".macro m\n.block inner\n.end inner\n.end\nm";
        assert!(process(source, FrontendConfig::default()).is_ok());
    }

    #[test]
    fn labels_are_recorded_in_their_scope() {
        let output = run("a:\n.block outer\n.b:\nc:?\n.end outer");
        let labels = output.scopes.labels.entries();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0].scope, ScopeId::TOP_LEVEL);
        assert_eq!(labels[1].kind, LabelKind::Local);
        assert_ne!(labels[1].scope, ScopeId::TOP_LEVEL);
        assert_eq!(output.scopes.path(labels[2].scope), "outer");
    }

    #[test]
    fn duplicate_label_reports_previous_declaration() {
        let err = process("a:\na:", FrontendConfig::default()).unwrap_err();
        match err {
            Error::Scope(ScopeError::DuplicateLabel { span, previous, .. }) => {
                assert_eq!(previous.line, 1);
                assert_eq!(span.line, 2);
            }
            other => panic!("Expected duplicate label, got {other:?}"),
        }
    }

    #[test]
    fn brace_blocks_open_their_own_scope() {
        let output = run("x = { a: 1 }\na:");
        let Stmt::Expr(Expr::Infix { rhs, .. }) = &output.module.stmts[0] else {
            panic!("Expected assignment");
        };
        let Expr::Block { block, .. } = rhs.as_ref() else {
            panic!("Expected block");
        };
        assert!(block.scope.is_some());
        assert_eq!(output.scopes.labels.len(), 2);
    }

    #[test]
    fn macro_definition_collects_nested_blocks() {
        let output = run(".macro m\n.block\nnop\n.end\n.end m\nm");
        let Stmt::Macro(def) = &output.module.stmts[0] else {
            panic!("Expected macro definition");
        };
        assert_eq!(def.body.len(), 3);
        let text = rendered(&output);
        assert_eq!(text[1..], [".block", "nop", ".end"]);
    }

    #[test]
    fn macro_definition_opens_no_scopes() {
        let output = run(".macro m\n.block inner\nnop\n.end inner\n.end m");
        assert_eq!(output.scopes.scopes.len(), 1);
        let output = run(".macro m\n.block inner\nnop\n.end inner\n.end m\nm");
        assert_eq!(output.scopes.scopes.len(), 3);
    }

    #[test]
    fn macro_body_survives_a_line_that_fails_to_group() {
        let config = FrontendConfig::default().with_recovery(Recovery::NextStatement);
        let output = process(".macro m\n.byte 1 )\nnop\n.end m\nm", config).expect("process");
        assert_eq!(output.errors.len(), 1);
        assert!(matches!(
            output.errors[0],
            Error::Syntax(SyntaxError::UnmatchedDelimiter { delimiter: ')', .. })
        ));
        assert_eq!(rendered(&output)[1..], ["nop"]);

        let err = process(".macro m\n.byte 1 )\n.end m", FrontendConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Syntax(SyntaxError::UnmatchedDelimiter { .. })));
    }

    #[test]
    fn macro_end_name_must_match() {
        let err = process(".macro m\nnop\n.end n", FrontendConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Scope(ScopeError::Mismatch { .. })));
    }

    #[test]
    fn unterminated_macro_is_unclosed() {
        let err = process(".macro m\nnop", FrontendConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Scope(ScopeError::Unclosed { ref name, .. }) if name == "m"));
    }

    #[test]
    fn recursive_statement_macro_hits_the_depth_limit() {
        let config = FrontendConfig::default().with_max_expansion_depth(5);
        let err = process(".macro r\nr\n.end\nr", config).unwrap_err();
        assert!(matches!(
            err,
            Error::Macro(MacroError::RecursionLimit { limit: 5, .. })
        ));
    }

    #[test]
    fn recovery_collects_errors_and_keeps_good_statements() {
        let config = FrontendConfig::default().with_recovery(Recovery::NextStatement);
        let output = process(".byte 1 +\n.byte 2\n.end\n.block", config).expect("process");
        assert_eq!(output.errors.len(), 3);
        assert!(matches!(output.errors[1], Error::Scope(ScopeError::UnmatchedEnd { .. })));
        assert!(matches!(output.errors[2], Error::Scope(ScopeError::Unclosed { .. })));
        let text = rendered(&output);
        assert_eq!(text, vec![".byte 2", ".block"]);
    }
}
