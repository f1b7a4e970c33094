// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Macro table and expansion for `.define` and `.macro` definitions.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::core::error::{Error, MacroError};
use crate::core::expr::{eval_expr, NoSymbols};
use crate::core::parser::{parse_expr, Define, MacroDefinition, MacroParam};
use crate::core::signedness::SignednessContext;
use crate::core::token_tree::{
    split_args, trees_span, Argument, Delimiter, Group, Line, TokenTree,
};
use crate::core::tokenizer::{OperatorKind, Span, Token, TokenKind};

pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroKind {
    /// `.define`, expanded inside statements.
    Define,
    /// `.macro`, invoked as a statement.
    Macro,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MacroBody {
    Tokens(Vec<TokenTree>),
    Statements(Vec<Line>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacroDef {
    pub name: String,
    pub kind: MacroKind,
    /// Invoked with a parenthesised argument list.
    pub function_like: bool,
    pub params: Vec<MacroParam>,
    pub body: MacroBody,
    pub span: Span,
}

impl MacroDef {
    pub fn from_define(define: &Define) -> Self {
        Self {
            name: define.name.clone(),
            kind: MacroKind::Define,
            function_like: define.params.is_some(),
            params: define.params.clone().unwrap_or_default(),
            body: MacroBody::Tokens(define.body.clone()),
            span: define.span,
        }
    }

    pub fn from_macro(def: &MacroDefinition) -> Self {
        Self {
            name: def.name.clone(),
            kind: MacroKind::Macro,
            function_like: false,
            params: def.params.clone(),
            body: MacroBody::Statements(def.body.clone()),
            span: def.span,
        }
    }

    fn tokens(&self) -> &[TokenTree] {
        match &self.body {
            MacroBody::Tokens(trees) => trees,
            MacroBody::Statements(_) => &[],
        }
    }

    fn lines(&self) -> &[Line] {
        match &self.body {
            MacroBody::Tokens(_) => &[],
            MacroBody::Statements(lines) => lines,
        }
    }

    fn expected_arity(&self) -> String {
        let required = self.params.iter().filter(|p| p.is_required()).count();
        let max = self.params.iter().filter(|p| !p.variadic).count();
        if self.params.iter().any(|p| p.variadic) {
            format!("at least {required}")
        } else if required == max {
            required.to_string()
        } else {
            format!("{required}..{max}")
        }
    }
}

/// Values bound to parameter names for one invocation.
pub type Bindings = HashMap<String, Vec<TokenTree>>;

/// Definitions of one compilation unit.
///
/// `.define` and `.macro` names live in separate namespaces. Definitions are
/// never replaced or mutated once added.
#[derive(Debug, Clone)]
pub struct MacroTable {
    defines: HashMap<String, Rc<MacroDef>>,
    macros: HashMap<String, Rc<MacroDef>>,
    max_depth: usize,
}

impl Default for MacroTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroTable {
    pub fn new() -> Self {
        Self {
            defines: HashMap::new(),
            macros: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn define(&mut self, def: MacroDef) -> Result<Rc<MacroDef>, MacroError> {
        validate_params(&def)?;
        let namespace = match def.kind {
            MacroKind::Define => &mut self.defines,
            MacroKind::Macro => &mut self.macros,
        };
        if let Some(previous) = namespace.get(&def.name) {
            return Err(MacroError::DuplicateDefinition {
                name: def.name.clone(),
                span: def.span,
                previous: previous.span,
            });
        }
        debug!(
            name = %def.name,
            kind = ?def.kind,
            params = def.params.len(),
            "macro defined"
        );
        let def = Rc::new(def);
        namespace.insert(def.name.clone(), Rc::clone(&def));
        Ok(def)
    }

    pub fn lookup_define(&self, name: &str) -> Option<&Rc<MacroDef>> {
        self.defines.get(name)
    }

    pub fn lookup_macro(&self, name: &str) -> Option<&Rc<MacroDef>> {
        self.macros.get(name)
    }

    pub fn get_define(&self, name: &str, span: Span) -> Result<Rc<MacroDef>, MacroError> {
        self.lookup_define(name)
            .cloned()
            .ok_or_else(|| unknown(name, span))
    }

    pub fn get_macro(&self, name: &str, span: Span) -> Result<Rc<MacroDef>, MacroError> {
        self.lookup_macro(name)
            .cloned()
            .ok_or_else(|| unknown(name, span))
    }

    /// Bind call arguments to the parameters of `def`.
    ///
    /// Positional arguments fill parameters in order, skipping any already
    /// bound by name; an empty one leaves its parameter to the default.
    /// Leftovers go to the variadic parameter together with the commas
    /// between them. A `name = value` argument whose name is not a fixed
    /// parameter is one of those leftovers when the definition is variadic.
    /// Eager values are expanded and folded here.
    pub fn bind_arguments(
        &self,
        def: &MacroDef,
        args: &[TokenTree],
        span: Span,
        ctx: SignednessContext,
        depth: usize,
    ) -> Result<Bindings, Error> {
        let arguments = split_args(args);
        let fixed = def.params.iter().take_while(|p| !p.variadic).count();
        let variadic = def.params.iter().position(|p| p.variadic);
        let mut bound: Vec<Option<Vec<TokenTree>>> = vec![None; def.params.len()];
        let mut leftovers: Vec<&Argument> = Vec::new();
        let mut next = 0;

        for arg in &arguments {
            if let Some((param, value)) = named_argument(&arg.trees) {
                match def.params[..fixed].iter().position(|p| p.name == param.text) {
                    Some(index) if bound[index].is_some() => {
                        return Err(MacroError::DuplicateArgument {
                            name: def.name.clone(),
                            param: param.text.clone(),
                            span: param.span,
                        }
                        .into());
                    }
                    Some(index) => {
                        bound[index] = Some(value.to_vec());
                        continue;
                    }
                    // Passed on positionally when there is a variadic parameter.
                    None if variadic.is_some() => {}
                    None => {
                        return Err(MacroError::UnknownParameter {
                            name: def.name.clone(),
                            param: param.text.clone(),
                            span: param.span,
                        }
                        .into());
                    }
                }
            }
            while next < fixed && bound[next].is_some() {
                next += 1;
            }
            if next < fixed {
                if !arg.trees.is_empty() {
                    bound[next] = Some(arg.trees.clone());
                }
                next += 1;
            } else {
                leftovers.push(arg);
            }
        }

        let arity_error = || MacroError::Arity {
            name: def.name.clone(),
            expected: def.expected_arity(),
            found: arguments.len(),
            span,
        };
        match variadic {
            Some(index) => bound[index] = Some(join_arguments(&leftovers)),
            None if leftovers.iter().any(|arg| !arg.trees.is_empty()) => {
                return Err(arity_error().into());
            }
            None => {}
        }

        let mut bindings = Bindings::with_capacity(def.params.len());
        for (param, value) in def.params.iter().zip(bound) {
            let value = match (value, &param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => default.clone(),
                (None, None) => return Err(arity_error().into()),
            };
            let value = if param.eager {
                self.evaluate_eager(&value, span, ctx, depth)?
            } else {
                value
            };
            bindings.insert(param.name.clone(), value);
        }
        Ok(bindings)
    }

    /// Expand, parse and fold an eager argument.
    ///
    /// A constant becomes a single integer literal, or `(-n)` when negative.
    /// An expression that does not fold is substituted as a parenthesised
    /// group. One that does not parse is an error.
    fn evaluate_eager(
        &self,
        trees: &[TokenTree],
        span: Span,
        ctx: SignednessContext,
        depth: usize,
    ) -> Result<Vec<TokenTree>, Error> {
        let expanded = self.expand_trees(trees, ctx, depth)?;
        let expr = parse_expr(&expanded, ctx)?;
        let span = trees_span(&expanded).unwrap_or(span);
        Ok(match eval_expr(&expr, &NoSymbols) {
            Ok(value) => integer_trees(value, span),
            Err(_) => vec![paren_group(expanded, span)],
        })
    }

    /// Expand function-like macros in `trees` until none remain.
    ///
    /// Each nested expansion counts one level against the depth limit. Trees
    /// with no invocations come back unchanged.
    pub fn expand_trees(
        &self,
        trees: &[TokenTree],
        ctx: SignednessContext,
        depth: usize,
    ) -> Result<Vec<TokenTree>, Error> {
        let mut out = Vec::with_capacity(trees.len());
        let mut index = 0;
        while let Some(tree) = trees.get(index) {
            index += 1;
            let token = match tree {
                TokenTree::Token(token) => token,
                TokenTree::Group(group) => {
                    out.push(TokenTree::Group(Group {
                        delimiter: group.delimiter,
                        open: group.open,
                        close: group.close,
                        trees: self.expand_trees(&group.trees, ctx, depth)?,
                    }));
                    continue;
                }
            };
            let Some(def) = token.ident().and_then(|name| self.defines.get(name)) else {
                out.push(tree.clone());
                continue;
            };
            let call = if def.function_like {
                match trees.get(index) {
                    Some(TokenTree::Group(group)) if group.delimiter == Delimiter::Paren => {
                        index += 1;
                        Some(group)
                    }
                    _ => {
                        out.push(tree.clone());
                        continue;
                    }
                }
            } else {
                None
            };
            if depth >= self.max_depth {
                return Err(self.recursion_limit(def, token.span).into());
            }

            let span = call.map_or(token.span, |group| token.span.to(group.close));
            let args = call.map_or(&[][..], |group| group.trees.as_slice());
            let bindings = self.bind_arguments(def, args, span, ctx, depth)?;
            let body = substitute(def.tokens(), &bindings);
            debug!(name = %def.name, depth = depth + 1, "macro expanded");
            out.extend(self.expand_trees(&body, ctx, depth + 1)?);
        }
        Ok(out)
    }

    /// Body lines of a statement macro with its arguments substituted.
    ///
    /// `args` is the rest of the invoking statement; a single parenthesised
    /// group is taken as the argument list.
    pub fn instantiate(
        &self,
        def: &MacroDef,
        args: &[TokenTree],
        span: Span,
        ctx: SignednessContext,
        depth: usize,
    ) -> Result<Vec<Line>, Error> {
        if depth >= self.max_depth {
            return Err(self.recursion_limit(def, span).into());
        }
        let args = match args {
            [TokenTree::Group(group)] if group.delimiter == Delimiter::Paren => {
                group.trees.as_slice()
            }
            _ => args,
        };
        let bindings = self.bind_arguments(def, args, span, ctx, depth)?;
        debug!(name = %def.name, depth = depth + 1, "macro expanded");
        Ok(def
            .lines()
            .iter()
            .map(|line| substitute(line, &bindings))
            .collect())
    }

    fn recursion_limit(&self, def: &MacroDef, span: Span) -> MacroError {
        MacroError::RecursionLimit {
            name: def.name.clone(),
            limit: self.max_depth,
            span,
        }
    }
}

fn unknown(name: &str, span: Span) -> MacroError {
    MacroError::UnknownMacro {
        name: name.to_string(),
        span,
    }
}

fn validate_params(def: &MacroDef) -> Result<(), MacroError> {
    for (i, param) in def.params.iter().enumerate() {
        if def.params[..i].iter().any(|p| p.name == param.name) {
            return Err(MacroError::DuplicateParameter {
                name: def.name.clone(),
                param: param.name.clone(),
                span: param.span,
            });
        }
        if param.variadic && i + 1 != def.params.len() {
            return Err(MacroError::NonFinalVariadic {
                name: def.name.clone(),
                param: param.name.clone(),
                span: param.span,
            });
        }
    }
    Ok(())
}

/// `name = tokens`
fn named_argument(trees: &[TokenTree]) -> Option<(&Token, &[TokenTree])> {
    match trees {
        [TokenTree::Token(name), TokenTree::Token(eq), value @ ..]
            if name.ident().is_some() && eq.is_operator(OperatorKind::Assign) =>
        {
            Some((name, value))
        }
        _ => None,
    }
}

fn join_arguments(args: &[&Argument]) -> Vec<TokenTree> {
    let mut out = Vec::new();
    for (i, arg) in args.iter().enumerate() {
        out.extend(arg.trees.iter().cloned());
        if i + 1 < args.len() {
            if let Some(comma) = &arg.separator {
                out.push(TokenTree::Token(comma.clone()));
            }
        }
    }
    out
}

/// Replace parameter names with their bound values, inside groups too.
pub fn substitute(trees: &[TokenTree], bindings: &Bindings) -> Vec<TokenTree> {
    let mut out = Vec::with_capacity(trees.len());
    for tree in trees {
        match tree {
            TokenTree::Token(token) => match token.ident().and_then(|name| bindings.get(name)) {
                Some(value) => out.extend(value.iter().cloned()),
                None => out.push(tree.clone()),
            },
            TokenTree::Group(group) => out.push(TokenTree::Group(Group {
                delimiter: group.delimiter,
                open: group.open,
                close: group.close,
                trees: substitute(&group.trees, bindings),
            })),
        }
    }
    out
}

fn integer_trees(value: i64, span: Span) -> Vec<TokenTree> {
    let literal = TokenTree::Token(Token::synthetic(
        TokenKind::Int(value.unsigned_abs()),
        span,
    ));
    if value >= 0 {
        return vec![literal];
    }
    let minus = TokenTree::Token(Token::synthetic(
        TokenKind::Operator(OperatorKind::Minus),
        span,
    ));
    vec![paren_group(vec![minus, literal], span)]
}

fn paren_group(trees: Vec<TokenTree>, span: Span) -> TokenTree {
    TokenTree::Group(Group {
        delimiter: Delimiter::Paren,
        open: span,
        close: span.end_point(),
        trees,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::{parse_define, parse_macro_header};
    use crate::core::token_tree::{parse_lines, render};

    fn line(source: &str) -> Line {
        parse_lines(source).expect("lines").remove(0)
    }

    fn table(defines: &[&str]) -> MacroTable {
        let mut table = MacroTable::new();
        for source in defines {
            let define = parse_define(&line(source)).expect("define");
            table.define(MacroDef::from_define(&define)).expect("defined");
        }
        table
    }

    fn expand(table: &MacroTable, source: &str) -> Result<String, Error> {
        table
            .expand_trees(&line(source), SignednessContext::default(), 0)
            .map(|trees| render(&trees))
    }

    #[test]
    fn expands_object_like_define() {
        let table = table(&[".define PI = 3"]);
        assert_eq!(expand(&table, "PI * 2").expect("expand"), "3 * 2");
        assert_eq!(expand(&table, "(PI)").expect("expand"), "(3)");
    }

    #[test]
    fn eager_parameter_is_folded_before_substitution() {
        let table = table(&[".define f(!a, b) = a + b"]);
        assert_eq!(expand(&table, "f(1+1, x)").expect("expand"), "2 + x");
        assert_eq!(expand(&table, "f(0-3, x)").expect("expand"), "(- 3) + x");
    }

    #[test]
    fn eager_parameter_that_does_not_fold_stays_one_operand() {
        let table = table(&[".define g(!a) = a * 2"]);
        assert_eq!(expand(&table, "g(y + 1)").expect("expand"), "(y + 1) * 2");
    }

    #[test]
    fn eager_parameter_sees_other_defines() {
        let table = table(&[".define N = 4", ".define sq(!a) = a"]);
        assert_eq!(expand(&table, "sq(N * N)").expect("expand"), "16");
    }

    #[test]
    fn eager_argument_must_parse_even_when_unused() {
        let table = table(&[".define f(!a) = 1"]);
        let err = expand(&table, "f(1 +)").unwrap_err();
        assert!(matches!(err, Error::Syntax(_)), "Expected syntax error, got {err:?}");
        assert_eq!(expand(&table, "f(y)").expect("expand"), "1");
    }

    #[test]
    fn lazy_parameter_substitutes_raw_tokens() {
        let table = table(&[".define twice(a) = a + a"]);
        assert_eq!(
            expand(&table, "twice(1 + 2)").expect("expand"),
            "1 + 2 + 1 + 2"
        );
    }

    #[test]
    fn defaults_fill_omitted_parameters() {
        let table = table(&[".define h(a, b = 10) = a - b"]);
        assert_eq!(expand(&table, "h(1)").expect("expand"), "1 - 10");
        assert_eq!(expand(&table, "h(1, 2)").expect("expand"), "1 - 2");
        assert_eq!(expand(&table, "h(1, )").expect("expand"), "1 - 10");
    }

    #[test]
    fn binds_named_arguments() {
        let table = table(&[".define h(a, b = 10) = a - b"]);
        assert_eq!(expand(&table, "h(b = 5, a = 1)").expect("expand"), "1 - 5");
        assert_eq!(expand(&table, "h(b = 5, 1)").expect("expand"), "1 - 5");

        let err = expand(&table, "h(1, a = 2)").unwrap_err();
        assert!(matches!(
            err,
            Error::Macro(MacroError::DuplicateArgument { ref param, .. }) if param == "a"
        ));
        let err = expand(&table, "h(c = 1)").unwrap_err();
        assert!(matches!(
            err,
            Error::Macro(MacroError::UnknownParameter { ref param, .. }) if param == "c"
        ));
    }

    #[test]
    fn checks_arity() {
        let table = table(&[".define two(a, b) = a b"]);
        for source in ["two()", "two(1)", "two(1, 2, 3)"] {
            match expand(&table, source) {
                Err(Error::Macro(MacroError::Arity { expected, .. })) => assert_eq!(expected, "2"),
                other => panic!("Expected arity error for {source}, got {other:?}"),
            }
        }
        assert_eq!(expand(&table, "two(1, 2)").expect("expand"), "1 2");
    }

    #[test]
    fn arity_message_describes_optional_and_variadic_parameters() {
        let table = table(&[".define o(a, b = 1) = a", ".define v(a, *rest) = a"]);
        match expand(&table, "o()") {
            Err(Error::Macro(MacroError::Arity { expected, found, .. })) => {
                assert_eq!(expected, "1..2");
                assert_eq!(found, 0);
            }
            other => panic!("Expected arity error, got {other:?}"),
        }
        match expand(&table, "v()") {
            Err(Error::Macro(MacroError::Arity { expected, .. })) => {
                assert_eq!(expected, "at least 1");
            }
            other => panic!("Expected arity error, got {other:?}"),
        }
    }

    #[test]
    fn variadic_collects_trailing_arguments_with_commas() {
        let table = table(&[".define v(a, *rest) = a [rest]"]);
        assert_eq!(expand(&table, "v(1, 2, 3)").expect("expand"), "1 [2 , 3]");
        assert_eq!(expand(&table, "v(1)").expect("expand"), "1 []");
    }

    #[test]
    fn variadic_takes_unknown_named_arguments_as_values() {
        let table = table(&[".define v(a, *rest) = a [rest]"]);
        assert_eq!(
            expand(&table, "v(1, x = 2, 3)").expect("expand"),
            "1 [x = 2 , 3]"
        );
        assert_eq!(expand(&table, "v(a = 1, 2)").expect("expand"), "1 [2]");
    }

    #[test]
    fn rejects_malformed_parameter_lists() {
        let mut table = MacroTable::new();
        let define = parse_define(&line(".define bad(*a, b) = a")).expect("define");
        assert!(matches!(
            table.define(MacroDef::from_define(&define)),
            Err(MacroError::NonFinalVariadic { ref param, .. }) if param == "a"
        ));
        let define = parse_define(&line(".define dup(a, a) = a")).expect("define");
        assert!(matches!(
            table.define(MacroDef::from_define(&define)),
            Err(MacroError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn redefinition_reports_both_spans() {
        let mut table = table(&[".define X = 1"]);
        let define = parse_define(&line("\n.define X = 2")).expect("define");
        match table.define(MacroDef::from_define(&define)) {
            Err(MacroError::DuplicateDefinition { span, previous, .. }) => {
                assert_eq!(previous.line, 1);
                assert_eq!(span.line, 2);
            }
            other => panic!("Expected duplicate definition, got {other:?}"),
        }
    }

    #[test]
    fn defines_and_macros_use_separate_namespaces() {
        let mut table = table(&[".define m = 1"]);
        let header = parse_macro_header(&line(".macro m")).expect("header");
        let def = MacroDefinition {
            name: header.name,
            params: header.params,
            body: Vec::new(),
            span: header.span,
        };
        assert!(table.define(MacroDef::from_macro(&def)).is_ok());
        assert!(table.get_macro("m", Span::default()).is_ok());
        assert!(matches!(
            table.get_define("n", Span::default()),
            Err(MacroError::UnknownMacro { .. })
        ));
    }

    #[test]
    fn function_like_name_without_call_is_left_alone() {
        let table = table(&[".define f(a) = a"]);
        assert_eq!(expand(&table, "f + 1").expect("expand"), "f + 1");
    }

    #[test]
    fn self_reference_hits_the_depth_limit() {
        let table = table(&[".define loop = loop + 1"]).with_max_depth(8);
        match expand(&table, "loop") {
            Err(Error::Macro(MacroError::RecursionLimit { name, limit, .. })) => {
                assert_eq!(name, "loop");
                assert_eq!(limit, 8);
            }
            other => panic!("Expected recursion limit, got {other:?}"),
        }
    }

    #[test]
    fn expansion_is_idempotent() {
        let table = table(&[".define f(a) = a * 2"]);
        let input = line("a + (b * c)");
        let once = table
            .expand_trees(&input, SignednessContext::default(), 0)
            .expect("expand");
        assert_eq!(once, input);

        let expanded = table
            .expand_trees(&line("f(x) + 1"), SignednessContext::default(), 0)
            .expect("expand");
        let again = table
            .expand_trees(&expanded, SignednessContext::default(), 0)
            .expect("expand");
        assert_eq!(again, expanded);
    }

    #[test]
    fn instantiates_statement_macro_lines() {
        let header = parse_macro_header(&line(".macro store addr, val = 0")).expect("header");
        let def = MacroDef::from_macro(&MacroDefinition {
            name: header.name,
            params: header.params,
            body: parse_lines("lda val\nsta addr").expect("body"),
            span: header.span,
        });
        let table = MacroTable::new();
        let lines = table
            .instantiate(
                &def,
                &line("x'10"),
                Span::default(),
                SignednessContext::default(),
                0,
            )
            .expect("instantiate");
        let rendered: Vec<String> = lines.iter().map(|l| render(l)).collect();
        assert_eq!(rendered, vec!["lda 0", "sta x'10"]);

        let err = table
            .instantiate(&def, &[], Span::default(), SignednessContext::default(), 0)
            .unwrap_err();
        assert!(matches!(err, Error::Macro(MacroError::Arity { .. })));
    }
}
