// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Lexical scope stack for `.block`, `{ }` and macro bodies.
//!
//! Every scope ever opened is kept as a [`ScopeRecord`] so labels can refer
//! to it by [`ScopeId`] after it closes. Scope 0 is the top level and is
//! never popped.

use tracing::trace;

use crate::core::error::ScopeError;
use crate::core::tokenizer::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub usize);

impl ScopeId {
    pub const TOP_LEVEL: ScopeId = ScopeId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    TopLevel,
    /// `.block` ... `.end`
    Block,
    /// `{ }` expression block.
    Brace,
    /// One invocation of a statement macro, or a macro body being defined.
    MacroBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRecord {
    pub id: ScopeId,
    pub name: Option<String>,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub span: Span,
}

impl ScopeRecord {
    /// Name used in diagnostics.
    pub fn display_name(&self) -> String {
        match (&self.name, self.kind) {
            (Some(name), _) => name.clone(),
            (None, ScopeKind::TopLevel) => "<top level>".to_string(),
            (None, ScopeKind::Block) => "<block>".to_string(),
            (None, ScopeKind::Brace) => "<brace block>".to_string(),
            (None, ScopeKind::MacroBody) => "<macro body>".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScopeStack {
    records: Vec<ScopeRecord>,
    open: Vec<ScopeId>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: vec![ScopeRecord {
                id: ScopeId::TOP_LEVEL,
                name: None,
                kind: ScopeKind::TopLevel,
                parent: None,
                span: Span::default(),
            }],
            open: vec![ScopeId::TOP_LEVEL],
        }
    }

    pub fn push(&mut self, name: Option<&str>, kind: ScopeKind, span: Span) -> ScopeId {
        let id = ScopeId(self.records.len());
        let parent = self.current();
        self.records.push(ScopeRecord {
            id,
            name: name.map(str::to_string),
            kind,
            parent: Some(parent),
            span,
        });
        self.open.push(id);
        trace!(scope = id.0, name = ?name, kind = ?kind, depth = self.depth(), "scope opened");
        id
    }

    pub fn push_named(&mut self, name: &str, kind: ScopeKind, span: Span) -> ScopeId {
        self.push(Some(name), kind, span)
    }

    pub fn push_anonymous(&mut self, kind: ScopeKind, span: Span) -> ScopeId {
        self.push(None, kind, span)
    }

    /// Close the innermost scope for `.end [name]`.
    ///
    /// With a name, the innermost scope must carry that name. Without one,
    /// any open scope is closed.
    pub fn pop(&mut self, expected: Option<&str>, span: Span) -> Result<ScopeId, ScopeError> {
        let current = self.current();
        if current == ScopeId::TOP_LEVEL {
            return Err(ScopeError::UnmatchedEnd { span });
        }
        let record = &self.records[current.0];
        if let Some(expected) = expected {
            if record.name.as_deref() != Some(expected) {
                return Err(ScopeError::Mismatch {
                    expected: record.display_name(),
                    found: expected.to_string(),
                    span,
                });
            }
        }
        self.open.pop();
        trace!(scope = current.0, depth = self.depth(), "scope closed");
        Ok(current)
    }

    /// Close the innermost scope of `kind`, for constructs that close
    /// implicitly such as `}`. Scopes still open inside it are closed as
    /// well and the first of them is reported.
    pub fn pop_kind(&mut self, kind: ScopeKind, span: Span) -> Result<ScopeId, ScopeError> {
        let Some(position) = self
            .open
            .iter()
            .rposition(|id| self.records[id.0].kind == kind)
            .filter(|&position| position > 0)
        else {
            return Err(ScopeError::UnmatchedEnd { span });
        };
        let unclosed = self.open[position + 1..]
            .first()
            .map(|id| &self.records[id.0])
            .map(|record| ScopeError::Unclosed {
                name: record.display_name(),
                span: record.span,
            });
        let id = self.open[position];
        self.open.truncate(position);
        trace!(scope = id.0, depth = self.depth(), "scope closed");
        match unclosed {
            Some(err) => Err(err),
            None => Ok(id),
        }
    }

    pub fn current(&self) -> ScopeId {
        self.open.last().copied().unwrap_or(ScopeId::TOP_LEVEL)
    }

    pub fn record(&self, id: ScopeId) -> Option<&ScopeRecord> {
        self.records.get(id.0)
    }

    /// Number of open scopes, not counting the top level.
    pub fn depth(&self) -> usize {
        self.open.len() - 1
    }

    /// Open scopes other than the top level, outermost first.
    pub fn unclosed(&self) -> impl DoubleEndedIterator<Item = &ScopeRecord> + '_ {
        self.open[1..].iter().map(|id| &self.records[id.0])
    }

    /// Close every open scope, reporting each as unclosed, innermost first.
    pub fn close_all(&mut self) -> Vec<ScopeError> {
        let errors = self
            .unclosed()
            .rev()
            .map(|record| ScopeError::Unclosed {
                name: record.display_name(),
                span: record.span,
            })
            .collect();
        self.open.truncate(1);
        errors
    }

    pub fn records(&self) -> &[ScopeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ScopeRecord> {
        self.records
    }
}
