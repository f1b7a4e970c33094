// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Label table: which labels were declared, with which kind, in which scope.

use std::io::{self, Write};

use crate::core::parser::LabelKind;
use crate::core::scope::{ScopeId, ScopeRecord};
use crate::core::tokenizer::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    pub name: String,
    pub kind: LabelKind,
    pub scope: ScopeId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum SymbolTableResult {
    Ok,
    Duplicate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    entries: Vec<LabelEntry>,
}

impl LabelTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record a label. A name may appear once per scope.
    pub fn add(&mut self, entry: LabelEntry) -> SymbolTableResult {
        if self.entry(&entry.name, entry.scope).is_some() {
            return SymbolTableResult::Duplicate;
        }
        self.entries.push(entry);
        SymbolTableResult::Ok
    }

    #[must_use]
    pub fn entry(&self, name: &str, scope: ScopeId) -> Option<&LabelEntry> {
        self.entries
            .iter()
            .find(|entry| entry.scope == scope && entry.name == name)
    }

    pub fn labels_in(&self, scope: ScopeId) -> impl Iterator<Item = &LabelEntry> + '_ {
        self.entries.iter().filter(move |entry| entry.scope == scope)
    }

    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scopes and labels of one compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeTable {
    pub scopes: Vec<ScopeRecord>,
    pub labels: LabelTable,
}

impl ScopeTable {
    pub fn scope(&self, id: ScopeId) -> Option<&ScopeRecord> {
        self.scopes.get(id.0)
    }

    /// Dotted path of scope names from the top level, e.g. `outer.<block>`.
    pub fn path(&self, id: ScopeId) -> String {
        let mut names = Vec::new();
        let mut current = self.scope(id);
        while let Some(record) = current {
            if record.id != ScopeId::TOP_LEVEL {
                names.push(record.display_name());
            }
            current = record.parent.and_then(|parent| self.scope(parent));
        }
        names.reverse();
        names.join(".")
    }

    pub fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        for entry in self.labels.entries() {
            let path = self.path(entry.scope);
            let scope = if path.is_empty() { "<top level>" } else { path.as_str() };
            writeln!(
                out,
                "{:<24} {:<8} scope {:>3} {}",
                entry.name,
                format!("{:?}", entry.kind),
                entry.scope.0,
                scope
            )?;
        }
        Ok(())
    }
}
