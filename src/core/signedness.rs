// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Signedness resolution for operators whose meaning depends on it.
//!
//! The ambient default is an explicit [`SignednessContext`] value owned by
//! the caller. Resolving an operator never mutates it; forcing prefixes hand
//! back an updated context that applies only to their operand.

use std::fmt;

use crate::core::operators::{InfixOp, PrefixOp, Sensitivity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signedness {
    #[default]
    Signed,
    Unsigned,
}

impl fmt::Display for Signedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signedness::Signed => f.write_str("signed"),
            Signedness::Unsigned => f.write_str("unsigned"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignednessContext {
    default: Signedness,
}

impl SignednessContext {
    pub fn new(default: Signedness) -> Self {
        Self { default }
    }

    pub fn default_signedness(&self) -> Signedness {
        self.default
    }

    /// Set by `.signed` / `.unsigned`.
    pub fn set_default(&mut self, default: Signedness) {
        self.default = default;
    }

    #[must_use]
    pub fn with_default(self, default: Signedness) -> Self {
        Self { default }
    }
}

fn resolve(sensitivity: Sensitivity, ctx: SignednessContext) -> (Option<Signedness>, SignednessContext) {
    match sensitivity {
        Sensitivity::None => (None, ctx),
        Sensitivity::Ambient => (Some(ctx.default), ctx),
        Sensitivity::Force(forced) => (Some(forced), ctx.with_default(forced)),
    }
}

/// Annotation for a prefix operator, and the context for its operand.
pub fn resolve_prefix(
    op: PrefixOp,
    ctx: SignednessContext,
) -> (Option<Signedness>, SignednessContext) {
    resolve(op.info().sensitivity, ctx)
}

/// Annotation for an infix operator, and the context for its operands.
pub fn resolve_infix(
    op: InfixOp,
    ctx: SignednessContext,
) -> (Option<Signedness>, SignednessContext) {
    resolve(op.info().sensitivity, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambient_operators_follow_default() {
        let ctx = SignednessContext::new(Signedness::Unsigned);
        assert_eq!(
            resolve_infix(InfixOp::Div, ctx),
            (Some(Signedness::Unsigned), ctx)
        );
        assert_eq!(
            resolve_infix(InfixOp::Lt, ctx.with_default(Signedness::Signed)).0,
            Some(Signedness::Signed)
        );
    }

    #[test]
    fn insensitive_operators_are_unannotated() {
        let ctx = SignednessContext::default();
        assert_eq!(resolve_infix(InfixOp::Add, ctx), (None, ctx));
        assert_eq!(resolve_infix(InfixOp::Eq, ctx), (None, ctx));
        assert_eq!(resolve_prefix(PrefixOp::Neg, ctx), (None, ctx));
    }

    #[test]
    fn forcing_prefix_updates_operand_context() {
        let ctx = SignednessContext::new(Signedness::Signed);
        let (annotation, inner) = resolve_prefix(PrefixOp::ImplicitUnsigned, ctx);
        assert_eq!(annotation, Some(Signedness::Unsigned));
        assert_eq!(inner.default_signedness(), Signedness::Unsigned);
        assert_eq!(ctx.default_signedness(), Signedness::Signed);

        let (annotation, inner) = resolve_prefix(PrefixOp::Signed, inner);
        assert_eq!(annotation, Some(Signedness::Signed));
        assert_eq!(inner.default_signedness(), Signedness::Signed);
    }

    #[test]
    fn directive_style_update() {
        let mut ctx = SignednessContext::default();
        ctx.set_default(Signedness::Unsigned);
        assert_eq!(ctx.default_signedness(), Signedness::Unsigned);
    }
}
