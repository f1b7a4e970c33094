// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Constant folding of parsed expressions.
//!
//! Used to evaluate eager macro arguments. Values are 64-bit and wrap; the
//! signedness recorded on each operator node selects signed or unsigned
//! division, remainder, right shift and ordering.

use crate::core::operators::{InfixOp, PrefixOp};
use crate::core::parser::{Atom, Expr};
use crate::core::signedness::Signedness;
use crate::core::tokenizer::Span;

/// Error returned from expression evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EvalError {
    pub message: String,
    pub span: Option<Span>,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }
}

/// Resolves identifiers during evaluation.
pub trait EvalContext {
    fn lookup_symbol(&self, name: &str) -> Option<i64>;
}

/// Context with no symbols: only literal expressions fold.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSymbols;

impl EvalContext for NoSymbols {
    fn lookup_symbol(&self, _name: &str) -> Option<i64> {
        None
    }
}

impl<F> EvalContext for F
where
    F: Fn(&str) -> Option<i64>,
{
    fn lookup_symbol(&self, name: &str) -> Option<i64> {
        self(name)
    }
}

/// Evaluate an expression to a numeric value.
pub fn eval_expr(expr: &Expr, ctx: &dyn EvalContext) -> Result<i64, EvalError> {
    match expr {
        Expr::Atom { atom, span } => match atom {
            Atom::Int(value) => Ok(*value as i64),
            Atom::Char(c) => Ok(i64::from(u32::from(*c))),
            Atom::Ident(name) => ctx
                .lookup_symbol(name)
                .ok_or_else(|| EvalError::with_span(format!("undefined symbol `{name}`"), *span)),
            Atom::Float(_) => Err(EvalError::with_span(
                "floating-point value is not an integer constant",
                *span,
            )),
            Atom::Str(_) => Err(EvalError::with_span(
                "string is not an integer constant",
                *span,
            )),
        },

        Expr::Group { inner, .. } => eval_expr(inner, ctx),

        Expr::Prefix {
            op, operand, span, ..
        } => {
            let val = eval_expr(operand, ctx)?;
            apply_prefix(*op, val, *span)
        }

        Expr::Infix {
            op,
            lhs,
            rhs,
            signedness,
            span,
        } => {
            let l = eval_expr(lhs, ctx)?;
            let r = eval_expr(rhs, ctx)?;
            apply_binary(*op, signedness.unwrap_or_default(), l, r, *span)
        }

        Expr::Postfix { span, .. } | Expr::Array { span, .. } | Expr::Block { span, .. } => {
            Err(EvalError::with_span("not a constant expression", *span))
        }
    }
}

/// Apply a prefix operator to a value.
pub fn apply_prefix(op: PrefixOp, val: i64, span: Span) -> Result<i64, EvalError> {
    Ok(match op {
        PrefixOp::Neg => val.wrapping_neg(),
        PrefixOp::BitNot => !val,
        PrefixOp::LogicNot => (val == 0) as i64,
        PrefixOp::Signed
        | PrefixOp::Unsigned
        | PrefixOp::ImplicitSigned
        | PrefixOp::ImplicitUnsigned => val,
        PrefixOp::PreIncrement | PrefixOp::PreDecrement => {
            return Err(EvalError::with_span("not a constant expression", span))
        }
    })
}

/// Apply a binary operator to two values.
pub fn apply_binary(
    op: InfixOp,
    signedness: Signedness,
    l: i64,
    r: i64,
    span: Span,
) -> Result<i64, EvalError> {
    let unsigned = signedness == Signedness::Unsigned;
    let (ul, ur) = (l as u64, r as u64);
    Ok(match op {
        InfixOp::Add => l.wrapping_add(r),
        InfixOp::Sub => l.wrapping_sub(r),
        InfixOp::Mul => l.wrapping_mul(r),
        InfixOp::Div | InfixOp::Mod if r == 0 => {
            return Err(EvalError::with_span("division by zero", span));
        }
        InfixOp::Div if unsigned => (ul / ur) as i64,
        InfixOp::Div => l.wrapping_div(r),
        InfixOp::Mod if unsigned => (ul % ur) as i64,
        InfixOp::Mod => l.wrapping_rem(r),
        InfixOp::Shl => l.wrapping_shl((r & 0x3f) as u32),
        InfixOp::Shr if unsigned => (ul >> (r & 0x3f)) as i64,
        InfixOp::Shr => l >> (r & 0x3f),
        InfixOp::BitAnd => l & r,
        InfixOp::BitXor => l ^ r,
        InfixOp::BitOr => l | r,
        InfixOp::Eq => (l == r) as i64,
        InfixOp::Ne => (l != r) as i64,
        InfixOp::Lt if unsigned => (ul < ur) as i64,
        InfixOp::Lt => (l < r) as i64,
        InfixOp::Gt if unsigned => (ul > ur) as i64,
        InfixOp::Gt => (l > r) as i64,
        InfixOp::Le if unsigned => (ul <= ur) as i64,
        InfixOp::Le => (l <= r) as i64,
        InfixOp::Ge if unsigned => (ul >= ur) as i64,
        InfixOp::Ge => (l >= r) as i64,
        InfixOp::LogicAnd => ((l != 0) && (r != 0)) as i64,
        InfixOp::LogicXor => ((l != 0) ^ (r != 0)) as i64,
        InfixOp::LogicOr => ((l != 0) || (r != 0)) as i64,
        _ => return Err(EvalError::with_span("not a constant expression", span)),
    })
}
