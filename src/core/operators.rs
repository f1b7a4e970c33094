// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operator table: precedence, associativity and signedness sensitivity.
//!
//! Higher precedence binds tighter. Level 0 is the base level used for the
//! contents of groups and for whole expressions.

use std::fmt;

use crate::core::signedness::Signedness;
use crate::core::tokenizer::{OperatorKind, Punct, Token, TokenKind};

pub const BASE_PRECEDENCE: u8 = 0;
pub const SIGNEDNESS_PRECEDENCE: u8 = 1;
pub const ASSIGN_PRECEDENCE: u8 = 2;
pub const JOIN_PRECEDENCE: u8 = 3;
pub const LOGIC_OR_PRECEDENCE: u8 = 4;
pub const LOGIC_XOR_PRECEDENCE: u8 = 5;
pub const LOGIC_AND_PRECEDENCE: u8 = 6;
pub const COMPARE_PRECEDENCE: u8 = 7;
pub const RANGE_PRECEDENCE: u8 = 8;
pub const BIT_OR_PRECEDENCE: u8 = 9;
pub const BIT_XOR_PRECEDENCE: u8 = 10;
pub const BIT_AND_PRECEDENCE: u8 = 11;
pub const SHIFT_PRECEDENCE: u8 = 12;
pub const ADDITIVE_PRECEDENCE: u8 = 13;
pub const MULTIPLICATIVE_PRECEDENCE: u8 = 14;
pub const PREFIX_PRECEDENCE: u8 = 15;
pub const POSTFIX_PRECEDENCE: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Binary,
}

/// How an operator relates to signedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    None,
    /// Meaning depends on the ambient default.
    Ambient,
    /// Forces a signedness onto its operand.
    Force(Signedness),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorInfo {
    pub precedence: u8,
    pub assoc: Assoc,
    pub arity: Arity,
    pub sensitivity: Sensitivity,
}

impl OperatorInfo {
    const fn unary(precedence: u8, assoc: Assoc, sensitivity: Sensitivity) -> Self {
        Self {
            precedence,
            assoc,
            arity: Arity::Unary,
            sensitivity,
        }
    }

    const fn binary(precedence: u8, assoc: Assoc, sensitivity: Sensitivity) -> Self {
        Self {
            precedence,
            assoc,
            arity: Arity::Binary,
            sensitivity,
        }
    }

    /// Minimum precedence for the right operand of a binary operator.
    pub fn rhs_precedence(&self) -> u8 {
        match self.assoc {
            Assoc::Left => self.precedence + 1,
            Assoc::Right => self.precedence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixOp {
    BitNot,
    LogicNot,
    Neg,
    PreIncrement,
    PreDecrement,
    /// `+x`: treat operand as signed.
    Signed,
    /// `%x`: treat operand as unsigned.
    Unsigned,
    /// `+: x`: low-precedence signed.
    ImplicitSigned,
    /// `%: x`: low-precedence unsigned.
    ImplicitUnsigned,
}

impl PrefixOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        let TokenKind::Operator(op) = token.kind else {
            return None;
        };
        Some(match op {
            OperatorKind::BitNot => PrefixOp::BitNot,
            OperatorKind::LogicNot => PrefixOp::LogicNot,
            OperatorKind::Minus => PrefixOp::Neg,
            OperatorKind::Increment => PrefixOp::PreIncrement,
            OperatorKind::Decrement => PrefixOp::PreDecrement,
            OperatorKind::Plus => PrefixOp::Signed,
            OperatorKind::Mod => PrefixOp::Unsigned,
            OperatorKind::ImplicitSigned => PrefixOp::ImplicitSigned,
            OperatorKind::ImplicitUnsigned => PrefixOp::ImplicitUnsigned,
            _ => return None,
        })
    }

    pub fn info(self) -> OperatorInfo {
        let sensitivity = match self {
            PrefixOp::Signed | PrefixOp::ImplicitSigned => Sensitivity::Force(Signedness::Signed),
            PrefixOp::Unsigned | PrefixOp::ImplicitUnsigned => {
                Sensitivity::Force(Signedness::Unsigned)
            }
            _ => Sensitivity::None,
        };
        let precedence = match self {
            PrefixOp::ImplicitSigned | PrefixOp::ImplicitUnsigned => SIGNEDNESS_PRECEDENCE,
            _ => PREFIX_PRECEDENCE,
        };
        OperatorInfo::unary(precedence, Assoc::Right, sensitivity)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            PrefixOp::BitNot => "~",
            PrefixOp::LogicNot => "!",
            PrefixOp::Neg => "-",
            PrefixOp::PreIncrement => "++",
            PrefixOp::PreDecrement => "--",
            PrefixOp::Signed => "+",
            PrefixOp::Unsigned => "%",
            PrefixOp::ImplicitSigned => "+:",
            PrefixOp::ImplicitUnsigned => "%:",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostfixOp {
    PostIncrement,
    PostDecrement,
}

impl PostfixOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match token.kind {
            TokenKind::Operator(OperatorKind::Increment) => Some(PostfixOp::PostIncrement),
            TokenKind::Operator(OperatorKind::Decrement) => Some(PostfixOp::PostDecrement),
            _ => None,
        }
    }

    pub fn info(self) -> OperatorInfo {
        OperatorInfo::unary(POSTFIX_PRECEDENCE, Assoc::Left, Sensitivity::None)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            PostfixOp::PostIncrement => "++",
            PostfixOp::PostDecrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfixOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    BitAnd,
    BitXor,
    BitOr,
    Range,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    LogicAnd,
    LogicXor,
    LogicOr,
    Join,
    Assign,
    MulAssign,
    DivAssign,
    ModAssign,
    AddAssign,
    SubAssign,
    ShlAssign,
    ShrAssign,
    BitAndAssign,
    BitXorAssign,
    BitOrAssign,
    LogicAndAssign,
    LogicXorAssign,
    LogicOrAssign,
}

impl InfixOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        let op = match token.kind {
            TokenKind::Operator(op) => op,
            TokenKind::Punct(Punct::Colon) => return Some(InfixOp::Join),
            _ => return None,
        };
        Some(match op {
            OperatorKind::Multiply => InfixOp::Mul,
            OperatorKind::Divide => InfixOp::Div,
            OperatorKind::Mod => InfixOp::Mod,
            OperatorKind::Plus => InfixOp::Add,
            OperatorKind::Minus => InfixOp::Sub,
            OperatorKind::Shl => InfixOp::Shl,
            OperatorKind::Shr => InfixOp::Shr,
            OperatorKind::BitAnd => InfixOp::BitAnd,
            OperatorKind::BitXor => InfixOp::BitXor,
            OperatorKind::BitOr => InfixOp::BitOr,
            OperatorKind::BitNot => InfixOp::Range,
            OperatorKind::Eq => InfixOp::Eq,
            OperatorKind::Ne => InfixOp::Ne,
            OperatorKind::Lt => InfixOp::Lt,
            OperatorKind::Gt => InfixOp::Gt,
            OperatorKind::Le => InfixOp::Le,
            OperatorKind::Ge => InfixOp::Ge,
            OperatorKind::LogicAnd => InfixOp::LogicAnd,
            OperatorKind::LogicXor => InfixOp::LogicXor,
            OperatorKind::LogicOr => InfixOp::LogicOr,
            OperatorKind::Assign => InfixOp::Assign,
            OperatorKind::MultiplyAssign => InfixOp::MulAssign,
            OperatorKind::DivideAssign => InfixOp::DivAssign,
            OperatorKind::ModAssign => InfixOp::ModAssign,
            OperatorKind::PlusAssign => InfixOp::AddAssign,
            OperatorKind::MinusAssign => InfixOp::SubAssign,
            OperatorKind::ShlAssign => InfixOp::ShlAssign,
            OperatorKind::ShrAssign => InfixOp::ShrAssign,
            OperatorKind::BitAndAssign => InfixOp::BitAndAssign,
            OperatorKind::BitXorAssign => InfixOp::BitXorAssign,
            OperatorKind::BitOrAssign => InfixOp::BitOrAssign,
            OperatorKind::LogicAndAssign => InfixOp::LogicAndAssign,
            OperatorKind::LogicXorAssign => InfixOp::LogicXorAssign,
            OperatorKind::LogicOrAssign => InfixOp::LogicOrAssign,
            _ => return None,
        })
    }

    pub fn info(self) -> OperatorInfo {
        use Sensitivity::{Ambient, None as Plain};
        let (precedence, assoc, sensitivity) = match self {
            InfixOp::Mul | InfixOp::Div | InfixOp::Mod => {
                (MULTIPLICATIVE_PRECEDENCE, Assoc::Left, Ambient)
            }
            InfixOp::Add | InfixOp::Sub => (ADDITIVE_PRECEDENCE, Assoc::Left, Plain),
            InfixOp::Shl => (SHIFT_PRECEDENCE, Assoc::Left, Plain),
            InfixOp::Shr => (SHIFT_PRECEDENCE, Assoc::Left, Ambient),
            InfixOp::BitAnd => (BIT_AND_PRECEDENCE, Assoc::Left, Plain),
            InfixOp::BitXor => (BIT_XOR_PRECEDENCE, Assoc::Left, Plain),
            InfixOp::BitOr => (BIT_OR_PRECEDENCE, Assoc::Left, Plain),
            InfixOp::Range => (RANGE_PRECEDENCE, Assoc::Left, Plain),
            InfixOp::Eq | InfixOp::Ne => (COMPARE_PRECEDENCE, Assoc::Left, Plain),
            InfixOp::Lt | InfixOp::Gt | InfixOp::Le | InfixOp::Ge => {
                (COMPARE_PRECEDENCE, Assoc::Left, Ambient)
            }
            InfixOp::LogicAnd => (LOGIC_AND_PRECEDENCE, Assoc::Left, Plain),
            InfixOp::LogicXor => (LOGIC_XOR_PRECEDENCE, Assoc::Left, Plain),
            InfixOp::LogicOr => (LOGIC_OR_PRECEDENCE, Assoc::Left, Plain),
            InfixOp::Join => (JOIN_PRECEDENCE, Assoc::Right, Plain),
            InfixOp::MulAssign | InfixOp::DivAssign | InfixOp::ModAssign | InfixOp::ShrAssign => {
                (ASSIGN_PRECEDENCE, Assoc::Right, Ambient)
            }
            InfixOp::Assign
            | InfixOp::AddAssign
            | InfixOp::SubAssign
            | InfixOp::ShlAssign
            | InfixOp::BitAndAssign
            | InfixOp::BitXorAssign
            | InfixOp::BitOrAssign
            | InfixOp::LogicAndAssign
            | InfixOp::LogicXorAssign
            | InfixOp::LogicOrAssign => (ASSIGN_PRECEDENCE, Assoc::Right, Plain),
        };
        OperatorInfo::binary(precedence, assoc, sensitivity)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::Mod => "%",
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Shl => "<<",
            InfixOp::Shr => ">>",
            InfixOp::BitAnd => "&",
            InfixOp::BitXor => "^",
            InfixOp::BitOr => "|",
            InfixOp::Range => "~",
            InfixOp::Eq => "==",
            InfixOp::Ne => "!=",
            InfixOp::Lt => "<",
            InfixOp::Gt => ">",
            InfixOp::Le => "<=",
            InfixOp::Ge => ">=",
            InfixOp::LogicAnd => "&&",
            InfixOp::LogicXor => "^^",
            InfixOp::LogicOr => "||",
            InfixOp::Join => ":",
            InfixOp::Assign => "=",
            InfixOp::MulAssign => "*=",
            InfixOp::DivAssign => "/=",
            InfixOp::ModAssign => "%=",
            InfixOp::AddAssign => "+=",
            InfixOp::SubAssign => "-=",
            InfixOp::ShlAssign => "<<=",
            InfixOp::ShrAssign => ">>=",
            InfixOp::BitAndAssign => "&=",
            InfixOp::BitXorAssign => "^=",
            InfixOp::BitOrAssign => "|=",
            InfixOp::LogicAndAssign => "&&=",
            InfixOp::LogicXorAssign => "^^=",
            InfixOp::LogicOrAssign => "||=",
        }
    }
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for PostfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tokenizer::{tokenize, Span};

    fn token(source: &str) -> Token {
        tokenize(source)
            .expect("tokenize")
            .into_iter()
            .next()
            .expect("one token")
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert!(InfixOp::Mul.info().precedence > InfixOp::Add.info().precedence);
        assert!(InfixOp::Add.info().precedence > InfixOp::Shl.info().precedence);
        assert!(InfixOp::BitAnd.info().precedence > InfixOp::BitXor.info().precedence);
        assert!(InfixOp::BitXor.info().precedence > InfixOp::BitOr.info().precedence);
        assert!(InfixOp::LogicAnd.info().precedence > InfixOp::LogicXor.info().precedence);
        assert!(InfixOp::LogicXor.info().precedence > InfixOp::LogicOr.info().precedence);
    }

    #[test]
    fn prefix_binds_tighter_than_any_infix_and_postfix_tighter_still() {
        let highest_infix = InfixOp::Mul.info().precedence;
        assert!(PrefixOp::Neg.info().precedence > highest_infix);
        assert!(PostfixOp::PostIncrement.info().precedence > PrefixOp::Neg.info().precedence);
    }

    #[test]
    fn implicit_signedness_prefixes_bind_loosest() {
        let info = PrefixOp::ImplicitUnsigned.info();
        assert_eq!(info.precedence, SIGNEDNESS_PRECEDENCE);
        assert!(info.precedence < InfixOp::Assign.info().precedence);
        assert!(info.precedence > BASE_PRECEDENCE);
        assert_eq!(info.sensitivity, Sensitivity::Force(Signedness::Unsigned));
    }

    #[test]
    fn assignment_and_join_are_right_associative() {
        assert_eq!(InfixOp::Assign.info().assoc, Assoc::Right);
        assert_eq!(InfixOp::ShlAssign.info().assoc, Assoc::Right);
        assert_eq!(InfixOp::Join.info().assoc, Assoc::Right);
        assert_eq!(InfixOp::BitXor.info().assoc, Assoc::Left);
        assert_eq!(InfixOp::Join.info().rhs_precedence(), JOIN_PRECEDENCE);
        assert_eq!(InfixOp::Sub.info().rhs_precedence(), ADDITIVE_PRECEDENCE + 1);
    }

    #[test]
    fn sensitivity_marks_signed_dependent_operators() {
        for op in [InfixOp::Div, InfixOp::Mod, InfixOp::Shr, InfixOp::Lt, InfixOp::Ge] {
            assert_eq!(op.info().sensitivity, Sensitivity::Ambient, "{op}");
        }
        for op in [InfixOp::Add, InfixOp::Shl, InfixOp::Eq, InfixOp::BitAnd] {
            assert_eq!(op.info().sensitivity, Sensitivity::None, "{op}");
        }
        assert_eq!(InfixOp::DivAssign.info().sensitivity, Sensitivity::Ambient);
        assert_eq!(InfixOp::AddAssign.info().sensitivity, Sensitivity::None);
    }

    #[test]
    fn maps_tokens_by_position() {
        let minus = token("-");
        assert_eq!(PrefixOp::from_token(&minus), Some(PrefixOp::Neg));
        assert_eq!(InfixOp::from_token(&minus), Some(InfixOp::Sub));
        assert_eq!(PostfixOp::from_token(&minus), None);

        let tilde = token("~");
        assert_eq!(PrefixOp::from_token(&tilde), Some(PrefixOp::BitNot));
        assert_eq!(InfixOp::from_token(&tilde), Some(InfixOp::Range));

        let percent = token("%");
        assert_eq!(PrefixOp::from_token(&percent), Some(PrefixOp::Unsigned));
        assert_eq!(InfixOp::from_token(&percent), Some(InfixOp::Mod));

        let colon = token(":");
        assert_eq!(InfixOp::from_token(&colon), Some(InfixOp::Join));

        let comma = Token::synthetic(TokenKind::Punct(Punct::Comma), Span::default());
        assert_eq!(InfixOp::from_token(&comma), None);
    }

    #[test]
    fn arity_matches_position() {
        assert_eq!(PrefixOp::Neg.info().arity, Arity::Unary);
        assert_eq!(PostfixOp::PostDecrement.info().arity, Arity::Unary);
        assert_eq!(InfixOp::Range.info().arity, Arity::Binary);
    }
}
