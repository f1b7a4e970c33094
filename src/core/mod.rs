// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Macro assembler front end.
//!
//! # Components
//!
//! - [`tokenizer`] - Token scanning with spans
//! - [`token_tree`] - Delimiter matching and statement lines
//! - [`operators`] - Operator precedence, associativity and signedness table
//! - [`parser`] - Expression and statement parsing
//! - [`signedness`] - Signed/unsigned resolution for operators
//! - [`macro_processor`] - `.define` and `.macro` tables and expansion
//! - [`scope`] - Scope stack for `.block`, braces and macro bodies
//! - [`symbol_table`] - Labels and scope records
//! - [`expr`] - Constant folding
//! - [`frontend`] - Statement driver for one compilation unit

pub mod error;
pub mod expr;
pub mod frontend;
pub mod literal;
pub mod macro_processor;
pub mod operators;
pub mod parser;
pub mod scope;
pub mod signedness;
pub mod symbol_table;
pub mod text_utils;
pub mod token_tree;
pub mod tokenizer;

// Re-exports for convenience
pub use error::{Error, ErrorKind, LexError, MacroError, ScopeError, SyntaxError};
pub use expr::{eval_expr, EvalContext, EvalError, NoSymbols};
pub use frontend::{process, Frontend, FrontendConfig, Module, Output, Recovery};
pub use macro_processor::{MacroDef, MacroTable};
pub use parser::{Expr, Parser, Stmt};
pub use signedness::{Signedness, SignednessContext};
pub use symbol_table::ScopeTable;
pub use tokenizer::{Span, Token, TokenKind, Tokenizer};
