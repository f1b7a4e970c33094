// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use macroasm::core::error::{Error, ErrorKind, MacroError, ScopeError};
use macroasm::core::frontend::{process, FrontendConfig, Output, Recovery};
use macroasm::core::parser::{Expr, Stmt};
use macroasm::core::scope::ScopeKind;
use macroasm::core::signedness::Signedness;

fn run(source: &str) -> Output {
    process(source, FrontendConfig::default()).expect("process")
}

fn run_err(source: &str) -> Error {
    process(source, FrontendConfig::default()).unwrap_err()
}

fn keep_going(source: &str) -> Output {
    let config = FrontendConfig::default().with_recovery(Recovery::NextStatement);
    process(source, config).expect("process")
}

/// Rendered statements other than definitions.
fn lines(output: &Output) -> Vec<String> {
    output
        .module
        .stmts
        .iter()
        .filter(|stmt| !matches!(stmt, Stmt::Define(_) | Stmt::Macro(_)))
        .map(ToString::to_string)
        .collect()
}

#[test]
fn eager_argument_folds_and_lazy_argument_stays() {
    let output = run(".define f(!a, b) = a + b\n.byte f(1+1, x)");
    assert_eq!(lines(&output), vec![".byte (2 + x)"]);
}

#[test]
fn eager_folding_follows_ambient_signedness() {
    let output = run(".unsigned\n.define h(!a) = a\n.byte h(-1 / 2)");
    assert_eq!(
        lines(&output),
        vec![".unsigned", ".byte 9223372036854775807"]
    );
}

#[test]
fn statement_macro_requires_its_arguments() {
    let source = ".macro two a, b\n.byte a, b\n.end\n";
    for call in ["two", "two 1"] {
        let err = run_err(&format!("{source}{call}"));
        assert!(
            matches!(err, Error::Macro(MacroError::Arity { .. })),
            "Expected arity error for {call}, got {err:?}"
        );
    }
    let output = run(&format!("{source}two 1, 2"));
    assert_eq!(lines(&output), vec![".byte 1, 2"]);
}

#[test]
fn statement_macro_accepts_named_and_default_arguments() {
    let source = ".macro st addr, val = 0\nsta addr, val\n.end\n";
    let output = run(&format!("{source}st val = 1, addr = 2\nst 7"));
    assert_eq!(lines(&output), vec!["sta 2, 1", "sta 7, 0"]);
}

#[test]
fn variadic_parameter_captures_trailing_arguments() {
    let output = run(".macro list first, *rest\n.byte rest\n.word first\n.end\nlist 1, 2, 3");
    assert_eq!(lines(&output), vec![".byte 2, 3", ".word 1"]);
}

#[test]
fn variadic_parameter_must_be_last() {
    let err = run_err(".define bad(*a, b) = a");
    assert!(matches!(
        err,
        Error::Macro(MacroError::NonFinalVariadic { .. })
    ));
}

#[test]
fn named_end_must_match_open_scope() {
    let err = run_err(".block\n.end foo");
    match err {
        Error::Scope(ScopeError::Mismatch { expected, found, .. }) => {
            assert_eq!(expected, "<block>");
            assert_eq!(found, "foo");
        }
        other => panic!("Expected scope mismatch, got {other:?}"),
    }
    assert!(process(".block foo\n.end foo", FrontendConfig::default()).is_ok());
    assert!(process(".block foo\n.end", FrontendConfig::default()).is_ok());
}

#[test]
fn unclosed_scope_is_reported_at_end_of_input() {
    let err = run_err(".block outer\nnop");
    assert!(matches!(
        err,
        Error::Scope(ScopeError::Unclosed { ref name, .. }) if name == "outer"
    ));
    assert_eq!(err.kind(), ErrorKind::Scope);
}

#[test]
fn self_referential_define_stops_at_depth_limit() {
    let config = FrontendConfig::default().with_max_expansion_depth(16);
    let err = process(".define x = x + 1\n.byte x", config).unwrap_err();
    match err {
        Error::Macro(MacroError::RecursionLimit { name, limit, .. }) => {
            assert_eq!(name, "x");
            assert_eq!(limit, 16);
        }
        other => panic!("Expected recursion limit, got {other:?}"),
    }
}

#[test]
fn mutually_recursive_macros_stop_at_depth_limit() {
    let err = run_err(".macro ping\npong\n.end\n.macro pong\nping\n.end\nping");
    assert!(matches!(
        err,
        Error::Macro(MacroError::RecursionLimit { limit: 64, .. })
    ));
}

#[test]
fn macro_labels_live_in_one_scope_per_invocation() {
    let output = run(".macro m\nloop: nop\n.end\nm\nm");
    let labels = output.scopes.labels.entries();
    assert_eq!(labels.len(), 2);
    assert_ne!(labels[0].scope, labels[1].scope);
    for label in labels {
        let scope = output.scopes.scope(label.scope).expect("scope");
        assert_eq!(scope.kind, ScopeKind::MacroBody);
        assert_eq!(scope.name.as_deref(), Some("m"));
    }
}

#[test]
fn macro_labels_do_not_clash_with_caller_labels() {
    let err = run_err("loop:\nloop:");
    assert!(matches!(
        err,
        Error::Scope(ScopeError::DuplicateLabel { .. })
    ));
    let output = run(".macro m\nloop:\n.end\nloop:\nm");
    assert_eq!(output.scopes.labels.len(), 2);
}

#[test]
fn redefinition_is_rejected() {
    let err = run_err(".macro m\n.end\n.macro m\n.end");
    assert!(matches!(
        err,
        Error::Macro(MacroError::DuplicateDefinition { .. })
    ));
}

#[test]
fn signedness_annotations_follow_directives_and_forcing_prefixes() {
    let output = run(".unsigned\nx = a / b\ny = +(a / b)");
    let assigned: Vec<&Expr> = output
        .module
        .stmts
        .iter()
        .filter_map(|stmt| match stmt {
            Stmt::Expr(Expr::Infix { rhs, .. }) => Some(rhs.as_ref()),
            _ => None,
        })
        .collect();
    assert!(matches!(
        assigned[0],
        Expr::Infix {
            signedness: Some(Signedness::Unsigned),
            ..
        }
    ));
    let Expr::Prefix {
        operand,
        signedness,
        ..
    } = assigned[1]
    else {
        panic!("Expected forcing prefix");
    };
    assert_eq!(*signedness, Some(Signedness::Signed));
    let Expr::Group { inner, .. } = operand.as_ref() else {
        panic!("Expected group");
    };
    assert!(matches!(
        inner.as_ref(),
        Expr::Infix {
            signedness: Some(Signedness::Signed),
            ..
        }
    ));
}

#[test]
fn recovery_collects_errors_and_keeps_good_statements() {
    let output = keep_going("a @ b\nnop\n.byte (1\n.end\n.define f(a) = a\n.byte f()");
    assert_eq!(lines(&output), vec!["nop"]);
    let kinds: Vec<ErrorKind> = output.errors.iter().map(Error::kind).collect();
    assert_eq!(
        kinds,
        vec![
            ErrorKind::Lexical,
            ErrorKind::Syntactic,
            ErrorKind::Scope,
            ErrorKind::Macro,
        ]
    );
}

#[test]
fn recovery_continues_inside_macro_bodies() {
    let output = keep_going(".macro m\n.byte 1 +\n.byte 2\n.end\nm");
    assert_eq!(output.errors.len(), 1);
    assert_eq!(lines(&output), vec![".byte 2"]);
}

#[test]
fn unused_definitions_do_not_change_output() {
    let plain = run("x = a + (b * c)\n.byte 1, ?, 0 $ 4");
    let with_defines = run(".define unused = 1\n.define g(a) = a\nx = a + (b * c)\n.byte 1, ?, 0 $ 4");
    assert_eq!(lines(&plain), lines(&with_defines));
}

#[test]
fn core_directives_are_case_insensitive() {
    let output = run(".BLOCK outer\n.End outer\n.Define K = 1\n.byte K");
    assert_eq!(lines(&output), vec![".BLOCK outer", ".End outer", ".byte 1"]);
}

#[test]
fn head_position_define_call_is_expanded() {
    let output = run(".define SET(r) = r = 0\nSET(x)");
    assert_eq!(lines(&output), vec!["(x = 0)"]);
}

#[test]
fn malformed_eager_argument_is_reported_even_when_unused() {
    let err = run_err(".define f(!a) = 1\n.byte f(1 +)");
    assert_eq!(err.kind(), ErrorKind::Syntactic);
}

#[test]
fn variadic_macro_accepts_assignment_shaped_arguments() {
    let output = run(".macro m *args\n.byte args\n.end\nm x = 1, 2");
    assert_eq!(lines(&output), vec![".byte (x = 1), 2"]);
}

#[test]
fn recovery_inside_brace_block_keeps_the_block() {
    let output = keep_going("x = {\n a @ b\n c\n}\nd");
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].kind(), ErrorKind::Lexical);
    assert_eq!(output.module.stmts.len(), 2);
    let Stmt::Expr(Expr::Infix { rhs, .. }) = &output.module.stmts[0] else {
        panic!("Expected assignment");
    };
    let Expr::Block { block, .. } = rhs.as_ref() else {
        panic!("Expected block");
    };
    assert_eq!(block.stmts.len(), 1);
    assert_eq!(block.stmts[0].to_string(), "c");
    assert_eq!(output.module.stmts[1].to_string(), "d");
}

#[test]
fn recovery_inside_macro_body_keeps_the_macro() {
    let output = keep_going(".macro m\n.byte 1 )\nnop\n.end m\nm");
    assert_eq!(output.errors.len(), 1);
    assert_eq!(lines(&output), vec!["nop"]);
}
