// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and the run loop behind the binary.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::core::error::Error;
use crate::core::frontend::{process, FrontendConfig, Recovery};
use crate::core::signedness::Signedness;
use crate::core::tokenizer::{TokenKind, Tokenizer};

pub const VERSION: &str = "0.1";

const LONG_ABOUT: &str = "Macro assembler front end: tokenizes, expands .define/.macro
definitions, tracks scopes and labels, and prints the resulting statements.

Each statement is printed on its own line in fully parenthesised form.
Errors are reported as FILE:LINE:COLUMN: error[CODE]: MESSAGE.
Use -k/--keep-going to report every failing statement instead of stopping
at the first one.";

#[derive(Parser, Debug)]
#[command(
    name = "macroasm",
    version = VERSION,
    about = "Macro assembler front end with scoped labels and eager/lazy macros",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(value_name = "FILE", long_help = "Source file to process.")]
    pub input: PathBuf,
    #[arg(
        long = "macro-depth",
        value_name = "N",
        default_value_t = 64,
        long_help = "Maximum macro expansion depth. Defaults to 64."
    )]
    pub macro_depth: usize,
    #[arg(
        short = 'k',
        long = "keep-going",
        action = ArgAction::SetTrue,
        long_help = "Drop failing statements and continue; report all errors at the end."
    )]
    pub keep_going: bool,
    #[arg(
        short = 'u',
        long = "unsigned",
        action = ArgAction::SetTrue,
        long_help = "Start with unsigned as the ambient signedness instead of signed."
    )]
    pub unsigned: bool,
    #[arg(
        short = 't',
        long = "tokens",
        action = ArgAction::SetTrue,
        long_help = "Print the token stream instead of statements."
    )]
    pub tokens: bool,
    #[arg(
        short = 'L',
        long = "labels",
        action = ArgAction::SetTrue,
        long_help = "Print the label table after the statements."
    )]
    pub labels: bool,
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        long_help = "Raise log verbosity (repeatable). RUST_LOG overrides it."
    )]
    pub verbose: u8,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("--macro-depth must be at least 1")]
    MacroDepth,
    #[error("error reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("error writing output: {0}")]
    Write(#[from] io::Error),
    #[error("{path}: {count} error(s)")]
    Failed { path: String, count: usize },
}

/// Validated CLI configuration.
#[derive(Debug, Clone, Copy)]
pub struct CliConfig {
    pub frontend: FrontendConfig,
    pub tokens: bool,
    pub labels: bool,
}

pub fn validate_cli(cli: &Cli) -> Result<CliConfig, CliError> {
    if cli.macro_depth == 0 {
        return Err(CliError::MacroDepth);
    }
    let recovery = if cli.keep_going {
        Recovery::NextStatement
    } else {
        Recovery::StopAtFirst
    };
    let signedness = if cli.unsigned {
        Signedness::Unsigned
    } else {
        Signedness::Signed
    };
    Ok(CliConfig {
        frontend: FrontendConfig::default()
            .with_max_expansion_depth(cli.macro_depth)
            .with_recovery(recovery)
            .with_default_signedness(signedness),
        tokens: cli.tokens,
        labels: cli.labels,
    })
}

/// One error in `FILE:LINE:COLUMN: error[CODE]: MESSAGE` form.
pub fn format_diagnostic(path: &str, err: &Error) -> String {
    let span = err.span();
    let code = miette::Diagnostic::code(err)
        .map(|code| code.to_string())
        .unwrap_or_default();
    format!("{path}:{}:{}: error[{code}]: {err}", span.line, span.column)
}

pub fn run(cli: &Cli, out: &mut dyn Write, diag: &mut dyn Write) -> Result<(), CliError> {
    let config = validate_cli(cli)?;
    let path = cli.input.display().to_string();
    let source = fs::read_to_string(&cli.input).map_err(|source| CliError::Read {
        path: path.clone(),
        source,
    })?;
    run_source(&config, &path, &source, out, diag)
}

/// Process already loaded source text.
pub fn run_source(
    config: &CliConfig,
    path: &str,
    source: &str,
    out: &mut dyn Write,
    diag: &mut dyn Write,
) -> Result<(), CliError> {
    let errors = if config.tokens {
        dump_tokens(source, out)?
    } else {
        match process(source, config.frontend) {
            Ok(output) => {
                for stmt in &output.module.stmts {
                    writeln!(out, "{stmt}")?;
                }
                if config.labels {
                    output.scopes.dump(out)?;
                }
                output.errors
            }
            Err(err) => vec![err],
        }
    };

    for err in &errors {
        writeln!(diag, "{}", format_diagnostic(path, err))?;
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CliError::Failed {
            path: path.to_string(),
            count: errors.len(),
        })
    }
}

fn dump_tokens(source: &str, out: &mut dyn Write) -> Result<Vec<Error>, CliError> {
    let mut errors = Vec::new();
    for token in Tokenizer::new(source) {
        match token {
            Ok(token) if token.kind == TokenKind::Eos => {
                writeln!(out, "{:>4}:{:<3} eos", token.span.line, token.span.column)?;
            }
            Ok(token) => writeln!(
                out,
                "{:>4}:{:<3} {:<24} {}",
                token.span.line,
                token.span.column,
                format!("{:?}", token.kind),
                token.text
            )?,
            Err(err) => errors.push(err.into()),
        }
    }
    Ok(errors)
}
