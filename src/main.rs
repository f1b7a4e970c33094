// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for macroasm.

use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use macroasm::cli::{run, Cli, CliError};

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "macroasm=debug",
        _ => "macroasm=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let stdout = io::stdout();
    let stderr = io::stderr();
    match run(&cli, &mut stdout.lock(), &mut stderr.lock()) {
        Ok(()) => {}
        Err(CliError::Failed { .. }) => std::process::exit(1),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
