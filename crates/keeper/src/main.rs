// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keeper - a local, password-protected credential vault.
//!
//! This is the binary entry point.

mod busy;
mod commands;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::CommandError;

/// Exit status for configuration errors and general failures.
const EXIT_FAILURE: i32 = 1;

/// Exit status when the vault cannot be opened: wrong password or corrupt files.
const EXIT_CANNOT_OPEN: i32 = 2;

/// Keeper - a local, password-protected credential vault.
#[derive(Parser, Debug)]
#[command(name = "keeper", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable colored output and the busy spinner.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new, empty vault.
    Init,
    /// List entries sorted by site and account.
    List,
    /// Add an entry.
    Add {
        site: String,
        account: String,
        /// Generate the password instead of prompting for it.
        #[arg(long)]
        generate: bool,
    },
    /// Print an entry, including its password.
    Show {
        site: String,
        #[arg(long)]
        account: Option<String>,
    },
    /// Replace an entry's password. An empty answer clears it.
    SetPassword {
        site: String,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        generate: bool,
    },
    /// Change an entry's site or account, keeping its password.
    Rename {
        site: String,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        new_site: Option<String>,
        #[arg(long)]
        new_account: Option<String>,
    },
    /// Remove an entry.
    Remove {
        site: String,
        #[arg(long)]
        account: Option<String>,
    },
    /// Change the master password.
    Passwd,
    /// Print the effective configuration as TOML.
    Config,
    /// Print a random password without touching the vault.
    Generate {
        #[arg(long)]
        length: Option<usize>,
        /// Include symbols regardless of configuration.
        #[arg(long)]
        symbols: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => keeper_config::load_and_validate_path(path),
        None => keeper_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            keeper_config::render_errors(&errors);
            std::process::exit(EXIT_FAILURE);
        }
    };

    init_tracing(&config.logging.level);

    let interactive = !cli.plain && std::io::stderr().is_terminal();
    let ctx = commands::Context::new(&config, interactive);
    if let Err(e) = commands::run(cli.command, &ctx).await {
        eprintln!("keeper: {e}");
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(err: &CommandError) -> i32 {
    if err.is_cannot_open() {
        EXIT_CANNOT_OPEN
    } else {
        EXIT_FAILURE
    }
}

/// Initialize the tracing subscriber on stderr.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keeper={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
