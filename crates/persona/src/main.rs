// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona - route questions to the right specialist persona.
//!
//! This is the binary entry point for the persona router CLI.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod runtime;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use persona_config::PersonaConfig;

/// Persona - route questions to the right specialist persona.
#[derive(Parser, Debug)]
#[command(name = "persona", version, about, long_about = None)]
struct Cli {
    /// Use this config file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Route one query through all classification levels.
    Route {
        query: String,
        /// User whose history informs the routing.
        #[arg(long)]
        user: Option<String>,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Check whether a query warrants a persona switch suggestion.
    Suggest {
        query: String,
        /// Persona currently active.
        #[arg(long)]
        current: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List the rule catalog.
    Catalog,
    /// Print the effective configuration.
    Config,
    /// Launch an interactive routing session.
    Shell {
        #[arg(long)]
        user: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> PersonaConfig {
    let loaded = match path {
        Some(path) => persona_config::load_and_validate_path(path),
        None => persona_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            persona_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    runtime::init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Some(Commands::Route { query, user, json }) => {
            commands::route(&config, &query, user.as_deref(), json).await
        }
        Some(Commands::Suggest {
            query,
            current,
            json,
        }) => commands::suggest(&config, &query, current.as_deref(), json).await,
        Some(Commands::Catalog) => commands::catalog(&config),
        Some(Commands::Config) => commands::print_config(&config),
        Some(Commands::Shell { user }) => shell::run_shell(&config, user).await,
        None => {
            println!("persona: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}
