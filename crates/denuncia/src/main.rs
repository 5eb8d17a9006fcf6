// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Denuncia - drafting assistant for "denuncia popular" complaints.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod runtime;
mod serve;
mod shell;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use denuncia_config::DenunciaConfig;
use denuncia_core::DenunciaError;

/// Denuncia - drafting assistant for "denuncia popular" complaints.
#[derive(Parser, Debug)]
#[command(name = "denuncia", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web gateway and the WhatsApp worker.
    Serve,
    /// Draft a complaint interactively in the terminal.
    Shell,
    /// Print the SHA-256 evidence hash of a file.
    Hash {
        /// File to hash.
        file: PathBuf,
    },
    /// Validate the configuration and exit.
    CheckConfig,
}

fn load_config(path: Option<&Path>) -> DenunciaConfig {
    let loaded = match path {
        Some(path) => denuncia_config::load_and_validate_path(path),
        None => denuncia_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            denuncia_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

async fn run_hash(file: &Path) -> Result<(), DenunciaError> {
    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| DenunciaError::Validation(format!("cannot read {}: {e}", file.display())))?;
    println!(
        "{}  {}",
        denuncia_drafting::evidence::sha256_hex(&bytes),
        file.display()
    );
    Ok(())
}

fn run_check_config(config: &DenunciaConfig) {
    println!("{}", "configuration OK".green());
    println!("  service.name      = {}", config.service.name);
    println!("  storage.database  = {}", config.storage.database_path);
    let analysis = if config.gemini.api_key.is_some() {
        format!("gemini ({})", config.gemini.model)
    } else {
        "demo mode (no API key)".to_string()
    };
    println!("  analysis          = {analysis}");
    println!(
        "  gateway           = {}",
        if config.gateway.enabled {
            format!("{}:{}", config.gateway.host, config.gateway.port)
        } else {
            "disabled".to_string()
        }
    );
    println!(
        "  whatsapp          = {}",
        if config.whatsapp.enabled { "enabled" } else { "disabled" }
    );
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(load_config(cli.config.as_deref())).await,
        Some(Commands::Shell) => shell::run_shell(load_config(cli.config.as_deref())).await,
        Some(Commands::Hash { file }) => run_hash(&file).await,
        Some(Commands::CheckConfig) => {
            run_check_config(&load_config(cli.config.as_deref()));
            Ok(())
        }
        None => {
            println!("denuncia: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}
