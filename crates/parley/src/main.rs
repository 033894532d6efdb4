// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - a conversational agent orchestration core.
//!
//! This is the binary entry point for the Parley agent.

use clap::{Parser, Subcommand};

mod serve;
mod sink;
mod status;

/// Parley - a conversational agent orchestration core.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the agent with the interactive console channel.
    Serve,
    /// Show the current configuration and runtime settings.
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match parley_config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("parley: invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status) => status::run_status(&config),
        None => {
            println!("parley: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("parley: {e}");
        std::process::exit(1);
    }
}
