// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley serve` command implementation.
//!
//! Wires the orchestration core together -- settings manager, context
//! store, activity scheduler, model backend, pipeline, intake -- and runs
//! the interactive console channel: each line typed is handled as a direct
//! message and the reply is printed through [`ConsoleSink`](crate::sink::ConsoleSink).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use colored::Colorize;
use parley_activity::ActivityScheduler;
use parley_agent::{MessageIntake, ReplyPipeline};
use parley_config::{ParleyConfig, SettingsManager};
use parley_context::ContextStore;
use parley_core::ParleyError;
use parley_core::traits::ToolGateway;
use parley_core::types::{InboundMessage, QualifiedToolName, ToolDescriptor};
use parley_openai::SettingsBackend;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::info;

use crate::sink::ConsoleSink;

/// Gateway stand-in used until a tool-server transport is wired in.
///
/// Discovers nothing, so registered tool servers contribute no catalog
/// entries and built-in tools remain available.
struct DisconnectedGateway;

#[async_trait]
impl ToolGateway for DisconnectedGateway {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ParleyError> {
        Ok(Vec::new())
    }

    async fn call(
        &self,
        name: &QualifiedToolName,
        _arguments: &serde_json::Value,
        _timeout: Duration,
    ) -> Result<String, ParleyError> {
        Err(ParleyError::gateway(format!(
            "no transport connected for tool server {:?}",
            name.server()
        )))
    }
}

/// Runs the `parley serve` command.
pub async fn run_serve(config: ParleyConfig) -> Result<(), ParleyError> {
    init_tracing(&config.agent.log_level);
    info!(agent = %config.agent.name, "starting parley serve");

    let settings = Arc::new(SettingsManager::load(&config.state.settings_path));
    let store = Arc::new(ContextStore::load(
        &config.state.context_path,
        config.state.max_context_messages,
    ));
    let scheduler = Arc::new(ActivityScheduler::new(Arc::clone(&settings)));
    let backend = Arc::new(SettingsBackend::new(Arc::clone(&settings)));

    let pipeline = ReplyPipeline::new(
        Arc::clone(&settings),
        Arc::clone(&backend) as _,
        Arc::new(DisconnectedGateway) as _,
    );
    let intake = MessageIntake::new(
        Arc::clone(&settings),
        store,
        Arc::clone(&scheduler),
        pipeline,
        Arc::new(ConsoleSink::new(&config.agent.name)) as _,
    )
    .with_vision(backend as _);

    run_console(&config, &intake).await?;

    info!("shutting down");
    scheduler.shutdown();
    Ok(())
}

/// Console channel loop. Each line is one direct message from the local
/// operator; Ctrl+C, Ctrl+D, `/quit`, and `/exit` all end the session.
async fn run_console(config: &ParleyConfig, intake: &MessageIntake) -> Result<(), ParleyError> {
    let mut rl = DefaultEditor::new()
        .map_err(|e| ParleyError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", config.agent.name.bold().green());
    println!("Type {} to exit.\n", "/quit".yellow());

    let prompt = format!("{}> ", "you".blue());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                // The prompt waits until the reply has been printed.
                intake.handle(InboundMessage::direct("console", trimmed)).await;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
