// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley status` command implementation.
//!
//! Prints the effective configuration plus a summary of the runtime
//! settings record: feature flags, the registered model services with
//! their two current selections, and the tool-server registry.

use colored::Colorize;
use parley_config::{ParleyConfig, SettingsManager};
use parley_core::ParleyError;

pub fn run_status(config: &ParleyConfig) -> Result<(), ParleyError> {
    let settings = SettingsManager::load(&config.state.settings_path);
    let snapshot = settings.snapshot();

    println!();
    println!("  {} status", config.agent.name);
    println!("  {}", "-".repeat(35));
    println!("  settings path:   {}", config.state.settings_path);
    println!("  context path:    {}", config.state.context_path);
    println!("  context bound:   {} messages", config.state.max_context_messages);
    println!();
    println!("  chat:            {}", flag(snapshot.chat_enabled));
    println!("  tools:           {}", flag(snapshot.tools_enabled));
    println!("  search:          {}", flag(snapshot.search_enabled));
    println!("  image input:     {}", flag(snapshot.image_recognition_enabled));
    println!("  base activity:   {:.2}", snapshot.base_activity);
    println!();

    if snapshot.services.is_empty() {
        println!("  {}", "no model services configured".yellow());
    } else {
        println!("  model services:");
        for (i, service) in snapshot.services.iter().enumerate() {
            let mut markers = Vec::new();
            if snapshot.current_chat == Some(i) {
                markers.push("chat");
            }
            if snapshot.current_vision == Some(i) {
                markers.push("vision");
            }
            let marker = if markers.is_empty() {
                String::new()
            } else {
                format!(" [{}]", markers.join(", ")).green().to_string()
            };
            println!("    {} ({}){marker}", service.name, service.model);
        }
    }

    if !snapshot.tool_servers.is_empty() {
        println!();
        println!("  tool servers:");
        for (name, server) in &snapshot.tool_servers {
            println!("    {name} {}", flag(server.enabled));
        }
    }
    println!();

    Ok(())
}

fn flag(enabled: bool) -> colored::ColoredString {
    if enabled {
        "enabled".green()
    } else {
        "disabled".red()
    }
}
