// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bootstrap configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Parley bootstrap configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// Agent identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Persisted state locations and bounds.
    #[serde(default)]
    pub state: StateConfig,
}

/// Agent identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent, used in console output.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "parley".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Persisted state configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    /// Path of the flat keyed record holding the administrative settings.
    #[serde(default = "default_settings_path")]
    pub settings_path: String,

    /// Path of the flat keyed record holding per-conversation logs.
    #[serde(default = "default_context_path")]
    pub context_path: String,

    /// Maximum messages retained per conversation log.
    #[serde(default = "default_max_context_messages")]
    pub max_context_messages: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
            context_path: default_context_path(),
            max_context_messages: default_max_context_messages(),
        }
    }
}

fn state_dir() -> std::path::PathBuf {
    dirs::data_dir()
        .map(|p| p.join("parley"))
        .unwrap_or_else(|| std::path::PathBuf::from("."))
}

fn default_settings_path() -> String {
    state_dir().join("settings.json").display().to_string()
}

fn default_context_path() -> String {
    state_dir().join("contexts.json").display().to_string()
}

fn default_max_context_messages() -> usize {
    20
}
