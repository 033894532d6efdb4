// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Parley orchestration core.
//!
//! Two layers with different mutation models:
//! - **Bootstrap config** ([`model::ParleyConfig`]): immutable per-process
//!   TOML loaded at startup through Figment (file hierarchy plus `PARLEY_`
//!   env overrides). Paths, bounds, log level.
//! - **Runtime settings** ([`settings::SettingsManager`]): the mutable
//!   administrative record (feature flags, model services, tool servers,
//!   persona, allow-lists) persisted whole-file on every mutation.

pub mod loader;
pub mod model;
pub mod settings;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ParleyConfig;
pub use settings::{AiService, Settings, SettingsManager, ToolServer, ToolTransport};
