// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in local tools.
//!
//! Built-ins are deterministic, pure functions executed in-process. Their
//! names are plain identifiers; a name containing the reserved `___`
//! separator is never a built-in.

use parley_core::types::{ToolDescriptor, ToolOrigin};

/// Name of the clock reader tool.
pub const CURRENT_TIME: &str = "current_time";

/// Descriptors of every built-in tool, always present in the catalog.
pub fn builtin_descriptors() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor {
        name: CURRENT_TIME.to_string(),
        description: "Get the current date and time".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        }),
        origin: ToolOrigin::Builtin,
    }]
}

/// Executes a built-in tool, or returns `None` when `name` is not a
/// built-in (it is then a gateway candidate).
pub fn call_builtin(name: &str, _arguments: &serde_json::Value) -> Option<String> {
    match name {
        CURRENT_TIME => Some(current_time()),
        _ => None,
    }
}

fn current_time() -> String {
    let now = chrono::Local::now();
    format!("Current time: {}", now.format("%Y-%m-%d %H:%M:%S"))
}
