// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock tool gateway with a preset catalog and canned results.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parley_core::ParleyError;
use parley_core::traits::ToolGateway;
use parley_core::types::{QualifiedToolName, ToolDescriptor, ToolOrigin};
use tokio::sync::Mutex;

/// A mock gateway serving a fixed catalog and per-tool canned results.
pub struct MockGateway {
    tools: Vec<ToolDescriptor>,
    results: HashMap<String, String>,
    /// One-shot scripted call failures, consumed on use.
    failures: Mutex<HashMap<String, ParleyError>>,
    fail_listing: bool,
    calls: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            results: HashMap::new(),
            failures: Mutex::new(HashMap::new()),
            fail_listing: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a discoverable tool with a canned call result.
    pub fn with_tool(mut self, server: &str, tool: &str, result: &str) -> Self {
        let name = format!("{server}___{tool}");
        self.tools.push(ToolDescriptor {
            name: name.clone(),
            description: format!("Tool {tool} from {server}"),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
            origin: ToolOrigin::Server(server.to_string()),
        });
        self.results.insert(name, result.to_string());
        self
    }

    /// Adds a discoverable tool whose first call fails with `error`.
    pub fn with_failing_call(mut self, server: &str, tool: &str, error: ParleyError) -> Self {
        let name = format!("{server}___{tool}");
        self.tools.push(ToolDescriptor {
            name: name.clone(),
            description: format!("Tool {tool} from {server}"),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
            origin: ToolOrigin::Server(server.to_string()),
        });
        self.failures.get_mut().insert(name, error);
        self
    }

    /// Makes `list_tools` fail, simulating an unreachable gateway.
    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Calls observed so far as `(qualified name, arguments)` pairs.
    pub async fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().await.clone()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolGateway for MockGateway {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ParleyError> {
        if self.fail_listing {
            return Err(ParleyError::gateway("gateway unreachable"));
        }
        Ok(self.tools.clone())
    }

    async fn call(
        &self,
        name: &QualifiedToolName,
        arguments: &serde_json::Value,
        _timeout: Duration,
    ) -> Result<String, ParleyError> {
        self.calls
            .lock()
            .await
            .push((name.to_string(), arguments.clone()));
        if let Some(error) = self.failures.lock().await.remove(&name.to_string()) {
            return Err(error);
        }
        self.results
            .get(&name.to_string())
            .cloned()
            .ok_or_else(|| ParleyError::gateway(format!("unknown server: {}", name.server())))
    }
}
