// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External tool gateway trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::{QualifiedToolName, ToolDescriptor};

/// Uniform call contract for the external tool gateway.
///
/// The gateway discovers tools from configured servers and executes a single
/// named call with a bounded timeout. Transport-specific framing and per-call
/// session setup live behind this trait and are not part of the core.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    /// Lists every tool discoverable from the enabled servers.
    ///
    /// Returned names are `<server>___<tool>` composites with
    /// [`ToolOrigin::Server`](crate::types::ToolOrigin::Server) origin.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ParleyError>;

    /// Executes one tool call and returns its text result.
    ///
    /// A timed-out call must resolve to [`ParleyError::Timeout`] rather than
    /// hanging the caller.
    async fn call(
        &self,
        name: &QualifiedToolName,
        arguments: &serde_json::Value,
        timeout: Duration,
    ) -> Result<String, ParleyError>;
}
