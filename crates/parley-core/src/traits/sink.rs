// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound message sink trait.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::OutboundReply;

/// Delivery boundary for generated replies and administrator notices.
///
/// The sink owns segment-list parsing, multi-part sequencing with
/// inter-segment delay, and @-mention formatting. The core hands it raw
/// structured payloads only.
#[async_trait]
pub trait OutboundSink: Send + Sync {
    /// Delivers a reply to the originating conversation.
    async fn deliver(&self, reply: OutboundReply) -> Result<(), ParleyError>;

    /// Routes a redacted diagnostic summary to the administrator channel.
    ///
    /// Diagnostic detail never reaches the originating chat.
    async fn notify_admins(&self, summary: &str);
}
