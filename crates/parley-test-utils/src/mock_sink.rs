// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock outbound sink capturing deliveries and administrator notices.

use std::sync::Arc;

use async_trait::async_trait;
use parley_core::ParleyError;
use parley_core::traits::OutboundSink;
use parley_core::types::OutboundReply;
use tokio::sync::Mutex;

/// A mock sink recording everything handed to it.
pub struct MockSink {
    deliveries: Arc<Mutex<Vec<OutboundReply>>>,
    notices: Arc<Mutex<Vec<String>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            deliveries: Arc::new(Mutex::new(Vec::new())),
            notices: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replies delivered so far, in order.
    pub async fn deliveries(&self) -> Vec<OutboundReply> {
        self.deliveries.lock().await.clone()
    }

    /// Administrator notices routed so far.
    pub async fn notices(&self) -> Vec<String> {
        self.notices.lock().await.clone()
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutboundSink for MockSink {
    async fn deliver(&self, reply: OutboundReply) -> Result<(), ParleyError> {
        self.deliveries.lock().await.push(reply);
        Ok(())
    }

    async fn notify_admins(&self, summary: &str) {
        self.notices.lock().await.push(summary.to_string());
    }
}
