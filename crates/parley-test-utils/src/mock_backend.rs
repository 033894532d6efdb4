// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock model RPC service with scripted responses.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parley_core::ParleyError;
use parley_core::traits::ChatBackend;
use parley_core::types::{ChatRequest, ChatResponse, TokenUsage, ToolInvocation};
use tokio::sync::Mutex;

/// A mock backend that pops scripted results from a FIFO queue.
///
/// When the queue is empty, a default "mock reply" text is returned. Every
/// request is recorded for later inspection.
pub struct MockBackend {
    script: Arc<Mutex<VecDeque<Result<ChatResponse, ParleyError>>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a plain text response.
    pub async fn push_text(&self, text: &str) {
        self.script.lock().await.push_back(Ok(ChatResponse {
            content: text.to_string(),
            tool_calls: Vec::new(),
            usage: Some(TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            }),
        }));
    }

    /// Queues a response carrying the given tool invocations.
    pub async fn push_tool_calls(&self, calls: Vec<ToolInvocation>) {
        self.script.lock().await.push_back(Ok(ChatResponse {
            content: String::new(),
            tool_calls: calls,
            usage: None,
        }));
    }

    /// Queues a failure.
    pub async fn push_error(&self, error: ParleyError) {
        self.script.lock().await.push_back(Err(error));
    }

    /// Requests observed so far, in call order.
    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ParleyError> {
        self.requests.lock().await.push(request);
        self.script.lock().await.pop_front().unwrap_or_else(|| {
            Ok(ChatResponse {
                content: "mock reply".to_string(),
                tool_calls: Vec::new(),
                usage: None,
            })
        })
    }
}
