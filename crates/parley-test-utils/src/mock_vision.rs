// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock image-recognition backend with scripted descriptions.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parley_core::ParleyError;
use parley_core::traits::VisionBackend;
use tokio::sync::Mutex;

/// A mock vision backend that pops scripted results from a FIFO queue.
///
/// When the queue is empty, a default description is returned. Every
/// requested URL is recorded for later inspection.
pub struct MockVision {
    script: Arc<Mutex<VecDeque<Result<String, ParleyError>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockVision {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a successful description.
    pub async fn push_description(&self, text: &str) {
        self.script.lock().await.push_back(Ok(text.to_string()));
    }

    /// Queues a failure.
    pub async fn push_error(&self, error: ParleyError) {
        self.script.lock().await.push_back(Err(error));
    }

    /// URLs requested so far, in call order.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockVision {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisionBackend for MockVision {
    async fn describe_image(&self, url: &str) -> Result<String, ParleyError> {
        self.requests.lock().await.push(url.to_string());
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("a mock image description".to_string()))
    }
}
