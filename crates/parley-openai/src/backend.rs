// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend adapters resolving the current service from the settings manager.

use std::sync::Arc;

use async_trait::async_trait;
use parley_config::SettingsManager;
use parley_core::traits::{ChatBackend, VisionBackend};
use parley_core::types::{ChatRequest, ChatResponse};
use parley_core::ParleyError;

use crate::client::OpenAiClient;

/// [`ChatBackend`] and [`VisionBackend`] implementation that resolves the
/// currently selected chat or vision service on every call.
pub struct SettingsBackend {
    settings: Arc<SettingsManager>,
}

impl SettingsBackend {
    pub fn new(settings: Arc<SettingsManager>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ChatBackend for SettingsBackend {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ParleyError> {
        let service = self.settings.current_chat_service().ok_or_else(|| {
            ParleyError::Config("no model service configured for chat".to_string())
        })?;
        OpenAiClient::new(&service)?.complete(request).await
    }
}

#[async_trait]
impl VisionBackend for SettingsBackend {
    async fn describe_image(&self, url: &str) -> Result<String, ParleyError> {
        let service = self.settings.current_vision_service().ok_or_else(|| {
            ParleyError::Config("no model service configured for image recognition".to_string())
        })?;
        OpenAiClient::new(&service)?.recognize_image(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::types::{ChatMessage, ChatRequest, Role};

    #[tokio::test]
    async fn unconfigured_service_fails_with_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsManager::load(dir.path().join("settings.json")));
        let backend = SettingsBackend::new(settings);

        let request = ChatRequest::plain(vec![ChatMessage::text(Role::User, "hi")]);
        let err = backend.complete(request).await.unwrap_err();
        assert!(matches!(err, ParleyError::Config(_)));

        let err = backend.describe_image("https://img.example/x.png").await.unwrap_err();
        assert!(matches!(err, ParleyError::Config(_)));
    }
}
