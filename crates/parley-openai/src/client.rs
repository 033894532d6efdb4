// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat-completions services.

use std::time::Duration;

use parley_config::AiService;
use parley_core::ParleyError;
use parley_core::types::{ChatRequest, ChatResponse, TokenUsage, ToolChoice, ToolInvocation};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, info};

use crate::types::{
    ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse, ContentPart, ImageUrl,
    ResponseFormat, SearchOptions, WireContent, WireMessage, WireTool,
};

/// Default image-recognition prompt.
const VISION_PROMPT: &str = "Briefly describe the content of this image.";

/// Client for one named model service.
///
/// Construction is cheap; callers build a fresh client from the currently
/// selected service on every call so administrative switches take effect
/// immediately.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_url: String,
    model: String,
}

impl OpenAiClient {
    /// Creates a client for the given service configuration.
    pub fn new(service: &AiService) -> Result<Self, ParleyError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", service.api_key);
        let mut auth_value = HeaderValue::from_str(&auth)
            .map_err(|e| ParleyError::Config(format!("invalid API key header value: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert("authorization", auth_value);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| ParleyError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            api_url: service.api_url.trim_end_matches('/').to_string(),
            model: service.model.clone(),
        })
    }

    /// Sends a completion request and returns the parsed response.
    ///
    /// A 400 status surfaces as [`ParleyError::BadRequest`]; any other
    /// non-success status as [`ParleyError::Provider`].
    pub async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ParleyError> {
        let wire = self.to_wire(&request);
        let response = self.post(&wire).await?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| ParleyError::provider("response carried no choices"))?;

        let tool_calls: Vec<ToolInvocation> = choice
            .message
            .tool_calls
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(ToolInvocation::from)
            .collect();

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        if let Some(u) = usage {
            info!(
                model = %self.model,
                prompt_tokens = u.prompt_tokens,
                completion_tokens = u.completion_tokens,
                total_tokens = u.total_tokens,
                "token usage"
            );
        }

        Ok(ChatResponse {
            content: choice.message.content.clone().unwrap_or_default(),
            tool_calls,
            usage,
        })
    }

    /// Describes the image at `image_url` through a multimodal user turn.
    ///
    /// An empty recognition result is a failure, not a valid description.
    pub async fn recognize_image(&self, image_url: &str) -> Result<String, ParleyError> {
        let wire = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: Some(WireContent::Parts(vec![
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_url.to_string(),
                            detail: Some("high".to_string()),
                        },
                    },
                    ContentPart::Text {
                        text: VISION_PROMPT.to_string(),
                    },
                ])),
                tool_call_id: None,
                tool_calls: None,
            }],
            tools: None,
            tool_choice: None,
            response_format: None,
            max_tokens: Some(1000),
            enable_search: None,
            search_options: None,
        };

        let response = self.post(&wire).await?;
        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(ParleyError::EmptyResponse);
        }
        Ok(content)
    }

    fn to_wire(&self, request: &ChatRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            tools: request
                .tools
                .as_ref()
                .map(|tools| tools.iter().map(WireTool::from).collect()),
            tool_choice: request.tool_choice.map(|c| match c {
                ToolChoice::Auto => "auto".to_string(),
            }),
            response_format: request.json_response.then(ResponseFormat::json_object),
            max_tokens: request.max_tokens,
            enable_search: request.enable_search.then_some(true),
            search_options: request
                .enable_search
                .then_some(SearchOptions { forced_search: true }),
        }
    }

    async fn post(
        &self,
        wire: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ParleyError> {
        let url = format!("{}/chat/completions", self.api_url);
        let response = self
            .http
            .post(&url)
            .json(wire)
            .send()
            .await
            .map_err(|e| ParleyError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "completion response received");

        if status == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(ParleyError::BadRequest(decode_error_body(&status, &body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ParleyError::provider(decode_error_body(&status, &body)));
        }

        response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| ParleyError::Provider {
                message: format!("failed to decode completion response: {e}"),
                source: Some(Box::new(e)),
            })
    }
}

fn decode_error_body(status: &StatusCode, body: &str) -> String {
    if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(body) {
        format!(
            "service error ({}): {}",
            api_err.error.error_type.as_deref().unwrap_or("unknown"),
            api_err.error.message
        )
    } else {
        format!("service returned {status}: {body}")
    }
}
