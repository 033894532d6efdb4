// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-completions wire types.

use parley_core::types::{ChatMessage, ToolDescriptor, ToolInvocation};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A request to the `/chat/completions` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,

    pub messages: Vec<WireMessage>,

    /// Tool definitions available for the model to use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<WireTool>>,

    /// Tool-choice mode (e.g. "auto").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,

    /// Output-shape constraint (e.g. a JSON object).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Search-augmentation extension understood by compatible services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_search: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_options: Option<SearchOptions>,
}

/// Output-shape constraint.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    /// Constrains the response to a single JSON object.
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

/// Options for the search-augmentation extension.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOptions {
    pub forced_search: bool,
}

/// A single message in the wire conversation format.
#[derive(Debug, Clone, Serialize)]
pub struct WireMessage {
    pub role: String,

    /// Plain text or multimodal content parts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<WireContent>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

/// Message content -- either a plain string or an array of typed parts.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A typed content part within a multimodal message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// An image reference within a multimodal message.
#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A tool definition offered to the model.
#[derive(Debug, Clone, Serialize)]
pub struct WireTool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: WireFunctionDef,
}

/// Function half of a tool definition.
#[derive(Debug, Clone, Serialize)]
pub struct WireFunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl From<&ToolDescriptor> for WireTool {
    fn from(desc: &ToolDescriptor) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: WireFunctionDef {
                name: desc.name.clone(),
                description: desc.description.clone(),
                parameters: desc.parameters.clone(),
            },
        }
    }
}

/// A tool call as carried on the wire, in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: WireFunctionCall,
}

/// Function half of a wire tool call. Arguments travel as a JSON string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    pub arguments: String,
}

impl From<&WireToolCall> for ToolInvocation {
    fn from(call: &WireToolCall) -> Self {
        let arguments = serde_json::from_str(&call.function.arguments).unwrap_or_else(|e| {
            warn!(name = %call.function.name, error = %e, "unparseable tool arguments, substituting empty object");
            serde_json::json!({})
        });
        Self {
            id: call.id.clone(),
            name: call.function.name.clone(),
            arguments,
        }
    }
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        let tool_calls = msg.tool_calls.as_ref().map(|calls| {
            calls
                .iter()
                .map(|c| WireToolCall {
                    id: c.id.clone(),
                    call_type: "function".to_string(),
                    function: WireFunctionCall {
                        name: c.name.clone(),
                        arguments: c.arguments.to_string(),
                    },
                })
                .collect()
        });
        Self {
            role: msg.role.to_string(),
            content: Some(WireContent::Text(msg.content.clone())),
            tool_call_id: msg.tool_call_id.clone(),
            tool_calls,
        }
    }
}

// --- Response types ---

/// A response from the `/chat/completions` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

/// Token usage counters. Observability only.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Error body returned by compatible services.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}
