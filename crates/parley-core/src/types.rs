// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Parley workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ParleyError;

/// Reserved separator joining a server name and a tool name into a
/// qualified gateway tool name. Must not appear in either half.
pub const TOOL_NAME_SEPARATOR: &str = "___";

/// Opaque identifier for a direct or group conversation thread.
///
/// Direct keys use the user identifier verbatim; group keys are derived
/// deterministically from the group identifier. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey(String);

impl ConversationKey {
    /// Key for a direct (per-user) conversation.
    pub fn direct(user_id: &str) -> Self {
        Self(user_id.to_string())
    }

    /// Key for a group conversation, derived as `group_<id>`.
    pub fn group(group_id: &str) -> Self {
        Self(format!("group_{group_id}"))
    }

    /// Whether this key identifies a group conversation.
    pub fn is_group(&self) -> bool {
        self.0.starts_with("group_")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message role within a conversation. Ordering of messages is append-only
/// and significant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single tool invocation emitted by the model during the intent probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Call identifier, echoed back in the correlated tool-role turn.
    pub id: String,
    /// Builtin name or `<server>___<tool>` composite.
    pub name: String,
    /// Opaque argument mapping, as produced by the model.
    pub arguments: serde_json::Value,
}

/// One turn in a conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Set on tool-role turns to correlate with the originating invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Set on the assistant turn that requested tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolInvocation>>,
}

impl ChatMessage {
    /// A plain text turn.
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            tool_calls: None,
        }
    }

    /// The assistant turn recording the model's tool invocations.
    pub fn assistant_tool_calls(content: impl Into<String>, calls: Vec<ToolInvocation>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_call_id: None,
            tool_calls: Some(calls),
        }
    }

    /// A tool-role turn carrying the stringified result for `call_id`.
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(call_id.into()),
            tool_calls: None,
        }
    }
}

/// Where a catalog tool comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolOrigin {
    /// Deterministic in-process function.
    Builtin,
    /// Discovered from the named gateway server.
    Server(String),
}

/// A tool available to the intent probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Qualified name as presented to the model.
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub parameters: serde_json::Value,
    pub origin: ToolOrigin,
}

/// A validated `<server>___<tool>` composite name.
///
/// Validation happens at this boundary: gateway calls must carry the
/// reserved separator, and neither half may be empty or contain it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedToolName {
    server: String,
    tool: String,
}

impl QualifiedToolName {
    /// Parses a qualified name, rejecting names lacking the separator.
    pub fn parse(name: &str) -> Result<Self, ParleyError> {
        let Some((server, tool)) = name.split_once(TOOL_NAME_SEPARATOR) else {
            return Err(ParleyError::gateway(format!(
                "tool name {name:?} lacks the {TOOL_NAME_SEPARATOR:?} separator"
            )));
        };
        if server.is_empty() || tool.is_empty() {
            return Err(ParleyError::gateway(format!(
                "tool name {name:?} has an empty server or tool half"
            )));
        }
        if tool.contains(TOOL_NAME_SEPARATOR) {
            return Err(ParleyError::gateway(format!(
                "tool name {name:?} contains a reserved separator inside the tool half"
            )));
        }
        Ok(Self {
            server: server.to_string(),
            tool: tool.to_string(),
        })
    }

    /// Composes a qualified name, rejecting halves containing the separator.
    pub fn compose(server: &str, tool: &str) -> Result<Self, ParleyError> {
        if server.is_empty() || tool.is_empty() {
            return Err(ParleyError::gateway(
                "server and tool names must be non-empty",
            ));
        }
        if server.contains(TOOL_NAME_SEPARATOR) || tool.contains(TOOL_NAME_SEPARATOR) {
            return Err(ParleyError::gateway(format!(
                "{TOOL_NAME_SEPARATOR:?} is reserved and may not appear in server or tool names"
            )));
        }
        Ok(Self {
            server: server.to_string(),
            tool: tool.to_string(),
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }
}

impl std::fmt::Display for QualifiedToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{TOOL_NAME_SEPARATOR}{}", self.server, self.tool)
    }
}

/// Token usage counters reported by the model service.
///
/// Observability only -- these never affect control flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Tool-choice mode passed to the model service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    /// The model decides whether to invoke tools.
    Auto,
}

/// A provider-agnostic request to the language-model RPC service.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Tool catalog offered to the model, if any.
    pub tools: Option<Vec<ToolDescriptor>>,
    pub tool_choice: Option<ToolChoice>,
    /// Constrain the response to a single structured JSON payload.
    pub json_response: bool,
    pub max_tokens: Option<u32>,
    /// Ask the service to augment generation with retrieval/search.
    pub enable_search: bool,
}

impl ChatRequest {
    /// A plain generation request over the given messages.
    pub fn plain(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            tools: None,
            tool_choice: None,
            json_response: false,
            max_tokens: None,
            enable_search: false,
        }
    }
}

/// Response from the language-model RPC service.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Reply text; may be empty when the model only emitted tool calls.
    pub content: String,
    /// Tool invocations requested by the model, if any.
    pub tool_calls: Vec<ToolInvocation>,
    pub usage: Option<TokenUsage>,
}

/// An inbound chat message handed to the intake coordinator.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender_id: String,
    pub sender_name: Option<String>,
    /// `Some` for group conversations.
    pub group_id: Option<String>,
    pub content: String,
    /// Whether the bot was explicitly addressed.
    pub mentioned: bool,
    /// Image attachments, as resolvable URLs.
    pub image_urls: Vec<String>,
}

impl InboundMessage {
    /// A plain direct message, convenient for tests and the console channel.
    pub fn direct(sender_id: &str, content: &str) -> Self {
        Self {
            sender_id: sender_id.to_string(),
            sender_name: None,
            group_id: None,
            content: content.to_string(),
            mentioned: false,
            image_urls: Vec::new(),
        }
    }

    /// Resolves the conversation key for this message.
    pub fn conversation_key(&self) -> ConversationKey {
        match &self.group_id {
            Some(gid) => ConversationKey::group(gid),
            None => ConversationKey::direct(&self.sender_id),
        }
    }
}

/// The raw structured reply handed to the outbound sink.
///
/// Segment parsing and multi-part delivery are sink concerns; the payload
/// is passed through unparsed.
#[derive(Debug, Clone)]
pub struct OutboundReply {
    pub key: ConversationKey,
    /// Raw structured payload text from the pipeline.
    pub payload: String,
    /// Sender to @-mention when the reply answers an addressed group turn.
    pub mention: Option<String>,
    pub is_group: bool,
}
