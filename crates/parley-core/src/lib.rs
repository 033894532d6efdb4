// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core types, error taxonomy, and boundary traits for the Parley
//! conversational agent orchestration core.
//!
//! This crate defines the shared vocabulary of the workspace:
//! - Conversation and message types ([`ConversationKey`], [`ChatMessage`])
//! - Tool types with the reserved `___` name separator ([`ToolInvocation`],
//!   [`QualifiedToolName`])
//! - The [`ParleyError`] taxonomy
//! - Boundary traits for the model RPC service, the tool gateway, and the
//!   outbound message sink

pub mod error;
pub mod traits;
pub mod types;

pub use error::ParleyError;
pub use traits::{ChatBackend, OutboundSink, ToolGateway, VisionBackend};
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, ConversationKey, InboundMessage, OutboundReply,
    QualifiedToolName, Role, TokenUsage, ToolDescriptor, ToolInvocation, ToolOrigin,
};
