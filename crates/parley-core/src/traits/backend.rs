// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language-model RPC service traits.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::{ChatRequest, ChatResponse};

/// Request/response contract for the language-model RPC service.
///
/// The pipeline issues two distinct calls through this trait per turn: a
/// constrained intent probe and the final-reply generation. Implementations
/// resolve the configured model service per call.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends a completion request and returns the full response.
    ///
    /// Malformed requests surface as [`ParleyError::BadRequest`], other
    /// service failures as [`ParleyError::Provider`].
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ParleyError>;
}

/// Image-recognition RPC contract.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Describes the image at `url`, returning the recognition text.
    async fn describe_image(&self, url: &str) -> Result<String, ParleyError>;
}
