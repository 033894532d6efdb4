// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley orchestration core.

use thiserror::Error;

/// The primary error type used across all Parley components.
///
/// Variants follow the recovery policy of the component that raises them:
/// gateway and timeout errors degrade locally inside the pipeline,
/// persistence errors are logged without failing the calling operation, and
/// configuration errors fail the current request fast.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Configuration errors (feature disabled, no model service configured,
    /// invalid bootstrap TOML).
    #[error("configuration error: {0}")]
    Config(String),

    /// Tool gateway errors (discovery failure, call failure, unknown server).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The model service rejected the request as malformed (HTTP 400).
    #[error("bad request to model service: {0}")]
    BadRequest(String),

    /// Model RPC service errors other than bad requests.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The model returned an empty reply; empty is not a valid reply.
    #[error("model returned an empty reply")]
    EmptyResponse,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// On-disk write failure for a persisted record.
    #[error("persistence error: {source}")]
    Persistence {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Builds a gateway error from a plain message.
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
            source: None,
        }
    }

    /// Builds a provider error from a plain message.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }
}
