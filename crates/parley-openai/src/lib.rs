// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible chat-completions client.
//!
//! [`OpenAiClient`] speaks the `/chat/completions` wire protocol of any
//! OpenAI-compatible model service: tool catalogs with auto tool-choice,
//! JSON-object response constraints, the search-augmentation extension
//! fields, and multimodal content parts for image recognition.
//!
//! [`SettingsBackend`] adapts the client to the [`ChatBackend`] and
//! [`VisionBackend`] traits by resolving the currently selected service
//! from the settings manager on every call, so an administrator switching
//! services takes effect immediately.
//!
//! [`ChatBackend`]: parley_core::ChatBackend
//! [`VisionBackend`]: parley_core::VisionBackend

pub mod backend;
pub mod client;
pub mod types;

pub use backend::SettingsBackend;
pub use client::OpenAiClient;
