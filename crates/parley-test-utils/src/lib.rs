// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides mock collaborators for fast, deterministic, CI-runnable tests
//! without external services.
//!
//! # Components
//!
//! - [`MockBackend`] - Mock model RPC service with scripted responses
//! - [`MockGateway`] - Mock tool gateway with a preset catalog and results
//! - [`MockSink`] - Mock outbound sink capturing deliveries and notices
//! - [`MockVision`] - Mock image-recognition backend with scripted results

pub mod mock_backend;
pub mod mock_gateway;
pub mod mock_sink;
pub mod mock_vision;

pub use mock_backend::MockBackend;
pub use mock_gateway::MockGateway;
pub use mock_sink::MockSink;
pub use mock_vision::MockVision;
