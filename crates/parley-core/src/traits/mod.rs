// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boundary traits consumed and exposed by the orchestration core.
//!
//! The core implements none of these collaborators' transports; it depends
//! only on the contracts defined here.

pub mod backend;
pub mod gateway;
pub mod sink;

pub use backend::{ChatBackend, VisionBackend};
pub use gateway::ToolGateway;
pub use sink::OutboundSink;
