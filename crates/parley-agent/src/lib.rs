// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool-call orchestration pipeline and message intake coordinator.
//!
//! This crate wires the orchestration core together per inbound message:
//!
//! - [`ReplyPipeline`] runs the two-phase decide-then-call protocol: a
//!   constrained intent probe over a working copy of the conversation,
//!   zero or more tool executions, then final-reply generation -- with one
//!   defined fallback to plain generation.
//! - [`MessageIntake`] applies group gating, decides reply eligibility
//!   (mention, dice roll against the activity level, model judgment),
//!   commits turns to the context store, and hands replies to the
//!   outbound sink.
//! - [`tools`] holds the built-in local tools offered alongside whatever
//!   the tool gateway discovers.

pub mod intake;
pub mod pipeline;
pub mod tools;

pub use intake::MessageIntake;
pub use pipeline::ReplyPipeline;
