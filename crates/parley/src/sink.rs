// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Console outbound sink.
//!
//! Parses the structured `{"reply": [...]}` payload and prints each segment
//! as its own line, with a short jittered pause between segments so
//! multi-part replies read like successive chat messages. A payload that
//! does not parse is printed raw rather than dropped.

use std::time::Duration;

use async_trait::async_trait;
use colored::Colorize;
use parley_core::ParleyError;
use parley_core::traits::OutboundSink;
use parley_core::types::OutboundReply;
use rand::Rng;
use tracing::warn;

/// Bounds for the inter-segment pause, in milliseconds.
const SEGMENT_DELAY_MS: std::ops::RangeInclusive<u64> = 300..=900;

pub struct ConsoleSink {
    agent_name: String,
}

impl ConsoleSink {
    pub fn new(agent_name: &str) -> Self {
        Self {
            agent_name: agent_name.to_string(),
        }
    }
}

#[async_trait]
impl OutboundSink for ConsoleSink {
    async fn deliver(&self, reply: OutboundReply) -> Result<(), ParleyError> {
        let segments = parse_segments(&reply.payload);
        let last = segments.len().saturating_sub(1);
        for (i, segment) in segments.iter().enumerate() {
            let prefix = format!("{}> ", self.agent_name).green().bold();
            match (&reply.mention, i) {
                (Some(target), 0) => {
                    println!("{prefix}{} {segment}", format!("@{target}").cyan());
                }
                _ => println!("{prefix}{segment}"),
            }
            if i < last {
                let pause = rand::thread_rng().gen_range(SEGMENT_DELAY_MS);
                tokio::time::sleep(Duration::from_millis(pause)).await;
            }
        }
        Ok(())
    }

    async fn notify_admins(&self, summary: &str) {
        warn!(summary, "administrator notice");
        eprintln!("{} {summary}", "[admin]".yellow());
    }
}

/// Extracts the segment list, degrading to the raw payload on anything
/// that is not a well-formed reply object.
fn parse_segments(payload: &str) -> Vec<String> {
    let parsed: Option<Vec<String>> = serde_json::from_str::<serde_json::Value>(payload)
        .ok()
        .and_then(|v| {
            let segments = v.get("reply")?.as_array()?;
            Some(
                segments
                    .iter()
                    .filter_map(|s| s.as_str().map(str::to_string))
                    .collect(),
            )
        });
    match parsed {
        Some(segments) if !segments.is_empty() => segments,
        _ => vec![payload.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_payload_splits_into_segments() {
        let segments = parse_segments(r#"{"reply":["one","two"]}"#);
        assert_eq!(segments, vec!["one", "two"]);
    }

    #[test]
    fn malformed_payload_degrades_to_raw_text() {
        assert_eq!(parse_segments("plain text"), vec!["plain text"]);
        assert_eq!(parse_segments(r#"{"reply":[]}"#), vec![r#"{"reply":[]}"#]);
        assert_eq!(parse_segments(r#"{"other":1}"#), vec![r#"{"other":1}"#]);
    }
}
