// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message intake coordination.
//!
//! [`MessageIntake`] is the single entry point for inbound chat messages.
//! It applies the chat and group gates, handles reset commands, folds image
//! attachments into text, commits turns to the context store, decides reply
//! eligibility for group traffic, runs the pipeline, and hands the result
//! to the outbound sink.
//!
//! `handle` never returns an error: every failure is resolved internally
//! into silence, an administrator notice, or an apology reply.

use std::sync::Arc;

use parley_activity::ActivityScheduler;
use parley_config::SettingsManager;
use parley_context::ContextStore;
use parley_core::ParleyError;
use parley_core::traits::{OutboundSink, VisionBackend};
use parley_core::types::{ConversationKey, InboundMessage, OutboundReply, Role};
use tracing::{debug, info, warn};

use crate::pipeline::ReplyPipeline;

/// Commands that wipe the conversation thread instead of generating.
const RESET_PHRASES: &[&str] = &["/reset", "reset conversation"];

const RESET_ACK: &str = "Conversation history cleared, starting fresh";

const APOLOGY: &str = "Something went wrong on my end, give me a moment and try again";

/// Maximum length of the diagnostic summary routed to administrators.
const ERROR_SUMMARY_LIMIT: usize = 500;

/// Per-message coordinator in front of the reply pipeline.
pub struct MessageIntake {
    settings: Arc<SettingsManager>,
    store: Arc<ContextStore>,
    scheduler: Arc<ActivityScheduler>,
    pipeline: ReplyPipeline,
    sink: Arc<dyn OutboundSink>,
    vision: Option<Arc<dyn VisionBackend>>,
}

impl MessageIntake {
    pub fn new(
        settings: Arc<SettingsManager>,
        store: Arc<ContextStore>,
        scheduler: Arc<ActivityScheduler>,
        pipeline: ReplyPipeline,
        sink: Arc<dyn OutboundSink>,
    ) -> Self {
        Self {
            settings,
            store,
            scheduler,
            pipeline,
            sink,
            vision: None,
        }
    }

    /// Enables image-to-text preprocessing through the given backend.
    pub fn with_vision(mut self, vision: Arc<dyn VisionBackend>) -> Self {
        self.vision = Some(vision);
        self
    }

    /// Processes one inbound message end to end.
    pub async fn handle(&self, message: InboundMessage) {
        if !self.settings.chat_enabled() {
            debug!("chat disabled, dropping inbound message");
            return;
        }
        if let Some(gid) = &message.group_id {
            if !self.settings.is_group_enabled(gid) {
                debug!(group = %gid, "group not on the allow-list, dropping");
                return;
            }
        }

        let key = message.conversation_key();
        let is_group = key.is_group();

        if is_reset_command(&message.content) {
            info!(key = %key, "conversation reset requested");
            self.store.clear(&key).await;
            self.send(&key, &[RESET_ACK], None, is_group).await;
            return;
        }

        let content = self.preprocess_images(&message).await;
        if is_group {
            self.store
                .append_group_user(&key, &message.sender_id, message.sender_name.as_deref(), &content)
                .await;
        } else {
            self.store.append(&key, Role::User, content).await;
        }

        if is_group && !self.group_reply_due(&message, &key).await {
            return;
        }

        let context = self.store.get(&key).await;
        match self.pipeline.run(&context, is_group).await {
            Ok(payload) => {
                self.store.append(&key, Role::Assistant, payload.clone()).await;
                let mention = (is_group && message.mentioned).then(|| message.sender_id.clone());
                self.deliver(OutboundReply {
                    key,
                    payload,
                    mention,
                    is_group,
                })
                .await;
            }
            Err(e) => {
                // A failed exchange leaves the thread in an unknown state;
                // wipe it so the next turn starts clean.
                warn!(key = %key, error = %e, "reply pipeline failed, clearing thread");
                self.store.clear(&key).await;
                self.sink.notify_admins(&error_summary(&key, &e)).await;
                self.send(&key, &[APOLOGY], None, is_group).await;
            }
        }
    }

    /// Decides whether an unaddressed group turn gets a reply.
    ///
    /// A mention always replies and renews the countdown. Otherwise the
    /// message must first win a dice roll against the current activity
    /// level, then pass the model judgment; a winning turn renews.
    async fn group_reply_due(&self, message: &InboundMessage, key: &ConversationKey) -> bool {
        // Group key derivation guarantees group_id is present here.
        let Some(gid) = &message.group_id else {
            return false;
        };

        if message.mentioned {
            self.scheduler.renew(gid);
            return true;
        }

        let level = self.scheduler.query(gid);
        if rand::random::<f64>() >= level {
            debug!(group = %gid, level, "dice roll lost, staying silent");
            return false;
        }

        let context = self.store.get(key).await;
        match self.pipeline.should_reply_in_group(&context).await {
            Ok(true) => {
                self.scheduler.renew(gid);
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(group = %gid, error = %e, "group participation judgment failed");
                self.sink.notify_admins(&error_summary(key, &e)).await;
                false
            }
        }
    }

    /// Folds image attachments into the message text as bracketed
    /// descriptions. A failed recognition degrades to a placeholder and an
    /// administrator notice rather than blocking the message.
    async fn preprocess_images(&self, message: &InboundMessage) -> String {
        let Some(vision) = &self.vision else {
            return message.content.clone();
        };
        if message.image_urls.is_empty() || !self.settings.image_recognition_enabled() {
            return message.content.clone();
        }

        let mut content = message.content.clone();
        for (i, url) in message.image_urls.iter().enumerate() {
            let n = i + 1;
            match vision.describe_image(url).await {
                Ok(description) => {
                    content.push_str(&format!("\n[image {n}] {description}"));
                }
                Err(e) => {
                    warn!(image = %url, error = %e, "image recognition failed");
                    content.push_str(&format!("\n[image {n}] (unrecognized image)"));
                    self.sink
                        .notify_admins(&format!("image recognition failed: {e}"))
                        .await;
                }
            }
        }
        content
    }

    /// Sends a fixed segment list as a structured payload.
    async fn send(&self, key: &ConversationKey, segments: &[&str], mention: Option<String>, is_group: bool) {
        let payload = serde_json::json!({ "reply": segments }).to_string();
        self.deliver(OutboundReply {
            key: key.clone(),
            payload,
            mention,
            is_group,
        })
        .await;
    }

    async fn deliver(&self, reply: OutboundReply) {
        let key = reply.key.clone();
        if let Err(e) = self.sink.deliver(reply).await {
            warn!(key = %key, error = %e, "outbound delivery failed");
        }
    }
}

fn is_reset_command(content: &str) -> bool {
    let trimmed = content.trim();
    RESET_PHRASES
        .iter()
        .any(|phrase| trimmed.eq_ignore_ascii_case(phrase))
}

/// Redacted, length-bounded diagnostic summary for the admin channel.
fn error_summary(key: &ConversationKey, error: &ParleyError) -> String {
    let mut summary = format!("reply failed for {key}: {error}");
    if summary.len() > ERROR_SUMMARY_LIMIT {
        let mut cut = ERROR_SUMMARY_LIMIT;
        while !summary.is_char_boundary(cut) {
            cut -= 1;
        }
        summary.truncate(cut);
        summary.push_str("...");
    }
    summary
}
