// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded, persisted per-conversation context store.
//!
//! [`ContextStore`] keeps one append-only log per [`ConversationKey`],
//! bounded to a maximum length with FIFO eviction, and writes the whole
//! keyed record to disk on every mutation (temp file + rename, so a crash
//! mid-write never leaves a partially written record).
//!
//! The in-memory view is authoritative for the running process: a failed
//! persist is logged and the calling operation still succeeds. One mutex
//! spans every read-modify-persist so concurrent appends to the same key
//! cannot interleave or lose writes.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use parley_core::types::{ChatMessage, ConversationKey, Role};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default maximum messages retained per conversation.
pub const DEFAULT_MAX_MESSAGES: usize = 20;

type Logs = HashMap<String, VecDeque<ChatMessage>>;

/// Per-conversation bounded append log, persisted to a flat keyed record.
pub struct ContextStore {
    path: PathBuf,
    max_len: usize,
    logs: Mutex<Logs>,
}

impl ContextStore {
    /// Reconstructs all logs from the persisted record at `path`.
    ///
    /// A missing or malformed record yields an empty store rather than
    /// failing startup.
    pub fn load(path: impl Into<PathBuf>, max_len: usize) -> Self {
        let path = path.into();
        let logs = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Logs>(&raw) {
                Ok(logs) => {
                    info!(path = %path.display(), conversations = logs.len(), "context record loaded");
                    logs
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "malformed context record, starting empty");
                    Logs::new()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no context record found, starting empty");
                Logs::new()
            }
        };
        Self {
            path,
            max_len,
            logs: Mutex::new(logs),
        }
    }

    /// Returns the log for `key` in chronological order; empty for an
    /// unknown key. Never fails.
    pub async fn get(&self, key: &ConversationKey) -> Vec<ChatMessage> {
        let logs = self.logs.lock().await;
        logs.get(key.as_str())
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Appends one turn, enforcing the FIFO bound, and persists.
    pub async fn append(&self, key: &ConversationKey, role: Role, content: impl Into<String>) {
        let mut logs = self.logs.lock().await;
        let log = logs.entry(key.as_str().to_string()).or_default();
        push_bounded(log, ChatMessage::text(role, content), self.max_len);
        debug!(key = %key, len = log.len(), "message appended");
        self.persist(&logs);
    }

    /// Appends a group user turn annotated with sender identity, so the
    /// model can distinguish speakers in shared context.
    pub async fn append_group_user(
        &self,
        key: &ConversationKey,
        sender_id: &str,
        sender_name: Option<&str>,
        content: &str,
    ) {
        let annotated = format!(
            "user {sender_id} ({}): {content}",
            sender_name.unwrap_or("unknown")
        );
        self.append(key, Role::User, annotated).await;
    }

    /// Removes the key entirely and persists. Clearing an absent key is a
    /// no-op, not an error.
    pub async fn clear(&self, key: &ConversationKey) {
        let mut logs = self.logs.lock().await;
        if logs.remove(key.as_str()).is_some() {
            info!(key = %key, "conversation log cleared");
            self.persist(&logs);
        }
    }

    /// Whole-file overwrite via temp file + rename. Failure is logged; the
    /// in-memory state is not rolled back.
    fn persist(&self, logs: &Logs) {
        if let Err(e) = write_record(&self.path, logs) {
            warn!(path = %self.path.display(), error = %e, "failed to persist context record");
        }
    }
}

/// Appends `msg`, evicting the oldest entries so the log never exceeds
/// `max_len` after the mutation.
fn push_bounded(log: &mut VecDeque<ChatMessage>, msg: ChatMessage, max_len: usize) {
    log.push_back(msg);
    while log.len() > max_len {
        log.pop_front();
    }
}

fn write_record(path: &Path, logs: &Logs) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_vec_pretty(logs)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, raw)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store(dir: &tempfile::TempDir) -> ContextStore {
        ContextStore::load(dir.path().join("contexts.json"), DEFAULT_MAX_MESSAGES)
    }

    #[tokio::test]
    async fn first_append_then_get_returns_single_turn() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        let key = ConversationKey::direct("u1");

        assert!(s.get(&key).await.is_empty());
        s.append(&key, Role::User, "hi").await;

        let log = s.get(&key).await;
        assert_eq!(log, vec![ChatMessage::text(Role::User, "hi")]);
    }

    #[tokio::test]
    async fn bound_20_store_keeps_messages_6_through_25() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        let key = ConversationKey::direct("u1");

        for i in 1..=25 {
            s.append(&key, Role::User, format!("m{i}")).await;
        }

        let log = s.get(&key).await;
        assert_eq!(log.len(), 20);
        assert_eq!(log[0].content, "m6");
        assert_eq!(log[19].content, "m25");
    }

    #[tokio::test]
    async fn clear_then_get_is_empty_and_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        let key = ConversationKey::direct("u1");

        s.append(&key, Role::User, "hi").await;
        s.clear(&key).await;
        assert!(s.get(&key).await.is_empty());
        // Second clear on the now-absent key is a no-op.
        s.clear(&key).await;
        assert!(s.get(&key).await.is_empty());
    }

    #[tokio::test]
    async fn group_turns_are_annotated_with_sender_identity() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        let key = ConversationKey::group("42");

        s.append_group_user(&key, "1001", Some("alice"), "hello all")
            .await;

        let log = s.get(&key).await;
        assert_eq!(log[0].content, "user 1001 (alice): hello all");
        assert_eq!(log[0].role, Role::User);
    }

    #[tokio::test]
    async fn logs_survive_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contexts.json");
        let key = ConversationKey::direct("u1");
        {
            let s = ContextStore::load(&path, DEFAULT_MAX_MESSAGES);
            s.append(&key, Role::User, "hi").await;
            s.append(&key, Role::Assistant, "hello").await;
        }
        let s = ContextStore::load(&path, DEFAULT_MAX_MESSAGES);
        let log = s.get(&key).await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].content, "hello");
    }

    #[tokio::test]
    async fn corrupt_record_yields_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contexts.json");
        std::fs::write(&path, "not json at all").unwrap();
        let s = ContextStore::load(&path, DEFAULT_MAX_MESSAGES);
        assert!(s.get(&ConversationKey::direct("u1")).await.is_empty());
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(&dir);
        let a = ConversationKey::direct("a");
        let b = ConversationKey::group("b");

        s.append(&a, Role::User, "for a").await;
        s.append(&b, Role::User, "for b").await;
        s.clear(&a).await;

        assert!(s.get(&a).await.is_empty());
        assert_eq!(s.get(&b).await.len(), 1);
    }

    proptest! {
        /// After N+k appends the log holds exactly the last N in order.
        #[test]
        fn bounded_log_retains_last_n_in_order(total in 0usize..60, max_len in 1usize..25) {
            let mut log = VecDeque::new();
            for i in 0..total {
                push_bounded(&mut log, ChatMessage::text(Role::User, format!("m{i}")), max_len);
            }
            prop_assert!(log.len() <= max_len);
            prop_assert_eq!(log.len(), total.min(max_len));
            let first_kept = total.saturating_sub(max_len);
            for (offset, msg) in log.iter().enumerate() {
                prop_assert_eq!(&msg.content, &format!("m{}", first_kept + offset));
            }
        }
    }
}
