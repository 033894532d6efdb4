// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end intake flows over mock backends: gating, reset, group
//! eligibility, delivery, and the error path.

use std::sync::Arc;

use parley_activity::ActivityScheduler;
use parley_agent::{MessageIntake, ReplyPipeline};
use parley_config::{AiService, SettingsManager};
use parley_context::ContextStore;
use parley_core::ParleyError;
use parley_core::types::{ConversationKey, InboundMessage, Role};
use parley_test_utils::{MockBackend, MockGateway, MockSink, MockVision};

struct Harness {
    settings: Arc<SettingsManager>,
    store: Arc<ContextStore>,
    scheduler: Arc<ActivityScheduler>,
    backend: Arc<MockBackend>,
    sink: Arc<MockSink>,
    vision: Arc<MockVision>,
    intake: MessageIntake,
    _dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let settings = Arc::new(SettingsManager::load(dir.path().join("settings.json")));
    settings.add_service(AiService {
        name: "primary".to_string(),
        api_key: "k".to_string(),
        api_url: "https://api.example.com/v1".to_string(),
        model: "test-model".to_string(),
    });
    let store = Arc::new(ContextStore::load(dir.path().join("context.json"), 20));
    let scheduler = Arc::new(ActivityScheduler::new(Arc::clone(&settings)));
    let backend = Arc::new(MockBackend::new());
    let sink = Arc::new(MockSink::new());
    let pipeline = ReplyPipeline::new(
        Arc::clone(&settings),
        Arc::clone(&backend) as _,
        Arc::new(MockGateway::new()) as _,
    );
    let vision = Arc::new(MockVision::new());
    let intake = MessageIntake::new(
        Arc::clone(&settings),
        Arc::clone(&store),
        Arc::clone(&scheduler),
        pipeline,
        Arc::clone(&sink) as _,
    )
    .with_vision(Arc::clone(&vision) as _);
    Harness {
        settings,
        store,
        scheduler,
        backend,
        sink,
        vision,
        intake,
        _dir: dir,
    }
}

fn with_images(mut message: InboundMessage, urls: &[&str]) -> InboundMessage {
    message.image_urls = urls.iter().map(|u| u.to_string()).collect();
    message
}

fn group_message(group_id: &str, sender_id: &str, content: &str, mentioned: bool) -> InboundMessage {
    InboundMessage {
        sender_id: sender_id.to_string(),
        sender_name: Some("alice".to_string()),
        group_id: Some(group_id.to_string()),
        content: content.to_string(),
        mentioned,
        image_urls: Vec::new(),
    }
}

#[tokio::test]
async fn direct_message_commits_both_turns_and_delivers() {
    let h = harness();
    h.backend.push_text(r#"{"reply":["hello there"]}"#).await;

    h.intake.handle(InboundMessage::direct("u1", "hi")).await;

    let key = ConversationKey::direct("u1");
    let context = h.store.get(&key).await;
    assert_eq!(context.len(), 2);
    assert_eq!(context[0].role, Role::User);
    assert_eq!(context[0].content, "hi");
    assert_eq!(context[1].role, Role::Assistant);
    assert_eq!(context[1].content, r#"{"reply":["hello there"]}"#);

    let deliveries = h.sink.deliveries().await;
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].payload, r#"{"reply":["hello there"]}"#);
    assert!(!deliveries[0].is_group);
    assert!(deliveries[0].mention.is_none());
}

#[tokio::test]
async fn chat_disabled_drops_everything_silently() {
    let h = harness();
    h.settings.set_chat_enabled(false);

    h.intake.handle(InboundMessage::direct("u1", "hi")).await;

    assert!(h.sink.deliveries().await.is_empty());
    assert!(h.store.get(&ConversationKey::direct("u1")).await.is_empty());
    assert!(h.backend.requests().await.is_empty());
}

#[tokio::test]
async fn unlisted_group_is_dropped_before_any_commit() {
    let h = harness();
    h.intake
        .handle(group_message("42", "u1", "hello", true))
        .await;

    assert!(h.sink.deliveries().await.is_empty());
    assert!(h.store.get(&ConversationKey::group("42")).await.is_empty());
}

#[tokio::test]
async fn reset_clears_the_thread_and_acknowledges() {
    let h = harness();
    h.backend.push_text(r#"{"reply":["sure"]}"#).await;
    h.intake.handle(InboundMessage::direct("u1", "hi")).await;
    assert_eq!(h.store.get(&ConversationKey::direct("u1")).await.len(), 2);

    h.intake.handle(InboundMessage::direct("u1", "/reset")).await;

    assert!(h.store.get(&ConversationKey::direct("u1")).await.is_empty());
    let deliveries = h.sink.deliveries().await;
    assert_eq!(deliveries.len(), 2);
    assert!(deliveries[1].payload.contains("starting fresh"));
    // The reset command itself never reaches the model.
    assert_eq!(h.backend.requests().await.len(), 1);
}

#[tokio::test]
async fn mentioned_group_turn_replies_with_a_mention_and_renews() {
    let h = harness();
    h.settings.enable_group("42");
    h.backend.push_text(r#"{"reply":["yes?"]}"#).await;

    h.intake
        .handle(group_message("42", "u7", "hey bot", true))
        .await;

    let key = ConversationKey::group("42");
    let context = h.store.get(&key).await;
    assert_eq!(context[0].content, "user u7 (alice): hey bot");

    let deliveries = h.sink.deliveries().await;
    assert_eq!(deliveries.len(), 1);
    assert!(deliveries[0].is_group);
    assert_eq!(deliveries[0].mention.as_deref(), Some("u7"));
    assert!(h.scheduler.query("42") > 0.0);
}

#[tokio::test]
async fn unmentioned_turn_at_zero_activity_stays_silent_but_commits() {
    let h = harness();
    h.settings.enable_group("42");

    h.intake
        .handle(group_message("42", "u7", "talking to myself", false))
        .await;

    // The turn is on the record for future context, but nothing was
    // generated or delivered.
    assert_eq!(h.store.get(&ConversationKey::group("42")).await.len(), 1);
    assert!(h.sink.deliveries().await.is_empty());
    assert!(h.backend.requests().await.is_empty());
}

#[tokio::test]
async fn unmentioned_turn_at_full_activity_goes_through_the_judgment() {
    let h = harness();
    h.settings.enable_group("42");
    // Full activity means the dice roll always passes.
    h.scheduler.renew("42");
    h.backend.push_text("YES").await; // judgment
    h.backend.push_text(r#"{"reply":["joining in"]}"#).await;

    h.intake
        .handle(group_message("42", "u7", "anyone know rust?", false))
        .await;

    let requests = h.backend.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(requests[0].messages[1].content.contains("anyone know rust?"));

    let deliveries = h.sink.deliveries().await;
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].payload, r#"{"reply":["joining in"]}"#);
    // Unaddressed replies carry no mention.
    assert!(deliveries[0].mention.is_none());
}

#[tokio::test]
async fn negative_judgment_stays_silent() {
    let h = harness();
    h.settings.enable_group("42");
    h.scheduler.renew("42");
    h.backend.push_text("NO").await;

    h.intake
        .handle(group_message("42", "u7", "random chatter", false))
        .await;

    assert_eq!(h.backend.requests().await.len(), 1);
    assert!(h.sink.deliveries().await.is_empty());
}

#[tokio::test]
async fn image_descriptions_are_folded_into_the_user_turn() {
    let h = harness();
    h.settings.set_image_recognition_enabled(true);
    h.vision.push_description("a red fox on snow").await;
    h.vision.push_description("a chart of numbers").await;
    h.backend.push_text(r#"{"reply":["nice photos"]}"#).await;

    let message = with_images(
        InboundMessage::direct("u1", "look at these"),
        &["https://img.example/fox.png", "https://img.example/chart.png"],
    );
    h.intake.handle(message).await;

    let context = h.store.get(&ConversationKey::direct("u1")).await;
    assert_eq!(
        context[0].content,
        "look at these\n[image 1] a red fox on snow\n[image 2] a chart of numbers"
    );
    assert_eq!(
        h.vision.requests().await,
        vec!["https://img.example/fox.png", "https://img.example/chart.png"]
    );
    assert!(h.sink.notices().await.is_empty());
}

#[tokio::test]
async fn failed_recognition_degrades_to_placeholder_and_notifies_admins() {
    let h = harness();
    h.settings.set_image_recognition_enabled(true);
    h.vision
        .push_error(ParleyError::provider("vision service unavailable"))
        .await;
    h.backend.push_text(r#"{"reply":["ok"]}"#).await;

    let message = with_images(
        InboundMessage::direct("u1", "what is this"),
        &["https://img.example/x.png"],
    );
    h.intake.handle(message).await;

    // The message goes through with a placeholder; only admins hear about
    // the failure.
    let context = h.store.get(&ConversationKey::direct("u1")).await;
    assert_eq!(context[0].content, "what is this\n[image 1] (unrecognized image)");

    let notices = h.sink.notices().await;
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("image recognition failed"));
    assert_eq!(h.sink.deliveries().await.len(), 1);
}

#[tokio::test]
async fn images_are_ignored_while_recognition_is_disabled() {
    let h = harness();
    h.backend.push_text(r#"{"reply":["ok"]}"#).await;

    let message = with_images(
        InboundMessage::direct("u1", "see attached"),
        &["https://img.example/x.png"],
    );
    h.intake.handle(message).await;

    let context = h.store.get(&ConversationKey::direct("u1")).await;
    assert_eq!(context[0].content, "see attached");
    assert!(h.vision.requests().await.is_empty());
}

#[tokio::test]
async fn pipeline_failure_clears_notifies_and_apologizes() {
    let h = harness();
    h.backend.push_text(r#"{"reply":["ok"]}"#).await;
    h.intake.handle(InboundMessage::direct("u1", "hi")).await;

    // Both the tool-free generation and nothing else is scripted, so the
    // next turn hits a scripted failure.
    h.backend
        .push_error(ParleyError::provider("service melted down"))
        .await;
    h.intake.handle(InboundMessage::direct("u1", "again")).await;

    assert!(h.store.get(&ConversationKey::direct("u1")).await.is_empty());

    let notices = h.sink.notices().await;
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("service melted down"));
    assert!(notices[0].contains("u1"));

    let deliveries = h.sink.deliveries().await;
    assert_eq!(deliveries.len(), 2);
    assert!(deliveries[1].payload.contains("went wrong"));
}
