//! Conversation manager: context scoping, switch policies, send and delete

use std::sync::atomic::Ordering;

use atlasfield_core::{ApiError, ChatRole};
use atlasfield_dashboard::services::conversation::ConversationManager;
use atlasfield_dashboard::{AppError, ThreadSwitchPolicy};

use crate::support::{thread, MockSiteApi};

fn seeded() -> std::sync::Arc<MockSiteApi> {
    let api = MockSiteApi::new();
    api.set_threads(vec![
        thread(1, Some(10), "2025-05-01T08:00:00", &["Is it too dry?", "Moisture is low."]),
        thread(2, Some(10), "2025-05-03T08:00:00", &["When to harvest?", "In about two weeks."]),
        thread(3, Some(20), "2025-05-04T08:00:00", &["Fire risk?", "Moderate."]),
        thread(4, None, "2025-05-05T08:00:00", &["What is NDVI?", "A vegetation index."]),
    ]);
    api
}

#[tokio::test]
async fn threads_are_scoped_and_newest_first() {
    let api = seeded();
    let manager = ConversationManager::new(api.clone(), ThreadSwitchPolicy::StartBlank);

    let site_threads = manager.list_threads(Some(10)).await.unwrap();
    assert_eq!(site_threads.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 1]);

    let general = manager.list_threads(None).await.unwrap();
    assert_eq!(general.iter().map(|t| t.id).collect::<Vec<_>>(), vec![4]);
}

#[tokio::test]
async fn start_blank_lists_threads_without_loading_one() {
    let api = seeded();
    let manager = ConversationManager::new(api, ThreadSwitchPolicy::StartBlank);

    manager.switch_context(Some(10)).await.unwrap();

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.context, Some(10));
    assert_eq!(snapshot.threads.len(), 2);
    assert!(snapshot.active_thread_id.is_none());
    assert!(snapshot.transcript.is_empty());
}

#[tokio::test]
async fn resume_latest_loads_the_newest_thread() {
    let api = seeded();
    let manager = ConversationManager::new(api, ThreadSwitchPolicy::ResumeLatest);

    manager.switch_context(Some(10)).await.unwrap();

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.active_thread_id, Some(2));
    assert_eq!(snapshot.transcript.len(), 2);
    assert_eq!(snapshot.transcript[0].content, "When to harvest?");
}

#[tokio::test]
async fn switching_context_resets_the_transcript() {
    let api = seeded();
    let manager = ConversationManager::new(api, ThreadSwitchPolicy::StartBlank);
    manager.switch_context(Some(10)).await.unwrap();
    manager.select_thread(1).unwrap();
    assert_eq!(manager.snapshot().transcript.len(), 2);

    manager.switch_context(Some(20)).await.unwrap();

    let snapshot = manager.snapshot();
    assert!(snapshot.transcript.is_empty());
    assert!(snapshot.active_thread_id.is_none());
    assert_eq!(snapshot.threads.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3]);
}

#[tokio::test]
async fn selecting_a_thread_of_another_context_fails() {
    let api = seeded();
    let manager = ConversationManager::new(api, ThreadSwitchPolicy::StartBlank);
    manager.switch_context(Some(10)).await.unwrap();

    let err = manager.select_thread(3).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn new_thread_keeps_existing_ones() {
    let api = seeded();
    let manager = ConversationManager::new(api.clone(), ThreadSwitchPolicy::ResumeLatest);
    manager.switch_context(Some(10)).await.unwrap();

    manager.start_new_thread();

    let snapshot = manager.snapshot();
    assert!(snapshot.transcript.is_empty());
    assert!(snapshot.active_thread_id.is_none());
    assert_eq!(snapshot.threads.len(), 2);
    assert_eq!(api.thread_ids().len(), 4);
}

#[tokio::test]
async fn sending_appends_both_turns_and_adopts_the_thread() {
    let api = MockSiteApi::new();
    let manager = ConversationManager::new(api.clone(), ThreadSwitchPolicy::StartBlank);
    manager.switch_context(Some(10)).await.unwrap();

    let reply = manager.send_message("  Should I irrigate?  ").await.unwrap();

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.transcript.len(), 2);
    assert_eq!(snapshot.transcript[0].role, ChatRole::User);
    assert_eq!(snapshot.transcript[0].content, "Should I irrigate?");
    assert_eq!(snapshot.transcript[1].role, ChatRole::Assistant);
    assert_eq!(snapshot.transcript[1].content, reply.response);
    assert_eq!(snapshot.threads.len(), 1);
    assert_eq!(snapshot.active_thread_id, Some(snapshot.threads[0].id));
    assert_eq!(
        *api.sent_messages.lock().unwrap(),
        vec![("Should I irrigate?".to_string(), Some(10))]
    );
}

#[tokio::test]
async fn empty_message_is_rejected_locally() {
    let api = MockSiteApi::new();
    let manager = ConversationManager::new(api.clone(), ThreadSwitchPolicy::StartBlank);
    manager.switch_context(None).await.unwrap();

    let err = manager.send_message("   ").await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(api.sent_messages.lock().unwrap().is_empty());
    assert!(manager.snapshot().transcript.is_empty());
}

#[tokio::test]
async fn failed_send_keeps_the_user_turn() {
    let api = MockSiteApi::new();
    api.push_reply(Err(ApiError::status(500, "assistant unavailable")));
    let manager = ConversationManager::new(api.clone(), ThreadSwitchPolicy::StartBlank);
    manager.switch_context(Some(10)).await.unwrap();
    let listings = api.list_thread_calls.load(Ordering::SeqCst);

    let err = manager.send_message("Any pests?").await.unwrap_err();

    assert!(matches!(err, AppError::Api(_)));
    let snapshot = manager.snapshot();
    assert_eq!(snapshot.transcript.len(), 1);
    assert_eq!(snapshot.transcript[0].role, ChatRole::User);
    assert_eq!(api.list_thread_calls.load(Ordering::SeqCst), listings);
}

#[tokio::test]
async fn reply_after_context_switch_is_not_appended() {
    let api = seeded();
    let gate = api.gate_chat();
    let manager = ConversationManager::new(api, ThreadSwitchPolicy::StartBlank);
    manager.switch_context(Some(10)).await.unwrap();

    let (reply, switched) = tokio::join!(manager.send_message("Is it too dry?"), async {
        let switched = manager.switch_context(Some(20)).await;
        gate.notify_one();
        switched
    });

    assert!(reply.is_ok());
    switched.unwrap();
    let snapshot = manager.snapshot();
    assert_eq!(snapshot.context, Some(20));
    assert!(snapshot.transcript.is_empty());
}

#[tokio::test]
async fn deleting_the_active_thread_resets_the_transcript() {
    let api = seeded();
    let manager = ConversationManager::new(api.clone(), ThreadSwitchPolicy::ResumeLatest);
    manager.switch_context(Some(10)).await.unwrap();
    assert_eq!(manager.snapshot().active_thread_id, Some(2));

    manager.delete_thread(2).await.unwrap();

    let snapshot = manager.snapshot();
    assert!(snapshot.active_thread_id.is_none());
    assert!(snapshot.transcript.is_empty());
    assert_eq!(snapshot.threads.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);
    assert!(!api.thread_ids().contains(&2));
}

#[tokio::test]
async fn deleting_an_inactive_thread_keeps_the_transcript() {
    let api = seeded();
    let manager = ConversationManager::new(api, ThreadSwitchPolicy::ResumeLatest);
    manager.switch_context(Some(10)).await.unwrap();

    manager.delete_thread(1).await.unwrap();

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.active_thread_id, Some(2));
    assert_eq!(snapshot.transcript.len(), 2);
}

#[tokio::test]
async fn deleting_an_unknown_thread_surfaces_not_found() {
    let api = seeded();
    let manager = ConversationManager::new(api, ThreadSwitchPolicy::StartBlank);

    let err = manager.delete_thread(99).await.unwrap_err();
    assert!(matches!(err, AppError::Api(ApiError::NotFound(_))));
}
