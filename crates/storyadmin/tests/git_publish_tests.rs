//! Publishing against a real (local, bare) git remote.

mod common;

use serde_json::json;

use common::TestHarness;
use storyadmin::publish::PublishPhase;
use storyadmin::PublishError;

#[tokio::test]
async fn test_first_publish_commits_config_and_routed_assets() {
    let harness = TestHarness::new();
    let store = harness
        .loaded_store(&json!({"version": "1.0", "storyThemes": []}))
        .await;
    let registry = harness.registry();
    let avatar = registry
        .store(b"avatar-bytes", "me.png", Some("avatar"))
        .await
        .unwrap();
    let other = registry.store(b"other-bytes", "castle.jpg", None).await.unwrap();

    let pipeline = harness.pipeline(store);
    let receipt = pipeline.publish(Some("Initial content")).await.unwrap();

    assert!(receipt.pushed);
    assert_eq!(receipt.files_staged, 3);
    let hash = receipt.commit_hash.expect("first publish creates a commit");
    assert_eq!(harness.remote_head("%H"), hash);
    assert_eq!(harness.remote_head("%s"), "Initial content");
    assert_eq!(
        harness.remote_head("%an <%ae>"),
        "Config Service <config@imaginelabs.com>"
    );

    let published = harness.remote_file("story.json").unwrap();
    assert_eq!(published, std::fs::read(&harness.config_path).unwrap());
    assert_eq!(
        harness
            .remote_file(&format!("avatars/{}", avatar.stored_filename))
            .unwrap(),
        b"avatar-bytes"
    );
    assert_eq!(
        harness
            .remote_file(&format!("img/{}", other.stored_filename))
            .unwrap(),
        b"other-bytes"
    );
}

#[tokio::test]
async fn test_republish_without_changes_is_idempotent() {
    let harness = TestHarness::new();
    let store = harness.loaded_store(&json!({"version": "1.0"})).await;
    let pipeline = harness.pipeline(store);

    let first = pipeline.publish(None).await.unwrap();
    assert!(first.commit_hash.is_some());
    assert_eq!(harness.remote_head("%s"), "Update story configuration");

    let second = pipeline.publish(None).await.unwrap();
    assert!(second.commit_hash.is_none());
    assert!(!second.pushed);
    assert_eq!(harness.remote_commit_count(), 1);
}

#[tokio::test]
async fn test_publish_after_replace_adds_commit() {
    let harness = TestHarness::new();
    let store = harness.loaded_store(&json!({"version": "1.0"})).await;
    let pipeline = harness.pipeline(store.clone());

    pipeline.publish(None).await.unwrap();
    store.replace(json!({"version": "1.1"})).await.unwrap();
    let receipt = pipeline.publish(Some("Bump version")).await.unwrap();

    assert!(receipt.commit_hash.is_some());
    assert_eq!(harness.remote_commit_count(), 2);
    let published: serde_json::Value =
        serde_json::from_slice(&harness.remote_file("story.json").unwrap()).unwrap();
    assert_eq!(published, json!({"version": "1.1"}));
}

#[tokio::test]
async fn test_publish_builds_on_existing_branch() {
    let harness = TestHarness::new();
    harness.seed_remote(&[("README.md", "Story content repository\n")]);
    let store = harness.loaded_store(&json!({"version": "1.0"})).await;

    harness.pipeline(store).publish(None).await.unwrap();

    assert_eq!(harness.remote_commit_count(), 2);
    assert_eq!(
        harness.remote_file("README.md").unwrap(),
        b"Story content repository\n"
    );
    assert!(harness.remote_file("story.json").is_some());
}

#[tokio::test]
async fn test_staging_directory_is_removed() {
    let harness = TestHarness::new();
    let store = harness.loaded_store(&json!({"version": "1.0"})).await;

    harness.pipeline(store).publish(None).await.unwrap();

    assert!(harness.staging_dir.exists());
    assert_eq!(harness.staging_entries(), 0);
}

#[tokio::test]
async fn test_unreachable_remote_is_unavailable() {
    let harness = TestHarness::new();
    std::fs::remove_dir_all(&harness.remote_dir).unwrap();
    let store = harness.loaded_store(&json!({"version": "1.0"})).await;

    let err = harness.pipeline(store).publish(None).await.unwrap_err();

    assert!(matches!(err, PublishError::RemoteUnavailable(_)));
    assert_eq!(harness.staging_entries(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_rejected_push_is_conflict() {
    let harness = TestHarness::new();
    harness.reject_pushes();
    let store = harness.loaded_store(&json!({"version": "1.0"})).await;

    let err = harness.pipeline(store).publish(None).await.unwrap_err();

    assert!(matches!(err, PublishError::RemoteConflict(_)), "{:?}", err);
    assert_eq!(harness.remote_commit_count(), 0);
}

#[tokio::test]
async fn test_progress_events_cover_publish() {
    let harness = TestHarness::new();
    let store = harness.loaded_store(&json!({"version": "1.0"})).await;
    let pipeline = harness.pipeline(store);
    let mut rx = pipeline.broadcaster().subscribe();

    pipeline.publish(None).await.unwrap();

    let mut phases = Vec::new();
    while let Ok(event) = rx.try_recv() {
        phases.push(event.phase);
    }
    for expected in [
        PublishPhase::Starting,
        PublishPhase::Cloning,
        PublishPhase::CheckingOut,
        PublishPhase::Copying,
        PublishPhase::StagingFiles,
        PublishPhase::Committing,
        PublishPhase::Pushing,
        PublishPhase::CleaningUp,
    ] {
        assert!(phases.contains(&expected), "missing {:?} in {:?}", expected, phases);
    }
    assert_eq!(phases.last(), Some(&PublishPhase::Completed));
}
