use std::sync::Arc;

use super::*;
use crate::app::test_helpers::{self, Call, MockApi};
use crate::net::types::Credential;
use crate::services::auth::{GuardOutcome, init_session};

#[tokio::test]
async fn select_file_uploads_with_bearer_credential() {
    let api = Arc::new(MockApi::new());
    api.push_detect(Ok(test_helpers::detect_response(3, vec![test_helpers::cat()])));
    let state = test_helpers::signed_in_state(api.clone());

    let outcome = select_file(&state, test_helpers::png("cat.png")).await;
    assert_eq!(outcome, UploadOutcome::Detected { image_id: 3, detections: 1 });
    assert_eq!(api.calls(), vec![Call::Detect { credential: "tok-1".into(), file_name: "cat.png".into() }]);
}

#[tokio::test]
async fn picker_does_not_filter_content_type() {
    let api = Arc::new(MockApi::new());
    api.push_detect(Ok(test_helpers::detect_response(3, Vec::new())));
    let state = test_helpers::signed_in_state(api.clone());

    let file = ImageFile::new("scan.pdf", "application/pdf", vec![1, 2, 3]);
    assert!(matches!(select_file(&state, file).await, UploadOutcome::Detected { .. }));
}

#[tokio::test]
async fn upload_without_credential_touches_nothing() {
    let api = Arc::new(MockApi::new());
    let state = test_helpers::test_app_state(api.clone());

    assert_eq!(select_file(&state, test_helpers::png("a.png")).await, UploadOutcome::Unauthenticated);
    assert!(state.workspace().analysis().is_none());
    assert_eq!(state.workspace().generation(), 0);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn upload_before_guard_validates_credential_is_refused() {
    let api = Arc::new(MockApi::new());
    let state = test_helpers::test_app_state(api.clone());
    state.with_session(|s| s.set(Credential::new("unvalidated")));

    assert_eq!(select_file(&state, test_helpers::png("a.png")).await, UploadOutcome::Unauthenticated);
    assert!(state.workspace().analysis().is_none());
    assert!(!api.calls().iter().any(|c| matches!(c, Call::Detect { .. })));
}

#[tokio::test]
async fn upload_during_pending_guard_waits_for_identity() {
    let api = Arc::new(MockApi::new());
    let held = api.hold_me();
    let state = test_helpers::test_app_state_with_token(api.clone(), "stored");
    let guard = tokio::spawn({
        let state = state.clone();
        async move { init_session(&state).await }
    });
    test_helpers::settle(|| !api.calls().is_empty()).await;

    assert_eq!(select_file(&state, test_helpers::png("a.png")).await, UploadOutcome::Unauthenticated);
    assert_eq!(api.calls(), vec![Call::Me { credential: "stored".into() }]);

    held.send(Ok(test_helpers::user())).unwrap();
    assert!(matches!(guard.await.unwrap(), GuardOutcome::Authenticated(_)));
    api.push_detect(Ok(test_helpers::detect_response(7, vec![test_helpers::cat()])));
    assert_eq!(
        select_file(&state, test_helpers::png("a.png")).await,
        UploadOutcome::Detected { image_id: 7, detections: 1 }
    );
}

#[tokio::test]
async fn non_image_drop_is_ignored() {
    let api = Arc::new(MockApi::new());
    let state = test_helpers::signed_in_state(api.clone());

    let file = ImageFile::new("notes.txt", "text/plain", b"hi".to_vec());
    assert_eq!(drop_file(&state, Some(file)).await, UploadOutcome::Ignored);
    assert_eq!(drop_file(&state, None).await, UploadOutcome::Ignored);
    assert!(state.workspace().analysis().is_none());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn image_drop_is_uploaded() {
    let api = Arc::new(MockApi::new());
    api.push_detect(Ok(test_helpers::detect_response(4, vec![test_helpers::cat()])));
    let state = test_helpers::signed_in_state(api);

    let outcome = drop_file(&state, Some(test_helpers::png("a.png"))).await;
    assert_eq!(outcome, UploadOutcome::Detected { image_id: 4, detections: 1 });
}

#[tokio::test]
async fn reupload_resets_previous_results_before_dispatch() {
    let api = Arc::new(MockApi::new());
    api.push_detect(Ok(test_helpers::detect_response(1, vec![test_helpers::cat()])));
    let state = test_helpers::signed_in_state(api.clone());
    select_file(&state, test_helpers::png("a.png")).await;

    let held = api.hold_detect();
    let task = tokio::spawn({
        let state = state.clone();
        async move { select_file(&state, test_helpers::png("b.png")).await }
    });
    test_helpers::settle(|| api.calls().len() == 2).await;

    let ws = state.workspace();
    assert!(ws.image_id().is_none());
    assert!(ws.detections().is_empty());
    assert!(ws.is_detecting());
    assert!(ws.thread().bound_image_id().is_none());

    held.send(Ok(test_helpers::detect_response(2, Vec::new()))).unwrap();
    assert_eq!(task.await.unwrap(), UploadOutcome::Detected { image_id: 2, detections: 0 });
}

#[tokio::test]
async fn remove_image_returns_to_empty_intake() {
    let api = Arc::new(MockApi::new());
    api.push_detect(Ok(test_helpers::detect_response(1, vec![test_helpers::cat()])));
    let state = test_helpers::signed_in_state(api);
    select_file(&state, test_helpers::png("a.png")).await;
    let before = state.workspace().generation();

    remove_image(&state);

    let ws = state.workspace();
    assert!(ws.analysis().is_none());
    assert!(ws.thread().messages().is_empty());
    assert!(ws.generation() > before);
}
