//! Integration tests for the two-phase file upload flow.

mod helpers;

use std::sync::Arc;

use serde_json::json;

use spectra_client::transport::mock::MockUpload;
use spectra_client::transport::{Method, RawResponse};
use spectra_client::{ItemOptions, UploadPayload, UploadState};
use spectra_core::error::ErrorKind;

use helpers::{Observed, RecordingObserver};

fn payload(len: usize) -> UploadPayload {
    UploadPayload::new("report.pdf", vec![7u8; len])
}

#[tokio::test]
async fn test_upload_succeeds_with_monotonic_progress() {
    let app = helpers::TestApp::new().as_member().await;
    app.mock
        .ok(Method::Post, "/api/item/__RANDOM__", json!({ "short_path": "f1l3" }))
        .upload(MockUpload::Complete {
            progress: vec![(250, 1000), (250, 1000), (750, 1000), (1000, 1000)],
            response: RawResponse::new(200, json!({ "success": true }).to_string()),
        });

    let observer = RecordingObserver::new();
    let submission = app
        .client
        .submitter
        .submit_file(payload(1000), &ItemOptions::default(), observer.clone())
        .await
        .unwrap();

    assert_eq!(submission.url, format!("{}/f1l3", helpers::ORIGIN));
    let progress = observer.progress();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
    assert_eq!(progress.first(), Some(&10));
    assert_eq!(progress.last(), Some(&100));
    assert!(progress[..progress.len() - 1].iter().all(|p| *p <= 95));
    assert_eq!(observer.after_terminal(), Vec::<Observed>::new());
    assert!(observer.events().contains(&Observed::Terminal(UploadState::Succeeded)));

    let body = app.create_requests()[0].body.clone().unwrap();
    assert_eq!(body["item_type"], "File");
    assert_eq!(body["data"], "report.pdf");
    assert!(!app.client.submitter.has_active_upload());
}

#[tokio::test]
async fn test_cancel_mid_upload_aborts_and_cleans_up() {
    let app = helpers::TestApp::new().as_member().await;
    app.mock
        .ok(Method::Post, "/api/item/__RANDOM__", json!({ "short_path": "c4nc" }))
        .ok(Method::Delete, "/api/item/c4nc", json!(null))
        .upload(MockUpload::Stall {
            progress: vec![(0, 1000), (200, 1000), (400, 1000), (600, 1000), (800, 1000)],
        });

    let observer = RecordingObserver::cancelling_at(40, Arc::clone(&app.client.submitter), 2);
    let err = app
        .client
        .submitter
        .submit_file(payload(1000), &ItemOptions::default(), observer.clone())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::UploadAborted);
    assert_eq!(observer.progress(), vec![10, 27, 44]);
    assert_eq!(app.mock.count(Method::Delete, "/api/item/c4nc"), 1);
    assert_eq!(
        observer.after_terminal(),
        vec![Observed::Cleanup(true)],
        "only the cleanup report may follow the terminal state"
    );
    assert!(observer.events().contains(&Observed::Terminal(UploadState::Aborted)));
    assert!(!app.client.submitter.cancel_active_upload());
}

#[tokio::test]
async fn test_failed_cleanup_still_aborted() {
    let app = helpers::TestApp::new().as_member().await;
    app.mock
        .ok(Method::Post, "/api/item/__RANDOM__", json!({ "short_path": "0rph" }))
        .fail(Method::Delete, "/api/item/0rph", 500, "Internal error")
        .upload(MockUpload::Stall {
            progress: vec![(500, 1000)],
        });

    let observer = RecordingObserver::cancelling_at(40, Arc::clone(&app.client.submitter), 1);
    let err = app
        .client
        .submitter
        .submit_file(payload(1000), &ItemOptions::default(), observer.clone())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::UploadAborted);
    assert_eq!(observer.after_terminal(), vec![Observed::Cleanup(false)]);
}

#[tokio::test]
async fn test_transport_failure_is_upload_transport() {
    let app = helpers::TestApp::new().as_member().await;
    app.mock
        .ok(Method::Post, "/api/item/__RANDOM__", json!({ "short_path": "n3tf" }))
        .upload(MockUpload::Fail {
            progress: vec![(100, 1000)],
            message: "connection reset".to_string(),
        });

    let observer = RecordingObserver::new();
    let err = app
        .client
        .submitter
        .submit_file(payload(1000), &ItemOptions::default(), observer.clone())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::UploadTransport);
    assert!(!observer.progress().contains(&100));
    assert_eq!(app.mock.count(Method::Delete, "/api/item/n3tf"), 0);
    assert!(observer.events().contains(&Observed::Terminal(UploadState::Failed)));
}

#[tokio::test]
async fn test_failed_upload_record_can_be_discarded() {
    let app = helpers::TestApp::new().as_member().await;
    let mut events = app.client.catalog.subscribe();
    app.mock
        .ok(Method::Post, "/api/item/__RANDOM__", json!({ "short_path": "0rfn" }))
        .ok(Method::Delete, "/api/item/0rfn", json!(null))
        .upload(MockUpload::Fail {
            progress: vec![(300, 1000)],
            message: "connection reset".to_string(),
        });

    let err = app
        .client
        .submitter
        .submit_file(payload(1000), &ItemOptions::default(), RecordingObserver::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UploadTransport);
    assert_eq!(app.client.submitter.failed_upload_path().as_deref(), Some("0rfn"));
    assert_eq!(app.mock.count(Method::Delete, "/api/item/0rfn"), 0);

    let discarded = app.client.submitter.discard_failed_upload().await.unwrap();
    assert_eq!(discarded.as_deref(), Some("0rfn"));
    assert_eq!(app.mock.count(Method::Delete, "/api/item/0rfn"), 1);
    assert_eq!(events.recv().await.unwrap().short_path(), "0rfn");

    assert_eq!(app.client.submitter.discard_failed_upload().await.unwrap(), None);
    assert_eq!(app.client.submitter.failed_upload_path(), None);
    assert_eq!(app.mock.count(Method::Delete, "/api/item/0rfn"), 1);
}

#[tokio::test]
async fn test_metadata_conflict_never_uploads() {
    let app = helpers::TestApp::new().as_member().await;
    app.mock
        .fail(Method::Post, "/api/item/taken", 409, "Item already exists");

    let options = ItemOptions {
        path: spectra_client::PathAllocator::custom("taken"),
        ..ItemOptions::default()
    };
    let observer = RecordingObserver::new();
    let err = app
        .client
        .submitter
        .submit_file(payload(10), &options, observer.clone())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::PathConflict);
    assert!(app.mock.upload_calls().is_empty());
    assert!(observer.progress().is_empty());
    assert!(observer.events().contains(&Observed::State(UploadState::Idle)));
}

#[tokio::test]
async fn test_second_upload_rejected_while_first_active() {
    let app = helpers::TestApp::new().as_member().await;
    app.mock
        .ok(Method::Post, "/api/item/__RANDOM__", json!({ "short_path": "one1" }))
        .ok(Method::Delete, "/api/item/one1", json!(null))
        .upload(MockUpload::Stall { progress: vec![] });

    let submitter = Arc::clone(&app.client.submitter);
    let first = tokio::spawn(async move {
        submitter
            .submit_file(payload(100), &ItemOptions::default(), RecordingObserver::new())
            .await
    });

    for _ in 0..100 {
        if !app.mock.upload_calls().is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(app.client.submitter.has_active_upload());

    let err = app
        .client
        .submitter
        .submit_file(payload(100), &ItemOptions::default(), RecordingObserver::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(app.create_requests().len(), 1);

    assert!(app.client.submitter.cancel_active_upload());
    let first = first.await.unwrap().unwrap_err();
    assert_eq!(first.kind, ErrorKind::UploadAborted);
    assert_eq!(app.mock.count(Method::Delete, "/api/item/one1"), 1);
    assert!(!app.client.submitter.has_active_upload());
}
