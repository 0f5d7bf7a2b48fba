//! Integration tests for link and paste submission, path allocation and the catalog.

mod helpers;

use serde_json::json;

use spectra_client::transport::Method;
use spectra_client::{CodeForm, ItemOptions, LinkForm, PathAllocator, RANDOM_PATH};
use spectra_core::error::ErrorKind;
use spectra_core::events::ItemChange;
use spectra_core::types::{Expiration, ItemKind};

fn link(target: &str) -> LinkForm {
    LinkForm {
        target: target.to_string(),
        allow_invalid: false,
    }
}

#[tokio::test]
async fn test_invalid_link_blocked_locally() {
    let app = helpers::TestApp::new().as_member().await;
    let before = app.mock.requests().len();

    let err = app
        .client
        .submitter
        .submit_link(link("not a url"), &ItemOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(app.mock.requests().len(), before);
}

#[tokio::test]
async fn test_path_conflict_keeps_candidate() {
    let app = helpers::TestApp::new().as_member().await;
    app.mock
        .fail(Method::Post, "/api/item/notes", 409, "Item already exists");

    let options = ItemOptions {
        path: PathAllocator::custom("notes"),
        ..ItemOptions::default()
    };
    let err = app
        .client
        .submitter
        .submit_code(
            CodeForm {
                content: "todo".to_string(),
                language: None,
            },
            &options,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::PathConflict);
    assert!(err.kind.is_recoverable());
    assert_eq!(options.path.candidate(), "notes");
    assert!(!options.path.use_random());
    assert_eq!(app.create_requests().len(), 1);
}

#[tokio::test]
async fn test_unclassified_failure_passes_status_and_message() {
    let app = helpers::TestApp::new().as_guest().await;
    app.mock.fail(
        Method::Post,
        "/api/item/__RANDOM__",
        422,
        "Turnstile error: timeout-or-duplicate",
    );

    let options = ItemOptions {
        challenge_token: Some("stale".to_string()),
        ..ItemOptions::default()
    };
    let err = app
        .client
        .submitter
        .submit_link(link("https://example.com"), &options)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::UnclassifiedServer);
    assert_eq!(err.status, Some(422));
    assert_eq!(err.message, "Turnstile error: timeout-or-duplicate");
}

#[tokio::test]
async fn test_guest_always_requests_random_path() {
    let app = helpers::TestApp::new().as_guest().await;
    let gate = app.client.session.gate();

    let mut path = PathAllocator::random();
    path.set_candidate("mine");
    assert!(path.set_use_random(false, &gate).is_err());
    assert!(path.use_random());

    app.mock.ok(
        Method::Post,
        "/api/item/__RANDOM__",
        json!({ "short_path": "gU3s" }),
    );
    let options = ItemOptions {
        path,
        challenge_token: Some("token".to_string()),
        ..ItemOptions::default()
    };
    let submission = app
        .client
        .submitter
        .submit_link(link("https://example.com/a"), &options)
        .await
        .unwrap();

    assert_eq!(submission.url, format!("{}/gU3s", helpers::ORIGIN));
    let sent = app.create_requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].segments[2], RANDOM_PATH);
    assert!(!sent.iter().any(|r| r.segments.iter().any(|s| s == "mine")));
}

#[tokio::test]
async fn test_guest_writes_disabled_requires_login() {
    let app = helpers::TestApp::new();
    app.serve_config(false).serve_identity(None);
    app.client.session.refresh().await.unwrap();

    let options = ItemOptions {
        challenge_token: Some("token".to_string()),
        ..ItemOptions::default()
    };
    let err = app
        .client
        .submitter
        .submit_link(link("https://example.com"), &options)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert!(app.create_requests().is_empty());
}

#[tokio::test]
async fn test_expiration_resolved_at_submission() {
    let app = helpers::TestApp::new().as_member().await;
    app.mock.ok(
        Method::Post,
        "/api/item/__RANDOM__",
        json!({ "short_path": "ex1d" }),
    );

    let before = chrono::Utc::now();
    let options = ItemOptions {
        expiration: Expiration::OneDay,
        max_visits: Some(3),
        ..ItemOptions::default()
    };
    app.client
        .submitter
        .submit_link(link("https://example.com"), &options)
        .await
        .unwrap();

    let body = app.create_requests()[0].body.clone().unwrap();
    let expires: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(body["expires_at"].clone()).unwrap();
    let delta = expires - before;
    assert!(delta >= chrono::Duration::hours(24));
    assert!(delta < chrono::Duration::hours(24) + chrono::Duration::minutes(1));
    assert_eq!(body["max_visits"], 3);
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_catalog_sees_created_and_deleted() {
    let app = helpers::TestApp::new().as_member().await;
    let mut events = app.client.catalog.subscribe();
    app.mock
        .ok(Method::Post, "/api/item/__RANDOM__", json!({ "short_path": "c4t4" }))
        .ok(Method::Delete, "/api/item/c4t4", json!(null));

    app.client
        .submitter
        .submit_link(link("https://example.com"), &ItemOptions::default())
        .await
        .unwrap();
    app.client.catalog.delete("c4t4").await.unwrap();

    let created = events.recv().await.unwrap();
    assert_eq!(
        created.change,
        ItemChange::Created {
            short_path: "c4t4".to_string(),
            kind: ItemKind::Link,
        }
    );
    let deleted = events.recv().await.unwrap();
    assert!(matches!(deleted.change, ItemChange::Deleted { .. }));
}
