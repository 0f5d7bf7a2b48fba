//! Integration tests for session resolution and silent re-authentication.

mod helpers;

use serde_json::json;

use spectra_client::transport::Method;
use spectra_client::{CodeForm, CredentialStore, ItemOptions};
use spectra_core::error::ErrorKind;
use spectra_core::types::{Credentials, PageRequest};

#[tokio::test]
async fn test_unparseable_config_is_server_unreachable() {
    let app = helpers::TestApp::new();
    app.mock
        .reply_raw(Method::Get, "/api/config", 502, "<html>Bad Gateway</html>");

    let err = app.client.session.refresh().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServerUnreachable);
    assert!(!app.client.session.snapshot().loading);
    assert_eq!(app.mock.count(Method::Get, "/api/user-info"), 0);
    assert!(app.create_requests().is_empty());
}

#[tokio::test]
async fn test_refresh_resolves_member() {
    let app = helpers::TestApp::new().as_member().await;
    let session = app.client.session.snapshot();
    assert!(session.is_authenticated());
    assert!(!session.loading);
    assert!(!app.client.session.gate().requires_challenge());
}

#[tokio::test]
async fn test_expired_cookie_relogs_in_silently() {
    let app = helpers::TestApp::remembering("alice@example.com", "pw")
        .as_member()
        .await;
    app.mock
        .fail(Method::Post, "/api/item/__RANDOM__", 401, "Unauthorized")
        .ok(Method::Post, "/api/login", json!({ "name": "alice" }))
        .ok(Method::Post, "/api/item/__RANDOM__", json!({ "short_path": "r3tr" }));

    let submission = app
        .client
        .submitter
        .submit_code(
            CodeForm {
                content: "hello".to_string(),
                language: None,
            },
            &ItemOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(submission.short_path, "r3tr");
    assert_eq!(app.mock.count(Method::Post, "/api/login"), 1);
    assert_eq!(app.create_requests().len(), 2);

    let creates = app.create_requests();
    assert_eq!(creates[0], creates[1]);
    assert!(app.client.session.snapshot().is_authenticated());
}

#[tokio::test]
async fn test_invalid_remembered_credentials_expire_session() {
    let app = helpers::TestApp::remembering("alice@example.com", "changed")
        .as_member()
        .await;
    app.mock
        .fail(Method::Get, "/api/items", 401, "Unauthorized")
        .fail(Method::Post, "/api/login", 403, "Invalid email or password");

    let err = app
        .client
        .catalog
        .list(PageRequest::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::SessionExpired);
    assert_eq!(app.mock.count(Method::Post, "/api/login"), 1);
    assert_eq!(app.mock.count(Method::Get, "/api/items"), 1);
    assert!(!app.client.session.snapshot().is_authenticated());
}

#[tokio::test]
async fn test_startup_relogin_uses_remembered_credentials() {
    let app = helpers::TestApp::remembering("alice@example.com", "pw");
    app.serve_config(false).serve_identity(None);
    app.mock
        .ok(Method::Post, "/api/login", json!({ "name": "alice" }))
        .ok(Method::Get, "/api/user-info", json!({ "name": "alice" }));

    let session = app.client.session.refresh().await.unwrap();
    assert!(session.is_authenticated());
    assert_eq!(session.identity.unwrap().name, "alice");
}

#[tokio::test]
async fn test_session_changes_are_published() {
    let app = helpers::TestApp::new().as_guest().await;
    let mut rx = app.client.session.subscribe();
    app.mock
        .ok(Method::Post, "/api/login", json!({ "name": "bob" }));

    app.client
        .session
        .login(Credentials::new("bob@example.com", "pw"), true)
        .await
        .unwrap();

    rx.changed().await.unwrap();
    assert!(rx.borrow().is_authenticated());
    assert!(app.credentials.load().await.unwrap().is_some());

    app.mock.ok(Method::Post, "/api/logout", json!(null));
    app.client.session.logout().await.unwrap();
    assert!(!app.client.session.snapshot().is_authenticated());
    assert!(app.credentials.load().await.unwrap().is_none());
}
