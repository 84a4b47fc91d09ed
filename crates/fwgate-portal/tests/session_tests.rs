//! Integration tests for the portal session state machine

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::{mpsc, oneshot};

use fwgate_core::{Credentials, DownloadItem, DownloadKind, Error, SessionState};
use fwgate_portal::testing::{item, Answer, MockPortal, RecordingExecutor, ScriptedPrompt};
use fwgate_portal::{PortalSession, SessionConfig};

// =============================================================================
// Test Helpers
// =============================================================================

fn creds() -> Credentials {
    Credentials::new("dev@example.com", "hunter2")
}

fn portal() -> MockPortal {
    MockPortal::new("dev@example.com", "hunter2")
        .with_items(
            DownloadKind::More,
            vec![
                item("3", "Xcode 15"),
                item("1", "Kernel Debug Kit 23A344"),
                item("2", "Xcode 14.3.1"),
            ],
        )
        .with_items(
            DownloadKind::Os,
            vec![item("10", "iOS 17 beta 3"), item("11", "macOS 14 beta 3")],
        )
}

fn session_for(portal: &MockPortal) -> PortalSession {
    PortalSession::new(Arc::new(portal.clone()), SessionConfig::default())
}

async fn logged_in(portal: &MockPortal) -> PortalSession {
    let session = session_for(portal);
    session
        .login(&creds(), &ScriptedPrompt::default())
        .await
        .unwrap();
    session
}

fn titles(items: &[DownloadItem]) -> Vec<&str> {
    items.iter().map(|i| i.title.as_str()).collect()
}

// =============================================================================
// Login Tests
// =============================================================================

#[tokio::test]
async fn test_login_moves_to_logged_in() {
    let portal = portal();
    let session = session_for(&portal);
    assert_eq!(session.state(), SessionState::New);

    session
        .login(&creds(), &ScriptedPrompt::default())
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::LoggedIn);
}

#[tokio::test]
async fn test_rejected_credentials_are_not_retried() {
    let portal = portal();
    let session = session_for(&portal);

    let err = session
        .login(
            &Credentials::new("dev@example.com", "wrong"),
            &ScriptedPrompt::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Auth(_)));
    assert_eq!(portal.sign_in_count(), 1);
    assert_eq!(session.state(), SessionState::New);
}

#[tokio::test]
async fn test_two_factor_with_trusted_device() {
    let portal = portal().with_two_factor("123456");
    let session = session_for(&portal);
    let prompt = ScriptedPrompt::new([Answer::Text("123456".into())]);

    session.login(&creds(), &prompt).await.unwrap();

    assert_eq!(session.state(), SessionState::LoggedIn);
    assert_eq!(prompt.asked(), vec!["Please type your verification code:"]);
    assert_eq!(portal.calls(), vec!["sign_in", "verify_code:trusteddevice"]);
}

#[tokio::test]
async fn test_two_factor_with_sms() {
    let portal = portal().with_two_factor("654321");
    let config = SessionConfig {
        prefer_sms: true,
        ..Default::default()
    };
    let session = PortalSession::new(Arc::new(portal.clone()), config);
    let prompt = ScriptedPrompt::new([Answer::Text(" 654321\n".into())]);

    session.login(&creds(), &prompt).await.unwrap();

    assert_eq!(prompt.asked(), vec!["Please type your SMS code:"]);
    assert_eq!(
        portal.calls(),
        vec!["sign_in", "request_sms_code", "verify_code:phone"]
    );
}

#[tokio::test]
async fn test_wrong_two_factor_code_is_auth_error() {
    let portal = portal().with_two_factor("123456");
    let session = session_for(&portal);
    let prompt = ScriptedPrompt::new([Answer::Text("000000".into())]);

    let err = session.login(&creds(), &prompt).await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
    assert_eq!(session.state(), SessionState::New);
}

#[tokio::test]
async fn test_cancelled_two_factor_prompt() {
    let portal = portal().with_two_factor("123456");
    let session = session_for(&portal);
    let prompt = ScriptedPrompt::new([Answer::Cancel]);

    let err = session.login(&creds(), &prompt).await.unwrap_err();
    assert!(err.is_cancelled());
}

// =============================================================================
// Authentication Guard Tests
// =============================================================================

#[tokio::test]
async fn test_operations_before_login_are_not_authenticated() {
    let portal = portal();
    let session = session_for(&portal);

    let err = session.list_downloads(DownloadKind::Os).await.unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated(_)));

    let err = session
        .download_prompt(
            DownloadKind::Os,
            &ScriptedPrompt::default(),
            &RecordingExecutor::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated(_)));

    // Nothing reached the portal
    assert!(portal.calls().is_empty());
}

#[tokio::test]
async fn test_operations_after_close_are_not_authenticated() {
    let portal = portal();
    let session = logged_in(&portal).await;
    session.close();
    assert_eq!(session.state(), SessionState::Closed);

    let err = session
        .list_downloads_as_json(DownloadKind::More, false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated(_)));

    let err = session
        .login(&creds(), &ScriptedPrompt::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated(_)));
}

// =============================================================================
// Listing Tests
// =============================================================================

#[tokio::test]
async fn test_listing_is_sorted_and_deterministic() {
    let portal = portal();
    let session = logged_in(&portal).await;

    let first = session.list_downloads(DownloadKind::More).await.unwrap();
    let second = session.list_downloads(DownloadKind::More).await.unwrap();

    assert_eq!(
        titles(&first),
        vec!["Kernel Debug Kit 23A344", "Xcode 14.3.1", "Xcode 15"]
    );
    assert_eq!(first, second);
    assert!(first.iter().all(|i| i.kind == DownloadKind::More));
    assert_eq!(session.state(), SessionState::LoggedIn);
}

#[tokio::test]
async fn test_json_listing_round_trips() {
    let portal = portal();
    let session = logged_in(&portal).await;

    for pretty in [false, true] {
        let json = session
            .list_downloads_as_json(DownloadKind::Os, pretty)
            .await
            .unwrap();
        let decoded: Vec<DownloadItem> = serde_json::from_slice(&json).unwrap();
        assert_eq!(decoded, session.list_downloads(DownloadKind::Os).await.unwrap());
        assert_eq!(json.contains(&b'\n'), pretty);
    }
}

#[tokio::test]
async fn test_failed_listing_returns_to_logged_in() {
    let portal = portal();
    let session = logged_in(&portal).await;
    portal.fail_next_lists(1);

    let err = session.list_downloads(DownloadKind::Os).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(session.state(), SessionState::LoggedIn);
    assert!(session.list_downloads(DownloadKind::Os).await.is_ok());
}

// =============================================================================
// Download Prompt Tests
// =============================================================================

#[tokio::test]
async fn test_download_prompt_maps_indices_to_snapshot() {
    let portal = portal();
    let session = logged_in(&portal).await;
    let executor = RecordingExecutor::new();
    let prompt = ScriptedPrompt::new([Answer::Choices(vec![0, 2])]);

    let count = session
        .download_prompt(DownloadKind::More, &prompt, &executor)
        .await
        .unwrap();

    assert_eq!(count, 2);
    let batches = executor.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(titles(&batches[0]), vec!["Kernel Debug Kit 23A344", "Xcode 15"]);
    assert_eq!(session.state(), SessionState::LoggedIn);
}

#[tokio::test]
async fn test_download_prompt_cancel_is_noop() {
    let portal = portal();
    let session = logged_in(&portal).await;
    let executor = RecordingExecutor::new();

    let count = session
        .download_prompt(
            DownloadKind::More,
            &ScriptedPrompt::new([Answer::Cancel]),
            &executor,
        )
        .await
        .unwrap();

    assert_eq!(count, 0);
    assert!(executor.batches().is_empty());
    assert_eq!(session.state(), SessionState::LoggedIn);
}

#[tokio::test]
async fn test_download_prompt_empty_selection() {
    let portal = portal();
    let session = logged_in(&portal).await;
    let executor = RecordingExecutor::new();

    let count = session
        .download_prompt(
            DownloadKind::Os,
            &ScriptedPrompt::new([Answer::Choices(vec![])]),
            &executor,
        )
        .await
        .unwrap();

    assert_eq!(count, 0);
    assert!(executor.batches().is_empty());
}

#[tokio::test]
async fn test_download_prompt_out_of_range() {
    let portal = portal();
    let session = logged_in(&portal).await;
    let executor = RecordingExecutor::new();

    let err = session
        .download_prompt(
            DownloadKind::Os,
            &ScriptedPrompt::new([Answer::Choices(vec![7])]),
            &executor,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(executor.batches().is_empty());
}

#[tokio::test]
async fn test_download_prompt_empty_catalog_skips_prompt() {
    let portal = MockPortal::new("dev@example.com", "hunter2");
    let session = logged_in(&portal).await;
    let prompt = ScriptedPrompt::default();

    let count = session
        .download_prompt(DownloadKind::Os, &prompt, &RecordingExecutor::new())
        .await
        .unwrap();

    assert_eq!(count, 0);
    assert!(prompt.asked().is_empty());
}

// =============================================================================
// Watch Tests
// =============================================================================

#[tokio::test]
async fn test_watch_reports_only_new_matching_items() {
    let portal = portal();
    let session = logged_in(&portal).await;
    let (new_tx, mut new_rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let terms = ["xcode".to_string()];

    let watch = session.watch(
        &terms,
        Duration::from_millis(10),
        async {
            let _ = stop_rx.await;
        },
        |item| {
            let _ = new_tx.send(item.clone());
        },
    );

    let driver = async {
        // Wait for the baseline poll of both partitions
        while portal.calls().iter().filter(|c| c.starts_with("list_downloads")).count() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        portal.publish(DownloadKind::More, item("4", "Instruments 15"));
        portal.publish(DownloadKind::More, item("5", "Xcode 15.1 beta"));

        let reported = new_rx.recv().await.unwrap();
        let _ = stop_tx.send(());
        reported
    };

    let (result, reported) = tokio::join!(watch, driver);
    assert_eq!(result.unwrap(), 1);
    assert_eq!(reported.id, "5");
    assert_eq!(reported.kind, DownloadKind::More);
}

#[tokio::test]
async fn test_interrupted_watch_leaves_session_usable() {
    let portal = portal();
    let session = logged_in(&portal).await;

    let reported = session
        .watch(
            &["ios".to_string()],
            Duration::from_secs(3600),
            tokio::time::sleep(Duration::from_millis(50)),
            |_| panic!("nothing new was published"),
        )
        .await
        .unwrap();

    assert_eq!(reported, 0);
    assert_eq!(session.state(), SessionState::LoggedIn);

    let items = session.list_downloads(DownloadKind::Os).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(portal.sign_in_count(), 1);
}

#[tokio::test]
async fn test_watch_requires_terms() {
    let portal = portal();
    let session = logged_in(&portal).await;

    let err = session
        .watch(&[" ".to_string()], Duration::from_millis(10), async {}, |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(session.state(), SessionState::LoggedIn);
}

#[tokio::test]
async fn test_watch_poll_failure_ends_watch() {
    let portal = portal();
    let session = logged_in(&portal).await;
    portal.fail_next_lists(1);

    let err = session
        .watch(
            &["xcode".to_string()],
            Duration::from_millis(10),
            std::future::pending::<()>(),
            |_| {},
        )
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(session.state(), SessionState::LoggedIn);
}
