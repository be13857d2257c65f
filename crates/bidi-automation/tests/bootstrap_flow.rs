//! Session bootstrap and spec-transition behavior.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use automation_core::AutomationClient;
use bidi_automation::{
    connect_to_new_spec, event_bus, setup, BidiConfig, BidiSession, BridgeError, BridgeErrorKind,
    SpecTransitionOptions, BIDI_EVENTS,
};
use common::{context_created, settle, MockRemote, RecordingAutomation};
use futures::future::BoxFuture;
use serde_json::json;

fn test_config() -> BidiConfig {
    BidiConfig {
        command_deadline_ms: 1_000,
        event_buffer: 64,
        verbose_network_logging: false,
    }
}

#[tokio::test]
async fn setup_subscribes_binds_and_navigates() {
    let remote = MockRemote::new();
    let automation = Arc::new(RecordingAutomation::default());
    let (bus, _) = event_bus(32);
    let session = BidiSession::new(remote.transport());

    let bridge = setup(
        session,
        Arc::clone(&automation) as Arc<dyn AutomationClient>,
        bus,
        test_config(),
        "http://localhost:4455/first-spec",
    )
    .await
    .expect("setup succeeds");

    let subscribes = remote.calls("session.subscribe");
    assert_eq!(subscribes.len(), 1);
    assert_eq!(subscribes[0]["events"], json!(BIDI_EVENTS));

    let snapshot = bridge.context_snapshot().await;
    assert_eq!(snapshot.top_level_context_id.as_deref(), Some("123"));
    assert!(snapshot.intercept_id.is_none());

    assert_eq!(
        remote.calls("browsingContext.navigate"),
        vec![json!({ "context": "123", "url": "http://localhost:4455/first-spec" })]
    );

    bridge.close().await;
}

#[tokio::test]
async fn spec_transition_rebinds_without_resubscribing_or_reinstalling() {
    let remote = MockRemote::new();
    let automation = Arc::new(RecordingAutomation::default());
    let (bus, _) = event_bus(32);
    let session = BidiSession::new(remote.transport());

    let bridge = setup(
        session,
        Arc::clone(&automation) as Arc<dyn AutomationClient>,
        bus,
        test_config(),
        "http://localhost:4455/first-spec",
    )
    .await
    .expect("setup succeeds");

    remote
        .emit(
            "browsingContext.contextCreated",
            context_created("456", Some("123")),
        )
        .await;
    settle().await;
    assert_eq!(remote.calls("network.addIntercept").len(), 1);

    let hook_runs = Arc::new(AtomicUsize::new(0));
    let hook_counter = Arc::clone(&hook_runs);
    let options = SpecTransitionOptions {
        url: "http://localhost:4455/second-spec".to_string(),
        on_initialize_new_browser_tab: Some(Arc::new(
            move || -> BoxFuture<'static, Result<(), BridgeError>> {
                let counter = Arc::clone(&hook_counter);
                Box::pin(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            },
        )),
    };

    connect_to_new_spec(&bridge, &options)
        .await
        .expect("spec transition succeeds");

    assert_eq!(hook_runs.load(Ordering::SeqCst), 1);
    assert_eq!(remote.calls("session.subscribe").len(), 1);
    assert_eq!(remote.calls("network.addIntercept").len(), 1);

    let snapshot = bridge.context_snapshot().await;
    assert_eq!(snapshot.top_level_context_id.as_deref(), Some("123"));
    assert_eq!(snapshot.intercept_id.as_deref(), Some("mock-intercept-id"));

    let navigations = remote.calls("browsingContext.navigate");
    assert_eq!(navigations.len(), 2);
    assert_eq!(navigations[1]["url"], "http://localhost:4455/second-spec");

    bridge.close().await;
}

#[tokio::test]
async fn setup_fails_when_subscription_fails() {
    let remote = MockRemote::new();
    let automation = Arc::new(RecordingAutomation::default());
    let (bus, _) = event_bus(32);
    let session = BidiSession::new(remote.transport());

    remote.script(
        "session.subscribe",
        Err(BridgeError::new(BridgeErrorKind::Transport).with_hint("socket closed")),
    );

    let result = setup(
        session,
        Arc::clone(&automation) as Arc<dyn AutomationClient>,
        bus,
        test_config(),
        "http://localhost:4455/first-spec",
    )
    .await;

    let err = result.err().expect("setup fails");
    assert_eq!(err.kind, BridgeErrorKind::Subscribe);
}

#[tokio::test]
async fn setup_fails_on_empty_context_tree() {
    let remote = MockRemote::new();
    let automation = Arc::new(RecordingAutomation::default());
    let (bus, _) = event_bus(32);
    let session = BidiSession::new(remote.transport());

    remote.script("browsingContext.getTree", Ok(json!({ "contexts": [] })));

    let result = setup(
        session,
        Arc::clone(&automation) as Arc<dyn AutomationClient>,
        bus,
        test_config(),
        "http://localhost:4455/first-spec",
    )
    .await;

    let err = result.err().expect("setup fails");
    assert_eq!(err.kind, BridgeErrorKind::ContextTree);
}

#[tokio::test]
async fn failing_new_tab_hook_aborts_the_transition() {
    let remote = MockRemote::new();
    let automation = Arc::new(RecordingAutomation::default());
    let (bus, _) = event_bus(32);
    let session = BidiSession::new(remote.transport());

    let bridge = setup(
        session,
        Arc::clone(&automation) as Arc<dyn AutomationClient>,
        bus,
        test_config(),
        "http://localhost:4455/first-spec",
    )
    .await
    .expect("setup succeeds");

    let options = SpecTransitionOptions {
        url: "http://localhost:4455/second-spec".to_string(),
        on_initialize_new_browser_tab: Some(Arc::new(
            || -> BoxFuture<'static, Result<(), BridgeError>> {
                Box::pin(async {
                    Err(BridgeError::new(BridgeErrorKind::Internal).with_hint("tab init failed"))
                })
            },
        )),
    };

    let result = connect_to_new_spec(&bridge, &options).await;
    assert!(result.is_err());

    // Navigation must not have happened for the failed transition.
    assert_eq!(remote.calls("browsingContext.navigate").len(), 1);

    bridge.close().await;
}
