//! Session bootstrap and spec-transition wiring.
//!
//! [`setup`] takes a fresh BiDi session from subscription to first
//! navigation; [`connect_to_new_spec`] rebinds the already-running bridge
//! onto the current top-level context between specs without re-subscribing
//! or disturbing a live intercept.

use std::sync::Arc;

use automation_core::AutomationClient;
use futures::future::BoxFuture;
use tracing::debug;

use crate::bridge::BidiAutomation;
use crate::config::BidiConfig;
use crate::error::{BridgeError, BridgeErrorKind};
use crate::events::BridgeBus;
use crate::protocol::BIDI_EVENTS;
use crate::session::BidiSession;

/// Caller-supplied hook run after the tab is rebound but before navigation.
pub type NewTabHook = Arc<dyn Fn() -> BoxFuture<'static, Result<(), BridgeError>> + Send + Sync>;

pub struct SpecTransitionOptions {
    pub url: String,
    pub on_initialize_new_browser_tab: Option<NewTabHook>,
}

/// Bring up the bridge on a fresh session and navigate to the starting URL.
///
/// Subscription and intercept wiring are load-bearing: any failure here is
/// returned rather than leaving a half-initialized bridge behind.
pub async fn setup(
    session: BidiSession,
    automation: Arc<dyn AutomationClient>,
    bus: BridgeBus,
    cfg: BidiConfig,
    url: &str,
) -> Result<Arc<BidiAutomation>, BridgeError> {
    session.start().await?;
    // The remote end only streams events it was asked for; subscribe the
    // whole set as a unit before any context can show up.
    session.session_subscribe(&BIDI_EVENTS).await?;

    let bridge = Arc::new(BidiAutomation::new(session.clone(), automation, bus, cfg));
    Arc::clone(&bridge).start().await?;

    let top_level = current_top_level_context(&session).await?;
    debug!(target: "bidi-automation", context = %top_level, "binding initial top-level context");
    bridge.set_top_level_context_id(Some(top_level.clone())).await;

    session.browsing_context_navigate(&top_level, url).await?;

    Ok(bridge)
}

/// Rebind the existing bridge for the next spec and navigate.
///
/// The bridge instance, its subscriptions, and any live intercept are reused;
/// only the top-level binding is refreshed.
pub async fn connect_to_new_spec(
    bridge: &BidiAutomation,
    options: &SpecTransitionOptions,
) -> Result<(), BridgeError> {
    let session = bridge.session().clone();

    let top_level = current_top_level_context(&session).await?;
    debug!(target: "bidi-automation", context = %top_level, "rebinding top-level context for next spec");
    bridge.set_top_level_context_id(Some(top_level.clone())).await;

    if let Some(hook) = &options.on_initialize_new_browser_tab {
        hook().await?;
    }

    session
        .browsing_context_navigate(&top_level, &options.url)
        .await?;

    Ok(())
}

/// Immediately after a fresh session (and between specs) exactly one
/// top-level context exists; it is the first entry of the tree.
async fn current_top_level_context(session: &BidiSession) -> Result<String, BridgeError> {
    let contexts = session.browsing_context_get_tree().await?;
    contexts
        .into_iter()
        .next()
        .map(|info| info.context)
        .ok_or_else(|| {
            BridgeError::new(BridgeErrorKind::ContextTree)
                .with_hint("browsing context tree is empty")
        })
}
