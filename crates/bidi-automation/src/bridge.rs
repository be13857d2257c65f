//! The BiDi protocol bridge.
//!
//! Consumes the six subscribed protocol events, keeps the browsing-context
//! bookkeeping in [`ContextState`], and feeds normalized traffic to the
//! [`AutomationClient`]. Event dispatch is strictly sequential per instance:
//! the loop finishes one handler before pulling the next event, so every
//! read/write of the tracked ids happens inside a single critical section.

use std::sync::Arc;

use automation_core::{
    AutomationClient, BrowserPreRequest, BrowserResponseReceived, ResourceType,
    TIMESTAMP_UNAVAILABLE,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::select;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::BidiConfig;
use crate::error::{BridgeError, BridgeErrorKind};
use crate::events::{BridgeBus, BridgeEvent};
use crate::metrics;
use crate::protocol::{
    collapse_headers, BeforeRequestSent, BrowsingContextInfo, FetchErrorParams, Header,
    ResponseParams,
};
use crate::resource_type::normalize_resource_type;
use crate::session::BidiSession;
use crate::state::{ContextSnapshot, ContextState, CreatedOutcome, DestroyedOutcome};
use crate::transport::TransportEvent;

/// Appended to every request resumed by this backend.
pub const WEBDRIVER_BIDI_HEADER: &str = "X-Cypress-Is-WebDriver-BiDi";
/// Additionally appended to document requests out of the AUT frame, so the
/// proxy can tell the tested application's top document from tooling traffic.
pub const AUT_FRAME_HEADER: &str = "X-Cypress-Is-AUT-Frame";

const INTERCEPT_PHASES: [&str; 1] = ["beforeRequestSent"];

pub struct BidiAutomation {
    session: BidiSession,
    automation: Arc<dyn AutomationClient>,
    bus: BridgeBus,
    cfg: BidiConfig,
    state: Mutex<ContextState>,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl BidiAutomation {
    pub fn new(
        session: BidiSession,
        automation: Arc<dyn AutomationClient>,
        bus: BridgeBus,
        cfg: BidiConfig,
    ) -> Self {
        Self {
            session,
            automation,
            bus,
            cfg,
            state: Mutex::new(ContextState::default()),
            shutdown: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start consuming protocol events. Idempotent.
    pub async fn start(self: Arc<Self>) -> Result<(), BridgeError> {
        let mut guard = self.tasks.lock().await;
        if !guard.is_empty() {
            return Ok(());
        }
        self.session.start().await?;
        guard.push(tokio::spawn(Self::event_loop(Arc::clone(&self))));
        debug!(target: "bidi-automation", "event loop started");
        Ok(())
    }

    /// Stop consuming events and wait for the loop to wind down. Safe to
    /// call more than once; a handler already in flight finishes first.
    pub async fn close(&self) {
        self.shutdown.cancel();
        let mut guard = self.tasks.lock().await;
        while let Some(task) = guard.pop() {
            let _ = task.await;
        }
    }

    pub fn session(&self) -> &BidiSession {
        &self.session
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.bus.subscribe()
    }

    /// Bind the top-level browsing context. Called by the session bootstrap
    /// at startup and again on every spec transition; rebinding never touches
    /// a live intercept.
    pub async fn set_top_level_context_id(&self, context: Option<String>) {
        debug!(target: "bidi-automation", ?context, "binding top-level context");
        self.state.lock().await.bind_top_level(context);
    }

    pub async fn context_snapshot(&self) -> ContextSnapshot {
        self.state.lock().await.snapshot()
    }

    async fn event_loop(self: Arc<Self>) {
        loop {
            select! {
                _ = self.shutdown.cancelled() => break,
                event = self.session.next_event() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        if !self.shutdown.is_cancelled() {
                            warn!(target: "bidi-automation", "event stream ended");
                            let _ = self.bus.send(BridgeEvent::Error {
                                error: BridgeError::new(BridgeErrorKind::Transport)
                                    .with_hint("event stream ended"),
                            });
                        }
                        break;
                    }
                }
            }
        }
        debug!(target: "bidi-automation", "event loop exited");
    }

    async fn handle_event(&self, event: TransportEvent) {
        metrics::record_event(&event.method);
        if self.cfg.verbose_network_logging {
            debug!(target: "bidi-automation", method = %event.method, params = %event.params, "received event");
        } else {
            trace!(target: "bidi-automation", method = %event.method, "received event");
        }

        if let Err(error) = self.process_event(event).await {
            warn!(target: "bidi-automation", %error, "event handler failed");
            let _ = self.bus.send(BridgeEvent::Error { error });
        }
    }

    async fn process_event(&self, event: TransportEvent) -> Result<(), BridgeError> {
        match event.method.as_str() {
            "network.beforeRequestSent" => {
                self.on_before_request_sent(decode(event.params)?).await
            }
            "network.responseStarted" => self.on_response_started(decode(event.params)?).await,
            "network.responseCompleted" => {
                self.on_response_completed(decode(event.params)?).await
            }
            "network.fetchError" => self.on_fetch_error(decode(event.params)?).await,
            "browsingContext.contextCreated" => {
                self.on_context_created(decode(event.params)?).await
            }
            "browsingContext.contextDestroyed" => {
                self.on_context_destroyed(decode(event.params)?).await
            }
            _ => {
                trace!(target: "bidi-automation", method = %event.method, "unhandled event");
                Ok(())
            }
        }
    }

    async fn on_context_created(&self, params: BrowsingContextInfo) -> Result<(), BridgeError> {
        let outcome = {
            let mut state = self.state.lock().await;
            state.on_context_created(&params.context, params.parent.as_deref())
        };

        let (context, top_level, needs_intercept) = match outcome {
            CreatedOutcome::Ignored => return Ok(()),
            CreatedOutcome::AutAssigned {
                context,
                top_level,
                needs_intercept,
            } => (context, top_level, needs_intercept),
        };

        debug!(
            target: "bidi-automation",
            context = %context,
            top_level = %top_level,
            "designated AUT browsing context"
        );
        let _ = self.bus.send(BridgeEvent::AutContextAssigned {
            context,
            top_level: top_level.clone(),
        });

        if !needs_intercept {
            return Ok(());
        }

        // Intercepts can only be scoped to top-level contexts, so it lives on
        // the AUT frame's direct parent and survives AUT reloads between
        // specs. Install failure is fatal: running unintercepted would break
        // the header-injection contract silently.
        let intercept = self
            .session
            .network_add_intercept(&INTERCEPT_PHASES, &[top_level.as_str()])
            .await?;
        metrics::record_intercept_install();

        let stale = {
            let mut state = self.state.lock().await;
            state.record_intercept(&top_level, intercept.clone())
        };
        match stale {
            None => {
                debug!(
                    target: "bidi-automation",
                    intercept = %intercept,
                    top_level = %top_level,
                    "installed network intercept"
                );
                let _ = self
                    .bus
                    .send(BridgeEvent::InterceptInstalled { intercept, top_level });
            }
            Some(orphan) => {
                // The binding moved on while the install was in flight; drop
                // the result instead of reinstating cleared state.
                warn!(target: "bidi-automation", intercept = %orphan, "discarding intercept for unbound context");
                if self.session.network_remove_intercept(&orphan).await.is_ok() {
                    metrics::record_intercept_removal();
                }
            }
        }

        Ok(())
    }

    async fn on_context_destroyed(&self, params: BrowsingContextInfo) -> Result<(), BridgeError> {
        let outcome = {
            let mut state = self.state.lock().await;
            state.on_context_destroyed(&params.context)
        };

        match outcome {
            DestroyedOutcome::Ignored => Ok(()),
            DestroyedOutcome::AutCleared { context } => {
                debug!(target: "bidi-automation", context = %context, "AUT browsing context destroyed");
                let _ = self.bus.send(BridgeEvent::AutContextCleared { context });
                Ok(())
            }
            DestroyedOutcome::TopLevelCleared { context, intercept } => {
                debug!(target: "bidi-automation", context = %context, "top-level browsing context destroyed");
                let _ = self
                    .bus
                    .send(BridgeEvent::TopLevelContextCleared { context });
                if let Some(intercept) = intercept {
                    self.session.network_remove_intercept(&intercept).await?;
                    metrics::record_intercept_removal();
                    debug!(target: "bidi-automation", intercept = %intercept, "removed network intercept");
                    let _ = self.bus.send(BridgeEvent::InterceptRemoved { intercept });
                }
                Ok(())
            }
        }
    }

    async fn on_before_request_sent(
        &self,
        params: BeforeRequestSent,
    ) -> Result<(), BridgeError> {
        let initiator_token = params
            .request
            .initiator_type
            .as_deref()
            .filter(|token| !token.is_empty());
        let resource_type = normalize_resource_type(initiator_token);
        let original_resource_type = initiator_token
            .or_else(|| {
                params
                    .request
                    .destination
                    .as_deref()
                    .filter(|token| !token.is_empty())
            })
            .unwrap_or_default()
            .to_string();

        let pre_request = BrowserPreRequest {
            request_id: params.request.request.clone(),
            method: params.request.method.clone(),
            url: params.request.url.clone(),
            headers: collapse_headers(&params.request.headers),
            resource_type: resource_type.clone(),
            original_resource_type,
            initiator: params.initiator.clone(),
            cdp_request_will_be_sent_timestamp: TIMESTAMP_UNAVAILABLE,
            cdp_request_will_be_sent_received_timestamp: TIMESTAMP_UNAVAILABLE,
        };

        metrics::record_pre_request();
        self.automation.on_browser_pre_request(pre_request).await;

        if !params.is_blocked {
            return Ok(());
        }

        // Requests pause at the top-level intercept; mark them so the proxy
        // can attribute the traffic, then put them back on the wire.
        let mut headers = params.request.headers.clone();
        headers.push(Header::string(WEBDRIVER_BIDI_HEADER, "true"));

        let aut_document = resource_type == ResourceType::Document
            && self
                .state
                .lock()
                .await
                .is_aut_context(params.context.as_deref());
        if aut_document {
            debug!(target: "bidi-automation", request = %params.request.request, "marking AUT document request");
            headers.push(Header::string(AUT_FRAME_HEADER, "true"));
        }

        match self
            .session
            .network_continue_request(&params.request.request, &headers, &params.request.cookies)
            .await
        {
            Ok(()) => {
                metrics::record_request_resumed();
                trace!(target: "bidi-automation", request = %params.request.request, "resumed request");
                Ok(())
            }
            Err(err) if err.is_missing_request() => {
                // The host application went away mid-flight; nothing left to
                // resume.
                debug!(target: "bidi-automation", request = %params.request.request, "request gone before continuation");
                metrics::record_resume_race_swallowed();
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn on_response_started(&self, params: ResponseParams) -> Result<(), BridgeError> {
        if params.response.from_cache {
            // A cached response never completes on the wire; release the
            // pending pre-request so nothing waits on it.
            metrics::record_pre_request_removal();
            self.automation
                .on_remove_browser_pre_request(&params.request.request)
                .await;
        }
        Ok(())
    }

    async fn on_response_completed(&self, params: ResponseParams) -> Result<(), BridgeError> {
        if params.response.from_cache {
            metrics::record_pre_request_removal();
            self.automation
                .on_remove_browser_pre_request(&params.request.request)
                .await;
            return Ok(());
        }

        let payload = BrowserResponseReceived {
            request_id: params.request.request.clone(),
            status: params.response.status,
            headers: collapse_headers(&params.response.headers),
        };
        metrics::record_response_forwarded();
        self.automation
            .on_request_event("response:received", payload)
            .await;
        Ok(())
    }

    async fn on_fetch_error(&self, params: FetchErrorParams) -> Result<(), BridgeError> {
        debug!(
            target: "bidi-automation",
            request = %params.request.request,
            error = %params.error_text,
            "request failed at fetch layer"
        );
        metrics::record_pre_request_removal();
        self.automation
            .on_remove_browser_pre_request(&params.request.request)
            .await;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(params: Value) -> Result<T, BridgeError> {
    serde_json::from_value(params)
        .map_err(|err| BridgeError::new(BridgeErrorKind::Internal).with_hint(err.to_string()))
}
