//! Typed command surface over a BiDi transport.
//!
//! A [`BidiSession`] is the one handle to the remote end; the bootstrap and
//! the bridge both hold clones of it, and reconnection logic passes the same
//! handle around rather than minting a new one.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::{BridgeError, BridgeErrorKind};
use crate::protocol::{BrowsingContextInfo, Cookie, Header};
use crate::transport::{BidiTransport, TransportEvent};

#[derive(Clone)]
pub struct BidiSession {
    transport: Arc<dyn BidiTransport>,
}

impl BidiSession {
    pub fn new(transport: Arc<dyn BidiTransport>) -> Self {
        Self { transport }
    }

    pub async fn start(&self) -> Result<(), BridgeError> {
        self.transport.start().await
    }

    pub async fn next_event(&self) -> Option<TransportEvent> {
        self.transport.next_event().await
    }

    /// Subscribe the remote end to a set of events in one command.
    pub async fn session_subscribe(&self, events: &[&str]) -> Result<(), BridgeError> {
        self.transport
            .send_command("session.subscribe", json!({ "events": events }))
            .await
            .map_err(|err| err.for_operation(BridgeErrorKind::Subscribe))?;
        Ok(())
    }

    pub async fn browsing_context_get_tree(
        &self,
    ) -> Result<Vec<BrowsingContextInfo>, BridgeError> {
        let result = self
            .transport
            .send_command("browsingContext.getTree", json!({}))
            .await
            .map_err(|err| err.for_operation(BridgeErrorKind::ContextTree))?;

        let contexts = result
            .get("contexts")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        serde_json::from_value(contexts).map_err(|err| {
            BridgeError::new(BridgeErrorKind::ContextTree)
                .with_hint(format!("undecodable context tree: {err}"))
        })
    }

    pub async fn browsing_context_navigate(
        &self,
        context: &str,
        url: &str,
    ) -> Result<(), BridgeError> {
        self.transport
            .send_command(
                "browsingContext.navigate",
                json!({ "context": context, "url": url }),
            )
            .await
            .map_err(|err| err.for_operation(BridgeErrorKind::Navigation))?;
        Ok(())
    }

    /// Install a network intercept and return its id.
    pub async fn network_add_intercept(
        &self,
        phases: &[&str],
        contexts: &[&str],
    ) -> Result<String, BridgeError> {
        let result = self
            .transport
            .send_command(
                "network.addIntercept",
                json!({ "phases": phases, "contexts": contexts }),
            )
            .await
            .map_err(|err| err.for_operation(BridgeErrorKind::InterceptInstall))?;

        result
            .get("intercept")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                BridgeError::new(BridgeErrorKind::InterceptInstall)
                    .with_hint("addIntercept response missing intercept id")
            })
    }

    pub async fn network_remove_intercept(&self, intercept: &str) -> Result<(), BridgeError> {
        self.transport
            .send_command("network.removeIntercept", json!({ "intercept": intercept }))
            .await
            .map_err(|err| err.for_operation(BridgeErrorKind::InterceptRemove))?;
        Ok(())
    }

    /// Resume a blocked request with the given header and cookie lists.
    pub async fn network_continue_request(
        &self,
        request: &str,
        headers: &[Header],
        cookies: &[Cookie],
    ) -> Result<(), BridgeError> {
        self.transport
            .send_command(
                "network.continueRequest",
                json!({ "request": request, "headers": headers, "cookies": cookies }),
            )
            .await
            .map_err(|err| err.for_operation(BridgeErrorKind::ContinueRequest))?;
        Ok(())
    }
}
