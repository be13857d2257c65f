//! The automation consumer contract.

use crate::pre_request::{BrowserPreRequest, BrowserResponseReceived};
use async_trait::async_trait;
use serde_json::Value;

/// Consumer surface both protocol backends feed.
///
/// Every method has a no-op default body: a consumer implements only the
/// hooks it cares about, and backends call every hook unconditionally. This
/// replaces optional-callback plumbing with trait capabilities.
#[async_trait]
pub trait AutomationClient: Send + Sync {
    /// Invoked once per observed request, before the request completes.
    async fn on_browser_pre_request(&self, _pre_request: BrowserPreRequest) {}

    /// Invoked when a request will never complete normally (served from
    /// cache, or failed at the fetch layer) and must not be waited on.
    async fn on_remove_browser_pre_request(&self, _request_id: &str) {}

    /// Named request events. The BiDi backend emits only `response:received`.
    async fn on_request_event(&self, _event: &str, _payload: BrowserResponseReceived) {}

    /// Service worker client traffic; not produced by the BiDi event set.
    async fn on_service_worker_client_event(&self, _event: &str, _payload: Value) {}
}

/// Consumer that ignores everything; useful as a placeholder in setups that
/// only need the wire side of a backend.
pub struct NullAutomationClient;

#[async_trait]
impl AutomationClient for NullAutomationClient {}
