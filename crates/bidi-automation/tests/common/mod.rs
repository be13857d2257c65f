//! Shared harness for the bridge integration tests: a scripted transport
//! standing in for the remote end, plus a recording automation consumer.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use automation_core::{AutomationClient, BrowserPreRequest, BrowserResponseReceived};
use bidi_automation::{BidiTransport, BridgeError, TransportEvent};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};

pub struct MockTransport {
    events: Mutex<mpsc::Receiver<TransportEvent>>,
    commands: StdMutex<Vec<(String, Value)>>,
    scripted: StdMutex<HashMap<String, VecDeque<Result<Value, BridgeError>>>>,
}

/// Handle the test side keeps: inject events, script command results,
/// inspect what the bridge sent.
pub struct MockRemote {
    pub events_tx: mpsc::Sender<TransportEvent>,
    transport: Arc<MockTransport>,
}

impl MockRemote {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel(64);
        Self {
            events_tx,
            transport: Arc::new(MockTransport {
                events: Mutex::new(events_rx),
                commands: StdMutex::new(Vec::new()),
                scripted: StdMutex::new(HashMap::new()),
            }),
        }
    }

    pub fn transport(&self) -> Arc<dyn BidiTransport> {
        Arc::clone(&self.transport) as Arc<dyn BidiTransport>
    }

    pub async fn emit(&self, method: &str, params: Value) {
        self.events_tx
            .send(TransportEvent {
                method: method.to_string(),
                params,
            })
            .await
            .expect("bridge stopped consuming events");
    }

    /// Queue a one-shot result for the next call to `method`; later calls
    /// fall back to the built-in defaults.
    pub fn script(&self, method: &str, result: Result<Value, BridgeError>) {
        self.transport
            .scripted
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.transport
            .commands
            .lock()
            .unwrap()
            .iter()
            .filter(|(sent, _)| sent == method)
            .map(|(_, params)| params.clone())
            .collect()
    }
}

#[async_trait]
impl BidiTransport for MockTransport {
    async fn start(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        self.events.lock().await.recv().await
    }

    async fn send_command(&self, method: &str, params: Value) -> Result<Value, BridgeError> {
        self.commands
            .lock()
            .unwrap()
            .push((method.to_string(), params));

        if let Some(result) = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(|queue| queue.pop_front())
        {
            return result;
        }

        match method {
            "network.addIntercept" => Ok(json!({ "intercept": "mock-intercept-id" })),
            "browsingContext.getTree" => Ok(json!({
                "contexts": [
                    { "context": "123", "url": "about:blank", "userContext": "default", "children": [] }
                ]
            })),
            _ => Ok(json!({})),
        }
    }
}

#[derive(Default)]
pub struct RecordingAutomation {
    pre_requests: StdMutex<Vec<BrowserPreRequest>>,
    removals: StdMutex<Vec<String>>,
    request_events: StdMutex<Vec<(String, BrowserResponseReceived)>>,
}

impl RecordingAutomation {
    pub fn pre_requests(&self) -> Vec<BrowserPreRequest> {
        self.pre_requests.lock().unwrap().clone()
    }

    pub fn removals(&self) -> Vec<String> {
        self.removals.lock().unwrap().clone()
    }

    pub fn request_events(&self) -> Vec<(String, BrowserResponseReceived)> {
        self.request_events.lock().unwrap().clone()
    }
}

#[async_trait]
impl AutomationClient for RecordingAutomation {
    async fn on_browser_pre_request(&self, pre_request: BrowserPreRequest) {
        self.pre_requests.lock().unwrap().push(pre_request);
    }

    async fn on_remove_browser_pre_request(&self, request_id: &str) {
        self.removals.lock().unwrap().push(request_id.to_string());
    }

    async fn on_request_event(&self, event: &str, payload: BrowserResponseReceived) {
        self.request_events
            .lock()
            .unwrap()
            .push((event.to_string(), payload));
    }
}

/// Let queued events drain through the bridge's sequential dispatch.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(25)).await;
}

pub fn context_created(context: &str, parent: Option<&str>) -> Value {
    json!({
        "context": context,
        "parent": parent,
        "url": "https://www.foobar.com",
        "userContext": "default",
        "children": []
    })
}

pub fn context_destroyed(context: &str, parent: Option<&str>, children: Value) -> Value {
    json!({
        "context": context,
        "parent": parent,
        "url": "https://www.foobar.com",
        "userContext": "default",
        "children": children
    })
}

pub fn sample_cookie() -> Value {
    json!({
        "name": "baz",
        "value": { "type": "string", "value": "bar" },
        "domain": ".foobar.com",
        "path": "/",
        "size": 3,
        "httpOnly": true,
        "secure": true,
        "sameSite": "lax",
        "expiry": 12345
    })
}

/// A blocked xhr request out of context "123" with one header and one cookie.
pub fn before_request_sent(request_id: &str) -> Value {
    json!({
        "context": "123",
        "isBlocked": true,
        "navigation": "nav-1",
        "redirectCount": 0,
        "request": {
            "request": request_id,
            "url": "https://www.foobar.com",
            "method": "GET",
            "headers": [
                { "name": "foo", "value": { "type": "string", "value": "bar" } }
            ],
            "cookies": [sample_cookie()],
            "headersSize": 5,
            "bodySize": 10,
            "timings": null,
            "destination": "script",
            "initiatorType": "xmlhttprequest"
        },
        "timestamp": 1234567,
        "intercepts": ["mock-intercept"],
        "initiator": { "type": "preflight" }
    })
}

pub fn response_params(request_id: &str, from_cache: bool, status: u16) -> Value {
    json!({
        "context": "123",
        "navigation": "nav-1",
        "redirectCount": 0,
        "request": {
            "request": request_id,
            "url": "https://www.foobar.com",
            "method": "GET",
            "headers": [
                { "name": "foo", "value": { "type": "string", "value": "bar" } }
            ],
            "cookies": [],
            "timings": null
        },
        "response": {
            "url": "https://www.foobar.com",
            "protocol": "http/1.1",
            "status": status,
            "statusText": "OK",
            "fromCache": from_cache,
            "headers": [],
            "mimeType": "application/json",
            "bytesReceived": 47,
            "headersSize": 6,
            "bodySize": 20
        },
        "timestamp": 1234567
    })
}

pub fn fetch_error(request_id: &str) -> Value {
    json!({
        "context": "123",
        "request": {
            "request": request_id,
            "url": "https://www.foobar.com",
            "method": "GET",
            "headers": [],
            "cookies": [],
            "timings": null
        },
        "errorText": "the request could not be completed",
        "timestamp": 1234567
    })
}
