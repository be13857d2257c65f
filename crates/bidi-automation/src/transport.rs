//! Wire transports for the BiDi session.
//!
//! The bridge only ever talks to a [`BidiTransport`]; the concrete websocket
//! client below carries the real protocol, and test suites plug in scripted
//! implementations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex, OnceCell};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::BidiConfig;
use crate::error::{BridgeError, BridgeErrorKind};

/// One protocol event as it came off the wire.
#[derive(Clone, Debug)]
pub struct TransportEvent {
    pub method: String,
    pub params: Value,
}

#[async_trait]
pub trait BidiTransport: Send + Sync {
    async fn start(&self) -> Result<(), BridgeError>;
    /// Next event from the remote end; `None` once the stream has ended.
    async fn next_event(&self) -> Option<TransportEvent>;
    async fn send_command(&self, method: &str, params: Value) -> Result<Value, BridgeError>;
}

/// Inert transport used when no remote end is wired up.
#[derive(Default)]
pub struct NoopTransport;

#[async_trait]
impl BidiTransport for NoopTransport {
    async fn start(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        None
    }

    async fn send_command(&self, method: &str, _params: Value) -> Result<Value, BridgeError> {
        Err(BridgeError::new(BridgeErrorKind::Transport)
            .with_hint(format!("transport not available for method {method}")))
    }
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, BridgeError>>>>>;

/// Websocket transport speaking the BiDi framing: commands go out as
/// `{id, method, params}`, responses are correlated back by `id`, and
/// `{type: "event"}` frames feed the event channel.
pub struct WebSocketTransport {
    endpoint: String,
    command_deadline: Duration,
    event_buffer: usize,
    runtime: OnceCell<WsRuntime>,
}

struct WsRuntime {
    frame_tx: mpsc::Sender<String>,
    events_rx: Mutex<mpsc::Receiver<TransportEvent>>,
    pending: PendingMap,
    next_id: AtomicU64,
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl Drop for WsRuntime {
    fn drop(&mut self) {
        self.reader_task.abort();
        self.writer_task.abort();
    }
}

impl WebSocketTransport {
    pub fn new(endpoint: impl Into<String>, cfg: &BidiConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            command_deadline: Duration::from_millis(cfg.command_deadline_ms),
            event_buffer: cfg.event_buffer,
            runtime: OnceCell::new(),
        }
    }

    async fn connect(&self) -> Result<WsRuntime, BridgeError> {
        Url::parse(&self.endpoint).map_err(|err| {
            BridgeError::new(BridgeErrorKind::Transport)
                .with_hint(format!("invalid websocket endpoint {}: {err}", self.endpoint))
        })?;

        let (stream, _) = connect_async(self.endpoint.as_str()).await.map_err(|err| {
            BridgeError::new(BridgeErrorKind::Transport)
                .with_hint(format!("websocket connect failed: {err}"))
                .retriable(true)
        })?;
        let (sink, source) = stream.split();

        let (frame_tx, frame_rx) = mpsc::channel::<String>(64);
        let (events_tx, events_rx) = mpsc::channel::<TransportEvent>(self.event_buffer);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let writer_task = tokio::spawn(write_loop(sink, frame_rx));
        let reader_task = tokio::spawn(read_loop(source, Arc::clone(&pending), events_tx));

        info!(target: "bidi-transport", endpoint = %self.endpoint, "websocket connection established");

        Ok(WsRuntime {
            frame_tx,
            events_rx: Mutex::new(events_rx),
            pending,
            next_id: AtomicU64::new(1),
            reader_task,
            writer_task,
        })
    }
}

#[async_trait]
impl BidiTransport for WebSocketTransport {
    async fn start(&self) -> Result<(), BridgeError> {
        self.runtime
            .get_or_try_init(|| self.connect())
            .await
            .map(|_| ())
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        let runtime = self.runtime.get()?;
        let mut guard = runtime.events_rx.lock().await;
        guard.recv().await
    }

    async fn send_command(&self, method: &str, params: Value) -> Result<Value, BridgeError> {
        let runtime = self.runtime.get().ok_or_else(|| {
            BridgeError::new(BridgeErrorKind::Transport).with_hint("transport not started")
        })?;

        let id = runtime.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = json!({ "id": id, "method": method, "params": params }).to_string();

        let (responder, response) = oneshot::channel();
        runtime.pending.lock().await.insert(id, responder);

        if runtime.frame_tx.send(frame).await.is_err() {
            runtime.pending.lock().await.remove(&id);
            return Err(BridgeError::new(BridgeErrorKind::Transport)
                .with_hint("websocket writer is gone")
                .retriable(true));
        }

        match tokio::time::timeout(self.command_deadline, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(BridgeError::new(BridgeErrorKind::Transport)
                .with_hint("command response channel closed")
                .retriable(true)),
            Err(_) => {
                runtime.pending.lock().await.remove(&id);
                Err(BridgeError::new(BridgeErrorKind::Timeout)
                    .with_hint(format!("{method} timed out"))
                    .retriable(true))
            }
        }
    }
}

async fn write_loop(mut sink: WsSink, mut frames: mpsc::Receiver<String>) {
    while let Some(frame) = frames.recv().await {
        if let Err(err) = sink.send(Message::Text(frame)).await {
            warn!(target: "bidi-transport", %err, "websocket write failed");
            break;
        }
    }
}

async fn read_loop(mut source: WsSource, pending: PendingMap, events_tx: mpsc::Sender<TransportEvent>) {
    while let Some(message) = source.next().await {
        match message {
            Ok(Message::Text(text)) => dispatch_frame(&text, &pending, &events_tx).await,
            Ok(Message::Close(_)) => {
                debug!(target: "bidi-transport", "websocket closed by remote end");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(target: "bidi-transport", %err, "websocket read failed");
                break;
            }
        }
    }

    // Fail outstanding commands; the dropped events_tx ends next_event().
    let mut guard = pending.lock().await;
    for (_, responder) in guard.drain() {
        let _ = responder.send(Err(BridgeError::new(BridgeErrorKind::Transport)
            .with_hint("websocket connection closed")
            .retriable(true)));
    }
}

async fn dispatch_frame(text: &str, pending: &PendingMap, events_tx: &mpsc::Sender<TransportEvent>) {
    let frame: Value = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(target: "bidi-transport", %err, "discarding undecodable frame");
            return;
        }
    };

    if let Some(id) = frame.get("id").and_then(Value::as_u64) {
        let responder = pending.lock().await.remove(&id);
        match responder {
            Some(responder) => {
                let _ = responder.send(command_result(&frame));
            }
            None => debug!(target: "bidi-transport", id, "response without a pending command"),
        }
        return;
    }

    if let Some(method) = frame.get("method").and_then(Value::as_str) {
        let event = TransportEvent {
            method: method.to_string(),
            params: frame.get("params").cloned().unwrap_or(Value::Null),
        };
        if events_tx.send(event).await.is_err() {
            debug!(target: "bidi-transport", "event receiver dropped");
        }
    }
}

fn command_result(frame: &Value) -> Result<Value, BridgeError> {
    let is_error = frame.get("type").and_then(Value::as_str) == Some("error")
        || frame.get("error").is_some();
    if is_error {
        let code = frame
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        let message = frame.get("message").and_then(Value::as_str).unwrap_or("");
        let hint = if message.is_empty() {
            code.to_string()
        } else {
            format!("{code}: {message}")
        };
        Err(BridgeError::new(BridgeErrorKind::Transport).with_hint(hint))
    } else {
        Ok(frame.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_frames_yield_their_result() {
        let frame = json!({ "type": "success", "id": 3, "result": { "intercept": "i-1" } });
        let result = command_result(&frame).unwrap();
        assert_eq!(result["intercept"], "i-1");
    }

    #[test]
    fn error_frames_carry_code_and_message() {
        let frame = json!({
            "type": "error",
            "id": 4,
            "error": "no such request",
            "message": "request request-9 is gone"
        });
        let err = command_result(&frame).unwrap_err();
        assert!(err.is_missing_request());
        assert!(err.to_string().contains("request request-9 is gone"));
    }

    #[test]
    fn untyped_error_frames_are_still_errors() {
        let frame = json!({ "id": 5, "error": "invalid argument" });
        assert!(command_result(&frame).is_err());
    }

    #[tokio::test]
    async fn noop_transport_has_no_events_and_rejects_commands() {
        let transport = NoopTransport;
        transport.start().await.unwrap();
        assert!(transport.next_event().await.is_none());

        let err = transport
            .send_command("session.subscribe", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, BridgeErrorKind::Transport);
    }
}
