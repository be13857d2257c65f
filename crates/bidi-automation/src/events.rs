//! Events the bridge publishes about its own lifecycle.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::BridgeError;

/// Observability feed for the layers around the bridge. Handler failures that
/// cannot surface through a caller's `Result` (the event loop owns those
/// invocations) are published here as [`BridgeEvent::Error`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BridgeEvent {
    AutContextAssigned {
        context: String,
        top_level: String,
    },
    AutContextCleared {
        context: String,
    },
    TopLevelContextCleared {
        context: String,
    },
    InterceptInstalled {
        intercept: String,
        top_level: String,
    },
    InterceptRemoved {
        intercept: String,
    },
    Error {
        error: BridgeError,
    },
}

pub type BridgeBus = broadcast::Sender<BridgeEvent>;

pub fn event_bus(buffer: usize) -> (BridgeBus, broadcast::Receiver<BridgeEvent>) {
    broadcast::channel(buffer)
}
