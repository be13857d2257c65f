//! Configuration for the BiDi bridge.

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BidiConfig {
    /// Deadline applied to every wire command, in milliseconds.
    pub command_deadline_ms: u64,
    /// Capacity of the transport's incoming event channel.
    pub event_buffer: usize,
    /// Log full network event payloads at debug level instead of trace.
    pub verbose_network_logging: bool,
}

impl Default for BidiConfig {
    fn default() -> Self {
        Self {
            command_deadline_ms: 30_000,
            event_buffer: 512,
            verbose_network_logging: resolve_verbose_default(),
        }
    }
}

fn resolve_verbose_default() -> bool {
    match env::var("BIDI_VERBOSE_NETWORK") {
        Ok(value) => matches!(
            value.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => false,
    }
}
