//! Normalized request/response records forwarded to the automation consumer.

use crate::resource::ResourceType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Sentinel reported for timing fields a backend cannot supply. The consumer
/// schema always expects both timestamps, so backends without them report
/// `-1` instead of omitting the fields.
pub const TIMESTAMP_UNAVAILABLE: f64 = -1.0;

/// A request at the moment it is first observed, before its outcome is known.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserPreRequest {
    pub request_id: String,
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub resource_type: ResourceType,
    /// The raw protocol token the resource type was derived from.
    pub original_resource_type: String,
    pub initiator: Value,
    pub cdp_request_will_be_sent_timestamp: f64,
    pub cdp_request_will_be_sent_received_timestamp: f64,
}

/// Payload of the `response:received` request event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserResponseReceived {
    pub request_id: String,
    pub status: u16,
    pub headers: HashMap<String, String>,
}
