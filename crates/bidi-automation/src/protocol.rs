//! Typed views of the BiDi wire payloads the bridge consumes and produces.
//!
//! Only the fields the bridge acts on are modelled strictly; everything else
//! is defaulted so protocol revisions that add fields do not break event
//! decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Events the remote end must be subscribed to for the bridge to work.
/// Subscribed (and torn down) as a unit; there is no partial registration.
pub const BIDI_EVENTS: [&str; 6] = [
    "network.beforeRequestSent",
    "network.responseStarted",
    "network.responseCompleted",
    "network.fetchError",
    "browsingContext.contextCreated",
    "browsingContext.contextDestroyed",
];

/// BiDi `network.BytesValue`: a header/cookie value plus its encoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BytesValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl BytesValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            kind: "string".to_string(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: BytesValue,
}

impl Header {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: BytesValue::string(value),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: BytesValue,
    pub domain: String,
    pub path: String,
    pub size: u64,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

/// Collapse an ordered header list into a name→value map. Later entries win
/// on duplicate names. The ordered list itself stays authoritative for
/// anything that goes back on the wire.
pub fn collapse_headers(headers: &[Header]) -> HashMap<String, String> {
    headers
        .iter()
        .map(|header| (header.name.clone(), header.value.value.clone()))
        .collect()
}

/// `browsingContext.Info`, also the payload of the context lifecycle events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowsingContextInfo {
    pub context: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user_context: String,
    /// Nested infos on `getTree` results, bare ids on some lifecycle events;
    /// the bridge acts on neither, so the shape is left loose.
    #[serde(default)]
    pub children: Option<Value>,
}

/// `network.RequestData` plus the initiator-type/destination fields newer
/// remote ends report on the request itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    pub request: String,
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub headers_size: Option<u64>,
    #[serde(default)]
    pub body_size: Option<u64>,
    #[serde(default)]
    pub timings: Option<Value>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub initiator_type: Option<String>,
}

/// `network.beforeRequestSent` parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeforeRequestSent {
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub navigation: Option<String>,
    #[serde(default)]
    pub redirect_count: u64,
    pub request: RequestData,
    #[serde(default)]
    pub initiator: Value,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub intercepts: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    pub url: String,
    #[serde(default)]
    pub protocol: Option<String>,
    pub status: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub from_cache: bool,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub bytes_received: Option<u64>,
    #[serde(default)]
    pub headers_size: Option<u64>,
    #[serde(default)]
    pub body_size: Option<u64>,
}

/// Shared parameter shape of `network.responseStarted` and
/// `network.responseCompleted`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseParams {
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub navigation: Option<String>,
    #[serde(default)]
    pub redirect_count: u64,
    pub request: RequestData,
    pub response: ResponseData,
    #[serde(default)]
    pub timestamp: u64,
}

/// `network.fetchError` parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchErrorParams {
    #[serde(default)]
    pub context: Option<String>,
    pub request: RequestData,
    #[serde(default)]
    pub error_text: String,
    #[serde(default)]
    pub timestamp: u64,
}
