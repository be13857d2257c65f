//! Canonical resource-type vocabulary shared by the request middleware.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource type attached to every pre-request record.
///
/// The canonical set follows the Chrome debugging protocol vocabulary since
/// that is what the request/response middleware matches against. Tokens a
/// future protocol revision may introduce are carried through [`Self::Raw`]
/// rather than rejected, so the enumeration stays total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Xhr,
    Script,
    Font,
    Fetch,
    Ping,
    Websocket,
    Other,
    #[serde(untagged)]
    Raw(String),
}

impl ResourceType {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::Document => "document",
            ResourceType::Stylesheet => "stylesheet",
            ResourceType::Image => "image",
            ResourceType::Xhr => "xhr",
            ResourceType::Script => "script",
            ResourceType::Font => "font",
            ResourceType::Fetch => "fetch",
            ResourceType::Ping => "ping",
            ResourceType::Websocket => "websocket",
            ResourceType::Other => "other",
            ResourceType::Raw(token) => token,
        }
    }

    /// Canonical variant for a protocol token, or [`Self::Raw`] when the
    /// token is not part of the known set.
    pub fn from_token(token: &str) -> Self {
        match token {
            "document" => ResourceType::Document,
            "stylesheet" => ResourceType::Stylesheet,
            "image" => ResourceType::Image,
            "xhr" => ResourceType::Xhr,
            "script" => ResourceType::Script,
            "font" => ResourceType::Font,
            "fetch" => ResourceType::Fetch,
            "ping" => ResourceType::Ping,
            "websocket" => ResourceType::Websocket,
            "other" => ResourceType::Other,
            _ => ResourceType::Raw(token.to_string()),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
