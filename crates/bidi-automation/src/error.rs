//! Error surface of the BiDi bridge.

use automation_core::TaggedError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// High-level categories surfaced by the bridge.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error, Serialize, Deserialize)]
pub enum BridgeErrorKind {
    #[error("event subscription failed")]
    Subscribe,
    #[error("intercept install failed")]
    InterceptInstall,
    #[error("intercept removal failed")]
    InterceptRemove,
    #[error("request continuation failed")]
    ContinueRequest,
    #[error("navigation failed")]
    Navigation,
    #[error("browsing context tree unavailable")]
    ContextTree,
    #[error("transport failure")]
    Transport,
    #[error("command timed out")]
    Timeout,
    #[error("internal error")]
    Internal,
}

impl BridgeErrorKind {
    pub fn as_kind_str(&self) -> &'static str {
        match self {
            BridgeErrorKind::Subscribe => "Subscribe",
            BridgeErrorKind::InterceptInstall => "InterceptInstall",
            BridgeErrorKind::InterceptRemove => "InterceptRemove",
            BridgeErrorKind::ContinueRequest => "ContinueRequest",
            BridgeErrorKind::Navigation => "Navigation",
            BridgeErrorKind::ContextTree => "ContextTree",
            BridgeErrorKind::Transport => "Transport",
            BridgeErrorKind::Timeout => "Timeout",
            BridgeErrorKind::Internal => "Internal",
        }
    }
}

/// Enriched error passed back to callers and onto the bridge event bus.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BridgeError {
    pub kind: BridgeErrorKind,
    pub hint: Option<String>,
    pub retriable: bool,
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for BridgeError {}

impl TaggedError for BridgeError {
    fn error_kind(&self) -> &'static str {
        self.kind.as_kind_str()
    }
}

impl BridgeError {
    pub fn new(kind: BridgeErrorKind) -> Self {
        Self {
            kind,
            hint: None,
            retriable: false,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn retriable(mut self, flag: bool) -> Self {
        self.retriable = flag;
        self
    }

    /// Attribute a transport-level failure to the wire operation that issued
    /// it. More specific kinds (timeouts included) are left as they are.
    pub fn for_operation(mut self, kind: BridgeErrorKind) -> Self {
        if self.kind == BridgeErrorKind::Transport {
            self.kind = kind;
        }
        self
    }

    /// True when the remote end reported that the request being acted on no
    /// longer exists. This happens when the host application is torn down
    /// mid-flight and is not a failure of the run.
    pub fn is_missing_request(&self) -> bool {
        self.hint
            .as_deref()
            .map(|hint| hint.contains("no such request"))
            .unwrap_or(false)
    }
}
