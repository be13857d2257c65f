//! Shared automation contract for the browser backends.
//!
//! Both remote-protocol backends (the Chrome debugging protocol client and the
//! WebDriver BiDi bridge) normalize their network traffic into the types in
//! this crate and hand them to an [`AutomationClient`]. Keeping the contract
//! here means the proxy layer never learns which protocol drove the browser.

pub mod client;
pub mod error;
pub mod pre_request;
pub mod resource;

pub use client::{AutomationClient, NullAutomationClient};
pub use error::{StreamStalledError, TaggedError};
pub use pre_request::{BrowserPreRequest, BrowserResponseReceived, TIMESTAMP_UNAVAILABLE};
pub use resource::ResourceType;
