//! WebDriver BiDi automation bridge.
//!
//! Drives a browser under test over the WebDriver BiDi protocol and exposes
//! its network traffic through the protocol-agnostic [`automation_core`]
//! contract. The bridge tracks browsing-context lifecycle to designate the
//! application-under-test frame, keeps exactly one network intercept alive
//! per top-level context, normalizes resource types and headers, injects the
//! diagnostic headers the downstream proxy matches on, and reconciles
//! cache/error short-circuits so the proxy never waits on a request that will
//! not resolve.

pub mod bootstrap;
pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod protocol;
pub mod resource_type;
pub mod session;
pub mod state;
pub mod transport;

pub use bootstrap::{connect_to_new_spec, setup, NewTabHook, SpecTransitionOptions};
pub use bridge::{BidiAutomation, AUT_FRAME_HEADER, WEBDRIVER_BIDI_HEADER};
pub use config::BidiConfig;
pub use error::{BridgeError, BridgeErrorKind};
pub use events::{event_bus, BridgeBus, BridgeEvent};
pub use protocol::BIDI_EVENTS;
pub use resource_type::normalize_resource_type;
pub use session::BidiSession;
pub use state::ContextSnapshot;
pub use transport::{BidiTransport, NoopTransport, TransportEvent, WebSocketTransport};
