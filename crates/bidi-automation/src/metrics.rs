use std::sync::atomic::{AtomicU64, Ordering};

use lazy_static::lazy_static;
use prometheus::{core::Collector, IntCounter, IntCounterVec, Registry};
use tracing::error;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeMetricsSnapshot {
    pub events: u64,
    pub pre_requests: u64,
    pub pre_request_removals: u64,
    pub responses_forwarded: u64,
    pub intercept_installs: u64,
    pub intercept_removals: u64,
    pub requests_resumed: u64,
    pub resume_races_swallowed: u64,
}

static EVENTS: AtomicU64 = AtomicU64::new(0);
static PRE_REQUESTS: AtomicU64 = AtomicU64::new(0);
static PRE_REQUEST_REMOVALS: AtomicU64 = AtomicU64::new(0);
static RESPONSES_FORWARDED: AtomicU64 = AtomicU64::new(0);
static INTERCEPT_INSTALLS: AtomicU64 = AtomicU64::new(0);
static INTERCEPT_REMOVALS: AtomicU64 = AtomicU64::new(0);
static REQUESTS_RESUMED: AtomicU64 = AtomicU64::new(0);
static RESUME_RACES_SWALLOWED: AtomicU64 = AtomicU64::new(0);

lazy_static! {
    static ref BIDI_EVENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("bidi_events_total", "Total BiDi events dispatched"),
        &["method"]
    )
    .unwrap();
    static ref BIDI_PRE_REQUESTS_TOTAL: IntCounter = IntCounter::new(
        "bidi_pre_requests_total",
        "Total pre-requests forwarded to the automation consumer"
    )
    .unwrap();
    static ref BIDI_PRE_REQUEST_REMOVALS_TOTAL: IntCounter = IntCounter::new(
        "bidi_pre_request_removals_total",
        "Total pre-request removals (cache hits and fetch errors)"
    )
    .unwrap();
    static ref BIDI_RESPONSES_FORWARDED_TOTAL: IntCounter = IntCounter::new(
        "bidi_responses_forwarded_total",
        "Total response:received events forwarded"
    )
    .unwrap();
    static ref BIDI_INTERCEPT_INSTALLS_TOTAL: IntCounter = IntCounter::new(
        "bidi_intercept_installs_total",
        "Total network intercepts installed"
    )
    .unwrap();
    static ref BIDI_INTERCEPT_REMOVALS_TOTAL: IntCounter = IntCounter::new(
        "bidi_intercept_removals_total",
        "Total network intercepts removed"
    )
    .unwrap();
    static ref BIDI_REQUESTS_RESUMED_TOTAL: IntCounter = IntCounter::new(
        "bidi_requests_resumed_total",
        "Total blocked requests resumed on the wire"
    )
    .unwrap();
    static ref BIDI_RESUME_RACES_SWALLOWED_TOTAL: IntCounter = IntCounter::new(
        "bidi_resume_races_swallowed_total",
        "Total resumptions that raced request teardown"
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register bidi metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, BIDI_EVENTS_TOTAL.clone());
    register(registry, BIDI_PRE_REQUESTS_TOTAL.clone());
    register(registry, BIDI_PRE_REQUEST_REMOVALS_TOTAL.clone());
    register(registry, BIDI_RESPONSES_FORWARDED_TOTAL.clone());
    register(registry, BIDI_INTERCEPT_INSTALLS_TOTAL.clone());
    register(registry, BIDI_INTERCEPT_REMOVALS_TOTAL.clone());
    register(registry, BIDI_REQUESTS_RESUMED_TOTAL.clone());
    register(registry, BIDI_RESUME_RACES_SWALLOWED_TOTAL.clone());
}

pub fn record_event(method: &str) {
    EVENTS.fetch_add(1, Ordering::Relaxed);
    BIDI_EVENTS_TOTAL.with_label_values(&[method]).inc();
}

pub fn record_pre_request() {
    PRE_REQUESTS.fetch_add(1, Ordering::Relaxed);
    BIDI_PRE_REQUESTS_TOTAL.inc();
}

pub fn record_pre_request_removal() {
    PRE_REQUEST_REMOVALS.fetch_add(1, Ordering::Relaxed);
    BIDI_PRE_REQUEST_REMOVALS_TOTAL.inc();
}

pub fn record_response_forwarded() {
    RESPONSES_FORWARDED.fetch_add(1, Ordering::Relaxed);
    BIDI_RESPONSES_FORWARDED_TOTAL.inc();
}

pub fn record_intercept_install() {
    INTERCEPT_INSTALLS.fetch_add(1, Ordering::Relaxed);
    BIDI_INTERCEPT_INSTALLS_TOTAL.inc();
}

pub fn record_intercept_removal() {
    INTERCEPT_REMOVALS.fetch_add(1, Ordering::Relaxed);
    BIDI_INTERCEPT_REMOVALS_TOTAL.inc();
}

pub fn record_request_resumed() {
    REQUESTS_RESUMED.fetch_add(1, Ordering::Relaxed);
    BIDI_REQUESTS_RESUMED_TOTAL.inc();
}

pub fn record_resume_race_swallowed() {
    RESUME_RACES_SWALLOWED.fetch_add(1, Ordering::Relaxed);
    BIDI_RESUME_RACES_SWALLOWED_TOTAL.inc();
}

pub fn snapshot() -> BridgeMetricsSnapshot {
    BridgeMetricsSnapshot {
        events: EVENTS.load(Ordering::Relaxed),
        pre_requests: PRE_REQUESTS.load(Ordering::Relaxed),
        pre_request_removals: PRE_REQUEST_REMOVALS.load(Ordering::Relaxed),
        responses_forwarded: RESPONSES_FORWARDED.load(Ordering::Relaxed),
        intercept_installs: INTERCEPT_INSTALLS.load(Ordering::Relaxed),
        intercept_removals: INTERCEPT_REMOVALS.load(Ordering::Relaxed),
        requests_resumed: REQUESTS_RESUMED.load(Ordering::Relaxed),
        resume_races_swallowed: RESUME_RACES_SWALLOWED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    EVENTS.store(0, Ordering::Relaxed);
    PRE_REQUESTS.store(0, Ordering::Relaxed);
    PRE_REQUEST_REMOVALS.store(0, Ordering::Relaxed);
    RESPONSES_FORWARDED.store(0, Ordering::Relaxed);
    INTERCEPT_INSTALLS.store(0, Ordering::Relaxed);
    INTERCEPT_REMOVALS.store(0, Ordering::Relaxed);
    REQUESTS_RESUMED.store(0, Ordering::Relaxed);
    RESUME_RACES_SWALLOWED.store(0, Ordering::Relaxed);
}
