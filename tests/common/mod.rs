//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use emit::Handler;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per test binary
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "emit=debug".into()))
            .with(tracing_subscriber::fmt::layer().with_test_writer().with_target(true))
            .try_init();
    });
}

/// A shared call log that handlers append to
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn make_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Handler that appends `tag` to the log, ignoring the payload
pub fn tagged<T: 'static>(log: &CallLog, tag: &'static str) -> Handler<T> {
    let log = Arc::clone(log);
    Handler::new(move |_: &T| log.lock().unwrap().push(tag.to_string()))
}
