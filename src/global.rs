//! Process-wide default emitter
//!
//! Lets unrelated parts of a program exchange events without passing an
//! [`Emitter`] around. The instance is created on first use, lives for the rest
//! of the process and behaves exactly like an explicitly constructed one.

use std::borrow::Borrow;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::emitter::Emitter;
use crate::handler::Handler;

/// Name of the process-wide emitter in log output
pub const GLOBAL_EMITTER_NAME: &str = "default";

static EMITTER: Lazy<Emitter> = Lazy::new(|| Emitter::with_name(GLOBAL_EMITTER_NAME));

/// Get the process-wide emitter
pub fn default_emitter() -> &'static Emitter {
    &EMITTER
}

/// Register handlers under `name` on the default emitter
pub fn on<I>(name: impl Into<String>, handlers: I) -> &'static Emitter
where
    I: IntoIterator<Item = Handler>,
{
    default_emitter().on(name, handlers)
}

/// Register a closure under `name` on the default emitter
pub fn subscribe<F>(name: impl Into<String>, func: F) -> Handler
where
    F: Fn(&Value) + Send + Sync + 'static,
{
    default_emitter().subscribe(name, func)
}

/// Remove handlers from `name` on the default emitter
pub fn off<I>(name: &str, handlers: I) -> &'static Emitter
where
    I: IntoIterator,
    I::Item: Borrow<Handler>,
{
    default_emitter().off(name, handlers)
}

/// Remove every handler under `name` on the default emitter
pub fn off_all(name: &str) -> &'static Emitter {
    default_emitter().off_all(name)
}

/// Dispatch `value` to the handlers under `name` on the default emitter
pub fn emit(name: &str, value: impl Borrow<Value>) -> &'static Emitter {
    default_emitter().emit(name, value)
}
