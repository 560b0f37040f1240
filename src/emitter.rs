//! Named event channels with synchronous fan-out
//!
//! Each event name maps to a reference-counted, ordered list of handlers.
//! Dispatch clones the list reference under the read lock and runs the handlers
//! after the lock is released. Registration and removal edit the list in place
//! under the write lock, copying it first only while an in-flight dispatch still
//! holds the old one. A dispatch therefore always sees the handler sequence as
//! it was when it started, and handlers are free to call back into the emitter.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::{DispatchMode, EmitterConfig, DEFAULT_EMITTER_NAME};
use crate::error::{EmitError, EmitResult};
use crate::handler::{Handler, HandlerFailure, HandlerId};
use crate::shared_state::SharedState;

/// Handler sequence shared between the registry and in-flight dispatches
type Snapshot<T> = Arc<Vec<Handler<T>>>;

/// Statistics about emitter activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitterStats {
    /// Number of emits that reached at least one handler
    pub events_emitted: u64,
    /// Number of emits for names with no handlers
    pub events_unhandled: u64,
    /// Number of handler invocations started
    pub handler_calls: u64,
    /// Number of handler panics caught by isolated dispatch
    pub handler_panics: u64,
}

#[derive(Default)]
struct StatsCounters {
    events_emitted: AtomicU64,
    events_unhandled: AtomicU64,
    handler_calls: AtomicU64,
    handler_panics: AtomicU64,
}

impl StatsCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> EmitterStats {
        EmitterStats {
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            events_unhandled: self.events_unhandled.load(Ordering::Relaxed),
            handler_calls: self.handler_calls.load(Ordering::Relaxed),
            handler_panics: self.handler_panics.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.events_emitted.store(0, Ordering::Relaxed);
        self.events_unhandled.store(0, Ordering::Relaxed);
        self.handler_calls.store(0, Ordering::Relaxed);
        self.handler_panics.store(0, Ordering::Relaxed);
    }
}

/// A set of named event channels
///
/// `T` is the payload type handed to every handler. It defaults to
/// [`serde_json::Value`] for dynamically shaped event data; the emitter never
/// looks at the payload.
///
/// All methods take `&self`, so an emitter can be shared behind an `Arc` and
/// used from any number of threads. `on`, `off` and `emit` return `&Self` so
/// calls can be chained.
pub struct Emitter<T = serde_json::Value> {
    config: EmitterConfig,
    listeners: SharedState<HashMap<String, Snapshot<T>>>,
    stats: StatsCounters,
}

impl<T> Emitter<T> {
    /// Create a new emitter with the default configuration
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    /// Create a new emitter with a name used in log output
    pub fn with_name(name: impl Into<String>) -> Self {
        Self::with_config(EmitterConfig::named(name))
    }

    /// Create a new emitter from a configuration
    ///
    /// An invalid name is replaced with the default one; use
    /// [`Emitter::try_with_config`] to reject it instead.
    pub fn with_config(mut config: EmitterConfig) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, "Falling back to default emitter name");
            config.name = DEFAULT_EMITTER_NAME.to_string();
        }
        Self::build(config)
    }

    /// Create a new emitter from a configuration, failing if it is invalid
    pub fn try_with_config(config: EmitterConfig) -> EmitResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EmitterConfig) -> Self {
        debug!(emitter = %config.name, dispatch = ?config.dispatch, "Creating new Emitter");

        Self {
            listeners: SharedState::with_name(HashMap::new(), format!("emitter_{}", config.name)),
            config,
            stats: StatsCounters::default(),
        }
    }

    /// Get the name of this emitter
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Get the configuration this emitter was built with
    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Register handlers under `name`, after any already registered
    ///
    /// Registering the same handler more than once makes it run once per
    /// registration.
    pub fn on<I>(&self, name: impl Into<String>, handlers: I) -> &Self
    where
        I: IntoIterator<Item = Handler<T>>,
    {
        let name = name.into();
        let added: Vec<Handler<T>> = handlers.into_iter().collect();
        if added.is_empty() {
            trace!(emitter = %self.name(), event = %name, "No handlers to register");
            return self;
        }

        let count = added.len();
        let total = self.listeners.with_write(|listeners| {
            let entry = listeners.entry(name.clone()).or_default();
            Arc::make_mut(entry).extend(added);
            entry.len()
        });

        debug!(
            emitter = %self.name(),
            event = %name,
            count,
            total,
            "Registered event handlers"
        );
        self
    }

    /// Register a closure under `name` and return its handler token
    ///
    /// Pass the token to [`Emitter::off`] to remove this registration.
    pub fn subscribe<F>(&self, name: impl Into<String>, func: F) -> Handler<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let handler = Handler::new(func);
        self.on(name, [handler.clone()]);
        handler
    }

    /// Remove handlers from `name`
    ///
    /// Every registration whose id matches one of `handlers` is removed; the rest
    /// keep their relative order. With no handlers the whole entry is removed,
    /// same as [`Emitter::off_all`]. Unknown names and handlers are ignored.
    pub fn off<I>(&self, name: &str, handlers: I) -> &Self
    where
        I: IntoIterator,
        I::Item: Borrow<Handler<T>>,
    {
        let targets: Vec<HandlerId> = handlers
            .into_iter()
            .map(|handler| {
                let handler: &Handler<T> = handler.borrow();
                handler.id()
            })
            .collect();
        if targets.is_empty() {
            return self.off_all(name);
        }

        let (removed, remaining) = self.listeners.with_write(|listeners| {
            let Some(entry) = listeners.get_mut(name) else {
                return (0, 0);
            };
            let before = entry.len();
            if !entry.iter().any(|handler| targets.contains(&handler.id())) {
                return (0, before);
            }

            Arc::make_mut(entry).retain(|handler| !targets.contains(&handler.id()));
            let remaining = entry.len();
            if remaining == 0 {
                listeners.remove(name);
            }
            (before - remaining, remaining)
        });

        if removed > 0 {
            debug!(
                emitter = %self.name(),
                event = %name,
                removed,
                remaining,
                "Unregistered event handlers"
            );
        } else {
            trace!(
                emitter = %self.name(),
                event = %name,
                "No matching handlers to unregister"
            );
        }
        self
    }

    /// Remove every handler registered under `name`
    pub fn off_all(&self, name: &str) -> &Self {
        let removed = self
            .listeners
            .with_write(|listeners| listeners.remove(name))
            .map_or(0, |handlers| handlers.len());

        debug!(emitter = %self.name(), event = %name, removed, "Cleared event handlers");
        self
    }

    /// Remove every handler for every name
    pub fn clear(&self) -> &Self {
        let previous = self.listeners.replace(HashMap::new());
        debug!(emitter = %self.name(), events = previous.len(), "Cleared all event handlers");
        self
    }

    /// Run every handler registered under `name`, in registration order
    ///
    /// The handler sequence is read once before the first handler runs; changes
    /// made while the dispatch is in progress apply from the next emit. Under
    /// [`DispatchMode::Propagate`] a panicking handler unwinds out of this call
    /// and the handlers after it do not run.
    pub fn emit(&self, name: &str, value: impl Borrow<T>) -> &Self {
        let Some(snapshot) = self.snapshot(name) else {
            return self;
        };
        let value: &T = value.borrow();

        match self.config.dispatch {
            DispatchMode::Propagate => {
                for handler in snapshot.iter() {
                    StatsCounters::bump(&self.stats.handler_calls);
                    handler.call(value);
                }
            }
            DispatchMode::Isolate => {
                self.dispatch_isolated(name, &snapshot, value);
            }
        }
        self
    }

    /// Run every handler registered under `name`, isolating panics
    ///
    /// Every handler runs regardless of the configured dispatch mode. Returns the
    /// number of handlers that completed, or an error listing each one that
    /// panicked.
    pub fn try_emit(&self, name: &str, value: impl Borrow<T>) -> EmitResult<usize> {
        let Some(snapshot) = self.snapshot(name) else {
            return Ok(0);
        };

        let value: &T = value.borrow();
        let (delivered, failures) = self.dispatch_isolated(name, &snapshot, value);
        if failures.is_empty() {
            Ok(delivered)
        } else {
            Err(EmitError::HandlerPanicked {
                event: name.to_string(),
                delivered,
                failures,
            })
        }
    }

    /// Read the current handler sequence for `name` and record the emit
    fn snapshot(&self, name: &str) -> Option<Snapshot<T>> {
        let snapshot = self.listeners.with_read(|listeners| {
            listeners
                .get(name)
                .filter(|handlers| !handlers.is_empty())
                .cloned()
        });

        match &snapshot {
            Some(handlers) => {
                StatsCounters::bump(&self.stats.events_emitted);
                trace!(
                    emitter = %self.name(),
                    event = %name,
                    handlers = handlers.len(),
                    "Dispatching event"
                );
            }
            None => {
                StatsCounters::bump(&self.stats.events_unhandled);
                trace!(emitter = %self.name(), event = %name, "No handlers for event");
            }
        }
        snapshot
    }

    fn dispatch_isolated(
        &self,
        name: &str,
        handlers: &[Handler<T>],
        value: &T,
    ) -> (usize, Vec<HandlerFailure>) {
        let mut delivered = 0;
        let mut failures = Vec::new();

        for handler in handlers {
            StatsCounters::bump(&self.stats.handler_calls);
            match panic::catch_unwind(AssertUnwindSafe(|| handler.call(value))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    StatsCounters::bump(&self.stats.handler_panics);
                    let failure = HandlerFailure::from_panic(handler.id(), &*payload);
                    warn!(
                        emitter = %self.name(),
                        event = %name,
                        handler_id = %failure.handler,
                        message = %failure.message,
                        "Event handler panicked"
                    );
                    failures.push(failure);
                }
            }
        }

        (delivered, failures)
    }

    /// Number of handler registrations under `name`
    pub fn handler_count(&self, name: &str) -> usize {
        self.listeners
            .with_read(|listeners| listeners.get(name).map_or(0, |handlers| handlers.len()))
    }

    /// Returns true if at least one handler is registered under `name`
    pub fn has_handlers(&self, name: &str) -> bool {
        self.handler_count(name) > 0
    }

    /// Names that currently have handlers, sorted
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.listeners.with_read(|listeners| {
            listeners
                .iter()
                .filter(|(_, handlers)| !handlers.is_empty())
                .map(|(name, _)| name.clone())
                .collect()
        });
        names.sort();
        names
    }

    /// Returns true if no handlers are registered under any name
    pub fn is_empty(&self) -> bool {
        self.listeners
            .with_read(|listeners| listeners.values().all(|handlers| handlers.is_empty()))
    }

    /// Get current statistics
    pub fn stats(&self) -> EmitterStats {
        self.stats.snapshot()
    }

    /// Reset all statistics to zero
    pub fn reset_stats(&self) {
        self.stats.reset();
        debug!(emitter = %self.name(), "Emitter statistics reset");
    }
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("name", &self.config.name)
            .field("dispatch", &self.config.dispatch)
            .field("events", &self.listeners.with_read(|listeners| listeners.len()))
            .field("payload", &std::any::type_name::<T>())
            .finish()
    }
}
