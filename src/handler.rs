//! Handler tokens
//!
//! A [`Handler`] pairs a callable with a [`HandlerId`] assigned when it is created.
//! Clones share the id, so the token handed back from registration is the key
//! used to remove that registration later. Two handlers built from identical
//! closures are still distinct.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a registered handler
pub type HandlerId = Uuid;

/// Closure type stored by a [`Handler`]
pub type HandlerFn<T> = dyn Fn(&T) + Send + Sync;

/// A callable registered against an event name
pub struct Handler<T = serde_json::Value> {
    id: HandlerId,
    func: Arc<HandlerFn<T>>,
}

impl<T> Handler<T> {
    /// Wrap a closure in a new handler with a fresh id
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            func: Arc::new(func),
        }
    }

    /// Get the id shared by this handler and all of its clones
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Invoke the handler with a payload
    pub fn call(&self, value: &T) {
        (self.func)(value)
    }
}

impl<T> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            func: Arc::clone(&self.func),
        }
    }
}

impl<T> PartialEq for Handler<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handler<T> {}

impl<T> fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.id)
            .field("payload", &std::any::type_name::<T>())
            .finish()
    }
}

/// A handler that panicked during an isolated dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerFailure {
    /// Id of the panicking handler
    pub handler: HandlerId,
    /// Panic message, if the payload was a string
    pub message: String,
}

impl HandlerFailure {
    /// Create a new failure record
    pub fn new(handler: HandlerId, message: impl Into<String>) -> Self {
        Self {
            handler,
            message: message.into(),
        }
    }

    /// Build a failure record from a caught panic payload
    pub(crate) fn from_panic(handler: HandlerId, payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::new(handler, message)
    }
}
