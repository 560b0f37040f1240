//! In-process publish/subscribe over named event channels
//!
//! Handlers register against an event name and every value emitted under that
//! name is handed to them synchronously, in registration order, on the calling
//! thread.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use emit::{Emitter, Handler};
//! use serde_json::Value;
//!
//! let log = Arc::new(Mutex::new(Vec::new()));
//! let emitter: Emitter = Emitter::new();
//!
//! let a = {
//!     let log = Arc::clone(&log);
//!     Handler::new(move |_: &Value| log.lock().unwrap().push("a"))
//! };
//! let b = {
//!     let log = Arc::clone(&log);
//!     Handler::new(move |_: &Value| log.lock().unwrap().push("b"))
//! };
//!
//! emitter
//!     .on("greet", [a.clone(), b])
//!     .emit("greet", Value::Null)
//!     .off("greet", [&a])
//!     .emit("greet", Value::Null);
//!
//! assert_eq!(*log.lock().unwrap(), vec!["a", "b", "b"]);
//! ```
//!
//! A process-wide instance is available through the free functions [`on`],
//! [`off`], [`emit`] and friends.

// Export modules
pub mod config;
pub mod emitter;
pub mod error;
pub mod global;
pub mod handler;
mod shared_state;

pub use config::{DispatchMode, EmitterConfig};
pub use emitter::{Emitter, EmitterStats};
pub use error::{EmitError, EmitResult};
pub use global::{default_emitter, emit, off, off_all, on, subscribe};
pub use handler::{Handler, HandlerFailure, HandlerFn, HandlerId};
