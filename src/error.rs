use thiserror::Error;

use crate::handler::HandlerFailure;

/// Result alias used by the fallible emitter operations
pub type EmitResult<T> = Result<T, EmitError>;

/// Errors reported by the emitter
///
/// Registration, removal and plain dispatch never fail. Errors only surface from
/// [`Emitter::try_emit`](crate::Emitter::try_emit) and configuration validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// One or more handlers panicked during an isolated dispatch
    #[error("{} handler(s) panicked while dispatching '{event}' ({delivered} delivered)", .failures.len())]
    HandlerPanicked {
        /// Event name that was dispatched
        event: String,
        /// Number of handlers that returned normally
        delivered: usize,
        /// Every handler that panicked, in dispatch order
        failures: Vec<HandlerFailure>,
    },

    /// The supplied configuration is not usable
    #[error("Invalid emitter configuration: {message}")]
    Config {
        /// Error message
        message: String,
    },
}

impl EmitError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        EmitError::Config {
            message: message.into(),
        }
    }

    /// Returns true if this error was produced by a panicking handler
    pub fn is_handler_panic(&self) -> bool {
        matches!(self, EmitError::HandlerPanicked { .. })
    }

    /// Failures recorded for a panicked dispatch, empty for other errors
    pub fn failures(&self) -> &[HandlerFailure] {
        match self {
            EmitError::HandlerPanicked { failures, .. } => failures,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_handler_panicked_display() {
        let err = EmitError::HandlerPanicked {
            event: "greet".to_string(),
            delivered: 2,
            failures: vec![HandlerFailure::new(Uuid::nil(), "boom")],
        };

        assert_eq!(
            err.to_string(),
            "1 handler(s) panicked while dispatching 'greet' (2 delivered)"
        );
        assert!(err.is_handler_panic());
        assert_eq!(err.failures().len(), 1);
    }

    #[test]
    fn test_config_error() {
        let err = EmitError::config("name must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid emitter configuration: name must not be empty"
        );
        assert!(!err.is_handler_panic());
        assert!(err.failures().is_empty());
    }
}
