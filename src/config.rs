use serde::{Deserialize, Serialize};

use crate::error::{EmitError, EmitResult};

/// Default name for emitters created without one
pub const DEFAULT_EMITTER_NAME: &str = "unnamed";

/// How an emitter reacts to a handler that panics during dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// The panic unwinds out of `emit`; handlers later in the sequence do not run
    #[default]
    Propagate,
    /// Each handler runs under `catch_unwind`; panics are logged and dispatch continues
    Isolate,
}

/// Configuration for an [`Emitter`](crate::Emitter)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitterConfig {
    /// Name used in log output
    #[serde(default = "default_name")]
    pub name: String,
    /// Panic handling during dispatch
    #[serde(default)]
    pub dispatch: DispatchMode,
}

fn default_name() -> String {
    DEFAULT_EMITTER_NAME.to_string()
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            dispatch: DispatchMode::default(),
        }
    }
}

impl EmitterConfig {
    /// Create a default configuration with the given name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the dispatch mode
    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Parse a configuration from a JSON document
    pub fn from_json(json: &str) -> EmitResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EmitError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can be used to build an emitter
    pub fn validate(&self) -> EmitResult<()> {
        if self.name.trim().is_empty() {
            return Err(EmitError::config("emitter name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EmitterConfig::default();
        assert_eq!(config.name, "unnamed");
        assert_eq!(config.dispatch, DispatchMode::Propagate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = EmitterConfig::from_json(r#"{"dispatch": "isolate"}"#).unwrap();
        assert_eq!(config.name, "unnamed");
        assert_eq!(config.dispatch, DispatchMode::Isolate);

        let config = EmitterConfig::from_json(r#"{"name": "ui"}"#).unwrap();
        assert_eq!(config.name, "ui");
        assert_eq!(config.dispatch, DispatchMode::Propagate);
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        let err = EmitterConfig::from_json(r#"{"dispatch": "sometimes"}"#).unwrap_err();
        assert!(matches!(err, EmitError::Config { .. }));

        let err = EmitterConfig::from_json(r#"{"name": "  "}"#).unwrap_err();
        assert!(matches!(err, EmitError::Config { .. }));
    }

    #[test]
    fn test_serialize_round_trip_uses_snake_case() {
        let config = EmitterConfig::named("bus").with_dispatch(DispatchMode::Isolate);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json, serde_json::json!({"name": "bus", "dispatch": "isolate"}));
    }
}
