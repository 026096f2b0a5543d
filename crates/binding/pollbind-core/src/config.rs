//! Configuration for the binding engine

use std::time::Duration;

use pollbind_model::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_POLL_PERIOD_MS;
use crate::error::BindError;

/// Whether a freshly registered binding takes part in polling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterPolicy {
    /// Polled from the moment it is registered.
    #[default]
    Bound,
    /// Rendered once on registration, then only on explicit `update`/`bind`.
    Inert,
}

/// Configuration for the binding engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay between the end of one poll pass and the start of the next
    pub poll_period_ms: f64,
    /// Polling state given to newly registered bindings
    pub register_policy: RegisterPolicy,
    /// Record per-binding failures in the pass report instead of aborting the pass
    pub isolate_render_failures: bool,
    /// Nesting depth at which snapshot and comparison give up
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: DEFAULT_POLL_PERIOD_MS,
            register_policy: RegisterPolicy::Bound,
            isolate_render_failures: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, BindError> {
        let config: EngineConfig = serde_json::from_str(raw)
            .map_err(|e| BindError::config(format!("parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), BindError> {
        if self.poll_period_ms <= 0.0 || !self.poll_period_ms.is_finite() {
            return Err(BindError::config(
                "poll period must be positive and finite",
            ));
        }
        if self.poll_period().is_zero() {
            return Err(BindError::config("poll period rounds to zero"));
        }
        if self.max_depth == 0 {
            return Err(BindError::config("max depth must be greater than 0"));
        }
        Ok(())
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_nanos((self.poll_period_ms * 1_000_000.0).round() as u64)
    }

    /// Set the polling period
    #[inline]
    pub fn with_poll_period(mut self, period: Duration) -> Self {
        self.poll_period_ms = period.as_secs_f64() * 1000.0;
        self
    }

    /// Set the registration policy
    #[inline]
    pub fn with_register_policy(mut self, policy: RegisterPolicy) -> Self {
        self.register_policy = policy;
        self
    }

    /// Enable or disable per-binding failure isolation
    #[inline]
    pub fn with_isolated_failures(mut self, isolate: bool) -> Self {
        self.isolate_render_failures = isolate;
        self
    }

    /// Set the traversal depth limit
    #[inline]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_polls_twelve_times_a_second() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.poll_period().as_millis(), 83);
        assert_eq!(cfg.register_policy, RegisterPolicy::Bound);
        assert!(cfg.isolate_render_failures);
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{ "register_policy": "inert" }"#).unwrap();
        assert_eq!(cfg.register_policy, RegisterPolicy::Inert);
        assert_eq!(cfg.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(cfg.poll_period_ms, DEFAULT_POLL_PERIOD_MS);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "poll_period_ms": 0 }"#),
            Err(BindError::Config { .. })
        ));
        assert!(EngineConfig::default().with_max_depth(0).validate().is_err());
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "poll_period_ms": 1e-9 }"#),
            Err(BindError::Config { .. })
        ));
        assert!(matches!(
            EngineConfig::from_json_str("not json"),
            Err(BindError::Config { .. })
        ));
    }

    #[test]
    fn builders_chain() {
        let cfg = EngineConfig::default()
            .with_poll_period(Duration::from_millis(10))
            .with_isolated_failures(false);
        assert_eq!(cfg.poll_period(), Duration::from_millis(10));
        assert!(!cfg.isolate_render_failures);
    }
}
