//! Rate limit policy configuration.
//!
//! The policy is a statically typed structure decoded once from YAML and
//! validated at load time, rather than an untyped map inspected on every
//! request. Malformed values are coerced to safe fallbacks with a warning;
//! loading a policy never fails on bad numbers, only on unreadable input.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, TurnstileError};

/// Rate substituted for a non-positive or non-finite `requests_per_second`.
pub const FALLBACK_REQUESTS_PER_SECOND: f64 = 1.0;

/// Settings for a single token-bucket limiter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimiterSettings {
    /// Sustained admission rate in requests per second
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Maximum number of requests admitted instantaneously after an idle
    /// period. A burst size of zero yields a limiter that never admits.
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

impl LimiterSettings {
    /// Whether the configured rate can seed a limiter as-is.
    pub fn has_valid_rate(&self) -> bool {
        self.requests_per_second.is_finite() && self.requests_per_second > 0.0
    }
}

fn default_requests_per_second() -> f64 {
    1.0
}

fn default_burst_size() -> u32 {
    10
}

fn default_enabled() -> bool {
    true
}

/// The full rate limiting policy: one default limit plus per-route overrides.
///
/// Replaced atomically as a whole on reload, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Master switch; when false every request is admitted
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Default limit applied to routes without an override
    #[serde(flatten)]
    pub default_limit: LimiterSettings,

    /// Per-route overrides keyed by exact request path
    #[serde(default)]
    pub custom_limits: HashMap<String, LimiterSettings>,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            default_limit: LimiterSettings::default(),
            custom_limits: HashMap::new(),
        }
    }
}

impl RateLimitPolicy {
    /// Load a policy from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load a policy from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| TurnstileError::Config(format!("Failed to parse rate limit policy: {}", e)))
    }

    /// Coerce malformed limits to safe fallbacks.
    ///
    /// Any limit whose `requests_per_second` is non-positive or non-finite
    /// is rewritten to [`FALLBACK_REQUESTS_PER_SECOND`], producing one
    /// warning message per coerced entry. A zero `burst_size` is left
    /// untouched: it is a legal always-deny limiter.
    pub fn sanitized(mut self) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();

        if !self.default_limit.has_valid_rate() {
            warnings.push(format!(
                "invalid requests_per_second {} for default limit, falling back to {}",
                self.default_limit.requests_per_second, FALLBACK_REQUESTS_PER_SECOND
            ));
            self.default_limit.requests_per_second = FALLBACK_REQUESTS_PER_SECOND;
        }

        for (path, settings) in self.custom_limits.iter_mut() {
            if !settings.has_valid_rate() {
                warnings.push(format!(
                    "invalid requests_per_second {} for path {}, falling back to {}",
                    settings.requests_per_second, path, FALLBACK_REQUESTS_PER_SECOND
                ));
                settings.requests_per_second = FALLBACK_REQUESTS_PER_SECOND;
            }
        }

        (self, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy_with_overrides() {
        let yaml = r#"
requests_per_second: 5.0
burst_size: 20
custom_limits:
  /v1/users:
    requests_per_second: 2
    burst_size: 4
  /v1/login:
    requests_per_second: 0.5
    burst_size: 1
"#;
        let policy = RateLimitPolicy::from_yaml(yaml).unwrap();

        assert!(policy.enabled);
        assert_eq!(policy.default_limit.requests_per_second, 5.0);
        assert_eq!(policy.default_limit.burst_size, 20);
        assert_eq!(policy.custom_limits.len(), 2);
        assert_eq!(
            policy.custom_limits["/v1/users"],
            LimiterSettings {
                requests_per_second: 2.0,
                burst_size: 4
            }
        );
        assert_eq!(policy.custom_limits["/v1/login"].requests_per_second, 0.5);
    }

    #[test]
    fn test_parse_empty_policy_uses_defaults() {
        let policy = RateLimitPolicy::from_yaml("{}").unwrap();

        assert!(policy.enabled);
        assert_eq!(policy.default_limit, LimiterSettings::default());
        assert!(policy.custom_limits.is_empty());
    }

    #[test]
    fn test_parse_disabled_policy() {
        let policy = RateLimitPolicy::from_yaml("enabled: false").unwrap();
        assert!(!policy.enabled);
    }

    #[test]
    fn test_parse_rejects_wrong_type() {
        let yaml = r#"
custom_limits:
  /v1/users:
    requests_per_second: "fast"
"#;
        let err = RateLimitPolicy::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, TurnstileError::Config(_)));
    }

    #[test]
    fn test_sanitize_coerces_zero_rate() {
        let yaml = r#"
requests_per_second: 0
custom_limits:
  /v1/users:
    requests_per_second: -3.5
    burst_size: 4
"#;
        let policy = RateLimitPolicy::from_yaml(yaml).unwrap();
        let (policy, warnings) = policy.sanitized();

        assert_eq!(warnings.len(), 2);
        assert_eq!(
            policy.default_limit.requests_per_second,
            FALLBACK_REQUESTS_PER_SECOND
        );
        assert_eq!(
            policy.custom_limits["/v1/users"].requests_per_second,
            FALLBACK_REQUESTS_PER_SECOND
        );
        // Burst sizes are untouched
        assert_eq!(policy.custom_limits["/v1/users"].burst_size, 4);
    }

    #[test]
    fn test_sanitize_keeps_valid_policy() {
        let policy = RateLimitPolicy::default();
        let (sanitized, warnings) = policy.clone().sanitized();

        assert!(warnings.is_empty());
        assert_eq!(sanitized, policy);
    }

    #[test]
    fn test_sanitize_keeps_zero_burst() {
        let yaml = "burst_size: 0";
        let (policy, warnings) = RateLimitPolicy::from_yaml(yaml).unwrap().sanitized();

        assert!(warnings.is_empty());
        assert_eq!(policy.default_limit.burst_size, 0);
    }
}
