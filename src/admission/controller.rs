//! Admission controller: per-route limiter resolution and lifecycle.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::bucket::TokenBucket;
use crate::config::RateLimitPolicy;

/// Decides, for each inbound request, whether it may proceed.
///
/// The controller owns the live policy, one shared default bucket, and one
/// bucket per configured route override. All buckets are created eagerly
/// when a policy is installed, so the key-to-bucket map is read-only
/// between reloads; `admit` holds the map's read lock only long enough to
/// clone the matching bucket handle, and buckets for different keys never
/// contend with each other.
///
/// Construct one instance at startup and hand it to the transport adapter;
/// there is no ambient global state.
pub struct AdmissionController {
    inner: RwLock<Inner>,
}

struct Inner {
    policy: RateLimitPolicy,
    default_bucket: Arc<TokenBucket>,
    route_buckets: HashMap<String, Arc<TokenBucket>>,
}

impl AdmissionController {
    /// Create a controller from a policy.
    ///
    /// The policy is sanitized first; each coerced entry is logged as a
    /// warning. Construction never fails.
    pub fn new(policy: RateLimitPolicy) -> Self {
        let (policy, warnings) = policy.sanitized();
        for warning in &warnings {
            warn!(%warning, "Coerced malformed rate limit");
        }

        let default_bucket = Arc::new(TokenBucket::new(&policy.default_limit));
        let route_buckets = policy
            .custom_limits
            .iter()
            .map(|(path, settings)| {
                debug!(
                    path = %path,
                    rate = settings.requests_per_second,
                    burst = settings.burst_size,
                    "Creating route limiter"
                );
                (path.clone(), Arc::new(TokenBucket::new(settings)))
            })
            .collect();

        Self {
            inner: RwLock::new(Inner {
                policy,
                default_bucket,
                route_buckets,
            }),
        }
    }

    /// Decide whether the request identified by `key` may proceed.
    ///
    /// `key` is the exact request path used for override lookup; an empty
    /// or unconfigured key draws from the shared default bucket. Returns
    /// immediately and never errors: denial is expected backpressure, not
    /// a failure, and is logged at debug level only.
    pub fn admit(&self, key: &str) -> bool {
        let bucket = {
            let inner = self.inner.read();
            if !inner.policy.enabled {
                return true;
            }
            inner
                .route_buckets
                .get(key)
                .cloned()
                .unwrap_or_else(|| inner.default_bucket.clone())
        };

        let admitted = bucket.try_acquire();
        if !admitted {
            debug!(key = %key, "Request denied by rate limit");
        }
        admitted
    }

    /// Install a new policy atomically.
    ///
    /// Route keys whose settings are unchanged keep their live bucket,
    /// preserving accumulated tokens. New or changed keys get a freshly
    /// seeded full bucket, as does the default limiter when its settings
    /// change. Keys absent from the new policy fall back to the default
    /// limiter on subsequent requests.
    pub fn reload(&self, policy: RateLimitPolicy) {
        let (policy, warnings) = policy.sanitized();
        for warning in &warnings {
            warn!(%warning, "Coerced malformed rate limit");
        }

        let mut inner = self.inner.write();

        let default_bucket = if policy.default_limit == inner.policy.default_limit {
            inner.default_bucket.clone()
        } else {
            Arc::new(TokenBucket::new(&policy.default_limit))
        };

        let route_buckets = policy
            .custom_limits
            .iter()
            .map(|(path, settings)| {
                let unchanged = inner.policy.custom_limits.get(path) == Some(settings);
                let bucket = if unchanged {
                    inner.route_buckets.get(path).cloned()
                } else {
                    None
                };
                let bucket = bucket.unwrap_or_else(|| {
                    debug!(
                        path = %path,
                        rate = settings.requests_per_second,
                        burst = settings.burst_size,
                        "Creating route limiter"
                    );
                    Arc::new(TokenBucket::new(settings))
                });
                (path.clone(), bucket)
            })
            .collect();

        info!(routes = policy.custom_limits.len(), "Rate limit policy installed");

        *inner = Inner {
            policy,
            default_bucket,
            route_buckets,
        };
    }

    /// Snapshot of the active policy.
    pub fn policy(&self) -> RateLimitPolicy {
        self.inner.read().policy.clone()
    }

    /// Number of live route-override limiters, excluding the default.
    pub fn limiter_count(&self) -> usize {
        self.inner.read().route_buckets.len()
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}
