use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub reset_at: DateTime<Utc>,
}

/// Attempt budget for a class of endpoints.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitProfile {
    pub max_attempts: u32,
    pub window: Duration,
}

impl RateLimitProfile {
    /// Payment endpoints run 5 attempts per 15 minutes; stricter profiles
    /// (e.g. a contact form at 3 per hour) use the same shape.
    pub fn new(max_attempts: u32, window_seconds: u64) -> Self {
        Self {
            max_attempts,
            window: Duration::seconds(window_seconds as i64),
        }
    }
}

/// Counter storage behind a trait so tests reset state deterministically and
/// a multi-instance deployment can plug in an external key-value store.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record one attempt for the identifier and return the decision.
    /// On the first attempt, or once the window has elapsed, the count
    /// resets to 1 and a new window-end timestamp is set.
    async fn hit(
        &self,
        identifier: &str,
        profile: RateLimitProfile,
        now: DateTime<Utc>,
    ) -> RateLimitDecision;

    async fn reset(&self, identifier: &str);
}

#[derive(Debug, Clone, Copy)]
struct Counter {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Process-local store. Entries persist until restart; acceptable for a
/// single-instance deployment.
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    counters: RwLock<HashMap<String, Counter>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(
        &self,
        identifier: &str,
        profile: RateLimitProfile,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let mut counters = self.counters.write().await;
        let counter = counters
            .entry(identifier.to_string())
            .and_modify(|c| {
                if now >= c.reset_at {
                    c.count = 1;
                    c.reset_at = now + profile.window;
                } else {
                    c.count += 1;
                }
            })
            .or_insert(Counter {
                count: 1,
                reset_at: now + profile.window,
            });

        RateLimitDecision {
            allowed: counter.count <= profile.max_attempts,
            reset_at: counter.reset_at,
        }
    }

    async fn reset(&self, identifier: &str) {
        self.counters.write().await.remove(identifier);
    }
}

/// Rate limiter applied to booking/payment attempts, keyed by client
/// identity (IP).
pub struct RateLimiter {
    store: std::sync::Arc<dyn RateLimitStore>,
    profile: RateLimitProfile,
}

impl RateLimiter {
    pub fn new(store: std::sync::Arc<dyn RateLimitStore>, profile: RateLimitProfile) -> Self {
        Self { store, profile }
    }

    pub async fn check(&self, identifier: &str) -> RateLimitDecision {
        let decision = self.store.hit(identifier, self.profile, Utc::now()).await;
        if !decision.allowed {
            tracing::warn!(identifier, reset_at = %decision.reset_at, "Rate limit exceeded");
        }
        decision
    }
}
