pub mod app_config;
pub mod rate_limit;

pub use app_config::Config;
pub use rate_limit::{InMemoryRateLimitStore, RateLimitDecision, RateLimitProfile, RateLimitStore, RateLimiter};
