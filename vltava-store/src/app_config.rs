use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub payments: PaymentsConfig,
    pub session: SessionConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    pub card_secret_key: String,
    pub wallet_client_id: String,
    pub wallet_client_secret: String,
    pub webhook_signing_secret: String,
    pub currency: String,
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_seconds: i64,
}

fn default_webhook_tolerance() -> i64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub secret: String,
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: i64,
    #[serde(default = "default_booking_ttl")]
    pub booking_ttl_seconds: i64,
}

fn default_session_ttl() -> i64 {
    86_400
}

fn default_booking_ttl() -> i64 {
    1_800
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_booking_attempts")]
    pub booking_max_attempts: u32,
    #[serde(default = "default_booking_window")]
    pub booking_window_seconds: u64,
}

fn default_booking_attempts() -> u32 {
    5
}

fn default_booking_window() -> u64 {
    900
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Environment-specific file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Env overrides: VLTAVA__PAYMENTS__CARD_SECRET_KEY etc.
            .add_source(config::Environment::with_prefix("VLTAVA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
