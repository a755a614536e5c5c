use dotenvy::dotenv;
use std::env;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// ✅ Global Config stored in `OnceLock`
static CONFIG: OnceLock<Arc<Config>> = OnceLock::new();

#[derive(Clone, Debug)]
pub struct Config {
    pub upstream_api_url: String,
    pub bind_addr: String,
    pub upstream_timeout: Duration,
    pub verify_poll_attempts: u32,
    pub verify_poll_interval: Duration,
    pub cache_ttl: Duration,
    pub refresh_debounce: Duration,
    pub session_ttl: Duration,
}

impl Config {
    /// ✅ Load environment variables and set defaults
    pub fn from_env() -> Self {
        dotenv().ok(); // Load .env only once

        Self {
            upstream_api_url: env::var("UNITE_API_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:4000".to_string()),
            upstream_timeout: Duration::from_secs(env_u64("UPSTREAM_TIMEOUT_SECS", 10)),
            verify_poll_attempts: env_u64("VERIFY_POLL_ATTEMPTS", 5) as u32,
            verify_poll_interval: Duration::from_secs(env_u64("VERIFY_POLL_INTERVAL_SECS", 2)),
            cache_ttl: Duration::from_secs(env_u64("CACHE_TTL_SECS", 60)),
            refresh_debounce: Duration::from_millis(env_u64("REFRESH_DEBOUNCE_MS", 500)),
            session_ttl: Duration::from_secs(env_u64("SESSION_TTL_SECS", 1800)),
        }
    }

    /// ✅ Initialize the global config
    pub fn init() {
        CONFIG
            .set(Arc::new(Self::from_env()))
            .expect("Config already initialized");
    }

    /// ✅ Safe access to Config
    pub fn get() -> Arc<Config> {
        CONFIG.get().expect("Config not initialized").clone()
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}
