use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    // Logging
    pub log_dir: String,
    pub log_level: String,

    // Background jobs
    pub sprint_horizon_months: u32,
    pub job_interval_secs: u64,

    pub leave_type_cache_ttl_secs: u64,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: or_default("API_PREFIX", "/api".to_string())?,
            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,
            log_dir: or_default("LOG_DIR", "logs".to_string())?,
            log_level: or_default("LOG_LEVEL", "debug".to_string())?,
            sprint_horizon_months: or_default("SPRINT_HORIZON_MONTHS", 6)?,
            job_interval_secs: or_default("JOB_INTERVAL_SECS", 86_400)?,
            leave_type_cache_ttl_secs: or_default("LEAVE_TYPE_CACHE_TTL_SECS", 600)?,
        })
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "mysql://localhost/leave_test".into(),
        jwt_secret: "test-secret".into(),
        server_addr: "127.0.0.1:0".into(),
        api_prefix: "/api".into(),
        rate_protected_per_min: 1000,
        log_dir: "logs".into(),
        log_level: "debug".into(),
        sprint_horizon_months: 6,
        job_interval_secs: 86_400,
        leave_type_cache_ttl_secs: 600,
    }
}
