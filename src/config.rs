use std::{env, path::PathBuf};

use anyhow::Context;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Lifetime of issued identity tokens.
    pub token_ttl_hours: i64,
    /// Upper bound for a single store call.
    pub store_timeout_secs: u64,
    /// Directory holding the `<collection>.json` fixture files.
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let token_ttl_hours = parse_token_ttl(env::var("JWT_TTL_HOURS").ok().as_deref())?;
        let store_timeout_secs = env::var("STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(10);
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            token_ttl_hours,
            store_timeout_secs,
            data_dir,
        })
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.token_ttl_hours).unwrap_or(chrono::Duration::MAX)
    }
}

fn parse_token_ttl(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TOKEN_TTL_HOURS);
    };
    let hours = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("JWT_TTL_HOURS `{raw}` is not a whole number of hours"))?;
    chrono::Duration::try_hours(hours)
        .filter(|_| (1..=MAX_TOKEN_TTL_HOURS).contains(&hours))
        .with_context(|| format!("JWT_TTL_HOURS must be between 1 and {MAX_TOKEN_TTL_HOURS}"))?;
    Ok(hours)
}
