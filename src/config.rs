use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub api_rps: u32,
    pub score_stale_hours: i64,
    pub cors_allowed_origin: Option<String>,
    pub log_format: LogFormat,
}

/// Upper bound for `SCORE_STALE_HOURS`, one year.
pub const MAX_SCORE_STALE_HOURS: i64 = 24 * 366;

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let log_format = match env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                return Err(Error::Config(format!(
                    "Invalid value for LOG_FORMAT: {} (expected json or pretty)",
                    other
                )))
            }
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            database_max_connections: get_env_parse_or("DATABASE_MAX_CONNECTIONS", 20)?,
            jwt_secret: get_env("JWT_SECRET")?,
            api_rps: get_env_parse_or("API_RPS", 100)?,
            score_stale_hours: check_score_stale_hours(get_env_parse_or(
                "SCORE_STALE_HOURS",
                24,
            )?)?,
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok().filter(|v| !v.is_empty()),
            log_format,
        })
    }
}

fn check_score_stale_hours(hours: i64) -> Result<i64> {
    if !(1..=MAX_SCORE_STALE_HOURS).contains(&hours) {
        return Err(Error::Config(format!(
            "Invalid value for SCORE_STALE_HOURS: {} (expected 1..={})",
            hours, MAX_SCORE_STALE_HOURS
        )));
    }
    Ok(hours)
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_stale_hours_must_fit_a_duration() {
        assert_eq!(check_score_stale_hours(24).unwrap(), 24);
        assert_eq!(
            check_score_stale_hours(MAX_SCORE_STALE_HOURS).unwrap(),
            MAX_SCORE_STALE_HOURS
        );
        for bad in [0, -5, MAX_SCORE_STALE_HOURS + 1, i64::MAX] {
            let err = check_score_stale_hours(bad).unwrap_err();
            assert!(matches!(err, Error::Config(_)));
        }
    }
}
