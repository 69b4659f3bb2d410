use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub port: u16,
    pub rust_log: String,
    /// Cached scores younger than this are served without calling the matcher.
    pub score_staleness_days: i64,
    /// Upper bound on in-flight matcher calls within one bulk operation.
    pub matcher_concurrency: usize,
    pub matcher_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let score_staleness_days = parse_env("SCORE_STALENESS_DAYS", 7_i64)?;
        if score_staleness_days <= 0 {
            bail!("SCORE_STALENESS_DAYS must be greater than zero");
        }

        let matcher_concurrency = parse_env("MATCHER_CONCURRENCY", 8_usize)?;
        if matcher_concurrency == 0 {
            bail!("MATCHER_CONCURRENCY must be greater than zero");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            port: parse_env("PORT", 8080_u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            score_staleness_days,
            matcher_concurrency,
            matcher_timeout_secs: parse_env("MATCHER_TIMEOUT_SECS", 60_u64)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
