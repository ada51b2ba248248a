use std::str::FromStr;

use chrono::Weekday;
use serde::Deserialize;

/// Default LINE Messaging API push endpoint.
pub const DEFAULT_LINE_API_URL: &str = "https://api.line.me/v2/bot/message/push";

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 10)
    pub db_max_connections: u32,

    /// Port the API server listens on (default: 3000)
    pub api_port: u16,

    /// LINE channel access token, sent as a bearer credential
    pub line_channel_access_token: Option<String>,

    /// LINE user or group ID that receives the push message
    pub line_target_id: Option<String>,

    /// LINE push endpoint
    pub line_api_url: String,

    /// Worker tick interval in milliseconds (default: 10000)
    pub worker_tick_interval_ms: u64,

    /// Delivery attempts per task before it stops being claimed (default: 3)
    pub worker_max_retries: i32,

    /// Upper bound on a single dispatch call in milliseconds (default: 10000)
    pub dispatch_timeout_ms: u64,

    /// Weekdays on which the bin is collected (default: mon,thu)
    pub collection_days: Vec<Weekday>,

    /// Offset from UTC, in hours, of the household's local time (default: 9)
    pub collection_utc_offset_hours: i32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "10")?,
            api_port: parse_var("PORT", "3000")?,
            line_channel_access_token: std::env::var("LINE_CHANNEL_ACCESS_TOKEN").ok(),
            line_target_id: std::env::var("LINE_TARGET_ID")
                .or_else(|_| std::env::var("LINE_USER_ID"))
                .ok(),
            line_api_url: std::env::var("LINE_API_URL")
                .unwrap_or_else(|_| DEFAULT_LINE_API_URL.to_string()),
            worker_tick_interval_ms: parse_var("WORKER_TICK_INTERVAL_MS", "10000")?,
            worker_max_retries: parse_var("WORKER_MAX_RETRIES", "3")?,
            dispatch_timeout_ms: parse_var("DISPATCH_TIMEOUT_MS", "10000")?,
            collection_days: parse_weekdays(
                &std::env::var("COLLECTION_DAYS").unwrap_or_else(|_| "mon,thu".to_string()),
            )?,
            collection_utc_offset_hours: parse_var("COLLECTION_UTC_OFFSET_HOURS", "9")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot drive the worker.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.worker_tick_interval_ms == 0 {
            anyhow::bail!("WORKER_TICK_INTERVAL_MS must be greater than 0");
        }
        if self.worker_max_retries < 1 {
            anyhow::bail!("WORKER_MAX_RETRIES must be at least 1");
        }
        if self.dispatch_timeout_ms == 0 {
            anyhow::bail!("DISPATCH_TIMEOUT_MS must be greater than 0");
        }
        Ok(())
    }
}

/// Read `name` from the environment, falling back to `default`, and parse it.
fn parse_var<T: FromStr>(name: &str, default: &str) -> anyhow::Result<T> {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| {
            anyhow::anyhow!(
                "{} must be a valid {}",
                name,
                std::any::type_name::<T>()
            )
        })
}

/// Parse a comma-separated weekday list such as `mon,thu` or `Monday, Thursday`.
pub fn parse_weekdays(raw: &str) -> anyhow::Result<Vec<Weekday>> {
    let mut days = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let day: Weekday = part.parse().map_err(|_| {
            anyhow::anyhow!("COLLECTION_DAYS contains an invalid weekday '{}'", part)
        })?;
        if !days.contains(&day) {
            days.push(day);
        }
    }

    if days.is_empty() {
        anyhow::bail!("COLLECTION_DAYS must name at least one weekday");
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/binwatch".to_string(),
            db_max_connections: 10,
            api_port: 3000,
            line_channel_access_token: None,
            line_target_id: None,
            line_api_url: DEFAULT_LINE_API_URL.to_string(),
            worker_tick_interval_ms: 10_000,
            worker_max_retries: 3,
            dispatch_timeout_ms: 10_000,
            collection_days: vec![Weekday::Mon, Weekday::Thu],
            collection_utc_offset_hours: 9,
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_tick_interval() {
        let config = AppConfig {
            worker_tick_interval_ms: 0,
            ..valid_config()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "WORKER_TICK_INTERVAL_MS must be greater than 0"
        );
    }

    #[test]
    fn test_validate_rejects_empty_retry_budget() {
        for retries in [0, -1] {
            let config = AppConfig {
                worker_max_retries: retries,
                ..valid_config()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("WORKER_MAX_RETRIES"));
        }
    }

    #[test]
    fn test_validate_rejects_zero_dispatch_timeout() {
        let config = AppConfig {
            dispatch_timeout_ms: 0,
            ..valid_config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DISPATCH_TIMEOUT_MS"));
    }

    #[test]
    fn test_parse_weekdays_short_and_long_names() {
        let days = parse_weekdays("mon, Thursday").unwrap();
        assert_eq!(days, vec![Weekday::Mon, Weekday::Thu]);
    }

    #[test]
    fn test_parse_weekdays_dedupes() {
        let days = parse_weekdays("fri,fri,sat").unwrap();
        assert_eq!(days, vec![Weekday::Fri, Weekday::Sat]);
    }

    #[test]
    fn test_parse_weekdays_rejects_garbage() {
        assert!(parse_weekdays("mon,funday").is_err());
    }

    #[test]
    fn test_parse_weekdays_rejects_empty() {
        assert!(parse_weekdays(" , ").is_err());
    }
}
