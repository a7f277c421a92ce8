use chrono::Duration;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub notification_type: NotificationType,
    pub webhook_url: Option<String>,
    pub sweep_interval_secs: u64,
    pub dispatch_interval_secs: u64,
    pub auction: AuctionSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    Discord,
    Slack,
}

/// League rules consumed read-only by the auction core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionSettings {
    pub minimum_bid: i64,
    pub match_time_hours: i64,
    pub max_nominations_normal: i64,
    pub max_nominations_urgent: i64,
    pub urgent_threshold_hours: i64,
    pub notification_alert_minutes: i64,
    /// Contract length in years -> minimum total salary over the contract.
    pub minimum_total_salary: BTreeMap<i64, i64>,
}

impl Default for AuctionSettings {
    fn default() -> Self {
        Self {
            minimum_bid: 11,
            match_time_hours: 24,
            max_nominations_normal: 2,
            max_nominations_urgent: 3,
            urgent_threshold_hours: 24,
            notification_alert_minutes: 120,
            minimum_total_salary: BTreeMap::new(),
        }
    }
}

impl AuctionSettings {
    pub fn match_window(&self) -> Duration {
        Duration::hours(self.match_time_hours)
    }

    pub fn urgent_threshold(&self) -> Duration {
        Duration::hours(self.urgent_threshold_hours)
    }

    pub fn alert_lead(&self) -> Duration {
        Duration::minutes(self.notification_alert_minutes)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or(&env_map, "PORT", 8080u16, "must be a valid u16")?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let notification_type = match env_map
            .get("NOTIFICATION_TYPE")
            .map(|s| s.to_lowercase())
            .as_deref()
            .unwrap_or("discord")
        {
            "discord" => NotificationType::Discord,
            "slack" => NotificationType::Slack,
            other => {
                return Err(ConfigError::InvalidValue(
                    "NOTIFICATION_TYPE".to_string(),
                    format!("must be discord or slack, got {}", other),
                ))
            }
        };

        let webhook_url = env_map
            .get("WEBHOOK_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let sweep_interval_secs =
            parse_or(&env_map, "SWEEP_INTERVAL_SECS", 300u64, "must be a valid u64")?;
        let dispatch_interval_secs =
            parse_or(&env_map, "DISPATCH_INTERVAL_SECS", 60u64, "must be a valid u64")?;

        let auction = parse_auction_settings(&env_map)?;

        Ok(Config {
            port,
            database_path,
            notification_type,
            webhook_url,
            sweep_interval_secs,
            dispatch_interval_secs,
            auction,
        })
    }
}

fn parse_auction_settings(
    env_map: &HashMap<String, String>,
) -> Result<AuctionSettings, ConfigError> {
    let defaults = AuctionSettings::default();
    let positive = "must be a positive integer";

    let settings = AuctionSettings {
        minimum_bid: parse_positive(env_map, "MINIMUM_BID_VALUE", defaults.minimum_bid)?,
        match_time_hours: parse_positive(env_map, "MATCH_TIME_HOURS", defaults.match_time_hours)?,
        max_nominations_normal: parse_positive(
            env_map,
            "MAX_NOMINATIONS_NORMAL",
            defaults.max_nominations_normal,
        )?,
        max_nominations_urgent: parse_positive(
            env_map,
            "MAX_NOMINATIONS_URGENT",
            defaults.max_nominations_urgent,
        )?,
        urgent_threshold_hours: parse_or(
            env_map,
            "URGENT_THRESHOLD_HOURS",
            defaults.urgent_threshold_hours,
            positive,
        )?,
        notification_alert_minutes: parse_or(
            env_map,
            "NOTIFICATION_ALERT_MINUTES",
            defaults.notification_alert_minutes,
            positive,
        )?,
        minimum_total_salary: parse_year_table(env_map, "MINIMUM_TOTAL_SALARY")?,
    };

    if settings.max_nominations_urgent < settings.max_nominations_normal {
        return Err(ConfigError::InvalidValue(
            "MAX_NOMINATIONS_URGENT".to_string(),
            "must be >= MAX_NOMINATIONS_NORMAL".to_string(),
        ));
    }

    Ok(settings)
}

fn parse_or<T: FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    expectation: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), expectation.to_string())),
    }
}

fn parse_positive(
    env_map: &HashMap<String, String>,
    key: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    let value = parse_or(env_map, key, default, "must be a positive integer")?;
    if value <= 0 {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be a positive integer".to_string(),
        ));
    }
    Ok(value)
}

/// Parse a JSON object with integer-like keys, e.g. `{"1": 11, "2": 30}`.
fn parse_year_table(
    env_map: &HashMap<String, String>,
    key: &str,
) -> Result<BTreeMap<i64, i64>, ConfigError> {
    let Some(raw) = env_map.get(key).filter(|s| !s.trim().is_empty()) else {
        return Ok(BTreeMap::new());
    };

    let table: HashMap<String, i64> = serde_json::from_str(raw).map_err(|e| {
        ConfigError::InvalidValue(key.to_string(), format!("must be a JSON object: {}", e))
    })?;

    table
        .into_iter()
        .map(|(year, value)| {
            year.trim()
                .parse::<i64>()
                .map(|year| (year, value))
                .map_err(|_| {
                    ConfigError::InvalidValue(
                        key.to_string(),
                        format!("key {} is not an integer", year),
                    )
                })
        })
        .collect()
}
