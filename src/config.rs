use std::env;
use std::str::FromStr;
use std::time::Duration;

use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::domain::cart::ShippingPolicy;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// PostgreSQL is used when set, otherwise orders stay in memory.
    pub database_url: Option<String>,
    pub seed_path: Option<String>,
    pub shipping: ShippingPolicy,
    pub grace_period: chrono::Duration,
    /// `None` disables the background sweep timer.
    pub sweep_interval: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: None,
            seed_path: None,
            shipping: ShippingPolicy::default(),
            grace_period: chrono::Duration::hours(48),
            sweep_interval: Some(Duration::from_secs(3600)),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => parse::<u16>("PORT", &raw)?,
            None => defaults.port,
        };

        let free_threshold = match get("FREE_SHIPPING_THRESHOLD") {
            Some(raw) => non_negative_decimal("FREE_SHIPPING_THRESHOLD", &raw)?,
            None => defaults.shipping.free_threshold,
        };
        let flat_fee = match get("FLAT_SHIPPING_FEE") {
            Some(raw) => non_negative_decimal("FLAT_SHIPPING_FEE", &raw)?,
            None => defaults.shipping.flat_fee,
        };

        let grace_period = match get("GRACE_PERIOD_HOURS") {
            Some(raw) => {
                let hours = parse::<i64>("GRACE_PERIOD_HOURS", &raw)?;
                if hours <= 0 {
                    return Err(invalid("GRACE_PERIOD_HOURS", &raw, "must be positive"));
                }
                chrono::Duration::hours(hours)
            }
            None => defaults.grace_period,
        };

        let sweep_interval = match get("SWEEP_INTERVAL_SECS") {
            Some(raw) => match parse::<u64>("SWEEP_INTERVAL_SECS", &raw)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            None => defaults.sweep_interval,
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            database_url: get("DATABASE_URL"),
            seed_path: get("SEED_PATH"),
            shipping: ShippingPolicy::new(free_threshold, flat_fee),
            grace_period,
            sweep_interval,
        })
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| invalid(key, raw, e.to_string()))
}

fn non_negative_decimal(key: &'static str, raw: &str) -> Result<BigDecimal, ConfigError> {
    let value = parse::<BigDecimal>(key, raw)?;
    if value < BigDecimal::from(0u32) {
        return Err(invalid(key, raw, "must not be negative"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(config_from(&[]).unwrap(), Config::default());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("FREE_SHIPPING_THRESHOLD", "15"),
            ("FLAT_SHIPPING_FEE", "5.50"),
            ("GRACE_PERIOD_HOURS", "72"),
            ("SWEEP_INTERVAL_SECS", "0"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/orders"));
        assert_eq!(config.shipping.free_threshold, BigDecimal::from(15u32));
        assert_eq!(config.shipping.flat_fee, "5.50".parse::<BigDecimal>().unwrap());
        assert_eq!(config.grace_period, chrono::Duration::hours(72));
        assert_eq!(config.sweep_interval, None);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[("DATABASE_URL", "  "), ("PORT", "")]).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
        assert!(config_from(&[("FLAT_SHIPPING_FEE", "-1")]).is_err());
        assert!(config_from(&[("GRACE_PERIOD_HOURS", "0")]).is_err());
        let err = config_from(&[("FREE_SHIPPING_THRESHOLD", "lots")]).unwrap_err();
        assert!(err.to_string().starts_with("FREE_SHIPPING_THRESHOLD"));
    }
}
