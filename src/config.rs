use std::env;
use std::str::FromStr;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::decimal::Currency;
use crate::delinquency::DEFAULT_DELINQUENCY_THRESHOLD;
use crate::errors::{BillingError, Result};
use crate::logging::LoggingConfig;
use crate::time::{offset_from_hours, DEFAULT_UTC_OFFSET_HOURS};

pub const ENV_UTC_OFFSET_HOURS: &str = "BILLING_UTC_OFFSET_HOURS";
pub const ENV_DELINQUENCY_THRESHOLD: &str = "BILLING_DELINQUENCY_THRESHOLD";
pub const ENV_LOG_FILTER: &str = "BILLING_LOG_FILTER";

/// billing engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// offset of the fixed local timezone used for "now" and every due date
    pub utc_offset_hours: i32,
    /// missed periods tolerated before a loan is delinquent
    pub delinquency_threshold: u32,
    pub currency: Currency,
    pub logging: LoggingConfig,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            delinquency_threshold: DEFAULT_DELINQUENCY_THRESHOLD,
            currency: Currency::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl BillingConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BillingConfig =
            serde_json::from_str(json).map_err(|e| BillingError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Read overrides from the process environment; unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(hours) = parse_var(&lookup, ENV_UTC_OFFSET_HOURS)? {
            config.utc_offset_hours = hours;
        }
        if let Some(threshold) = parse_var(&lookup, ENV_DELINQUENCY_THRESHOLD)? {
            config.delinquency_threshold = threshold;
        }
        if let Some(filter) = lookup(ENV_LOG_FILTER).filter(|v| !v.trim().is_empty()) {
            config.logging.filter = filter.trim().to_string();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.utc_offset_hours.abs() > 23 {
            return Err(BillingError::InvalidConfiguration {
                message: format!("utc_offset_hours must be within ±23, got {}", self.utc_offset_hours),
            });
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<FixedOffset> {
        offset_from_hours(self.utc_offset_hours)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| BillingError::InvalidConfiguration {
                message: format!("{key} should be a number, got {raw:?}"),
            }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BillingConfig::default();
        assert_eq!(config.utc_offset_hours, 7);
        assert_eq!(config.delinquency_threshold, 2);
        assert_eq!(config.currency, Currency::Idr);
        assert_eq!(config.timezone().unwrap().local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn test_from_lookup() {
        let config = BillingConfig::from_lookup(lookup(&[
            (ENV_UTC_OFFSET_HOURS, "0"),
            (ENV_DELINQUENCY_THRESHOLD, " 3 "),
            (ENV_LOG_FILTER, "debug"),
        ]))
        .unwrap();
        assert_eq!(config.utc_offset_hours, 0);
        assert_eq!(config.delinquency_threshold, 3);
        assert_eq!(config.logging.filter, "debug");

        let empty = BillingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(empty, BillingConfig::default());
    }

    #[test]
    fn test_malformed_values_are_errors() {
        assert!(BillingConfig::from_lookup(lookup(&[(ENV_DELINQUENCY_THRESHOLD, "two")])).is_err());
        assert!(BillingConfig::from_lookup(lookup(&[(ENV_UTC_OFFSET_HOURS, "30")])).is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let config = BillingConfig::from_json(r#"{"delinquency_threshold": 4}"#).unwrap();
        assert_eq!(config.delinquency_threshold, 4);
        assert_eq!(config.utc_offset_hours, 7);
        assert!(BillingConfig::from_json("{").is_err());
    }
}
