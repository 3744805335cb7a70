use serde::{Deserialize, Serialize};
use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

use crate::errors::{BillingError, Result};

/// logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `info,loan_billing_rs=debug`
    pub filter: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: false,
        }
    }
}

/// Build a dispatcher for injection into a [`BillingEngine`](crate::BillingEngine).
///
/// Nothing is installed globally; the engine scopes every operation to this dispatcher.
pub fn build_dispatch(config: &LoggingConfig) -> Result<Dispatch> {
    let filter =
        EnvFilter::try_new(&config.filter).map_err(|e| BillingError::InvalidConfiguration {
            message: format!("invalid log filter {:?}: {e}", config.filter),
        })?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(true)
        .finish();

    Ok(Dispatch::new(subscriber))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_dispatch() {
        assert!(build_dispatch(&LoggingConfig::default()).is_ok());

        let config = LoggingConfig {
            filter: "info,loan_billing_rs=debug".to_string(),
            ansi: true,
        };
        assert!(build_dispatch(&config).is_ok());
    }
}
