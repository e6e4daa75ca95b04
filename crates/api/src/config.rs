//! Application configuration loaded from environment variables.

use std::time::Duration;

use common::CoreError;
use event_bus::RetryPolicy;
use payments::OutcomePolicy;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `BUS_PARTITIONS` — event channel partition count (default: `4`)
/// - `RETRY_MAX_ATTEMPTS` — handler delivery attempts (default: `3`)
/// - `RETRY_BACKOFF_MS` — fixed backoff between attempts (default: `1000`)
/// - `OUTCOME_WEIGHTS` — comma-separated payment outcome weights for
///   Successful, InsufficientFunds, Fraudulent, ChargebackInitiated
///   (default: `"0.4,0.2,0.2,0.2"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub bus_partitions: usize,
    pub retry_max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub outcome_weights: [f64; 4],
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_parsed("PORT", defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            bus_partitions: env_parsed("BUS_PARTITIONS", defaults.bus_partitions),
            retry_max_attempts: env_parsed("RETRY_MAX_ATTEMPTS", defaults.retry_max_attempts),
            retry_backoff_ms: env_parsed("RETRY_BACKOFF_MS", defaults.retry_backoff_ms),
            outcome_weights: std::env::var("OUTCOME_WEIGHTS")
                .ok()
                .and_then(|raw| parse_weights(&raw))
                .unwrap_or(defaults.outcome_weights),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the event channel retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_backoff_ms),
        )
    }

    /// Builds the payment outcome table; invalid weights are rejected.
    pub fn outcome_policy(&self) -> Result<OutcomePolicy, CoreError> {
        let [s, i, f, c] = self.outcome_weights;
        OutcomePolicy::new(s, i, f, c)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            bus_partitions: 4,
            retry_max_attempts: 3,
            retry_backoff_ms: 1000,
            outcome_weights: [0.4, 0.2, 0.2, 0.2],
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

fn parse_weights(raw: &str) -> Option<[f64; 4]> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<_>>()?;
    parts.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.bus_partitions, 4);
        assert_eq!(config.retry_max_attempts, 3);
        assert_eq!(config.retry_backoff_ms, 1000);
        assert_eq!(config.outcome_weights, [0.4, 0.2, 0.2, 0.2]);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_weight_parsing() {
        assert_eq!(
            parse_weights("0.7, 0.1, 0.1, 0.1"),
            Some([0.7, 0.1, 0.1, 0.1])
        );
        assert_eq!(parse_weights("0.5,0.5"), None);
        assert_eq!(parse_weights("a,b,c,d"), None);
    }

    #[test]
    fn test_default_outcome_policy_is_valid() {
        assert!(Config::default().outcome_policy().is_ok());
    }
}
