/**
 * Configuration
 * Service and client settings loaded from the environment
 */

use std::{env, fmt::Display, net::SocketAddr, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::info;

pub const DEFAULT_BIND: &str = "127.0.0.1:5055";
pub const DEFAULT_THRESHOLD: u32 = 35;
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024 * 1024;
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5055";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {key} value {value:?}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// Verification service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: SocketAddr,
    pub threshold: u32,
    pub body_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let threshold = DEFAULT_THRESHOLD.to_string();
        let body_limit = DEFAULT_BODY_LIMIT.to_string();
        Ok(Self {
            bind: try_load(&lookup, "FINGERMATCH_BIND", DEFAULT_BIND)?,
            threshold: try_load(&lookup, "FINGERMATCH_THRESHOLD", &threshold)?,
            body_limit: try_load(&lookup, "FINGERMATCH_BODY_LIMIT", &body_limit)?,
        })
    }
}

/// Settings for callers of the verification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub service_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Entry point for processes that embed the orchestrator, e.g. a kiosk
    /// shell building an `HttpVerifier` at startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let timeout_ms: u64 =
            try_load(&lookup, "FINGERMATCH_TIMEOUT_MS", &DEFAULT_TIMEOUT_MS.to_string())?;
        if timeout_ms == 0 {
            return Err(ConfigError {
                key: "FINGERMATCH_TIMEOUT_MS",
                value: "0".to_string(),
                reason: "timeout must be positive".to_string(),
            });
        }

        Ok(Self {
            service_url: try_load(&lookup, "FINGERMATCH_URL", DEFAULT_SERVICE_URL)?,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError {
        key,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND.parse().unwrap());
        assert_eq!(config.threshold, 35);
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);

        assert_eq!(ClientConfig::from_lookup(lookup(&[])).unwrap(), ClientConfig::default());
    }

    #[test]
    fn threshold_is_injected() {
        let config = Config::from_lookup(lookup(&[("FINGERMATCH_THRESHOLD", "42")])).unwrap();
        assert_eq!(config.threshold, 42);
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = Config::from_lookup(lookup(&[("FINGERMATCH_THRESHOLD", "high")])).unwrap_err();
        assert_eq!(err.key, "FINGERMATCH_THRESHOLD");
        assert_eq!(err.value, "high");

        let err =
            ClientConfig::from_lookup(lookup(&[("FINGERMATCH_TIMEOUT_MS", "0")])).unwrap_err();
        assert_eq!(err.key, "FINGERMATCH_TIMEOUT_MS");
    }

    #[test]
    fn client_timeout_is_parsed() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("FINGERMATCH_URL", "http://scanner.local:9000"),
            ("FINGERMATCH_TIMEOUT_MS", "2500"),
        ]))
        .unwrap();
        assert_eq!(config.service_url, "http://scanner.local:9000");
        assert_eq!(config.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn client_config_reads_process_environment() {
        // Skipped when the outer environment configures the client
        let keys = ["FINGERMATCH_URL", "FINGERMATCH_TIMEOUT_MS"];
        if keys.iter().any(|key| env::var_os(key).is_some()) {
            return;
        }
        assert_eq!(ClientConfig::from_env().unwrap(), ClientConfig::default());
    }
}
