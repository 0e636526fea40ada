// Runtime configuration for the booking engine

use std::time::Duration;
use tracing::warn;

pub const STORE_TIMEOUT_ENV: &str = "TENT_STORE_TIMEOUT_MS";
pub const WEBHOOK_URL_ENV: &str = "TENT_WEBHOOK_URL";
pub const WEBHOOK_TIMEOUT_ENV: &str = "TENT_WEBHOOK_TIMEOUT_MS";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    // Upper bound for every persistence call
    pub store_timeout_ms: u64,
    pub notifier: NotifierConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: 5000,
            notifier: NotifierConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Reads overrides from the environment, keeping defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_millis(&lookup, STORE_TIMEOUT_ENV) {
            config.store_timeout_ms = ms;
        }
        if let Some(url) = lookup(WEBHOOK_URL_ENV).filter(|url| !url.trim().is_empty()) {
            config.notifier.webhook_url = Some(url);
        }
        if let Some(ms) = parse_millis(&lookup, WEBHOOK_TIMEOUT_ENV) {
            config.notifier.timeout_ms = ms;
        }
        config
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    // None disables booking notifications
    pub webhook_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_ms: 2000,
        }
    }
}

impl NotifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone)]
pub struct CompareConfig {
    pub max_units: usize,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self { max_units: 3 }
    }
}

fn parse_millis<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Some(ms),
        _ => {
            warn!(key, value = %raw, "ignoring invalid timeout, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.store_timeout(), Duration::from_secs(5));
        assert!(config.notifier.webhook_url.is_none());
        assert!(config.notifier.timeout() < config.store_timeout());
        assert_eq!(CompareConfig::default().max_units, 3);
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            (STORE_TIMEOUT_ENV, "1500"),
            (WEBHOOK_URL_ENV, "https://hooks.example.com/bookings"),
            (WEBHOOK_TIMEOUT_ENV, "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = EngineConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.store_timeout_ms, 1500);
        assert_eq!(
            config.notifier.webhook_url.as_deref(),
            Some("https://hooks.example.com/bookings")
        );
        assert_eq!(config.notifier.timeout_ms, 2000);
    }
}
