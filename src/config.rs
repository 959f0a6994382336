//! Dashboard configuration

use std::time::Duration;

use url::Url;

use crate::error::FluxError;
use crate::metrics::{DEFAULT_TOP_N, DEFAULT_WINDOW_DAYS};

/// Environment variable holding the store endpoint
pub const ENDPOINT_ENV: &str = "K9_ENDPOINT_URL";

/// Environment variable overriding the post-submit refresh delay
pub const REFRESH_DELAY_ENV: &str = "K9_REFRESH_DELAY_MS";

/// Delay between a successful append and the reconciling re-fetch
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub endpoint: Url,
    pub refresh_delay: Duration,
    pub window_days: u32,
    pub top_n: usize,
}

impl DashboardConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            refresh_delay: DEFAULT_REFRESH_DELAY,
            window_days: DEFAULT_WINDOW_DAYS,
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    /// Read `K9_ENDPOINT_URL` and `K9_REFRESH_DELAY_MS`
    pub fn from_env() -> Result<Self, FluxError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (environment, CLI layer, tests)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FluxError> {
        let raw = lookup(ENDPOINT_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| FluxError::Config(format!("{ENDPOINT_ENV} is not set")))?;
        let endpoint = Url::parse(raw.trim())
            .map_err(|e| FluxError::Config(format!("{ENDPOINT_ENV} is not a valid URL: {e}")))?;

        let mut config = Self::new(endpoint);
        if let Some(raw) = lookup(REFRESH_DELAY_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                FluxError::Config(format!("{REFRESH_DELAY_ENV} must be milliseconds, got {raw:?}"))
            })?;
            config.refresh_delay = Duration::from_millis(millis);
        }
        Ok(config)
    }
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            DashboardConfig::from_lookup(lookup(&[(ENDPOINT_ENV, "https://sheets.example/exec")]))
                .unwrap();
        assert_eq!(config.endpoint.as_str(), "https://sheets.example/exec");
        assert_eq!(config.refresh_delay, Duration::from_millis(1500));
        assert_eq!(config.window_days, 7);
        assert_eq!(config.top_n, 5);
    }

    #[test]
    fn test_refresh_delay_override() {
        let config = DashboardConfig::from_lookup(lookup(&[
            (ENDPOINT_ENV, "https://sheets.example/exec"),
            (REFRESH_DELAY_ENV, "250"),
        ]))
        .unwrap();
        assert_eq!(config.refresh_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            DashboardConfig::from_lookup(lookup(&[])),
            Err(FluxError::Config(_))
        ));
        assert!(matches!(
            DashboardConfig::from_lookup(lookup(&[(ENDPOINT_ENV, "not a url")])),
            Err(FluxError::Config(_))
        ));
        assert!(matches!(
            DashboardConfig::from_lookup(lookup(&[
                (ENDPOINT_ENV, "https://sheets.example/exec"),
                (REFRESH_DELAY_ENV, "soon"),
            ])),
            Err(FluxError::Config(_))
        ));
    }
}
