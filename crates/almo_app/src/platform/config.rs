//! Startup configuration read from the environment.

use std::path::PathBuf;

use almo_engine::{ClientSettings, StaticToken};
use log::LevelFilter;

use super::logging::LogDestination;

const ENV_API_URL: &str = "ALMO_API_URL";
const ENV_TOKEN: &str = "ALMO_TOKEN";
const ENV_LOG: &str = "ALMO_LOG";
const ENV_LOG_TARGET: &str = "ALMO_LOG_TARGET";
const ENV_STATE_DIR: &str = "ALMO_STATE_DIR";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client: ClientSettings,
    pub token: StaticToken,
    pub log_level: LevelFilter,
    pub log_destination: LogDestination,
    pub state_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let mut client = ClientSettings::default();
        if let Some(url) = value(ENV_API_URL) {
            client.base_url = url;
        }
        let token = match value(ENV_TOKEN) {
            Some(token) => StaticToken::new(token),
            None => StaticToken::none(),
        };
        let log_level = value(ENV_LOG)
            .and_then(|raw| almo_logging::parse_level(&raw))
            .unwrap_or(LevelFilter::Info);
        let log_destination = value(ENV_LOG_TARGET)
            .and_then(|raw| LogDestination::parse(&raw))
            .unwrap_or(LogDestination::File);
        let state_dir = value(ENV_STATE_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            client,
            token,
            log_level,
            log_destination,
            state_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use almo_engine::TokenProvider;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config(&[]);
        assert_eq!(config.client.base_url, "http://localhost:8000/api");
        assert!(config.token.credential().is_none());
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.log_destination, LogDestination::File);
        assert_eq!(config.state_dir, PathBuf::from("."));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config(&[
            ("ALMO_API_URL", "https://docs.example.com/api"),
            ("ALMO_TOKEN", " abc123 "),
            ("ALMO_LOG", "DEBUG"),
            ("ALMO_LOG_TARGET", "both"),
            ("ALMO_STATE_DIR", "/tmp/almo"),
        ]);
        assert_eq!(config.client.base_url, "https://docs.example.com/api");
        assert_eq!(
            config.token.credential().map(|c| c.token().to_string()),
            Some("abc123".to_string())
        );
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.state_dir, PathBuf::from("/tmp/almo"));
    }

    #[test]
    fn blank_token_and_bad_level_fall_back() {
        let config = config(&[("ALMO_TOKEN", "   "), ("ALMO_LOG", "loud")]);
        assert!(config.token.credential().is_none());
        assert_eq!(config.log_level, LevelFilter::Info);
    }
}
