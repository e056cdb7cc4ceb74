//! Configuration loaded from the environment (and `.env`).

use std::{str::FromStr, time::Duration};

use url::Url;

use crate::{error::ConfigError, poller::PollerConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub database_url: String,
    pub log_level: String,
    /// Overrides the Bot API endpoint, e.g. for a local Bot API server.
    pub api_url: Option<Url>,
    /// Skips the `getMe` lookup when set.
    pub bot_username: Option<String>,
    /// Long-poll duration passed to `getUpdates`, in seconds.
    pub poll_timeout: u32,
    pub poller: PollerConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let poller = PollerConfig {
            retry_delay: Duration::from_millis(parse_or(&lookup, "POLL_RETRY_MS", 1000)?),
            max_retry_delay: Duration::from_millis(parse_or(&lookup, "POLL_MAX_RETRY_MS", 60_000)?),
        };

        let api_url = lookup("TELEGRAM_API_URL")
            .map(|raw| {
                raw.parse::<Url>().map_err(|e| ConfigError::Invalid {
                    name: "TELEGRAM_API_URL",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let bot_username = lookup("BOT_USERNAME")
            .map(|s| s.trim_start_matches('@').to_owned())
            .filter(|s| !s.is_empty());

        Ok(Self {
            bot_token: required("TELOXIDE_TOKEN")?,
            database_url: required("DATABASE_URL")?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            api_url,
            bot_username,
            poll_timeout: parse_or(&lookup, "POLL_TIMEOUT_SECS", 10)?,
            poller,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = load(&[
            ("TELOXIDE_TOKEN", "123:abc"),
            ("DATABASE_URL", "postgres://db"),
        ])
        .unwrap();

        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.poll_timeout, 10);
        assert_eq!(config.poller.retry_delay, Duration::from_secs(1));
        assert_eq!(config.poller.max_retry_delay, Duration::from_secs(60));
        assert!(config.api_url.is_none());
        assert!(config.bot_username.is_none());
    }

    #[test]
    fn missing_token_is_reported() {
        let err = load(&[("DATABASE_URL", "postgres://db")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TELOXIDE_TOKEN")));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("TELOXIDE_TOKEN", "123:abc"),
            ("DATABASE_URL", "postgres://db"),
            ("BOT_USERNAME", "@quizbot"),
            ("TELEGRAM_API_URL", "http://localhost:8081"),
            ("POLL_TIMEOUT_SECS", "25"),
            ("POLL_RETRY_MS", "250"),
        ])
        .unwrap();

        assert_eq!(config.bot_username.as_deref(), Some("quizbot"));
        assert_eq!(config.api_url.unwrap().as_str(), "http://localhost:8081/");
        assert_eq!(config.poll_timeout, 25);
        assert_eq!(config.poller.retry_delay, Duration::from_millis(250));
    }

    #[test]
    fn unparsable_number_is_invalid() {
        let err = load(&[
            ("TELOXIDE_TOKEN", "123:abc"),
            ("DATABASE_URL", "postgres://db"),
            ("POLL_TIMEOUT_SECS", "soon"),
        ])
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { name: "POLL_TIMEOUT_SECS", .. }));
    }
}
