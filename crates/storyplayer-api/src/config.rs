//! Server configuration, read once at startup.

use std::net::SocketAddr;
use std::time::Duration;

use storyplayer_client::DEFAULT_BASE_URL;
use storyplayer_layout::MOBILE_BREAKPOINT;

use crate::error::AppError;

const DEFAULT_CACHE_DATABASE_URL: &str = "sqlite://storyplayer-cache.db?mode=rwc";
const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 30 * 60;
const DEFAULT_SESSION_SWEEP_INTERVAL_SECS: u64 = 60;

/// Runtime configuration.
#[derive(Clone, PartialEq)]
pub struct ServerConfig {
    /// SDK token for the content and analytics APIs.
    pub api_token: String,
    /// Content API base URL.
    pub api_base_url: String,
    /// Dedupe cache database.
    pub cache_database_url: String,
    /// Listen address.
    pub listen_addr: SocketAddr,
    /// Width below which layout runs in mobile mode.
    pub mobile_breakpoint: f64,
    /// Idle time after which a session is evicted.
    pub session_idle_ttl: Duration,
    /// How often idle sessions are swept.
    pub session_sweep_interval: Duration,
}

fn positive_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> Result<Duration, AppError> {
    let Some(raw) = lookup(name) else {
        return Ok(Duration::from_secs(default));
    };
    raw.parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| AppError::Config(format!("{name} must be a positive number of seconds, got {raw:?}")))
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_token = lookup("STORY_API_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| AppError::Config("STORY_API_TOKEN environment variable must be set".into()))?;
        let api_base_url = lookup("STORY_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let cache_database_url =
            lookup("CACHE_DATABASE_URL").unwrap_or_else(|| DEFAULT_CACHE_DATABASE_URL.to_owned());

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "3000".to_owned())
            .parse()
            .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;
        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;

        let mobile_breakpoint = match lookup("MOBILE_BREAKPOINT") {
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite() && *value > 0.0)
                .ok_or_else(|| {
                    AppError::Config(format!("MOBILE_BREAKPOINT must be a positive number, got {raw:?}"))
                })?,
            None => MOBILE_BREAKPOINT,
        };

        let session_idle_ttl =
            positive_secs(&lookup, "SESSION_IDLE_TTL_SECS", DEFAULT_SESSION_IDLE_TTL_SECS)?;
        let session_sweep_interval = positive_secs(
            &lookup,
            "SESSION_SWEEP_INTERVAL_SECS",
            DEFAULT_SESSION_SWEEP_INTERVAL_SECS,
        )?;

        Ok(Self {
            api_token,
            api_base_url,
            cache_database_url,
            listen_addr,
            mobile_breakpoint,
            session_idle_ttl,
            session_sweep_interval,
        })
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_token", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("cache_database_url", &self.cache_database_url)
            .field("listen_addr", &self.listen_addr)
            .field("mobile_breakpoint", &self.mobile_breakpoint)
            .field("session_idle_ttl", &self.session_idle_ttl)
            .field("session_sweep_interval", &self.session_sweep_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_apply_when_only_token_is_set() {
        let config = config_from(&[("STORY_API_TOKEN", "abc")]).unwrap();

        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.cache_database_url, DEFAULT_CACHE_DATABASE_URL);
        assert_eq!(config.listen_addr.port(), 3000);
        assert!((config.mobile_breakpoint - MOBILE_BREAKPOINT).abs() < f64::EPSILON);
        assert_eq!(config.session_idle_ttl, Duration::from_secs(1800));
        assert_eq!(config.session_sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_session_timings_must_be_positive() {
        let zero = config_from(&[("STORY_API_TOKEN", "abc"), ("SESSION_IDLE_TTL_SECS", "0")]);
        assert!(matches!(zero, Err(AppError::Config(_))));

        let config = config_from(&[
            ("STORY_API_TOKEN", "abc"),
            ("SESSION_IDLE_TTL_SECS", "90"),
            ("SESSION_SWEEP_INTERVAL_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.session_idle_ttl, Duration::from_secs(90));
        assert_eq!(config.session_sweep_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_token_is_a_config_error() {
        assert!(matches!(config_from(&[]), Err(AppError::Config(_))));
        assert!(matches!(
            config_from(&[("STORY_API_TOKEN", "  ")]),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = config_from(&[("STORY_API_TOKEN", "abc"), ("PORT", "http")]);

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_breakpoint_must_be_positive() {
        let result = config_from(&[("STORY_API_TOKEN", "abc"), ("MOBILE_BREAKPOINT", "-1")]);
        assert!(matches!(result, Err(AppError::Config(_))));

        let config = config_from(&[("STORY_API_TOKEN", "abc"), ("MOBILE_BREAKPOINT", "1024")]).unwrap();
        assert!((config.mobile_breakpoint - 1024.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = config_from(&[("STORY_API_TOKEN", "secret-token")]).unwrap();

        assert!(!format!("{config:?}").contains("secret-token"));
    }
}
