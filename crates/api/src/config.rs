use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use encore_engine::EngineConfig;

/// Default origins of the audience and DJ front-ends in local development.
pub const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:5173,http://127.0.0.1:5173,http://localhost:3000,http://127.0.0.1:3000";

/// Output format of the tracing fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("unknown log format '{other}' (expected plain or json)"),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight connections (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Bearer token guarding `/admin`. Unset means admin endpoints refuse
    /// every call with 500.
    pub admin_token: Option<String>,
    /// Bounded wait for a session lock in milliseconds (default: `2000`).
    pub lock_wait_ms: u64,
    /// Per-session notification buffer (default: `64`).
    pub event_channel_capacity: usize,
    /// Interval between WebSocket pings in seconds (default: `30`).
    pub ws_heartbeat_secs: u64,
    /// Connections silent for longer than this are dropped (default: `90`).
    pub ws_idle_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `8000`                     |
    /// | `CORS_ORIGINS`           | localhost/127.0.0.1 on 5173 and 3000 |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `30`                       |
    /// | `ADMIN_TOKEN`            | unset                      |
    /// | `LOCK_WAIT_MS`           | `2000`                     |
    /// | `EVENT_CHANNEL_CAPACITY` | `64`                       |
    /// | `WS_HEARTBEAT_SECS`      | `30`                       |
    /// | `WS_IDLE_TIMEOUT_SECS`   | `90`                       |
    /// | `LOG_FORMAT`             | `plain`                    |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let cors_origins = parse_origins(
            &lookup("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into()),
        );
        let admin_token = lookup("ADMIN_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let event_channel_capacity: usize = parse_or(&lookup, "EVENT_CHANNEL_CAPACITY", 64)?;
        if event_channel_capacity == 0 {
            anyhow::bail!("EVENT_CHANNEL_CAPACITY must be greater than zero");
        }
        let ws_heartbeat_secs: u64 = parse_or(&lookup, "WS_HEARTBEAT_SECS", 30)?;
        if ws_heartbeat_secs == 0 {
            anyhow::bail!("WS_HEARTBEAT_SECS must be greater than zero");
        }
        let ws_idle_timeout_secs: u64 = parse_or(&lookup, "WS_IDLE_TIMEOUT_SECS", 90)?;
        if ws_idle_timeout_secs <= ws_heartbeat_secs {
            anyhow::bail!(
                "WS_IDLE_TIMEOUT_SECS ({ws_idle_timeout_secs}) must be greater than \
                 WS_HEARTBEAT_SECS ({ws_heartbeat_secs})"
            );
        }

        Ok(Self {
            host,
            port: parse_or(&lookup, "PORT", 8000)?,
            cors_origins,
            request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?,
            shutdown_timeout_secs: parse_or(&lookup, "SHUTDOWN_TIMEOUT_SECS", 30)?,
            admin_token,
            lock_wait_ms: parse_or(&lookup, "LOCK_WAIT_MS", 2000)?,
            event_channel_capacity,
            ws_heartbeat_secs,
            ws_idle_timeout_secs,
            log_format: parse_or(&lookup, "LOG_FORMAT", LogFormat::Plain)?,
        })
    }

    /// Engine tunables derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            lock_wait: Duration::from_millis(self.lock_wait_ms),
            event_capacity: self.event_channel_capacity,
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.ws_heartbeat_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.ws_idle_timeout_secs)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| anyhow::anyhow!("{e}"))
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.cors_origins.len(), 4);
        assert_eq!(config.admin_token, None);
        assert_eq!(config.lock_wait_ms, 2000);
        assert_eq!(config.event_channel_capacity, 64);
        assert_eq!(config.log_format, LogFormat::Plain);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("CORS_ORIGINS", " https://a.example , ,https://b.example"),
            ("ADMIN_TOKEN", "s3cret"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn blank_admin_token_counts_as_unset() {
        let config = config_from(&[("ADMIN_TOKEN", "   ")]).unwrap();
        assert_eq!(config.admin_token, None);
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(config_from(&[("LOG_FORMAT", "xml")]).is_err());
        assert!(config_from(&[("EVENT_CHANNEL_CAPACITY", "0")]).is_err());
    }

    #[test]
    fn idle_timeout_must_exceed_heartbeat() {
        let err = config_from(&[("WS_HEARTBEAT_SECS", "30"), ("WS_IDLE_TIMEOUT_SECS", "10")])
            .unwrap_err();
        assert!(err.to_string().contains("WS_IDLE_TIMEOUT_SECS"));
        assert!(config_from(&[("WS_HEARTBEAT_SECS", "30"), ("WS_IDLE_TIMEOUT_SECS", "30")]).is_err());
        // Lowering the heartbeat alone keeps the default idle timeout valid.
        let config = config_from(&[("WS_HEARTBEAT_SECS", "5")]).unwrap();
        assert_eq!(config.ws_idle_timeout_secs, 90);
    }
}
