//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::room::DEFAULT_JOIN_URL_BASE;
use crate::source::http::DEFAULT_ROOMS_URL;

/// Which notification gateway to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    /// Write notifications to the log.
    Log,
    /// Show desktop notifications through `notify-send`.
    Desktop,
}

impl FromStr for NotifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "desktop" => Ok(Self::Desktop),
            other => Err(format!("unknown notifier: {other}")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`RoomwatchConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RoomwatchConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Upstream endpoint listing online rooms.
    pub rooms_url: String,

    /// Base URL of the join deep link.
    pub join_url_base: String,

    /// Time between the start of two polls.
    pub poll_interval: Duration,

    /// Notification gateway.
    pub notifier: NotifierKind,

    /// Icon attached to desktop notifications.
    pub notify_icon: Option<String>,

    /// Shell command run when a desktop notification is clicked.
    pub notify_focus_command: Option<String>,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Capacity of the engine command queue.
    pub command_channel_capacity: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for RoomwatchConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            rooms_url: DEFAULT_ROOMS_URL.to_string(),
            join_url_base: DEFAULT_JOIN_URL_BASE.to_string(),
            poll_interval: Duration::from_secs(10),
            notifier: NotifierKind::Log,
            notify_icon: None,
            notify_focus_command: None,
            event_bus_capacity: 1024,
            command_channel_capacity: 64,
            log_format: LogFormat::Text,
        }
    }
}

impl RoomwatchConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set or cannot be
    /// parsed. Calls `dotenvy::dotenv().ok()` to optionally load a `.env`
    /// file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`], or if `NOTIFIER` names an unknown gateway.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr: SocketAddr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let notifier = match std::env::var("NOTIFIER") {
            Ok(raw) => raw.parse::<NotifierKind>()?,
            Err(_) => defaults.notifier,
        };

        let poll_interval_secs: u64 = parse_env("POLL_INTERVAL_SECS", 10);

        Ok(Self {
            listen_addr,
            rooms_url: std::env::var("ROOMS_URL").unwrap_or(defaults.rooms_url),
            join_url_base: std::env::var("JOIN_URL_BASE").unwrap_or(defaults.join_url_base),
            poll_interval: Duration::from_secs(poll_interval_secs.max(1)),
            notifier,
            notify_icon: non_empty_env("NOTIFY_ICON"),
            notify_focus_command: non_empty_env("NOTIFY_FOCUS_COMMAND"),
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", defaults.event_bus_capacity),
            command_channel_capacity: parse_env(
                "COMMAND_CHANNEL_CAPACITY",
                defaults.command_channel_capacity,
            )
            .max(1),
            log_format: parse_env("LOG_FORMAT", defaults.log_format),
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Reads an environment variable, treating an empty value as unset.
fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_poll_every_ten_seconds() {
        let config = RoomwatchConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.notifier, NotifierKind::Log);
        assert_eq!(config.rooms_url, DEFAULT_ROOMS_URL);
    }

    #[test]
    fn notifier_kind_parses_case_insensitively() {
        assert_eq!("Desktop".parse::<NotifierKind>(), Ok(NotifierKind::Desktop));
        assert_eq!("log".parse::<NotifierKind>(), Ok(NotifierKind::Log));
        assert!("carrier-pigeon".parse::<NotifierKind>().is_err());
    }

    #[test]
    fn log_format_parses() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
