//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Discovery and dispatch
    pub daemon: DaemonConfig,

    /// Runtime supervision
    #[serde(default)]
    pub supervisor: SupervisorSettings,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Discovery and dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonConfig {
    /// Backend platform every discovered plugin is dispatched to
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Plugin roots to scan
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Interval between periodic watch passes
    #[serde(default = "default_scan_interval", with = "humantime_serde")]
    pub scan_interval: Duration,

    /// Discovery channel capacity
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Also run a pass when a root changes on disk
    #[serde(default)]
    pub hot_reload: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            roots: Vec::new(),
            scan_interval: default_scan_interval(),
            channel_capacity: default_channel_capacity(),
            hot_reload: false,
        }
    }
}

/// Restart policy of supervised runtimes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupervisorSettings {
    /// Restarts allowed before giving up on a runtime
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,

    /// Delay before restarting a dead runtime
    #[serde(default = "default_restart_backoff", with = "humantime_serde")]
    pub restart_backoff: Duration,

    /// Interval between health checks
    #[serde(default = "default_health_check_interval", with = "humantime_serde")]
    pub health_check_interval: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            max_restarts: default_max_restarts(),
            restart_backoff: default_restart_backoff(),
            health_check_interval: default_health_check_interval(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

fn default_platform() -> String {
    "local".to_string()
}

fn default_scan_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_channel_capacity() -> usize {
    1
}

fn default_max_restarts() -> u32 {
    3
}

fn default_restart_backoff() -> Duration {
    Duration::from_secs(1)
}

fn default_health_check_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: Config = serde_json::from_str(r#"{"daemon":{"roots":["/srv/plugins"]}}"#).unwrap();

        assert_eq!(config.daemon.platform, "local");
        assert_eq!(config.daemon.scan_interval, Duration::from_secs(30));
        assert_eq!(config.daemon.channel_capacity, 1);
        assert!(!config.daemon.hot_reload);
        assert_eq!(config.supervisor, SupervisorSettings::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let result: Result<LoggingConfig, _> = serde_json::from_str(r#"{"format":"xml"}"#);
        assert!(result.is_err());
    }
}
