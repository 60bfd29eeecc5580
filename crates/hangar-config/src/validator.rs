//! Configuration validation

use crate::Config;
use hangar_core::{Error, Platform, Result};
use std::str::FromStr;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_daemon(config)?;
    validate_supervisor(config)?;
    validate_logging(config)?;

    Ok(())
}

fn validate_daemon(config: &Config) -> Result<()> {
    let daemon = &config.daemon;

    if daemon.roots.is_empty() {
        return Err(Error::Config("daemon.roots cannot be empty".to_string()));
    }

    if daemon.roots.iter().any(|root| root.as_os_str().is_empty()) {
        return Err(Error::Config("plugin root path cannot be empty".to_string()));
    }

    if daemon.channel_capacity == 0 {
        return Err(Error::Config("channel_capacity must be > 0".to_string()));
    }

    if daemon.scan_interval.is_zero() {
        return Err(Error::Config("scan_interval must be > 0".to_string()));
    }

    // unknown platforms only drop plugins at dispatch time
    if Platform::from_str(&daemon.platform).is_err() {
        tracing::warn!(
            platform = %daemon.platform,
            "Platform has no built-in backend, plugins will be dropped"
        );
    }

    Ok(())
}

fn validate_supervisor(config: &Config) -> Result<()> {
    if config.supervisor.health_check_interval.is_zero() {
        return Err(Error::Config(
            "health_check_interval must be > 0".to_string(),
        ));
    }

    if config.supervisor.max_restarts > 100 {
        tracing::warn!("max_restarts is very high (>100)");
    }

    Ok(())
}

fn validate_logging(config: &Config) -> Result<()> {
    match config.logging.level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        other => Err(Error::Config(format!("Invalid log level: {other}"))),
    }
}
