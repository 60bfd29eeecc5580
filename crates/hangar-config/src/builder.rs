//! Configuration builder

use crate::types::{Config, DaemonConfig, LogFormat, LoggingConfig, SupervisorSettings};
use hangar_core::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Builder for constructing configuration programmatically
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    daemon: DaemonConfig,
    supervisor: SupervisorSettings,
    logging: LoggingConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin root
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.daemon.roots.push(root.into());
        self
    }

    /// Set the dispatch platform
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.daemon.platform = platform.into();
        self
    }

    /// Set the periodic scan interval
    pub fn scan_interval(mut self, interval: Duration) -> Self {
        self.daemon.scan_interval = interval;
        self
    }

    /// Set the discovery channel capacity
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.daemon.channel_capacity = capacity;
        self
    }

    /// Enable or disable hot reload
    pub fn hot_reload(mut self, enabled: bool) -> Self {
        self.daemon.hot_reload = enabled;
        self
    }

    /// Set supervisor settings
    pub fn supervisor(mut self, supervisor: SupervisorSettings) -> Self {
        self.supervisor = supervisor;
        self
    }

    /// Set log level and format
    pub fn logging(mut self, level: impl Into<String>, format: LogFormat) -> Self {
        self.logging = LoggingConfig {
            level: level.into(),
            format,
        };
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        if self.daemon.roots.is_empty() {
            return Err(Error::Config("at least one plugin root is required".to_string()));
        }

        Ok(Config {
            daemon: self.daemon,
            supervisor: self.supervisor,
            logging: self.logging,
        })
    }
}
