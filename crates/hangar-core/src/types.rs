//! Plugin data model shared across Hangar

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Plugin configuration declared by a manifest
///
/// Parsed once by the manifest loader and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfiguration {
    /// Plugin name (identity key in the registry)
    #[serde(deserialize_with = "non_empty")]
    pub name: String,

    /// Plugin version
    #[serde(deserialize_with = "non_empty")]
    pub version: String,

    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Plugin author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Executable path relative to the plugin directory (local backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,

    /// Arguments passed to the entrypoint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Function reference (remote-function backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    /// Any other declared fields, kept verbatim
    #[serde(flatten)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

fn non_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    if value.trim().is_empty() {
        return Err(serde::de::Error::custom("value must not be empty"));
    }
    Ok(value)
}

impl PluginConfiguration {
    /// Create a configuration with only a name and version
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            author: None,
            entrypoint: None,
            args: Vec::new(),
            function: None,
            metadata: BTreeMap::new(),
        }
    }
}

/// Mutable lifecycle record of one plugin instance
///
/// `active` implies `dead_at` is `None`; `dead_at` is only ever set after
/// `active_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRuntimeState {
    /// Number of restarts performed by the supervisor
    pub restarts: u32,

    /// Whether the runtime started successfully and is still up
    pub active: bool,

    /// Plugin directory (or backend resource path)
    pub relative_path: PathBuf,

    /// When the runtime last became active
    pub active_at: Option<DateTime<Utc>>,

    /// When the runtime last died
    pub dead_at: Option<DateTime<Utc>>,

    /// Whether external verification succeeded
    pub verified: bool,
}

impl PluginRuntimeState {
    /// Initial state for a freshly discovered plugin
    pub fn new(relative_path: impl Into<PathBuf>) -> Self {
        Self {
            restarts: 0,
            active: false,
            relative_path: relative_path.into(),
            active_at: None,
            dead_at: None,
            verified: false,
        }
    }

    /// Mark the runtime as started
    pub fn mark_active(&mut self) {
        self.active = true;
        self.active_at = Some(Utc::now());
        self.dead_at = None;
    }

    /// Mark the runtime as dead
    ///
    /// `dead_at` is only recorded if the runtime was active at some point.
    pub fn mark_dead(&mut self) {
        self.active = false;
        if self.active_at.is_some() {
            self.dead_at = Some(Utc::now());
        }
    }

    /// Count one restart
    pub fn record_restart(&mut self) {
        self.restarts = self.restarts.saturating_add(1);
    }

    /// Mark external verification as successful
    pub fn mark_verified(&mut self) {
        self.verified = true;
    }

    /// Whether the runtime has died after having been active
    pub fn is_dead(&self) -> bool {
        !self.active && self.dead_at.is_some()
    }
}

/// A newly discovered plugin: configuration plus fresh state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Parsed manifest
    pub config: PluginConfiguration,

    /// Runtime state, at initial values when discovered
    pub state: PluginRuntimeState,
}

impl PluginDescriptor {
    /// Pair a configuration with initial state for the given plugin directory
    pub fn new(config: PluginConfiguration, path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            state: PluginRuntimeState::new(path),
        }
    }

    /// Plugin name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Plugin version
    pub fn version(&self) -> &str {
        &self.config.version
    }

    /// Plugin directory
    pub fn path(&self) -> &Path {
        &self.state.relative_path
    }
}

/// Built-in backend platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    /// Local child process
    Local,
    /// Managed serverless function
    RemoteFunction,
}

impl Platform {
    /// All built-in platforms
    pub const ALL: [Platform; 2] = [Platform::Local, Platform::RemoteFunction];

    /// Platform identifier as used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Local => "local",
            Platform::RemoteFunction => "remote-function",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_platform(s).as_str() {
            "local" => Ok(Platform::Local),
            "remote-function" => Ok(Platform::RemoteFunction),
            _ => Err(Error::UnsupportedPlatform(s.to_string())),
        }
    }
}

/// Canonical form of a platform identifier (trimmed, lowercase)
pub fn normalize_platform(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}
