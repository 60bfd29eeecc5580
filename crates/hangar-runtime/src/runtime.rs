//! Runtime trait implemented by every backend

use crate::error::Result;
use async_trait::async_trait;
use hangar_core::{PluginConfiguration, PluginDescriptor, PluginRuntimeState};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared handle to a live runtime, as stored in the registry
pub type RuntimeHandle = Arc<dyn PluginRuntime>;

/// Backend-agnostic part of a runtime: immutable configuration plus
/// lifecycle state written by the backend and the supervisor
#[derive(Debug)]
pub struct RuntimeCore {
    config: PluginConfiguration,
    state: RwLock<PluginRuntimeState>,
}

impl RuntimeCore {
    /// Take ownership of a discovered plugin
    pub fn new(descriptor: PluginDescriptor) -> Self {
        Self {
            config: descriptor.config,
            state: RwLock::new(descriptor.state),
        }
    }

    /// Plugin configuration
    pub fn config(&self) -> &PluginConfiguration {
        &self.config
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PluginRuntimeState {
        self.state.read().clone()
    }

    /// Plugin directory
    pub fn path(&self) -> PathBuf {
        self.state.read().relative_path.clone()
    }

    /// Mutate the state under the write lock
    pub fn update<R>(&self, f: impl FnOnce(&mut PluginRuntimeState) -> R) -> R {
        f(&mut self.state.write())
    }
}

/// A plugin wrapped for one execution backend
///
/// Backends own all platform-specific process or network management and
/// report back through the [`RuntimeCore`] state.
#[async_trait]
pub trait PluginRuntime: Send + Sync + fmt::Debug {
    /// Shared configuration and state
    fn core(&self) -> &RuntimeCore;

    /// Platform identifier of this backend
    fn platform(&self) -> &str;

    /// Start the plugin
    async fn start(&self) -> Result<()>;

    /// Stop the plugin
    async fn stop(&self) -> Result<()>;

    /// Health check
    async fn health_check(&self) -> Result<HealthStatus> {
        Ok(HealthStatus::Healthy)
    }

    /// Plugin configuration
    fn configuration(&self) -> &PluginConfiguration {
        self.core().config()
    }

    /// Plugin name
    fn name(&self) -> &str {
        &self.core().config().name
    }

    /// Plugin version
    fn version(&self) -> &str {
        &self.core().config().version
    }

    /// Snapshot of the runtime state
    fn state(&self) -> PluginRuntimeState {
        self.core().state()
    }

    /// Whether the runtime reports itself active
    fn is_active(&self) -> bool {
        self.core().state.read().active
    }
}

/// Runtime health status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message")]
pub enum HealthStatus {
    /// Runtime is healthy and operating normally
    Healthy,

    /// Runtime is degraded but still functioning
    Degraded(String),

    /// Runtime is not functioning
    Unhealthy(String),
}

impl HealthStatus {
    /// Check if the runtime is healthy
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Check if the runtime is unhealthy
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy(_))
    }

    /// Get the health message if any
    pub fn message(&self) -> Option<&str> {
        match self {
            HealthStatus::Healthy => None,
            HealthStatus::Degraded(msg) | HealthStatus::Unhealthy(msg) => Some(msg),
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded(msg) => write!(f, "degraded: {}", msg),
            HealthStatus::Unhealthy(msg) => write!(f, "unhealthy: {}", msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_update() {
        let core = RuntimeCore::new(PluginDescriptor::new(
            PluginConfiguration::new("a", "1.0"),
            "/plugins/a",
        ));

        assert!(!core.state().active);
        core.update(|state| state.mark_active());
        assert!(core.state().active);
        assert_eq!(core.path(), PathBuf::from("/plugins/a"));
    }

    #[test]
    fn test_health_status() {
        let healthy = HealthStatus::Healthy;
        assert!(healthy.is_healthy());
        assert_eq!(healthy.message(), None);
        assert_eq!(healthy.to_string(), "healthy");

        let unhealthy = HealthStatus::Unhealthy("exited".to_string());
        assert!(unhealthy.is_unhealthy());
        assert_eq!(unhealthy.message(), Some("exited"));
        assert_eq!(unhealthy.to_string(), "unhealthy: exited");
    }
}
