//! Managed serverless function backend

use crate::error::Result;
use crate::runtime::{HealthStatus, PluginRuntime, RuntimeCore};
use async_trait::async_trait;
use hangar_core::{Platform, PluginDescriptor};
use parking_lot::RwLock;
use tracing::info;

/// Binds a plugin to a remotely managed function
///
/// The function reference comes from the manifest's `function` field and
/// falls back to the plugin name. Invocation itself is owned by the remote
/// platform; this runtime only tracks the binding.
#[derive(Debug)]
pub struct RemoteFunctionRuntime {
    core: RuntimeCore,
    binding: RwLock<Option<String>>,
}

impl RemoteFunctionRuntime {
    /// Wrap a discovered plugin
    pub fn new(descriptor: PluginDescriptor) -> Self {
        Self {
            core: RuntimeCore::new(descriptor),
            binding: RwLock::new(None),
        }
    }

    /// Currently bound function reference
    pub fn function_ref(&self) -> Option<String> {
        self.binding.read().clone()
    }
}

#[async_trait]
impl PluginRuntime for RemoteFunctionRuntime {
    fn core(&self) -> &RuntimeCore {
        &self.core
    }

    fn platform(&self) -> &str {
        Platform::RemoteFunction.as_str()
    }

    async fn start(&self) -> Result<()> {
        let config = self.core.config();
        let reference = config.function.clone().unwrap_or_else(|| config.name.clone());

        info!(plugin = %config.name, function = %reference, "Remote function bound");
        *self.binding.write() = Some(reference);

        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if let Some(reference) = self.binding.write().take() {
            info!(plugin = %self.name(), function = %reference, "Remote function unbound");
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        Ok(match self.binding.read().as_ref() {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Unhealthy("function not bound".to_string()),
        })
    }
}
