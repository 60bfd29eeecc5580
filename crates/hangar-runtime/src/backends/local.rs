//! Local child-process backend

use crate::error::{Result, RuntimeError};
use crate::runtime::{HealthStatus, PluginRuntime, RuntimeCore};
use async_trait::async_trait;
use hangar_core::{Platform, PluginDescriptor};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Runs a plugin's entrypoint as a child process
///
/// The entrypoint is resolved against the plugin directory, which is also the
/// working directory of the child.
#[derive(Debug)]
pub struct LocalPluginRuntime {
    core: RuntimeCore,
    child: Mutex<Option<Child>>,
}

impl LocalPluginRuntime {
    /// Wrap a discovered plugin
    pub fn new(descriptor: PluginDescriptor) -> Self {
        Self {
            core: RuntimeCore::new(descriptor),
            child: Mutex::new(None),
        }
    }

    /// OS process id of the running child
    pub async fn pid(&self) -> Option<u32> {
        self.child.lock().await.as_ref().and_then(Child::id)
    }

    fn command(&self) -> Result<Command> {
        let config = self.core.config();
        let entrypoint = config
            .entrypoint
            .as_deref()
            .ok_or_else(|| RuntimeError::start(&config.name, "manifest declares no entrypoint"))?;

        let dir = absolute(self.core.path())
            .map_err(|e| RuntimeError::start(&config.name, e))?;
        let mut command = Command::new(dir.join(entrypoint));
        command
            .args(&config.args)
            .current_dir(&dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        Ok(command)
    }
}

/// Anchor a relative plugin directory at the daemon's working directory
fn absolute(dir: PathBuf) -> std::io::Result<PathBuf> {
    if dir.is_absolute() {
        Ok(dir)
    } else {
        Ok(std::env::current_dir()?.join(dir))
    }
}

#[async_trait]
impl PluginRuntime for LocalPluginRuntime {
    fn core(&self) -> &RuntimeCore {
        &self.core
    }

    fn platform(&self) -> &str {
        Platform::Local.as_str()
    }

    async fn start(&self) -> Result<()> {
        let mut guard = self.child.lock().await;

        if let Some(child) = guard.as_mut() {
            if matches!(child.try_wait(), Ok(None)) {
                return Err(RuntimeError::invalid_state(format!(
                    "Plugin {} is already running",
                    self.name()
                )));
            }
        }

        let child = self
            .command()?
            .spawn()
            .map_err(|e| RuntimeError::start(self.name(), e))?;

        info!(plugin = %self.name(), pid = ?child.id(), "Plugin process spawned");
        *guard = Some(child);

        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };

        if matches!(child.try_wait(), Ok(Some(_))) {
            debug!(plugin = %self.name(), "Plugin process already exited");
            return Ok(());
        }

        child
            .kill()
            .await
            .map_err(|e| RuntimeError::stop(self.name(), e))?;

        info!(plugin = %self.name(), "Plugin process stopped");
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        let mut guard = self.child.lock().await;

        let status = match guard.as_mut() {
            None => HealthStatus::Unhealthy("process not running".to_string()),
            Some(child) => match child.try_wait() {
                Ok(None) => HealthStatus::Healthy,
                Ok(Some(exit)) => HealthStatus::Unhealthy(format!("process exited: {}", exit)),
                Err(e) => HealthStatus::Unhealthy(e.to_string()),
            },
        };

        Ok(status)
    }
}
