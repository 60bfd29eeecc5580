//! Lifecycle supervision of registered runtimes

use crate::runtime::{HealthStatus, PluginRuntime, RuntimeHandle};
use crate::shutdown::ShutdownSignal;
use std::fmt;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn, Instrument};

/// Takes over a runtime once it is registered
///
/// Handoff is fire-and-forget: `supervise` must return without waiting for
/// the runtime to become active.
pub trait LifecycleSupervisor: Send + Sync + fmt::Debug {
    /// Begin managing `handle`
    fn supervise(&self, handle: RuntimeHandle);
}

/// Supervisor that accepts runtimes without starting them
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedSupervisor;

impl LifecycleSupervisor for DetachedSupervisor {
    fn supervise(&self, handle: RuntimeHandle) {
        debug!(plugin = %handle.name(), "Runtime registered without supervision");
    }
}

/// Restart policy of [`RestartingSupervisor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Restarts allowed before giving up on a runtime
    pub max_restarts: u32,

    /// Delay between a death and the next start attempt
    pub restart_backoff: Duration,

    /// Interval between health checks of an active runtime
    pub health_check_interval: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_restarts: 3,
            restart_backoff: Duration::from_secs(1),
            health_check_interval: Duration::from_secs(5),
        }
    }
}

/// Starts each runtime, polls its health and restarts it when it dies
///
/// Each supervised runtime gets its own task. The task marks the runtime
/// active after a successful start and dead when the start fails or a health
/// check reports it unhealthy. Up to `max_restarts` restarts are attempted.
/// On shutdown the runtime is stopped and the task exits.
#[derive(Debug, Clone)]
pub struct RestartingSupervisor {
    config: SupervisorConfig,
    shutdown: ShutdownSignal,
}

impl RestartingSupervisor {
    /// Create a supervisor stopping its runtimes when `shutdown` fires
    pub fn new(config: SupervisorConfig, shutdown: ShutdownSignal) -> Self {
        Self { config, shutdown }
    }

    /// Restart policy
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }
}

impl LifecycleSupervisor for RestartingSupervisor {
    fn supervise(&self, handle: RuntimeHandle) {
        let config = self.config.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(run_lifecycle(handle, config, shutdown).in_current_span());
    }
}

async fn run_lifecycle(handle: RuntimeHandle, config: SupervisorConfig, shutdown: ShutdownSignal) {
    loop {
        let reason = tokio::select! {
            _ = shutdown.wait() => {
                stop_runtime(&handle).await;
                return;
            }
            reason = run_until_dead(&handle, &config) => reason,
        };

        handle.core().update(|state| state.mark_dead());
        // release whatever the dead instance still holds
        if let Err(e) = handle.stop().await {
            warn!(plugin = %handle.name(), error = %e, "Failed to stop plugin");
        }

        let restarts = handle.state().restarts;
        if restarts >= config.max_restarts {
            error!(
                plugin = %handle.name(),
                restarts,
                reason = %reason,
                "Plugin exceeded restart limit, giving up"
            );
            return;
        }

        handle.core().update(|state| state.record_restart());
        warn!(
            plugin = %handle.name(),
            attempt = restarts + 1,
            reason = %reason,
            "Plugin died, restarting"
        );

        tokio::select! {
            _ = shutdown.wait() => {
                stop_runtime(&handle).await;
                return;
            }
            _ = tokio::time::sleep(config.restart_backoff) => {}
        }
    }
}

/// Start the runtime and watch it until it dies; returns why it died
async fn run_until_dead(handle: &RuntimeHandle, config: &SupervisorConfig) -> String {
    if let Err(e) = handle.start().await {
        error!(plugin = %handle.name(), error = %e, "Failed to start plugin");
        return e.to_string();
    }

    handle.core().update(|state| state.mark_active());
    info!(plugin = %handle.name(), platform = handle.platform(), "Plugin active");

    let mut ticker = tokio::time::interval(config.health_check_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        match handle.health_check().await {
            Ok(HealthStatus::Healthy) => {}
            Ok(HealthStatus::Degraded(msg)) => {
                warn!(plugin = %handle.name(), reason = %msg, "Plugin degraded");
            }
            Ok(HealthStatus::Unhealthy(msg)) => return msg,
            Err(e) => return e.to_string(),
        }
    }
}

async fn stop_runtime(handle: &RuntimeHandle) {
    if let Err(e) = handle.stop().await {
        warn!(plugin = %handle.name(), error = %e, "Failed to stop plugin");
    }
    handle.core().update(|state| state.mark_dead());
    info!(plugin = %handle.name(), "Plugin supervision stopped");
}
