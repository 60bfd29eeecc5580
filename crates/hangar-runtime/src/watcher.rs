//! Watch passes: discovery, dispatch, registration and handoff

use crate::discovery::DiscoveryScanner;
use crate::factory::RuntimeFactory;
use crate::registry::RuntimeRegistry;
use crate::runtime::PluginRuntime;
use crate::shutdown::ShutdownSignal;
use crate::supervisor::LifecycleSupervisor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// How a watch pass stores a freshly built runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorePolicy {
    /// Store only if the name is still unregistered; a runtime that lost the
    /// race is dropped and never supervised
    #[default]
    IfAbsent,

    /// Always store, replacing whatever a concurrent pass registered
    Overwrite,
}

/// Outcome of one watch pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchReport {
    /// Plugins stored and handed to the supervisor, in discovery order
    pub loaded: Vec<String>,

    /// Plugins dropped because no backend matches the platform
    pub unsupported: Vec<String>,

    /// Plugins dropped because another pass registered them first
    pub raced: Vec<String>,
}

impl WatchReport {
    /// Whether the pass changed nothing
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.unsupported.is_empty() && self.raced.is_empty()
    }
}

/// Drives discovery into the registry for one root and platform at a time
///
/// Per pass: every new plugin found by the [`DiscoveryScanner`] is wrapped by
/// the [`RuntimeFactory`], stored in the [`RuntimeRegistry`] and handed to
/// the [`LifecycleSupervisor`]. Failures only ever drop the affected plugin.
#[derive(Debug, Clone)]
pub struct Watcher {
    registry: RuntimeRegistry,
    factory: Arc<RuntimeFactory>,
    supervisor: Arc<dyn LifecycleSupervisor>,
    scanner: DiscoveryScanner,
    store_policy: StorePolicy,
}

impl Watcher {
    /// Create a watcher
    pub fn new(
        registry: RuntimeRegistry,
        factory: Arc<RuntimeFactory>,
        supervisor: Arc<dyn LifecycleSupervisor>,
    ) -> Self {
        Self {
            scanner: DiscoveryScanner::new(registry.clone()),
            registry,
            factory,
            supervisor,
            store_policy: StorePolicy::default(),
        }
    }

    /// Set the discovery channel capacity
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.scanner = self.scanner.with_capacity(capacity);
        self
    }

    /// Set the store policy
    pub fn with_store_policy(mut self, policy: StorePolicy) -> Self {
        self.store_policy = policy;
        self
    }

    /// Registry this watcher writes to
    pub fn registry(&self) -> &RuntimeRegistry {
        &self.registry
    }

    /// Run one pass over `root`, dispatching new plugins to `platform`
    pub async fn watch(&self, root: impl AsRef<Path>, platform: &str) -> WatchReport {
        let root = root.as_ref();
        let mut report = WatchReport::default();
        let mut discovered = self.scanner.scan(root);

        while let Some(descriptor) = discovered.recv().await {
            let name = descriptor.name().to_string();

            let handle = match self.factory.create(platform, descriptor) {
                Ok(handle) => handle,
                Err(e) => {
                    error!(plugin = %name, platform, error = %e, "Unsupported platform");
                    report.unsupported.push(name);
                    continue;
                }
            };

            let stored = match self.store_policy {
                StorePolicy::IfAbsent => self.registry.store_if_absent(&name, handle.clone()),
                StorePolicy::Overwrite => {
                    self.registry.store(&name, handle.clone());
                    true
                }
            };

            if !stored {
                warn!(plugin = %name, "Plugin registered by a concurrent pass, dropping");
                report.raced.push(name);
                continue;
            }

            info!(
                plugin = %name,
                version = %handle.version(),
                platform = handle.platform(),
                "Loaded plugin"
            );

            self.supervisor.supervise(handle);
            report.loaded.push(name);
        }

        info!(
            root = %root.display(),
            loaded = report.loaded.len(),
            "Watch pass complete"
        );

        report
    }

    /// Repeat [`Watcher::watch`] every `interval` until `shutdown` fires
    ///
    /// The first pass runs immediately.
    pub async fn run_periodic(
        &self,
        root: PathBuf,
        platform: String,
        interval: Duration,
        shutdown: ShutdownSignal,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(root = %root.display(), platform = %platform, ?interval, "Watching plugin root");

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = ticker.tick() => {
                    self.watch(&root, &platform).await;
                }
            }
        }

        info!(root = %root.display(), "Stopped watching plugin root");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RuntimeHandle;
    use crate::supervisor::DetachedSupervisor;
    use hangar_core::MANIFEST_FILE;
    use parking_lot::Mutex;

    #[derive(Debug, Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl LifecycleSupervisor for Recorder {
        fn supervise(&self, handle: RuntimeHandle) {
            self.seen.lock().push(handle.name().to_string());
        }
    }

    fn write_plugin(root: &Path, dir: &str, name: &str) {
        let path = root.join(dir);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(
            path.join(MANIFEST_FILE),
            format!(r#"{{"name":"{name}","version":"1.0"}}"#),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_watch_loads_and_hands_off() {
        let root = tempfile::tempdir().unwrap();
        write_plugin(root.path(), "one", "one");
        write_plugin(root.path(), "two", "two");

        let recorder = Arc::new(Recorder::default());
        let watcher = Watcher::new(
            RuntimeRegistry::new(),
            Arc::new(RuntimeFactory::with_builtin()),
            recorder.clone(),
        );

        let mut report = watcher.watch(root.path(), "remote-function").await;
        report.loaded.sort();

        assert_eq!(report.loaded, vec!["one", "two"]);
        assert_eq!(watcher.registry().names(), vec!["one", "two"]);

        let mut seen = recorder.seen.lock().clone();
        seen.sort();
        assert_eq!(seen, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_unsupported_platform_is_dropped() {
        let root = tempfile::tempdir().unwrap();
        write_plugin(root.path(), "one", "one");

        let watcher = Watcher::new(
            RuntimeRegistry::new(),
            Arc::new(RuntimeFactory::with_builtin()),
            Arc::new(DetachedSupervisor),
        );

        let report = watcher.watch(root.path(), "mainframe").await;

        assert!(report.loaded.is_empty());
        assert_eq!(report.unsupported, vec!["one"]);
        assert!(watcher.registry().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_names_in_one_root() {
        let root = tempfile::tempdir().unwrap();
        write_plugin(root.path(), "copy-a", "same");
        write_plugin(root.path(), "copy-b", "same");

        let recorder = Arc::new(Recorder::default());
        let watcher = Watcher::new(
            RuntimeRegistry::new(),
            Arc::new(RuntimeFactory::with_builtin()),
            recorder.clone(),
        );

        let report = watcher.watch(root.path(), "local").await;

        // the second copy is classified while the first is stored but not yet
        // active, or it loses the store race; either way only one is loaded
        assert_eq!(report.loaded, vec!["same"]);
        assert_eq!(watcher.registry().len(), 1);
        assert_eq!(recorder.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_run_periodic_stops_on_shutdown() {
        let root = tempfile::tempdir().unwrap();
        let watcher = Watcher::new(
            RuntimeRegistry::new(),
            Arc::new(RuntimeFactory::with_builtin()),
            Arc::new(DetachedSupervisor),
        );
        let shutdown = ShutdownSignal::new();

        let task = {
            let watcher = watcher.clone();
            let shutdown = shutdown.clone();
            let root = root.path().to_path_buf();
            tokio::spawn(async move {
                watcher
                    .run_periodic(root, "local".to_string(), Duration::from_millis(50), shutdown)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        write_plugin(root.path(), "late", "late");

        for _ in 0..100 {
            if watcher.registry().contains("late") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(watcher.registry().contains("late"));

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }
}
