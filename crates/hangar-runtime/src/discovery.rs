//! Concurrent discovery of new plugins under a root directory

use crate::registry::RuntimeRegistry;
use crate::status::{verify_status, PluginStatus};
use hangar_core::{load_manifest, Error, PluginDescriptor, MANIFEST_FILE};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, warn, Instrument};

/// Default capacity of the discovery handoff channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Scans a plugin root for plugins that are not registered yet
///
/// Every immediate subdirectory holding a parseable `manifest.json` whose
/// name is absent from the registry becomes one [`PluginDescriptor`].
#[derive(Clone, Debug)]
pub struct DiscoveryScanner {
    registry: RuntimeRegistry,
    capacity: usize,
}

impl DiscoveryScanner {
    /// Create a scanner checking candidates against `registry`
    pub fn new(registry: RuntimeRegistry) -> Self {
        Self {
            registry,
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the handoff channel capacity (at least 1)
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Start scanning `root`
    ///
    /// Enumeration runs on its own task and blocks while the channel is full.
    /// The channel closes once the whole root has been enumerated, or right
    /// away if the root cannot be listed. Each call re-reads the filesystem.
    /// Must be called from within a Tokio runtime.
    pub fn scan(&self, root: impl Into<PathBuf>) -> mpsc::Receiver<PluginDescriptor> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let registry = self.registry.clone();
        let root = root.into();

        tokio::spawn(produce(root, registry, tx).in_current_span());

        rx
    }
}

async fn produce(root: PathBuf, registry: RuntimeRegistry, tx: mpsc::Sender<PluginDescriptor>) {
    // plugin directories are handed to backends that chdir into them
    let listing = match tokio::fs::canonicalize(&root).await {
        Ok(root) => tokio::fs::read_dir(root).await,
        Err(e) => Err(e),
    };

    let mut entries = match listing {
        Ok(entries) => entries,
        Err(e) => {
            let err = Error::discovery(&root, e);
            error!(path = %root.display(), error = %err, "No plugin found in path");
            return;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                let err = Error::discovery(&root, e);
                error!(path = %root.display(), error = %err, "Plugin root listing interrupted");
                break;
            }
        };

        match entry.file_type().await {
            Ok(file_type) if file_type.is_dir() => {}
            Ok(_) => continue,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Failed to stat plugin entry");
                continue;
            }
        }

        if let Some(descriptor) = inspect(&registry, entry.path()).await {
            if tx.send(descriptor).await.is_err() {
                debug!(path = %root.display(), "Discovery consumer gone, stopping scan");
                return;
            }
        }
    }

    debug!(path = %root.display(), "Plugin root scan complete");
}

async fn inspect(registry: &RuntimeRegistry, dir: PathBuf) -> Option<PluginDescriptor> {
    debug!(path = %dir.display(), "Found plugin path");

    let manifest_path = dir.join(MANIFEST_FILE);
    let config = match load_manifest(&manifest_path).await {
        Ok(config) => config,
        Err(e) => {
            log_manifest_error(&manifest_path, &e);
            return None;
        }
    };

    match verify_status(registry, &config.name) {
        PluginStatus::Absent => Some(PluginDescriptor::new(config, dir)),
        PluginStatus::PresentAlive => {
            debug!(plugin = %config.name, "Plugin already running, skipping");
            None
        }
        PluginStatus::PresentDead => {
            warn!(plugin = %config.name, "Plugin is registered but not alive, skipping");
            None
        }
    }
}

fn log_manifest_error(path: &Path, err: &Error) {
    match err {
        Error::Parse { .. } => {
            error!(path = %path.display(), error = %err, "Failed to parse plugin manifest")
        }
        _ => error!(path = %path.display(), error = %err, "Failed to read plugin manifest"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::RemoteFunctionRuntime;
    use crate::runtime::{PluginRuntime, RuntimeHandle};
    use hangar_core::PluginConfiguration;
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn write_plugin(root: &Path, dir: &str, manifest: &str) {
        let path = root.join(dir);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join(MANIFEST_FILE), manifest).unwrap();
    }

    async fn collect(mut rx: mpsc::Receiver<PluginDescriptor>) -> Vec<PluginDescriptor> {
        let mut out = Vec::new();
        while let Some(descriptor) = rx.recv().await {
            out.push(descriptor);
        }
        out.sort_by(|a, b| a.config.name.cmp(&b.config.name));
        out
    }

    fn registered(registry: &RuntimeRegistry, name: &str, active: bool) {
        let handle: RuntimeHandle = Arc::new(RemoteFunctionRuntime::new(PluginDescriptor::new(
            PluginConfiguration::new(name, "0.1"),
            format!("/elsewhere/{name}"),
        )));
        if active {
            handle.core().update(|state| state.mark_active());
        }
        registry.store(name, handle);
    }

    #[tokio::test]
    async fn test_scan_yields_new_plugins() {
        let root = tempfile::tempdir().unwrap();
        write_plugin(root.path(), "pluginA", r#"{"name":"A","version":"1.0"}"#);
        write_plugin(root.path(), "pluginB", r#"{"name":"B","version":"2.0"}"#);

        let scanner = DiscoveryScanner::new(RuntimeRegistry::new());
        let found = collect(scanner.scan(root.path())).await;

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name(), "A");
        let canonical = std::fs::canonicalize(root.path()).unwrap();
        assert_eq!(found[0].path(), canonical.join("pluginA"));
        assert_eq!(found[1].version(), "2.0");
        assert!(found.iter().all(|d| d.state.restarts == 0 && !d.state.active));
    }

    #[tokio::test]
    async fn test_relative_root_yields_absolute_paths() {
        let root = tempfile::tempdir_in(".").unwrap();
        assert!(root.path().is_relative());
        write_plugin(root.path(), "pluginA", r#"{"name":"A","version":"1.0"}"#);

        let found = collect(DiscoveryScanner::new(RuntimeRegistry::new()).scan(root.path())).await;

        assert_eq!(found.len(), 1);
        assert!(found[0].path().is_absolute());
        assert!(found[0].path().join(MANIFEST_FILE).is_file());
    }

    #[tokio::test]
    async fn test_scan_skips_registered_plugins() {
        let root = tempfile::tempdir().unwrap();
        write_plugin(root.path(), "alive", r#"{"name":"alive","version":"1.0"}"#);
        write_plugin(root.path(), "dead", r#"{"name":"dead","version":"1.0"}"#);
        write_plugin(root.path(), "fresh", r#"{"name":"fresh","version":"1.0"}"#);

        let registry = RuntimeRegistry::new();
        registered(&registry, "alive", true);
        registered(&registry, "dead", false);

        let found = collect(DiscoveryScanner::new(registry).scan(root.path())).await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "fresh");
    }

    #[tokio::test]
    #[traced_test]
    async fn test_alive_skip_does_not_warn() {
        let root = tempfile::tempdir().unwrap();
        write_plugin(root.path(), "alive", r#"{"name":"alive","version":"1.0"}"#);

        let registry = RuntimeRegistry::new();
        registered(&registry, "alive", true);

        assert!(collect(DiscoveryScanner::new(registry).scan(root.path())).await.is_empty());
        assert!(logs_contain("Plugin already running, skipping"));
        logs_assert(|lines: &[&str]| {
            match lines.iter().find(|l| l.contains(" WARN ") || l.contains(" ERROR ")) {
                Some(line) => Err(format!("unexpected warning: {line}")),
                None => Ok(()),
            }
        });
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dead_skip_warns() {
        let root = tempfile::tempdir().unwrap();
        write_plugin(root.path(), "dead", r#"{"name":"dead","version":"1.0"}"#);

        let registry = RuntimeRegistry::new();
        registered(&registry, "dead", false);

        assert!(collect(DiscoveryScanner::new(registry).scan(root.path())).await.is_empty());
        logs_assert(|lines: &[&str]| {
            let warned = lines
                .iter()
                .any(|l| l.contains(" WARN ") && l.contains("Plugin is registered but not alive"));
            if warned {
                Ok(())
            } else {
                Err("expected a warning for the dead entry".to_string())
            }
        });
    }

    #[tokio::test]
    async fn test_scan_isolates_bad_entries() {
        let root = tempfile::tempdir().unwrap();
        write_plugin(root.path(), "good", r#"{"name":"good","version":"1.0"}"#);
        write_plugin(root.path(), "malformed", "{ nope");
        std::fs::create_dir(root.path().join("no-manifest")).unwrap();
        std::fs::write(root.path().join("stray-file.json"), "{}").unwrap();

        let found = collect(DiscoveryScanner::new(RuntimeRegistry::new()).scan(root.path())).await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "good");
    }

    #[tokio::test]
    async fn test_scan_missing_root_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("does-not-exist");

        let found = collect(DiscoveryScanner::new(RuntimeRegistry::new()).scan(missing)).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_scan_applies_backpressure() {
        let root = tempfile::tempdir().unwrap();
        for i in 0..5 {
            let name = format!("p{i}");
            write_plugin(
                root.path(),
                &name,
                &format!(r#"{{"name":"{name}","version":"1.0"}}"#),
            );
        }

        let scanner = DiscoveryScanner::new(RuntimeRegistry::new()).with_capacity(0);
        let mut rx = scanner.scan(root.path());

        // capacity is clamped to one, so the producer is parked on the second send
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(rx.len(), 1);

        let mut total = 0;
        while rx.recv().await.is_some() {
            total += 1;
        }
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_rescan_reenumerates() {
        let root = tempfile::tempdir().unwrap();
        let scanner = DiscoveryScanner::new(RuntimeRegistry::new());

        assert!(collect(scanner.scan(root.path())).await.is_empty());

        write_plugin(root.path(), "late", r#"{"name":"late","version":"1.0"}"#);
        let found = collect(scanner.scan(root.path())).await;
        assert_eq!(found.len(), 1);
    }
}
