//! Hot reload: re-scan plugin roots when their contents change

use crate::error::{Result, RuntimeError};
use crate::watcher::Watcher;
use hangar_core::MANIFEST_FILE;
use notify::event::CreateKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Instrument};

/// Triggers a watch pass when a plugin root changes
///
/// A pass runs when a directory is created under a root or when a
/// `manifest.json` is created or modified. Bursts of events are coalesced by
/// waiting `debounce` after the first one.
#[derive(Debug)]
pub struct HotReloadWatcher {
    /// Watcher running the passes
    watcher: Watcher,

    /// Plugin roots to observe
    roots: Vec<PathBuf>,

    /// Platform passed to every pass
    platform: String,

    /// File watcher
    fs_watcher: Option<RecommendedWatcher>,

    /// Event receiver
    rx: Option<mpsc::UnboundedReceiver<notify::Result<Event>>>,

    /// Debounce duration
    debounce: Duration,
}

impl HotReloadWatcher {
    /// Create a hot reload watcher
    pub fn new(watcher: Watcher, roots: Vec<PathBuf>, platform: impl Into<String>) -> Self {
        Self {
            watcher,
            roots,
            platform: platform.into(),
            fs_watcher: None,
            rx: None,
            debounce: Duration::from_millis(500),
        }
    }

    /// Set debounce duration
    pub fn with_debounce(mut self, duration: Duration) -> Self {
        self.debounce = duration;
        self
    }

    /// Start receiving filesystem events for every root
    pub fn start(&mut self) -> Result<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.rx = Some(rx);

        let mut fs_watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )
        .map_err(|e| RuntimeError::other(format!("Failed to create file watcher: {}", e)))?;

        for root in &self.roots {
            fs_watcher
                .watch(root, RecursiveMode::Recursive)
                .map_err(|e| {
                    RuntimeError::other(format!(
                        "Failed to watch directory {}: {}",
                        root.display(),
                        e
                    ))
                })?;
        }

        self.fs_watcher = Some(fs_watcher);

        info!(roots = self.roots.len(), "Hot reload watcher started");

        Ok(())
    }

    /// Stop watching; the event loop ends once pending events are drained
    pub fn stop(&mut self) {
        self.fs_watcher = None;
        self.rx = None;
        info!("Hot reload watcher stopped");
    }

    /// Spawn the event loop
    ///
    /// Requires a prior call to [`HotReloadWatcher::start`].
    pub fn run(&mut self) -> Result<()> {
        let mut rx = self
            .rx
            .take()
            .ok_or_else(|| RuntimeError::invalid_state("Hot reload watcher not started"))?;

        let watcher = self.watcher.clone();
        let roots = self.roots.clone();
        let platform = self.platform.clone();
        let debounce = self.debounce;

        tokio::spawn(
            async move {
                while let Some(res) = rx.recv().await {
                    let mut paths = match res {
                        Ok(event) if should_process(&event) => event.paths,
                        Ok(_) => continue,
                        Err(e) => {
                            warn!(error = %e, "File watcher error");
                            continue;
                        }
                    };

                    tokio::time::sleep(debounce).await;
                    while let Ok(res) = rx.try_recv() {
                        if let Ok(event) = res {
                            if should_process(&event) {
                                paths.extend(event.paths);
                            }
                        }
                    }

                    for root in affected_roots(&roots, &paths) {
                        debug!(root = %root.display(), "Plugin root changed");
                        watcher.watch(root, &platform).await;
                    }
                }

                debug!("Hot reload event loop finished");
            }
            .in_current_span(),
        );

        Ok(())
    }
}

/// Whether an event can reveal a new plugin
fn should_process(event: &Event) -> bool {
    match event.kind {
        EventKind::Create(CreateKind::Folder) => true,
        EventKind::Create(_) | EventKind::Modify(_) => event
            .paths
            .iter()
            .any(|path| path.file_name().is_some_and(|name| name == MANIFEST_FILE)),
        _ => false,
    }
}

/// Roots containing any of `paths`; all roots if none match
fn affected_roots<'a>(roots: &'a [PathBuf], paths: &[PathBuf]) -> Vec<&'a Path> {
    let matched: Vec<&Path> = roots
        .iter()
        .filter(|root| paths.iter().any(|path| path.starts_with(root)))
        .map(PathBuf::as_path)
        .collect();

    if matched.is_empty() {
        roots.iter().map(PathBuf::as_path).collect()
    } else {
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::RuntimeFactory;
    use crate::registry::RuntimeRegistry;
    use crate::supervisor::DetachedSupervisor;
    use notify::event::{DataChange, ModifyKind};
    use std::sync::Arc;

    fn watcher() -> Watcher {
        Watcher::new(
            RuntimeRegistry::new(),
            Arc::new(RuntimeFactory::with_builtin()),
            Arc::new(DetachedSupervisor),
        )
    }

    #[test]
    fn test_should_process_event() {
        let event = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/plugins/a/manifest.json"));
        assert!(should_process(&event));

        let event = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/plugins/a/payload.bin"));
        assert!(!should_process(&event));

        let event = Event::new(EventKind::Create(CreateKind::Folder))
            .add_path(PathBuf::from("/plugins/b"));
        assert!(should_process(&event));

        let event = Event::new(EventKind::Remove(notify::event::RemoveKind::Any))
            .add_path(PathBuf::from("/plugins/a/manifest.json"));
        assert!(!should_process(&event));
    }

    #[test]
    fn test_affected_roots() {
        let roots = vec![PathBuf::from("/srv/one"), PathBuf::from("/srv/two")];

        let hit = affected_roots(&roots, &[PathBuf::from("/srv/two/p/manifest.json")]);
        assert_eq!(hit, vec![Path::new("/srv/two")]);

        let miss = affected_roots(&roots, &[PathBuf::from("/elsewhere/manifest.json")]);
        assert_eq!(miss.len(), 2);
    }

    #[test]
    fn test_run_requires_start() {
        let mut hot = HotReloadWatcher::new(watcher(), vec![], "local");
        assert!(matches!(hot.run(), Err(RuntimeError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_new_plugin_triggers_pass() {
        let root = tempfile::tempdir().unwrap();
        let watcher = watcher();
        let mut hot = HotReloadWatcher::new(watcher.clone(), vec![root.path().to_path_buf()], "local")
            .with_debounce(Duration::from_millis(50));

        hot.start().unwrap();
        hot.run().unwrap();

        let dir = root.path().join("fresh");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join(MANIFEST_FILE), r#"{"name":"fresh","version":"1.0"}"#).unwrap();

        for _ in 0..200 {
            if watcher.registry().contains("fresh") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }

        assert!(watcher.registry().contains("fresh"));
        hot.stop();
    }
}
