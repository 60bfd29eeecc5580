//! Registry of live plugin runtimes

use crate::runtime::{PluginRuntime, RuntimeHandle};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Registry of live plugin runtimes
///
/// The single source of truth for what is currently running, keyed by plugin
/// name. Cloning is cheap and clones share the same map, so one registry can
/// be handed to any number of scanners and watchers.
#[derive(Clone, Debug, Default)]
pub struct RuntimeRegistry {
    runtimes: Arc<DashMap<String, RuntimeHandle>>,
}

impl RuntimeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the runtime for `name`
    ///
    /// Returns the runtime that was replaced, if any.
    pub fn store(&self, name: impl Into<String>, handle: RuntimeHandle) -> Option<RuntimeHandle> {
        let name = name.into();
        let previous = self.runtimes.insert(name.clone(), handle);

        if previous.is_some() {
            warn!(plugin = %name, "Registry entry overwritten");
        } else {
            debug!(plugin = %name, "Registry entry stored");
        }

        previous
    }

    /// Insert the runtime only if `name` is not registered yet
    ///
    /// The check and the insert happen under the same shard lock. Returns
    /// `false` and leaves the registry unchanged when the name is taken.
    pub fn store_if_absent(&self, name: impl Into<String>, handle: RuntimeHandle) -> bool {
        match self.runtimes.entry(name.into()) {
            Entry::Occupied(entry) => {
                debug!(plugin = %entry.key(), "Registry entry already present");
                false
            }
            Entry::Vacant(entry) => {
                debug!(plugin = %entry.key(), "Registry entry stored");
                entry.insert(handle);
                true
            }
        }
    }

    /// Current runtime for `name`
    pub fn lookup(&self, name: &str) -> Option<RuntimeHandle> {
        self.runtimes.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.runtimes.contains_key(name)
    }

    /// Remove the runtime for `name`
    pub fn remove(&self, name: &str) -> Option<RuntimeHandle> {
        self.runtimes.remove(name).map(|(_, handle)| handle)
    }

    /// Registered plugin names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.runtimes.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// All registered runtimes
    pub fn snapshot(&self) -> Vec<RuntimeHandle> {
        self.runtimes.iter().map(|e| Arc::clone(e.value())).collect()
    }

    /// Number of registered runtimes
    pub fn len(&self) -> usize {
        self.runtimes.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.runtimes.is_empty()
    }

    /// Stop every registered runtime
    ///
    /// Entries stay registered; failures are logged and do not stop the sweep.
    pub async fn stop_all(&self) {
        info!(count = self.len(), "Stopping all plugin runtimes");

        for handle in self.snapshot() {
            if let Err(e) = handle.stop().await {
                warn!(plugin = %handle.name(), error = %e, "Failed to stop plugin");
            }
            handle.core().update(|state| state.mark_dead());
        }
    }
}
