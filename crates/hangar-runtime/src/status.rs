//! Classification of discovered plugins against the registry

use crate::registry::RuntimeRegistry;
use crate::runtime::PluginRuntime;
use std::fmt;

/// Registry status of a plugin name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginStatus {
    /// Not registered, the plugin is new
    Absent,
    /// Registered and reporting itself active
    PresentAlive,
    /// Registered but not active
    PresentDead,
}

impl PluginStatus {
    /// Whether a candidate with this status should be loaded
    pub fn is_new(&self) -> bool {
        matches!(self, PluginStatus::Absent)
    }
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginStatus::Absent => write!(f, "absent"),
            PluginStatus::PresentAlive => write!(f, "alive"),
            PluginStatus::PresentDead => write!(f, "dead"),
        }
    }
}

/// Classify `name` against the current registry contents
///
/// This is a point-in-time read: the entry may change right after it returns.
pub fn verify_status(registry: &RuntimeRegistry, name: &str) -> PluginStatus {
    match registry.lookup(name) {
        None => PluginStatus::Absent,
        Some(handle) if handle.is_active() => PluginStatus::PresentAlive,
        Some(_) => PluginStatus::PresentDead,
    }
}
