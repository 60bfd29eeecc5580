//! # Hangar Runtime
//!
//! Discovery, dispatch and supervision of plugin runtimes.
//!
//! ## Features
//!
//! - **Discovery**: scan a plugin root concurrently, yielding only new plugins
//! - **Runtime Factory**: platform-keyed construction of backend runtimes
//! - **Registry**: concurrent map of every live runtime, keyed by plugin name
//! - **Supervision**: start, health-check and restart runtimes after handoff
//! - **Hot Reload**: re-scan a root when its contents change
//!
//! ## Example
//!
//! ```rust,no_run
//! use hangar_runtime::*;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let registry = RuntimeRegistry::new();
//! let shutdown = ShutdownSignal::new();
//! let supervisor = RestartingSupervisor::new(SupervisorConfig::default(), shutdown.clone());
//!
//! let watcher = Watcher::new(
//!     registry.clone(),
//!     Arc::new(RuntimeFactory::with_builtin()),
//!     Arc::new(supervisor),
//! );
//!
//! let report = watcher.watch("/var/lib/hangar/plugins", "local").await;
//! println!("loaded {} plugins", report.loaded.len());
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod backends;
pub mod discovery;
pub mod error;
pub mod factory;
pub mod hot_reload;
pub mod registry;
pub mod runtime;
pub mod shutdown;
pub mod status;
pub mod supervisor;
pub mod watcher;

pub use backends::{LocalPluginRuntime, RemoteFunctionRuntime};
pub use discovery::{DiscoveryScanner, DEFAULT_CHANNEL_CAPACITY};
pub use error::{Result, RuntimeError};
pub use factory::{RuntimeConstructor, RuntimeFactory};
pub use hot_reload::HotReloadWatcher;
pub use registry::RuntimeRegistry;
pub use runtime::{HealthStatus, PluginRuntime, RuntimeCore, RuntimeHandle};
pub use shutdown::{ShutdownSignal, SignalHandler};
pub use status::{verify_status, PluginStatus};
pub use supervisor::{DetachedSupervisor, LifecycleSupervisor, RestartingSupervisor, SupervisorConfig};
pub use watcher::{StorePolicy, WatchReport, Watcher};

// Re-export core types for convenience
pub use hangar_core::{Platform, PluginConfiguration, PluginDescriptor, PluginRuntimeState};

/// Prelude module with commonly used types
pub mod prelude {
    pub use crate::error::{Result, RuntimeError};
    pub use crate::factory::RuntimeFactory;
    pub use crate::registry::RuntimeRegistry;
    pub use crate::runtime::{HealthStatus, PluginRuntime, RuntimeHandle};
    pub use crate::supervisor::{LifecycleSupervisor, RestartingSupervisor};
    pub use crate::watcher::Watcher;
    pub use hangar_core::prelude::*;
}
