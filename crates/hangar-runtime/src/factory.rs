//! Platform-keyed runtime construction

use crate::backends::{LocalPluginRuntime, RemoteFunctionRuntime};
use crate::error::{Result, RuntimeError};
use crate::runtime::RuntimeHandle;
use hangar_core::{normalize_platform, Platform, PluginDescriptor};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Constructor wrapping a descriptor in a backend runtime
pub type RuntimeConstructor = Arc<dyn Fn(PluginDescriptor) -> RuntimeHandle + Send + Sync>;

/// Registration table from platform identifier to runtime constructor
///
/// Adding a backend means registering one more constructor; callers of
/// [`RuntimeFactory::create`] do not change.
#[derive(Clone, Default)]
pub struct RuntimeFactory {
    constructors: HashMap<String, RuntimeConstructor>,
}

impl RuntimeFactory {
    /// Create an empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory with the `local` and `remote-function` backends
    pub fn with_builtin() -> Self {
        let mut factory = Self::new();
        factory.register(Platform::Local.as_str(), |descriptor| {
            Arc::new(LocalPluginRuntime::new(descriptor)) as RuntimeHandle
        });
        factory.register(Platform::RemoteFunction.as_str(), |descriptor| {
            Arc::new(RemoteFunctionRuntime::new(descriptor)) as RuntimeHandle
        });
        factory
    }

    /// Register (or replace) the constructor for a platform
    pub fn register<F>(&mut self, platform: &str, constructor: F) -> &mut Self
    where
        F: Fn(PluginDescriptor) -> RuntimeHandle + Send + Sync + 'static,
    {
        self.constructors
            .insert(normalize_platform(platform), Arc::new(constructor));
        self
    }

    /// Whether a platform has a registered backend
    pub fn supports(&self, platform: &str) -> bool {
        self.constructors.contains_key(&normalize_platform(platform))
    }

    /// Registered platform identifiers, sorted
    pub fn platforms(&self) -> Vec<String> {
        let mut platforms: Vec<String> = self.constructors.keys().cloned().collect();
        platforms.sort();
        platforms
    }

    /// Wrap a descriptor in the runtime for `platform`
    pub fn create(&self, platform: &str, descriptor: PluginDescriptor) -> Result<RuntimeHandle> {
        let constructor = self
            .constructors
            .get(&normalize_platform(platform))
            .ok_or_else(|| RuntimeError::unsupported_platform(platform, descriptor.name()))?;

        Ok(constructor(descriptor))
    }
}

impl fmt::Debug for RuntimeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeFactory")
            .field("platforms", &self.platforms())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::PluginRuntime;
    use hangar_core::PluginConfiguration;

    fn descriptor(name: &str) -> PluginDescriptor {
        PluginDescriptor::new(PluginConfiguration::new(name, "1.0"), format!("/plugins/{name}"))
    }

    #[test]
    fn test_builtin_platforms() {
        let factory = RuntimeFactory::with_builtin();
        assert_eq!(factory.platforms(), vec!["local", "remote-function"]);

        let local = factory.create("local", descriptor("a")).unwrap();
        assert_eq!(local.platform(), "local");
        assert_eq!(local.name(), "a");
        assert_eq!(local.version(), "1.0");

        let remote = factory.create("Remote-Function", descriptor("b")).unwrap();
        assert_eq!(remote.platform(), "remote-function");
    }

    #[test]
    fn test_unknown_platform() {
        let factory = RuntimeFactory::with_builtin();
        let result = factory.create("mainframe", descriptor("a"));

        match result {
            Err(RuntimeError::UnsupportedPlatform { platform, plugin }) => {
                assert_eq!(platform, "mainframe");
                assert_eq!(plugin, "a");
            }
            other => panic!("expected unsupported platform, got {other:?}"),
        }
    }

    #[test]
    fn test_register_custom_backend() {
        let mut factory = RuntimeFactory::new();
        assert!(!factory.supports("local"));

        factory.register("edge", |descriptor| {
            Arc::new(RemoteFunctionRuntime::new(descriptor)) as RuntimeHandle
        });

        assert!(factory.supports("EDGE"));
        assert!(factory.create("edge", descriptor("a")).is_ok());
        assert!(factory.create("local", descriptor("a")).is_err());
    }
}
