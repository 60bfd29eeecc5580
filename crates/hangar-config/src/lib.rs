//! # Hangar Configuration
//!
//! Daemon configuration read from YAML, TOML or JSON, with `${VAR}`
//! expansion, serde defaults and validation.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod builder;
pub mod loader;
pub mod types;
pub mod validator;

pub use builder::ConfigBuilder;
pub use loader::{load_config, load_from_file, load_from_str, ConfigFormat};
pub use types::{Config, DaemonConfig, LogFormat, LoggingConfig, SupervisorSettings};
pub use validator::validate_config;
