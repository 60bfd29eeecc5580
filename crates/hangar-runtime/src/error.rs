//! Plugin runtime error types

use std::fmt;

/// Plugin runtime error type
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// No backend is registered for the platform identifier
    #[error("Unsupported platform '{platform}' for plugin {plugin}")]
    UnsupportedPlatform {
        /// Requested platform identifier
        platform: String,
        /// Plugin that was being dispatched
        plugin: String,
    },

    /// Backend failed to start the plugin
    #[error("Failed to start plugin {plugin}: {reason}")]
    Start {
        /// Plugin name
        plugin: String,
        /// Failure description
        reason: String,
    },

    /// Backend failed to stop the plugin
    #[error("Failed to stop plugin {plugin}: {reason}")]
    Stop {
        /// Plugin name
        plugin: String,
        /// Failure description
        reason: String,
    },

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Result type for plugin runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

impl RuntimeError {
    /// Create a new unsupported platform error
    pub fn unsupported_platform(platform: impl fmt::Display, plugin: impl fmt::Display) -> Self {
        Self::UnsupportedPlatform {
            platform: platform.to_string(),
            plugin: plugin.to_string(),
        }
    }

    /// Create a new start error
    pub fn start(plugin: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::Start {
            plugin: plugin.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a new stop error
    pub fn stop(plugin: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::Stop {
            plugin: plugin.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a new invalid state error
    pub fn invalid_state(msg: impl fmt::Display) -> Self {
        Self::InvalidState(msg.to_string())
    }

    /// Create a new other error
    pub fn other(msg: impl fmt::Display) -> Self {
        Self::Other(msg.to_string())
    }
}
