//! Error types for Hangar

use std::path::PathBuf;

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for Hangar
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Manifest could not be read
    #[error("Failed to read manifest {}: {source}", .path.display())]
    Read {
        /// Manifest path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Manifest is not a well-formed plugin configuration
    #[error("Failed to parse manifest {}: {source}", .path.display())]
    Parse {
        /// Manifest path
        path: PathBuf,
        /// Underlying decode error
        source: serde_json::Error,
    },

    /// Plugin root could not be listed
    #[error("Failed to list plugin root {}: {source}", .path.display())]
    Discovery {
        /// Root path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Platform identifier is not known
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a read error for a manifest path
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error for a manifest path
    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Parse {
            path: path.into(),
            source,
        }
    }

    /// Create a discovery error for a root path
    pub fn discovery(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Discovery {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_path() {
        let err = Error::read(
            "/plugins/a/manifest.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/plugins/a/manifest.json"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn test_discovery_error_names_root() {
        let err = Error::discovery(
            "/srv/plugins",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, Error::Discovery { .. }));
        assert_eq!(err.to_string(), "Failed to list plugin root /srv/plugins: denied");
    }
}
