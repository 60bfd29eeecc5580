//! Manifest loading

use crate::error::{Error, Result};
use crate::types::PluginConfiguration;
use std::path::Path;

/// Manifest file name inside each plugin directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Read and parse a plugin manifest
///
/// Fails with [`Error::Read`] when the file cannot be read and with
/// [`Error::Parse`] when its contents are not a plugin configuration.
pub async fn load_manifest(path: impl AsRef<Path>) -> Result<PluginConfiguration> {
    let path = path.as_ref();

    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::read(path, e))?;

    parse_manifest(&text, path)
}

/// Parse manifest text; `path` is only used for error reporting
pub fn parse_manifest(text: &str, path: impl AsRef<Path>) -> Result<PluginConfiguration> {
    serde_json::from_str(text).map_err(|e| Error::parse(path.as_ref(), e))
}
