//! # Hangar Core
//!
//! Core types and error handling for the Hangar plugin daemon.
//!
//! This crate provides the data model shared by every other crate:
//! - Plugin configuration parsed from `manifest.json`
//! - Mutable runtime state and the descriptor pairing both
//! - Backend platform identifiers
//! - Manifest loading
//! - Error types

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
pub mod manifest;
pub mod types;

pub use error::{Error, Result};
pub use manifest::{load_manifest, parse_manifest, MANIFEST_FILE};
pub use types::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::manifest::{load_manifest, MANIFEST_FILE};
    pub use crate::types::*;
}
