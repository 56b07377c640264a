//! Buildinfo Core - Foundational Types
//!
//! This crate provides the error type and small value types shared across
//! the buildinfo workspace.

pub mod error;
pub mod version;

// Re-export commonly used types
pub use error::{Error, Result};
pub use version::ServerVersion;

/// Buildinfo version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
