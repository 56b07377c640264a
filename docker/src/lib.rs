//! Docker build-info resolution against an artifact repository.
//!
//! A Docker image pushed to (or pulled through) an artifact repository
//! leaves behind a manifest and a set of layer files, but the storage
//! path of the manifest is ambiguous from the outside: it differs between
//! reverse-proxy and proxy-less registry setups, the `library` namespace
//! may or may not have been inserted, and a remote-cache mirror may hold
//! a multi-platform fat manifest instead of the manifest itself.
//!
//! This crate locates the stored manifest by trying an ordered list of
//! path candidates, validates each candidate against the expected image
//! id, finds the physical layer files with a single search query, and
//! classifies the layers into dependencies and artifacts to produce a
//! build-info module.
//!
//! The repository itself is reached through the [`RepositoryClient`]
//! trait; this crate performs no HTTP on its own.

pub mod client;
pub mod digest;
pub mod history;
pub mod layers;
pub mod locator;
pub mod manifest;
pub mod module;
pub mod query;
pub mod reference;
pub mod resolver;

// Re-export common types
pub use client::{Content, RepositoryClient, SearchEntry};
pub use digest::{Digest, DigestAlgorithm};
pub use layers::{LayerIndex, LayerRecord};
pub use locator::{LocatedManifest, ManifestLocator};
pub use manifest::{FatManifest, Manifest};
pub use module::{Artifact, Dependency, Module};
pub use reference::{ImageReference, Operation};
pub use resolver::ModuleResolver;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
