//! Image references and tag-path derivation.
//!
//! The captured image tag (e.g. `my-registry:8081/acme/app:1.0`) is the
//! only hint to where the repository stored the manifest, and it reads
//! differently between reverse-proxy and proxy-less registry setups. The
//! helpers here derive the tag path, the module id, and the image
//! namespace from the tag; the locator builds its path candidates on top
//! of these.

use buildinfo_core::{Error, Result};

use crate::digest::Digest;

/// Tag applied when the captured tag string carries none.
const DEFAULT_TAG: &str = "latest";

/// The registry operation that produced the image being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// The image was pushed; newly produced layers are reported as artifacts.
    Push,
    /// The image was pulled or otherwise read; dependencies only.
    Pull,
}

/// One image resolution target. Immutable; created once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Expected config digest — the canonical image identifier.
    content_id: Digest,
    /// The captured image tag string, registry host included.
    tag: String,
    /// The repository the image was pushed to or pulled through.
    target_repo: String,
    /// Operating system of the running image, for fat-manifest matching.
    os: String,
    /// CPU architecture of the running image, for fat-manifest matching.
    architecture: String,
}

impl ImageReference {
    pub fn new(
        content_id: Digest,
        tag: impl Into<String>,
        target_repo: impl Into<String>,
        os: impl Into<String>,
        architecture: impl Into<String>,
    ) -> Result<Self> {
        let tag = tag.into();
        if !tag.contains('/') {
            return Err(Error::InvalidReference(format!(
                "image tag '{}' has no registry host segment",
                tag
            )));
        }
        Ok(Self {
            content_id,
            tag,
            target_repo: target_repo.into(),
            os: os.into(),
            architecture: architecture.into(),
        })
    }

    pub fn content_id(&self) -> &Digest {
        &self.content_id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn target_repo(&self) -> &str {
        &self.target_repo
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    /// The tag path: everything after the registry host, with the tag as
    /// the last path segment (`acme/app/1.0`). A tag-less reference gets
    /// `latest`.
    pub fn image_path(&self) -> String {
        format!("{}/{}", self.image_name(), self.tag_name())
    }

    /// The tag path without its first segment — the layout used when the
    /// repository sits behind no reverse proxy, where the first segment
    /// repeats the repository key.
    pub fn proxy_less_image_path(&self) -> String {
        let path = self.image_path();
        match path.split_once('/') {
            Some((_, rest)) => rest.to_string(),
            None => path,
        }
    }

    /// The module id: the tag with the leading registry host stripped
    /// (`acme/app:1.0`).
    pub fn module_id(&self) -> String {
        match self.tag.split_once('/') {
            Some((_, rest)) => rest.to_string(),
            None => self.tag.clone(),
        }
    }

    /// The image namespace: the name part of the tag path without the
    /// trailing tag segment (`acme/app`). Used when asking the
    /// repository to materialize a marker layer.
    pub fn image_namespace(&self) -> String {
        self.image_name()
    }

    /// Image name after the registry host, before the tag.
    fn image_name(&self) -> String {
        let after_host = match self.tag.split_once('/') {
            Some((_, rest)) => rest,
            None => self.tag.as_str(),
        };
        match after_host.rsplit_once(':') {
            Some((name, _)) => name.to_string(),
            None => after_host.to_string(),
        }
    }

    /// Tag segment of the captured tag, `latest` when absent.
    fn tag_name(&self) -> String {
        let after_host = match self.tag.split_once('/') {
            Some((_, rest)) => rest,
            None => self.tag.as_str(),
        };
        match after_host.rsplit_once(':') {
            Some((_, tag)) => tag.to_string(),
            None => DEFAULT_TAG.to_string(),
        }
    }
}
