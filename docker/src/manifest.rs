//! Manifest and fat-manifest parsing.
//!
//! A stored `manifest.json` (schema 2) names the image's config blob and
//! its ordered layers. A remote-cache mirror may instead hold a
//! `list.manifest.json` fat manifest referencing one manifest per
//! platform; [`FatManifest::platform_digest`] picks the one matching the
//! running image.

use serde::Deserialize;

use buildinfo_core::{Error, Result};

use crate::digest::Digest;

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(rename = "schemaVersion")]
    schema_version: u32,
    config: Option<RawDescriptor>,
    #[serde(default)]
    layers: Vec<RawDescriptor>,
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    digest: String,
}

/// A validated image manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    raw: String,
    config_digest: Digest,
    layer_digests: Vec<Digest>,
}

impl Manifest {
    /// Parse a schema-2 manifest. Schema-1 images carry no config digest
    /// and can never validate against an image id, so they are rejected.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let parsed: RawManifest = serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidManifest(e.to_string()))?;
        if parsed.schema_version == 1 {
            return Err(Error::InvalidManifest(
                "build info is not supported for docker V1 images".to_string(),
            ));
        }
        let config = parsed.config.ok_or_else(|| {
            Error::InvalidManifest("manifest has no config descriptor".to_string())
        })?;
        let config_digest = Digest::parse(&config.digest)?;
        let layer_digests = parsed
            .layers
            .iter()
            .map(|layer| Digest::parse(&layer.digest))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            raw,
            config_digest,
            layer_digests,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The embedded config digest — the canonical image identifier.
    pub fn config_digest(&self) -> &Digest {
        &self.config_digest
    }

    /// Layer digests in manifest order, base layer first. Duplicates are
    /// kept: empty layers may repeat a digest.
    pub fn layer_digests(&self) -> &[Digest] {
        &self.layer_digests
    }

    /// Every digest with a physical file behind it: the config blob
    /// first, then the layers. This is the list the layer search is
    /// built from, which is how the config/history blob ends up in the
    /// layer index.
    pub fn searchable_digests(&self) -> Vec<&Digest> {
        std::iter::once(&self.config_digest)
            .chain(self.layer_digests.iter())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawFatManifest {
    #[serde(default)]
    manifests: Vec<RawFatEntry>,
}

#[derive(Debug, Deserialize)]
struct RawFatEntry {
    digest: String,
    platform: Option<RawPlatform>,
}

#[derive(Debug, Deserialize)]
struct RawPlatform {
    os: String,
    architecture: String,
}

/// A multi-platform manifest list.
#[derive(Debug)]
pub struct FatManifest {
    entries: Vec<RawFatEntry>,
}

impl FatManifest {
    pub fn parse(raw: &str) -> Result<Self> {
        let parsed: RawFatManifest =
            serde_json::from_str(raw).map_err(|e| Error::InvalidManifest(e.to_string()))?;
        Ok(Self {
            entries: parsed.manifests,
        })
    }

    /// The digest of the manifest whose platform fields equal the given
    /// pair exactly. There is no fuzzy or closest match.
    pub fn platform_digest(&self, os: &str, architecture: &str) -> Result<&str> {
        self.entries
            .iter()
            .find(|entry| {
                entry
                    .platform
                    .as_ref()
                    .is_some_and(|p| p.os == os && p.architecture == architecture)
            })
            .map(|entry| entry.digest.as_str())
            .ok_or_else(|| Error::PlatformNotFound {
                os: os.to_string(),
                architecture: architecture.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "schemaVersion": 2,
        "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
        "config": {
            "mediaType": "application/vnd.docker.container.image.v1+json",
            "digest": "sha256:cfg",
            "size": 100
        },
        "layers": [
            { "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip", "digest": "sha256:l1", "size": 1 },
            { "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip", "digest": "sha256:l1", "size": 1 },
            { "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip", "digest": "sha256:l2", "size": 2 }
        ]
    }"#;

    const FAT_MANIFEST: &str = r#"{
        "schemaVersion": 2,
        "mediaType": "application/vnd.docker.distribution.manifest.list.v2+json",
        "manifests": [
            { "digest": "sha256:amd", "platform": { "os": "linux", "architecture": "amd64" } },
            { "digest": "sha256:arm", "platform": { "os": "linux", "architecture": "arm64" } }
        ]
    }"#;

    #[test]
    fn test_parse_manifest() {
        let m = Manifest::parse(MANIFEST).unwrap();
        assert_eq!(m.config_digest().to_string(), "sha256:cfg");
        let layers: Vec<String> = m.layer_digests().iter().map(|d| d.to_string()).collect();
        assert_eq!(layers, vec!["sha256:l1", "sha256:l1", "sha256:l2"]);
    }

    #[test]
    fn test_searchable_digests_put_config_first() {
        let m = Manifest::parse(MANIFEST).unwrap();
        let digests: Vec<String> = m
            .searchable_digests()
            .iter()
            .map(|d| d.to_string())
            .collect();
        assert_eq!(digests[0], "sha256:cfg");
        assert_eq!(digests.len(), 4);
    }

    #[test]
    fn test_parse_rejects_schema1() {
        let raw = r#"{ "schemaVersion": 1, "fsLayers": [] }"#;
        let result = Manifest::parse(raw);
        assert!(matches!(result, Err(Error::InvalidManifest(_))));
    }

    #[test]
    fn test_parse_rejects_missing_config() {
        let raw = r#"{ "schemaVersion": 2, "layers": [] }"#;
        assert!(Manifest::parse(raw).is_err());
    }

    #[test]
    fn test_fat_manifest_platform_match() {
        let fat = FatManifest::parse(FAT_MANIFEST).unwrap();
        assert_eq!(fat.platform_digest("linux", "arm64").unwrap(), "sha256:arm");
        assert_eq!(fat.platform_digest("linux", "amd64").unwrap(), "sha256:amd");
    }

    #[test]
    fn test_fat_manifest_platform_absent() {
        let fat = FatManifest::parse(FAT_MANIFEST).unwrap();
        let result = fat.platform_digest("windows", "amd64");
        assert!(matches!(
            result,
            Err(Error::PlatformNotFound { ref os, ref architecture })
                if os == "windows" && architecture == "amd64"
        ));
    }

    #[test]
    fn test_fat_manifest_entry_without_platform_is_skipped() {
        let raw = r#"{ "manifests": [ { "digest": "sha256:x" } ] }"#;
        let fat = FatManifest::parse(raw).unwrap();
        assert!(fat.platform_digest("linux", "amd64").is_err());
    }
}
