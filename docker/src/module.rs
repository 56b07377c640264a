//! Build-info module assembly.
//!
//! A located manifest plus its layer index classify into two ordered,
//! digest-deduplicated lists: dependencies (base-image layers that
//! already existed) and artifacts (layers the build produced). The split
//! point is the dependency-layer count read from the image's config
//! blob. A pull reports dependencies only; nothing new was produced.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use buildinfo_core::{Error, Result};

use crate::client::RepositoryClient;
use crate::digest::Digest;
use crate::history::dependency_layer_count;
use crate::layers::LayerRecord;
use crate::locator::LocatedManifest;
use crate::reference::{ImageReference, Operation};

/// Module property holding the image id's hex value.
const PROP_IMAGE_ID: &str = "docker.image.id";

/// Module property holding the captured tag string.
const PROP_CAPTURED_IMAGE: &str = "docker.captured.image";

/// A base-image layer the build depended on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    pub sha1: String,
}

/// A layer the build produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub sha1: String,
}

/// The produced build-info module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl Module {
    /// An empty module shell for an image: id and properties set, no
    /// dependencies or artifacts yet.
    pub fn for_image(image: &ImageReference) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(PROP_IMAGE_ID.to_string(), image.content_id().hex().to_string());
        properties.insert(PROP_CAPTURED_IMAGE.to_string(), image.tag().to_string());
        Self {
            id: image.module_id(),
            properties,
            dependencies: Vec::new(),
            artifacts: Vec::new(),
        }
    }
}

/// Fills a module from a located manifest and its layer index.
pub struct ModuleAssembler<'a, C: RepositoryClient + ?Sized> {
    client: &'a C,
    image: &'a ImageReference,
}

impl<'a, C: RepositoryClient + ?Sized> ModuleAssembler<'a, C> {
    pub fn new(client: &'a C, image: &'a ImageReference) -> Self {
        Self { client, image }
    }

    /// Classify the manifest's layers into the module's dependency and
    /// artifact lists.
    pub async fn assemble(
        &self,
        located: &LocatedManifest,
        operation: Operation,
    ) -> Result<Module> {
        let mut module = Module::for_image(self.image);
        match operation {
            Operation::Push => self.fill_dependencies_and_artifacts(&mut module, located).await?,
            Operation::Pull => self.fill_dependencies(&mut module, located),
        }
        Ok(module)
    }

    /// Push: the first N distinct layer digests are both dependencies
    /// and artifacts (a pushed image re-deploys its base layers), the
    /// rest are artifacts only.
    async fn fill_dependencies_and_artifacts(
        &self,
        module: &mut Module,
        located: &LocatedManifest,
    ) -> Result<()> {
        let history = located.layers.get(self.image.content_id()).ok_or_else(|| {
            Error::HistoryLayerMissing {
                digest: self.image.content_id().to_string(),
                image: self.image.tag().to_string(),
            }
        })?;
        let config = self
            .client
            .download(&format!("{}/{}", self.client.base_url(), history.full_path()))
            .await?;
        let dependency_layers = dependency_layer_count(&config.body)?;
        tracing::debug!(
            count = dependency_layers,
            image = %self.image.tag(),
            "Read dependency-layer count from the image config"
        );

        let mut seen: HashSet<&Digest> = HashSet::new();
        let mut distinct = 0;
        for digest in located.manifest.layer_digests() {
            if !seen.insert(digest) {
                continue;
            }
            if distinct < dependency_layers {
                let record = located.layers.get(digest).ok_or_else(|| Error::LayerNotFound {
                    digest: digest.to_string(),
                })?;
                module.dependencies.push(dependency_of(record));
                module.artifacts.push(artifact_of(record));
            } else if let Some(record) = located.layers.get(digest) {
                // Trailing layers without a physical file (empty layers)
                // are skipped.
                module.artifacts.push(artifact_of(record));
            }
            distinct += 1;
        }
        Ok(())
    }

    /// Pull: every distinct layer digest, in manifest order, is a
    /// dependency; no artifacts.
    fn fill_dependencies(&self, module: &mut Module, located: &LocatedManifest) {
        let mut seen: HashSet<&Digest> = HashSet::new();
        for digest in located.manifest.layer_digests() {
            if !seen.insert(digest) {
                continue;
            }
            if let Some(record) = located.layers.get(digest) {
                module.dependencies.push(dependency_of(record));
            }
        }
    }
}

fn dependency_of(record: &LayerRecord) -> Dependency {
    Dependency {
        id: record.file_name().to_string(),
        sha1: record.sha1().to_string(),
    }
}

fn artifact_of(record: &LayerRecord) -> Artifact {
    Artifact {
        name: record.file_name().to_string(),
        sha1: record.sha1().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Digest;

    #[test]
    fn test_module_shell_carries_properties() {
        let image = ImageReference::new(
            Digest::parse("sha256:abc123").unwrap(),
            "my-registry/acme/app:1.0",
            "docker-local",
            "linux",
            "amd64",
        )
        .unwrap();
        let module = Module::for_image(&image);
        assert_eq!(module.id, "acme/app:1.0");
        assert_eq!(module.properties.get(PROP_IMAGE_ID).unwrap(), "abc123");
        assert_eq!(
            module.properties.get(PROP_CAPTURED_IMAGE).unwrap(),
            "my-registry/acme/app:1.0"
        );
        assert!(module.dependencies.is_empty());
        assert!(module.artifacts.is_empty());
    }

    #[test]
    fn test_module_serialization_shape() {
        let module = Module {
            id: "acme/app:1.0".to_string(),
            properties: BTreeMap::new(),
            dependencies: vec![Dependency {
                id: "sha256__abc".to_string(),
                sha1: "11aa".to_string(),
            }],
            artifacts: Vec::new(),
        };
        let json = serde_json::to_string(&module).unwrap();
        assert!(json.contains("\"id\":\"acme/app:1.0\""));
        assert!(json.contains("\"sha1\":\"11aa\""));
    }
}
