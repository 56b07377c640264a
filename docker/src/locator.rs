//! Manifest location.
//!
//! The storage path of a stored manifest cannot be derived from the
//! captured tag alone: reverse-proxy and proxy-less registry setups map
//! the same tag to different paths, and the `library` namespace may have
//! been inserted on either. The locator tries an ordered list of path
//! candidates, validating each fetched manifest against the expected
//! image id, and stops at the first match. A candidate that yields a
//! present-but-different manifest falls through to the next candidate
//! exactly like a failed fetch.
//!
//! On a remote-cache mirror a failed manifest fetch gets one fallback:
//! the fat manifest at the same path, resolved by the image's platform
//! to a digest-qualified sibling path.
//!
//! A located manifest is only accepted once its layer index is built;
//! a located-but-unindexable manifest fails the resolution.

use buildinfo_core::{Error, Result};

use crate::client::RepositoryClient;
use crate::digest::Digest;
use crate::layers::LayerIndex;
use crate::manifest::{FatManifest, Manifest};
use crate::query::LayerQueryBuilder;
use crate::reference::{ImageReference, Operation};

/// Candidate paths never nest deeper than this many separators; beyond
/// it the `library` fallbacks cannot apply.
const MAX_PATH_SEPARATORS: usize = 3;

/// Suffix of the search repository when the target is a remote mirror.
const REMOTE_CACHE_SUFFIX: &str = "-cache";

/// A successfully located and indexed manifest.
#[derive(Debug)]
pub struct LocatedManifest {
    pub manifest: Manifest,
    /// The repository-relative path the manifest was found under.
    pub path: String,
    pub layers: LayerIndex,
}

/// Outcome of one path candidate.
enum CandidateOutcome {
    /// Manifest fetched and its config digest equals the image id.
    Matched(Manifest),
    /// Manifest fetched but belongs to a different image; fall through.
    Mismatch,
    /// The candidate could not produce a manifest at all.
    Failed(Error),
}

/// Locates the stored manifest for one image and builds its layer index.
pub struct ManifestLocator<'a, C: RepositoryClient + ?Sized> {
    client: &'a C,
    image: &'a ImageReference,
    operation: Operation,
}

impl<'a, C: RepositoryClient + ?Sized> ManifestLocator<'a, C> {
    pub fn new(client: &'a C, image: &'a ImageReference, operation: Operation) -> Self {
        Self {
            client,
            image,
            operation,
        }
    }

    /// Try the path candidates in order and return the first validated
    /// manifest together with its layer index.
    ///
    /// # Errors
    ///
    /// [`Error::ManifestNotFound`] when every applicable candidate
    /// failed, carrying the last candidate's underlying error; any other
    /// variant is a fatal, non-recoverable resolution failure.
    pub async fn locate(&self) -> Result<LocatedManifest> {
        let is_remote = self
            .client
            .is_remote_repository(self.image.target_repo())
            .await?;
        let candidates = self.candidate_paths();
        let mut last_error: Option<Error> = None;

        for (position, path) in candidates.iter().enumerate() {
            tracing::info!(
                candidate = position + 1,
                path = %path,
                "Trying to fetch manifest from the repository"
            );
            match self.try_candidate(path, is_remote).await? {
                CandidateOutcome::Matched(manifest) => {
                    tracing::info!(path = %path, "Manifest matches the expected image id");
                    let layers = self.load_layers(&manifest, path, is_remote).await?;
                    return Ok(LocatedManifest {
                        manifest,
                        path: path.clone(),
                        layers,
                    });
                }
                CandidateOutcome::Mismatch => {
                    tracing::info!(
                        path = %path,
                        "Found a manifest belonging to a different image, trying the next path"
                    );
                }
                CandidateOutcome::Failed(error) => {
                    tracing::error!(path = %path, error = %error, "The manifest could not be fetched");
                    // After the proxy-less candidate, a pushed image or a
                    // deeply nested path rules out the 'library' variants.
                    let separators = self.image.image_path().matches('/').count();
                    if position == 1
                        && (self.operation == Operation::Push || separators > MAX_PATH_SEPARATORS)
                    {
                        return Err(self.not_found(error));
                    }
                    last_error = Some(error);
                }
            }
        }

        let source = last_error.unwrap_or_else(|| {
            Error::InvalidManifest(format!(
                "no stored manifest matches image id {}",
                self.image.content_id()
            ))
        });
        Err(self.not_found(source))
    }

    fn not_found(&self, source: Error) -> Error {
        Error::ManifestNotFound {
            image: self.image.tag().to_string(),
            source: Box::new(source),
        }
    }

    /// The ordered path candidates: reverse-proxy, proxy-less, then both
    /// again under the `library` namespace.
    fn candidate_paths(&self) -> [String; 4] {
        let proxy = self.image.image_path();
        let proxy_less = self.image.proxy_less_image_path();
        [
            proxy.clone(),
            proxy_less.clone(),
            format!("library/{}", proxy),
            format!("library/{}", proxy_less),
        ]
    }

    /// Evaluate a single candidate path. The outer error is fatal (a fat
    /// manifest that does not cover the running platform); everything
    /// recoverable becomes a [`CandidateOutcome`].
    async fn try_candidate(&self, path: &str, is_remote: bool) -> Result<CandidateOutcome> {
        let manifest_url = format!(
            "{}/{}/{}",
            self.client.base_url(),
            self.image.target_repo(),
            path
        );
        let raw = match self.client.download(&format!("{}/manifest.json", manifest_url)).await {
            Ok(content) => content.body,
            Err(error) => {
                if !is_remote {
                    return Ok(CandidateOutcome::Failed(error));
                }
                // A remote mirror may hold the fat manifest instead.
                match self.fetch_via_fat_manifest(&manifest_url).await? {
                    Ok(body) => body,
                    Err(error) => return Ok(CandidateOutcome::Failed(error)),
                }
            }
        };
        Ok(match Manifest::parse(raw) {
            Ok(manifest) if manifest.config_digest() == self.image.content_id() => {
                CandidateOutcome::Matched(manifest)
            }
            Ok(_) => CandidateOutcome::Mismatch,
            Err(error) => CandidateOutcome::Failed(error),
        })
    }

    /// Resolve the platform digest out of `list.manifest.json` and fetch
    /// the manifest at the digest-qualified sibling path. The inner
    /// result is a candidate-level failure; the outer error (platform
    /// not covered) aborts the whole resolution.
    async fn fetch_via_fat_manifest(
        &self,
        manifest_url: &str,
    ) -> Result<std::result::Result<String, Error>> {
        let list = match self
            .client
            .download(&format!("{}/list.manifest.json", manifest_url))
            .await
        {
            Ok(content) => content,
            Err(error) => return Ok(Err(error)),
        };
        let fat = match FatManifest::parse(&list.body) {
            Ok(fat) => fat,
            Err(error) => return Ok(Err(error)),
        };
        let digest = fat.platform_digest(self.image.os(), self.image.architecture())?;
        tracing::info!(
            digest = %digest,
            os = %self.image.os(),
            architecture = %self.image.architecture(),
            "Resolved platform manifest digest from the fat manifest"
        );
        // Replace the tag segment with the digest, colon becomes a
        // double underscore.
        let prefix = manifest_url
            .rsplit_once('/')
            .map(|(prefix, _)| prefix)
            .unwrap_or(manifest_url);
        let digest_path = format!("{}/{}/manifest.json", prefix, digest.replace(':', "__"));
        match self.client.download(&digest_path).await {
            Ok(content) => Ok(Ok(content.body)),
            Err(error) => Ok(Err(error)),
        }
    }

    /// Build the layer index for a validated manifest. When marker
    /// placeholders turn up, ask the repository to materialize them and
    /// re-run the search exactly once.
    async fn load_layers(
        &self,
        manifest: &Manifest,
        path: &str,
        is_remote: bool,
    ) -> Result<LayerIndex> {
        let mut search_repo = self.image.target_repo().to_string();
        if is_remote {
            search_repo.push_str(REMOTE_CACHE_SUFFIX);
        }
        let index = self.search_layers(manifest, &search_repo, path).await?;
        let marker_digests: Vec<Digest> = index
            .markers()
            .into_iter()
            .map(|record| record.digest().clone())
            .collect();
        if marker_digests.is_empty() {
            return Ok(index);
        }
        tracing::info!(
            count = marker_digests.len(),
            "Materializing marker layers before re-running the layer search"
        );
        let namespace = self.image.image_namespace();
        for digest in &marker_digests {
            self.client
                .materialize_marker_layer(self.image.target_repo(), &namespace, digest)
                .await?;
        }
        self.search_layers(manifest, &search_repo, path).await
    }

    async fn search_layers(
        &self,
        manifest: &Manifest,
        search_repo: &str,
        path: &str,
    ) -> Result<LayerIndex> {
        let query = LayerQueryBuilder::new(search_repo, manifest.searchable_digests())
            .include_virtual_repos(self.client.supports_virtual_repo_search())
            .build();
        let entries = self.client.search(&query).await?;
        let index = LayerIndex::from_entries(&entries);
        if index.is_empty() {
            return Err(Error::EmptyLayerIndex {
                query,
                repo: search_repo.to_string(),
                path: path.to_string(),
            });
        }
        Ok(index)
    }
}
