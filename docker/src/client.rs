//! The repository capability trait.
//!
//! Everything the resolution pipeline needs from the artifact repository
//! is collected behind [`RepositoryClient`]: downloading stored content,
//! running the layer search, repository-kind and version queries, and
//! marker-layer materialization. Transport, authentication, and timeouts
//! are the implementation's concern; the pipeline treats every call as a
//! blocking step returning content or a typed failure.

use async_trait::async_trait;
use serde::Deserialize;

use buildinfo_core::{Result, ServerVersion};

use crate::digest::Digest;

/// First server version that shares layers across virtual repositories,
/// making the `virtual_repos` projection meaningful.
const VIRTUAL_REPOS_MIN_VERSION: &str = "4.8.1";

/// Downloaded repository content.
#[derive(Debug, Clone)]
pub struct Content {
    pub body: String,
    pub content_type: Option<String>,
}

impl Content {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: None,
        }
    }
}

/// One row of a layer search result.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchEntry {
    pub name: String,
    pub repo: String,
    pub path: String,
    #[serde(default)]
    pub actual_sha1: String,
    #[serde(default)]
    pub virtual_repos: Vec<String>,
}

/// Capabilities the resolution pipeline consumes from the repository.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Base URL of the repository server, without a trailing slash.
    fn base_url(&self) -> &str;

    /// The server's reported version.
    fn server_version(&self) -> &ServerVersion;

    /// Download stored content. The pipeline composes full URLs from
    /// [`Self::base_url`], the repository key, and the storage path.
    async fn download(&self, path: &str) -> Result<Content>;

    /// Run a layer search and return its rows in result order.
    async fn search(&self, query: &str) -> Result<Vec<SearchEntry>>;

    /// Whether `repo` is a remote-cache mirror of an upstream registry.
    async fn is_remote_repository(&self, repo: &str) -> Result<bool>;

    /// Ask the repository to replace a marker placeholder with the real
    /// layer file.
    async fn materialize_marker_layer(
        &self,
        repo: &str,
        namespace: &str,
        digest: &Digest,
    ) -> Result<()>;

    /// Whether the server shares layers across virtual repositories.
    fn supports_virtual_repo_search(&self) -> bool {
        self.server_version()
            .is_at_least(&ServerVersion::new(VIRTUAL_REPOS_MIN_VERSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VersionOnly {
        version: ServerVersion,
    }

    #[async_trait]
    impl RepositoryClient for VersionOnly {
        fn base_url(&self) -> &str {
            "http://localhost:8081/artifactory"
        }

        fn server_version(&self) -> &ServerVersion {
            &self.version
        }

        async fn download(&self, path: &str) -> Result<Content> {
            Err(buildinfo_core::Error::Download {
                path: path.to_string(),
                message: "not implemented".to_string(),
            })
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchEntry>> {
            Ok(Vec::new())
        }

        async fn is_remote_repository(&self, _repo: &str) -> Result<bool> {
            Ok(false)
        }

        async fn materialize_marker_layer(
            &self,
            _repo: &str,
            _namespace: &str,
            _digest: &Digest,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_virtual_repo_gate() {
        let old = VersionOnly {
            version: ServerVersion::new("4.8.0"),
        };
        let new = VersionOnly {
            version: ServerVersion::new("6.10.2"),
        };
        assert!(!old.supports_virtual_repo_search());
        assert!(new.supports_virtual_repo_search());
    }

    #[test]
    fn test_search_entry_deserializes_sparse_rows() {
        let entry: SearchEntry = serde_json::from_str(
            r#"{ "name": "sha256__abc", "repo": "docker-local", "path": "acme/app/1.0" }"#,
        )
        .unwrap();
        assert_eq!(entry.actual_sha1, "");
        assert!(entry.virtual_repos.is_empty());
    }
}
