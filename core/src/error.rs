use thiserror::Error;

/// Buildinfo error types
#[derive(Error, Debug)]
pub enum Error {
    /// An artifact could not be downloaded from the repository
    #[error("Download failed: {path} - {message}")]
    Download { path: String, message: String },

    /// A search query against the repository failed
    #[error("Search failed: {message}")]
    Search { message: String },

    /// No stored manifest matched the expected image id under any
    /// candidate path. Carries the last candidate's underlying error.
    /// This is the only soft failure: the caller reports an empty module
    /// instead of aborting, since a concurrent build may have replaced
    /// the image at the same path.
    #[error("Manifest not found for image {image}: {source}")]
    ManifestNotFound {
        image: String,
        #[source]
        source: Box<Error>,
    },

    /// A fat manifest has no entry for the requested platform
    #[error("No manifest found for platform {os}/{architecture} in the fat manifest")]
    PlatformNotFound { os: String, architecture: String },

    /// The layer search returned no results
    #[error("No layers found using query: {query} in repository {repo} under path {path}")]
    EmptyLayerIndex {
        query: String,
        repo: String,
        path: String,
    },

    /// The image's config blob has no record in the layer index
    #[error("Could not find the history layer {digest} for image {image}")]
    HistoryLayerMissing { digest: String, image: String },

    /// A manifest layer digest has no record in the layer index
    #[error("Could not find a layer record for digest {digest}")]
    LayerNotFound { digest: String },

    /// Manifest content could not be parsed
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// Image config blob content could not be parsed
    #[error("Invalid image config: {0}")]
    InvalidConfig(String),

    /// A digest string is not of the form `algorithm:hex`
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    /// An image tag could not be interpreted
    #[error("Invalid image reference: {0}")]
    InvalidReference(String),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for buildinfo operations
pub type Result<T> = std::result::Result<T, Error>;
