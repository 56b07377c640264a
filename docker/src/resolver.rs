//! Top-level resolution orchestration.
//!
//! One call: locate the stored manifest, index its layers, classify them
//! into a build-info module. Location exhaustion is the single soft
//! failure — a concurrent build may legitimately have replaced the image
//! at the same path, so the caller gets an empty module instead of an
//! error. Everything else is fatal.

use buildinfo_core::{Error, Result};

use crate::client::RepositoryClient;
use crate::locator::ManifestLocator;
use crate::module::{Module, ModuleAssembler};
use crate::reference::{ImageReference, Operation};

/// Resolves build-info modules for images stored in the repository.
pub struct ModuleResolver<'a, C: RepositoryClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: RepositoryClient + ?Sized> ModuleResolver<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Resolve the module for one image.
    ///
    /// # Errors
    ///
    /// Fatal resolution failures only; an image whose manifest cannot be
    /// located under any path candidate yields `Ok` with an empty
    /// module.
    pub async fn resolve(&self, image: &ImageReference, operation: Operation) -> Result<Module> {
        let locator = ManifestLocator::new(self.client, image, operation);
        let located = match locator.locate().await {
            Ok(located) => located,
            Err(Error::ManifestNotFound { image: tag, source }) => {
                tracing::error!(
                    image = %tag,
                    error = %source,
                    "The manifest could not be fetched from the repository; reporting an empty module"
                );
                return Ok(Module::for_image(image));
            }
            Err(error) => return Err(error),
        };
        tracing::info!(
            image = %image.tag(),
            path = %located.path,
            "Fetching details of published layers from the repository"
        );
        ModuleAssembler::new(self.client, image)
            .assemble(&located, operation)
            .await
    }
}
