use dockyard_core::ImageTag;

use crate::runtime::ContainerRuntime;

/// Outcome of looking up a revision's image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit)
    }
}

/// Resolves whether an image for (application, revision) is already built.
pub struct ImageCache;

impl ImageCache {
    /// Query the backend for `image`.
    ///
    /// An unreachable or failing backend counts as a miss so the caller
    /// rebuilds instead of skipping the deployment.
    pub async fn resolve(runtime: &dyn ContainerRuntime, image: &ImageTag) -> CacheLookup {
        match runtime.image_exists(image).await {
            Ok(true) => CacheLookup::Hit,
            Ok(false) => CacheLookup::Miss,
            Err(e) => {
                tracing::warn!(image = %image, error = %e, "image lookup failed, treating as miss");
                CacheLookup::Miss
            }
        }
    }
}
