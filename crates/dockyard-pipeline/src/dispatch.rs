use dockyard_build::{BuildContextError, Buildpack, Workspace};
use dockyard_core::{BuildSettings, BuildpackConfig, ImageTag};
use dockyard_runtime::{ContainerRuntime, DockerError};
use tokio::sync::mpsc;

use crate::logger::BuildLogger;

/// Builds an application's image with the buildpack its settings select.
#[derive(Debug, Clone, Default)]
pub struct BuildDispatcher {
    config: BuildpackConfig,
}

impl BuildDispatcher {
    pub fn new(config: BuildpackConfig) -> Self {
        Self { config }
    }

    /// Prepare the build context in `workspace` and build `image`.
    ///
    /// Builder output is streamed into the build log as it arrives. On
    /// failure any image already tagged `image` is removed, so a broken
    /// build never leaves a cache hit behind.
    pub async fn build(
        &self,
        runtime: &dyn ContainerRuntime,
        workspace: &Workspace,
        settings: &BuildSettings,
        image: &ImageTag,
        log: &BuildLogger,
    ) -> Result<(), DispatchError> {
        let buildpack = Buildpack::for_kind(settings.buildpack, &self.config);
        let context = buildpack
            .prepare(workspace, settings, image)
            .map_err(|e| DispatchError::Context {
                image: image.to_string(),
                source: e,
            })?;
        for phase in &context.phases {
            log.line(phase).await;
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let build = runtime.build_image(&context.context_dir, &context.dockerfile, image, tx);
        let forward = async {
            while let Some(line) = rx.recv().await {
                log.line(&line).await;
            }
        };
        let (result, ()) = tokio::join!(build, forward);

        if let Err(e) = result {
            match runtime.remove_image(image).await {
                Ok(removal) => {
                    tracing::debug!(image = %image, ?removal, "discarded image of failed build")
                }
                Err(cleanup) => {
                    tracing::warn!(image = %image, error = %cleanup, "failed to discard image of failed build")
                }
            }
            return Err(DispatchError::Image {
                image: image.to_string(),
                source: e,
            });
        }

        tracing::info!(image = %image, buildpack = %settings.buildpack, "image built");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to prepare build context for {image}")]
    Context {
        image: String,
        source: BuildContextError,
    },

    #[error("failed to build image {image}")]
    Image { image: String, source: DockerError },
}
