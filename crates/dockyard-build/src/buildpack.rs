use std::path::PathBuf;

use dockyard_core::{BuildSettings, BuildpackConfig, BuildpackKind, ImageTag};

use crate::dockerfile::DockerfileGenerator;
use crate::eject::{is_ejected, load_ejected_dockerfile};
use crate::workspace::{BuildContextError, Workspace};

/// Directory inside the workspace the Dockerfile used for the build is written to.
pub const BUILD_DIR: &str = ".dockyard-build";

/// Build strategy for one application kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Buildpack {
    Node {
        image: String,
    },
    Static {
        builder_image: String,
        image: String,
        output_dir: String,
    },
}

/// Everything the container runtime needs to build an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Directory sent to the image builder.
    pub context_dir: PathBuf,
    pub dockerfile: PathBuf,
    pub image: ImageTag,
    /// Human-readable build phases, in order.
    pub phases: Vec<String>,
    /// The repository supplied its own Dockerfile.
    pub ejected: bool,
}

impl Buildpack {
    pub fn for_kind(kind: BuildpackKind, config: &BuildpackConfig) -> Self {
        match kind {
            BuildpackKind::Node => Buildpack::Node {
                image: config.node_image.clone(),
            },
            BuildpackKind::Static => Buildpack::Static {
                builder_image: config.node_image.clone(),
                image: config.static_image.clone(),
                output_dir: config.static_output_dir.clone(),
            },
        }
    }

    pub fn kind(&self) -> BuildpackKind {
        match self {
            Buildpack::Node { .. } => BuildpackKind::Node,
            Buildpack::Static { .. } => BuildpackKind::Static,
        }
    }

    /// Render the generated Dockerfile for these settings.
    pub fn dockerfile(&self, settings: &BuildSettings) -> String {
        let config = self.config();
        let settings = BuildSettings {
            buildpack: self.kind(),
            ..settings.clone()
        };
        DockerfileGenerator::new(&config, &settings).render()
    }

    /// Write the Dockerfile into the workspace and describe the build.
    ///
    /// A Dockerfile ejected into the repository takes precedence over the
    /// generated one.
    pub fn prepare(
        &self,
        workspace: &Workspace,
        settings: &BuildSettings,
        image: &ImageTag,
    ) -> Result<BuildContext, BuildContextError> {
        check_single_line("install command", &settings.install_command)?;
        check_single_line("build command", &settings.build_command)?;
        check_single_line("start command", &settings.start_command)?;

        let root = workspace.path();
        let ejected = is_ejected(root);
        let content = if ejected {
            tracing::info!(image = %image, "using ejected Dockerfile");
            load_ejected_dockerfile(root)?
        } else {
            self.dockerfile(settings)
        };

        let build_dir = root.join(BUILD_DIR);
        std::fs::create_dir_all(&build_dir).map_err(|e| BuildContextError::Create {
            path: build_dir.clone(),
            source: e,
        })?;
        let dockerfile = build_dir.join("Dockerfile");
        std::fs::write(&dockerfile, content).map_err(|e| BuildContextError::WriteDockerfile {
            path: dockerfile.clone(),
            source: e,
        })?;

        Ok(BuildContext {
            context_dir: root.to_path_buf(),
            dockerfile,
            image: image.clone(),
            phases: self.phases(settings, image, ejected),
            ejected,
        })
    }

    fn phases(&self, settings: &BuildSettings, image: &ImageTag, ejected: bool) -> Vec<String> {
        let mut phases = Vec::new();
        if ejected {
            phases.push("Building with the repository's .dockyard/Dockerfile.".to_owned());
        } else {
            if let Some(cmd) = non_blank(&settings.install_command) {
                phases.push(format!("Installing dependencies: {cmd}"));
            }
            if let Some(cmd) = non_blank(&settings.build_command) {
                phases.push(format!("Building application: {cmd}"));
            }
        }
        phases.push(format!("Packaging image {image}."));
        phases
    }

    fn config(&self) -> BuildpackConfig {
        let mut config = BuildpackConfig::default();
        match self {
            Buildpack::Node { image } => config.node_image = image.clone(),
            Buildpack::Static {
                builder_image,
                image,
                output_dir,
            } => {
                config.node_image = builder_image.clone();
                config.static_image = image.clone();
                config.static_output_dir = output_dir.clone();
            }
        }
        config
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn check_single_line(field: &'static str, value: &Option<String>) -> Result<(), BuildContextError> {
    match non_blank(value) {
        Some(v) if v.contains(['\n', '\r']) => Err(BuildContextError::MultilineCommand { field }),
        _ => Ok(()),
    }
}
