//! Build and deploy applications to self-hosted Docker destinations.
//!
//! This is the facade crate that re-exports all dockyard sub-crates.
//! Use feature flags to control which components are included.
//!
//! # Feature flags
//!
//! | Feature | Default | Crate | Description |
//! |---------|---------|-------|-------------|
//! | `core` | yes | `dockyard-core` | Records, configuration, fingerprints, image tags |
//! | `build` | yes | `dockyard-build` | Workspaces, buildpacks, Dockerfile generation and eject |
//! | `runtime` | yes | `dockyard-runtime` | docker CLI runtime, deployment, certificates |
//! | `proxy` | yes | `dockyard-proxy` | HAProxy Data Plane API client and reconciler |
//! | `pipeline` | yes | `dockyard-pipeline` | Orchestrator, job queue, worker pool |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use dockyard::{BuildSettings, BuildpackKind, DockyardConfig, fingerprint};
//! use dockyard::build::Buildpack;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DockyardConfig::load(Path::new("."))?;
//! let settings = BuildSettings::new(BuildpackKind::Node).with_defaults();
//! let dockerfile = Buildpack::for_kind(settings.buildpack, &config.buildpacks).dockerfile(&settings);
//! println!("{}\n{dockerfile}", fingerprint(&settings));
//! # Ok(())
//! # }
//! ```

// Core types flattened into root namespace for convenience.
#[cfg(feature = "core")]
pub use dockyard_core::*;

/// Build workspaces, buildpacks, and Dockerfile generation.
#[cfg(feature = "build")]
pub mod build {
    pub use dockyard_build::*;
}

/// Container runtime, image cache, deployment, and certificates.
#[cfg(feature = "runtime")]
pub mod runtime {
    pub use dockyard_runtime::*;
}

/// Reverse-proxy control plane and reconciliation.
#[cfg(feature = "proxy")]
pub mod proxy {
    pub use dockyard_proxy::*;
}

/// Build orchestration, job queue, and worker pool.
#[cfg(feature = "pipeline")]
pub mod pipeline {
    pub use dockyard_pipeline::*;
}
