//! Build context preparation for dockyard.
//!
//! # Build context
//!
//! ```text
//! orchestrator
//!   1. Workspace  ── <workdir_root>/<repository>/<build id>, fresh per build
//!   2. Import     ── source collaborator fills the workspace
//!   3. Buildpack  ── Buildpack::for_kind(kind).prepare()
//!        a. .dockyard/Dockerfile present → used verbatim (ejected)
//!        b. otherwise                    → DockerfileGenerator::render()
//!   4. Image      ── container runtime builds <context>/.dockyard-build/Dockerfile
//!   5. Cleanup    ── Workspace::remove(), or on drop
//! ```
//!
//! # Buildpacks
//!
//! - **node**: single stage on the configured Node image; install, optional
//!   build, then the start command as `CMD`.
//! - **static**: with a build command, a Node builder stage whose output
//!   directory is copied into the static server image; without one, the
//!   repository is served as-is.

pub mod buildpack;
pub mod dockerfile;
pub mod eject;
pub mod workspace;

pub use buildpack::{BuildContext, Buildpack};
pub use dockerfile::DockerfileGenerator;
pub use workspace::{BuildContextError, Workspace};
