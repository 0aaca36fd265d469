//! Core types and configuration for dockyard.
//!
//! This crate defines the `dockyard.toml` schema ([`DockyardConfig`]), the
//! records the build pipeline reads and mutates ([`Application`], [`Build`],
//! [`DestinationBackend`], [`SourceOrigin`]), the queued job payload
//! ([`BuildJob`]), and the two pure decisions every deployment starts with:
//! the configuration [`fingerprint`] and the revision-addressed [`ImageTag`].

pub mod application;
pub mod build;
pub mod buildpack;
pub mod config;
pub mod destination;
pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod image;
pub mod job;
pub mod removal;

pub use application::{Application, BuildSettings, ConfigurationUpdate};
pub use build::{Build, BuildStatus, LogLine};
pub use buildpack::BuildpackKind;
pub use config::{
    BuildpackConfig, CertificateConfig, DockyardConfig, FingerprintCommit, ProxyConfig,
    RuntimeConfig, WorkerConfig,
};
pub use destination::{BackendKind, DestinationBackend, SourceOrigin, SourceProvider};
pub use domain::Domain;
pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, fingerprint, needs_rebuild};
pub use image::{ImageTag, short_revision};
pub use job::BuildJob;
pub use removal::Removal;
