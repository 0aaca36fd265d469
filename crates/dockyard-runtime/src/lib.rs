//! Container runtime operations for dockyard.
//!
//! Everything here drives the `docker` CLI through a [`DockerExecutor`], so
//! local sockets and remote engines (`--host`) are handled the same way.
//! [`ContainerRuntime`] is the seam the pipeline depends on; the image
//! cache, deployment manager and certificate provisioner are written
//! against it.

pub mod certs;
pub mod client;
pub mod deploy;
pub mod docker;
pub mod doctor;
pub mod executor;
pub mod image_cache;
pub mod locks;
pub mod runtime;

pub use certs::{CertError, CertbotProvisioner, CertificateIssuer};
pub use client::{DockerClient, DockerConnector};
pub use deploy::{CleanupStep, DeployError, DeployReport, DeploymentManager};
pub use docker::DockerError;
pub use doctor::{CheckResult, DoctorReport, check_runtime};
pub use executor::{DockerExecutor, RealExecutor};
pub use image_cache::{CacheLookup, ImageCache};
pub use locks::KeyedLocks;
pub use runtime::{ContainerRuntime, ContainerSpec, RestartPolicy, RuntimeConnector};
