use std::sync::Arc;

use async_trait::async_trait;
use dockyard_core::{CertificateConfig, DestinationBackend, Domain};

use crate::docker::DockerError;
use crate::locks::KeyedLocks;
use crate::runtime::{ContainerSpec, RuntimeConnector};

/// Obtains TLS certificates for domains routed on a destination.
#[async_trait]
pub trait CertificateIssuer: Send + Sync {
    async fn issue(&self, backend: &DestinationBackend, domain: &Domain) -> Result<(), CertError>;
}

/// Issues certificates with a throwaway certbot container using the
/// standalone HTTP challenge.
///
/// Runs on the same destination are serialized: the challenge listener
/// binds a fixed host port.
pub struct CertbotProvisioner {
    config: CertificateConfig,
    connector: Arc<dyn RuntimeConnector>,
    locks: KeyedLocks,
}

impl CertbotProvisioner {
    pub fn new(config: CertificateConfig, connector: Arc<dyn RuntimeConnector>) -> Self {
        Self {
            config,
            connector,
            locks: KeyedLocks::new(),
        }
    }

    /// The certbot container for `domain`.
    pub fn spec(&self, domain: &Domain) -> ContainerSpec {
        let port = self.config.http_port.to_string();
        let mut command = vec![
            "--work-dir".to_owned(),
            self.config.work_dir.clone(),
            "certonly".to_owned(),
            "--standalone".to_owned(),
            "--preferred-challenges".to_owned(),
            "http".to_owned(),
            "--http-01-address".to_owned(),
            "0.0.0.0".to_owned(),
            "--http-01-port".to_owned(),
            port,
            "-d".to_owned(),
            domain.host().to_owned(),
            "--agree-tos".to_owned(),
            "--non-interactive".to_owned(),
            "--register-unsafely-without-email".to_owned(),
        ];
        if self.config.staging {
            command.push("--test-cert".to_owned());
        }

        ContainerSpec::new("certbot", self.config.image.clone())
            .auto_remove()
            .port(self.config.http_port, self.config.http_port)
            .volume(self.config.config_dir.clone(), self.config.config_dir.clone())
            .command(command)
    }
}

#[async_trait]
impl CertificateIssuer for CertbotProvisioner {
    async fn issue(&self, backend: &DestinationBackend, domain: &Domain) -> Result<(), CertError> {
        if !domain.is_secure() {
            return Err(CertError::PlainTransport {
                domain: domain.host().to_owned(),
            });
        }

        let _guard = self.locks.lock(&backend.id).await;
        let runtime = self.connector.connect(backend);

        tracing::info!(domain = %domain, backend = %backend.id, "requesting certificate");
        runtime
            .run_to_completion(&self.spec(domain))
            .await
            .map_err(|e| CertError::Certbot {
                domain: domain.host().to_owned(),
                source: e,
            })?;
        tracing::info!(domain = %domain, "certificate issued");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error("{domain} is not served over https")]
    PlainTransport { domain: String },

    #[error("certbot failed for {domain}")]
    Certbot { domain: String, source: DockerError },
}
