use async_trait::async_trait;
use dockyard_core::Removal;

use crate::error::ProxyError;

/// A server entry attached to a proxy backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEntry {
    pub name: String,
    /// Host name the proxy resolves on the destination network.
    pub address: String,
    pub port: u16,
}

/// Versioned, transactional control plane of the shared reverse proxy.
///
/// Mutations are staged inside a transaction and applied atomically by
/// [`commit_transaction`](DataPlaneApi::commit_transaction).
#[async_trait]
pub trait DataPlaneApi: Send + Sync {
    async fn configuration_version(&self) -> Result<u64, ProxyError>;

    /// Open a transaction against `version`. Returns the transaction id.
    async fn begin_transaction(&self, version: u64) -> Result<String, ProxyError>;

    /// Whether `name` exists in the committed configuration.
    async fn backend_exists(&self, name: &str) -> Result<bool, ProxyError>;

    async fn delete_backend(&self, transaction_id: &str, name: &str)
    -> Result<Removal, ProxyError>;

    /// Create a backend with forwarded-client-IP header insertion enabled.
    async fn create_backend(&self, transaction_id: &str, name: &str) -> Result<(), ProxyError>;

    /// Attach a health-checked server to `backend`.
    async fn create_server(
        &self,
        transaction_id: &str,
        backend: &str,
        server: &ServerEntry,
    ) -> Result<(), ProxyError>;

    async fn commit_transaction(&self, transaction_id: &str) -> Result<(), ProxyError>;

    /// Discard a transaction without applying it.
    async fn abort_transaction(&self, transaction_id: &str) -> Result<(), ProxyError>;
}
