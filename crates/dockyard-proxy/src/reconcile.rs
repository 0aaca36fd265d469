use std::sync::Arc;

use dockyard_core::Removal;

use crate::api::{DataPlaneApi, ServerEntry};
use crate::error::ProxyError;

/// Desired routing for one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub application_id: String,
    /// Host the backend is named after.
    pub domain: String,
    pub port: u16,
    /// Host routed before a domain change, still awaiting retirement.
    pub previous_domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub transaction_id: String,
    /// The previous domain's backend is gone as of the committed transaction.
    /// The caller clears its pending-cleanup record when this is set.
    pub previous_domain_retired: bool,
}

/// Repoints the shared reverse proxy at an application's new instance in a
/// single transaction.
pub struct ProxyReconciler {
    api: Arc<dyn DataPlaneApi>,
}

impl ProxyReconciler {
    pub fn new(api: Arc<dyn DataPlaneApi>) -> Self {
        Self { api }
    }

    /// Route `route.domain` to the application's instance and retire the
    /// previous domain's backend.
    ///
    /// Deletions are staged before the backend of the same name is created.
    /// Once the transaction is open, any failure aborts it before the error
    /// is returned. `log` receives one line per applied step.
    pub async fn reconcile(
        &self,
        route: &Route,
        log: &mut (dyn FnMut(&str) + Send),
    ) -> Result<ReconcileOutcome, ProxyError> {
        let version = self.api.configuration_version().await?;
        let transaction_id = self.api.begin_transaction(version).await?;
        tracing::debug!(%transaction_id, version, domain = %route.domain, "proxy transaction opened");

        match self.stage_and_commit(&transaction_id, route, log).await {
            Ok(previous_domain_retired) => Ok(ReconcileOutcome {
                transaction_id,
                previous_domain_retired,
            }),
            Err(e) => {
                if let Err(abort) = self.api.abort_transaction(&transaction_id).await {
                    tracing::warn!(%transaction_id, error = %abort, "failed to abort proxy transaction");
                }
                Err(e)
            }
        }
    }

    async fn stage_and_commit(
        &self,
        transaction_id: &str,
        route: &Route,
        log: &mut (dyn FnMut(&str) + Send),
    ) -> Result<bool, ProxyError> {
        let domain = route.domain.as_str();

        let exists = match self.api.backend_exists(domain).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!(domain, error = %e, "backend lookup failed, attempting delete anyway");
                true
            }
        };
        if exists
            && self.api.delete_backend(transaction_id, domain).await? == Removal::Removed
        {
            log("Proxy: removed existing backend.");
        }

        let previous = route
            .previous_domain
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        let mut previous_domain_retired = false;
        if let Some(previous) = previous {
            if previous != domain {
                let removal = self.api.delete_backend(transaction_id, previous).await?;
                if removal.was_removed() {
                    log("Proxy: removed backend of the previous domain.");
                }
            }
            previous_domain_retired = true;
        }

        self.api.create_backend(transaction_id, domain).await?;
        log("Proxy: backend defined.");

        let server = ServerEntry {
            name: route.application_id.clone(),
            address: route.application_id.clone(),
            port: route.port,
        };
        self.api.create_server(transaction_id, domain, &server).await?;
        log("Proxy: server defined.");

        self.api.commit_transaction(transaction_id).await?;
        log("Proxy: transaction committed.");
        tracing::info!(transaction_id, domain, port = route.port, "proxy reconciled");

        Ok(previous_domain_retired)
    }
}
