use std::sync::Arc;

use chrono::Utc;
use dockyard_build::Workspace;
use dockyard_core::{
    Build, BuildJob, BuildSettings, BuildStatus, DockyardConfig, Domain, Fingerprint,
    FingerprintCommit, ImageTag, WorkerConfig, fingerprint, needs_rebuild, short_revision,
};
use dockyard_proxy::{DataPlaneApi, ProxyReconciler, Route};
use dockyard_runtime::{
    CertificateIssuer, CleanupStep, ContainerRuntime, DeploymentManager, ImageCache, KeyedLocks,
    RuntimeConnector,
};

use crate::dispatch::BuildDispatcher;
use crate::error::{PipelineError, describe};
use crate::logger::BuildLogger;
use crate::reaper::InFlight;
use crate::source::SourceImporter;
use crate::store::{BuildStore, StoreError};

/// External systems a build talks to.
pub struct Collaborators {
    pub store: Arc<dyn BuildStore>,
    pub importer: Arc<dyn SourceImporter>,
    pub connector: Arc<dyn RuntimeConnector>,
    /// `None` when no control-plane credentials are configured; routed
    /// deployments then skip proxy reconciliation.
    pub proxy: Option<Arc<dyn DataPlaneApi>>,
    pub certificates: Arc<dyn CertificateIssuer>,
}

/// A stage whose failure is logged without failing the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Deploy,
    Proxy,
    Certificate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub build_id: String,
    pub status: BuildStatus,
    pub revision: Option<String>,
    pub image: Option<ImageTag>,
    /// A new image was built by this run.
    pub rebuilt: bool,
    /// A new instance was started by this run.
    pub deployed: bool,
    pub degraded: Vec<Stage>,
}

impl BuildOutcome {
    fn started(build_id: &str) -> Self {
        Self {
            build_id: build_id.to_owned(),
            status: BuildStatus::Running,
            revision: None,
            image: None,
            rebuilt: false,
            deployed: false,
            degraded: Vec::new(),
        }
    }
}

/// Runs one deployment job from source to routed, certified instance.
///
/// Source import and image build failures are fatal and mark the build
/// `failed`. Deploy, proxy and certificate failures are logged and the
/// build still ends `success`. The workspace is removed on every path.
///
/// Deployment and proxy reconciliation of one application never overlap
/// across concurrent builds.
pub struct Orchestrator {
    store: Arc<dyn BuildStore>,
    importer: Arc<dyn SourceImporter>,
    connector: Arc<dyn RuntimeConnector>,
    proxy: Option<ProxyReconciler>,
    certificates: Arc<dyn CertificateIssuer>,
    dispatcher: BuildDispatcher,
    deployer: DeploymentManager,
    worker: WorkerConfig,
    app_locks: KeyedLocks,
    in_flight: InFlight,
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators, config: &DockyardConfig) -> Self {
        Self {
            store: collaborators.store,
            importer: collaborators.importer,
            connector: collaborators.connector,
            proxy: collaborators.proxy.map(ProxyReconciler::new),
            certificates: collaborators.certificates,
            dispatcher: BuildDispatcher::new(config.buildpacks.clone()),
            deployer: DeploymentManager::new(),
            worker: config.worker.clone(),
            app_locks: KeyedLocks::new(),
            in_flight: InFlight::new(),
        }
    }

    /// Builds this orchestrator is executing; hand it to the stale-build
    /// sweep so live builds are never reaped.
    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Run `job` to a terminal status.
    ///
    /// Returns an error only when the build record cannot be created; every
    /// later failure is reported through the build's status and log.
    #[tracing::instrument(skip_all, fields(build_id = %job.build_id, application_id = %job.application_id))]
    pub async fn run(&self, job: BuildJob) -> Result<BuildOutcome, PipelineError> {
        let build = Build::new(
            &job.build_id,
            &job.application_id,
            &job.destination.id,
            &job.origin.id,
            Utc::now(),
        );
        self.store
            .create_build(&build)
            .await
            .map_err(|e| PipelineError::Store {
                build_id: job.build_id.clone(),
                source: e,
            })?;
        let _running = self.in_flight.enter(&job.build_id);

        let log = BuildLogger::new(Arc::clone(&self.store), &job.build_id);
        let mut outcome = BuildOutcome::started(&job.build_id);

        let status = match self.execute(&job, &log, &mut outcome).await {
            Ok(()) => {
                if outcome.degraded.is_empty() {
                    log.line("Build succeeded.").await;
                } else {
                    log.line("Build succeeded with warnings.").await;
                }
                BuildStatus::Success
            }
            Err(e) => {
                tracing::error!(error = %e, "build failed");
                log.line(&format!("Build failed: {}", describe(&e))).await;
                BuildStatus::Failed
            }
        };

        if let Err(e) = self.store.finish_build(&job.build_id, status, Utc::now()).await {
            tracing::warn!(error = %e, %status, "failed to record build status");
        }
        outcome.status = status;
        Ok(outcome)
    }

    async fn execute(
        &self,
        job: &BuildJob,
        log: &BuildLogger,
        outcome: &mut BuildOutcome,
    ) -> Result<(), PipelineError> {
        let workspace = Workspace::create(&self.worker.workdir_root, &job.repository, &job.build_id)
            .map_err(|e| PipelineError::Workspace { source: e })?;

        let result = self.stages(job, &workspace, log, outcome).await;

        if let Err(e) = workspace.remove() {
            tracing::warn!(error = %e, "failed to remove workspace");
        }
        result
    }

    async fn stages(
        &self,
        job: &BuildJob,
        workspace: &Workspace,
        log: &BuildLogger,
        outcome: &mut BuildOutcome,
    ) -> Result<(), PipelineError> {
        let settings = job.settings.with_defaults();
        let runtime = self.connector.connect(&job.destination);

        // ── Source ──
        log.line(&format!("Importing {}@{}.", job.repository, job.branch))
            .await;
        let revision = self
            .importer
            .import(
                workspace.path(),
                &job.origin,
                &job.repository,
                &job.branch,
                &job.build_id,
            )
            .await
            .map_err(|e| PipelineError::Import { source: e })?;
        if let Err(e) = self
            .store
            .set_build_revision(&job.build_id, &revision, Utc::now())
            .await
        {
            tracing::warn!(error = %e, "failed to record revision");
        }
        log.line(&format!("Imported revision {}.", short_revision(&revision)))
            .await;
        outcome.revision = Some(revision.clone());

        // ── Fingerprint ──
        let current = fingerprint(&settings);
        let changed = needs_rebuild(job.config_hash.as_deref(), &current);
        if changed {
            if self.worker.fingerprint_commit == FingerprintCommit::Eager {
                self.commit_fingerprint(&job.application_id, &current).await;
            }
            log.line("Configuration changed, redeploying.").await;
        }

        // ── Image ──
        let image = ImageTag::for_revision(&job.application_id, &revision);
        outcome.image = Some(image.clone());
        let cached = ImageCache::resolve(runtime.as_ref(), &image).await;
        let deploy = changed || !cached.is_hit();
        if deploy {
            self.dispatcher
                .build(runtime.as_ref(), workspace, &settings, &image, log)
                .await?;
            outcome.rebuilt = true;
        } else {
            log.line("Nothing changed.").await;
        }

        // ── Deploy + route ──
        {
            let _guard = self.app_locks.lock(&job.application_id).await;
            if deploy {
                self.deploy(runtime.as_ref(), job, &image, log, outcome).await;
                if outcome.deployed
                    && changed
                    && self.worker.fingerprint_commit == FingerprintCommit::AfterDeploy
                {
                    self.commit_fingerprint(&job.application_id, &current).await;
                }
            }
            self.reconcile_proxy(job, &settings, log, outcome).await;
        }

        // ── TLS ──
        self.provision_certificate(job, log, outcome).await;
        Ok(())
    }

    async fn deploy(
        &self,
        runtime: &dyn ContainerRuntime,
        job: &BuildJob,
        image: &ImageTag,
        log: &BuildLogger,
        outcome: &mut BuildOutcome,
    ) {
        log.line(&format!("Deploying {image}.")).await;
        match self
            .deployer
            .deploy(runtime, &job.destination, &job.application_id, image)
            .await
        {
            Ok(report) => {
                if let CleanupStep::Failed(error) = &report.remove {
                    log.line(&format!("Could not remove previous instance: {error}"))
                        .await;
                } else if report.replaced_previous() {
                    log.line("Removed previous instance.").await;
                }
                log.line("Deployment successful.").await;
                outcome.deployed = true;
            }
            Err(e) => {
                log.line(&format!("Deployment failed: {}", describe(&e))).await;
                outcome.degraded.push(Stage::Deploy);
            }
        }
    }

    async fn reconcile_proxy(
        &self,
        job: &BuildJob,
        settings: &BuildSettings,
        log: &BuildLogger,
        outcome: &mut BuildOutcome,
    ) {
        let Some(raw) = routed_domain(job) else {
            return;
        };
        let domain = match Domain::parse(raw) {
            Ok(domain) => domain,
            Err(e) => {
                log.line(&format!("Proxy: {e}")).await;
                outcome.degraded.push(Stage::Proxy);
                return;
            }
        };
        let Some(reconciler) = &self.proxy else {
            log.line("Proxy: control plane credentials not configured, skipping.")
                .await;
            outcome.degraded.push(Stage::Proxy);
            return;
        };

        let route = Route {
            application_id: job.application_id.clone(),
            domain: domain.host().to_owned(),
            port: settings.effective_port(),
            previous_domain: job.previous_domain.as_deref().map(previous_host),
        };
        let mut lines = Vec::new();
        let result = reconciler
            .reconcile(&route, &mut |line: &str| lines.push(line.to_owned()))
            .await;
        for line in &lines {
            log.line(line).await;
        }

        match result {
            Ok(reconciled) if reconciled.previous_domain_retired => {
                match self.store.clear_previous_domain(&job.application_id).await {
                    Ok(()) => {}
                    Err(StoreError::NotFound { .. }) => {
                        tracing::debug!("no stored application record; previous domain not cleared")
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to clear previous domain"),
                }
            }
            Ok(_) => {}
            Err(e) => {
                log.line(&format!("Proxy: reconciliation failed: {}", describe(&e)))
                    .await;
                outcome.degraded.push(Stage::Proxy);
            }
        }
    }

    async fn provision_certificate(
        &self,
        job: &BuildJob,
        log: &BuildLogger,
        outcome: &mut BuildOutcome,
    ) {
        let Some(domain) = routed_domain(job).and_then(|raw| Domain::parse(raw).ok()) else {
            return;
        };
        if !domain.is_secure() {
            return;
        }

        log.line(&format!("Requesting TLS certificate for {domain}."))
            .await;
        match self.certificates.issue(&job.destination, &domain).await {
            Ok(()) => log.line("TLS certificate issued.").await,
            Err(e) => {
                log.line(&format!("TLS certificate request failed: {}", describe(&e)))
                    .await;
                outcome.degraded.push(Stage::Certificate);
            }
        }
    }

    async fn commit_fingerprint(&self, application_id: &str, fingerprint: &Fingerprint) {
        match self.store.save_config_hash(application_id, fingerprint).await {
            Ok(()) => tracing::debug!(%fingerprint, "configuration fingerprint saved"),
            Err(StoreError::NotFound { .. }) => {
                tracing::debug!(%fingerprint, "no stored application record; fingerprint not saved")
            }
            Err(e) => tracing::warn!(error = %e, "failed to save configuration fingerprint"),
        }
    }
}

/// The domain the proxy should route for this job, if any.
fn routed_domain(job: &BuildJob) -> Option<&str> {
    if !job.destination.proxy_managed {
        return None;
    }
    job.domain
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
}

fn previous_host(raw: &str) -> String {
    Domain::parse(raw)
        .map(|d| d.host().to_owned())
        .unwrap_or_else(|_| raw.trim().to_owned())
}
