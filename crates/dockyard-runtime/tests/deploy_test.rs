use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dockyard_core::{
    BackendKind, CertificateConfig, DestinationBackend, Domain, ImageTag, Removal,
};
use dockyard_runtime::runtime::{ContainerRuntime, ContainerSpec, RestartPolicy, RuntimeConnector};
use dockyard_runtime::{
    CacheLookup, CertError, CertbotProvisioner, CertificateIssuer, CleanupStep, DeployError,
    DeploymentManager, DockerError, DoctorReport, ImageCache, check_runtime,
};
use mockall::{Sequence, mock};
use tokio::sync::mpsc::UnboundedSender;

mock! {
    Runtime {}

    #[async_trait]
    impl ContainerRuntime for Runtime {
        async fn image_exists(&self, image: &ImageTag) -> Result<bool, DockerError>;
        async fn build_image(
            &self,
            context_dir: &Path,
            dockerfile: &Path,
            image: &ImageTag,
            output: UnboundedSender<String>,
        ) -> Result<(), DockerError>;
        async fn remove_image(&self, image: &ImageTag) -> Result<Removal, DockerError>;
        async fn stop_container(&self, name: &str) -> Result<Removal, DockerError>;
        async fn remove_container(&self, name: &str) -> Result<Removal, DockerError>;
        async fn run_container(&self, spec: &ContainerSpec) -> Result<String, DockerError>;
        async fn network_exists(&self, network: &str) -> Result<bool, DockerError>;
        async fn ensure_network(&self, network: &str) -> Result<bool, DockerError>;
        async fn run_to_completion(&self, spec: &ContainerSpec) -> Result<String, DockerError>;
        async fn server_version(&self) -> Result<String, DockerError>;
    }
}

struct FixedConnector(Arc<MockRuntime>);

impl RuntimeConnector for FixedConnector {
    fn connect(&self, _backend: &DestinationBackend) -> Arc<dyn ContainerRuntime> {
        self.0.clone()
    }
}

fn backend(kind: BackendKind) -> DestinationBackend {
    DestinationBackend {
        id: "dest-1".to_owned(),
        name: "local".to_owned(),
        kind,
        engine: "/var/run/docker.sock".to_owned(),
        network: "dockyard".to_owned(),
        proxy_managed: true,
    }
}

fn image() -> ImageTag {
    ImageTag::for_revision("app123", "abc1234567")
}

fn daemon_error() -> DockerError {
    DockerError::CommandFailed {
        args: vec![],
        stderr: "Cannot connect to the Docker daemon".to_owned(),
    }
}

// ── Deployment Tests ──

#[tokio::test]
async fn deploy_replaces_existing_instance_in_order() {
    let mut rt = MockRuntime::new();
    let mut seq = Sequence::new();
    rt.expect_stop_container()
        .withf(|name| name == "app123")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Removal::Removed));
    rt.expect_remove_container()
        .withf(|name| name == "app123")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Removal::Removed));
    rt.expect_ensure_network()
        .withf(|network| network == "dockyard")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(false));
    rt.expect_run_container()
        .withf(|spec| {
            spec.name == "app123"
                && spec.image == "app123:abc1234"
                && spec.network.as_deref() == Some("dockyard")
                && spec.restart == RestartPolicy::Always
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok("4f3c2a".to_owned()));

    let report = DeploymentManager::new()
        .deploy(&rt, &backend(BackendKind::SingleHost), "app123", &image())
        .await
        .unwrap();

    assert!(report.replaced_previous());
    assert_eq!(report.container_id, "4f3c2a");
    assert!(!report.network_created);
}

#[tokio::test]
async fn deploy_without_previous_instance() {
    let mut rt = MockRuntime::new();
    rt.expect_stop_container().returning(|_| Ok(Removal::NotFound));
    rt.expect_remove_container().returning(|_| Ok(Removal::NotFound));
    rt.expect_ensure_network().returning(|_| Ok(true));
    rt.expect_run_container()
        .times(1)
        .returning(|_| Ok("4f3c2a".to_owned()));

    let report = DeploymentManager::new()
        .deploy(&rt, &backend(BackendKind::SingleHost), "app123", &image())
        .await
        .unwrap();

    assert_eq!(report.stop, CleanupStep::Done(Removal::NotFound));
    assert!(!report.replaced_previous());
    assert!(report.network_created);
}

#[tokio::test]
async fn stop_and_remove_failures_do_not_prevent_start() {
    let mut rt = MockRuntime::new();
    let mut seq = Sequence::new();
    rt.expect_stop_container()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(daemon_error()));
    rt.expect_remove_container()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(daemon_error()));
    rt.expect_ensure_network()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(false));
    rt.expect_run_container()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok("4f3c2a".to_owned()));

    let report = DeploymentManager::new()
        .deploy(&rt, &backend(BackendKind::SingleHost), "app123", &image())
        .await
        .unwrap();

    assert!(matches!(report.stop, CleanupStep::Failed(_)));
    assert!(matches!(report.remove, CleanupStep::Failed(_)));
    assert_eq!(report.container_id, "4f3c2a");
}

#[tokio::test]
async fn start_failure_is_reported() {
    let mut rt = MockRuntime::new();
    rt.expect_stop_container().returning(|_| Ok(Removal::NotFound));
    rt.expect_remove_container().returning(|_| Ok(Removal::NotFound));
    rt.expect_ensure_network().returning(|_| Ok(false));
    rt.expect_run_container().returning(|_| Err(daemon_error()));

    let result = DeploymentManager::new()
        .deploy(&rt, &backend(BackendKind::SingleHost), "app123", &image())
        .await;

    assert!(matches!(result, Err(DeployError::Start { name, .. }) if name == "app123"));
}

#[tokio::test]
async fn network_failure_aborts_before_start() {
    let mut rt = MockRuntime::new();
    rt.expect_stop_container().returning(|_| Ok(Removal::NotFound));
    rt.expect_remove_container().returning(|_| Ok(Removal::NotFound));
    rt.expect_ensure_network().returning(|_| Err(daemon_error()));
    rt.expect_run_container().times(0);

    let result = DeploymentManager::new()
        .deploy(&rt, &backend(BackendKind::SingleHost), "app123", &image())
        .await;

    assert!(matches!(result, Err(DeployError::Network { .. })));
}

#[tokio::test]
async fn multi_host_backends_are_unsupported() {
    for kind in [BackendKind::Swarm, BackendKind::Kubernetes] {
        let rt = MockRuntime::new();

        let result = DeploymentManager::new()
            .deploy(&rt, &backend(kind), "app123", &image())
            .await;

        assert!(matches!(result, Err(DeployError::Unsupported { kind: k }) if k == kind));
    }
}

// ── Image Cache Tests ──

#[tokio::test]
async fn cache_hit_when_image_exists() {
    let mut rt = MockRuntime::new();
    rt.expect_image_exists()
        .withf(|image| image.to_string() == "app123:abc1234")
        .returning(|_| Ok(true));

    assert_eq!(ImageCache::resolve(&rt, &image()).await, CacheLookup::Hit);
}

#[tokio::test]
async fn cache_miss_when_image_absent() {
    let mut rt = MockRuntime::new();
    rt.expect_image_exists().returning(|_| Ok(false));

    assert_eq!(ImageCache::resolve(&rt, &image()).await, CacheLookup::Miss);
}

#[tokio::test]
async fn cache_lookup_failure_is_a_miss() {
    let mut rt = MockRuntime::new();
    rt.expect_image_exists().returning(|_| Err(daemon_error()));

    assert_eq!(ImageCache::resolve(&rt, &image()).await, CacheLookup::Miss);
}

// ── Certificate Tests ──

#[tokio::test]
async fn certbot_runs_standalone_challenge() {
    let mut rt = MockRuntime::new();
    rt.expect_run_to_completion()
        .withf(|spec| {
            let has = |a: &str, b: &str| spec.command.windows(2).any(|w| w[0] == a && w[1] == b);
            spec.name == "certbot"
                && spec.image == "certbot/certbot"
                && spec.auto_remove
                && spec.ports == [(9080, 9080)]
                && spec.volumes
                    == [(
                        "/usr/local/etc/haproxy/".to_owned(),
                        "/usr/local/etc/haproxy/".to_owned(),
                    )]
                && has("--work-dir", "/usr/local/etc/haproxy/ssl")
                && has("--http-01-port", "9080")
                && has("-d", "app.example.com")
                && spec.command.contains(&"--standalone".to_owned())
                && spec.command.contains(&"--non-interactive".to_owned())
                && spec.command.contains(&"--register-unsafely-without-email".to_owned())
                && !spec.command.contains(&"--test-cert".to_owned())
        })
        .times(1)
        .returning(|_| Ok(String::new()));

    let provisioner = CertbotProvisioner::new(
        CertificateConfig::default(),
        Arc::new(FixedConnector(Arc::new(rt))),
    );
    let domain = Domain::parse("https://app.example.com").unwrap();

    provisioner
        .issue(&backend(BackendKind::SingleHost), &domain)
        .await
        .unwrap();
}

#[test]
fn staging_adds_test_cert_flag() {
    let config = CertificateConfig {
        staging: true,
        ..Default::default()
    };
    let provisioner = CertbotProvisioner::new(
        config,
        Arc::new(FixedConnector(Arc::new(MockRuntime::new()))),
    );
    let spec = provisioner.spec(&Domain::parse("app.example.com").unwrap());

    assert_eq!(spec.command.last().map(String::as_str), Some("--test-cert"));
}

#[tokio::test]
async fn plain_domain_is_not_provisioned() {
    let mut rt = MockRuntime::new();
    rt.expect_run_to_completion().times(0);
    let provisioner = CertbotProvisioner::new(
        CertificateConfig::default(),
        Arc::new(FixedConnector(Arc::new(rt))),
    );
    let domain = Domain::parse("http://app.example.com").unwrap();

    let result = provisioner
        .issue(&backend(BackendKind::SingleHost), &domain)
        .await;

    assert!(matches!(result, Err(CertError::PlainTransport { .. })));
}

#[tokio::test]
async fn certbot_failure_is_reported() {
    let mut rt = MockRuntime::new();
    rt.expect_run_to_completion()
        .returning(|_| Err(daemon_error()));
    let provisioner = CertbotProvisioner::new(
        CertificateConfig::default(),
        Arc::new(FixedConnector(Arc::new(rt))),
    );
    let domain = Domain::parse("app.example.com").unwrap();

    let result = provisioner
        .issue(&backend(BackendKind::SingleHost), &domain)
        .await;

    assert!(matches!(result, Err(CertError::Certbot { domain, .. }) if domain == "app.example.com"));
}

/// Runtime whose certbot runs take a while and record how many overlap.
#[derive(Default)]
struct ChallengeRuntime {
    active: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl ContainerRuntime for ChallengeRuntime {
    async fn image_exists(&self, _image: &ImageTag) -> Result<bool, DockerError> {
        unreachable!("certbot never looks up images")
    }
    async fn build_image(
        &self,
        _context_dir: &Path,
        _dockerfile: &Path,
        _image: &ImageTag,
        _output: UnboundedSender<String>,
    ) -> Result<(), DockerError> {
        unreachable!("certbot never builds")
    }
    async fn remove_image(&self, _image: &ImageTag) -> Result<Removal, DockerError> {
        unreachable!("certbot never removes images")
    }
    async fn stop_container(&self, _name: &str) -> Result<Removal, DockerError> {
        unreachable!("certbot never stops containers")
    }
    async fn remove_container(&self, _name: &str) -> Result<Removal, DockerError> {
        unreachable!("certbot never removes containers")
    }
    async fn run_container(&self, _spec: &ContainerSpec) -> Result<String, DockerError> {
        unreachable!("certbot runs to completion")
    }
    async fn network_exists(&self, _network: &str) -> Result<bool, DockerError> {
        unreachable!("certbot never inspects networks")
    }
    async fn ensure_network(&self, _network: &str) -> Result<bool, DockerError> {
        unreachable!("certbot never creates networks")
    }
    async fn run_to_completion(&self, _spec: &ContainerSpec) -> Result<String, DockerError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(String::new())
    }
    async fn server_version(&self) -> Result<String, DockerError> {
        unreachable!("certbot never asks for the version")
    }
}

struct SharedConnector(Arc<ChallengeRuntime>);

impl RuntimeConnector for SharedConnector {
    fn connect(&self, _backend: &DestinationBackend) -> Arc<dyn ContainerRuntime> {
        self.0.clone()
    }
}

#[tokio::test]
async fn certbot_runs_on_one_destination_never_overlap() {
    let rt = Arc::new(ChallengeRuntime::default());
    let provisioner = CertbotProvisioner::new(
        CertificateConfig::default(),
        Arc::new(SharedConnector(Arc::clone(&rt))),
    );
    let dest = backend(BackendKind::SingleHost);
    let first = Domain::parse("app.example.com").unwrap();
    let second = Domain::parse("api.example.com").unwrap();

    let (a, b) = tokio::join!(
        provisioner.issue(&dest, &first),
        provisioner.issue(&dest, &second)
    );

    a.unwrap();
    b.unwrap();
    assert_eq!(rt.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn certbot_runs_on_distinct_destinations_proceed_together() {
    let rt = Arc::new(ChallengeRuntime::default());
    let provisioner = CertbotProvisioner::new(
        CertificateConfig::default(),
        Arc::new(SharedConnector(Arc::clone(&rt))),
    );
    let here = backend(BackendKind::SingleHost);
    let there = DestinationBackend {
        id: "dest-2".to_owned(),
        ..backend(BackendKind::SingleHost)
    };
    let domain = Domain::parse("app.example.com").unwrap();

    let (a, b) = tokio::join!(
        provisioner.issue(&here, &domain),
        provisioner.issue(&there, &domain)
    );

    a.unwrap();
    b.unwrap();
    assert_eq!(rt.peak.load(Ordering::SeqCst), 2);
}

// ── Doctor Tests ──

#[tokio::test]
async fn doctor_reports_engine_and_network() {
    let mut rt = MockRuntime::new();
    rt.expect_server_version().returning(|| Ok("27.3.1".to_owned()));
    rt.expect_network_exists().returning(|_| Ok(false));
    let mut report = DoctorReport::default();

    check_runtime(&rt, "dockyard", &mut report).await;

    assert!(report.docker.passed);
    assert!(report.docker.detail.contains("27.3.1"));
    assert!(!report.network.passed);
    assert!(!report.all_passed());
}

#[tokio::test]
async fn doctor_skips_network_when_engine_is_down() {
    let mut rt = MockRuntime::new();
    rt.expect_server_version().returning(|| Err(daemon_error()));
    rt.expect_network_exists().times(0);
    let mut report = DoctorReport::default();

    check_runtime(&rt, "dockyard", &mut report).await;

    assert!(!report.docker.passed);
    assert!(!report.network.passed);
}
