use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// dockyard.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockyardConfig {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub certificates: CertificateConfig,
    #[serde(default)]
    pub buildpacks: BuildpackConfig,
}

/// When the orchestrator persists a changed configuration fingerprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FingerprintCommit {
    /// As soon as the change is detected, before building. A failed image
    /// build is retried on the next run since its image is removed; a failed
    /// deploy over a cached image is not, unless the revision changed.
    #[default]
    Eager,
    /// Only once the new instance started.
    AfterDeploy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Parent of every build workspace
    #[serde(default = "default_workdir_root")]
    pub workdir_root: PathBuf,
    /// Builds hosted at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Jobs buffered before `enqueue` waits
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Age after which a `running` build is considered abandoned
    #[serde(default = "default_stale_build_after_secs")]
    pub stale_build_after_secs: u64,
    #[serde(default)]
    pub fingerprint_commit: FingerprintCommit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// docker CLI binary
    #[serde(default = "default_docker_binary")]
    pub docker_binary: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Data Plane API base URL
    #[serde(default = "default_proxy_url")]
    pub url: String,
    /// Path prefix of the HAProxy service endpoints
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_proxy_username")]
    pub username: String,
    /// Environment variable consulted before `password`
    #[serde(default = "default_password_env")]
    pub password_env: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default = "default_proxy_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateConfig {
    /// certbot image
    #[serde(default = "default_certbot_image")]
    pub image: String,
    /// Host port the standalone HTTP challenge listener binds
    #[serde(default = "default_challenge_port")]
    pub http_port: u16,
    /// Directory shared with the proxy, mounted into the certbot container
    #[serde(default = "default_cert_config_dir")]
    pub config_dir: String,
    #[serde(default = "default_cert_work_dir")]
    pub work_dir: String,
    /// Issue from the CA's staging environment
    #[serde(default)]
    pub staging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildpackConfig {
    /// Image the Node.js buildpack (and the static build stage) builds on
    #[serde(default = "default_node_image")]
    pub node_image: String,
    /// Image serving static files
    #[serde(default = "default_static_image")]
    pub static_image: String,
    /// Build output copied into the static image when a build command is set
    #[serde(default = "default_static_output_dir")]
    pub static_output_dir: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workdir_root: default_workdir_root(),
            concurrency: default_concurrency(),
            queue_capacity: default_queue_capacity(),
            stale_build_after_secs: default_stale_build_after_secs(),
            fingerprint_commit: FingerprintCommit::default(),
        }
    }
}

impl WorkerConfig {
    pub fn stale_build_after(&self) -> Duration {
        Duration::from_secs(self.stale_build_after_secs)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            docker_binary: default_docker_binary(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            url: default_proxy_url(),
            api_prefix: default_api_prefix(),
            username: default_proxy_username(),
            password_env: default_password_env(),
            password: None,
            timeout_secs: default_proxy_timeout_secs(),
        }
    }
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("url", &self.url)
            .field("api_prefix", &self.api_prefix)
            .field("username", &self.username)
            .field("password_env", &self.password_env)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ProxyConfig {
    /// Resolve the Data Plane API password from the process environment.
    pub fn password(&self) -> crate::Result<SecretString> {
        self.password_with(|key| std::env::var(key).ok())
    }

    /// Resolve the password with a custom environment lookup.
    ///
    /// The environment wins over the file; blank values count as unset.
    pub fn password_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> crate::Result<SecretString> {
        lookup(&self.password_env)
            .filter(|p| !p.trim().is_empty())
            .or_else(|| self.password.clone().filter(|p| !p.trim().is_empty()))
            .map(SecretString::from)
            .ok_or_else(|| crate::Error::MissingProxyPassword {
                env_var: self.password_env.clone(),
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            image: default_certbot_image(),
            http_port: default_challenge_port(),
            config_dir: default_cert_config_dir(),
            work_dir: default_cert_work_dir(),
            staging: false,
        }
    }
}

impl Default for BuildpackConfig {
    fn default() -> Self {
        Self {
            node_image: default_node_image(),
            static_image: default_static_image(),
            static_output_dir: default_static_output_dir(),
        }
    }
}

impl DockyardConfig {
    /// Load from dockyard.toml in the given directory, or return defaults if not found.
    pub fn load(dir: &Path) -> crate::Result<Self> {
        let config_path = dir.join("dockyard.toml");
        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })
        } else {
            tracing::debug!(path = %config_path.display(), "no dockyard.toml, using defaults");
            Ok(Self::default())
        }
    }
}

fn default_workdir_root() -> PathBuf {
    PathBuf::from("/tmp/build-sources")
}

fn default_concurrency() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    64
}

fn default_stale_build_after_secs() -> u64 {
    3600
}

fn default_docker_binary() -> String {
    "docker".to_owned()
}

fn default_proxy_url() -> String {
    "http://dockyard-haproxy:5555".to_owned()
}

fn default_api_prefix() -> String {
    "v2/services/haproxy".to_owned()
}

fn default_proxy_username() -> String {
    "haproxy-dataplaneapi".to_owned()
}

fn default_password_env() -> String {
    "DOCKYARD_PROXY_PASSWORD".to_owned()
}

fn default_proxy_timeout_secs() -> u64 {
    30
}

fn default_certbot_image() -> String {
    "certbot/certbot".to_owned()
}

fn default_challenge_port() -> u16 {
    9080
}

fn default_cert_config_dir() -> String {
    "/usr/local/etc/haproxy/".to_owned()
}

fn default_cert_work_dir() -> String {
    "/usr/local/etc/haproxy/ssl".to_owned()
}

fn default_node_image() -> String {
    "node:lts".to_owned()
}

fn default_static_image() -> String {
    "nginx:stable-alpine".to_owned()
}

fn default_static_output_dir() -> String {
    "dist".to_owned()
}
