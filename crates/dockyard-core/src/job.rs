use serde::{Deserialize, Serialize};

use crate::application::BuildSettings;
use crate::destination::{DestinationBackend, SourceOrigin};

/// Payload of one queued deployment.
///
/// Field names follow the queue's JSON shape; `id`, `old_domain`,
/// `destination_docker` and `git_source` are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildJob {
    pub build_id: String,
    #[serde(alias = "id")]
    pub application_id: String,
    pub repository: String,
    pub branch: String,
    #[serde(flatten)]
    pub settings: BuildSettings,
    #[serde(alias = "destination_docker")]
    pub destination: DestinationBackend,
    #[serde(alias = "git_source")]
    pub origin: SourceOrigin,
    /// Fingerprint stored on the application when the job was queued.
    #[serde(default)]
    pub config_hash: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, alias = "old_domain")]
    pub previous_domain: Option<String>,
}

impl BuildJob {
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}
