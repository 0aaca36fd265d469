use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a build: `running → {success, failed}`, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Running,
    Success,
    Failed,
}

impl BuildStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BuildStatus::Running)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildStatus::Running => "running",
            BuildStatus::Success => "success",
            BuildStatus::Failed => "failed",
        })
    }
}

/// One orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub id: String,
    pub application_id: String,
    pub destination_id: String,
    pub source_id: String,
    pub status: BuildStatus,
    /// Resolved commit, known once sourcing finished.
    pub revision: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Build {
    pub fn new(
        id: impl Into<String>,
        application_id: impl Into<String>,
        destination_id: impl Into<String>,
        source_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            application_id: application_id.into(),
            destination_id: destination_id.into(),
            source_id: source_id.into(),
            status: BuildStatus::Running,
            revision: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to a terminal status. Terminal builds are immutable.
    pub fn transition(&mut self, to: BuildStatus, now: DateTime<Utc>) -> crate::Result<()> {
        if self.status.is_terminal() || !to.is_terminal() {
            return Err(crate::Error::InvalidTransition {
                build_id: self.id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// Record the resolved revision. Rejected once the build is terminal.
    pub fn set_revision(&mut self, revision: &str, now: DateTime<Utc>) -> crate::Result<()> {
        if self.status.is_terminal() {
            return Err(crate::Error::InvalidTransition {
                build_id: self.id.clone(),
                from: self.status,
                to: self.status,
            });
        }
        self.revision = Some(revision.to_owned());
        self.updated_at = now;
        Ok(())
    }
}

/// A single line of a build's user-visible log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub build_id: String,
    /// Position within the build's log, assigned by the store.
    pub seq: u64,
    pub line: String,
    pub time: DateTime<Utc>,
}
