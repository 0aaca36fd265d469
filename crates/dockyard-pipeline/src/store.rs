use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dockyard_core::{Application, Build, BuildStatus, Fingerprint, LogLine};

/// Persistence the pipeline reads and writes.
///
/// Build records and their log lines are owned by the pipeline; application
/// records are shared with whatever manages configuration, so the pipeline
/// only touches the two fields it is responsible for.
#[async_trait]
pub trait BuildStore: Send + Sync {
    /// Persist a new build. Build ids are unique.
    async fn create_build(&self, build: &Build) -> Result<(), StoreError>;

    async fn find_build(&self, id: &str) -> Result<Option<Build>, StoreError>;

    async fn set_build_revision(
        &self,
        id: &str,
        revision: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Move a build to a terminal status.
    async fn finish_build(
        &self,
        id: &str,
        status: BuildStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Append one line to a build's log and return it with its position.
    async fn append_log(
        &self,
        build_id: &str,
        line: &str,
        time: DateTime<Utc>,
    ) -> Result<LogLine, StoreError>;

    /// A build's log in append order.
    async fn build_logs(&self, build_id: &str) -> Result<Vec<LogLine>, StoreError>;

    async fn find_application(&self, id: &str) -> Result<Option<Application>, StoreError>;

    async fn save_application(&self, application: &Application) -> Result<(), StoreError>;

    async fn save_config_hash(
        &self,
        application_id: &str,
        hash: &Fingerprint,
    ) -> Result<(), StoreError>;

    /// Drop the pending-cleanup record once the old route is retired.
    async fn clear_previous_domain(&self, application_id: &str) -> Result<(), StoreError>;

    async fn running_builds(&self) -> Result<Vec<Build>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("build '{0}' already exists")]
    DuplicateBuild(String),

    #[error(transparent)]
    Record(#[from] dockyard_core::Error),
}

// ── In-memory store ──

#[derive(Debug, Default)]
struct Tables {
    builds: HashMap<String, Build>,
    logs: HashMap<String, Vec<LogLine>>,
    applications: HashMap<String, Application>,
}

/// [`BuildStore`] held in process memory.
///
/// Used by the CLI for one-shot runs and by tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut tables)
    }
}

fn build_not_found(id: &str) -> StoreError {
    StoreError::NotFound {
        kind: "build",
        id: id.to_owned(),
    }
}

fn application_not_found(id: &str) -> StoreError {
    StoreError::NotFound {
        kind: "application",
        id: id.to_owned(),
    }
}

#[async_trait]
impl BuildStore for MemoryStore {
    async fn create_build(&self, build: &Build) -> Result<(), StoreError> {
        self.with_tables(|t| {
            if t.builds.contains_key(&build.id) {
                return Err(StoreError::DuplicateBuild(build.id.clone()));
            }
            t.builds.insert(build.id.clone(), build.clone());
            Ok(())
        })
    }

    async fn find_build(&self, id: &str) -> Result<Option<Build>, StoreError> {
        Ok(self.with_tables(|t| t.builds.get(id).cloned()))
    }

    async fn set_build_revision(
        &self,
        id: &str,
        revision: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.with_tables(|t| {
            let build = t.builds.get_mut(id).ok_or_else(|| build_not_found(id))?;
            build.set_revision(revision, now)?;
            Ok(())
        })
    }

    async fn finish_build(
        &self,
        id: &str,
        status: BuildStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.with_tables(|t| {
            let build = t.builds.get_mut(id).ok_or_else(|| build_not_found(id))?;
            build.transition(status, now)?;
            Ok(())
        })
    }

    async fn append_log(
        &self,
        build_id: &str,
        line: &str,
        time: DateTime<Utc>,
    ) -> Result<LogLine, StoreError> {
        self.with_tables(|t| {
            if !t.builds.contains_key(build_id) {
                return Err(build_not_found(build_id));
            }
            let lines = t.logs.entry(build_id.to_owned()).or_default();
            let entry = LogLine {
                build_id: build_id.to_owned(),
                seq: lines.len() as u64,
                line: line.to_owned(),
                time,
            };
            lines.push(entry.clone());
            Ok(entry)
        })
    }

    async fn build_logs(&self, build_id: &str) -> Result<Vec<LogLine>, StoreError> {
        Ok(self.with_tables(|t| t.logs.get(build_id).cloned().unwrap_or_default()))
    }

    async fn find_application(&self, id: &str) -> Result<Option<Application>, StoreError> {
        Ok(self.with_tables(|t| t.applications.get(id).cloned()))
    }

    async fn save_application(&self, application: &Application) -> Result<(), StoreError> {
        self.with_tables(|t| {
            t.applications
                .insert(application.id.clone(), application.clone());
        });
        Ok(())
    }

    async fn save_config_hash(
        &self,
        application_id: &str,
        hash: &Fingerprint,
    ) -> Result<(), StoreError> {
        self.with_tables(|t| {
            let app = t
                .applications
                .get_mut(application_id)
                .ok_or_else(|| application_not_found(application_id))?;
            app.config_hash = Some(hash.as_str().to_owned());
            Ok(())
        })
    }

    async fn clear_previous_domain(&self, application_id: &str) -> Result<(), StoreError> {
        self.with_tables(|t| {
            let app = t
                .applications
                .get_mut(application_id)
                .ok_or_else(|| application_not_found(application_id))?;
            app.previous_domain = None;
            Ok(())
        })
    }

    async fn running_builds(&self) -> Result<Vec<Build>, StoreError> {
        let mut running: Vec<Build> = self.with_tables(|t| {
            t.builds
                .values()
                .filter(|b| b.status == BuildStatus::Running)
                .cloned()
                .collect()
        });
        running.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(running)
    }
}
