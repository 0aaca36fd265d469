use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dockyard_core::BuildStatus;

use crate::store::{BuildStore, StoreError};

/// Build ids a process is executing right now.
///
/// Clones share one set. The orchestrator registers each build for as long
/// as it runs; the reaper never fails a build listed here.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `build_id` until the returned guard is dropped.
    pub fn enter(&self, build_id: &str) -> InFlightGuard {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(build_id.to_owned());
        InFlightGuard {
            ids: Arc::clone(&self.ids),
            build_id: build_id.to_owned(),
        }
    }

    pub fn contains(&self, build_id: &str) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(build_id)
    }
}

#[must_use = "the build leaves the in-flight set when the guard drops"]
pub struct InFlightGuard {
    ids: Arc<Mutex<HashSet<String>>>,
    build_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.build_id);
    }
}

/// Fail builds that have been `running` for longer than `max_age`.
///
/// A worker that crashed mid-build leaves its record `running`; this is the
/// sweep that closes it. Builds in `in_flight` are still being executed and
/// are skipped whatever their age. Returns the ids of the builds it failed.
/// A build that reaches a terminal status concurrently is left alone.
pub async fn reap_stale_builds(
    store: &dyn BuildStore,
    in_flight: &InFlight,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<String>, StoreError> {
    let max_age = TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX);
    let mut reaped = Vec::new();

    for build in store.running_builds().await? {
        let age = now.signed_duration_since(build.created_at);
        if age <= max_age {
            continue;
        }
        if in_flight.contains(&build.id) {
            tracing::debug!(build_id = %build.id, age_secs = age.num_seconds(), "long-running build still in flight");
            continue;
        }

        let line = format!(
            "Build marked failed: still running after {}s without finishing.",
            age.num_seconds()
        );
        match store.finish_build(&build.id, BuildStatus::Failed, now).await {
            Ok(()) => {
                if let Err(e) = store.append_log(&build.id, &line, now).await {
                    tracing::warn!(build_id = %build.id, error = %e, "failed to append build log line");
                }
                tracing::warn!(build_id = %build.id, age_secs = age.num_seconds(), "stale build reaped");
                reaped.push(build.id);
            }
            Err(StoreError::Record(e)) => {
                tracing::debug!(build_id = %build.id, error = %e, "build finished before it could be reaped");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(reaped)
}
