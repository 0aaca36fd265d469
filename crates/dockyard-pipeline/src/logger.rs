use std::sync::Arc;

use chrono::Utc;

use crate::store::BuildStore;

/// Appends user-visible lines to one build's log.
///
/// Every line is mirrored to tracing. A line the store rejects is dropped
/// with a warning; the build goes on.
#[derive(Clone)]
pub struct BuildLogger {
    store: Arc<dyn BuildStore>,
    build_id: String,
}

impl BuildLogger {
    pub fn new(store: Arc<dyn BuildStore>, build_id: impl Into<String>) -> Self {
        Self {
            store,
            build_id: build_id.into(),
        }
    }

    pub async fn line(&self, line: &str) {
        tracing::info!(build_id = %self.build_id, "{line}");
        if let Err(e) = self.store.append_log(&self.build_id, line, Utc::now()).await {
            tracing::warn!(build_id = %self.build_id, error = %e, "failed to append build log line");
        }
    }
}
