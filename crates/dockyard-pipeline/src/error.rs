use dockyard_build::BuildContextError;

use crate::dispatch::DispatchError;
use crate::source::ImportError;
use crate::store::StoreError;

/// Failures that stop a build.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to record build {build_id}")]
    Store {
        build_id: String,
        source: StoreError,
    },

    #[error("failed to prepare workspace")]
    Workspace { source: BuildContextError },

    #[error("failed to import source")]
    Import { source: ImportError },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// An error and its sources on one line, outermost first.
pub fn describe(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
