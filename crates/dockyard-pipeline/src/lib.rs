//! Build-and-deploy orchestration for dockyard.
//!
//! # Pipeline
//!
//! ```text
//! BuildQueue ──► WorkerPool ──► Orchestrator::run(job)
//!   1. Build record      running
//!   2. Workspace         <workdir_root>/<repository>/<build id>
//!   3. Source            SourceImporter::import → revision            (fatal)
//!   4. Fingerprint       settings + buildpack defaults vs stored hash
//!   5. Image cache       <app id>:<revision[..7]> on the destination
//!   6. Build             only on a miss or a changed fingerprint       (fatal)
//!   7. Deploy            replace the instance named <app id>  ┐ per-app lock
//!   8. Proxy             transactional backend/server swap    ┘
//!   9. Certificate       standalone challenge, https domains only
//!  10. Build record      success | failed; workspace removed
//! ```
//!
//! Stages 7 to 9 degrade: a failure there is logged to the build and the
//! build still succeeds. Everything the orchestrator talks to is injected
//! through [`Collaborators`].

pub mod dispatch;
pub mod error;
pub mod logger;
pub mod orchestrator;
pub mod queue;
pub mod reaper;
pub mod source;
pub mod store;

pub use dispatch::{BuildDispatcher, DispatchError};
pub use error::{PipelineError, describe};
pub use logger::BuildLogger;
pub use orchestrator::{BuildOutcome, Collaborators, Orchestrator, Stage};
pub use queue::{BuildQueue, JobRunner, QueueClosed, WorkerPool};
pub use reaper::{InFlight, InFlightGuard, reap_stale_builds};
pub use source::{GitImporter, ImportError, SourceImporter};
pub use store::{BuildStore, MemoryStore, StoreError};
