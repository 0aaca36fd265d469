//! Reverse-proxy reconciliation for dockyard.
//!
//! # Transaction
//!
//! ```text
//! ProxyReconciler::reconcile
//!   1. GET    configuration/raw              → _version
//!   2. POST   transactions?version=N         → transaction id
//!   3. DELETE configuration/backends/<domain>           (if present)
//!   4. DELETE configuration/backends/<previous domain>  (if pending)
//!   5. POST   configuration/backends         { name, forwardfor }
//!   6. POST   configuration/servers          { name, address, port, check }
//!   7. PUT    transactions/<id>              commit
//!      on failure after 2: DELETE transactions/<id>
//! ```
//!
//! A second transaction opened against a stale version fails at commit;
//! the proxy never sees a half-applied change.

pub mod api;
pub mod error;
pub mod haproxy;
pub mod reconcile;

pub use api::{DataPlaneApi, ServerEntry};
pub use error::ProxyError;
pub use haproxy::HaproxyClient;
pub use reconcile::{ProxyReconciler, ReconcileOutcome, Route};
