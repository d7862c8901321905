//! hostsync-core: directory-to-monitoring reconciliation
//!
//! This crate owns the domain of hostsync: the inventory seams, the
//! reconciliation algorithm and the sync engine that applies its result.
//! Backends live in their own crates (`zabbix-rpc`, `ldap-inventory`) and
//! plug in through the traits defined here.
//!
//! ## Key Components
//!
//! - `DirectorySource` / `MonitoringInventory`: the two sides of a sync
//! - `Reconciler`: computes a `ReconciliationPlan` under a `NameMatching` policy
//! - `SyncEngine`: reads, plans and applies under an `ApplyPolicy`
//! - `SyncReport`: per-host outcomes and the overall `SyncStatus`

pub mod engine;
mod error;
pub mod fakes;
pub mod inventory;
pub mod reconcile;
pub mod report;
pub mod telemetry;

pub use engine::{ApplyPolicy, SyncEngine, SyncSettings};
pub use error::{RemoteFault, SyncError};
pub use inventory::{DirectorySource, MonitoredHost, MonitoringInventory, SyncResult};
pub use reconcile::{plan, NameMatching, ReconciliationPlan, Reconciler};
pub use report::{HostAction, HostOutcome, RunId, SyncReport, SyncStatus};
pub use telemetry::init_tracing;
