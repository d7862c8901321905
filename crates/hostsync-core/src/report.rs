//! Outcome of a sync run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reconcile::ReconciliationPlan;

/// Unique identifier for a sync run, used to correlate log lines
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        RunId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Write performed against the monitoring system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostAction {
    Create,
    Delete,
}

/// Result of one attempted write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostOutcome {
    pub action: HostAction,
    pub host_name: String,
    /// Monitoring id of the host (deletes only)
    pub host_id: Option<String>,
    /// Error message when the write failed
    pub error: Option<String>,
}

impl HostOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Operator-facing progress line.
    pub fn describe(&self) -> String {
        match (self.action, &self.error) {
            (HostAction::Create, None) => {
                format!("Host '{}' created successfully.", self.host_name)
            }
            (HostAction::Delete, None) => format!(
                "Host with ID {} removed successfully.",
                self.host_id.as_deref().unwrap_or("?")
            ),
            (HostAction::Create, Some(err)) => {
                format!("Failed to create host '{}': {}", self.host_name, err)
            }
            (HostAction::Delete, Some(err)) => format!(
                "Failed to remove host '{}' (ID {}): {}",
                self.host_name,
                self.host_id.as_deref().unwrap_or("?"),
                err
            ),
        }
    }
}

/// Overall classification of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Inventories already agreed (or dry run with an empty plan)
    NothingToDo,
    /// Every planned write succeeded, or a dry run produced a plan
    Success,
    /// Some writes succeeded, at least one failed and the run kept going
    Partial,
    /// The run was aborted, or every write failed
    Failed,
}

/// Full record of a sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub plan: ReconciliationPlan,
    pub outcomes: Vec<HostOutcome>,
    /// Set when the apply phase stopped before attempting every write
    pub aborted: bool,
}

impl SyncReport {
    pub fn created(&self) -> usize {
        self.count(HostAction::Create, true)
    }

    pub fn removed(&self) -> usize {
        self.count(HostAction::Delete, true)
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded()).count()
    }

    /// Planned writes never attempted because the run aborted.
    pub fn skipped(&self) -> usize {
        self.plan.len().saturating_sub(self.outcomes.len())
    }

    fn count(&self, action: HostAction, ok: bool) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.action == action && o.succeeded() == ok)
            .count()
    }

    pub fn status(&self) -> SyncStatus {
        if self.plan.is_empty() {
            return SyncStatus::NothingToDo;
        }
        if self.dry_run {
            return SyncStatus::Success;
        }
        let failed = self.failed();
        if self.aborted || (failed > 0 && failed == self.outcomes.len()) {
            SyncStatus::Failed
        } else if failed > 0 {
            SyncStatus::Partial
        } else {
            SyncStatus::Success
        }
    }

    /// One-line summary for logs and terminal output.
    pub fn summary(&self) -> String {
        if self.dry_run {
            return format!(
                "dry run: {} to add, {} to remove",
                self.plan.to_add.len(),
                self.plan.to_remove.len()
            );
        }
        format!(
            "{} created, {} removed, {} failed, {} skipped",
            self.created(),
            self.removed(),
            self.failed(),
            self.skipped()
        )
    }
}
