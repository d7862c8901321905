//! Sync engine: read both inventories, plan, apply
//!
//! One call to [`SyncEngine::run`] is one full pass. Every network call is
//! awaited in sequence; nothing is fanned out concurrently.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::error::SyncError;
use crate::inventory::{DirectorySource, MonitoringInventory, SyncResult};
use crate::reconcile::{NameMatching, ReconciliationPlan, Reconciler};
use crate::report::{HostAction, HostOutcome, RunId, SyncReport};

/// What to do when a single create/delete fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyPolicy {
    /// Stop at the first failed write; later writes are never attempted
    #[default]
    #[serde(rename = "abort")]
    AbortOnFirstError,
    /// Attempt every write and report each failure
    #[serde(rename = "continue")]
    ContinueOnError,
}

/// Sync settings (the `[sync]` section of the config file)
///
/// Missing keys fall back to [`SyncSettings::default`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Host group that mirrors the directory
    pub group_name: String,
    /// Template linked to every created host
    pub template_name: String,
    /// Directory host names never added to monitoring
    pub ignored_hosts: Vec<String>,
    pub name_matching: NameMatching,
    pub on_error: ApplyPolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            group_name: "Discovered hosts".to_string(),
            template_name: "Windows by Zabbix agent".to_string(),
            ignored_hosts: Vec::new(),
            name_matching: NameMatching::default(),
            on_error: ApplyPolicy::default(),
        }
    }
}

impl SyncSettings {
    pub fn new(group_name: &str, template_name: &str) -> Self {
        SyncSettings {
            group_name: group_name.to_string(),
            template_name: template_name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_ignored_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_name_matching(mut self, matching: NameMatching) -> Self {
        self.name_matching = matching;
        self
    }

    pub fn with_policy(mut self, policy: ApplyPolicy) -> Self {
        self.on_error = policy;
        self
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.group_name.trim().is_empty() {
            return Err(SyncError::Config("sync.group_name must not be empty".into()));
        }
        if self.template_name.trim().is_empty() {
            return Err(SyncError::Config(
                "sync.template_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

type ProgressFn<'a> = Box<dyn Fn(&HostOutcome) + Send + Sync + 'a>;

/// Drives one directory → monitoring reconciliation
pub struct SyncEngine<'a> {
    directory: &'a dyn DirectorySource,
    inventory: &'a dyn MonitoringInventory,
    settings: SyncSettings,
    reconciler: Reconciler,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        directory: &'a dyn DirectorySource,
        inventory: &'a dyn MonitoringInventory,
        settings: SyncSettings,
    ) -> Self {
        let reconciler = Reconciler::new(&settings.ignored_hosts, settings.name_matching);
        SyncEngine {
            directory,
            inventory,
            settings,
            reconciler,
            progress: None,
        }
    }

    /// Invoke `f` after every attempted write, in order.
    pub fn on_progress(mut self, f: impl Fn(&HostOutcome) + Send + Sync + 'a) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Read both inventories and compute the plan. Returns the resolved group id.
    ///
    /// The monitoring side is read first so a bad token or a missing group
    /// fails before the directory is contacted.
    pub async fn plan(&self) -> SyncResult<(String, ReconciliationPlan)> {
        let group_id = self
            .inventory
            .resolve_group_id(&self.settings.group_name)
            .await?;
        debug!(group = %self.settings.group_name, group_id = %group_id, "Resolved host group");

        let monitored = self.inventory.list_group_hosts(&group_id).await?;
        let discovered = self.directory.list_computer_host_names().await?;
        info!(
            discovered = discovered.len(),
            monitored = monitored.len(),
            "Inventories loaded"
        );

        let plan = self.reconciler.plan(&discovered, &monitored);
        info!(
            to_add = plan.to_add.len(),
            to_remove = plan.to_remove.len(),
            "Reconciliation plan computed"
        );
        Ok((group_id, plan))
    }

    /// Run a full sync. With `dry_run` the plan is computed but nothing is written.
    ///
    /// Read-phase failures are returned as errors; per-host write failures are
    /// recorded in the report according to the configured [`ApplyPolicy`].
    #[instrument(skip(self), fields(group = %self.settings.group_name))]
    pub async fn run(&self, dry_run: bool) -> SyncResult<SyncReport> {
        let run_id = RunId::new();
        let started_at = Utc::now();
        info!(run_id = %run_id, "Starting host sync");

        let (group_id, plan) = self.plan().await?;

        let (outcomes, aborted) = if dry_run || plan.is_empty() {
            (Vec::new(), false)
        } else {
            self.apply(&plan, &group_id).await
        };

        let report = SyncReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            dry_run,
            plan,
            outcomes,
            aborted,
        };
        info!(run_id = %report.run_id, status = ?report.status(), "{}", report.summary());
        Ok(report)
    }

    /// Apply a plan: creates first, then deletes.
    ///
    /// Returns the outcomes in attempt order and whether the batch was cut short.
    pub async fn apply(&self, plan: &ReconciliationPlan, group_id: &str) -> (Vec<HostOutcome>, bool) {
        let policy = self.settings.on_error;
        let mut outcomes = Vec::with_capacity(plan.len());

        if !plan.to_add.is_empty() {
            match self
                .inventory
                .resolve_template_id(&self.settings.template_name)
                .await
            {
                Ok(template_id) => {
                    for host_name in &plan.to_add {
                        let result = self
                            .inventory
                            .create_host(host_name, group_id, &template_id)
                            .await;
                        let outcome = self.record(HostAction::Create, host_name, None, result);
                        if !outcome.succeeded() && policy == ApplyPolicy::AbortOnFirstError {
                            outcomes.push(outcome);
                            return (outcomes, true);
                        }
                        outcomes.push(outcome);
                    }
                }
                Err(err) => {
                    error!(template = %self.settings.template_name, error = %err, "Template lookup failed");
                    // No create can succeed without a template id.
                    for host_name in &plan.to_add {
                        let outcome =
                            self.record(HostAction::Create, host_name, None, Err(err.clone()));
                        outcomes.push(outcome);
                        if policy == ApplyPolicy::AbortOnFirstError {
                            return (outcomes, true);
                        }
                    }
                }
            }
        }

        for host in &plan.to_remove {
            let result = self.inventory.delete_host(&host.host_id).await;
            let outcome = self.record(
                HostAction::Delete,
                &host.host_name,
                Some(&host.host_id),
                result,
            );
            if !outcome.succeeded() && policy == ApplyPolicy::AbortOnFirstError {
                outcomes.push(outcome);
                return (outcomes, true);
            }
            outcomes.push(outcome);
        }

        (outcomes, false)
    }

    fn record(
        &self,
        action: HostAction,
        host_name: &str,
        host_id: Option<&str>,
        result: SyncResult<()>,
    ) -> HostOutcome {
        let error = match result {
            Ok(()) => {
                info!(action = ?action, host = %host_name, host_id = host_id.unwrap_or(""), "Host write applied");
                None
            }
            Err(err) => {
                warn!(action = ?action, host = %host_name, error = %err, "Host write failed");
                Some(err.to_string())
            }
        };
        let outcome = HostOutcome {
            action,
            host_name: host_name.to_string(),
            host_id: host_id.map(str::to_string),
            error,
        };
        if let Some(progress) = &self.progress {
            progress(&outcome);
        }
        outcome
    }
}
