//! Reconciliation of directory computers against monitored hosts
//!
//! Produces a [`ReconciliationPlan`]: which directory names must be created in
//! the monitoring group, and which monitored hosts no longer exist in the
//! directory. Host names from both sides are compared under a single
//! [`NameMatching`] policy; the ignore list is compared under the same policy.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inventory::MonitoredHost;

/// How host names from the directory and the monitoring system are compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameMatching {
    /// Byte-for-byte comparison
    Exact,
    /// ASCII case folding with trailing dots stripped (`Web01.corp.` == `web01.corp`)
    #[default]
    Normalized,
}

impl NameMatching {
    /// Comparison key for a host name under this policy.
    pub fn key(self, name: &str) -> String {
        match self {
            NameMatching::Exact => name.to_string(),
            NameMatching::Normalized => name.trim_end_matches('.').to_ascii_lowercase(),
        }
    }
}

/// The set of changes that brings the monitoring group in line with the directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    /// Directory host names to create, in directory order
    pub to_add: Vec<String>,
    /// Monitored hosts to delete, in monitoring order
    pub to_remove: Vec<MonitoredHost>,
}

impl ReconciliationPlan {
    /// True when the inventories already agree.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Total number of writes the plan requires.
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }
}

/// Computes reconciliation plans under a fixed ignore list and matching policy
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    matching: NameMatching,
    ignored: HashSet<String>,
}

impl Reconciler {
    pub fn new<I, S>(ignored: I, matching: NameMatching) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ignored = ignored
            .into_iter()
            .map(|name| matching.key(name.as_ref()))
            .collect();
        Reconciler { matching, ignored }
    }

    /// Whether a directory host name is excluded from sync.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(&self.matching.key(name))
    }

    /// Compute the plan for one directory listing and one monitoring listing.
    ///
    /// - Ignored and empty directory names are dropped first.
    /// - `to_add` keeps directory order and lists each name once.
    /// - `to_remove` keeps monitoring order and is checked against the
    ///   filtered directory names, so an ignored computer that is still
    ///   monitored gets removed.
    pub fn plan(
        &self,
        directory_hosts: &[String],
        monitoring_hosts: &[MonitoredHost],
    ) -> ReconciliationPlan {
        let wanted: Vec<(&String, String)> = directory_hosts
            .iter()
            .filter_map(|name| {
                let key = self.matching.key(name);
                if key.is_empty() {
                    debug!("Skipping empty directory host name");
                    None
                } else if self.ignored.contains(&key) {
                    debug!(host = %name, "Skipping ignored host");
                    None
                } else {
                    Some((name, key))
                }
            })
            .collect();

        let monitored: HashSet<String> = monitoring_hosts
            .iter()
            .map(|host| self.matching.key(&host.host_name))
            .collect();

        let mut queued = HashSet::new();
        let mut to_add = Vec::new();
        for (name, key) in &wanted {
            if !monitored.contains(key) && queued.insert(key.as_str()) {
                to_add.push((*name).clone());
            }
        }

        let wanted_keys: HashSet<&str> = wanted.iter().map(|(_, key)| key.as_str()).collect();
        let to_remove = monitoring_hosts
            .iter()
            .filter(|host| !wanted_keys.contains(self.matching.key(&host.host_name).as_str()))
            .cloned()
            .collect();

        ReconciliationPlan { to_add, to_remove }
    }
}

/// Compute a plan with the default matching policy.
pub fn plan<S: AsRef<str>>(
    directory_hosts: &[String],
    monitoring_hosts: &[MonitoredHost],
    ignore_list: &[S],
) -> ReconciliationPlan {
    Reconciler::new(ignore_list, NameMatching::default()).plan(directory_hosts, monitoring_hosts)
}
