//! Tunnel Sync Manager - one reconciliation pass over a host

use etherip_sync_common::{HostController, SyncResult};
use tracing::{debug, error, info};

use crate::executor::ActionExecutor;
use crate::probe::probe_tunnels;
use crate::reconcile::diff_tunnels;
use crate::types::{Action, Diff, TunnelSpec};

/// Result of one diff within a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOutcome {
    pub name: String,
    pub action: Action,
    /// Set when the action was attempted and failed
    pub error: Option<String>,
}

impl DiffOutcome {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Everything a pass decided and how each decision went
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub outcomes: Vec<DiffOutcome>,
    pub dry_run: bool,
}

impl SyncReport {
    /// Number of diffs with the given action, failed or not
    pub fn count(&self, action: Action) -> usize {
        self.outcomes.iter().filter(|o| o.action == action).count()
    }

    /// Diffs whose action failed
    pub fn failed(&self) -> impl Iterator<Item = &DiffOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    /// Returns true if no action failed
    pub fn is_clean(&self) -> bool {
        self.failed().next().is_none()
    }

    /// Logs one summary line for the pass
    pub fn log_summary(&self) {
        let failed: Vec<&str> = self.failed().map(|o| o.name.as_str()).collect();
        if failed.is_empty() {
            info!(
                create = self.count(Action::Create),
                recreate = self.count(Action::Recreate),
                delete = self.count(Action::Delete),
                noop = self.count(Action::Noop),
                dry_run = self.dry_run,
                "reconciliation finished"
            );
        } else {
            error!(
                create = self.count(Action::Create),
                recreate = self.count(Action::Recreate),
                delete = self.count(Action::Delete),
                noop = self.count(Action::Noop),
                failed = ?failed,
                "reconciliation finished with failed tunnels"
            );
        }
    }
}

/// Tunnel Sync Manager
///
/// Probes the host, diffs it against the desired tunnels and applies every
/// diff in order. Only the probe can fail the pass; each action failure is
/// logged and recorded in the [`SyncReport`].
pub struct TunnelSyncMgr<H> {
    host: H,
    dry_run: bool,
}

impl<H: HostController> TunnelSyncMgr<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            dry_run: false,
        }
    }

    /// Log the diff without executing it
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Runs one reconciliation pass
    ///
    /// # Errors
    ///
    /// Returns an error only if observed state could not be probed; no
    /// action has been attempted in that case.
    pub async fn run_pass(&mut self, desired: &[TunnelSpec]) -> SyncResult<SyncReport> {
        let observed = probe_tunnels(&mut self.host).await?;
        let diffs = diff_tunnels(desired, &observed);

        let mut report = SyncReport {
            outcomes: Vec::with_capacity(diffs.len()),
            dry_run: self.dry_run,
        };
        for diff in &diffs {
            report.outcomes.push(self.apply_diff(diff).await);
        }
        Ok(report)
    }

    async fn apply_diff(&mut self, diff: &Diff) -> DiffOutcome {
        debug!(name = %diff.name, action = %diff.action, "device diff");

        let mut outcome = DiffOutcome {
            name: diff.name.clone(),
            action: diff.action,
            error: None,
        };
        if diff.action == Action::Noop {
            return outcome;
        }
        if self.dry_run {
            info!(name = %diff.name, action = %diff.action, "dry run, not applying");
            return outcome;
        }

        match ActionExecutor::new(&mut self.host).apply(diff).await {
            Ok(()) => match diff.action {
                Action::Delete => info!(name = %diff.name, "tunnel deleted"),
                _ => info!(name = %diff.name, action = %diff.action, "tunnel created/recreated"),
            },
            Err(e) => {
                error!(
                    name = %diff.name,
                    action = %diff.action,
                    error = %e,
                    retryable = e.is_retryable(),
                    "failed to apply tunnel action"
                );
                outcome.error = Some(e.to_string());
            }
        }
        outcome
    }
}
