//! Applies reconciliation decisions to the host

use etherip_sync_common::{HostController, SyncError, SyncResult};
use tracing::debug;

use crate::types::{Action, Diff};

/// Executes one [`Diff`] at a time against a host
///
/// Failures are returned for the single diff; callers decide whether to
/// go on with the next one.
pub struct ActionExecutor<'a, H: ?Sized> {
    host: &'a mut H,
}

impl<'a, H> ActionExecutor<'a, H>
where
    H: HostController + ?Sized,
{
    pub fn new(host: &'a mut H) -> Self {
        Self { host }
    }

    /// Applies `diff`
    ///
    /// * create / recreate: write the record, then restart the unit. An
    ///   address that would not read back from the record is refused
    ///   before anything is touched. A failed write skips the restart. A failed restart leaves the new
    ///   record in place for the next pass.
    /// * delete: stop the unit; the record is left behind.
    /// * noop: nothing.
    pub async fn apply(&mut self, diff: &Diff) -> SyncResult<()> {
        match diff.action {
            Action::Create | Action::Recreate => {
                let spec = diff.spec.as_ref().ok_or_else(|| {
                    SyncError::internal(format!(
                        "{} diff for tunnel {} carries no spec",
                        diff.action, diff.name
                    ))
                })?;
                let record = spec.to_record();
                record.validate()?;
                self.host.write_record(&diff.name, &record).await?;
                debug!(name = %diff.name, "record written");
                self.host.start_or_restart(&diff.name).await
            }
            Action::Delete => self.host.stop(&diff.name).await,
            Action::Noop => Ok(()),
        }
    }
}
