//! Observed state reconstruction

use etherip_sync_common::{HostController, SyncResult, TunnelRecord};
use tracing::{debug, warn};

use crate::types::TunnelState;

/// Lists the tunnels realized on the host
///
/// A tunnel is observed exactly when its backing unit is active. Its
/// addresses come from its side-channel record; a record that cannot be
/// read leaves them empty so that reconciliation recreates the tunnel.
///
/// # Errors
///
/// Only a failed registry query is returned. Record failures are logged.
pub async fn probe_tunnels<H>(host: &mut H) -> SyncResult<Vec<TunnelState>>
where
    H: HostController + ?Sized,
{
    let names = host.list_active_tunnels().await?;

    let mut tunnels = Vec::with_capacity(names.len());
    for name in names {
        let record = match host.read_record(&name).await {
            Ok(record) => record,
            Err(e) => {
                warn!(name = %name, error = %e, "Record unreadable, treating addresses as unknown");
                TunnelRecord::default()
            }
        };
        tunnels.push(TunnelState::from_record(name, record));
    }

    debug!(tunnels = ?tunnels, "current tunnels");
    Ok(tunnels)
}
