//! Host capabilities used by a reconciliation pass.
//!
//! The reconciliation logic only sees these traits. The binary wires them
//! to systemd, the record directory and the system resolver; tests wire
//! them to in-memory fakes.

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::record::TunnelRecord;

/// Inspects and mutates the tunnels realized on a host.
///
/// Implementations are driven sequentially by a single pass, so methods
/// take `&mut self` and need no internal locking.
///
/// # Example
///
/// ```ignore
/// use etherip_sync_common::{HostController, TunnelRecord};
///
/// async fn bounce<H: HostController>(host: &mut H, name: &str) -> SyncResult<()> {
///     let record = host.read_record(name).await?;
///     host.write_record(name, &record).await?;
///     host.start_or_restart(name).await
/// }
/// ```
#[async_trait]
pub trait HostController: Send {
    /// Returns the names of all tunnels whose backing unit is active.
    ///
    /// A failure here means observed state is unknown; callers treat it
    /// as fatal for the pass.
    async fn list_active_tunnels(&mut self) -> SyncResult<Vec<String>>;

    /// Starts the backing unit for `name`, restarting it if it runs.
    async fn start_or_restart(&mut self, name: &str) -> SyncResult<()>;

    /// Stops the backing unit for `name`.
    async fn stop(&mut self, name: &str) -> SyncResult<()>;

    /// Reads the side-channel record for `name`.
    async fn read_record(&mut self, name: &str) -> SyncResult<TunnelRecord>;

    /// Writes the side-channel record for `name`, replacing any previous
    /// content.
    async fn write_record(&mut self, name: &str, record: &TunnelRecord) -> SyncResult<()>;
}

/// Resolves symbolic endpoints to IPv6 addresses.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    /// Returns the IPv6 addresses published for `fqdn`, in resolver order.
    ///
    /// An empty answer is reported as an error, never as `Ok(vec![])`.
    async fn lookup_aaaa(&self, fqdn: &str) -> SyncResult<Vec<String>>;
}
