//! Common infrastructure for the EtherIP tunnel config sync tools.
//!
//! This crate holds the host-facing plumbing that the reconciliation
//! logic in `tap-etherip-config-sync` is written against:
//!
//! - [`process`]: External command execution
//! - [`host`]: The [`HostController`] and [`DnsLookup`] capabilities
//! - [`record`]: The per-tunnel side-channel record format
//! - [`error`]: Error types shared by every layer
//!
//! # Architecture
//!
//! A reconciliation pass never touches the host directly. It goes through
//! a [`HostController`], which the binary backs with systemd and a record
//! directory, and which tests back with an in-memory fake:
//!
//! 1. List the active `<prefix>@<name>.service` units
//! 2. Read each tunnel's side-channel record
//! 3. Write records and restart or stop units for the computed diff
//!
//! # Example
//!
//! ```ignore
//! use etherip_sync_common::{
//!     process::{self, SYSTEMCTL_CMD},
//!     error::SyncResult,
//! };
//!
//! async fn restart(unit: &str) -> SyncResult<()> {
//!     process::exec_or_throw(SYSTEMCTL_CMD, &["restart", unit]).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod host;
pub mod process;
pub mod record;

// Re-export commonly used items at crate root
pub use error::{SyncError, SyncResult};
pub use host::{DnsLookup, HostController};
pub use record::TunnelRecord;
