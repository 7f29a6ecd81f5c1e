//! EtherIP tunnel config sync - declared tunnels to systemd units
//!
//! Drives a host toward a declared set of point-to-point EtherIP tunnels,
//! each realized by an instance of the `tap-etherip@` systemd template:
//! - Optional DNS pre-pass turning endpoint names into IPv6 addresses
//! - Observed state rebuilt from active units and per-tunnel records
//! - Pure diff into create / recreate / delete / noop decisions
//! - Record writes and unit restarts or stops per decision

pub mod commands;
pub mod config;
pub mod executor;
pub mod logging;
pub mod probe;
pub mod reconcile;
pub mod resolve;
pub mod sync_mgr;
pub mod systemd;
pub mod types;
pub mod units;

pub use config::{Conf, ConfWithDns, SyncConfig};
pub use resolve::{AddressResolver, SystemResolver};
pub use sync_mgr::{SyncReport, TunnelSyncMgr};
pub use systemd::SystemdHost;
pub use types::{Action, Diff, TunnelSpec, TunnelState};
