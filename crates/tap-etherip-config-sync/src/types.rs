//! Tunnel type definitions

use std::fmt;

use etherip_sync_common::TunnelRecord;
use serde::{Deserialize, Serialize};

/// Desired tunnel, as declared in the resolved document
///
/// Both addresses are literal by the time a spec reaches reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelSpec {
    /// Tunnel name, also the backing unit instance name
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub local_ip_addr: String,
    #[serde(default)]
    pub remote_ip_addr: String,
}

impl TunnelSpec {
    pub fn new(
        name: impl Into<String>,
        local_ip_addr: impl Into<String>,
        remote_ip_addr: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            local_ip_addr: local_ip_addr.into(),
            remote_ip_addr: remote_ip_addr.into(),
        }
    }

    /// Side-channel record to persist for this spec
    pub fn to_record(&self) -> TunnelRecord {
        TunnelRecord::new(&self.local_ip_addr, &self.remote_ip_addr)
    }
}

/// Observed tunnel, rebuilt from the active units and their records
///
/// Empty addresses mean the record was missing or unreadable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TunnelState {
    pub name: String,
    pub local_ip: String,
    pub remote_ip: String,
}

impl TunnelState {
    pub fn new(
        name: impl Into<String>,
        local_ip: impl Into<String>,
        remote_ip: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            local_ip: local_ip.into(),
            remote_ip: remote_ip.into(),
        }
    }

    /// Builds the state of an active tunnel from its record
    pub fn from_record(name: impl Into<String>, record: TunnelRecord) -> Self {
        Self {
            name: name.into(),
            local_ip: record.local,
            remote_ip: record.remote,
        }
    }

    /// Exact, field-for-field address comparison against a spec
    pub fn matches(&self, spec: &TunnelSpec) -> bool {
        self.local_ip == spec.local_ip_addr && self.remote_ip == spec.remote_ip_addr
    }
}

/// What a pass does to one tunnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Noop,
    Create,
    Delete,
    Recreate,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Noop => "noop",
            Action::Create => "create",
            Action::Delete => "delete",
            Action::Recreate => "recreate",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reconciliation decision
///
/// `spec` is set for every action except [`Action::Delete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub name: String,
    pub action: Action,
    pub spec: Option<TunnelSpec>,
}

impl Diff {
    pub fn create(spec: &TunnelSpec) -> Self {
        Self::with_spec(Action::Create, spec)
    }

    pub fn recreate(spec: &TunnelSpec) -> Self {
        Self::with_spec(Action::Recreate, spec)
    }

    pub fn noop(spec: &TunnelSpec) -> Self {
        Self::with_spec(Action::Noop, spec)
    }

    pub fn delete(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: Action::Delete,
            spec: None,
        }
    }

    fn with_spec(action: Action, spec: &TunnelSpec) -> Self {
        Self {
            name: spec.name.clone(),
            action,
            spec: Some(spec.clone()),
        }
    }
}
