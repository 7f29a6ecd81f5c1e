//! In-memory host and resolver fakes
//!
//! [`FakeHost`] behaves like a host where starting a unit always leaves it
//! active and stopping it always leaves it inactive, unless a failure has
//! been scripted for that tunnel.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io;

use async_trait::async_trait;
use etherip_sync_common::{DnsLookup, HostController, SyncError, SyncResult, TunnelRecord};

/// One call made against a [`FakeHost`], in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    ListActive,
    StartOrRestart(String),
    Stop(String),
    ReadRecord(String),
    WriteRecord(String, TunnelRecord),
}

/// Scriptable in-memory host
#[derive(Debug, Default)]
pub struct FakeHost {
    /// Names with an active backing unit
    pub active: BTreeSet<String>,
    /// Persisted side-channel records
    pub records: BTreeMap<String, TunnelRecord>,
    /// Every call, in order
    pub calls: Vec<HostCall>,
    fail_list: bool,
    unreadable: BTreeSet<String>,
    fail_write: BTreeSet<String>,
    fail_restart: BTreeSet<String>,
    fail_stop: BTreeSet<String>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an active tunnel with a record
    pub fn with_tunnel(mut self, name: &str, local: &str, remote: &str) -> Self {
        self.active.insert(name.to_string());
        self.records
            .insert(name.to_string(), TunnelRecord::new(local, remote));
        self
    }

    /// Adds an active tunnel whose record file does not exist
    pub fn with_unrecorded_tunnel(mut self, name: &str) -> Self {
        self.active.insert(name.to_string());
        self
    }

    /// Makes the registry query fail
    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    /// Makes reading the record of `name` fail with a permission error
    pub fn unreadable_record(mut self, name: &str) -> Self {
        self.unreadable.insert(name.to_string());
        self
    }

    /// Makes writing the record of `name` fail
    pub fn failing_write(mut self, name: &str) -> Self {
        self.fail_write.insert(name.to_string());
        self
    }

    /// Makes restarting the unit of `name` fail
    pub fn failing_restart(mut self, name: &str) -> Self {
        self.fail_restart.insert(name.to_string());
        self
    }

    /// Makes stopping the unit of `name` fail
    pub fn failing_stop(mut self, name: &str) -> Self {
        self.fail_stop.insert(name.to_string());
        self
    }

    /// Clears the call log, keeping state and scripted failures
    pub fn reset_calls(&mut self) {
        self.calls.clear();
    }

    /// Returns true if any mutating call was made
    pub fn was_mutated(&self) -> bool {
        self.calls.iter().any(|c| {
            matches!(
                c,
                HostCall::StartOrRestart(_) | HostCall::Stop(_) | HostCall::WriteRecord(..)
            )
        })
    }

    fn command_failed(verb: &str, name: &str) -> SyncError {
        SyncError::CommandFailed {
            command: format!("systemctl {} tap-etherip@{}", verb, name),
            exit_code: 1,
            output: format!("scripted {} failure", verb),
        }
    }
}

#[async_trait]
impl HostController for FakeHost {
    async fn list_active_tunnels(&mut self) -> SyncResult<Vec<String>> {
        self.calls.push(HostCall::ListActive);
        if self.fail_list {
            return Err(SyncError::CommandFailed {
                command: "systemctl list-units".to_string(),
                exit_code: 1,
                output: "Failed to connect to bus".to_string(),
            });
        }
        Ok(self.active.iter().cloned().collect())
    }

    async fn start_or_restart(&mut self, name: &str) -> SyncResult<()> {
        self.calls.push(HostCall::StartOrRestart(name.to_string()));
        if self.fail_restart.contains(name) {
            return Err(Self::command_failed("restart", name));
        }
        self.active.insert(name.to_string());
        Ok(())
    }

    async fn stop(&mut self, name: &str) -> SyncResult<()> {
        self.calls.push(HostCall::Stop(name.to_string()));
        if self.fail_stop.contains(name) {
            return Err(Self::command_failed("stop", name));
        }
        self.active.remove(name);
        Ok(())
    }

    async fn read_record(&mut self, name: &str) -> SyncResult<TunnelRecord> {
        self.calls.push(HostCall::ReadRecord(name.to_string()));
        if self.unreadable.contains(name) {
            return Err(SyncError::record_io(
                name,
                io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied"),
            ));
        }
        self.records.get(name).cloned().ok_or_else(|| {
            SyncError::record_io(
                name,
                io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            )
        })
    }

    async fn write_record(&mut self, name: &str, record: &TunnelRecord) -> SyncResult<()> {
        self.calls
            .push(HostCall::WriteRecord(name.to_string(), record.clone()));
        if self.fail_write.contains(name) {
            return Err(SyncError::record_io(
                name,
                io::Error::other("No space left on device"),
            ));
        }
        self.unreadable.remove(name);
        self.records.insert(name.to_string(), record.clone());
        Ok(())
    }
}

/// Resolver answering from a fixed name table
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    answers: HashMap<String, Vec<String>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the AAAA answers for `fqdn`, in the order they are returned
    pub fn with_answer(mut self, fqdn: &str, addrs: &[&str]) -> Self {
        self.answers.insert(
            fqdn.to_string(),
            addrs.iter().map(|a| a.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl DnsLookup for StaticResolver {
    async fn lookup_aaaa(&self, fqdn: &str) -> SyncResult<Vec<String>> {
        match self.answers.get(fqdn) {
            Some(addrs) if !addrs.is_empty() => Ok(addrs.clone()),
            _ => Err(SyncError::resolve(fqdn, "no AAAA record found")),
        }
    }
}
