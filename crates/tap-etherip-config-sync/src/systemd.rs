//! systemd-backed host controller
//!
//! Backing units are instances of a systemd template, `<prefix>@<name>`.
//! Records live as one file per tunnel under the env base path, the same
//! file the template loads as its `EnvironmentFile`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use etherip_sync_common::process::{self, SYSTEMCTL_CMD};
use etherip_sync_common::{HostController, SyncError, SyncResult, TunnelRecord};
use tracing::{debug, info, warn};

use crate::commands::*;
use crate::units::tunnel_name_from_unit;

/// Host controller driving `systemctl` and the record directory
pub struct SystemdHost {
    /// Template name of the backing units
    unit_prefix: String,

    /// Directory of the side-channel records
    env_base_path: PathBuf,

    #[cfg(test)]
    mock_mode: bool,

    #[cfg(test)]
    mock_listing: String,

    #[cfg(test)]
    captured_commands: Vec<String>,
}

impl SystemdHost {
    pub fn new(unit_prefix: impl Into<String>, env_base_path: impl Into<PathBuf>) -> Self {
        let host = Self {
            unit_prefix: unit_prefix.into(),
            env_base_path: env_base_path.into(),
            #[cfg(test)]
            mock_mode: false,
            #[cfg(test)]
            mock_listing: String::new(),
            #[cfg(test)]
            captured_commands: Vec::new(),
        };
        info!(
            unit_prefix = %host.unit_prefix,
            env_base_path = %host.env_base_path.display(),
            "SystemdHost initialized"
        );
        host
    }

    /// Mock host: commands are captured and answered with `listing`
    #[cfg(test)]
    pub fn new_mock(
        unit_prefix: impl Into<String>,
        env_base_path: impl Into<PathBuf>,
        listing: &str,
    ) -> Self {
        let mut host = Self::new(unit_prefix, env_base_path);
        host.mock_mode = true;
        host.mock_listing = listing.to_string();
        host
    }

    pub fn unit_prefix(&self) -> &str {
        &self.unit_prefix
    }

    pub fn env_base_path(&self) -> &Path {
        &self.env_base_path
    }

    /// Run systemctl (or capture the command line in mock mode)
    async fn systemctl(&mut self, args: &[String]) -> SyncResult<String> {
        #[cfg(test)]
        if self.mock_mode {
            self.captured_commands
                .push(process::command_line(SYSTEMCTL_CMD, args));
            return Ok(self.mock_listing.clone());
        }

        process::exec_or_throw(SYSTEMCTL_CMD, args).await
    }

    /// Path of the record for `name`
    ///
    /// Names are used as file names verbatim, so anything that would leave
    /// the record directory is refused.
    pub fn record_path(&self, name: &str) -> SyncResult<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            return Err(SyncError::invalid_config(
                "name",
                format!("'{}' is not usable as a record file name", name),
            ));
        }
        Ok(self.env_base_path.join(name))
    }

    #[cfg(test)]
    pub fn get_captured_commands(&self) -> &[String] {
        &self.captured_commands
    }
}

/// Extracts tunnel names from `systemctl list-units` output
///
/// Only the first token of each line is looked at:
///
/// ```text
/// tap-etherip@64496-1.service loaded active running Dummy EtherIP Service
/// ```
pub fn parse_unit_listing(prefix: &str, listing: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in listing.lines() {
        let Some(unit) = line.split_whitespace().next() else {
            continue;
        };
        match tunnel_name_from_unit(prefix, unit) {
            Some(name) => names.push(name.to_string()),
            None => warn!(unit = %unit, "Skipping unit that does not name a tunnel"),
        }
    }
    names
}

#[async_trait]
impl HostController for SystemdHost {
    async fn list_active_tunnels(&mut self) -> SyncResult<Vec<String>> {
        let args = build_list_units_args(&self.unit_prefix);
        let listing = self.systemctl(&args).await?;
        Ok(parse_unit_listing(&self.unit_prefix, &listing))
    }

    async fn start_or_restart(&mut self, name: &str) -> SyncResult<()> {
        let args = build_restart_args(&self.unit_prefix, name);
        self.systemctl(&args).await?;
        Ok(())
    }

    async fn stop(&mut self, name: &str) -> SyncResult<()> {
        let args = build_stop_args(&self.unit_prefix, name);
        self.systemctl(&args).await?;
        Ok(())
    }

    async fn read_record(&mut self, name: &str) -> SyncResult<TunnelRecord> {
        let path = self.record_path(name)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| SyncError::record_io(path.display().to_string(), e))?;
        let content = String::from_utf8(bytes).map_err(|e| {
            SyncError::record_parse(path.display().to_string(), format!("not UTF-8: {}", e))
        })?;
        Ok(TunnelRecord::parse(&content))
    }

    async fn write_record(&mut self, name: &str, record: &TunnelRecord) -> SyncResult<()> {
        let path = self.record_path(name)?;
        record.validate()?;
        tokio::fs::write(&path, record.render())
            .await
            .map_err(|e| SyncError::record_io(path.display().to_string(), e))?;
        debug!(name = %name, path = %path.display(), "record file written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync_mgr::TunnelSyncMgr;
    use crate::types::{Action, TunnelSpec};

    const LISTING: &str = "\
tap-etherip@64496-1.service loaded active running Dummy EtherIP Service for E2E Test
tap-etherip@64496-2.service loaded active running Dummy EtherIP Service for E2E Test
";

    #[test]
    fn test_parse_unit_listing() {
        assert_eq!(
            parse_unit_listing("tap-etherip", LISTING),
            vec!["64496-1", "64496-2"]
        );
    }

    #[test]
    fn test_parse_unit_listing_skips_foreign_lines() {
        let listing = "\n   \nsshd.service loaded active running OpenSSH\ntap-etherip@t1.service loaded active running x\n";
        assert_eq!(parse_unit_listing("tap-etherip", listing), vec!["t1"]);
    }

    #[tokio::test]
    async fn test_list_active_tunnels() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = SystemdHost::new_mock("tap-etherip", dir.path(), LISTING);

        let names = host.list_active_tunnels().await.unwrap();
        assert_eq!(names, vec!["64496-1", "64496-2"]);

        let cmds = host.get_captured_commands();
        assert_eq!(cmds.len(), 1);
        assert_eq!(
            cmds[0],
            "systemctl list-units --type=service --state=active --no-legend --plain tap-etherip@*.service"
        );
    }

    #[tokio::test]
    async fn test_unit_lifecycle_commands() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = SystemdHost::new_mock("tap-etherip", dir.path(), "");

        host.start_or_restart("t1").await.unwrap();
        host.stop("t2").await.unwrap();

        let cmds = host.get_captured_commands();
        assert_eq!(cmds[0], "systemctl restart tap-etherip@t1");
        assert_eq!(cmds[1], "systemctl stop tap-etherip@t2");
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let listing = "etherip-test@a.service loaded active running x\ntap-etherip@b.service loaded active running x\n";
        let mut host = SystemdHost::new_mock("etherip-test", dir.path(), listing);

        assert_eq!(host.list_active_tunnels().await.unwrap(), vec!["a"]);
        host.start_or_restart("a").await.unwrap();
        assert_eq!(host.get_captured_commands()[1], "systemctl restart etherip-test@a");
    }

    #[tokio::test]
    async fn test_record_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = SystemdHost::new_mock("tap-etherip", dir.path(), "");
        let record = TunnelRecord::new("2001:db8::1", "2001:db8::2");

        host.write_record("t1", &record).await.unwrap();

        let content = std::fs::read_to_string(dir.path().join("t1")).unwrap();
        assert_eq!(content, "LOCAL=2001:db8::1\nREMOTE=2001:db8::2\n");
        assert_eq!(host.read_record("t1").await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_record_write_truncates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("t1"),
            "LOCAL=2001:db8::99\nREMOTE=2001:db8::98\nEXTRA=a-much-longer-line-than-the-new-content\n",
        )
        .unwrap();
        let mut host = SystemdHost::new_mock("tap-etherip", dir.path(), "");

        host.write_record("t1", &TunnelRecord::new("a", "b"))
            .await
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("t1")).unwrap();
        assert_eq!(content, "LOCAL=a\nREMOTE=b\n");
    }

    #[tokio::test]
    async fn test_record_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = SystemdHost::new_mock("tap-etherip", dir.path(), "");

        let err = host.read_record("t1").await.unwrap_err();
        assert!(matches!(err, SyncError::RecordIo { .. }));
    }

    #[tokio::test]
    async fn test_record_not_utf8() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("t1"), b"\xff\xfe\x00").unwrap();
        let mut host = SystemdHost::new_mock("tap-etherip", dir.path(), "");

        let err = host.read_record("t1").await.unwrap_err();
        assert!(matches!(err, SyncError::RecordParse { .. }));
    }

    #[tokio::test]
    async fn test_record_write_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = SystemdHost::new_mock("tap-etherip", dir.path().join("absent"), "");

        let err = host
            .write_record("t1", &TunnelRecord::new("a", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::RecordIo { .. }));
    }

    #[tokio::test]
    async fn test_record_write_refuses_unparsable_address() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = SystemdHost::new_mock("tap-etherip", dir.path(), "");

        let err = host
            .write_record("t1", &TunnelRecord::new("2001:db8::1 ", "2001:db8::2"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidConfig { .. }));
        assert!(!dir.path().join("t1").exists());
    }

    #[tokio::test]
    async fn test_passes_over_record_dir_reach_fixpoint() {
        let dir = tempfile::tempdir().unwrap();
        let listing = "tap-etherip@t1.service loaded active running x\n";
        let host = SystemdHost::new_mock("tap-etherip", dir.path(), listing);
        let mut mgr = TunnelSyncMgr::new(host);
        let desired = vec![TunnelSpec::new("t1", "2001:db8::1", "2001:db8::2")];

        // No record yet: addresses unknown
        let first = mgr.run_pass(&desired).await.unwrap();
        assert_eq!(first.count(Action::Recreate), 1);

        let second = mgr.run_pass(&desired).await.unwrap();
        assert!(second.outcomes.iter().all(|o| o.action == Action::Noop));

        let restarts = mgr
            .host()
            .get_captured_commands()
            .iter()
            .filter(|c| c.contains(" restart "))
            .count();
        assert_eq!(restarts, 1);
    }

    #[tokio::test]
    async fn test_padded_address_never_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let listing = "tap-etherip@t1.service loaded active running x\n";
        let host = SystemdHost::new_mock("tap-etherip", dir.path(), listing);
        let mut mgr = TunnelSyncMgr::new(host);
        let desired = vec![TunnelSpec::new("t1", "2001:db8::1 ", "2001:db8::2")];

        for _ in 0..3 {
            let report = mgr.run_pass(&desired).await.unwrap();
            assert_eq!(report.failed().count(), 1);
        }

        assert!(mgr
            .host()
            .get_captured_commands()
            .iter()
            .all(|c| c.contains(" list-units ")));
        assert!(!dir.path().join("t1").exists());
    }

    #[test]
    fn test_record_path_rejects_traversal() {
        let host = SystemdHost::new("tap-etherip", "/run/tap-etherip-envs");

        assert_eq!(
            host.record_path("t1").unwrap(),
            PathBuf::from("/run/tap-etherip-envs/t1")
        );
        assert!(host.record_path("../etc/passwd").is_err());
        assert!(host.record_path("..").is_err());
        assert!(host.record_path("").is_err());
    }
}
