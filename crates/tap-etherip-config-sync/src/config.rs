//! Desired-state documents and runtime settings
//!
//! Two JSON document shapes exist. The DNS-aware one may name endpoints
//! symbolically and is the input of `resolve-dns`:
//!
//! ```json
//! {
//!   "tunnels": [
//!     {
//!       "name": "64496-1",
//!       "local_fqdn": "pe1.example.net",
//!       "remote_ip_addr": "2001:db8::2"
//!     }
//!   ]
//! }
//! ```
//!
//! The resolved one carries only literal addresses and drives a pass:
//!
//! ```json
//! {
//!   "tunnels": [
//!     { "name": "64496-1", "local_ip_addr": "2001:db8::1", "remote_ip_addr": "2001:db8::2" }
//!   ]
//! }
//! ```
//!
//! Missing fields decode as empty strings and unknown fields are ignored.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use etherip_sync_common::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};

use crate::types::TunnelSpec;
use crate::units::DEFAULT_UNIT_PREFIX;

/// Default path of the resolved document
pub const DEFAULT_CONFIG_PATH: &str = "./config.json";

/// Default directory holding the side-channel records
pub const DEFAULT_ENV_BASE_PATH: &str = "./tap-etherip-envs";

/// Resolved desired-state document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conf {
    #[serde(default)]
    pub tunnels: Vec<TunnelSpec>,
}

impl Conf {
    /// Decodes a resolved document; `origin` names the source in errors
    pub fn from_reader<R: Read>(reader: R, origin: &str) -> SyncResult<Self> {
        serde_json::from_reader(reader).map_err(|source| SyncError::DocumentParse {
            origin: origin.to_string(),
            source,
        })
    }

    /// Opens, decodes and validates the resolved document at `path`
    pub fn load(path: &Path) -> SyncResult<Self> {
        let file = File::open(path).map_err(|source| SyncError::DocumentIo {
            path: path.display().to_string(),
            source,
        })?;
        let conf = Self::from_reader(BufReader::new(file), &path.display().to_string())?;
        conf.validate()?;
        Ok(conf)
    }

    /// Rejects entries no pass could apply: a missing name, or an address
    /// that would not read back from the tunnel's record
    pub fn validate(&self) -> SyncResult<()> {
        for (index, tunnel) in self.tunnels.iter().enumerate() {
            if tunnel.name.is_empty() {
                return Err(SyncError::invalid_config(
                    format!("tunnels[{}].name", index),
                    "must not be empty",
                ));
            }
            tunnel.to_record().validate().map_err(|e| {
                SyncError::invalid_config(
                    format!("tunnels[{}] ({})", index, tunnel.name),
                    e.to_string(),
                )
            })?;
        }
        Ok(())
    }

    /// Encodes the document with two-space indentation and a final newline
    pub fn to_pretty_json(&self) -> SyncResult<String> {
        let mut out = serde_json::to_string_pretty(self)
            .map_err(|e| SyncError::internal(format!("Failed to encode document: {}", e)))?;
        out.push('\n');
        Ok(out)
    }
}

/// DNS-aware desired-state document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfWithDns {
    #[serde(default)]
    pub tunnels: Vec<TunnelWithDns>,
}

impl ConfWithDns {
    /// Decodes a DNS-aware document; `origin` names the source in errors
    pub fn from_reader<R: Read>(reader: R, origin: &str) -> SyncResult<Self> {
        serde_json::from_reader(reader).map_err(|source| SyncError::DocumentParse {
            origin: origin.to_string(),
            source,
        })
    }
}

/// Tunnel entry whose endpoints may be literal, symbolic, or both
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TunnelWithDns {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub local_ip_addr: String,
    #[serde(default)]
    pub local_fqdn: String,
    #[serde(default)]
    pub remote_ip_addr: String,
    #[serde(default)]
    pub remote_fqdn: String,
}

/// Runtime settings of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Resolved document to load
    pub config_path: PathBuf,
    /// Directory of the side-channel records
    pub env_base_path: PathBuf,
    /// Template name of the backing units
    pub unit_prefix: String,
    /// Compute and log the diff without touching the host
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            env_base_path: PathBuf::from(DEFAULT_ENV_BASE_PATH),
            unit_prefix: DEFAULT_UNIT_PREFIX.to_string(),
            dry_run: false,
        }
    }
}

impl SyncConfig {
    /// Rejects settings that would produce unusable unit names
    pub fn validate(&self) -> SyncResult<()> {
        if self.unit_prefix.is_empty() {
            return Err(SyncError::invalid_config("unit_prefix", "must not be empty"));
        }
        if self
            .unit_prefix
            .contains(|c: char| c == '@' || c == '/' || c.is_whitespace())
        {
            return Err(SyncError::invalid_config(
                "unit_prefix",
                format!("'{}' must not contain '@', '/' or whitespace", self.unit_prefix),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_conf_from_reader() {
        let doc = r#"{"tunnels": [
            {"name": "t1", "local_ip_addr": "2001:db8::1", "remote_ip_addr": "2001:db8::2"},
            {"name": "t2", "local_ip_addr": "2001:db8::3", "extra": true}
        ]}"#;
        let conf = Conf::from_reader(doc.as_bytes(), "test").unwrap();
        assert_eq!(
            conf.tunnels,
            vec![
                TunnelSpec::new("t1", "2001:db8::1", "2001:db8::2"),
                TunnelSpec::new("t2", "2001:db8::3", ""),
            ]
        );
    }

    #[test]
    fn test_conf_missing_tunnels_is_empty() {
        let conf = Conf::from_reader("{}".as_bytes(), "test").unwrap();
        assert!(conf.tunnels.is_empty());
    }

    #[test]
    fn test_conf_malformed() {
        let err = Conf::from_reader(r#"{"tunnels": {"#.as_bytes(), "config.json").unwrap_err();
        assert!(matches!(err, SyncError::DocumentParse { ref origin, .. } if origin == "config.json"));

        let err = Conf::from_reader(r#"{"tunnels": "t1"}"#.as_bytes(), "config.json").unwrap_err();
        assert!(matches!(err, SyncError::DocumentParse { .. }));
    }

    #[test]
    fn test_conf_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tunnels": [{{"name": "t1", "local_ip_addr": "a", "remote_ip_addr": "b"}}]}}"#
        )
        .unwrap();

        let conf = Conf::load(file.path()).unwrap();
        assert_eq!(conf.tunnels, vec![TunnelSpec::new("t1", "a", "b")]);
    }

    #[test]
    fn test_conf_load_rejects_unnamed_tunnel() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tunnels": [{{"name": "t1", "local_ip_addr": "a", "remote_ip_addr": "b"}},
                            {{"local_ip_addr": "c", "remote_ip_addr": "d"}}]}}"#
        )
        .unwrap();

        let err = Conf::load(file.path()).unwrap_err();
        assert!(
            matches!(err, SyncError::InvalidConfig { ref field, .. } if field == "tunnels[1].name")
        );
    }

    #[test]
    fn test_conf_load_rejects_padded_address() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tunnels": [{{"name": "t1", "local_ip_addr": "2001:db8::1 ", "remote_ip_addr": "2001:db8::2"}}]}}"#
        )
        .unwrap();

        let err = Conf::load(file.path()).unwrap_err();
        assert!(matches!(err, SyncError::InvalidConfig { .. }));
        assert!(err.to_string().contains("tunnels[0] (t1)"));
    }

    #[test]
    fn test_conf_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Conf::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SyncError::DocumentIo { .. }));
    }

    #[test]
    fn test_conf_pretty_json() {
        let conf = Conf {
            tunnels: vec![TunnelSpec::new("t1", "2001:db8::1", "2001:db8::2")],
        };
        let expected = "{\n  \"tunnels\": [\n    {\n      \"name\": \"t1\",\n      \"local_ip_addr\": \"2001:db8::1\",\n      \"remote_ip_addr\": \"2001:db8::2\"\n    }\n  ]\n}\n";
        assert_eq!(conf.to_pretty_json().unwrap(), expected);

        let empty = Conf::default().to_pretty_json().unwrap();
        assert_eq!(empty, "{\n  \"tunnels\": []\n}\n");
    }

    #[test]
    fn test_conf_with_dns_from_reader() {
        let doc = r#"{"tunnels": [{"name": "t1", "local_fqdn": "pe1.example.net", "remote_ip_addr": "2001:db8::2"}]}"#;
        let conf = ConfWithDns::from_reader(doc.as_bytes(), "stdin").unwrap();
        let entry = &conf.tunnels[0];
        assert_eq!(entry.local_fqdn, "pe1.example.net");
        assert_eq!(entry.local_ip_addr, "");
        assert_eq!(entry.remote_ip_addr, "2001:db8::2");
        assert_eq!(entry.remote_fqdn, "");
    }

    #[test]
    fn test_sync_config_validate() {
        assert!(SyncConfig::default().validate().is_ok());

        let config = SyncConfig {
            unit_prefix: "tap@etherip".to_string(),
            ..SyncConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SyncConfig {
            unit_prefix: String::new(),
            ..SyncConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
