//! Side-channel record format.
//!
//! Each tunnel has one small file, named after the tunnel, holding the
//! address pair last applied to it:
//!
//! ```text
//! LOCAL=2001:db8::1
//! REMOTE=2001:db8::2
//! ```
//!
//! The backing unit reads the same file as its environment, which is why
//! the format is plain `KEY=value` lines. Values never contain whitespace
//! or `=`, so a rendered record always parses back to itself.

use crate::error::{SyncError, SyncResult};

/// Key of the local address line.
pub const LOCAL_KEY: &str = "LOCAL";

/// Key of the remote address line.
pub const REMOTE_KEY: &str = "REMOTE";

/// Address pair persisted for one tunnel.
///
/// An empty field means the address is unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TunnelRecord {
    pub local: String,
    pub remote: String,
}

impl TunnelRecord {
    pub fn new(local: impl Into<String>, remote: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            remote: remote.into(),
        }
    }

    /// Parses record file content.
    ///
    /// Unknown lines are ignored. For each key the value is the first
    /// whitespace-delimited token after `=`; a key without a value leaves
    /// its field empty. A later line for the same key wins.
    pub fn parse(content: &str) -> Self {
        let mut record = Self::default();
        for line in content.lines() {
            let Some((key, value)) = line.trim_start().split_once('=') else {
                continue;
            };
            let Some(token) = value.split_whitespace().next() else {
                continue;
            };
            match key {
                LOCAL_KEY => record.local = token.to_string(),
                REMOTE_KEY => record.remote = token.to_string(),
                _ => {}
            }
        }
        record
    }

    /// Renders the record as file content, newline-terminated.
    pub fn render(&self) -> String {
        format!(
            "{}={}\n{}={}\n",
            LOCAL_KEY, self.local, REMOTE_KEY, self.remote
        )
    }

    /// Checks that both addresses read back unchanged after [`render`].
    ///
    /// [`render`]: TunnelRecord::render
    pub fn validate(&self) -> SyncResult<()> {
        for (key, value) in [(LOCAL_KEY, &self.local), (REMOTE_KEY, &self.remote)] {
            if let Some(c) = value.chars().find(|c| c.is_whitespace() || *c == '=') {
                return Err(SyncError::invalid_config(
                    key,
                    format!("address {:?} contains {:?}", value, c),
                ));
            }
        }
        Ok(())
    }

    /// Returns true if neither address is known.
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.remote.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let record = TunnelRecord::new("2001:db8::1", "2001:db8::2");
        assert_eq!(record.render(), "LOCAL=2001:db8::1\nREMOTE=2001:db8::2\n");
    }

    #[test]
    fn test_parse_rendered() {
        let content = "LOCAL=2001:db8::1\nREMOTE=2001:db8::2\n";
        assert_eq!(
            TunnelRecord::parse(content),
            TunnelRecord::new("2001:db8::1", "2001:db8::2")
        );
    }

    #[test]
    fn test_parse_takes_first_token() {
        let record = TunnelRecord::parse("LOCAL=2001:db8::1 trailing words\nREMOTE=\n");
        assert_eq!(record.local, "2001:db8::1");
        assert_eq!(record.remote, "");
    }

    #[test]
    fn test_parse_ignores_unknown_lines() {
        let record = TunnelRecord::parse("# comment\nFOO=bar\ngarbage\nREMOTE=2001:db8::2");
        assert_eq!(record.local, "");
        assert_eq!(record.remote, "2001:db8::2");
        assert!(!record.is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(TunnelRecord::new("2001:db8::1", "2001:db8::2").validate().is_ok());
        assert!(TunnelRecord::new("", "").validate().is_ok());

        for bad in ["2001:db8::1 ", " 2001:db8::1", "2001:db8::1\nREMOTE=x", "a\tb", "a=b"] {
            let err = TunnelRecord::new(bad, "2001:db8::2").validate().unwrap_err();
            assert!(matches!(err, SyncError::InvalidConfig { ref field, .. } if field == LOCAL_KEY));
            assert!(TunnelRecord::new("2001:db8::1", bad).validate().is_err());
        }
    }

    #[test]
    fn test_valid_record_reads_back_unchanged() {
        for (local, remote) in [
            ("2001:db8::1", "2001:db8::2"),
            ("", "2001:db8::2"),
            ("fe80::1%eth0", ""),
        ] {
            let record = TunnelRecord::new(local, remote);
            record.validate().unwrap();
            assert_eq!(TunnelRecord::parse(&record.render()), record);
        }
    }

    #[test]
    fn test_parse_empty() {
        assert!(TunnelRecord::parse("").is_empty());
    }
}
