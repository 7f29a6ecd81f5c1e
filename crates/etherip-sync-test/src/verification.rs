//! Verification helpers for testing a reconciliation pass
//!
//! Provides assertion helpers over the final state of a [`FakeHost`]

use crate::fixtures::{FakeHost, HostCall};
use etherip_sync_common::TunnelRecord;
use thiserror::Error;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Expected tunnel '{name}' to be active")]
    NotActive { name: String },

    #[error("Expected tunnel '{name}' to be inactive")]
    StillActive { name: String },

    #[error("Expected a record for tunnel '{name}'")]
    RecordMissing { name: String },

    #[error("Record mismatch for '{name}': expected {expected:?}, got {actual:?}")]
    RecordMismatch {
        name: String,
        expected: TunnelRecord,
        actual: TunnelRecord,
    },

    #[error("Expected no call {call:?}, but it was made")]
    UnexpectedCall { call: HostCall },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Host state verification helper
pub struct HostVerifier<'a> {
    host: &'a FakeHost,
}

impl<'a> HostVerifier<'a> {
    /// Create a new verifier over `host`
    pub fn new(host: &'a FakeHost) -> Self {
        Self { host }
    }

    /// Verify that the tunnel's backing unit is active
    pub fn assert_active(&self, name: &str) -> VerifyResult<()> {
        if !self.host.active.contains(name) {
            return Err(VerificationError::NotActive {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Verify that the tunnel's backing unit is not active
    pub fn assert_inactive(&self, name: &str) -> VerifyResult<()> {
        if self.host.active.contains(name) {
            return Err(VerificationError::StillActive {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Verify that the tunnel's record holds exactly this address pair
    pub fn assert_record(&self, name: &str, local: &str, remote: &str) -> VerifyResult<()> {
        let actual = self
            .host
            .records
            .get(name)
            .ok_or_else(|| VerificationError::RecordMissing {
                name: name.to_string(),
            })?;
        let expected = TunnelRecord::new(local, remote);
        if *actual != expected {
            return Err(VerificationError::RecordMismatch {
                name: name.to_string(),
                expected,
                actual: actual.clone(),
            });
        }
        Ok(())
    }

    /// Verify that the given call never happened
    pub fn assert_not_called(&self, call: &HostCall) -> VerifyResult<()> {
        if self.host.calls.contains(call) {
            return Err(VerificationError::UnexpectedCall { call: call.clone() });
        }
        Ok(())
    }

    /// Verify that the unit of `name` was not restarted
    pub fn assert_not_restarted(&self, name: &str) -> VerifyResult<()> {
        self.assert_not_called(&HostCall::StartOrRestart(name.to_string()))
    }
}
