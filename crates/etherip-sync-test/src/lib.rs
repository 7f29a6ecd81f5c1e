//! Test infrastructure for the EtherIP tunnel config sync
//!
//! Provides:
//! - An in-memory [`FakeHost`] with scriptable failures
//! - A [`StaticResolver`] answering from a fixed table
//! - Assertion helpers over the host's final state and call log

pub mod fixtures;
mod verification;

pub use fixtures::*;
pub use verification::*;
