//! `systemctl` argument builders for backing unit operations
//!
//! Each builder returns the arguments that follow the program name.

use crate::units::{unit_instance, unit_pattern};

/// Arguments listing the active backing units
///
/// `--plain` keeps systemd from prefixing lines with status glyphs, so the
/// first token of each line is always the unit id. The pattern is matched
/// by systemctl itself.
pub fn build_list_units_args(prefix: &str) -> Vec<String> {
    vec![
        "list-units".to_string(),
        "--type=service".to_string(),
        "--state=active".to_string(),
        "--no-legend".to_string(),
        "--plain".to_string(),
        unit_pattern(prefix),
    ]
}

/// Arguments starting or restarting a tunnel's unit
pub fn build_restart_args(prefix: &str, name: &str) -> Vec<String> {
    vec!["restart".to_string(), unit_instance(prefix, name)]
}

/// Arguments stopping a tunnel's unit
pub fn build_stop_args(prefix: &str, name: &str) -> Vec<String> {
    vec!["stop".to_string(), unit_instance(prefix, name)]
}
