//! Backing unit naming

/// Default template name of the backing units
pub const DEFAULT_UNIT_PREFIX: &str = "tap-etherip";

/// Suffix systemd appends to service unit ids
pub const SERVICE_SUFFIX: &str = ".service";

/// Instance name for a tunnel: `<prefix>@<name>`
pub fn unit_instance(prefix: &str, name: &str) -> String {
    format!("{}@{}", prefix, name)
}

/// Listing pattern matching every backing unit: `<prefix>@*.service`
pub fn unit_pattern(prefix: &str) -> String {
    format!("{}@*{}", prefix, SERVICE_SUFFIX)
}

/// Recovers the tunnel name from a unit id such as `tap-etherip@t1.service`
///
/// Returns `None` for ids of other templates, ids without the service
/// suffix, and the bare template itself.
pub fn tunnel_name_from_unit<'a>(prefix: &str, unit: &'a str) -> Option<&'a str> {
    let name = unit
        .strip_prefix(prefix)?
        .strip_prefix('@')?
        .strip_suffix(SERVICE_SUFFIX)?;
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
