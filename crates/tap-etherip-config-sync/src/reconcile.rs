//! Reconciliation - pure diff between desired and observed tunnels
//!
//! [`diff_tunnels`] has no side effects beyond diagnostics. Its output is
//! ordered: every desired name in name order (create, recreate or noop),
//! then every observed-only name in name order (delete).

use std::collections::BTreeMap;

use tracing::warn;

use crate::types::{Diff, TunnelSpec, TunnelState};

/// Computes the action for every tunnel name in either set
///
/// # Rules
///
/// * desired only: [`Create`](crate::types::Action::Create)
/// * both, addresses equal: [`Noop`](crate::types::Action::Noop)
/// * both, any address differs (unknown counts as different):
///   [`Recreate`](crate::types::Action::Recreate)
/// * observed only: [`Delete`](crate::types::Action::Delete)
///
/// Duplicate names keep the last entry and are reported with a warning.
///
/// # Example
///
/// ```
/// use tap_etherip_config_sync::reconcile::diff_tunnels;
/// use tap_etherip_config_sync::types::{Action, TunnelSpec, TunnelState};
///
/// let desired = vec![TunnelSpec::new("t1", "2001:db8::1", "2001:db8::2")];
/// let observed = vec![TunnelState::new("t2", "2001:db8::3", "2001:db8::4")];
///
/// let diffs = diff_tunnels(&desired, &observed);
/// assert_eq!(diffs[0].action, Action::Create);
/// assert_eq!(diffs[1].action, Action::Delete);
/// ```
pub fn diff_tunnels(desired: &[TunnelSpec], observed: &[TunnelState]) -> Vec<Diff> {
    let desired = index_by_name("desired", desired, |s| s.name.as_str());
    let observed = index_by_name("observed", observed, |s| s.name.as_str());

    let mut diffs = Vec::with_capacity(desired.len() + observed.len());

    for (name, spec) in &desired {
        let diff = match observed.get(name) {
            None => Diff::create(spec),
            Some(current) if current.matches(spec) => Diff::noop(spec),
            Some(_) => Diff::recreate(spec),
        };
        diffs.push(diff);
    }

    for name in observed.keys() {
        if !desired.contains_key(name) {
            diffs.push(Diff::delete(*name));
        }
    }

    diffs
}

fn index_by_name<'a, T>(
    kind: &str,
    items: &'a [T],
    name_of: impl Fn(&T) -> &str,
) -> BTreeMap<&'a str, &'a T> {
    let mut index = BTreeMap::new();
    for item in items {
        let name = name_of(item);
        if index.insert(name, item).is_some() {
            warn!(name = %name, kind = %kind, "Duplicate tunnel name, last entry wins");
        }
    }
    index
}
