// ── Snapshot differ ──
//
// Pure function over two snapshot documents; no network. Works on the
// union of macs so devices added to or removed from the account are
// visible, and on the symmetric key union within each namespace so
// appearing/disappearing keys are classified, not skipped.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::error::CoreError;
use crate::model::{ChangeKind, DeviceRecord, DiffEntry, DiffReport, Namespace, Snapshot};

/// Compute the structural diff between two snapshots.
///
/// Traversal order is fully deterministic (macs sorted, namespaces in
/// fixed order, keys sorted), so reruns produce identical reports.
/// `mac_filter` restricts the report to one device, case-insensitively;
/// a filter matching neither snapshot is an error, a matching device
/// with no differences yields an empty report.
pub fn diff(
    before: &Snapshot,
    after: &Snapshot,
    mac_filter: Option<&str>,
) -> Result<DiffReport, CoreError> {
    before.validate()?;
    after.validate()?;

    let before_by_mac = index_devices(before);
    let after_by_mac = index_devices(after);

    let mut macs: BTreeSet<&str> = before_by_mac.keys().chain(after_by_mac.keys()).copied().collect();
    if let Some(filter) = mac_filter {
        let filter = filter.trim();
        macs.retain(|mac| mac.eq_ignore_ascii_case(filter));
        if macs.is_empty() {
            return Err(CoreError::MacNotFound { mac: filter.into() });
        }
    }

    let empty = BTreeMap::new();
    let mut entries = Vec::new();

    for mac in macs {
        let before_dev = before_by_mac.get(mac);
        let after_dev = after_by_mac.get(mac);

        for ns in Namespace::ALL {
            let before_map = before_dev.map_or(&empty, |d| d.namespace(ns));
            let after_map = after_dev.map_or(&empty, |d| d.namespace(ns));

            let keys: BTreeSet<&String> = before_map.keys().chain(after_map.keys()).collect();
            for key in keys {
                // The listing embeds device_params inside the raw object;
                // it is diffed under its own namespace instead.
                if ns == Namespace::Raw && key == "device_params" {
                    continue;
                }
                let entry = match (before_map.get(key), after_map.get(key)) {
                    (Some(before_val), None) => DiffEntry {
                        mac: mac.to_owned(),
                        namespace: ns,
                        key: key.clone(),
                        before: Some(before_val.clone()),
                        after: None,
                        kind: ChangeKind::Removed,
                    },
                    (None, Some(after_val)) => DiffEntry {
                        mac: mac.to_owned(),
                        namespace: ns,
                        key: key.clone(),
                        before: None,
                        after: Some(after_val.clone()),
                        kind: ChangeKind::Added,
                    },
                    (Some(before_val), Some(after_val)) if !values_equal(before_val, after_val) => {
                        DiffEntry {
                            mac: mac.to_owned(),
                            namespace: ns,
                            key: key.clone(),
                            before: Some(before_val.clone()),
                            after: Some(after_val.clone()),
                            kind: ChangeKind::Changed,
                        }
                    }
                    _ => continue,
                };
                entries.push(entry);
            }
        }
    }

    Ok(DiffReport { entries })
}

fn index_devices(snapshot: &Snapshot) -> BTreeMap<&str, &DeviceRecord> {
    snapshot
        .devices
        .iter()
        .map(|d| (d.mac.as_str(), d))
        .collect()
}

/// Deep, type-aware structural equality.
///
/// No coercion across types -- string `"1"` and number `1` are unequal,
/// surfacing vendor representation drift instead of hiding it. Numbers
/// compare by value, not representation, so serde's integer/float
/// widening never produces phantom diffs.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(xv, yv)| values_equal(xv, yv))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, xv)| y.get(k).is_some_and(|yv| values_equal(xv, yv)))
        }
        _ => a == b,
    }
}

// Exact value comparison is intentional here; these are vendor payloads
// round-tripped through JSON, not computed floats.
#[allow(clippy::float_cmp)]
fn numbers_equal(a: &serde_json::Number, b: &serde_json::Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
