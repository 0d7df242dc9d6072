// ── Diff domain types ──

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The three independently-diffed key/value namespaces of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Raw,
    DeviceParams,
    PropertyList,
}

impl Namespace {
    /// Fixed report order: raw, then device_params, then property_list.
    pub const ALL: [Self; 3] = [Self::Raw, Self::DeviceParams, Self::PropertyList];

    pub fn label(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::DeviceParams => "device_params",
            Self::PropertyList => "property_list",
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How a key differs between the two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

/// One changed leaf value.
///
/// Invariants: `Changed` entries carry both `before` and `after`
/// (unequal); `Added`/`Removed` entries carry exactly one of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffEntry {
    pub mac: String,
    pub namespace: Namespace,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,
    pub kind: ChangeKind,
}

/// Ordered diff output: grouped by mac (sorted), then namespace in
/// fixed order, then key (sorted). Deterministic for a given pair of
/// snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffReport {
    pub entries: Vec<DiffEntry>,
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Distinct macs in report order.
    pub fn macs(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if out.last() != Some(&entry.mac.as_str()) {
                out.push(&entry.mac);
            }
        }
        out
    }

    /// Entries for one mac and namespace, in report order.
    pub fn entries_for(&self, mac: &str, ns: Namespace) -> impl Iterator<Item = &DiffEntry> {
        self.entries
            .iter()
            .filter(move |e| e.mac == mac && e.namespace == ns)
    }
}
