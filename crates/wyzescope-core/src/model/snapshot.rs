// ── Snapshot document ──
//
// A snapshot is immutable once written: the scrape builds it in one
// pass and the differ only ever reads it. Serialization uses pretty
// JSON with BTreeMap-ordered keys so identical in-memory state always
// produces identical bytes.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::device::DeviceRecord;
use crate::error::CoreError;

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    2
}

/// What a scrape was asked to fetch, embedded in the snapshot so a
/// later diff can explain asymmetric capture capability (e.g. one side
/// scraped without property lists).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOptions {
    #[serde(default = "default_true")]
    pub include_device_info: bool,
    #[serde(default)]
    pub include_events: bool,
    #[serde(default = "default_concurrency")]
    pub max_concurrent: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            include_device_info: true,
            include_events: false,
            max_concurrent: 2,
        }
    }
}

/// Which enrichment call failed for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStage {
    DeviceInfo,
    Events,
}

/// A recorded, non-fatal per-device enrichment failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchFailure {
    pub mac: String,
    pub stage: FetchStage,
    pub error: String,
}

/// A timestamped capture of account/device state -- the unit of
/// comparison for the diff engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub captured_at: DateTime<Utc>,
    pub fetch_options: FetchOptions,
    /// Enumeration order from the service, preserved for diff-stable
    /// output.
    pub devices: Vec<DeviceRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FetchFailure>,
}

impl Snapshot {
    /// Assemble a snapshot from scraped devices. Pure; stamps
    /// `captured_at` and validates the device set.
    pub fn build(
        devices: Vec<DeviceRecord>,
        fetch_options: FetchOptions,
        failures: Vec<FetchFailure>,
    ) -> Result<Self, CoreError> {
        let snapshot = Self {
            captured_at: Utc::now(),
            fetch_options,
            devices,
            failures,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Structural validation: every device has a non-empty mac and no
    /// mac appears twice.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::new();
        for device in &self.devices {
            if device.mac.is_empty() {
                return Err(CoreError::Validation {
                    message: "snapshot contains a device with an empty mac".into(),
                });
            }
            if !seen.insert(device.mac.as_str()) {
                return Err(CoreError::Validation {
                    message: format!("snapshot contains duplicate mac {}", device.mac),
                });
            }
        }
        Ok(())
    }

    /// Read and validate a snapshot document.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let snapshot: Self = serde_json::from_str(&text).map_err(|e| CoreError::Validation {
            message: format!("{}: not a valid snapshot document: {e}", path.display()),
        })?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Write the snapshot as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let mut text = serde_json::to_string_pretty(self).map_err(|e| CoreError::Validation {
            message: format!("snapshot serialization failed: {e}"),
        })?;
        text.push('\n');
        std::fs::write(path, text).map_err(|source| CoreError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn device(mac: &str) -> DeviceRecord {
        DeviceRecord {
            mac: mac.into(),
            nickname: "cam".into(),
            product_model: "CAM1".into(),
            firmware_version: String::new(),
            raw: std::collections::BTreeMap::new(),
            device_params: std::collections::BTreeMap::new(),
            property_list: std::collections::BTreeMap::new(),
            events: None,
        }
    }

    #[test]
    fn build_rejects_empty_mac() {
        let result = Snapshot::build(vec![device("")], FetchOptions::default(), Vec::new());
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[test]
    fn build_rejects_duplicate_macs() {
        let result = Snapshot::build(
            vec![device("AA:BB"), device("AA:BB")],
            FetchOptions::default(),
            Vec::new(),
        );
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[test]
    fn save_is_stable_across_rewrites() {
        let mut record = device("AA:BB");
        record.device_params.insert("b_key".into(), json!(2));
        record.device_params.insert("a_key".into(), json!(1));
        let snapshot =
            Snapshot::build(vec![record], FetchOptions::default(), Vec::new()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");
        snapshot.save(&first).unwrap();
        snapshot.save(&second).unwrap();

        let a = std::fs::read_to_string(&first).unwrap();
        let b = std::fs::read_to_string(&second).unwrap();
        assert_eq!(a, b);
        // BTreeMap ordering: a_key serializes before b_key.
        assert!(a.find("a_key").unwrap() < a.find("b_key").unwrap());
    }

    #[test]
    fn load_round_trips_and_revalidates() {
        let snapshot =
            Snapshot::build(vec![device("AA:BB")], FetchOptions::default(), Vec::new()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        snapshot.save(&path).unwrap();

        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded.devices.len(), 1);
        assert_eq!(loaded.devices[0].mac, "AA:BB");
        assert!(loaded.fetch_options.include_device_info);
    }

    #[test]
    fn load_rejects_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{\"devices\": \"nope\"}").unwrap();
        assert!(matches!(
            Snapshot::load(&path),
            Err(CoreError::Validation { .. })
        ));
    }
}
