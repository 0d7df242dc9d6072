// ── Device domain types ──
//
// Vendor property keys are loosely typed, sparse, and vary by model and
// firmware, so the three diffable namespaces are open key-to-value maps
// rather than closed structs. BTreeMap keeps serialized key order fixed,
// which makes repeated writes of identical state byte-identical.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::diff::Namespace;

/// One device inside a snapshot.
///
/// `mac` is the stable identity across snapshots. `raw` holds the
/// complete listing object, `device_params` the vendor's flat config
/// map, and `property_list` the sparse pid → value map from extended
/// device info. Presence of a property-list key is itself meaningful
/// (absence is not the same as null).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub mac: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub product_model: String,
    #[serde(default)]
    pub firmware_version: String,
    #[serde(default)]
    pub raw: BTreeMap<String, Value>,
    #[serde(default)]
    pub device_params: BTreeMap<String, Value>,
    #[serde(default)]
    pub property_list: BTreeMap<String, Value>,
    /// Bounded newest-first event sample. Informational only -- the
    /// differ never looks at it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Value>>,
}

impl DeviceRecord {
    /// The map backing one diffable namespace.
    pub fn namespace(&self, ns: Namespace) -> &BTreeMap<String, Value> {
        match ns {
            Namespace::Raw => &self.raw,
            Namespace::DeviceParams => &self.device_params,
            Namespace::PropertyList => &self.property_list,
        }
    }
}

impl From<wyzescope_api::DeviceSummary> for DeviceRecord {
    fn from(summary: wyzescope_api::DeviceSummary) -> Self {
        let raw = summary
            .raw
            .as_object()
            .map_or_else(BTreeMap::new, |m| {
                m.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
            });
        Self {
            mac: summary.mac,
            nickname: summary.nickname,
            product_model: summary.product_model,
            firmware_version: summary.firmware_version,
            raw,
            device_params: summary.device_params,
            property_list: BTreeMap::new(),
            events: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_from_summary_keeps_raw_and_params() {
        let raw = json!({
            "mac": "AA:BB",
            "nickname": "Porch",
            "product_model": "CAM1",
            "firmware_ver": "4.36.1",
            "conn_state": 1,
            "device_params": {"power_switch": 0},
        });
        let summary = wyzescope_api::DeviceSummary::from_raw(&raw).unwrap();
        let record = DeviceRecord::from(summary);

        assert_eq!(record.mac, "AA:BB");
        assert_eq!(record.raw["conn_state"], json!(1));
        assert_eq!(record.device_params["power_switch"], json!(0));
        assert!(record.property_list.is_empty());
        assert!(record.events.is_none());
    }
}
