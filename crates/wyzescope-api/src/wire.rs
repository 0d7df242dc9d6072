// Wire types for the loosely-typed vendor payloads.
//
// The cloud API's device objects are an open key set that varies by
// model and firmware, so everything beyond the identity fields is kept
// as free-form JSON rather than a closed struct.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// One device as returned by the homepage object list.
///
/// Identity fields are pulled out for convenience; `raw` keeps the
/// complete listing object so unknown vendor keys survive round-trips.
#[derive(Debug, Clone)]
pub struct DeviceSummary {
    pub mac: String,
    pub nickname: String,
    pub product_model: String,
    pub firmware_version: String,
    pub device_params: BTreeMap<String, Value>,
    pub raw: Value,
}

impl DeviceSummary {
    /// Extract a summary from one raw listing object.
    ///
    /// Returns `None` when the object has no usable `mac` — the listing
    /// occasionally contains placeholder entries.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let mac = obj.get("mac").and_then(Value::as_str)?.to_owned();
        if mac.is_empty() {
            return None;
        }

        let as_string = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned()
        };

        let device_params = obj
            .get("device_params")
            .and_then(Value::as_object)
            .map_or_else(BTreeMap::new, |m| {
                m.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
            });

        Some(Self {
            mac,
            nickname: as_string("nickname"),
            product_model: as_string("product_model"),
            firmware_version: as_string("firmware_ver"),
            device_params,
            raw: raw.clone(),
        })
    }
}

/// One entry of the sparse property list from `get_device_Info`.
///
/// Newer firmware reports `value`, older firmware `pvalue`; both are
/// seen in the wild, sometimes within one device.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyEntry {
    #[serde(default)]
    pub pid: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub pvalue: Option<Value>,
}

/// Extended per-device detail from `get_device_Info`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub property_list: Vec<PropertyEntry>,
    #[serde(default)]
    pub device_params: Option<BTreeMap<String, Value>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl DeviceInfo {
    /// Flatten the property list into a pid → value map.
    ///
    /// Entries without a pid are dropped. `value` wins over `pvalue`
    /// when both are present. A pid present with a null value is kept —
    /// presence of a key is itself meaningful.
    pub fn properties_by_pid(&self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        for entry in &self.property_list {
            let Some(pid) = entry.pid.as_deref() else {
                continue;
            };
            if pid.is_empty() {
                continue;
            }
            let value = entry
                .value
                .clone()
                .or_else(|| entry.pvalue.clone())
                .unwrap_or(Value::Null);
            out.insert(pid.to_owned(), value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_requires_mac() {
        assert!(DeviceSummary::from_raw(&json!({"nickname": "Porch"})).is_none());
        assert!(DeviceSummary::from_raw(&json!({"mac": ""})).is_none());
        assert!(DeviceSummary::from_raw(&json!("not an object")).is_none());
    }

    #[test]
    fn summary_extracts_identity_fields() {
        let raw = json!({
            "mac": "AA:BB:CC:DD:EE:FF",
            "nickname": "Porch Cam",
            "product_model": "WYZE_CAKP2JFUS",
            "firmware_ver": "4.36.11.8391",
            "device_params": {"power_switch": 1},
            "push_switch": 1,
        });
        let summary = DeviceSummary::from_raw(&raw).unwrap();
        assert_eq!(summary.mac, "AA:BB:CC:DD:EE:FF");
        assert_eq!(summary.nickname, "Porch Cam");
        assert_eq!(summary.product_model, "WYZE_CAKP2JFUS");
        assert_eq!(summary.firmware_version, "4.36.11.8391");
        assert_eq!(summary.device_params["power_switch"], json!(1));
        assert_eq!(summary.raw["push_switch"], json!(1));
    }

    #[test]
    fn properties_by_pid_prefers_value_over_pvalue() {
        let info: DeviceInfo = serde_json::from_value(json!({
            "property_list": [
                {"pid": "P1", "value": "1", "pvalue": "0"},
                {"pid": "P3", "pvalue": "on"},
                {"pid": "P5"},
                {"value": "orphan"},
            ]
        }))
        .unwrap();

        let props = info.properties_by_pid();
        assert_eq!(props["P1"], json!("1"));
        assert_eq!(props["P3"], json!("on"));
        assert_eq!(props["P5"], Value::Null);
        assert_eq!(props.len(), 3);
    }
}
