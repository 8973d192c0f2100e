// PETLIBRO cloud API response types
//
// Every endpoint wraps its payload in the `Envelope<T>` shape. Fields use
// `#[serde(default)]` liberally because the vendor is inconsistent about
// field presence across device models and firmware versions.

use serde::{Deserialize, Deserializer, Serialize};

// ── Response Envelope ────────────────────────────────────────────────

/// Standard PETLIBRO response envelope.
///
/// ```json
/// { "code": 0, "msg": "success", "data": { ... } }
/// ```
///
/// `code == 0` is success, `1009` means the session token is no longer
/// valid, anything else is an application failure described by `msg`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    /// Missing `data` is treated as JSON `null`.
    #[serde(default)]
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Vendor message, or a synthetic one naming the code.
    pub fn message(&self) -> String {
        match self.msg.as_deref() {
            Some(msg) if !msg.is_empty() => msg.to_owned(),
            _ => format!("code={}", self.code),
        }
    }
}

/// Payload of a successful `/member/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub token: Option<String>,
}

// ── Devices ──────────────────────────────────────────────────────────

/// One entry from `/device/device/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceListItem {
    pub device_sn: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub product_identifier: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub software_version: Option<String>,
    #[serde(default)]
    pub hardware_version: Option<String>,
}

/// Real-time snapshot from `/device/device/realInfo`.
///
/// Feeders and fountains share the endpoint; the fountain-only fields are
/// simply absent for feeders and vice versa.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRealInfo {
    #[serde(default)]
    pub device_sn: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub online: Option<bool>,
    /// Battery percentage. Absent or zero on mains-powered hardware.
    #[serde(default)]
    pub electric_quantity: Option<i64>,
    #[serde(default)]
    pub battery_state: Option<String>,
    #[serde(default)]
    pub wifi_ssid: Option<String>,
    #[serde(default)]
    pub wifi_rssi: Option<i64>,
    /// Feeder hopper still has food.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub surplus_grain: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub grain_outlet_state: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub enable_feeding_plan: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub light_switch: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub sound_switch: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub child_lock_switch: Option<bool>,
    #[serde(default)]
    pub remaining_desiccant_days: Option<i64>,
    #[serde(default)]
    pub change_desiccant_frequency: Option<i64>,
    #[serde(default)]
    pub unit_type: Option<i64>,
    #[serde(default)]
    pub running_state: Option<String>,

    // ── Fountain ──
    #[serde(default)]
    pub today_total_ml: Option<f64>,
    #[serde(default)]
    pub use_water_type: Option<i64>,
    #[serde(default)]
    pub use_water_interval: Option<i64>,
    #[serde(default)]
    pub use_water_duration: Option<i64>,
    #[serde(default)]
    pub remaining_replacement_days: Option<i64>,
    #[serde(default)]
    pub remaining_cleaning_days: Option<i64>,
    #[serde(default)]
    pub filter_replacement_frequency: Option<i64>,
    #[serde(default)]
    pub machine_cleaning_frequency: Option<i64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub weight_percent: Option<f64>,
}

impl DeviceRealInfo {
    /// A missing `online` flag counts as offline.
    pub fn is_online(&self) -> bool {
        self.online.unwrap_or(false)
    }
}

// ── Statistics ───────────────────────────────────────────────────────

/// Today's feeding counters from `/data/data/grainStatus`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrainStatus {
    #[serde(default)]
    pub today_feeding_quantity: i64,
    #[serde(default)]
    pub today_feeding_times: i64,
}

/// Today's drinking data from `/data/deviceDrinkWater/todayDrinkData`.
///
/// Only the total volume is modeled; the rest stays opaque in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrinkWaterToday {
    #[serde(default)]
    pub today_total_ml: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Helpers ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrInt {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// Accept `true`/`false`, `1`/`0`, their string forms, or `null`.
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<BoolOrInt>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match value {
        BoolOrInt::Bool(b) => Ok(Some(b)),
        BoolOrInt::Int(i) => Ok(Some(i != 0)),
        BoolOrInt::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            "" => Ok(None),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, got {other:?}"
            ))),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_without_msg_falls_back_to_code() {
        let env: Envelope<serde_json::Value> =
            serde_json::from_value(json!({ "code": 1234, "data": null })).unwrap();
        assert!(!env.is_success());
        assert_eq!(env.message(), "code=1234");
    }

    #[test]
    fn real_info_accepts_integer_booleans() {
        let info: DeviceRealInfo = serde_json::from_value(json!({
            "deviceSn": "AF1",
            "online": 1,
            "surplusGrain": 0,
            "lightSwitch": true,
            "unknownField": "ignored"
        }))
        .unwrap();

        assert!(info.is_online());
        assert_eq!(info.surplus_grain, Some(false));
        assert_eq!(info.light_switch, Some(true));
        assert_eq!(info.electric_quantity, None);
    }

    #[test]
    fn real_info_accepts_string_booleans() {
        let info: DeviceRealInfo = serde_json::from_value(json!({
            "deviceSn": "AF1",
            "online": "true",
            "surplusGrain": "0",
            "lightSwitch": "False",
            "soundSwitch": ""
        }))
        .unwrap();

        assert!(info.is_online());
        assert_eq!(info.surplus_grain, Some(false));
        assert_eq!(info.light_switch, Some(false));
        assert_eq!(info.sound_switch, None);
    }

    #[test]
    fn grain_status_defaults_missing_counters() {
        let status: GrainStatus = serde_json::from_value(json!({})).unwrap();
        assert_eq!(status, GrainStatus::default());
    }

    #[test]
    fn drink_water_keeps_unmodeled_fields() {
        let drink: DrinkWaterToday = serde_json::from_value(json!({
            "todayTotalMl": 310.5,
            "drinkTimes": 7
        }))
        .unwrap();
        assert_eq!(drink.today_total_ml, Some(310.5));
        assert_eq!(drink.extra.get("drinkTimes"), Some(&json!(7)));
    }
}
