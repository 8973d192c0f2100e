// ── Device snapshot ──
//
// Level-triggered state the reconciler publishes after every poll.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::catalog::DeviceKind;

/// A feature a device currently exposes to the host.
///
/// Only [`Capability::Battery`] changes at runtime; the rest are fixed by
/// the device kind.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    Battery,
    FoodLevel,
    WaterLevel,
    FeedingStats,
    DrinkingStats,
    Desiccant,
    FilterLife,
    CleaningCycle,
    WifiSignal,
}

impl Capability {
    /// Capabilities every device of `kind` has regardless of hardware variant.
    pub fn base_set(kind: DeviceKind) -> BTreeSet<Self> {
        let caps: &[Self] = match kind {
            DeviceKind::Feeder => &[
                Self::FoodLevel,
                Self::FeedingStats,
                Self::Desiccant,
                Self::WifiSignal,
            ],
            DeviceKind::Fountain => &[
                Self::WaterLevel,
                Self::DrinkingStats,
                Self::FilterLife,
                Self::CleaningCycle,
                Self::WifiSignal,
            ],
            DeviceKind::Unsupported => &[Self::WifiSignal],
        };
        caps.iter().copied().collect()
    }
}

/// Food or water reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StockLevel {
    Ok,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battery {
    /// Percentage, 1..=100.
    pub level: u8,
    pub low: bool,
}

/// Last known state of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub serial: String,
    pub kind: DeviceKind,
    pub available: bool,
    /// `None` on mains-powered hardware.
    pub battery: Option<Battery>,
    /// `None` until the device has reported it.
    pub stock: Option<StockLevel>,
    pub desiccant_days: Option<i64>,
    pub filter_days: Option<i64>,
    pub cleaning_days: Option<i64>,
    pub wifi_rssi: Option<i64>,
    pub light_on: Option<bool>,
    pub sound_on: Option<bool>,
    pub feedings_today: Option<i64>,
    pub portions_today: Option<i64>,
    pub water_today_ml: Option<f64>,
    pub capabilities: BTreeSet<Capability>,
    pub last_polled: Option<DateTime<Utc>>,
}

impl DeviceSnapshot {
    /// State before the first poll: assumed available, nothing known yet.
    pub fn initial(serial: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            serial: serial.into(),
            kind,
            available: true,
            battery: None,
            stock: None,
            desiccant_days: None,
            filter_days: None,
            cleaning_days: None,
            wifi_rssi: None,
            light_on: None,
            sound_on: None,
            feedings_today: None,
            portions_today: None,
            water_today_ml: None,
            capabilities: Capability::base_set(kind),
            last_polled: None,
        }
    }

    pub fn is_online(&self) -> bool {
        self.available
    }

    pub fn is_food_low(&self) -> bool {
        self.stock == Some(StockLevel::Low)
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_snapshot_is_available_and_unknown() {
        let snap = DeviceSnapshot::initial("AF0001", DeviceKind::Feeder);
        assert!(snap.is_online());
        assert!(!snap.is_food_low());
        assert!(snap.has_capability(Capability::FoodLevel));
        assert!(!snap.has_capability(Capability::Battery));
        assert!(!snap.has_capability(Capability::FilterLife));
    }

    #[test]
    fn capability_names_are_snake_case() {
        assert_eq!(Capability::WifiSignal.to_string(), "wifi_signal");
        assert_eq!(StockLevel::Low.to_string(), "low");
    }
}
