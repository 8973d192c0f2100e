// ── Device events ──
//
// Edge-triggered notifications. Each is emitted once per transition,
// never on repeated observations of the resulting state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::snapshot::Capability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "capability", rename_all = "snake_case")]
pub enum DeviceEventKind {
    WentOffline,
    CameOnline,
    /// Stock went from ok to low.
    StockLow,
    CapabilityAdded(Capability),
    CapabilityRemoved(Capability),
}

impl fmt::Display for DeviceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WentOffline => f.write_str("went offline"),
            Self::CameOnline => f.write_str("came online"),
            Self::StockLow => f.write_str("stock low"),
            Self::CapabilityAdded(cap) => write!(f, "capability added: {cap}"),
            Self::CapabilityRemoved(cap) => write!(f, "capability removed: {cap}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub serial: String,
    pub kind: DeviceEventKind,
    pub at: DateTime<Utc>,
}

impl fmt::Display for DeviceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.serial, self.kind)
    }
}
