// ── Device descriptor ──

use petlibro_api::DeviceListItem;
use serde::{Deserialize, Serialize};

use super::catalog::{self, DeviceKind};

/// One device bound to the account, as listed by the cloud.
///
/// Immutable once listed; the whole list is re-fetched on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub serial: String,
    pub name: String,
    pub mac: Option<String>,
    pub product_identifier: Option<String>,
    pub model: String,
    pub kind: DeviceKind,
    pub firmware_version: Option<String>,
    pub hardware_version: Option<String>,
}

impl DeviceDescriptor {
    /// Bare descriptor for a serial the host already knows the kind of.
    pub fn new(serial: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            serial: serial.into(),
            name: kind.default_name().to_owned(),
            mac: None,
            product_identifier: None,
            model: String::from("Unknown"),
            kind,
            firmware_version: None,
            hardware_version: None,
        }
    }
}

impl From<DeviceListItem> for DeviceDescriptor {
    fn from(item: DeviceListItem) -> Self {
        let product = item.product_identifier.as_deref().and_then(catalog::lookup);
        let kind = product.map_or(DeviceKind::Unsupported, |p| p.kind);
        let product_name = non_empty(item.product_name);

        let name = non_empty(item.name)
            .or_else(|| product_name.clone())
            .unwrap_or_else(|| kind.default_name().to_owned());

        let model = product
            .map(|p| p.name.to_owned())
            .or(product_name)
            .or_else(|| item.product_identifier.clone())
            .unwrap_or_else(|| String::from("Unknown"));

        Self {
            serial: item.device_sn,
            name,
            mac: non_empty(item.mac),
            product_identifier: item.product_identifier,
            model,
            kind,
            firmware_version: non_empty(item.software_version),
            hardware_version: non_empty(item.hardware_version),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
