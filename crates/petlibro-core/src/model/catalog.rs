// ── Product catalog ──
//
// Maps vendor product identifiers to a model name and a device kind.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Which reconciler field mapping a device uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceKind {
    Feeder,
    Fountain,
    /// Listed by the account but not a product this crate knows how to poll.
    Unsupported,
}

impl DeviceKind {
    /// Display name used when the vendor gives the device no name at all.
    pub fn default_name(self) -> &'static str {
        match self {
            Self::Feeder => "Petlibro Feeder",
            Self::Fountain => "Petlibro Fountain",
            Self::Unsupported => "Petlibro Device",
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product {
    pub identifier: &'static str,
    pub name: &'static str,
    pub kind: DeviceKind,
}

const fn feeder(identifier: &'static str, name: &'static str) -> Product {
    Product {
        identifier,
        name,
        kind: DeviceKind::Feeder,
    }
}

const fn fountain(identifier: &'static str, name: &'static str) -> Product {
    Product {
        identifier,
        name,
        kind: DeviceKind::Fountain,
    }
}

pub const PRODUCTS: &[Product] = &[
    feeder("PLAF103", "Granary Smart Feeder"),
    feeder("PLAF107", "Space Smart Feeder"),
    feeder("PLAF108", "Air Smart Feeder"),
    feeder("PLAF109", "Polar Wet Food Feeder"),
    feeder("PLAF203", "Granary Camera Feeder"),
    feeder("PLAF301", "One RFID Smart Feeder"),
    fountain("PLWF105", "Dockstream Smart Fountain"),
    fountain("PLWF305", "Dockstream RFID Fountain"),
    fountain("PLWF106", "Dockstream 2 Smart Fountain"),
    fountain("PLWF116", "Dockstream 2 Cordless"),
];

/// Look up a product by its exact vendor identifier.
pub fn lookup(identifier: &str) -> Option<&'static Product> {
    PRODUCTS.iter().find(|p| p.identifier == identifier)
}

/// Device kind for a product identifier; unknown or missing identifiers
/// are [`DeviceKind::Unsupported`].
pub fn kind_of(identifier: Option<&str>) -> DeviceKind {
    identifier
        .and_then(lookup)
        .map_or(DeviceKind::Unsupported, |p| p.kind)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_feeder_is_a_feeder() {
        for id in ["PLAF103", "PLAF107", "PLAF108", "PLAF109", "PLAF203", "PLAF301"] {
            assert_eq!(kind_of(Some(id)), DeviceKind::Feeder, "{id}");
        }
    }

    #[test]
    fn every_fountain_is_a_fountain() {
        for id in ["PLWF105", "PLWF305", "PLWF106", "PLWF116"] {
            assert_eq!(kind_of(Some(id)), DeviceKind::Fountain, "{id}");
        }
    }

    #[test]
    fn unknown_products_are_unsupported() {
        assert_eq!(kind_of(Some("PLLB001")), DeviceKind::Unsupported);
        assert_eq!(kind_of(Some("plaf103")), DeviceKind::Unsupported);
        assert_eq!(kind_of(None), DeviceKind::Unsupported);
    }

    #[test]
    fn lookup_returns_model_name() {
        assert_eq!(lookup("PLWF116").unwrap().name, "Dockstream 2 Cordless");
        assert!(lookup("").is_none());
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!(DeviceKind::from_str("Fountain").unwrap(), DeviceKind::Fountain);
        assert_eq!(DeviceKind::Feeder.to_string(), "feeder");
        assert_eq!(DeviceKind::iter().filter(|k| k.is_supported()).count(), 2);
    }
}
