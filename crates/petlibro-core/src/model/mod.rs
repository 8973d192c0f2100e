// ── Domain model ──

pub mod catalog;
pub mod device;
pub mod event;
pub mod snapshot;

pub use catalog::{DeviceKind, PRODUCTS, Product};
pub use device::DeviceDescriptor;
pub use event::{DeviceEvent, DeviceEventKind};
pub use snapshot::{Battery, Capability, DeviceSnapshot, StockLevel};
