//! Domain layer between `petlibro-api` and hosts (CLI, home-automation bridges).
//!
//! - **[`Reconciler`]**: polls each tracked device on its own timer, diffs
//!   the fresh real-time payload against the last snapshot, and publishes
//!   level-triggered state ([`subscribe()`](Reconciler::subscribe)) plus
//!   edge-triggered [`DeviceEvent`]s ([`events()`](Reconciler::events)).
//!
//! - **Domain model** ([`model`]): the product catalog, [`DeviceDescriptor`],
//!   [`DeviceSnapshot`], and the capability set a device exposes.
//!
//! - **[`diff`]**: the pure transition function behind every poll cycle.
//!
//! The host owns the [`petlibro_api::ApiClient`] and injects one shared
//! instance into the reconciler.

pub mod config;
pub mod diff;
pub mod discovery;
pub mod error;
pub mod model;
pub mod reconciler;
mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ReconcilerConfig;
pub use discovery::{discover, find};
pub use error::CoreError;
pub use reconciler::Reconciler;

pub use model::{
    Battery, Capability, DeviceDescriptor, DeviceEvent, DeviceEventKind, DeviceKind,
    DeviceSnapshot, StockLevel,
};
