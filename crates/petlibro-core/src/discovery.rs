// ── Device discovery ──

use petlibro_api::ApiClient;

use crate::error::CoreError;
use crate::model::{DeviceDescriptor, DeviceKind};

/// List the account's devices, optionally keeping only one kind.
///
/// This is what a host offers when pairing: a feeder integration only
/// shows feeders, a fountain integration only fountains.
pub async fn discover(
    api: &ApiClient,
    kind: Option<DeviceKind>,
) -> Result<Vec<DeviceDescriptor>, CoreError> {
    let devices = api
        .list_devices()
        .await?
        .into_iter()
        .map(DeviceDescriptor::from)
        .filter(|d| kind.is_none_or(|k| d.kind == k))
        .collect();
    Ok(devices)
}

/// Find one device by serial.
pub async fn find(api: &ApiClient, serial: &str) -> Result<DeviceDescriptor, CoreError> {
    discover(api, None)
        .await?
        .into_iter()
        .find(|d| d.serial == serial)
        .ok_or_else(|| CoreError::DeviceNotFound {
            serial: serial.to_owned(),
        })
}
