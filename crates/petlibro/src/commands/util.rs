//! Shared helpers for command handlers.

use petlibro_api::ApiClient;
use petlibro_core::{DeviceDescriptor, DeviceKind};

use crate::error::CliError;

/// Look up a device by serial in the account's device list.
pub async fn find_device(api: &ApiClient, serial: &str) -> Result<DeviceDescriptor, CliError> {
    Ok(petlibro_core::find(api, serial).await?)
}

/// Look up a device and require it to be of `kind`.
pub async fn find_kind(
    api: &ApiClient,
    serial: &str,
    kind: DeviceKind,
) -> Result<DeviceDescriptor, CliError> {
    let device = find_device(api, serial).await?;
    if device.kind != kind {
        return Err(CliError::UnsupportedDevice {
            serial: serial.into(),
            expected: kind.to_string(),
        });
    }
    Ok(device)
}

/// `on` / `off` / `-` for optional switches.
pub fn switch_label(value: Option<bool>) -> String {
    match value {
        Some(true) => "on".into(),
        Some(false) => "off".into(),
        None => "-".into(),
    }
}

pub fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}
