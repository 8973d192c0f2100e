// Typed PETLIBRO endpoints built on `Session`.
//
// Device-scoped calls send the serial as both `id` and `deviceSn`; the
// vendor keys some endpoints on one name and some on the other.

use std::num::NonZeroU32;

use secrecy::SecretString;
use serde::de::IgnoredAny;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::Error;
use crate::models::{DeviceListItem, DeviceRealInfo, DrinkWaterToday, GrainStatus};
use crate::session::Session;

mod paths {
    pub const DEVICE_LIST: &str = "/device/device/list";
    pub const REAL_INFO: &str = "/device/device/realInfo";
    pub const GRAIN_STATUS: &str = "/data/data/grainStatus";
    pub const DRINK_WATER_TODAY: &str = "/data/deviceDrinkWater/todayDrinkData";
    pub const LIGHT_SWITCH: &str = "/device/setting/updateLightSwitch";
    pub const SOUND_SWITCH: &str = "/device/setting/updateSoundSwitch";
    pub const MANUAL_FEEDING: &str = "/device/device/manualFeeding";
}

/// Typed façade over a [`Session`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    session: Session,
}

impl ApiClient {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Log in and return the new token.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<String, Error> {
        self.session.login(email, password).await
    }

    /// All devices bound to the account. A `null` payload means none.
    pub async fn list_devices(&self) -> Result<Vec<DeviceListItem>, Error> {
        let devices: Option<Vec<DeviceListItem>> =
            self.session.request(paths::DEVICE_LIST, None).await?;
        Ok(devices.unwrap_or_default())
    }

    pub async fn device_real_info(&self, serial: &str) -> Result<DeviceRealInfo, Error> {
        self.session
            .request(paths::REAL_INFO, Some(device_body(serial)))
            .await
    }

    /// Today's feeding counters (feeders).
    pub async fn grain_status(&self, serial: &str) -> Result<GrainStatus, Error> {
        let status: Option<GrainStatus> = self
            .session
            .request(paths::GRAIN_STATUS, Some(device_body(serial)))
            .await?;
        Ok(status.unwrap_or_default())
    }

    /// Today's drinking data (fountains).
    pub async fn drink_water_today(&self, serial: &str) -> Result<DrinkWaterToday, Error> {
        let drink: Option<DrinkWaterToday> = self
            .session
            .request(paths::DRINK_WATER_TODAY, Some(device_body(serial)))
            .await?;
        Ok(drink.unwrap_or_default())
    }

    pub async fn set_light_switch(&self, serial: &str, enable: bool) -> Result<(), Error> {
        debug!(serial, enable, "setting light switch");
        self.command(
            paths::LIGHT_SWITCH,
            serial,
            json!({ "lightSwitch": u8::from(enable) }),
        )
        .await
    }

    pub async fn set_sound_switch(&self, serial: &str, enable: bool) -> Result<(), Error> {
        debug!(serial, enable, "setting sound switch");
        self.command(
            paths::SOUND_SWITCH,
            serial,
            json!({ "soundSwitch": u8::from(enable) }),
        )
        .await
    }

    /// Dispense `portions` right now. Range limits are enforced by the vendor.
    pub async fn manual_feed(&self, serial: &str, portions: NonZeroU32) -> Result<(), Error> {
        debug!(serial, portions = portions.get(), "triggering manual feed");
        self.command(
            paths::MANUAL_FEEDING,
            serial,
            json!({ "grainNum": portions.get() }),
        )
        .await
    }

    /// Device-scoped call whose payload is ignored.
    async fn command(&self, path: &str, serial: &str, extra: Value) -> Result<(), Error> {
        let mut body = device_body(serial);
        if let (Some(fields), Value::Object(extra)) = (body.as_object_mut(), extra) {
            fields.extend(extra);
        }
        let _: IgnoredAny = self.session.request(path, Some(body)).await?;
        Ok(())
    }
}

/// `{ "id": serial, "deviceSn": serial }`
fn device_body(serial: &str) -> Value {
    json!({ "id": serial, "deviceSn": serial })
}
