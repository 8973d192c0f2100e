//! Device actions: manual feed, light and sound switches.

use std::num::NonZeroU32;

use petlibro_api::ApiClient;
use petlibro_core::DeviceKind;

use crate::cli::{GlobalOpts, Switch};
use crate::error::CliError;

use super::util;

pub async fn feed(
    api: &ApiClient,
    serial: &str,
    portions: NonZeroU32,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::find_kind(api, serial, DeviceKind::Feeder).await?;
    api.manual_feed(serial, portions).await?;
    if !global.quiet {
        eprintln!("✓ Dispensing {portions} portion(s) on {serial}");
    }
    Ok(())
}

pub async fn light(
    api: &ApiClient,
    serial: &str,
    state: Switch,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    api.set_light_switch(serial, state.enabled()).await?;
    if !global.quiet {
        eprintln!("✓ Light {} on {serial}", label(state));
    }
    Ok(())
}

pub async fn sound(
    api: &ApiClient,
    serial: &str,
    state: Switch,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    api.set_sound_switch(serial, state.enabled()).await?;
    if !global.quiet {
        eprintln!("✓ Sound {} on {serial}", label(state));
    }
    Ok(())
}

fn label(state: Switch) -> &'static str {
    if state.enabled() { "enabled" } else { "disabled" }
}
