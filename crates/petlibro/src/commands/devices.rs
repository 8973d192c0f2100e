//! Device listing, live status, and daily counters.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tabled::Tabled;

use petlibro_api::ApiClient;
use petlibro_core::{
    DeviceDescriptor, DeviceKind, DeviceSnapshot, Reconciler, ReconcilerConfig, StockLevel,
};

use crate::cli::{DevicesArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util::{self, or_dash, switch_label};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
}

impl From<&DeviceDescriptor> for DeviceRow {
    fn from(d: &DeviceDescriptor) -> Self {
        Self {
            serial: d.serial.clone(),
            name: d.name.clone(),
            model: d.model.clone(),
            kind: d.kind.to_string(),
            mac: d.mac.clone().unwrap_or_default(),
            firmware: d.firmware_version.clone().unwrap_or_default(),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn list(api: &ApiClient, args: &DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = petlibro_core::discover(api, args.kind).await?;
    let out = output::render_list(
        &global.output,
        &devices,
        |d| DeviceRow::from(d),
        |d| d.serial.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[derive(Debug, Serialize)]
struct StatusView {
    device: DeviceDescriptor,
    state: Arc<DeviceSnapshot>,
}

/// One reconciler cycle against a single device.
pub async fn status(api: &ApiClient, serial: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let device = util::find_device(api, serial).await?;

    let reconciler = Reconciler::new(
        api.clone(),
        ReconcilerConfig::default().with_poll_interval(Duration::ZERO),
    );
    reconciler.track(device.clone())?;
    let polled = reconciler.poll_device(serial).await;
    reconciler.shutdown().await;

    let view = StatusView {
        device,
        state: polled?,
    };
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &view,
        |v| status_detail(v, color),
        |v| if v.state.available { "online" } else { "offline" }.to_owned(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn status_detail(view: &StatusView, color: bool) -> String {
    let state = &view.state;
    let mut rows = vec![
        ("Serial", view.device.serial.clone()),
        ("Name", view.device.name.clone()),
        ("Model", view.device.model.clone()),
        (
            "Status",
            output::status_text(
                if state.available { "online" } else { "offline" },
                state.available,
                color,
            ),
        ),
    ];

    let stock_label = match view.device.kind {
        DeviceKind::Fountain => "Water",
        _ => "Food",
    };
    rows.push((
        stock_label,
        match state.stock {
            Some(StockLevel::Ok) => output::status_text("ok", true, color),
            Some(StockLevel::Low) => output::status_text("low", false, color),
            None => output::dim("unknown", color),
        },
    ));

    rows.push((
        "Battery",
        state.battery.map_or_else(
            || output::dim("mains", color),
            |b| output::status_text(&format!("{}%", b.level), !b.low, color),
        ),
    ));

    match view.device.kind {
        DeviceKind::Feeder => {
            rows.push(("Desiccant", days(state.desiccant_days)));
            rows.push(("Feedings today", or_dash(state.feedings_today)));
            rows.push(("Portions today", or_dash(state.portions_today)));
        }
        DeviceKind::Fountain => {
            rows.push(("Filter", days(state.filter_days)));
            rows.push(("Cleaning", days(state.cleaning_days)));
            rows.push(("Water today", ml(state.water_today_ml)));
        }
        DeviceKind::Unsupported => {}
    }

    rows.push(("Light", switch_label(state.light_on)));
    rows.push(("Sound", switch_label(state.sound_on)));
    rows.push(("Wi-Fi", state.wifi_rssi.map_or_else(|| "-".into(), |r| format!("{r} dBm"))));

    output::detail_block(&rows)
}

fn days(value: Option<i64>) -> String {
    value.map_or_else(|| "-".into(), |d| format!("{d} days left"))
}

fn ml(value: Option<f64>) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v:.0} ml"))
}

#[derive(Debug, Serialize)]
struct StatsView {
    serial: String,
    kind: DeviceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    feedings_today: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    portions_today: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    water_today_ml: Option<f64>,
}

pub async fn stats(api: &ApiClient, serial: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let device = util::find_device(api, serial).await?;

    let mut view = StatsView {
        serial: device.serial.clone(),
        kind: device.kind,
        feedings_today: None,
        portions_today: None,
        water_today_ml: None,
    };
    match device.kind {
        DeviceKind::Feeder => {
            let status = api.grain_status(serial).await?;
            view.feedings_today = Some(status.today_feeding_times);
            view.portions_today = Some(status.today_feeding_quantity);
        }
        DeviceKind::Fountain => {
            let drink = api.drink_water_today(serial).await?;
            view.water_today_ml = Some(drink.today_total_ml.unwrap_or_default());
        }
        DeviceKind::Unsupported => {
            return Err(CliError::UnsupportedDevice {
                serial: serial.into(),
                expected: "feeder or fountain".into(),
            });
        }
    }

    let out = output::render_single(
        &global.output,
        &view,
        |v| match v.kind {
            DeviceKind::Fountain => output::detail_block(&[("Water today", ml(v.water_today_ml))]),
            _ => output::detail_block(&[
                ("Feedings today", or_dash(v.feedings_today)),
                ("Portions today", or_dash(v.portions_today)),
            ]),
        },
        |v| match v.kind {
            DeviceKind::Fountain => or_dash(v.water_today_ml),
            _ => or_dash(v.portions_today),
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
