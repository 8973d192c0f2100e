//! Long-running watch: track devices and print their events until Ctrl-C.

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use petlibro_api::ApiClient;
use petlibro_core::{DeviceEvent, DeviceEventKind, Reconciler, ReconcilerConfig};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    api: &ApiClient,
    args: &WatchArgs,
    mut config: ReconcilerConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(secs) = args.interval {
        config.poll_interval = Duration::from_secs(secs);
    }
    if config.poll_interval.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be at least one second".into(),
        });
    }

    let listed = petlibro_core::discover(api, None).await?;
    let devices = if args.serials.is_empty() {
        listed.into_iter().filter(|d| d.kind.is_supported()).collect()
    } else {
        let mut picked = Vec::with_capacity(args.serials.len());
        for serial in &args.serials {
            let device = listed
                .iter()
                .find(|d| &d.serial == serial)
                .ok_or_else(|| CliError::DeviceNotFound {
                    serial: serial.clone(),
                })?;
            picked.push(device.clone());
        }
        picked
    };

    if devices.is_empty() {
        if !global.quiet {
            eprintln!("No feeders or fountains on this account.");
        }
        return Ok(());
    }

    let reconciler = Reconciler::new(api.clone(), config);
    let mut events = reconciler.events();
    for device in devices {
        reconciler.track(device)?;
    }
    if !global.quiet {
        eprintln!(
            "Watching {} device(s) every {}s. Press Ctrl-C to stop.",
            reconciler.tracked().len(),
            reconciler.config().poll_interval.as_secs()
        );
    }

    let color = output::should_color(&global.color);
    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            received = events.recv() => match received {
                Ok(event) => output::print_output(&render_event(&event, &global.output, color), global.quiet),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!("stopping watch");
    reconciler.shutdown().await;
    Ok(())
}

fn render_event(event: &DeviceEvent, format: &OutputFormat, color: bool) -> String {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            // One record per line keeps the stream greppable.
            output::render_json_compact(event)
        }
        OutputFormat::Plain => event.to_string(),
        OutputFormat::Table => {
            let healthy = matches!(
                event.kind,
                DeviceEventKind::CameOnline | DeviceEventKind::CapabilityAdded(_)
            );
            format!(
                "{}  {}  {}",
                output::dim(&event.at.format("%Y-%m-%d %H:%M:%S").to_string(), color),
                event.serial,
                output::status_text(&event.kind.to_string(), healthy, color),
            )
        }
    }
}
