// ── Snapshot diffing ──
//
// Pure transition function: previous snapshot + fresh real-time info in,
// next snapshot + edge events out. No I/O, so every transition rule is
// unit-testable without a runtime.

use chrono::{DateTime, Utc};
use petlibro_api::{DeviceRealInfo, DrinkWaterToday, GrainStatus};

use crate::model::{Battery, Capability, DeviceEventKind, DeviceKind, DeviceSnapshot, StockLevel};

/// Fountain water reserve below this percentage counts as low.
const LOW_WATER_PERCENT: f64 = 10.0;

/// Result of applying one successful real-info fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub snapshot: DeviceSnapshot,
    pub events: Vec<DeviceEventKind>,
    /// `false` when the device reported offline and the cycle should stop.
    pub online: bool,
}

/// Diff `info` against `previous`.
///
/// An offline report only flips availability; every other field keeps its
/// previous value. Fields the device omits also keep their previous value.
pub fn observe(
    previous: &DeviceSnapshot,
    info: &DeviceRealInfo,
    low_battery_threshold: u8,
    now: DateTime<Utc>,
) -> Observation {
    let mut next = previous.clone();
    let mut events = Vec::new();
    next.last_polled = Some(now);

    if !info.is_online() {
        if previous.available {
            next.available = false;
            events.push(DeviceEventKind::WentOffline);
        }
        return Observation {
            snapshot: next,
            events,
            online: false,
        };
    }

    if !previous.available {
        next.available = true;
        events.push(DeviceEventKind::CameOnline);
    }

    // Battery presence distinguishes mains and battery variants of one product.
    next.battery = battery(info.electric_quantity, low_battery_threshold);
    let had_battery = previous.has_capability(Capability::Battery);
    match (had_battery, next.battery.is_some()) {
        (false, true) => {
            next.capabilities.insert(Capability::Battery);
            events.push(DeviceEventKind::CapabilityAdded(Capability::Battery));
        }
        (true, false) => {
            next.capabilities.remove(&Capability::Battery);
            events.push(DeviceEventKind::CapabilityRemoved(Capability::Battery));
        }
        _ => {}
    }

    next.stock = stock(previous.kind, info).or(previous.stock);
    if previous.stock == Some(StockLevel::Ok) && next.stock == Some(StockLevel::Low) {
        events.push(DeviceEventKind::StockLow);
    }

    next.desiccant_days = info.remaining_desiccant_days.or(previous.desiccant_days);
    next.filter_days = info.remaining_replacement_days.or(previous.filter_days);
    next.cleaning_days = info.remaining_cleaning_days.or(previous.cleaning_days);
    next.wifi_rssi = info.wifi_rssi.or(previous.wifi_rssi);
    next.light_on = info.light_switch.or(previous.light_on);
    next.sound_on = info.sound_switch.or(previous.sound_on);
    next.water_today_ml = info.today_total_ml.or(previous.water_today_ml);

    Observation {
        snapshot: next,
        events,
        online: true,
    }
}

/// Merge today's feeding counters into a snapshot.
pub fn apply_feeding(snapshot: &mut DeviceSnapshot, status: &GrainStatus) {
    snapshot.portions_today = Some(status.today_feeding_quantity);
    snapshot.feedings_today = Some(status.today_feeding_times);
}

/// Merge today's drinking volume into a snapshot. A payload without a
/// volume leaves the previous value in place.
pub fn apply_drinking(snapshot: &mut DeviceSnapshot, drink: &DrinkWaterToday) {
    if let Some(ml) = drink.today_total_ml {
        snapshot.water_today_ml = Some(ml);
    }
}

/// Zero or absent means mains powered.
fn battery(level: Option<i64>, low_threshold: u8) -> Option<Battery> {
    let level = level.filter(|l| *l > 0)?;
    let level = u8::try_from(level.min(100)).ok()?;
    Some(Battery {
        level,
        low: level < low_threshold,
    })
}

fn stock(kind: DeviceKind, info: &DeviceRealInfo) -> Option<StockLevel> {
    match kind {
        DeviceKind::Feeder => Some(if info.surplus_grain == Some(false) {
            StockLevel::Low
        } else {
            StockLevel::Ok
        }),
        DeviceKind::Fountain => info.weight_percent.map(|pct| {
            if pct < LOW_WATER_PERCENT {
                StockLevel::Low
            } else {
                StockLevel::Ok
            }
        }),
        DeviceKind::Unsupported => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn online() -> DeviceRealInfo {
        DeviceRealInfo {
            online: Some(true),
            ..DeviceRealInfo::default()
        }
    }

    fn offline() -> DeviceRealInfo {
        DeviceRealInfo {
            online: Some(false),
            ..DeviceRealInfo::default()
        }
    }

    /// Feed `infos` through `observe` in order, collecting the events of each step.
    fn run(kind: DeviceKind, infos: &[DeviceRealInfo]) -> (DeviceSnapshot, Vec<Vec<DeviceEventKind>>) {
        let mut snap = DeviceSnapshot::initial("AF0001", kind);
        let mut steps = Vec::new();
        for info in infos {
            let obs = observe(&snap, info, 15, Utc::now());
            snap = obs.snapshot;
            steps.push(obs.events);
        }
        (snap, steps)
    }

    fn grain(ok: bool) -> DeviceRealInfo {
        DeviceRealInfo {
            surplus_grain: Some(ok),
            ..online()
        }
    }

    fn battery_info(level: Option<i64>) -> DeviceRealInfo {
        DeviceRealInfo {
            electric_quantity: level,
            ..online()
        }
    }

    #[test]
    fn offline_fires_once_and_online_once() {
        let seq = [online(), online(), offline(), offline(), online()];
        let (snap, steps) = run(DeviceKind::Feeder, &seq);

        assert_eq!(
            steps,
            vec![
                vec![],
                vec![],
                vec![DeviceEventKind::WentOffline],
                vec![],
                vec![DeviceEventKind::CameOnline],
            ]
        );
        assert!(snap.available);
    }

    #[test]
    fn stock_low_fires_only_on_ok_to_low() {
        let seq = [grain(true), grain(true), grain(false), grain(false), grain(true), grain(false)];
        let (_, steps) = run(DeviceKind::Feeder, &seq);

        let fired: Vec<usize> = steps
            .iter()
            .enumerate()
            .filter(|(_, ev)| ev.contains(&DeviceEventKind::StockLow))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(fired, vec![2, 5]);
    }

    #[test]
    fn first_poll_reporting_low_does_not_fire() {
        let (snap, steps) = run(DeviceKind::Feeder, &[grain(false)]);
        assert_eq!(steps, vec![Vec::<DeviceEventKind>::new()]);
        assert!(snap.is_food_low());
    }

    #[test]
    fn missing_surplus_grain_counts_as_ok() {
        let (snap, _) = run(DeviceKind::Feeder, &[online()]);
        assert_eq!(snap.stock, Some(StockLevel::Ok));
    }

    #[test]
    fn battery_capability_tracks_field_presence() {
        let seq = [battery_info(None), battery_info(Some(42)), battery_info(Some(40)), battery_info(None)];
        let (snap, steps) = run(DeviceKind::Fountain, &seq);

        assert_eq!(
            steps,
            vec![
                vec![],
                vec![DeviceEventKind::CapabilityAdded(Capability::Battery)],
                vec![],
                vec![DeviceEventKind::CapabilityRemoved(Capability::Battery)],
            ]
        );
        assert!(!snap.has_capability(Capability::Battery));
        assert_eq!(snap.battery, None);
    }

    #[test]
    fn zero_battery_means_mains() {
        let (snap, steps) = run(DeviceKind::Fountain, &[battery_info(Some(0))]);
        assert_eq!(snap.battery, None);
        assert_eq!(steps, vec![Vec::<DeviceEventKind>::new()]);
    }

    #[test]
    fn low_battery_flag_uses_threshold() {
        let (snap, _) = run(DeviceKind::Feeder, &[battery_info(Some(14))]);
        assert_eq!(snap.battery, Some(Battery { level: 14, low: true }));

        let (snap, _) = run(DeviceKind::Feeder, &[battery_info(Some(15))]);
        assert_eq!(snap.battery, Some(Battery { level: 15, low: false }));
    }

    #[test]
    fn offline_poll_leaves_fields_untouched() {
        let first = DeviceRealInfo {
            wifi_rssi: Some(-60),
            electric_quantity: Some(80),
            ..grain(true)
        };
        let (snap, _) = run(DeviceKind::Feeder, &[first, offline()]);

        assert!(!snap.available);
        assert_eq!(snap.wifi_rssi, Some(-60));
        assert_eq!(snap.battery.map(|b| b.level), Some(80));
        assert_eq!(snap.stock, Some(StockLevel::Ok));
        assert!(snap.has_capability(Capability::Battery));
    }

    #[test]
    fn fountain_stock_from_weight_percent() {
        let water = |pct: Option<f64>| DeviceRealInfo {
            weight_percent: pct,
            ..online()
        };
        let (snap, steps) = run(
            DeviceKind::Fountain,
            &[water(None), water(Some(55.0)), water(None), water(Some(5.0))],
        );

        assert_eq!(snap.stock, Some(StockLevel::Low));
        assert_eq!(steps[3], vec![DeviceEventKind::StockLow]);
    }

    #[test]
    fn omitted_counters_keep_previous_values() {
        let first = DeviceRealInfo {
            remaining_replacement_days: Some(20),
            remaining_cleaning_days: Some(3),
            today_total_ml: Some(120.0),
            light_switch: Some(true),
            ..online()
        };
        let (snap, _) = run(DeviceKind::Fountain, &[first, online()]);

        assert_eq!(snap.filter_days, Some(20));
        assert_eq!(snap.cleaning_days, Some(3));
        assert_eq!(snap.water_today_ml, Some(120.0));
        assert_eq!(snap.light_on, Some(true));
    }

    #[test]
    fn stats_merge_into_snapshot() {
        let mut snap = DeviceSnapshot::initial("AF0001", DeviceKind::Feeder);
        apply_feeding(
            &mut snap,
            &GrainStatus {
                today_feeding_quantity: 12,
                today_feeding_times: 3,
            },
        );
        assert_eq!(snap.portions_today, Some(12));
        assert_eq!(snap.feedings_today, Some(3));

        let mut snap = DeviceSnapshot::initial("WF0001", DeviceKind::Fountain);
        snap.water_today_ml = Some(80.0);
        apply_drinking(&mut snap, &DrinkWaterToday::default());
        assert_eq!(snap.water_today_ml, Some(80.0));
    }
}
