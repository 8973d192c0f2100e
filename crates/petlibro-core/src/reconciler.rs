// ── Device reconciler ──
//
// Polls every tracked device on its own timer, diffs the fresh payload
// against the stored snapshot, publishes the new snapshot and broadcasts
// edge events. A failed fetch leaves the snapshot untouched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use petlibro_api::ApiClient;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ReconcilerConfig;
use crate::diff;
use crate::error::CoreError;
use crate::model::{DeviceDescriptor, DeviceEvent, DeviceEventKind, DeviceKind, DeviceSnapshot};
use crate::store::{Generation, SnapshotStore};

const EVENT_CHANNEL_SIZE: usize = 256;

/// Drives the poll cycle of every tracked device.
///
/// Cheaply cloneable via `Arc<ReconcilerInner>`. Devices are independent:
/// a slow or failing device never delays another. Call
/// [`shutdown()`](Self::shutdown) before dropping the last handle, since
/// the background tasks keep their own clone alive.
#[derive(Clone)]
pub struct Reconciler {
    inner: Arc<ReconcilerInner>,
}

struct ReconcilerInner {
    api: ApiClient,
    config: ReconcilerConfig,
    store: SnapshotStore,
    devices: DashMap<String, Arc<TrackedDevice>>,
    event_tx: broadcast::Sender<DeviceEvent>,
    cancel: CancellationToken,
    next_generation: AtomicU64,
}

struct TrackedDevice {
    descriptor: DeviceDescriptor,
    /// Ties this entry to its slot in the snapshot store.
    generation: Generation,
    /// Serialises cycles of this device (periodic and on-demand).
    cycle: Mutex<()>,
    /// Child of the reconciler token; cancelled on untrack.
    cancel: CancellationToken,
    task: StdMutex<Option<JoinHandle<()>>>,
}

impl TrackedDevice {
    fn take_task(&self) -> Option<JoinHandle<()>> {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.inner.config)
            .field("tracked", &self.inner.devices.len())
            .field("snapshots", &self.inner.store.len())
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(api: ApiClient, config: ReconcilerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            inner: Arc::new(ReconcilerInner {
                api,
                config,
                store: SnapshotStore::new(),
                devices: DashMap::new(),
                event_tx,
                cancel: CancellationToken::new(),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    // ── Device lifecycle ─────────────────────────────────────────

    /// Start reconciling a device.
    ///
    /// Spawns the device's periodic task, whose first cycle runs right
    /// away. With a zero poll interval no task is spawned and the host
    /// drives cycles through [`poll_device()`](Self::poll_device).
    /// Returns `false` if the serial is already tracked.
    pub fn track(&self, descriptor: DeviceDescriptor) -> Result<bool, CoreError> {
        if !descriptor.kind.is_supported() {
            return Err(CoreError::UnsupportedProduct {
                identifier: descriptor
                    .product_identifier
                    .clone()
                    .unwrap_or_else(|| descriptor.serial.clone()),
            });
        }
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Internal("reconciler has been shut down".into()));
        }

        let serial = descriptor.serial.clone();
        let device = Arc::new(TrackedDevice {
            generation: self.inner.next_generation.fetch_add(1, Ordering::Relaxed),
            cancel: self.inner.cancel.child_token(),
            cycle: Mutex::new(()),
            task: StdMutex::new(None),
            descriptor,
        });

        match self.inner.devices.entry(serial.clone()) {
            Entry::Occupied(_) => return Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&device));
            }
        }
        self.inner.store.insert(
            DeviceSnapshot::initial(&serial, device.descriptor.kind),
            device.generation,
        );

        let interval = self.inner.config.poll_interval;
        if !interval.is_zero() {
            let handle = tokio::spawn(poll_task(self.clone(), serial.clone(), Arc::clone(&device)));
            *device.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        }

        info!(serial = %serial, kind = %device.descriptor.kind, "tracking device");
        Ok(true)
    }

    /// Stop reconciling a device and discard its snapshot. An in-flight
    /// cycle is abandoned. Returns `false` if the serial was not tracked.
    pub fn untrack(&self, serial: &str) -> bool {
        let Some((_, device)) = self.inner.devices.remove(serial) else {
            return false;
        };
        device.cancel.cancel();
        drop(device.take_task());
        self.inner.store.remove(serial, device.generation);
        info!(serial, "stopped tracking device");
        true
    }

    /// Cancel every device task and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let devices: Vec<Arc<TrackedDevice>> = self
            .inner
            .devices
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for device in devices {
            if let Some(handle) = device.take_task() {
                let _ = handle.await;
            }
        }

        self.inner.devices.clear();
        self.inner.store.clear();
        debug!("reconciler shut down");
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Run one cycle for `serial` now.
    ///
    /// Waits for a cycle already running on the same device. On a fetch
    /// error the stored snapshot is left as it was and the error returned.
    pub async fn poll_device(&self, serial: &str) -> Result<Arc<DeviceSnapshot>, CoreError> {
        let device = self.device(serial)?;
        self.inner.cycle(&device).await
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn snapshot(&self, serial: &str) -> Option<Arc<DeviceSnapshot>> {
        self.inner.store.get(serial)
    }

    /// Watch one device's snapshot. The channel closes when the device is
    /// untracked.
    pub fn subscribe(&self, serial: &str) -> Option<watch::Receiver<Arc<DeviceSnapshot>>> {
        self.inner.store.subscribe(serial)
    }

    /// Subscribe to edge events of every tracked device.
    pub fn events(&self) -> broadcast::Receiver<DeviceEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Descriptors of every tracked device, ordered by serial.
    pub fn tracked(&self) -> Vec<DeviceDescriptor> {
        let mut tracked: Vec<DeviceDescriptor> = self
            .inner
            .devices
            .iter()
            .map(|entry| entry.value().descriptor.clone())
            .collect();
        tracked.sort_by(|a, b| a.serial.cmp(&b.serial));
        tracked
    }

    pub fn is_tracked(&self, serial: &str) -> bool {
        self.inner.devices.contains_key(serial)
    }

    fn device(&self, serial: &str) -> Result<Arc<TrackedDevice>, CoreError> {
        self.inner
            .devices
            .get(serial)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| CoreError::NotTracked {
                serial: serial.to_owned(),
            })
    }
}

impl ReconcilerInner {
    async fn cycle(&self, device: &TrackedDevice) -> Result<Arc<DeviceSnapshot>, CoreError> {
        let _guard = device.cycle.lock().await;
        let serial = device.descriptor.serial.as_str();
        let not_tracked = || CoreError::NotTracked {
            serial: serial.to_owned(),
        };

        let info = self.api.device_real_info(serial).await?;

        if device.cancel.is_cancelled() {
            return Err(not_tracked());
        }
        let previous = self.store.get(serial).ok_or_else(not_tracked)?;

        let mut observation = diff::observe(
            &previous,
            &info,
            self.config.low_battery_threshold,
            Utc::now(),
        );

        if observation.online {
            self.refresh_stats(device.descriptor.kind, serial, &mut observation.snapshot)
                .await;
            if device.cancel.is_cancelled() {
                return Err(not_tracked());
            }
        }

        // Misses if the serial was untracked (or re-tracked) meanwhile.
        let snapshot = self
            .store
            .publish(observation.snapshot, device.generation)
            .ok_or_else(not_tracked)?;

        for kind in observation.events {
            match kind {
                DeviceEventKind::WentOffline => info!(serial, "device went offline"),
                DeviceEventKind::CameOnline => info!(serial, "device back online"),
                _ => debug!(serial, event = %kind, "device event"),
            }
            // No receivers is fine.
            let _ = self.event_tx.send(DeviceEvent {
                serial: serial.to_owned(),
                kind,
                at: Utc::now(),
            });
        }

        Ok(snapshot)
    }

    /// Best-effort daily counters. Failure keeps the previous values.
    async fn refresh_stats(&self, kind: DeviceKind, serial: &str, snapshot: &mut DeviceSnapshot) {
        match kind {
            DeviceKind::Feeder => match self.api.grain_status(serial).await {
                Ok(status) => diff::apply_feeding(snapshot, &status),
                Err(e) => warn!(serial, error = %e, "feeding stats unavailable"),
            },
            DeviceKind::Fountain => match self.api.drink_water_today(serial).await {
                Ok(drink) => diff::apply_drinking(snapshot, &drink),
                Err(e) => warn!(serial, error = %e, "drinking stats unavailable"),
            },
            DeviceKind::Unsupported => {}
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodic poll loop for one device. The first tick fires immediately.
async fn poll_task(reconciler: Reconciler, serial: String, device: Arc<TrackedDevice>) {
    let mut interval = tokio::time::interval(reconciler.inner.config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let cancel = device.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = reconciler.inner.cycle(&device) => {
                        if let Err(e) = result {
                            warn!(serial = %serial, error = %e, "poll cycle failed");
                        }
                    }
                }
            }
        }
    }

    debug!(serial = %serial, "poll task stopped");
}
