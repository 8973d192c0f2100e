// ── Snapshot store ──
//
// Serial-keyed last-known state with push-based change notification.
// Each device gets its own `watch` channel so a subscriber only wakes for
// the device it cares about, and a replacement is seen whole or not at all.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

use crate::model::DeviceSnapshot;

/// Generation a device entry was seeded with. A re-tracked serial gets a
/// fresh generation, so writes from a cycle of the previous entry miss.
pub(crate) type Generation = u64;

struct Slot {
    generation: Generation,
    tx: watch::Sender<Arc<DeviceSnapshot>>,
}

pub(crate) struct SnapshotStore {
    by_serial: DashMap<String, Slot>,
}

impl SnapshotStore {
    pub(crate) fn new() -> Self {
        Self {
            by_serial: DashMap::new(),
        }
    }

    /// Seed a device's snapshot. Returns `false` (and changes nothing) if
    /// the serial is already present under the same generation; a leftover
    /// entry from an older generation is replaced.
    pub(crate) fn insert(&self, snapshot: DeviceSnapshot, generation: Generation) -> bool {
        match self.by_serial.entry(snapshot.serial.clone()) {
            Entry::Occupied(slot) if slot.get().generation == generation => false,
            Entry::Occupied(mut slot) => {
                let (tx, _) = watch::channel(Arc::new(snapshot));
                slot.insert(Slot { generation, tx });
                true
            }
            Entry::Vacant(slot) => {
                let (tx, _) = watch::channel(Arc::new(snapshot));
                slot.insert(Slot { generation, tx });
                true
            }
        }
    }

    /// Replace a device's snapshot atomically. Returns `None` if the entry
    /// was removed or re-seeded under another generation in the meantime.
    pub(crate) fn publish(
        &self,
        snapshot: DeviceSnapshot,
        generation: Generation,
    ) -> Option<Arc<DeviceSnapshot>> {
        let slot = self.by_serial.get(&snapshot.serial)?;
        if slot.generation != generation {
            return None;
        }
        let snapshot = Arc::new(snapshot);
        slot.tx.send_replace(Arc::clone(&snapshot));
        Some(snapshot)
    }

    pub(crate) fn get(&self, serial: &str) -> Option<Arc<DeviceSnapshot>> {
        self.by_serial
            .get(serial)
            .map(|slot| Arc::clone(&slot.tx.borrow()))
    }

    pub(crate) fn subscribe(&self, serial: &str) -> Option<watch::Receiver<Arc<DeviceSnapshot>>> {
        self.by_serial.get(serial).map(|slot| slot.tx.subscribe())
    }

    /// Drop a device's entry if it still belongs to `generation`.
    /// Subscribers see their channel close.
    pub(crate) fn remove(
        &self,
        serial: &str,
        generation: Generation,
    ) -> Option<Arc<DeviceSnapshot>> {
        self.by_serial
            .remove_if(serial, |_, slot| slot.generation == generation)
            .map(|(_, slot)| Arc::clone(&slot.tx.borrow()))
    }

    pub(crate) fn clear(&self) {
        self.by_serial.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_serial.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::DeviceKind;

    fn snap(serial: &str) -> DeviceSnapshot {
        DeviceSnapshot::initial(serial, DeviceKind::Feeder)
    }

    #[test]
    fn insert_is_first_writer_wins() {
        let store = SnapshotStore::new();
        assert!(store.insert(snap("AF1"), 1));

        let mut other = snap("AF1");
        other.available = false;
        assert!(!store.insert(other, 1));

        assert!(store.get("AF1").unwrap().available);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn publish_notifies_subscribers() {
        let store = SnapshotStore::new();
        store.insert(snap("AF1"), 1);
        let mut rx = store.subscribe("AF1").unwrap();

        let mut next = snap("AF1");
        next.wifi_rssi = Some(-55);
        store.publish(next, 1).unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().wifi_rssi, Some(-55));
    }

    #[test]
    fn publish_after_remove_is_dropped() {
        let store = SnapshotStore::new();
        store.insert(snap("AF1"), 1);
        let rx = store.subscribe("AF1").unwrap();

        assert!(store.remove("AF1", 1).is_some());
        assert!(store.publish(snap("AF1"), 1).is_none());
        assert!(store.get("AF1").is_none());
        assert!(rx.has_changed().is_err());
    }

    #[test]
    fn older_generation_cannot_touch_reseeded_entry() {
        let store = SnapshotStore::new();
        store.insert(snap("AF1"), 1);
        assert!(store.insert(snap("AF1"), 2));

        let mut stale = snap("AF1");
        stale.wifi_rssi = Some(-70);
        assert!(store.publish(stale, 1).is_none());
        assert!(store.remove("AF1", 1).is_none());
        assert_eq!(store.get("AF1").unwrap().wifi_rssi, None);
    }
}
