use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use unit_dump::{Frame, UnitId, UnitRecord};

pub(crate) const RUNNABLE: &str = "runnable";
pub(crate) const RUNNING: &str = "running";

/// Identifies one in-flight park within a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ParkToken(u64);

struct Parked {
    token: ParkToken,
    reason: String,
    frame: Frame,
}

/// Bookkeeping for one live unit.
struct Slot {
    /// Reported while nothing is parked.
    reason: String,
    entry: Frame,
    /// Oldest first. Concurrent waits (`join!`, `select!`) may finish in any
    /// order, so entries are removed by token rather than popped.
    parked: Vec<Parked>,
    next_token: u64,
    created_by: Frame,
    locks_held: usize,
}

impl Slot {
    fn current_reason(&self) -> &str {
        self.parked.last().map_or(&self.reason, |parked| &parked.reason)
    }
}

/// Shared table of every live tracked unit.
///
/// Only ever locked for short synchronous sections, never across an await.
#[derive(Default)]
pub(crate) struct Registry {
    units: Mutex<BTreeMap<UnitId, Slot>>,
    next_id: AtomicU64,
}

impl Registry {
    fn slots(&self) -> MutexGuard<'_, BTreeMap<UnitId, Slot>> {
        // Slots hold plain diagnostic data, a panic mid-update leaves nothing to repair.
        self.units.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn register(&self, entry: Frame, created_by: Frame) -> UnitId {
        let id = UnitId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.slots().insert(
            id,
            Slot {
                reason: RUNNABLE.to_string(),
                entry,
                parked: Vec::new(),
                next_token: 0,
                created_by,
                locks_held: 0,
            },
        );
        id
    }

    pub(crate) fn deregister(&self, id: UnitId) {
        self.slots().remove(&id);
    }

    pub(crate) fn set_reason(&self, id: UnitId, reason: &str) {
        if let Some(slot) = self.slots().get_mut(&id) {
            slot.reason.clear();
            slot.reason.push_str(reason);
        }
    }

    /// Record a wait; the unit reports `reason` until it is unparked or a
    /// newer park starts.
    pub(crate) fn park(&self, id: UnitId, reason: String, frame: Frame) -> Option<ParkToken> {
        let mut slots = self.slots();
        let slot = slots.get_mut(&id)?;
        let token = ParkToken(slot.next_token);
        slot.next_token += 1;
        slot.parked.push(Parked {
            token,
            reason,
            frame,
        });
        Some(token)
    }

    /// Drop the wait for `token`. The reason falls back to the newest wait
    /// still in flight, or the base reason when none is left.
    pub(crate) fn unpark(&self, id: UnitId, token: ParkToken) {
        if let Some(slot) = self.slots().get_mut(&id) {
            slot.parked.retain(|parked| parked.token != token);
        }
    }

    pub(crate) fn lock_acquired(&self, id: UnitId) {
        if let Some(slot) = self.slots().get_mut(&id) {
            slot.locks_held += 1;
        }
    }

    pub(crate) fn lock_released(&self, id: UnitId) {
        if let Some(slot) = self.slots().get_mut(&id) {
            slot.locks_held = slot.locks_held.saturating_sub(1);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots().len()
    }

    pub(crate) fn snapshot(&self) -> Vec<UnitRecord> {
        self.slots()
            .iter()
            .map(|(id, slot)| {
                let mut frames: Vec<Frame> =
                    slot.parked.iter().rev().map(|parked| parked.frame.clone()).collect();
                frames.push(slot.entry.clone());
                UnitRecord {
                    id: *id,
                    reason: slot.current_reason().to_string(),
                    frames,
                    created_by: Some(slot.created_by.clone()),
                    locked: slot.locks_held > 0,
                }
            })
            .collect()
    }
}
