use crate::entities::creature::{CreatureKind, TribeId};
use crate::world::position::Vec3;
use crate::world::time::Millis;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TribeKey {
    pub kind: CreatureKind,
    pub tribe: TribeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CronEntry {
    key: TribeKey,
    due: Millis,
}

/// Min-heap by due time (earliest first).
impl Ord for CronEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.key.cmp(&self.key))
    }
}

impl PartialOrd for CronEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingRespawn {
    due: Millis,
    anchor: Vec3,
}

/// Pending tribe respawns. A tribe has at most one pending respawn; scheduling
/// again supersedes the earlier entry, which is then skipped lazily.
#[derive(Debug, Default)]
pub struct RespawnSchedule {
    heap: BinaryHeap<CronEntry>,
    pending: HashMap<TribeKey, PendingRespawn>,
}

impl RespawnSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, key: TribeKey, anchor: Vec3, due: Millis) {
        self.pending.insert(key, PendingRespawn { due, anchor });
        self.heap.push(CronEntry { key, due });
    }

    pub fn is_pending(&self, key: TribeKey) -> bool {
        self.pending.contains_key(&key)
    }

    pub fn due_at(&self, key: TribeKey) -> Option<Millis> {
        self.pending.get(&key).map(|pending| pending.due)
    }

    /// Pops the next respawn whose time has come.
    pub fn pop_ready(&mut self, now: Millis) -> Option<(TribeKey, Vec3)> {
        loop {
            let entry = *self.heap.peek()?;
            match self.pending.get(&entry.key) {
                Some(active) if active.due == entry.due => {
                    if entry.due > now {
                        return None;
                    }
                    self.heap.pop();
                    let active = self.pending.remove(&entry.key)?;
                    return Some((entry.key, active.anchor));
                }
                _ => {
                    self.heap.pop();
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
